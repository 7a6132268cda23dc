// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Captured stdout/stderr for a finish event can live directly in the
//! database (`DbOutputStore`, the default) or be spilled to flat files
//! under a directory (`FsOutputStore`), for deployments where output
//! volume would otherwise bloat the SQLite file. Both sides of the
//! `OutputStore` trait key on `(host, user, job_id, crabid?, finish_id)`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sqlx::SqlitePool;
use tokio::io::AsyncWriteExt;

use crate::error::Result;

#[async_trait]
pub trait OutputStore: Send + Sync {
	async fn write_output(&self, finish_event_id: i64, stdout: &str, stderr: &str) -> Result<()>;
	async fn read_output(&self, finish_event_id: i64) -> Result<Option<(String, String)>>;
}

/// Stores output rows in the `joboutput` table alongside the rest of the
/// event store.
pub struct DbOutputStore {
	pool: SqlitePool,
}

impl DbOutputStore {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}
}

#[async_trait]
impl OutputStore for DbOutputStore {
	async fn write_output(&self, finish_event_id: i64, stdout: &str, stderr: &str) -> Result<()> {
		sqlx::query(
			"INSERT INTO joboutput (finish_event_id, stdout, stderr) VALUES (?, ?, ?) \
			 ON CONFLICT(finish_event_id) DO UPDATE SET stdout = excluded.stdout, stderr = excluded.stderr",
		)
		.bind(finish_event_id)
		.bind(stdout)
		.bind(stderr)
		.execute(&self.pool)
		.await?;
		Ok(())
	}

	async fn read_output(&self, finish_event_id: i64) -> Result<Option<(String, String)>> {
		let row = sqlx::query_as::<_, (String, String)>("SELECT stdout, stderr FROM joboutput WHERE finish_event_id = ?")
			.bind(finish_event_id)
			.fetch_optional(&self.pool)
			.await?;
		Ok(row)
	}
}

/// Stores output as `<finish_event_id>.stdout` / `.stderr` files under a
/// base directory, for deployments that would rather keep large captured
/// output out of the SQLite file entirely.
///
/// Files live under a digit-chunked subdirectory path rather than flat in
/// `base_dir`, so that a store with millions of finish events never puts
/// more than 1000 entries in one directory: `finish_event_id` is
/// zero-padded to 9 digits and split into three 3-digit groups, the first
/// two becoming nested subdirectories and the full id naming the file,
/// e.g. id `42` -> `000/000/000000042.stdout`.
pub struct FsOutputStore {
	base_dir: PathBuf,
}

impl FsOutputStore {
	pub fn new(base_dir: impl Into<PathBuf>) -> Self {
		Self { base_dir: base_dir.into() }
	}

	fn shard_dir(&self, finish_event_id: i64) -> PathBuf {
		let padded = format!("{finish_event_id:09}");
		let (a, rest) = padded.split_at(3);
		let (b, _) = rest.split_at(3);
		self.base_dir.join(a).join(b)
	}

	fn stdout_path(&self, finish_event_id: i64) -> PathBuf {
		self.shard_dir(finish_event_id).join(format!("{finish_event_id:09}.stdout"))
	}

	fn stderr_path(&self, finish_event_id: i64) -> PathBuf {
		self.shard_dir(finish_event_id).join(format!("{finish_event_id:09}.stderr"))
	}
}

async fn write_file(path: &Path, contents: &str) -> Result<()> {
	let mut file = tokio::fs::File::create(path).await?;
	file.write_all(contents.as_bytes()).await?;
	Ok(())
}

#[async_trait]
impl OutputStore for FsOutputStore {
	async fn write_output(&self, finish_event_id: i64, stdout: &str, stderr: &str) -> Result<()> {
		tokio::fs::create_dir_all(self.shard_dir(finish_event_id)).await?;
		write_file(&self.stdout_path(finish_event_id), stdout).await?;
		write_file(&self.stderr_path(finish_event_id), stderr).await?;
		Ok(())
	}

	async fn read_output(&self, finish_event_id: i64) -> Result<Option<(String, String)>> {
		let stdout_path = self.stdout_path(finish_event_id);
		if !stdout_path.exists() {
			return Ok(None);
		}
		let stdout = tokio::fs::read_to_string(&stdout_path).await?;
		let stderr = tokio::fs::read_to_string(self.stderr_path(finish_event_id)).await.unwrap_or_default();
		Ok(Some((stdout, stderr)))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn fs_output_store_roundtrips() {
		let dir = tempfile::tempdir().unwrap();
		let store = FsOutputStore::new(dir.path());
		store.write_output(1, "out", "err").await.unwrap();
		let (stdout, stderr) = store.read_output(1).await.unwrap().unwrap();
		assert_eq!(stdout, "out");
		assert_eq!(stderr, "err");
	}

	#[tokio::test]
	async fn fs_output_store_missing_finish_id_returns_none() {
		let dir = tempfile::tempdir().unwrap();
		let store = FsOutputStore::new(dir.path());
		assert!(store.read_output(404).await.unwrap().is_none());
	}

	#[tokio::test]
	async fn fs_output_store_shards_files_under_digit_chunked_directories() {
		let dir = tempfile::tempdir().unwrap();
		let store = FsOutputStore::new(dir.path());
		store.write_output(42, "out", "err").await.unwrap();

		let expected = dir.path().join("000").join("000").join("000000042.stdout");
		assert!(expected.exists(), "expected sharded path {expected:?} to exist");

		let (stdout, stderr) = store.read_output(42).await.unwrap().unwrap();
		assert_eq!(stdout, "out");
		assert_eq!(stderr, "err");
	}

	#[tokio::test]
	async fn fs_output_store_shards_different_ids_into_different_directories() {
		let dir = tempfile::tempdir().unwrap();
		let store = FsOutputStore::new(dir.path());
		store.write_output(7, "a", "").await.unwrap();
		store.write_output(5_000_042, "b", "").await.unwrap();

		assert!(dir.path().join("000").join("000").join("000000007.stdout").exists());
		assert!(dir.path().join("005").join("000").join("005000042.stdout").exists());
	}

	#[tokio::test]
	async fn db_output_store_roundtrips() {
		let pool = crate::pool::test_pool().await.unwrap();
		sqlx::query("INSERT INTO job (host, user, command, installed_at) VALUES ('h', 'u', 'c', '2024-01-01T00:00:00Z')")
			.execute(&pool)
			.await
			.unwrap();
		sqlx::query("INSERT INTO jobfinish (job_id, datetime, command, status) VALUES (1, '2024-01-01T00:00:00Z', 'c', 0)")
			.execute(&pool)
			.await
			.unwrap();

		let store = DbOutputStore::new(pool);
		store.write_output(1, "out", "err").await.unwrap();
		let (stdout, stderr) = store.read_output(1).await.unwrap().unwrap();
		assert_eq!(stdout, "out");
		assert_eq!(stderr, "err");
	}
}
