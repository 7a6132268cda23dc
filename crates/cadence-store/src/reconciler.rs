// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! `CheckJob`: resolve a (host, user, crabid?, command, time?, timezone?)
//! declaration to the one canonical `Job` row it describes, creating,
//! updating, or undeleting it as needed. Ported from the crontab-ingest
//! path of the original monitor service; every mutation here runs inside
//! the caller's already-open transaction.

use chrono::Utc;
use sqlx::{Sqlite, Transaction};

use cadence_core::JobId;

use crate::error::{Result, StoreError};
use crate::models::JobRow;

#[derive(Debug, Clone)]
pub struct CheckJobRequest {
	pub host: String,
	pub user: String,
	pub crabid: Option<String>,
	pub command: String,
	pub time: Option<String>,
	pub timezone: Option<String>,
}

fn needs_update(existing: &JobRow, req: &CheckJobRequest) -> bool {
	existing.deleted_at.is_some()
		|| existing.command != req.command
		|| req.time.as_ref().is_some_and(|t| existing.time.as_deref() != Some(t.as_str()))
		|| req.timezone.as_ref().is_some_and(|tz| existing.timezone.as_deref() != Some(tz.as_str()))
}

async fn find_by_crabid(
	tx: &mut Transaction<'static, Sqlite>,
	req: &CheckJobRequest,
	crabid: &str,
) -> Result<Option<JobRow>> {
	sqlx::query_as::<_, JobRow>(
		"SELECT id, host, user, crabid, command, time, timezone, installed_at, deleted_at \
		 FROM job WHERE host = ? AND user = ? AND crabid = ?",
	)
	.bind(&req.host)
	.bind(&req.user)
	.bind(crabid)
	.fetch_optional(&mut **tx)
	.await
	.map_err(StoreError::from)
}

async fn find_by_command_no_crabid(
	tx: &mut Transaction<'static, Sqlite>,
	req: &CheckJobRequest,
) -> Result<Option<JobRow>> {
	sqlx::query_as::<_, JobRow>(
		"SELECT id, host, user, crabid, command, time, timezone, installed_at, deleted_at \
		 FROM job WHERE host = ? AND user = ? AND command = ? AND crabid IS NULL",
	)
	.bind(&req.host)
	.bind(&req.user)
	.bind(&req.command)
	.fetch_optional(&mut **tx)
	.await
	.map_err(StoreError::from)
}

async fn insert_job(tx: &mut Transaction<'static, Sqlite>, req: &CheckJobRequest) -> Result<JobId> {
	let now = Utc::now().to_rfc3339();
	let id = sqlx::query(
		"INSERT INTO job (host, user, crabid, command, time, timezone, installed_at, deleted_at) \
		 VALUES (?, ?, ?, ?, ?, ?, ?, NULL)",
	)
	.bind(&req.host)
	.bind(&req.user)
	.bind(&req.crabid)
	.bind(&req.command)
	.bind(&req.time)
	.bind(&req.timezone)
	.bind(&now)
	.execute(&mut **tx)
	.await?
	.last_insert_rowid();

	Ok(JobId(id))
}

/// Update an existing row in place: reinstate it if deleted, overwrite
/// `command` unconditionally (always supplied) and `time`/`timezone` only
/// where the caller supplied a value, optionally adopting a new `crabid`.
async fn update_job(
	tx: &mut Transaction<'static, Sqlite>,
	existing: &JobRow,
	req: &CheckJobRequest,
	adopt_crabid: bool,
) -> Result<JobId> {
	let now = Utc::now().to_rfc3339();
	let time = req.time.clone().or_else(|| existing.time.clone());
	let timezone = req.timezone.clone().or_else(|| existing.timezone.clone());
	let crabid = if adopt_crabid { req.crabid.clone() } else { existing.crabid.clone() };

	sqlx::query(
		"UPDATE job SET crabid = ?, command = ?, time = ?, timezone = ?, installed_at = ?, deleted_at = NULL \
		 WHERE id = ?",
	)
	.bind(&crabid)
	.bind(&req.command)
	.bind(&time)
	.bind(&timezone)
	.bind(&now)
	.bind(existing.id)
	.execute(&mut **tx)
	.await?;

	Ok(JobId(existing.id))
}

pub async fn check_job(tx: &mut Transaction<'static, Sqlite>, req: &CheckJobRequest) -> Result<JobId> {
	if let Some(crabid) = req.crabid.clone() {
		if let Some(existing) = find_by_crabid(tx, req, &crabid).await? {
			return if needs_update(&existing, req) {
				update_job(tx, &existing, req, false).await
			} else {
				Ok(JobId(existing.id))
			};
		}

		if let Some(existing) = find_by_command_no_crabid(tx, req).await? {
			return update_job(tx, &existing, req, true).await;
		}

		return insert_job(tx, req).await;
	}

	if let Some(existing) = find_by_command_no_crabid(tx, req).await? {
		return if needs_update(&existing, req) {
			update_job(tx, &existing, req, false).await
		} else {
			Ok(JobId(existing.id))
		};
	}

	insert_job(tx, req).await
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::pool::test_pool;

	fn req(host: &str, user: &str, crabid: Option<&str>, command: &str) -> CheckJobRequest {
		CheckJobRequest {
			host: host.to_string(),
			user: user.to_string(),
			crabid: crabid.map(str::to_string),
			command: command.to_string(),
			time: Some("* * * * *".to_string()),
			timezone: None,
		}
	}

	#[tokio::test]
	async fn repeated_identical_declaration_is_a_no_op() {
		let pool = test_pool().await.unwrap();
		let mut tx = pool.begin().await.unwrap();
		let first = check_job(&mut tx, &req("h", "u", Some("a"), "/bin/a")).await.unwrap();
		let second = check_job(&mut tx, &req("h", "u", Some("a"), "/bin/a")).await.unwrap();
		assert_eq!(first, second);
	}

	#[tokio::test]
	async fn crabid_less_job_is_adopted_when_a_crabid_is_later_declared() {
		let pool = test_pool().await.unwrap();
		let mut tx = pool.begin().await.unwrap();
		let bare = check_job(&mut tx, &req("h", "u", None, "/bin/a")).await.unwrap();
		let adopted = check_job(&mut tx, &req("h", "u", Some("a"), "/bin/a")).await.unwrap();
		assert_eq!(bare, adopted);

		let row = find_by_crabid(&mut tx, &req("h", "u", Some("a"), "/bin/a"), "a")
			.await
			.unwrap()
			.unwrap();
		assert_eq!(row.crabid.as_deref(), Some("a"));
	}

	#[tokio::test]
	async fn deleted_job_is_undeleted_on_reappearance() {
		let pool = test_pool().await.unwrap();
		let mut tx = pool.begin().await.unwrap();
		let id = check_job(&mut tx, &req("h", "u", Some("a"), "/bin/a")).await.unwrap();
		sqlx::query("UPDATE job SET deleted_at = ? WHERE id = ?")
			.bind(Utc::now().to_rfc3339())
			.bind(id.0)
			.execute(&mut *tx)
			.await
			.unwrap();

		let resurrected = check_job(&mut tx, &req("h", "u", Some("a"), "/bin/a")).await.unwrap();
		assert_eq!(resurrected, id);

		let row = find_by_crabid(&mut tx, &req("h", "u", Some("a"), "/bin/a"), "a")
			.await
			.unwrap()
			.unwrap();
		assert!(row.deleted_at.is_none());
	}
}
