// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqliteSynchronous};

use crate::error::Result;

const SCHEMA: &str = include_str!("schema.sql");

/// Open (creating if missing) a WAL-mode SQLite pool and apply the schema.
/// Schema application is `CREATE TABLE IF NOT EXISTS`, so this is safe to
/// call every time the daemon starts rather than requiring a separate
/// migration-runner step.
#[tracing::instrument(skip(database_url))]
pub async fn create_pool(database_url: &str) -> Result<SqlitePool> {
	let options = SqliteConnectOptions::from_str(database_url)?
		.journal_mode(SqliteJournalMode::Wal)
		.synchronous(SqliteSynchronous::Normal)
		.create_if_missing(true);

	let pool = SqlitePool::connect_with(options).await?;
	sqlx::raw_sql(SCHEMA).execute(&pool).await?;

	tracing::debug!("store pool created");
	Ok(pool)
}

/// An in-memory pool for tests: same schema, no file on disk.
pub async fn test_pool() -> Result<SqlitePool> {
	let pool = SqlitePool::connect("sqlite::memory:").await?;
	sqlx::raw_sql(SCHEMA).execute(&pool).await?;
	Ok(pool)
}
