// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! The process-wide scoped lock every Store mutation (and read) runs
//! under. `StoreGuard` has no public constructor: the only way to get one
//! is `SqliteStore::acquire`, which serializes on an internal mutex before
//! opening the transaction, so nested acquisition is impossible by
//! construction rather than by convention.

use std::sync::Arc;

use sqlx::{Sqlite, SqlitePool, Transaction};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::error::Result;

pub struct StoreGuard {
	tx: Transaction<'static, Sqlite>,
	_lock: OwnedMutexGuard<()>,
}

impl StoreGuard {
	pub(crate) async fn acquire(pool: &SqlitePool, lock: &Arc<Mutex<()>>) -> Result<Self> {
		let _lock = Arc::clone(lock).lock_owned().await;
		let tx = pool.begin().await?;
		Ok(Self { tx, _lock })
	}

	pub(crate) fn tx(&mut self) -> &mut Transaction<'static, Sqlite> {
		&mut self.tx
	}

	/// Commit the transaction. Dropping the guard without calling this
	/// rolls back (an early `?` return during a composite operation takes
	/// this path automatically).
	pub(crate) async fn commit(self) -> Result<()> {
		self.tx.commit().await?;
		Ok(())
	}
}
