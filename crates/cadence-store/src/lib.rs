// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

mod error;
mod guard;
mod models;
mod output;
mod pool;
mod reconciler;
mod store;

pub use error::{Result, StoreError};
pub use output::{DbOutputStore, FsOutputStore, OutputStore};
pub use pool::{create_pool, test_pool};
pub use reconciler::CheckJobRequest;
pub use store::{JobFields, JobFilter, SqliteStore, Store};
