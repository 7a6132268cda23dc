// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! HTTP surface for cadence: IngestAPI (clients report job starts and
//! finishes, crontabs are installed) and QueryAPI (the dashboard reads job
//! status, history, and output).

pub mod dto;
pub mod error;
pub mod router;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiErrorBody};
pub use router::create_router;
pub use state::AppState;
