// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use cadence_monitor::Monitor;
use cadence_store::Store;

/// Shared handle every handler extracts via `State<AppState>`.
#[derive(Clone)]
pub struct AppState {
	pub store: Arc<dyn Store>,
	pub monitor: Arc<Monitor>,
}

impl AppState {
	pub fn new(store: Arc<dyn Store>, monitor: Arc<Monitor>) -> Self {
		Self { store, monitor }
	}
}
