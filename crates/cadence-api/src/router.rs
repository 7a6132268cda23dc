// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use axum::routing::{get, put};
use axum::Router;

use crate::routes::{ingest, query};
use crate::state::AppState;

/// Builds the full IngestAPI + QueryAPI route table. Transport-level
/// layers (tracing, CORS) are the daemon binary's concern, not this
/// crate's — it only owns routing and handler wiring.
pub fn create_router(state: AppState) -> Router {
	Router::new()
		.route("/api/0/start/{host}/{user}", put(ingest::start))
		.route("/api/0/start/{host}/{user}/{crabid}", put(ingest::start_with_crabid))
		.route("/api/0/finish/{host}/{user}", put(ingest::finish))
		.route("/api/0/finish/{host}/{user}/{crabid}", put(ingest::finish_with_crabid))
		.route("/api/0/crontab/{host}/{user}", put(ingest::put_crontab).get(ingest::get_crontab))
		.route("/api/0/jobs", get(query::list_jobs))
		.route("/api/0/jobs/{id}", get(query::job_info))
		.route("/api/0/jobs/{id}/events", get(query::job_events))
		.route("/api/0/jobs/{id}/finishes", get(query::job_finishes))
		.route("/api/0/finishes/{finish_event_id}/output", get(query::finish_output))
		.route("/api/0/jobstatus", get(query::jobstatus))
		.route("/api/0/summary", get(query::summary))
		.with_state(state)
}
