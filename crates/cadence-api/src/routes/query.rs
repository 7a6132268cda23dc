// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! QueryAPI: the read-only endpoints the dashboard and feed/email
//! renderers poll — job listings, status long-poll, event history, and
//! output retrieval.

use std::time::Duration as StdDuration;

use axum::extract::{Path, Query, State};
use axum::Json;
use cadence_core::JobId;
use tracing::instrument;

use crate::dto::{
	EventWindowParams, JobEventsResponse, JobFinishesResponse, JobInfoResponse, JobOutputResponse, JobStatusParams, JobStatusResponse,
	ListJobsParams, ListJobsResponse, SummaryResponse,
};
use crate::error::ApiError;
use crate::state::AppState;

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/api/0/jobs", tag = "query", responses((status = 200, body = ListJobsResponse))))]
#[instrument(skip(state))]
pub async fn list_jobs(State(state): State<AppState>, Query(params): Query<ListJobsParams>) -> Result<Json<ListJobsResponse>, ApiError> {
	let filter = cadence_store::JobFilter { host: params.host, user: params.user, ..Default::default() };
	let jobs = state.store.get_jobs(filter).await?;
	Ok(Json(ListJobsResponse { jobs }))
}

#[cfg_attr(
	feature = "openapi",
	utoipa::path(get, path = "/api/0/jobs/{id}", tag = "query", responses((status = 200, body = JobInfoResponse), (status = 404)))
)]
#[instrument(skip(state))]
pub async fn job_info(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<JobInfoResponse>, ApiError> {
	let id = JobId(id);
	let job = state.store.get_job_info(id).await?.ok_or(ApiError::NotFound)?;
	let config = state.store.get_job_config(id).await?;
	Ok(Json(JobInfoResponse { job, config }))
}

#[cfg_attr(
	feature = "openapi",
	utoipa::path(get, path = "/api/0/jobs/{id}/events", tag = "query", responses((status = 200, body = JobEventsResponse)))
)]
#[instrument(skip(state))]
pub async fn job_events(State(state): State<AppState>, Path(id): Path<i64>, Query(params): Query<EventWindowParams>) -> Result<Json<JobEventsResponse>, ApiError> {
	let events = state.store.get_job_events(JobId(id), params.limit, params.start, params.end).await?;
	Ok(Json(JobEventsResponse { events }))
}

#[cfg_attr(
	feature = "openapi",
	utoipa::path(get, path = "/api/0/jobs/{id}/finishes", tag = "query", responses((status = 200, body = JobFinishesResponse)))
)]
#[instrument(skip(state))]
pub async fn job_finishes(State(state): State<AppState>, Path(id): Path<i64>, Query(params): Query<EventWindowParams>) -> Result<Json<JobFinishesResponse>, ApiError> {
	let finishes = state.store.get_job_finishes(JobId(id), params.limit, params.end, params.start).await?;
	Ok(Json(JobFinishesResponse { finishes }))
}

#[cfg_attr(
	feature = "openapi",
	utoipa::path(get, path = "/api/0/finishes/{finish_event_id}/output", tag = "query", responses((status = 200, body = JobOutputResponse), (status = 404)))
)]
#[instrument(skip(state))]
pub async fn finish_output(State(state): State<AppState>, Path(finish_event_id): Path<i64>) -> Result<Json<JobOutputResponse>, ApiError> {
	let (stdout, stderr) = state.store.get_job_output(finish_event_id).await?.ok_or(ApiError::NotFound)?;
	Ok(Json(JobOutputResponse { stdout, stderr }))
}

#[cfg_attr(
	feature = "openapi",
	utoipa::path(get, path = "/api/0/jobstatus", tag = "query", responses((status = 200, body = JobStatusResponse)))
)]
#[instrument(skip(state))]
pub async fn jobstatus(State(state): State<AppState>, Query(params): Query<JobStatusParams>) -> Json<JobStatusResponse> {
	let snapshot = state
		.monitor
		.wait_for_event_since(params.start_cursor, params.alarm_cursor, params.finish_cursor, StdDuration::from_secs(params.timeout_secs))
		.await;
	Json(snapshot.into())
}

#[cfg_attr(feature = "openapi", utoipa::path(get, path = "/api/0/summary", tag = "query", responses((status = 200, body = SummaryResponse))))]
#[instrument(skip(state))]
pub async fn summary(State(state): State<AppState>) -> Json<SummaryResponse> {
	let snapshot = state.monitor.snapshot().await;
	Json(snapshot.into())
}
