// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! IngestAPI: the endpoints clients PUT to when a scheduled command starts,
//! finishes, or when a crontab is (re)installed.

use axum::extract::{Path, Query, State};
use axum::Json;
use tracing::instrument;

use crate::dto::{
	CrontabGetParams, CrontabGetResponse, CrontabPutRequest, CrontabPutResponse, FinishRequest, StartRequest, StartResponse,
};
use crate::error::ApiError;
use crate::state::AppState;

#[cfg_attr(
	feature = "openapi",
	utoipa::path(put, path = "/api/0/start/{host}/{user}", tag = "ingest", responses((status = 200, body = StartResponse)))
)]
#[instrument(skip(state, body))]
pub async fn start(State(state): State<AppState>, Path((host, user)): Path<(String, String)>, Json(body): Json<StartRequest>) -> Result<Json<StartResponse>, ApiError> {
	start_inner(state, host, user, None, body).await
}

#[instrument(skip(state, body))]
pub async fn start_with_crabid(
	State(state): State<AppState>,
	Path((host, user, crabid)): Path<(String, String, String)>,
	Json(body): Json<StartRequest>,
) -> Result<Json<StartResponse>, ApiError> {
	start_inner(state, host, user, Some(crabid), body).await
}

async fn start_inner(state: AppState, host: String, user: String, crabid: Option<String>, body: StartRequest) -> Result<Json<StartResponse>, ApiError> {
	if body.command.trim().is_empty() {
		return Err(ApiError::BadRequest("command must not be empty".into()));
	}
	let (_job_id, inhibit) = state.store.log_start(&host, &user, crabid.as_deref(), &body.command).await?;
	Ok(Json(StartResponse { inhibit }))
}

#[cfg_attr(
	feature = "openapi",
	utoipa::path(put, path = "/api/0/finish/{host}/{user}", tag = "ingest", responses((status = 200)))
)]
#[instrument(skip(state, body))]
pub async fn finish(State(state): State<AppState>, Path((host, user)): Path<(String, String)>, Json(body): Json<FinishRequest>) -> Result<(), ApiError> {
	finish_inner(state, host, user, None, body).await
}

#[instrument(skip(state, body))]
pub async fn finish_with_crabid(
	State(state): State<AppState>,
	Path((host, user, crabid)): Path<(String, String, String)>,
	Json(body): Json<FinishRequest>,
) -> Result<(), ApiError> {
	finish_inner(state, host, user, Some(crabid), body).await
}

async fn finish_inner(state: AppState, host: String, user: String, crabid: Option<String>, body: FinishRequest) -> Result<(), ApiError> {
	if !body.status.is_client_sendable() {
		return Err(ApiError::BadRequest(format!("status {} may not be reported by a client", body.status)));
	}
	state
		.store
		.log_finish(&host, &user, crabid.as_deref(), &body.command, body.status, body.stdout.as_deref(), body.stderr.as_deref())
		.await?;
	Ok(())
}

#[cfg_attr(
	feature = "openapi",
	utoipa::path(put, path = "/api/0/crontab/{host}/{user}", tag = "ingest", responses((status = 200, body = CrontabPutResponse)))
)]
#[instrument(skip(state, body))]
pub async fn put_crontab(
	State(state): State<AppState>,
	Path((host, user)): Path<(String, String)>,
	Json(body): Json<CrontabPutRequest>,
) -> Result<Json<CrontabPutResponse>, ApiError> {
	let warning = state.store.save_crontab(&host, &user, body.crontab, body.timezone).await?;
	Ok(Json(CrontabPutResponse { warning }))
}

#[cfg_attr(
	feature = "openapi",
	utoipa::path(get, path = "/api/0/crontab/{host}/{user}", tag = "ingest", responses((status = 200, body = CrontabGetResponse)))
)]
#[instrument(skip(state))]
pub async fn get_crontab(
	State(state): State<AppState>,
	Path((host, user)): Path<(String, String)>,
	Query(params): Query<CrontabGetParams>,
) -> Result<Json<CrontabGetResponse>, ApiError> {
	let crontab = if params.raw { state.store.get_raw_crontab(&host, &user).await? } else { state.store.get_crontab(&host, &user).await? };
	Ok(Json(CrontabGetResponse { crontab }))
}
