// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use axum::{http::StatusCode, response::IntoResponse, response::Response, Json};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ApiErrorBody {
	pub error: String,
	pub message: String,
}

impl ApiErrorBody {
	fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
		Self { error: error.into(), message: message.into() }
	}
}

/// Every failure mode an IngestAPI/QueryAPI handler can surface. Store
/// errors are always a 500; everything else is a 400, matching the
/// "malformed JSON; store/ingest error" split in the wire contract.
#[derive(Debug, Error)]
pub enum ApiError {
	#[error("unknown host/user/job")]
	NotFound,

	#[error("{0}")]
	BadRequest(String),

	#[error(transparent)]
	Store(#[from] cadence_store::StoreError),

	#[error(transparent)]
	Monitor(#[from] cadence_monitor::MonitorError),
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let (status, body) = match &self {
			Self::NotFound => (StatusCode::NOT_FOUND, ApiErrorBody::new("not_found", self.to_string())),
			Self::BadRequest(_) => (StatusCode::BAD_REQUEST, ApiErrorBody::new("bad_request", self.to_string())),
			Self::Store(_) | Self::Monitor(_) => {
				tracing::error!(error = %self, "request failed");
				(StatusCode::INTERNAL_SERVER_ERROR, ApiErrorBody::new("internal_error", self.to_string()))
			}
		};
		(status, Json(body)).into_response()
	}
}
