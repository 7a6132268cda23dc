// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Wire-format request/response bodies for the IngestAPI and QueryAPI.

use std::collections::HashMap;

use cadence_core::{Event, FinishEvent, Job, JobConfig, JobId, JobState, StatusCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct StartRequest {
	pub command: String,
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct StartResponse {
	pub inhibit: bool,
}

#[derive(Debug, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct FinishRequest {
	pub command: String,
	pub status: StatusCode,
	#[serde(default)]
	pub stdout: Option<String>,
	#[serde(default)]
	pub stderr: Option<String>,
}

#[derive(Debug, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CrontabPutRequest {
	pub crontab: Vec<String>,
	#[serde(default)]
	pub timezone: Option<String>,
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CrontabPutResponse {
	pub warning: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct CrontabGetParams {
	#[serde(default)]
	pub raw: bool,
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CrontabGetResponse {
	pub crontab: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct JobStatusParams {
	#[serde(default)]
	pub start_cursor: i64,
	#[serde(default)]
	pub alarm_cursor: i64,
	#[serde(default)]
	pub finish_cursor: i64,
	/// Seconds the caller is willing to long-poll before getting the
	/// current snapshot back regardless. Jitter is added by the Monitor.
	#[serde(default = "default_timeout_secs")]
	pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
	30
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct JobStatusResponse {
	pub max_start_id: i64,
	pub max_alarm_id: i64,
	pub max_finish_id: i64,
	pub num_warning: usize,
	pub num_error: usize,
	pub jobs: HashMap<JobId, JobState>,
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct JobInfoResponse {
	pub job: Job,
	pub config: Option<JobConfig>,
}

#[derive(Debug, Deserialize)]
pub struct ListJobsParams {
	#[serde(default)]
	pub host: Option<String>,
	#[serde(default)]
	pub user: Option<String>,
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ListJobsResponse {
	pub jobs: Vec<Job>,
}

#[derive(Debug, Deserialize)]
pub struct EventWindowParams {
	#[serde(default)]
	pub limit: Option<i64>,
	#[serde(default)]
	pub start: Option<DateTime<Utc>>,
	#[serde(default)]
	pub end: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct JobEventsResponse {
	pub events: Vec<Event>,
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct JobFinishesResponse {
	pub finishes: Vec<FinishEvent>,
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct JobOutputResponse {
	pub stdout: String,
	pub stderr: String,
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SummaryResponse {
	pub max_start_id: i64,
	pub max_alarm_id: i64,
	pub max_finish_id: i64,
	pub num_warning: usize,
	pub num_error: usize,
	pub num_jobs: usize,
}

impl From<cadence_monitor::StatusSnapshot> for JobStatusResponse {
	fn from(s: cadence_monitor::StatusSnapshot) -> Self {
		Self {
			max_start_id: s.max_start_id,
			max_alarm_id: s.max_alarm_id,
			max_finish_id: s.max_finish_id,
			num_warning: s.num_warning,
			num_error: s.num_error,
			jobs: s.jobs,
		}
	}
}

impl From<cadence_monitor::StatusSnapshot> for SummaryResponse {
	fn from(s: cadence_monitor::StatusSnapshot) -> Self {
		Self {
			max_start_id: s.max_start_id,
			max_alarm_id: s.max_alarm_id,
			max_finish_id: s.max_finish_id,
			num_warning: s.num_warning,
			num_error: s.num_error,
			num_jobs: s.jobs.len(),
		}
	}
}
