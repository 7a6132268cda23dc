// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque numeric job identity, assigned by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct JobId(pub i64);

impl fmt::Display for JobId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// Canonical identity of a scheduled command on a given host, for a given
/// user. Never physically deleted by crontab edits — only marked deleted;
/// a subsequent reappearance un-deletes it (see `JobReconciler`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Job {
	pub id: JobId,
	pub host: String,
	pub user: String,
	/// Stable, user-provided job name; unique per (host, user) when set.
	pub crabid: Option<String>,
	pub command: String,
	/// Five-field cron expression or `@alias`; `None` means unscheduled.
	pub time: Option<String>,
	/// IANA timezone name.
	pub timezone: Option<String>,
	#[serde(with = "crate::wire_time")]
	#[cfg_attr(feature = "openapi", schema(value_type = String))]
	pub installed_at: DateTime<Utc>,
	#[serde(with = "crate::wire_time::option")]
	#[cfg_attr(feature = "openapi", schema(value_type = Option<String>))]
	pub deleted_at: Option<DateTime<Utc>>,
}

impl Job {
	pub fn is_deleted(&self) -> bool {
		self.deleted_at.is_some()
	}
}

/// Optional per-job tuning. May outlive its Job (orphan state) and be
/// re-linked to a new Job by `configid`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct JobConfig {
	pub id: i64,
	pub job_id: Option<JobId>,
	pub graceperiod_minutes: u32,
	pub timeout_minutes: u32,
	pub success_pattern: Option<String>,
	pub warning_pattern: Option<String>,
	pub fail_pattern: Option<String>,
	pub note: Option<String>,
	pub inhibit: bool,
}

impl JobConfig {
	pub const DEFAULT_GRACEPERIOD_MINUTES: u32 = 2;
	pub const DEFAULT_TIMEOUT_MINUTES: u32 = 5;

	pub fn graceperiod(&self) -> chrono::Duration {
		chrono::Duration::minutes(self.graceperiod_minutes as i64)
	}

	pub fn timeout(&self) -> chrono::Duration {
		chrono::Duration::minutes(self.timeout_minutes as i64)
	}
}

impl Default for JobConfig {
	fn default() -> Self {
		Self {
			id: 0,
			job_id: None,
			graceperiod_minutes: Self::DEFAULT_GRACEPERIOD_MINUTES,
			timeout_minutes: Self::DEFAULT_TIMEOUT_MINUTES,
			success_pattern: None,
			warning_pattern: None,
			fail_pattern: None,
			note: None,
			inhibit: false,
		}
	}
}
