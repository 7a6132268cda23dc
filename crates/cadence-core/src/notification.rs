// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::JobId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct NotificationId(pub i64);

impl fmt::Display for NotificationId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// Delivery method tag. Only "email" exists today but the wire
/// representation is a string so new methods don't require a migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum NotificationMethod {
	Email,
}

impl fmt::Display for NotificationMethod {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Email => write!(f, "email"),
		}
	}
}

impl FromStr for NotificationMethod {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self> {
		match s {
			"email" => Ok(Self::Email),
			other => Err(Error::InvalidNotificationMethod(other.to_string())),
		}
	}
}

/// Either config-linked (`job_id` set, `host`/`user` null) or match-based
/// (`job_id` null, `host`/`user` possibly null acting as wildcards).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Notification {
	pub id: NotificationId,
	pub job_id: Option<JobId>,
	pub host: Option<String>,
	pub user: Option<String>,
	pub method: NotificationMethod,
	pub address: String,
	/// `None` ⇒ fire on the daily tick instead of a per-notification
	/// schedule.
	pub time: Option<String>,
	pub timezone: Option<String>,
	pub skip_ok: bool,
	pub skip_warning: bool,
	pub skip_error: bool,
	pub include_output: bool,
}

/// A notification joined to the job(s) it currently covers; produced by
/// `Store::get_notifications`. Carries the effective timezone
/// (`notification.timezone ?? job.timezone`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationTarget {
	pub notification: Notification,
	pub job_id: JobId,
	pub effective_timezone: Option<String>,
}
