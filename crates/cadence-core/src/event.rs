// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Append-only event rows and the tagged union the Monitor folds over.
//!
//! The source represents these as untyped rows distinguished by a `type`
//! integer; here each kind is a named record and `Event` is a tagged
//! variant, so `processEvent` matches on the variant instead of testing an
//! integer field.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{JobId, StatusCode};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct StartEvent {
	pub event_id: i64,
	pub job_id: JobId,
	#[serde(with = "crate::wire_time")]
	#[cfg_attr(feature = "openapi", schema(value_type = String))]
	pub datetime: DateTime<Utc>,
	pub command: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct FinishEvent {
	pub event_id: i64,
	pub job_id: JobId,
	#[serde(with = "crate::wire_time")]
	#[cfg_attr(feature = "openapi", schema(value_type = String))]
	pub datetime: DateTime<Utc>,
	pub command: String,
	pub status: StatusCode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AlarmEvent {
	pub event_id: i64,
	pub job_id: JobId,
	#[serde(with = "crate::wire_time")]
	#[cfg_attr(feature = "openapi", schema(value_type = String))]
	pub datetime: DateTime<Utc>,
	pub status: StatusCode,
}

/// A single event of any kind, as folded by `Monitor::process_event`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Event {
	Start(StartEvent),
	Finish(FinishEvent),
	Alarm(AlarmEvent),
}

impl Event {
	pub fn event_id(&self) -> i64 {
		match self {
			Self::Start(e) => e.event_id,
			Self::Finish(e) => e.event_id,
			Self::Alarm(e) => e.event_id,
		}
	}

	pub fn job_id(&self) -> JobId {
		match self {
			Self::Start(e) => e.job_id,
			Self::Finish(e) => e.job_id,
			Self::Alarm(e) => e.job_id,
		}
	}

	pub fn datetime(&self) -> DateTime<Utc> {
		match self {
			Self::Start(e) => e.datetime,
			Self::Finish(e) => e.datetime,
			Self::Alarm(e) => e.datetime,
		}
	}

	/// `None` for a start event; the completion/alarm status otherwise.
	pub fn status(&self) -> Option<StatusCode> {
		match self {
			Self::Start(_) => None,
			Self::Finish(e) => Some(e.status),
			Self::Alarm(e) => Some(e.status),
		}
	}

	/// Ordering rank used to break ties between events sharing a
	/// datetime. `GetEventsSince` wants start < alarm < finish (oldest
	/// logical step first); `GetJobEvents` wants the reverse when listing
	/// newest-first.
	pub fn kind_rank(&self) -> u8 {
		match self {
			Self::Start(_) => 0,
			Self::Alarm(_) => 1,
			Self::Finish(_) => 2,
		}
	}
}
