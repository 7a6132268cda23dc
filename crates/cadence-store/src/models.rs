// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Row shapes returned by `sqlx::query_as`, and their conversions into
//! `cadence_core` domain types. Kept separate from `store.rs` so the SQL
//! text stays readable next to the operations that issue it.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use cadence_core::{
	AlarmEvent, Event, FinishEvent, Job, JobConfig, JobId, Notification, NotificationId,
	NotificationMethod, StartEvent, StatusCode,
};

use crate::error::{Result, StoreError};

fn parse_datetime(value: &str) -> Result<DateTime<Utc>> {
	DateTime::parse_from_rfc3339(value)
		.map(|dt| dt.with_timezone(&Utc))
		.map_err(|e| StoreError::Database(sqlx::Error::Decode(Box::new(e))))
}

#[derive(Debug, FromRow)]
pub(crate) struct JobRow {
	pub id: i64,
	pub host: String,
	pub user: String,
	pub crabid: Option<String>,
	pub command: String,
	pub time: Option<String>,
	pub timezone: Option<String>,
	pub installed_at: String,
	pub deleted_at: Option<String>,
}

impl TryFrom<JobRow> for Job {
	type Error = StoreError;

	fn try_from(row: JobRow) -> Result<Self> {
		Ok(Job {
			id: JobId(row.id),
			host: row.host,
			user: row.user,
			crabid: row.crabid,
			command: row.command,
			time: row.time,
			timezone: row.timezone,
			installed_at: parse_datetime(&row.installed_at)?,
			deleted_at: row.deleted_at.as_deref().map(parse_datetime).transpose()?,
		})
	}
}

#[derive(Debug, FromRow)]
pub(crate) struct JobConfigRow {
	pub id: i64,
	pub job_id: Option<i64>,
	pub graceperiod_minutes: i64,
	pub timeout_minutes: i64,
	pub success_pattern: Option<String>,
	pub warning_pattern: Option<String>,
	pub fail_pattern: Option<String>,
	pub note: Option<String>,
	pub inhibit: i64,
}

impl From<JobConfigRow> for JobConfig {
	fn from(row: JobConfigRow) -> Self {
		JobConfig {
			id: row.id,
			job_id: row.job_id.map(JobId),
			graceperiod_minutes: row.graceperiod_minutes as u32,
			timeout_minutes: row.timeout_minutes as u32,
			success_pattern: row.success_pattern,
			warning_pattern: row.warning_pattern,
			fail_pattern: row.fail_pattern,
			note: row.note,
			inhibit: row.inhibit != 0,
		}
	}
}

#[derive(Debug, FromRow)]
pub(crate) struct StartRow {
	pub event_id: i64,
	pub job_id: i64,
	pub datetime: String,
	pub command: String,
}

impl TryFrom<StartRow> for StartEvent {
	type Error = StoreError;

	fn try_from(row: StartRow) -> Result<Self> {
		Ok(StartEvent {
			event_id: row.event_id,
			job_id: JobId(row.job_id),
			datetime: parse_datetime(&row.datetime)?,
			command: row.command,
		})
	}
}

#[derive(Debug, FromRow)]
pub(crate) struct FinishRow {
	pub event_id: i64,
	pub job_id: i64,
	pub datetime: String,
	pub command: String,
	pub status: i64,
}

impl TryFrom<FinishRow> for FinishEvent {
	type Error = StoreError;

	fn try_from(row: FinishRow) -> Result<Self> {
		Ok(FinishEvent {
			event_id: row.event_id,
			job_id: JobId(row.job_id),
			datetime: parse_datetime(&row.datetime)?,
			command: row.command,
			status: StatusCode::try_from(row.status as i32)?,
		})
	}
}

#[derive(Debug, FromRow)]
pub(crate) struct AlarmRow {
	pub event_id: i64,
	pub job_id: i64,
	pub datetime: String,
	pub status: i64,
}

impl TryFrom<AlarmRow> for AlarmEvent {
	type Error = StoreError;

	fn try_from(row: AlarmRow) -> Result<Self> {
		Ok(AlarmEvent {
			event_id: row.event_id,
			job_id: JobId(row.job_id),
			datetime: parse_datetime(&row.datetime)?,
			status: StatusCode::try_from(row.status as i32)?,
		})
	}
}

/// Merge the three append-only tables into one timeline, ordered by
/// `(datetime, kind_rank)` as `Event::kind_rank` defines it.
pub(crate) fn merge_events(
	mut starts: Vec<StartRow>,
	mut finishes: Vec<FinishRow>,
	mut alarms: Vec<AlarmRow>,
) -> Result<Vec<Event>> {
	let mut events = Vec::with_capacity(starts.len() + finishes.len() + alarms.len());
	for row in starts.drain(..) {
		events.push(Event::Start(StartEvent::try_from(row)?));
	}
	for row in finishes.drain(..) {
		events.push(Event::Finish(FinishEvent::try_from(row)?));
	}
	for row in alarms.drain(..) {
		events.push(Event::Alarm(AlarmEvent::try_from(row)?));
	}
	events.sort_by(|a, b| a.datetime().cmp(&b.datetime()).then(a.kind_rank().cmp(&b.kind_rank())));
	Ok(events)
}

#[derive(Debug, FromRow)]
pub(crate) struct NotifyRow {
	pub id: i64,
	pub job_id: Option<i64>,
	pub host: Option<String>,
	pub user: Option<String>,
	pub method: String,
	pub address: String,
	pub time: Option<String>,
	pub timezone: Option<String>,
	pub skip_ok: i64,
	pub skip_warning: i64,
	pub skip_error: i64,
	pub include_output: i64,
}

impl TryFrom<NotifyRow> for Notification {
	type Error = StoreError;

	fn try_from(row: NotifyRow) -> Result<Self> {
		Ok(Notification {
			id: NotificationId(row.id),
			job_id: row.job_id.map(JobId),
			host: row.host,
			user: row.user,
			method: row.method.parse::<NotificationMethod>().map_err(StoreError::Core)?,
			address: row.address,
			time: row.time,
			timezone: row.timezone,
			skip_ok: row.skip_ok != 0,
			skip_warning: row.skip_warning != 0,
			skip_error: row.skip_error != 0,
			include_output: row.include_output != 0,
		})
	}
}
