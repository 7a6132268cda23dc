// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tokio::sync::Mutex;
use tracing::instrument;

use cadence_core::{
	Event, FinishEvent, Job, JobConfig, JobId, Notification, NotificationId, StatusCode,
};
use cadence_crontab::{parse_crontab, validate_unique_crabids, write_crontab, CrontabRule};

use crate::error::{Result, StoreError};
use crate::guard::StoreGuard;
use crate::models::{self, AlarmRow, FinishRow, JobConfigRow, JobRow, NotifyRow, StartRow};
use crate::reconciler::{self, CheckJobRequest};

/// Filter for `Store::get_jobs`; every field is an optional narrowing
/// predicate, `None` meaning "don't filter on this".
#[derive(Debug, Clone, Default)]
pub struct JobFilter {
	pub host: Option<String>,
	pub user: Option<String>,
	pub include_deleted: bool,
	pub crabid: Option<String>,
	pub command: Option<String>,
	pub without_crabid: bool,
}

#[derive(Debug, Clone, Default)]
pub struct JobFields {
	pub command: Option<String>,
	pub time: Option<String>,
	pub timezone: Option<String>,
}

#[async_trait]
pub trait Store: Send + Sync {
	async fn get_jobs(&self, filter: JobFilter) -> Result<Vec<Job>>;
	async fn check_job(&self, req: CheckJobRequest) -> Result<JobId>;
	async fn delete_job(&self, id: JobId) -> Result<()>;
	async fn update_job(&self, id: JobId, fields: JobFields) -> Result<()>;

	/// Returns the resolved job id and whether the job is currently
	/// inhibited (in which case the caller should not actually start it).
	async fn log_start(&self, host: &str, user: &str, crabid: Option<&str>, command: &str) -> Result<(JobId, bool)>;
	async fn log_finish(
		&self,
		host: &str,
		user: &str,
		crabid: Option<&str>,
		command: &str,
		status: StatusCode,
		stdout: Option<&str>,
		stderr: Option<&str>,
	) -> Result<JobId>;
	async fn log_alarm(&self, job_id: JobId, status: StatusCode) -> Result<()>;

	async fn get_job_info(&self, id: JobId) -> Result<Option<Job>>;
	async fn get_job_config(&self, id: JobId) -> Result<Option<JobConfig>>;
	async fn write_job_config(&self, config: JobConfig) -> Result<JobConfig>;
	async fn disable_inhibit(&self, id: JobId) -> Result<()>;
	async fn get_orphan_configs(&self) -> Result<Vec<JobConfig>>;
	async fn relink_job_config(&self, config_id: i64, job_id: JobId) -> Result<()>;

	async fn get_job_events(
		&self,
		id: JobId,
		limit: Option<i64>,
		start: Option<DateTime<Utc>>,
		end: Option<DateTime<Utc>>,
	) -> Result<Vec<Event>>;
	async fn get_events_since(&self, after_start: i64, after_alarm: i64, after_finish: i64) -> Result<Vec<Event>>;
	async fn get_job_finishes(
		&self,
		id: JobId,
		limit: Option<i64>,
		before: Option<DateTime<Utc>>,
		after: Option<DateTime<Utc>>,
	) -> Result<Vec<FinishEvent>>;
	async fn get_fail_events(&self, limit: i64) -> Result<Vec<FinishEvent>>;
	async fn delete_old_events(&self, before: DateTime<Utc>) -> Result<u64>;

	async fn get_job_output(&self, finish_event_id: i64) -> Result<Option<(String, String)>>;

	async fn write_raw_crontab(&self, host: &str, user: &str, lines: &[String]) -> Result<()>;
	async fn get_raw_crontab(&self, host: &str, user: &str) -> Result<Vec<String>>;
	async fn get_crontab(&self, host: &str, user: &str) -> Result<Vec<String>>;
	async fn save_crontab(
		&self,
		host: &str,
		user: &str,
		lines: Vec<String>,
		default_timezone: Option<String>,
	) -> Result<Vec<String>>;

	async fn get_notifications(&self) -> Result<Vec<Notification>>;
	async fn get_job_notifications(&self, config_id: i64) -> Result<Vec<Notification>>;
	async fn get_match_notifications(&self, host: Option<&str>, user: Option<&str>) -> Result<Vec<Notification>>;
	async fn write_notification(&self, notification: Notification) -> Result<Notification>;
	async fn delete_notification(&self, id: NotificationId) -> Result<()>;
}

/// SQLite-backed `Store`. All mutations (and, per the scoped-lock
/// discipline, all reads) run through `acquire`, so cross-statement
/// consistency holds even though SQLite only serializes writers at the
/// file level.
#[derive(Clone)]
pub struct SqliteStore {
	pool: SqlitePool,
	lock: Arc<Mutex<()>>,
}

impl SqliteStore {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool, lock: Arc::new(Mutex::new(())) }
	}

	async fn acquire(&self) -> Result<StoreGuard> {
		StoreGuard::acquire(&self.pool, &self.lock).await
	}
}

#[async_trait]
impl Store for SqliteStore {
	#[instrument(skip(self))]
	async fn get_jobs(&self, filter: JobFilter) -> Result<Vec<Job>> {
		let mut guard = self.acquire().await?;
		let mut sql = String::from(
			"SELECT id, host, user, crabid, command, time, timezone, installed_at, deleted_at FROM job WHERE 1 = 1",
		);
		if filter.host.is_some() {
			sql.push_str(" AND host = ?");
		}
		if filter.user.is_some() {
			sql.push_str(" AND user = ?");
		}
		if !filter.include_deleted {
			sql.push_str(" AND deleted_at IS NULL");
		}
		if filter.crabid.is_some() {
			sql.push_str(" AND crabid = ?");
		}
		if filter.command.is_some() {
			sql.push_str(" AND command = ?");
		}
		if filter.without_crabid {
			sql.push_str(" AND crabid IS NULL");
		}
		sql.push_str(" ORDER BY id ASC");

		let mut query = sqlx::query_as::<_, JobRow>(&sql);
		if let Some(host) = &filter.host {
			query = query.bind(host);
		}
		if let Some(user) = &filter.user {
			query = query.bind(user);
		}
		if let Some(crabid) = &filter.crabid {
			query = query.bind(crabid);
		}
		if let Some(command) = &filter.command {
			query = query.bind(command);
		}

		let rows = query.fetch_all(&mut *guard.tx()).await?;
		guard.commit().await?;
		rows.into_iter().map(TryInto::try_into).collect()
	}

	#[instrument(skip(self))]
	async fn check_job(&self, req: CheckJobRequest) -> Result<JobId> {
		let mut guard = self.acquire().await?;
		let id = reconciler::check_job(guard.tx(), &req).await?;
		guard.commit().await?;
		Ok(id)
	}

	#[instrument(skip(self))]
	async fn delete_job(&self, id: JobId) -> Result<()> {
		let mut guard = self.acquire().await?;
		sqlx::query("UPDATE job SET deleted_at = ? WHERE id = ? AND deleted_at IS NULL")
			.bind(Utc::now().to_rfc3339())
			.bind(id.0)
			.execute(&mut *guard.tx())
			.await?;
		guard.commit().await
	}

	#[instrument(skip(self))]
	async fn update_job(&self, id: JobId, fields: JobFields) -> Result<()> {
		let mut guard = self.acquire().await?;
		let existing = sqlx::query_as::<_, JobRow>(
			"SELECT id, host, user, crabid, command, time, timezone, installed_at, deleted_at FROM job WHERE id = ?",
		)
		.bind(id.0)
		.fetch_optional(&mut *guard.tx())
		.await?
		.ok_or(StoreError::JobNotFound)?;

		let command = fields.command.unwrap_or(existing.command);
		let time = fields.time.or(existing.time);
		let timezone = fields.timezone.or(existing.timezone);

		sqlx::query(
			"UPDATE job SET command = ?, time = ?, timezone = ?, installed_at = ?, deleted_at = NULL WHERE id = ?",
		)
		.bind(command)
		.bind(time)
		.bind(timezone)
		.bind(Utc::now().to_rfc3339())
		.bind(id.0)
		.execute(&mut *guard.tx())
		.await?;
		guard.commit().await
	}

	#[instrument(skip(self))]
	async fn log_start(&self, host: &str, user: &str, crabid: Option<&str>, command: &str) -> Result<(JobId, bool)> {
		let mut guard = self.acquire().await?;
		let req = CheckJobRequest {
			host: host.to_string(),
			user: user.to_string(),
			crabid: crabid.map(str::to_string),
			command: command.to_string(),
			time: None,
			timezone: None,
		};
		let job_id = reconciler::check_job(guard.tx(), &req).await?;

		let inhibit = sqlx::query_scalar::<_, i64>("SELECT inhibit FROM jobconfig WHERE job_id = ?")
			.bind(job_id.0)
			.fetch_optional(&mut *guard.tx())
			.await?
			.unwrap_or(0)
			!= 0;

		sqlx::query("INSERT INTO jobstart (job_id, datetime, command) VALUES (?, ?, ?)")
			.bind(job_id.0)
			.bind(Utc::now().to_rfc3339())
			.bind(command)
			.execute(&mut *guard.tx())
			.await?;

		guard.commit().await?;
		Ok((job_id, inhibit))
	}

	#[instrument(skip(self, stdout, stderr))]
	async fn log_finish(
		&self,
		host: &str,
		user: &str,
		crabid: Option<&str>,
		command: &str,
		status: StatusCode,
		stdout: Option<&str>,
		stderr: Option<&str>,
	) -> Result<JobId> {
		let mut guard = self.acquire().await?;
		let req = CheckJobRequest {
			host: host.to_string(),
			user: user.to_string(),
			crabid: crabid.map(str::to_string),
			command: command.to_string(),
			time: None,
			timezone: None,
		};
		let job_id = reconciler::check_job(guard.tx(), &req).await?;

		let config = sqlx::query_as::<_, JobConfigRow>(
			"SELECT id, job_id, graceperiod_minutes, timeout_minutes, success_pattern, warning_pattern, \
			 fail_pattern, note, inhibit FROM jobconfig WHERE job_id = ?",
		)
		.bind(job_id.0)
		.fetch_optional(&mut *guard.tx())
		.await?;

		let reclassified = reclassify(status, stdout, stderr, config.as_ref());

		let event_id = sqlx::query("INSERT INTO jobfinish (job_id, datetime, command, status) VALUES (?, ?, ?, ?)")
			.bind(job_id.0)
			.bind(Utc::now().to_rfc3339())
			.bind(command)
			.bind(reclassified.code())
			.execute(&mut *guard.tx())
			.await?
			.last_insert_rowid();

		if stdout.is_some() || stderr.is_some() {
			sqlx::query("INSERT INTO joboutput (finish_event_id, stdout, stderr) VALUES (?, ?, ?)")
				.bind(event_id)
				.bind(stdout.unwrap_or_default())
				.bind(stderr.unwrap_or_default())
				.execute(&mut *guard.tx())
				.await?;
		}

		guard.commit().await?;
		Ok(job_id)
	}

	#[instrument(skip(self))]
	async fn log_alarm(&self, job_id: JobId, status: StatusCode) -> Result<()> {
		let mut guard = self.acquire().await?;
		sqlx::query("INSERT INTO jobalarm (job_id, datetime, status) VALUES (?, ?, ?)")
			.bind(job_id.0)
			.bind(Utc::now().to_rfc3339())
			.bind(status.code())
			.execute(&mut *guard.tx())
			.await?;
		guard.commit().await
	}

	#[instrument(skip(self))]
	async fn get_job_info(&self, id: JobId) -> Result<Option<Job>> {
		let mut guard = self.acquire().await?;
		let row = sqlx::query_as::<_, JobRow>(
			"SELECT id, host, user, crabid, command, time, timezone, installed_at, deleted_at FROM job WHERE id = ?",
		)
		.bind(id.0)
		.fetch_optional(&mut *guard.tx())
		.await?;
		guard.commit().await?;
		row.map(TryInto::try_into).transpose()
	}

	#[instrument(skip(self))]
	async fn get_job_config(&self, id: JobId) -> Result<Option<JobConfig>> {
		let mut guard = self.acquire().await?;
		let row = sqlx::query_as::<_, JobConfigRow>(
			"SELECT id, job_id, graceperiod_minutes, timeout_minutes, success_pattern, warning_pattern, \
			 fail_pattern, note, inhibit FROM jobconfig WHERE job_id = ?",
		)
		.bind(id.0)
		.fetch_optional(&mut *guard.tx())
		.await?;
		guard.commit().await?;
		Ok(row.map(Into::into))
	}

	#[instrument(skip(self, config))]
	async fn write_job_config(&self, config: JobConfig) -> Result<JobConfig> {
		let mut guard = self.acquire().await?;
		let job_id = config.job_id.map(|j| j.0);
		let id = if config.id == 0 {
			sqlx::query(
				"INSERT INTO jobconfig (job_id, graceperiod_minutes, timeout_minutes, success_pattern, \
				 warning_pattern, fail_pattern, note, inhibit) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
			)
			.bind(job_id)
			.bind(config.graceperiod_minutes as i64)
			.bind(config.timeout_minutes as i64)
			.bind(&config.success_pattern)
			.bind(&config.warning_pattern)
			.bind(&config.fail_pattern)
			.bind(&config.note)
			.bind(config.inhibit as i64)
			.execute(&mut *guard.tx())
			.await?
			.last_insert_rowid()
		} else {
			sqlx::query(
				"UPDATE jobconfig SET job_id = ?, graceperiod_minutes = ?, timeout_minutes = ?, \
				 success_pattern = ?, warning_pattern = ?, fail_pattern = ?, note = ?, inhibit = ? WHERE id = ?",
			)
			.bind(job_id)
			.bind(config.graceperiod_minutes as i64)
			.bind(config.timeout_minutes as i64)
			.bind(&config.success_pattern)
			.bind(&config.warning_pattern)
			.bind(&config.fail_pattern)
			.bind(&config.note)
			.bind(config.inhibit as i64)
			.bind(config.id)
			.execute(&mut *guard.tx())
			.await?;
			config.id
		};
		guard.commit().await?;
		Ok(JobConfig { id, ..config })
	}

	#[instrument(skip(self))]
	async fn disable_inhibit(&self, id: JobId) -> Result<()> {
		let mut guard = self.acquire().await?;
		sqlx::query("UPDATE jobconfig SET inhibit = 0 WHERE job_id = ?")
			.bind(id.0)
			.execute(&mut *guard.tx())
			.await?;
		guard.commit().await
	}

	#[instrument(skip(self))]
	async fn get_orphan_configs(&self) -> Result<Vec<JobConfig>> {
		let mut guard = self.acquire().await?;
		let rows = sqlx::query_as::<_, JobConfigRow>(
			"SELECT id, job_id, graceperiod_minutes, timeout_minutes, success_pattern, warning_pattern, \
			 fail_pattern, note, inhibit FROM jobconfig WHERE job_id IS NULL",
		)
		.fetch_all(&mut *guard.tx())
		.await?;
		guard.commit().await?;
		Ok(rows.into_iter().map(Into::into).collect())
	}

	#[instrument(skip(self))]
	async fn relink_job_config(&self, config_id: i64, job_id: JobId) -> Result<()> {
		let mut guard = self.acquire().await?;
		sqlx::query("UPDATE jobconfig SET job_id = ? WHERE id = ?")
			.bind(job_id.0)
			.bind(config_id)
			.execute(&mut *guard.tx())
			.await?;
		guard.commit().await
	}

	#[instrument(skip(self))]
	async fn get_job_events(
		&self,
		id: JobId,
		limit: Option<i64>,
		start: Option<DateTime<Utc>>,
		end: Option<DateTime<Utc>>,
	) -> Result<Vec<Event>> {
		let mut guard = self.acquire().await?;
		let start = start.map(|d| d.to_rfc3339()).unwrap_or_default();
		let end = end.map(|d| d.to_rfc3339());
		let limit = limit.unwrap_or(i64::MAX);

		let starts = sqlx::query_as::<_, StartRow>(
			"SELECT event_id, job_id, datetime, command FROM jobstart \
			 WHERE job_id = ? AND datetime >= ? AND (? IS NULL OR datetime <= ?) ORDER BY datetime DESC LIMIT ?",
		)
		.bind(id.0)
		.bind(&start)
		.bind(&end)
		.bind(&end)
		.bind(limit)
		.fetch_all(&mut *guard.tx())
		.await?;

		let finishes = sqlx::query_as::<_, FinishRow>(
			"SELECT event_id, job_id, datetime, command, status FROM jobfinish \
			 WHERE job_id = ? AND datetime >= ? AND (? IS NULL OR datetime <= ?) ORDER BY datetime DESC LIMIT ?",
		)
		.bind(id.0)
		.bind(&start)
		.bind(&end)
		.bind(&end)
		.bind(limit)
		.fetch_all(&mut *guard.tx())
		.await?;

		let alarms = sqlx::query_as::<_, AlarmRow>(
			"SELECT event_id, job_id, datetime, status FROM jobalarm \
			 WHERE job_id = ? AND datetime >= ? AND (? IS NULL OR datetime <= ?) ORDER BY datetime DESC LIMIT ?",
		)
		.bind(id.0)
		.bind(&start)
		.bind(&end)
		.bind(&end)
		.bind(limit)
		.fetch_all(&mut *guard.tx())
		.await?;

		guard.commit().await?;
		let mut events = models::merge_events(starts, finishes, alarms)?;
		events.sort_by(|a, b| b.datetime().cmp(&a.datetime()).then(b.kind_rank().cmp(&a.kind_rank())));
		events.truncate(limit.max(0) as usize);
		Ok(events)
	}

	#[instrument(skip(self))]
	async fn get_events_since(&self, after_start: i64, after_alarm: i64, after_finish: i64) -> Result<Vec<Event>> {
		let mut guard = self.acquire().await?;
		let starts = sqlx::query_as::<_, StartRow>(
			"SELECT event_id, job_id, datetime, command FROM jobstart WHERE event_id > ? ORDER BY event_id ASC",
		)
		.bind(after_start)
		.fetch_all(&mut *guard.tx())
		.await?;

		let finishes = sqlx::query_as::<_, FinishRow>(
			"SELECT event_id, job_id, datetime, command, status FROM jobfinish WHERE event_id > ? ORDER BY event_id ASC",
		)
		.bind(after_finish)
		.fetch_all(&mut *guard.tx())
		.await?;

		let alarms = sqlx::query_as::<_, AlarmRow>(
			"SELECT event_id, job_id, datetime, status FROM jobalarm WHERE event_id > ? ORDER BY event_id ASC",
		)
		.bind(after_alarm)
		.fetch_all(&mut *guard.tx())
		.await?;

		guard.commit().await?;
		models::merge_events(starts, finishes, alarms)
	}

	#[instrument(skip(self))]
	async fn get_job_finishes(
		&self,
		id: JobId,
		limit: Option<i64>,
		before: Option<DateTime<Utc>>,
		after: Option<DateTime<Utc>>,
	) -> Result<Vec<FinishEvent>> {
		let mut guard = self.acquire().await?;
		let before = before.map(|d| d.to_rfc3339());
		let after = after.map(|d| d.to_rfc3339());
		let limit = limit.unwrap_or(50);

		let rows = sqlx::query_as::<_, FinishRow>(
			"SELECT event_id, job_id, datetime, command, status FROM jobfinish \
			 WHERE job_id = ? AND (? IS NULL OR datetime < ?) AND (? IS NULL OR datetime > ?) \
			 ORDER BY datetime DESC LIMIT ?",
		)
		.bind(id.0)
		.bind(&before)
		.bind(&before)
		.bind(&after)
		.bind(&after)
		.bind(limit)
		.fetch_all(&mut *guard.tx())
		.await?;

		guard.commit().await?;
		rows.into_iter().map(TryInto::try_into).collect()
	}

	#[instrument(skip(self))]
	async fn get_fail_events(&self, limit: i64) -> Result<Vec<FinishEvent>> {
		let mut guard = self.acquire().await?;
		let rows = sqlx::query_as::<_, FinishRow>(
			"SELECT event_id, job_id, datetime, command, status FROM jobfinish \
			 WHERE status IN (?, ?, ?) ORDER BY datetime DESC LIMIT ?",
		)
		.bind(StatusCode::Fail.code())
		.bind(StatusCode::CouldNotStart.code())
		.bind(StatusCode::Timeout.code())
		.bind(limit)
		.fetch_all(&mut *guard.tx())
		.await?;
		guard.commit().await?;
		rows.into_iter().map(TryInto::try_into).collect()
	}

	#[instrument(skip(self))]
	async fn delete_old_events(&self, before: DateTime<Utc>) -> Result<u64> {
		let mut guard = self.acquire().await?;
		let before = before.to_rfc3339();
		let mut affected = 0;
		affected += sqlx::query("DELETE FROM jobstart WHERE datetime < ?")
			.bind(&before)
			.execute(&mut *guard.tx())
			.await?
			.rows_affected();
		affected += sqlx::query(
			"DELETE FROM joboutput WHERE finish_event_id IN (SELECT event_id FROM jobfinish WHERE datetime < ?)",
		)
		.bind(&before)
		.execute(&mut *guard.tx())
		.await?
		.rows_affected();
		affected += sqlx::query("DELETE FROM jobfinish WHERE datetime < ?")
			.bind(&before)
			.execute(&mut *guard.tx())
			.await?
			.rows_affected();
		affected += sqlx::query("DELETE FROM jobalarm WHERE datetime < ?")
			.bind(&before)
			.execute(&mut *guard.tx())
			.await?
			.rows_affected();
		guard.commit().await?;
		Ok(affected)
	}

	#[instrument(skip(self))]
	async fn get_job_output(&self, finish_event_id: i64) -> Result<Option<(String, String)>> {
		let mut guard = self.acquire().await?;
		let row = sqlx::query_as::<_, (String, String)>("SELECT stdout, stderr FROM joboutput WHERE finish_event_id = ?")
			.bind(finish_event_id)
			.fetch_optional(&mut *guard.tx())
			.await?;
		guard.commit().await?;
		Ok(row)
	}

	#[instrument(skip(self, lines))]
	async fn write_raw_crontab(&self, host: &str, user: &str, lines: &[String]) -> Result<()> {
		let mut guard = self.acquire().await?;
		let joined = lines.join("\n");
		sqlx::query(
			"INSERT INTO rawcrontab (host, user, lines) VALUES (?, ?, ?) \
			 ON CONFLICT(host, user) DO UPDATE SET lines = excluded.lines",
		)
		.bind(host)
		.bind(user)
		.bind(joined)
		.execute(&mut *guard.tx())
		.await?;
		guard.commit().await
	}

	#[instrument(skip(self))]
	async fn get_raw_crontab(&self, host: &str, user: &str) -> Result<Vec<String>> {
		let mut guard = self.acquire().await?;
		let row = sqlx::query_scalar::<_, String>("SELECT lines FROM rawcrontab WHERE host = ? AND user = ?")
			.bind(host)
			.bind(user)
			.fetch_optional(&mut *guard.tx())
			.await?;
		guard.commit().await?;
		Ok(row.map(|text| text.lines().map(str::to_string).collect()).unwrap_or_default())
	}

	#[instrument(skip(self))]
	async fn get_crontab(&self, host: &str, user: &str) -> Result<Vec<String>> {
		let jobs = self.get_jobs(JobFilter { host: Some(host.to_string()), user: Some(user.to_string()), ..Default::default() }).await?;
		let rules: Vec<CrontabRule> = jobs
			.into_iter()
			.map(|job| CrontabRule {
				crabid: job.crabid,
				command: job.command,
				time: job.time.unwrap_or_default(),
				timezone: job.timezone,
				input: None,
				vars: Default::default(),
				raw: String::new(),
			})
			.collect();
		Ok(write_crontab(&rules))
	}

	#[instrument(skip(self, lines))]
	async fn save_crontab(
		&self,
		host: &str,
		user: &str,
		lines: Vec<String>,
		default_timezone: Option<String>,
	) -> Result<Vec<String>> {
		let mut guard = self.acquire().await?;

		let joined = lines.join("\n");
		sqlx::query(
			"INSERT INTO rawcrontab (host, user, lines) VALUES (?, ?, ?) \
			 ON CONFLICT(host, user) DO UPDATE SET lines = excluded.lines",
		)
		.bind(host)
		.bind(user)
		.bind(&joined)
		.execute(&mut *guard.tx())
		.await?;

		let (rules, mut warnings) = parse_crontab(&lines, default_timezone);
		if let Err(e) = validate_unique_crabids(&rules) {
			warnings.push(e.to_string());
		}

		let mut seen = Vec::with_capacity(rules.len());
		for rule in &rules {
			let req = CheckJobRequest {
				host: host.to_string(),
				user: user.to_string(),
				crabid: rule.crabid.clone(),
				command: rule.command.clone(),
				time: Some(rule.time.clone()),
				timezone: rule.timezone.clone(),
			};
			seen.push(reconciler::check_job(guard.tx(), &req).await?);
		}

		let sql = if seen.is_empty() {
			"UPDATE job SET deleted_at = ? WHERE host = ? AND user = ? AND deleted_at IS NULL".to_string()
		} else {
			let placeholders = std::iter::repeat("?").take(seen.len()).collect::<Vec<_>>().join(",");
			format!("UPDATE job SET deleted_at = ? WHERE host = ? AND user = ? AND deleted_at IS NULL AND id NOT IN ({placeholders})")
		};
		let mut query = sqlx::query(&sql).bind(Utc::now().to_rfc3339()).bind(host).bind(user);
		for id in &seen {
			query = query.bind(id.0);
		}
		query.execute(&mut *guard.tx()).await?;

		guard.commit().await?;
		Ok(warnings)
	}

	#[instrument(skip(self))]
	async fn get_notifications(&self) -> Result<Vec<Notification>> {
		let mut guard = self.acquire().await?;
		let rows = sqlx::query_as::<_, NotifyRow>(
			"SELECT id, job_id, host, user, method, address, time, timezone, skip_ok, skip_warning, skip_error, \
			 include_output FROM jobnotify",
		)
		.fetch_all(&mut *guard.tx())
		.await?;
		guard.commit().await?;
		rows.into_iter().map(TryInto::try_into).collect()
	}

	#[instrument(skip(self))]
	async fn get_job_notifications(&self, config_id: i64) -> Result<Vec<Notification>> {
		let mut guard = self.acquire().await?;
		let rows = sqlx::query_as::<_, NotifyRow>(
			"SELECT id, job_id, host, user, method, address, time, timezone, skip_ok, skip_warning, skip_error, \
			 include_output FROM jobnotify WHERE job_id = ?",
		)
		.bind(config_id)
		.fetch_all(&mut *guard.tx())
		.await?;
		guard.commit().await?;
		rows.into_iter().map(TryInto::try_into).collect()
	}

	#[instrument(skip(self))]
	async fn get_match_notifications(&self, host: Option<&str>, user: Option<&str>) -> Result<Vec<Notification>> {
		let mut guard = self.acquire().await?;
		let rows = sqlx::query_as::<_, NotifyRow>(
			"SELECT id, job_id, host, user, method, address, time, timezone, skip_ok, skip_warning, skip_error, \
			 include_output FROM jobnotify \
			 WHERE job_id IS NULL AND (host IS NULL OR host = ?) AND (user IS NULL OR user = ?)",
		)
		.bind(host)
		.bind(user)
		.fetch_all(&mut *guard.tx())
		.await?;
		guard.commit().await?;
		rows.into_iter().map(TryInto::try_into).collect()
	}

	#[instrument(skip(self, notification))]
	async fn write_notification(&self, notification: Notification) -> Result<Notification> {
		let mut guard = self.acquire().await?;
		let job_id = notification.job_id.map(|j| j.0);
		let id = if notification.id.0 == 0 {
			sqlx::query(
				"INSERT INTO jobnotify (job_id, host, user, method, address, time, timezone, skip_ok, \
				 skip_warning, skip_error, include_output) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
			)
			.bind(job_id)
			.bind(&notification.host)
			.bind(&notification.user)
			.bind(notification.method.to_string())
			.bind(&notification.address)
			.bind(&notification.time)
			.bind(&notification.timezone)
			.bind(notification.skip_ok as i64)
			.bind(notification.skip_warning as i64)
			.bind(notification.skip_error as i64)
			.bind(notification.include_output as i64)
			.execute(&mut *guard.tx())
			.await?
			.last_insert_rowid()
		} else {
			sqlx::query(
				"UPDATE jobnotify SET job_id = ?, host = ?, user = ?, method = ?, address = ?, time = ?, \
				 timezone = ?, skip_ok = ?, skip_warning = ?, skip_error = ?, include_output = ? WHERE id = ?",
			)
			.bind(job_id)
			.bind(&notification.host)
			.bind(&notification.user)
			.bind(notification.method.to_string())
			.bind(&notification.address)
			.bind(&notification.time)
			.bind(&notification.timezone)
			.bind(notification.skip_ok as i64)
			.bind(notification.skip_warning as i64)
			.bind(notification.skip_error as i64)
			.bind(notification.include_output as i64)
			.bind(notification.id.0)
			.execute(&mut *guard.tx())
			.await?;
			notification.id.0
		};
		guard.commit().await?;
		Ok(Notification { id: NotificationId(id), ..notification })
	}

	#[instrument(skip(self))]
	async fn delete_notification(&self, id: NotificationId) -> Result<()> {
		let mut guard = self.acquire().await?;
		sqlx::query("DELETE FROM jobnotify WHERE id = ?")
			.bind(id.0)
			.execute(&mut *guard.tx())
			.await?;
		guard.commit().await
	}
}

/// Status-pattern reclassification: run only from `log_finish`, never
/// retroactively, and never touches ALREADYRUNNING or an already-error
/// status.
fn reclassify(status: StatusCode, stdout: Option<&str>, stderr: Option<&str>, config: Option<&JobConfigRow>) -> StatusCode {
	if status == StatusCode::AlreadyRunning || status.is_error() {
		return status;
	}
	let Some(config) = config else { return status };

	let combined = format!("{}\n{}", stdout.unwrap_or_default(), stderr.unwrap_or_default());
	let matches = |pattern: &Option<String>| {
		pattern.as_deref().and_then(|p| regex::Regex::new(p).ok()).is_some_and(|re| re.is_match(&combined))
	};

	if matches(&config.fail_pattern) {
		return StatusCode::Fail;
	}
	if status.is_warning() {
		return status;
	}
	if matches(&config.warning_pattern) {
		return StatusCode::Warning;
	}
	if matches(&config.success_pattern) {
		return StatusCode::Success;
	}
	if config.success_pattern.is_some() {
		return if config.fail_pattern.is_some() { StatusCode::Unknown } else { StatusCode::Fail };
	}
	status
}
