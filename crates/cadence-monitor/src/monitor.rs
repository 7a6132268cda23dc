// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! The Monitor bootstraps an in-memory status map from stored history,
//! polls for new events, advances the minute-aligned scheduling tick, and
//! serves long-poll waiters. It is the only component that writes alarm
//! rows.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use cadence_core::{Event, Job, JobConfig, JobId, JobState, StatusCode};
use cadence_schedule::Schedule;
use cadence_store::{JobFilter, Store};
use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, Mutex, Notify, RwLock};
use tracing::instrument;

use crate::error::Result;
use crate::ticker::Ticker;

struct Tracked {
	config: Option<JobConfig>,
	schedule: Option<Schedule>,
	state: JobState,
}

struct Inner {
	jobs: HashMap<JobId, Tracked>,
	max_start_id: i64,
	max_alarm_id: i64,
	max_finish_id: i64,
	num_warning: usize,
	num_error: usize,
	last_start: HashMap<JobId, DateTime<Utc>>,
	running_timeout: HashMap<JobId, DateTime<Utc>>,
	missed_timeout: HashMap<JobId, DateTime<Utc>>,
}

impl Inner {
	fn new() -> Self {
		Self {
			jobs: HashMap::new(),
			max_start_id: 0,
			max_alarm_id: 0,
			max_finish_id: 0,
			num_warning: 0,
			num_error: 0,
			last_start: HashMap::new(),
			running_timeout: HashMap::new(),
			missed_timeout: HashMap::new(),
		}
	}

	/// Status precedence plus the START/FINISH/TIMEOUT transitions on
	/// `running`. A no-op if the job isn't tracked (caller bootstraps first).
	fn process_event(&mut self, id: JobId, ev: &Event) {
		let Some(tracked) = self.jobs.get_mut(&id) else { return };
		match ev {
			Event::Start(s) => {
				tracked.state.running = true;
				self.last_start.insert(id, s.datetime);
				self.running_timeout.insert(id, s.datetime + tracked.state.timeout);
				self.missed_timeout.remove(&id);
			}
			Event::Finish(f) => {
				tracked.state.running = false;
				tracked.state.merge_status(f.status);
				self.running_timeout.remove(&id);
			}
			Event::Alarm(a) => {
				tracked.state.merge_status(a.status);
				if a.status == StatusCode::Timeout {
					tracked.state.running = false;
					self.running_timeout.remove(&id);
				}
				if a.status == StatusCode::Missed {
					self.missed_timeout.remove(&id);
				}
			}
		}
	}

	fn apply_late(&mut self, id: JobId) {
		if let Some(tracked) = self.jobs.get_mut(&id) {
			tracked.state.merge_status(StatusCode::Late);
		}
	}

	fn recompute_aggregates(&mut self) {
		self.num_warning = self.jobs.values().filter(|t| t.state.status.is_some_and(StatusCode::is_warning)).count();
		self.num_error = self.jobs.values().filter(|t| t.state.status.is_some_and(StatusCode::is_error)).count();
	}
}

/// Snapshot returned by `wait_for_event_since` and available to the
/// dashboard's summary endpoint.
#[derive(Debug, Clone)]
pub struct StatusSnapshot {
	pub max_start_id: i64,
	pub max_alarm_id: i64,
	pub max_finish_id: i64,
	pub num_warning: usize,
	pub num_error: usize,
	pub jobs: HashMap<JobId, JobState>,
}

pub struct Monitor {
	store: Arc<dyn Store>,
	inner: RwLock<Inner>,
	notify: Notify,
	ticker: Mutex<Ticker>,
}

impl Monitor {
	/// Replays up to 40 most-recent events per non-deleted job through
	/// `process_event` so the in-memory status map matches durable history
	/// before the run loop starts.
	pub async fn bootstrap(store: Arc<dyn Store>) -> Result<Arc<Self>> {
		let monitor =
			Arc::new(Self { store, inner: RwLock::new(Inner::new()), notify: Notify::new(), ticker: Mutex::new(Ticker::new(Utc::now())) });
		let jobs = monitor.store.get_jobs(JobFilter::default()).await?;
		for job in jobs {
			monitor.bootstrap_job(job).await?;
		}
		Ok(monitor)
	}

	async fn bootstrap_job(&self, job: Job) -> Result<()> {
		let id = job.id;
		let config = self.store.get_job_config(id).await?;

		let schedule = match &job.time {
			None => None,
			Some(expr) => match Schedule::parse(expr, job.timezone.as_deref()) {
				Ok(schedule) => Some(schedule),
				Err(err) => {
					tracing::warn!(job_id = %id, %err, "failed to parse job schedule, treating as unscheduled");
					None
				}
			},
		};

		let mut state = JobState::bootstrap(&job);
		if let Some(config) = &config {
			state.graceperiod = config.graceperiod();
			state.timeout = config.timeout();
		}
		state.scheduled = schedule.is_some();

		let mut events = self.store.get_job_events(id, Some(40), None, None).await?;
		events.reverse();

		let mut inner = self.inner.write().await;
		inner.jobs.insert(id, Tracked { config, schedule, state });
		for ev in &events {
			inner.process_event(id, ev);
		}
		inner.recompute_aggregates();
		Ok(())
	}

	/// Runs one poll iteration: fetch events since the current cursors,
	/// fold them in, advance the ticker, and sweep timeouts. Exposed for
	/// callers (and tests) that want to drive the Monitor without waiting
	/// on the run loop's 5-second cadence.
	#[instrument(skip(self))]
	pub async fn poll(&self) -> Result<()> {
		let (after_start, after_alarm, after_finish) = {
			let inner = self.inner.read().await;
			(inner.max_start_id, inner.max_alarm_id, inner.max_finish_id)
		};
		let events = self.store.get_events_since(after_start, after_alarm, after_finish).await?;

		for ev in &events {
			let id = ev.job_id();
			let known = self.inner.read().await.jobs.contains_key(&id);
			if !known {
				match self.store.get_job_info(id).await? {
					Some(job) if !job.is_deleted() => self.bootstrap_job(job).await?,
					_ => continue,
				}
			}

			let mut inner = self.inner.write().await;
			match ev {
				Event::Start(s) => inner.max_start_id = inner.max_start_id.max(s.event_id),
				Event::Finish(f) => inner.max_finish_id = inner.max_finish_id.max(f.event_id),
				Event::Alarm(a) => inner.max_alarm_id = inner.max_alarm_id.max(a.event_id),
			}
			inner.process_event(id, ev);
		}

		if !events.is_empty() {
			let mut inner = self.inner.write().await;
			inner.recompute_aggregates();
			drop(inner);
			self.notify.notify_waiters();
		}

		self.advance_ticker().await?;
		self.sweep_timeouts().await?;
		Ok(())
	}

	async fn advance_ticker(&self) -> Result<()> {
		let now = Utc::now();
		let mut pending = Vec::new();
		{
			let mut ticker = self.ticker.lock().await;
			ticker.catch_up(now, |minute| pending.push(minute));
		}
		for minute in pending {
			if let Err(err) = self.tick(minute).await {
				tracing::error!(%err, "monitor tick failed, continuing");
			}
		}
		Ok(())
	}

	/// LATE detection against every scheduled job, followed by a
	/// reconciliation of the in-memory job set against the store.
	pub async fn tick(&self, minute: DateTime<Utc>) -> Result<()> {
		let mut late = Vec::new();
		{
			let inner = self.inner.read().await;
			for (id, tracked) in &inner.jobs {
				let Some(schedule) = &tracked.schedule else { continue };
				if !schedule.matches(minute) {
					continue;
				}
				let missed_grace = match inner.last_start.get(id) {
					None => true,
					Some(last) => *last + tracked.state.graceperiod < minute,
				};
				if missed_grace {
					late.push((*id, minute + tracked.state.graceperiod));
				}
			}
		}

		if !late.is_empty() {
			for (id, deadline) in &late {
				self.store.log_alarm(*id, StatusCode::Late).await?;
				let mut inner = self.inner.write().await;
				inner.apply_late(*id);
				inner.missed_timeout.insert(*id, *deadline);
			}
			let mut inner = self.inner.write().await;
			inner.recompute_aggregates();
			drop(inner);
			self.notify.notify_waiters();
		}

		self.reconcile_job_set().await
	}

	async fn reconcile_job_set(&self) -> Result<()> {
		let jobs = self.store.get_jobs(JobFilter::default()).await?;
		let seen: HashSet<JobId> = jobs.iter().map(|j| j.id).collect();

		for job in jobs {
			let id = job.id;
			let needs_bootstrap = {
				let inner = self.inner.read().await;
				match inner.jobs.get(&id) {
					None => true,
					Some(tracked) => tracked.state.installed_at < job.installed_at,
				}
			};
			if needs_bootstrap {
				self.bootstrap_job(job).await?;
				continue;
			}

			if let Some(config) = self.store.get_job_config(id).await? {
				let mut inner = self.inner.write().await;
				if let Some(tracked) = inner.jobs.get_mut(&id) {
					tracked.state.graceperiod = config.graceperiod();
					tracked.state.timeout = config.timeout();
					tracked.config = Some(config);
				}
			}
		}

		let mut inner = self.inner.write().await;
		let stale: Vec<JobId> = inner.jobs.keys().copied().filter(|id| !seen.contains(id)).collect();
		for id in stale {
			inner.jobs.remove(&id);
			inner.last_start.remove(&id);
			inner.running_timeout.remove(&id);
			inner.missed_timeout.remove(&id);
		}
		Ok(())
	}

	/// Promotes any missed-grace-period or running-timeout deadline that
	/// has passed into a MISSED/TIMEOUT alarm.
	pub async fn sweep_timeouts(&self) -> Result<()> {
		let now = Utc::now();
		let (missed, timed_out) = {
			let inner = self.inner.read().await;
			let missed: Vec<JobId> = inner.missed_timeout.iter().filter(|(_, deadline)| **deadline <= now).map(|(id, _)| *id).collect();
			let timed_out: Vec<JobId> = inner.running_timeout.iter().filter(|(_, deadline)| **deadline <= now).map(|(id, _)| *id).collect();
			(missed, timed_out)
		};

		let alarmed = !missed.is_empty() || !timed_out.is_empty();

		for id in missed {
			self.store.log_alarm(id, StatusCode::Missed).await?;
			let mut inner = self.inner.write().await;
			if let Some(tracked) = inner.jobs.get_mut(&id) {
				tracked.state.merge_status(StatusCode::Missed);
			}
			inner.missed_timeout.remove(&id);
		}
		for id in timed_out {
			self.store.log_alarm(id, StatusCode::Timeout).await?;
			let mut inner = self.inner.write().await;
			if let Some(tracked) = inner.jobs.get_mut(&id) {
				tracked.state.merge_status(StatusCode::Timeout);
				tracked.state.running = false;
			}
			inner.running_timeout.remove(&id);
		}

		if alarmed {
			let mut inner = self.inner.write().await;
			inner.recompute_aggregates();
			drop(inner);
			self.notify.notify_waiters();
		}
		Ok(())
	}

	/// Current cursors, status map, and aggregate counts — what
	/// `wait_for_event_since` returns once it unblocks, and what a
	/// dashboard summary endpoint polls directly.
	pub async fn snapshot(&self) -> StatusSnapshot {
		let inner = self.inner.read().await;
		StatusSnapshot {
			max_start_id: inner.max_start_id,
			max_alarm_id: inner.max_alarm_id,
			max_finish_id: inner.max_finish_id,
			num_warning: inner.num_warning,
			num_error: inner.num_error,
			jobs: inner.jobs.iter().map(|(id, t)| (*id, t.state.clone())).collect(),
		}
	}

	/// Returns immediately if any cursor has already advanced past the
	/// caller's; otherwise blocks up to `timeout + uniform(0, 20s)` for a
	/// wake-up from the run loop.
	#[instrument(skip(self))]
	pub async fn wait_for_event_since(
		&self,
		start_cursor: i64,
		alarm_cursor: i64,
		finish_cursor: i64,
		timeout: StdDuration,
	) -> StatusSnapshot {
		let ahead = {
			let inner = self.inner.read().await;
			inner.max_start_id > start_cursor || inner.max_alarm_id > alarm_cursor || inner.max_finish_id > finish_cursor
		};

		if !ahead {
			let jitter = StdDuration::from_millis((fastrand::f64() * 20_000.0) as u64);
			tokio::select! {
				_ = self.notify.notified() => {}
				_ = tokio::time::sleep(timeout + jitter) => {}
			}
		}

		self.snapshot().await
	}

	/// Drives the ~5-second poll loop until `shutdown` fires.
	pub async fn run(self: Arc<Self>, mut shutdown: broadcast::Receiver<()>) {
		let mut interval = tokio::time::interval(StdDuration::from_secs(5));
		loop {
			tokio::select! {
				_ = interval.tick() => {
					if let Err(err) = self.poll().await {
						tracing::error!(%err, "monitor loop iteration failed, continuing");
					}
				}
				_ = shutdown.recv() => {
					tracing::info!("monitor shutting down");
					break;
				}
			}
		}
	}
}
