// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! On each minute tick, groups firing notification targets by recipient
//! and by the job set they cover, then hands the result to a `Reporter`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use cadence_core::{JobId, Notification, NotificationId, NotificationMethod};
use cadence_schedule::Schedule;
use cadence_store::{JobFilter, Store};
use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, Mutex};

use crate::error::Result;
use crate::reporter::Reporter;
use crate::ticker::Ticker;

#[derive(Debug, Clone, PartialEq)]
pub struct NotifyRecipient {
	pub method: NotificationMethod,
	pub address: String,
	pub time: Option<String>,
	pub timezone: Option<String>,
	pub skip_ok: bool,
	pub skip_warning: bool,
	pub skip_error: bool,
	pub include_output: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyJobWindow {
	pub job_id: JobId,
	pub window_start: DateTime<Utc>,
	pub window_end: DateTime<Utc>,
}

#[derive(Clone, PartialEq, Eq, Hash)]
struct RecipientKey {
	method: NotificationMethod,
	address: String,
	time: Option<String>,
	timezone: Option<String>,
	skip_ok: bool,
	skip_warning: bool,
	skip_error: bool,
	include_output: bool,
}

impl From<&Notification> for RecipientKey {
	fn from(n: &Notification) -> Self {
		Self {
			method: n.method,
			address: n.address.clone(),
			time: n.time.clone(),
			timezone: n.timezone.clone(),
			skip_ok: n.skip_ok,
			skip_warning: n.skip_warning,
			skip_error: n.skip_error,
			include_output: n.include_output,
		}
	}
}

impl From<RecipientKey> for NotifyRecipient {
	fn from(k: RecipientKey) -> Self {
		Self {
			method: k.method,
			address: k.address,
			time: k.time,
			timezone: k.timezone,
			skip_ok: k.skip_ok,
			skip_warning: k.skip_warning,
			skip_error: k.skip_error,
			include_output: k.include_output,
		}
	}
}

struct CachedSchedule {
	time: Option<String>,
	timezone: Option<String>,
	schedule: Schedule,
}

pub struct Notifier {
	store: Arc<dyn Store>,
	reporter: Arc<dyn Reporter>,
	ticker: Mutex<Ticker>,
	schedules: Mutex<HashMap<NotificationId, CachedSchedule>>,
	daily_time: String,
	daily_timezone: Option<String>,
}

impl Notifier {
	pub fn new(store: Arc<dyn Store>, reporter: Arc<dyn Reporter>, daily_time: String, daily_timezone: Option<String>) -> Arc<Self> {
		Arc::new(Self {
			store,
			reporter,
			ticker: Mutex::new(Ticker::new(Utc::now())),
			schedules: Mutex::new(HashMap::new()),
			daily_time,
			daily_timezone,
		})
	}

	async fn schedule_for(&self, n: &Notification) -> Option<Schedule> {
		{
			let cache = self.schedules.lock().await;
			if let Some(cached) = cache.get(&n.id) {
				if cached.time == n.time && cached.timezone == n.timezone {
					return Some(cached.schedule.clone());
				}
			}
		}

		let (expr, tz) = match &n.time {
			Some(t) => (t.clone(), n.timezone.clone()),
			None => (self.daily_time.clone(), n.timezone.clone().or_else(|| self.daily_timezone.clone())),
		};

		match Schedule::parse(&expr, tz.as_deref()) {
			Ok(schedule) => {
				let mut cache = self.schedules.lock().await;
				cache.insert(n.id, CachedSchedule { time: n.time.clone(), timezone: n.timezone.clone(), schedule: schedule.clone() });
				Some(schedule)
			}
			Err(err) => {
				tracing::warn!(notification_id = %n.id, %err, "failed to parse notification schedule, skipping");
				None
			}
		}
	}

	async fn jobs_for(&self, n: &Notification) -> Result<Vec<JobId>> {
		if let Some(job_id) = n.job_id {
			return Ok(vec![job_id]);
		}
		let jobs = self
			.store
			.get_jobs(JobFilter { host: n.host.clone(), user: n.user.clone(), ..Default::default() })
			.await?;
		Ok(jobs.into_iter().map(|j| j.id).collect())
	}

	/// Runs one minute's worth of notification grouping and dispatch.
	/// Exposed for callers (and tests) that want to drive a specific
	/// minute without waiting on the ticker.
	pub async fn tick(&self, minute: DateTime<Utc>) -> Result<()> {
		let notifications = self.store.get_notifications().await?;

		let mut groups: HashMap<RecipientKey, Vec<NotifyJobWindow>> = HashMap::new();
		for notification in &notifications {
			let Some(schedule) = self.schedule_for(notification).await else { continue };
			if !schedule.matches(minute) {
				continue;
			}
			let window_start = schedule.previous(minute);
			let key = RecipientKey::from(notification);
			let job_ids = self.jobs_for(notification).await?;
			let entry = groups.entry(key).or_default();
			for job_id in job_ids {
				if let Some(existing) = entry.iter_mut().find(|w| w.job_id == job_id) {
					existing.window_start = existing.window_start.min(window_start);
					existing.window_end = existing.window_end.max(minute);
				} else {
					entry.push(NotifyJobWindow { job_id, window_start, window_end: minute });
				}
			}
		}

		if groups.is_empty() {
			return Ok(());
		}

		// Collapse recipient groups whose job-window sets are identical so
		// one report is rendered per distinct job set.
		let mut collapsed: Vec<(Vec<RecipientKey>, Vec<NotifyJobWindow>)> = Vec::new();
		'outer: for (key, mut windows) in groups {
			windows.sort_by_key(|w| w.job_id.0);
			for (keys, existing) in collapsed.iter_mut() {
				if *existing == windows {
					keys.push(key);
					continue 'outer;
				}
			}
			collapsed.push((vec![key], windows));
		}

		for (keys, windows) in collapsed {
			let recipients: Vec<NotifyRecipient> = keys.into_iter().map(NotifyRecipient::from).collect();
			if let Err(err) = self.reporter.report(&recipients, &windows).await {
				tracing::error!(%err, "notification delivery failed, continuing");
			}
		}

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
				tracing::error!(%err, "notifier tick failed, continuing");
			}
		}
		Ok(())
	}

	pub async fn run(self: Arc<Self>, mut shutdown: broadcast::Receiver<()>) {
		let mut interval = tokio::time::interval(StdDuration::from_secs(5));
		loop {
			tokio::select! {
				_ = interval.tick() => {
					if let Err(err) = self.advance_ticker().await {
						tracing::error!(%err, "notifier loop iteration failed, continuing");
					}
				}
				_ = shutdown.recv() => {
					tracing::info!("notifier shutting down");
					break;
				}
			}
		}
	}
}
