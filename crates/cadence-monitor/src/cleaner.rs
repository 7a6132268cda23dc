// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Deletes event rows older than the retention window on a configured
//! schedule.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use cadence_schedule::Schedule;
use cadence_store::Store;
use chrono::Utc;
use tokio::sync::{broadcast, Mutex};

use crate::error::Result;
use crate::ticker::Ticker;

pub struct Cleaner {
	store: Arc<dyn Store>,
	schedule: Schedule,
	keep_days: i64,
	ticker: Mutex<Ticker>,
}

impl Cleaner {
	pub fn new(store: Arc<dyn Store>, cron_expr: &str, timezone: Option<&str>, keep_days: i64) -> Result<Arc<Self>> {
		let schedule = Schedule::parse(cron_expr, timezone)?;
		Ok(Arc::new(Self { store, schedule, keep_days, ticker: Mutex::new(Ticker::new(Utc::now())) }))
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
				tracing::error!(%err, "cleaner tick failed, continuing");
			}
		}
		Ok(())
	}

	pub async fn tick(&self, minute: chrono::DateTime<Utc>) -> Result<()> {
		if !self.schedule.matches(minute) {
			return Ok(());
		}
		let before = minute - chrono::Duration::days(self.keep_days);
		let deleted = self.store.delete_old_events(before).await?;
		tracing::info!(deleted, before = %before, "cleaner removed stale events");
		Ok(())
	}

	pub async fn run(self: Arc<Self>, mut shutdown: broadcast::Receiver<()>) {
		let mut interval = tokio::time::interval(StdDuration::from_secs(5));
		loop {
			tokio::select! {
				_ = interval.tick() => {
					if let Err(err) = self.advance_ticker().await {
						tracing::error!(%err, "cleaner loop iteration failed, continuing");
					}
				}
				_ = shutdown.recv() => {
					tracing::info!("cleaner shutting down");
					break;
				}
			}
		}
	}
}
