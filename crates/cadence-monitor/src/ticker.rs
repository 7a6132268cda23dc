// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Catches up on every minute boundary crossed since it was last polled,
//! even if the polling loop itself paused for a while (a GC pause, a slow
//! store round-trip). Composition-based: callers own a `Ticker` and drive
//! it from their own loop, rather than inheriting from it.

use chrono::{DateTime, Timelike, Utc};

pub struct Ticker {
	previous: DateTime<Utc>,
}

fn minute_tuple(instant: DateTime<Utc>) -> (i32, u32, u32, u32, u32) {
	(instant.year(), instant.month(), instant.day(), instant.hour(), instant.minute())
}

impl Ticker {
	pub fn new(now: DateTime<Utc>) -> Self {
		Self { previous: now }
	}

	/// Advance past every minute boundary between the last call and `now`,
	/// invoking `on_tick` once per boundary crossed (never for `now`'s own
	/// in-progress minute).
	pub fn catch_up(&mut self, now: DateTime<Utc>, mut on_tick: impl FnMut(DateTime<Utc>)) {
		let mut candidate = self.previous + chrono::Duration::seconds(55);
		while minute_tuple(candidate) < minute_tuple(now) {
			if minute_tuple(candidate) != minute_tuple(self.previous) {
				on_tick(candidate);
			}
			self.previous = candidate;
			candidate += chrono::Duration::seconds(55);
		}
	}
}

use chrono::Datelike;
