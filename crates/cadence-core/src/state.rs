// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! `JobState` is the Monitor's in-memory view of one job. It is never
//! persisted; it is rebuilt at bootstrap by replaying recent events through
//! the same folding logic used at runtime.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::{Job, JobConfig, StatusCode};

pub const HISTORY_CAPACITY: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct JobState {
	pub status: Option<StatusCode>,
	pub running: bool,
	#[serde(with = "crate::wire_time")]
	#[cfg_attr(feature = "openapi", schema(value_type = String))]
	pub installed_at: DateTime<Utc>,
	/// Non-trivial completion statuses only, oldest first, capped at
	/// `HISTORY_CAPACITY`.
	pub history: VecDeque<StatusCode>,
	pub scheduled: bool,
	#[serde(skip, default = "default_graceperiod")]
	pub graceperiod: Duration,
	#[serde(skip, default = "default_timeout")]
	pub timeout: Duration,
}

fn default_graceperiod() -> Duration {
	Duration::minutes(JobConfig::DEFAULT_GRACEPERIOD_MINUTES as i64)
}

fn default_timeout() -> Duration {
	Duration::minutes(JobConfig::DEFAULT_TIMEOUT_MINUTES as i64)
}

impl JobState {
	pub fn bootstrap(job: &Job) -> Self {
		Self {
			status: None,
			running: false,
			installed_at: job.installed_at,
			history: VecDeque::with_capacity(HISTORY_CAPACITY),
			scheduled: false,
			graceperiod: default_graceperiod(),
			timeout: default_timeout(),
		}
	}

	/// Merge an incoming completion/alarm status into the current status
	/// using the precedence rules from the Monitor's event-folding logic:
	/// a trivial (LATE) status never overwrites anything but `None` or an
	/// ok-class status; a warning-class status never overwrites an
	/// error-class one; anything else (ok or error) always wins.
	pub fn merge_status(&mut self, incoming: StatusCode) {
		let should_set = if incoming.is_trivial() {
			matches!(self.status, None) || self.status.is_some_and(StatusCode::is_ok)
		} else if incoming.is_warning() {
			!self.status.is_some_and(StatusCode::is_error)
		} else {
			true
		};

		if should_set {
			self.status = Some(incoming);
		}

		// LATE is trivial by definition; ALREADYRUNNING is excluded too, since
		// the monitor treats it as a finish for state-machine purposes only
		// and it was never a real run of the job.
		if !incoming.is_trivial() && incoming != StatusCode::AlreadyRunning {
			if self.history.len() >= HISTORY_CAPACITY {
				self.history.pop_front();
			}
			self.history.push_back(incoming);
		}
	}

	/// `100 * count(history == SUCCESS) / len(history)`, integer; 0 when
	/// history is empty.
	pub fn reliability(&self) -> u8 {
		if self.history.is_empty() {
			return 0;
		}
		let successes = self
			.history
			.iter()
			.filter(|s| **s == StatusCode::Success)
			.count();
		(100 * successes / self.history.len()) as u8
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn fresh() -> JobState {
		JobState {
			status: None,
			running: false,
			installed_at: Utc::now(),
			history: VecDeque::new(),
			scheduled: true,
			graceperiod: Duration::minutes(2),
			timeout: Duration::minutes(5),
		}
	}

	#[test]
	fn worst_status_wins_until_a_later_success_clears_it() {
		// [SUCCESS, LATE, UNKNOWN, FAIL, MISSED, SUCCESS] -> FAIL
		let mut state = fresh();
		for status in [
			StatusCode::Success,
			StatusCode::Late,
			StatusCode::Unknown,
			StatusCode::Fail,
			StatusCode::Missed,
		] {
			state.merge_status(status);
		}
		assert_eq!(state.status, Some(StatusCode::Fail));
		// trailing SUCCESS overwrites any prior status, including error.
		state.merge_status(StatusCode::Success);
		assert_eq!(state.status, Some(StatusCode::Success));
	}

	#[test]
	fn late_never_downgrades_ok_or_error() {
		let mut state = fresh();
		state.merge_status(StatusCode::Fail);
		state.merge_status(StatusCode::Late);
		assert_eq!(state.status, Some(StatusCode::Fail));
	}

	#[test]
	fn warning_never_downgrades_error() {
		let mut state = fresh();
		state.merge_status(StatusCode::Timeout);
		state.merge_status(StatusCode::Missed);
		assert_eq!(state.status, Some(StatusCode::Timeout));
	}

	#[test]
	fn late_excluded_from_history_and_reliability() {
		let mut state = fresh();
		state.merge_status(StatusCode::Success);
		state.merge_status(StatusCode::Late);
		state.merge_status(StatusCode::Late);
		assert_eq!(state.history.len(), 1);
		assert_eq!(state.reliability(), 100);
	}

	#[test]
	fn already_running_excluded_from_history() {
		let mut state = fresh();
		state.merge_status(StatusCode::Success);
		state.merge_status(StatusCode::AlreadyRunning);
		assert_eq!(state.history.len(), 1);
		assert_eq!(state.reliability(), 100);
	}

	#[test]
	fn reliability_is_zero_for_empty_history() {
		assert_eq!(fresh().reliability(), 0);
	}

	#[test]
	fn history_drops_oldest_at_capacity() {
		let mut state = fresh();
		for _ in 0..HISTORY_CAPACITY {
			state.merge_status(StatusCode::Success);
		}
		state.merge_status(StatusCode::Fail);
		assert_eq!(state.history.len(), HISTORY_CAPACITY);
		assert_eq!(state.history.back(), Some(&StatusCode::Fail));
	}
}
