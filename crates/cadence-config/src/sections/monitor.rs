// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use serde::Deserialize;

/// Fallback graceperiod/timeout applied when a job has no `jobconfig` row
/// yet. Mirrors `cadence_core::JobConfig::DEFAULT_*`; kept configurable so
/// an operator can tighten or loosen the default without touching every
/// job's config row.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
	pub default_graceperiod_minutes: u32,
	pub default_timeout_minutes: u32,
}

impl Default for MonitorConfig {
	fn default() -> Self {
		Self { default_graceperiod_minutes: 2, default_timeout_minutes: 5 }
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MonitorConfigLayer {
	#[serde(default)]
	pub default_graceperiod_minutes: Option<u32>,
	#[serde(default)]
	pub default_timeout_minutes: Option<u32>,
}

impl MonitorConfigLayer {
	pub fn merge(&mut self, other: MonitorConfigLayer) {
		if other.default_graceperiod_minutes.is_some() {
			self.default_graceperiod_minutes = other.default_graceperiod_minutes;
		}
		if other.default_timeout_minutes.is_some() {
			self.default_timeout_minutes = other.default_timeout_minutes;
		}
	}

	pub fn finalize(self) -> MonitorConfig {
		let defaults = MonitorConfig::default();
		MonitorConfig {
			default_graceperiod_minutes: self.default_graceperiod_minutes.unwrap_or(defaults.default_graceperiod_minutes),
			default_timeout_minutes: self.default_timeout_minutes.unwrap_or(defaults.default_timeout_minutes),
		}
	}
}
