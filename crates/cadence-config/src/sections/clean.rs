// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use serde::Deserialize;

#[derive(Debug, Clone)]
pub struct CleanConfig {
	pub cron_expr: String,
	pub timezone: Option<String>,
	pub keep_days: i64,
}

impl Default for CleanConfig {
	fn default() -> Self {
		Self { cron_expr: "0 3 * * *".to_string(), timezone: None, keep_days: 90 }
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CleanConfigLayer {
	#[serde(default)]
	pub cron_expr: Option<String>,
	#[serde(default)]
	pub timezone: Option<String>,
	#[serde(default)]
	pub keep_days: Option<i64>,
}

impl CleanConfigLayer {
	pub fn merge(&mut self, other: CleanConfigLayer) {
		if other.cron_expr.is_some() {
			self.cron_expr = other.cron_expr;
		}
		if other.timezone.is_some() {
			self.timezone = other.timezone;
		}
		if other.keep_days.is_some() {
			self.keep_days = other.keep_days;
		}
	}

	pub fn finalize(self) -> CleanConfig {
		let defaults = CleanConfig::default();
		CleanConfig {
			cron_expr: self.cron_expr.unwrap_or(defaults.cron_expr),
			timezone: self.timezone.or(defaults.timezone),
			keep_days: self.keep_days.unwrap_or(defaults.keep_days),
		}
	}
}
