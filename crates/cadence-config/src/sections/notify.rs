// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use serde::Deserialize;

#[derive(Debug, Clone)]
pub struct NotifyConfig {
	/// `HH:MM` of day the digest-style daily notifications go out.
	pub daily_time: String,
	pub daily_timezone: Option<String>,
	pub rss_capacity: usize,
}

impl Default for NotifyConfig {
	fn default() -> Self {
		Self { daily_time: "09:00".to_string(), daily_timezone: None, rss_capacity: 200 }
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotifyConfigLayer {
	#[serde(default)]
	pub daily_time: Option<String>,
	#[serde(default)]
	pub daily_timezone: Option<String>,
	#[serde(default)]
	pub rss_capacity: Option<usize>,
}

impl NotifyConfigLayer {
	pub fn merge(&mut self, other: NotifyConfigLayer) {
		if other.daily_time.is_some() {
			self.daily_time = other.daily_time;
		}
		if other.daily_timezone.is_some() {
			self.daily_timezone = other.daily_timezone;
		}
		if other.rss_capacity.is_some() {
			self.rss_capacity = other.rss_capacity;
		}
	}

	pub fn finalize(self) -> NotifyConfig {
		let defaults = NotifyConfig::default();
		NotifyConfig {
			daily_time: self.daily_time.unwrap_or(defaults.daily_time),
			daily_timezone: self.daily_timezone.or(defaults.daily_timezone),
			rss_capacity: self.rss_capacity.unwrap_or(defaults.rss_capacity),
		}
	}
}
