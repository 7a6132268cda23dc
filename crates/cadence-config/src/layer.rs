// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use serde::Deserialize;

use crate::sections::{
	CleanConfigLayer, DatabaseConfigLayer, HttpConfigLayer, LoggingConfigLayer, MonitorConfigLayer, NotifyConfigLayer, PathsConfigLayer,
	SmtpConfigLayer,
};

/// Partial configuration as loaded from a single source. `None` means
/// "this source had nothing to say about this section" and the next
/// lower-precedence layer's value is kept.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerConfigLayer {
	#[serde(default)]
	pub http: Option<HttpConfigLayer>,
	#[serde(default)]
	pub database: Option<DatabaseConfigLayer>,
	#[serde(default)]
	pub monitor: Option<MonitorConfigLayer>,
	#[serde(default)]
	pub notify: Option<NotifyConfigLayer>,
	#[serde(default)]
	pub clean: Option<CleanConfigLayer>,
	#[serde(default)]
	pub smtp: Option<SmtpConfigLayer>,
	#[serde(default)]
	pub paths: Option<PathsConfigLayer>,
	#[serde(default)]
	pub logging: Option<LoggingConfigLayer>,
}

impl ServerConfigLayer {
	pub fn merge(&mut self, other: ServerConfigLayer) {
		merge_section(&mut self.http, other.http);
		merge_section(&mut self.database, other.database);
		merge_section(&mut self.monitor, other.monitor);
		merge_section(&mut self.notify, other.notify);
		merge_section(&mut self.clean, other.clean);
		merge_section(&mut self.smtp, other.smtp);
		merge_section(&mut self.paths, other.paths);
		merge_section(&mut self.logging, other.logging);
	}
}

fn merge_section<T: SectionMerge>(slot: &mut Option<T>, incoming: Option<T>) {
	if let Some(incoming) = incoming {
		match slot {
			Some(existing) => existing.merge_from(incoming),
			None => *slot = Some(incoming),
		}
	}
}

trait SectionMerge {
	fn merge_from(&mut self, other: Self);
}

macro_rules! impl_section_merge {
	($ty:ty) => {
		impl SectionMerge for $ty {
			fn merge_from(&mut self, other: Self) {
				self.merge(other);
			}
		}
	};
}

impl_section_merge!(HttpConfigLayer);
impl_section_merge!(DatabaseConfigLayer);
impl_section_merge!(MonitorConfigLayer);
impl_section_merge!(NotifyConfigLayer);
impl_section_merge!(CleanConfigLayer);
impl_section_merge!(SmtpConfigLayer);
impl_section_merge!(PathsConfigLayer);
impl_section_merge!(LoggingConfigLayer);
