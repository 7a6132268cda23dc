// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::collections::HashSet;

use crate::error::{ScheduleError, ScheduleResult};

/// A single cron field, expanded to the concrete set of values it matches.
/// Expanding eagerly (rather than keeping lists/ranges/steps lazily) keeps
/// `contains` a single hash lookup and keeps the parser's job limited to
/// producing a value set.
#[derive(Debug, Clone)]
pub struct Field {
	values: HashSet<u32>,
}

impl Field {
	pub fn contains(&self, value: u32) -> bool {
		self.values.contains(&value)
	}

	pub fn parse(spec: &str, min: u32, max: u32, names: &[&str]) -> ScheduleResult<Self> {
		let mut values = HashSet::new();
		for item in spec.split(',') {
			values.extend(parse_item(item, min, max, names)?);
		}
		Ok(Self { values })
	}

	/// Day-of-week is its own case: 0 and 7 both mean Sunday, and the
	/// three-letter names are the weekday abbreviations rather than the
	/// month ones.
	pub fn parse_day_of_week(spec: &str) -> ScheduleResult<Self> {
		const DOW_NAMES: &[&str] = &["sun", "mon", "tue", "wed", "thu", "fri", "sat"];
		let mut field = Self::parse(spec, 0, 7, DOW_NAMES)?;
		if field.values.remove(&7) {
			field.values.insert(0);
		}
		Ok(field)
	}
}

fn parse_item(item: &str, min: u32, max: u32, names: &[&str]) -> ScheduleResult<Vec<u32>> {
	let (range_part, step) = match item.split_once('/') {
		Some((range_part, step_part)) => {
			let step: u32 = step_part
				.parse()
				.map_err(|_| ScheduleError::InvalidField(item.to_string()))?;
			if step == 0 {
				return Err(ScheduleError::InvalidField(item.to_string()));
			}
			(range_part, step)
		}
		None => (item, 1),
	};

	let (start, end) = if range_part == "*" {
		(min, max)
	} else if let Some((a, b)) = range_part.split_once('-') {
		(resolve(a, names)?, resolve(b, names)?)
	} else {
		let value = resolve(range_part, names)?;
		(value, value)
	};

	if start < min || end > max || start > end {
		return Err(ScheduleError::InvalidField(item.to_string()));
	}

	Ok((start..=end).step_by(step as usize).collect())
}

fn resolve(token: &str, names: &[&str]) -> ScheduleResult<u32> {
	if let Ok(value) = token.parse::<u32>() {
		return Ok(value);
	}
	let lower = token.to_ascii_lowercase();
	names
		.iter()
		.position(|name| *name == lower)
		.map(|idx| idx as u32 + if names.len() == 12 { 1 } else { 0 })
		.ok_or_else(|| ScheduleError::InvalidField(token.to_string()))
}
