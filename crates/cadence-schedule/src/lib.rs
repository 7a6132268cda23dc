// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Compiled representation of a five-field cron expression plus a
//! timezone: `Schedule::parse` builds it, `Match`/`Next`/`Previous` answer
//! scheduling questions against it.

mod error;
mod field;
mod parse;

pub use error::{ScheduleError, ScheduleResult};

use chrono::{DateTime, Datelike, Duration, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use field::Field;

/// A parsed five-field cron expression bound to a timezone.
///
/// Unknown timezones are not a parse error: they log a warning and fall
/// back to UTC for matching, so a malformed crontab entry degrades
/// gracefully rather than taking down the whole reconciliation pass.
#[derive(Debug, Clone)]
pub struct Schedule {
	minute: Field,
	hour: Field,
	day_of_month: Field,
	month: Field,
	day_of_week: Field,
	tz: Tz,
}

impl Schedule {
	pub fn parse(expression: &str, timezone: Option<&str>) -> ScheduleResult<Self> {
		let expression = parse::expand_alias(expression);
		let fields = parse::split_fields(&expression)?;

		let tz = match timezone {
			None => Tz::UTC,
			Some(name) => match name.parse::<Tz>() {
				Ok(tz) => tz,
				Err(_) => {
					tracing::warn!(timezone = name, "unknown timezone, falling back to UTC");
					Tz::UTC
				}
			},
		};

		Ok(Self {
			minute: Field::parse(fields.minute, 0, 59, &[])?,
			hour: Field::parse(fields.hour, 0, 23, &[])?,
			day_of_month: Field::parse(fields.day_of_month, 1, 31, &[])?,
			month: Field::parse(fields.month, 1, 12, parse::MONTH_NAMES)?,
			day_of_week: Field::parse_day_of_week(fields.day_of_week)?,
			tz,
		})
	}

	/// True iff the localized minute, hour, day-of-month, month, and ISO
	/// weekday of `instant` all match their respective fields.
	pub fn matches(&self, instant: DateTime<Utc>) -> bool {
		let local = instant.with_timezone(&self.tz);
		self.minute.contains(local.minute())
			&& self.hour.contains(local.hour())
			&& self.day_of_month.contains(local.day())
			&& self.month.contains(local.month())
			&& self.day_of_week.contains(local.weekday().num_days_from_sunday())
	}

	/// Nearest future matching minute, strictly after `instant`.
	pub fn next(&self, instant: DateTime<Utc>) -> DateTime<Utc> {
		self.search(instant, Duration::minutes(1))
	}

	/// Nearest past matching minute, strictly before `instant`.
	pub fn previous(&self, instant: DateTime<Utc>) -> DateTime<Utc> {
		self.search(instant, Duration::minutes(-1))
	}

	fn search(&self, instant: DateTime<Utc>, step: Duration) -> DateTime<Utc> {
		// Bound the walk generously (a little over four years of minutes)
		// so an expression matching nothing (e.g. Feb 30) terminates
		// instead of looping forever.
		const MAX_STEPS: i64 = 4 * 366 * 24 * 60;

		let start = truncate_to_minute(instant) + step;
		let mut candidate = start;
		for _ in 0..MAX_STEPS {
			if self.matches(candidate) {
				return candidate;
			}
			candidate += step;
		}
		candidate
	}
}

fn truncate_to_minute(instant: DateTime<Utc>) -> DateTime<Utc> {
	Utc.with_ymd_and_hms(
		instant.year(),
		instant.month(),
		instant.day(),
		instant.hour(),
		instant.minute(),
		0,
	)
	.single()
	.unwrap_or(instant)
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::TimeZone;

	#[test]
	fn matches_across_timezones_for_fixed_utc_instant() {
		// "0 15 25 12 *" in Europe/London means 15:00 on Dec 25 London
		// time, which is 2012-12-25T15:00:00Z (GMT, no DST in December).
		let schedule = Schedule::parse("0 15 25 12 *", Some("Europe/London")).unwrap();
		let instant = Utc.with_ymd_and_hms(2012, 12, 25, 15, 0, 0).unwrap();
		assert!(schedule.matches(instant));

		let wrong_hour = Utc.with_ymd_and_hms(2012, 12, 25, 14, 0, 0).unwrap();
		assert!(!schedule.matches(wrong_hour));
	}

	#[test]
	fn hourly_alias_matches_minute_zero_of_any_hour() {
		let schedule = Schedule::parse("@hourly", Some("UTC")).unwrap();
		assert!(schedule.matches(Utc.with_ymd_and_hms(2020, 1, 1, 13, 0, 0).unwrap()));
		assert!(!schedule.matches(Utc.with_ymd_and_hms(2020, 1, 1, 13, 1, 0).unwrap()));
	}

	#[test]
	fn weekly_alias_matches_only_sunday_midnight() {
		let schedule = Schedule::parse("@weekly", Some("UTC")).unwrap();
		// 2020-02-02 is a Sunday.
		assert!(schedule.matches(Utc.with_ymd_and_hms(2020, 2, 2, 0, 0, 0).unwrap()));
		assert!(!schedule.matches(Utc.with_ymd_and_hms(2020, 2, 3, 0, 0, 0).unwrap()));
	}

	#[test]
	fn next_and_previous_on_hourly_expression() {
		let schedule = Schedule::parse("0 * * * *", Some("UTC")).unwrap();
		let instant = Utc.with_ymd_and_hms(2020, 2, 1, 12, 30, 0).unwrap();
		assert_eq!(schedule.next(instant), Utc.with_ymd_and_hms(2020, 2, 1, 13, 0, 0).unwrap());
		assert_eq!(
			schedule.previous(instant),
			Utc.with_ymd_and_hms(2020, 2, 1, 12, 0, 0).unwrap()
		);
	}

	#[test]
	fn unknown_timezone_falls_back_to_utc() {
		let schedule = Schedule::parse("0 0 * * *", Some("Not/AZone")).unwrap();
		assert!(schedule.matches(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()));
	}

	#[test]
	fn dow_zero_and_seven_both_mean_sunday() {
		let zero = Schedule::parse("0 0 * * 0", Some("UTC")).unwrap();
		let seven = Schedule::parse("0 0 * * 7", Some("UTC")).unwrap();
		let sunday = Utc.with_ymd_and_hms(2020, 2, 2, 0, 0, 0).unwrap();
		assert!(zero.matches(sunday));
		assert!(seven.matches(sunday));
	}

	#[test]
	fn three_letter_day_names_accepted() {
		let schedule = Schedule::parse("0 0 * * mon", Some("UTC")).unwrap();
		// 2020-02-03 is a Monday.
		assert!(schedule.matches(Utc.with_ymd_and_hms(2020, 2, 3, 0, 0, 0).unwrap()));
	}

	#[test]
	fn lists_ranges_and_steps() {
		let schedule = Schedule::parse("0,30 9-17/4 * * *", Some("UTC")).unwrap();
		assert!(schedule.matches(Utc.with_ymd_and_hms(2020, 1, 1, 9, 0, 0).unwrap()));
		assert!(schedule.matches(Utc.with_ymd_and_hms(2020, 1, 1, 13, 30, 0).unwrap()));
		assert!(!schedule.matches(Utc.with_ymd_and_hms(2020, 1, 1, 10, 0, 0).unwrap()));
	}
}
