// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Wire-format encoding for `DateTime<Utc>` fields: `YYYY-MM-DD HH:MM:SS`,
//! matching SQLite's text-affinity datetime storage. Used via
//! `#[serde(with = "crate::wire_time")]` (and `crate::wire_time::option`
//! for `Option<DateTime<Utc>>` fields) instead of chrono's default RFC3339
//! `Serialize`/`Deserialize`.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
	serializer.serialize_str(&value.format(FORMAT).to_string())
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
	let raw = String::deserialize(deserializer)?;
	NaiveDateTime::parse_from_str(&raw, FORMAT).map(|naive| naive.and_utc()).map_err(D::Error::custom)
}

pub mod option {
	use super::*;

	pub fn serialize<S: Serializer>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error> {
		match value {
			Some(datetime) => serializer.serialize_some(&datetime.format(FORMAT).to_string()),
			None => serializer.serialize_none(),
		}
	}

	pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error> {
		let raw = Option::<String>::deserialize(deserializer)?;
		raw.map(|raw| NaiveDateTime::parse_from_str(&raw, FORMAT).map(|naive| naive.and_utc()).map_err(D::Error::custom)).transpose()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{Event, JobId, StartEvent};

	#[test]
	fn event_datetime_serializes_as_space_separated_utc_text() {
		let datetime = DateTime::parse_from_rfc3339("2024-03-05T08:07:09Z").unwrap().with_timezone(&Utc);
		let event = Event::Start(StartEvent { event_id: 1, job_id: JobId(1), datetime, command: "/bin/true".to_string() });

		let json = serde_json::to_value(&event).unwrap();
		assert_eq!(json["datetime"], "2024-03-05 08:07:09");

		let round_tripped: Event = serde_json::from_value(json).unwrap();
		assert_eq!(round_tripped.datetime(), datetime);
	}
}
