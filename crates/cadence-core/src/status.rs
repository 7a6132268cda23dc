// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Status codes shared across the wire protocol, the store, and the
//! Monitor's status-precedence logic.
//!
//! Codes are small signed integers so they can be stored directly as a
//! SQLite `INTEGER` column and echoed back on the wire unchanged. Clients
//! may only ever send the non-negative codes; the negative ones are
//! reserved for Monitor-generated alarms.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(into = "i32", try_from = "i32")]
pub enum StatusCode {
	Success,
	Fail,
	Unknown,
	CouldNotStart,
	Warning,
	AlreadyRunning,
	Inhibited,
	Late,
	Missed,
	Timeout,
	Cleared,
}

impl StatusCode {
	pub const fn code(self) -> i32 {
		match self {
			Self::Success => 0,
			Self::Fail => 1,
			Self::Unknown => 2,
			Self::CouldNotStart => 3,
			Self::Warning => 4,
			Self::AlreadyRunning => 5,
			Self::Inhibited => 6,
			Self::Late => -1,
			Self::Missed => -2,
			Self::Timeout => -3,
			Self::Cleared => -4,
		}
	}

	pub const fn from_code(code: i32) -> Option<Self> {
		Some(match code {
			0 => Self::Success,
			1 => Self::Fail,
			2 => Self::Unknown,
			3 => Self::CouldNotStart,
			4 => Self::Warning,
			5 => Self::AlreadyRunning,
			6 => Self::Inhibited,
			-1 => Self::Late,
			-2 => Self::Missed,
			-3 => Self::Timeout,
			-4 => Self::Cleared,
			_ => return None,
		})
	}

	/// The codes a client is permitted to report directly; negative
	/// (Monitor-only) and Inhibited are excluded.
	pub const fn is_client_sendable(self) -> bool {
		matches!(
			self,
			Self::Success
				| Self::Fail | Self::Unknown
				| Self::CouldNotStart
				| Self::Warning | Self::AlreadyRunning
		)
	}

	/// LATE is the sole trivial status: it is "ok" but excluded from
	/// history and from reliability computation.
	pub const fn is_trivial(self) -> bool {
		matches!(self, Self::Late)
	}

	pub const fn is_ok(self) -> bool {
		matches!(self, Self::Success | Self::Late | Self::Cleared)
	}

	pub const fn is_warning(self) -> bool {
		matches!(self, Self::Unknown | Self::Warning | Self::Missed)
	}

	pub const fn is_error(self) -> bool {
		matches!(self, Self::Fail | Self::CouldNotStart | Self::Timeout)
	}
}

impl From<StatusCode> for i32 {
	fn from(value: StatusCode) -> Self {
		value.code()
	}
}

impl TryFrom<i32> for StatusCode {
	type Error = Error;

	fn try_from(value: i32) -> Result<Self> {
		Self::from_code(value).ok_or(Error::UnknownStatusCode(value))
	}
}

impl fmt::Display for StatusCode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			Self::Success => "SUCCESS",
			Self::Fail => "FAIL",
			Self::Unknown => "UNKNOWN",
			Self::CouldNotStart => "COULDNOTSTART",
			Self::Warning => "WARNING",
			Self::AlreadyRunning => "ALREADYRUNNING",
			Self::Inhibited => "INHIBITED",
			Self::Late => "LATE",
			Self::Missed => "MISSED",
			Self::Timeout => "TIMEOUT",
			Self::Cleared => "CLEARED",
		};
		f.write_str(name)
	}
}
