// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScheduleError {
	#[error("expected 5 cron fields, got {0}")]
	WrongFieldCount(usize),

	#[error("invalid cron field: {0}")]
	InvalidField(String),
}

pub type ScheduleResult<T> = std::result::Result<T, ScheduleError>;
