// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
	#[error("job not found")]
	JobNotFound,

	#[error("job config not found")]
	ConfigNotFound,

	#[error("notification not found")]
	NotificationNotFound,

	#[error("job resolution failed for host={host} user={user} command={command}")]
	ReconciliationFailed {
		host: String,
		user: String,
		command: String,
	},

	#[error("database error: {0}")]
	Database(#[from] sqlx::Error),

	#[error("serialization error: {0}")]
	Serialization(#[from] serde_json::Error),

	#[error(transparent)]
	Core(#[from] cadence_core::Error),

	#[error(transparent)]
	Crontab(#[from] cadence_crontab::CrontabError),

	#[error("io error: {0}")]
	Io(#[from] std::io::Error),
}
