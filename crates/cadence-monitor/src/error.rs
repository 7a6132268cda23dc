// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MonitorError {
	#[error(transparent)]
	Store(#[from] cadence_store::StoreError),

	#[error(transparent)]
	Schedule(#[from] cadence_schedule::ScheduleError),
}

pub type Result<T> = std::result::Result<T, MonitorError>;

#[derive(Debug, Error)]
pub enum ReporterError {
	#[error("reporter not configured")]
	NotConfigured,

	#[error("delivery failed: {0}")]
	Delivery(String),
}
