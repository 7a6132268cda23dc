// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
	#[error("unknown status code: {0}")]
	UnknownStatusCode(i32),

	#[error("invalid notification method: {0}")]
	InvalidNotificationMethod(String),
}

pub type Result<T> = std::result::Result<T, Error>;
