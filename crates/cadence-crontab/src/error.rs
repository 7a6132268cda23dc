// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CrontabError {
	#[error("duplicate crabid in submission: {0}")]
	DuplicateCrabid(String),
}

pub type CrontabResult<T> = std::result::Result<T, CrontabError>;
