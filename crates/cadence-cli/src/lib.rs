// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! JSON import/export of a cadence job store: jobs, their configs, and
//! notification routing, keyed so re-importing the same snapshot is a
//! no-op rather than a duplicate.

pub mod snapshot;
