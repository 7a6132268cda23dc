// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::path::PathBuf;

use serde::Deserialize;

/// Filesystem root for the `FsOutputStore` alternative backend. `None`
/// keeps output stored directly in the database (the active default).
#[derive(Debug, Clone, Default)]
pub struct PathsConfig {
	pub output_root: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfigLayer {
	#[serde(default)]
	pub output_root: Option<PathBuf>,
}

impl PathsConfigLayer {
	pub fn merge(&mut self, other: PathsConfigLayer) {
		if other.output_root.is_some() {
			self.output_root = other.output_root;
		}
	}

	pub fn finalize(self) -> PathsConfig {
		PathsConfig { output_root: self.output_root }
	}
}
