// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Layered configuration for the cadence daemon: built-in defaults, an
//! optional TOML file, and environment variables (`CADENCE_*`), merged in
//! that ascending precedence order.

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::ServerConfigLayer;
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
	pub http: HttpConfig,
	pub database: DatabaseConfig,
	pub monitor: MonitorConfig,
	pub notify: NotifyConfig,
	pub clean: CleanConfig,
	pub smtp: Option<SmtpConfig>,
	pub paths: PathsConfig,
	pub logging: LoggingConfig,
}

/// Load configuration from all sources with standard precedence:
/// defaults, then `/etc/cadence/daemon.toml`, then environment variables.
pub fn load_config() -> Result<ServerConfig, ConfigError> {
	load_with_sources(vec![Box::new(DefaultsSource), Box::new(TomlSource::system()), Box::new(EnvSource)])
}

/// Load configuration with a custom config file path, for deployments
/// that don't use `/etc/cadence/daemon.toml`.
pub fn load_config_with_file(config_path: impl Into<std::path::PathBuf>) -> Result<ServerConfig, ConfigError> {
	load_with_sources(vec![Box::new(DefaultsSource), Box::new(TomlSource::new(config_path)), Box::new(EnvSource)])
}

/// Load configuration from the environment only, useful for tests.
pub fn load_config_from_env() -> Result<ServerConfig, ConfigError> {
	load_with_sources(vec![Box::new(DefaultsSource), Box::new(EnvSource)])
}

fn load_with_sources(mut sources: Vec<Box<dyn ConfigSource>>) -> Result<ServerConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = ServerConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	Ok(finalize(merged))
}

fn finalize(layer: ServerConfigLayer) -> ServerConfig {
	ServerConfig {
		http: layer.http.unwrap_or_default().finalize(),
		database: layer.database.unwrap_or_default().finalize(),
		monitor: layer.monitor.unwrap_or_default().finalize(),
		notify: layer.notify.unwrap_or_default().finalize(),
		clean: layer.clean.unwrap_or_default().finalize(),
		smtp: layer.smtp.unwrap_or_default().finalize(),
		paths: layer.paths.unwrap_or_default().finalize(),
		logging: layer.logging.unwrap_or_default().finalize(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	#[test]
	fn env_overrides_toml_overrides_defaults() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("daemon.toml");
		let mut file = std::fs::File::create(&path).unwrap();
		writeln!(file, "[http]\nport = 9000\n[database]\nurl = \"sqlite:/var/lib/cadence/from-file.db\"").unwrap();

		// SAFETY: single-threaded test, no concurrent env access.
		unsafe {
			std::env::set_var("CADENCE_DATABASE_URL", "sqlite:/var/lib/cadence/from-env.db");
		}

		let config = load_config_with_file(&path).unwrap();
		assert_eq!(config.http.port, 9000, "TOML overrides the built-in default");
		assert_eq!(config.database.url, "sqlite:/var/lib/cadence/from-env.db", "env overrides TOML");

		unsafe {
			std::env::remove_var("CADENCE_DATABASE_URL");
		}
	}

	#[test]
	fn defaults_apply_when_nothing_else_is_configured() {
		unsafe {
			std::env::remove_var("CADENCE_HTTP_PORT");
		}
		let config = load_config_from_env().unwrap();
		assert_eq!(config.http.port, 7890);
		assert_eq!(config.monitor.default_graceperiod_minutes, 2);
		assert!(config.smtp.is_none());
	}
}
