// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Configuration sources: built-in defaults, a TOML file, and environment
//! variables. Each implements `ConfigSource`; `load_config` merges them in
//! ascending precedence order so later sources win.

use std::path::PathBuf;

use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::ServerConfigLayer;
use crate::sections::{
	CleanConfigLayer, DatabaseConfigLayer, HttpConfigLayer, LoggingConfigLayer, MonitorConfigLayer, NotifyConfigLayer, PathsConfigLayer,
	SmtpConfigLayer,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<ServerConfigLayer, ConfigError>;
}

pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(ServerConfigLayer::default())
	}
}

pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new("/etc/cadence/daemon.toml")
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(ServerConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead { path: self.path.clone(), source: e })?;

		let layer: ServerConfigLayer = toml::from_str(&content).map_err(|e| ConfigError::TomlParse { path: self.path.clone(), source: e })?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Convention: `CADENCE_<SECTION>_<FIELD>`.
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		debug!("loading environment variables");
		Ok(ServerConfigLayer {
			http: Some(HttpConfigLayer { host: env_var("CADENCE_HTTP_HOST"), port: env_u16("CADENCE_HTTP_PORT")? }),
			database: Some(DatabaseConfigLayer { url: env_var("CADENCE_DATABASE_URL") }),
			monitor: Some(MonitorConfigLayer {
				default_graceperiod_minutes: env_u32("CADENCE_MONITOR_DEFAULT_GRACEPERIOD_MINUTES")?,
				default_timeout_minutes: env_u32("CADENCE_MONITOR_DEFAULT_TIMEOUT_MINUTES")?,
			}),
			notify: Some(NotifyConfigLayer {
				daily_time: env_var("CADENCE_NOTIFY_DAILY_TIME"),
				daily_timezone: env_var("CADENCE_NOTIFY_DAILY_TIMEZONE"),
				rss_capacity: env_usize("CADENCE_NOTIFY_RSS_CAPACITY")?,
			}),
			clean: Some(CleanConfigLayer {
				cron_expr: env_var("CADENCE_CLEAN_CRON_EXPR"),
				timezone: env_var("CADENCE_CLEAN_TIMEZONE"),
				keep_days: env_i64("CADENCE_CLEAN_KEEP_DAYS")?,
			}),
			smtp: Some(SmtpConfigLayer {
				host: env_var("CADENCE_SMTP_HOST"),
				port: env_u16("CADENCE_SMTP_PORT")?,
				username: env_var("CADENCE_SMTP_USERNAME"),
				password: env_var("CADENCE_SMTP_PASSWORD"),
				from_address: env_var("CADENCE_SMTP_FROM_ADDRESS"),
			}),
			paths: Some(PathsConfigLayer { output_root: env_var("CADENCE_PATHS_OUTPUT_ROOT").map(PathBuf::from) }),
			logging: Some(LoggingConfigLayer { level: env_var("CADENCE_LOGGING_LEVEL"), json: env_bool("CADENCE_LOGGING_JSON") }),
		})
	}
}

fn env_var(name: &str) -> Option<String> {
	std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_bool(name: &str) -> Option<bool> {
	env_var(name).map(|v| v.eq_ignore_ascii_case("true") || v == "1")
}

fn env_u16(name: &str) -> Result<Option<u16>, ConfigError> {
	match env_var(name) {
		Some(v) => v.parse().map(Some).map_err(|_| ConfigError::InvalidValue { key: name.to_string(), message: format!("invalid u16 value '{v}'") }),
		None => Ok(None),
	}
}

fn env_u32(name: &str) -> Result<Option<u32>, ConfigError> {
	match env_var(name) {
		Some(v) => v.parse().map(Some).map_err(|_| ConfigError::InvalidValue { key: name.to_string(), message: format!("invalid u32 value '{v}'") }),
		None => Ok(None),
	}
}

fn env_i64(name: &str) -> Result<Option<i64>, ConfigError> {
	match env_var(name) {
		Some(v) => v.parse().map(Some).map_err(|_| ConfigError::InvalidValue { key: name.to_string(), message: format!("invalid i64 value '{v}'") }),
		None => Ok(None),
	}
}

fn env_usize(name: &str) -> Result<Option<usize>, ConfigError> {
	match env_var(name) {
		Some(v) => v.parse().map(Some).map_err(|_| ConfigError::InvalidValue { key: name.to_string(), message: format!("invalid usize value '{v}'") }),
		None => Ok(None),
	}
}
