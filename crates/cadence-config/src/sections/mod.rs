// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

mod clean;
mod database;
mod http;
mod logging;
mod monitor;
mod notify;
mod paths;
mod smtp;

pub use clean::{CleanConfig, CleanConfigLayer};
pub use database::{DatabaseConfig, DatabaseConfigLayer};
pub use http::{HttpConfig, HttpConfigLayer};
pub use logging::{LoggingConfig, LoggingConfigLayer};
pub use monitor::{MonitorConfig, MonitorConfigLayer};
pub use notify::{NotifyConfig, NotifyConfigLayer};
pub use paths::{PathsConfig, PathsConfigLayer};
pub use smtp::{SmtpConfig, SmtpConfigLayer};
