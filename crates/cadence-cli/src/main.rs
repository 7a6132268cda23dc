// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Snapshot a cadence job store to JSON, or load one back in. Useful for
//! moving a store between hosts or seeding a fresh one from a backup.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use cadence_cli::snapshot;
use cadence_store::{SqliteStore, Store};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "cadence-cli", about = "Import/export a cadence job store as JSON")]
struct Args {
	/// sqlx connection string, e.g. sqlite:./cadence.db
	#[arg(long, env = "CADENCE_DATABASE_URL", default_value = "sqlite:./cadence.db")]
	database_url: String,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand)]
enum Command {
	/// Write every job, job config, and notification to a JSON file.
	Export {
		/// Destination path; `-` writes to stdout.
		path: PathBuf,
	},
	/// Load jobs, job configs, and notifications from a JSON file,
	/// reconciling against what's already in the store.
	Import {
		/// Source path; `-` reads from stdin.
		path: PathBuf,
	},
}

#[tokio::main]
async fn main() -> Result<()> {
	tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

	let args = Args::parse();
	let pool = cadence_store::create_pool(&args.database_url).await.context("opening store")?;
	let store: Arc<dyn Store> = Arc::new(SqliteStore::new(pool));

	match args.command {
		Command::Export { path } => {
			let data = snapshot::export(&*store).await?;
			let json = serde_json::to_string_pretty(&data)?;
			if path.as_os_str() == "-" {
				println!("{json}");
			} else {
				std::fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
			}
		}
		Command::Import { path } => {
			let content = if path.as_os_str() == "-" {
				std::io::read_to_string(std::io::stdin())?
			} else {
				std::fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?
			};
			let data: snapshot::Snapshot = serde_json::from_str(&content)?;
			let report = snapshot::import(&*store, data).await?;
			tracing::info!(jobs = report.jobs, configs = report.configs, notifications = report.notifications, "import complete");
		}
	}

	Ok(())
}
