// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Cadence daemon binary: wires config, tracing, the SQLite store, the
//! Monitor/Notifier/Cleaner background workers, and the IngestAPI/QueryAPI
//! router together, then serves until `ctrl_c`.

use std::sync::Arc;

use cadence_api::{create_router, AppState};
use cadence_monitor::{Cleaner, Monitor, Notifier, RssReporter};
use cadence_store::SqliteStore;
use clap::{Parser, Subcommand};
use tokio::sync::broadcast;
use tower_http::{
	cors::{Any, CorsLayer},
	trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "cadence-daemon", about = "Centralized scheduled-job monitoring daemon", version)]
struct Args {
	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Show version and build information.
	Version,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();
	if let Some(Command::Version) = args.command {
		println!("cadence-daemon {}", env!("CARGO_PKG_VERSION"));
		return Ok(());
	}

	dotenvy::dotenv().ok();
	let config = cadence_config::load_config()?;

	tracing_subscriber::registry()
		.with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| config.logging.level.clone().into()))
		.with(tracing_subscriber::fmt::layer())
		.init();

	tracing::info!(host = %config.http.host, port = config.http.port, database = %config.database.url, "starting cadence-daemon");

	let pool = cadence_store::create_pool(&config.database.url).await?;
	let store: Arc<dyn cadence_store::Store> = Arc::new(SqliteStore::new(pool));

	let monitor = Monitor::bootstrap(store.clone()).await?;

	let reporter = Arc::new(RssReporter::new(config.notify.rss_capacity));
	let notifier = Notifier::new(store.clone(), reporter, config.notify.daily_time.clone(), config.notify.daily_timezone.clone());
	let cleaner = Cleaner::new(store.clone(), &config.clean.cron_expr, config.clean.timezone.as_deref(), config.clean.keep_days)?;

	let (shutdown_tx, _) = broadcast::channel::<()>(1);

	let monitor_task = tokio::spawn(monitor.clone().run(shutdown_tx.subscribe()));
	let notifier_task = tokio::spawn(notifier.run(shutdown_tx.subscribe()));
	let cleaner_task = tokio::spawn(cleaner.run(shutdown_tx.subscribe()));

	let app = create_router(AppState::new(store, monitor))
		.layer(TraceLayer::new_for_http())
		.layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any));

	let addr = config.http.socket_addr();
	tracing::info!("listening on {}", addr);
	let listener = tokio::net::TcpListener::bind(&addr).await?;

	tokio::select! {
		result = axum::serve(listener, app) => {
			if let Err(e) = result {
				tracing::error!(error = %e, "server error");
			}
		}
		_ = tokio::signal::ctrl_c() => {
			tracing::info!("received shutdown signal");
		}
	}

	let _ = shutdown_tx.send(());
	for task in [monitor_task, notifier_task, cleaner_task] {
		let _ = task.await;
	}

	tracing::info!("cadence-daemon shutdown complete");
	Ok(())
}
