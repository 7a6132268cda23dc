// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use cadence_cli::snapshot;
use cadence_core::JobConfig;
use cadence_store::{CheckJobRequest, SqliteStore, Store};

async fn store() -> SqliteStore {
	SqliteStore::new(cadence_store::test_pool().await.unwrap())
}

#[tokio::test]
async fn export_then_import_into_a_fresh_store_recreates_jobs_and_configs() {
	let source = store().await;
	let id = source
		.check_job(CheckJobRequest {
			host: "host-a".to_string(),
			user: "deploy".to_string(),
			crabid: Some("nightly-build".to_string()),
			command: "/bin/build.sh".to_string(),
			time: Some("0 2 * * *".to_string()),
			timezone: Some("UTC".to_string()),
		})
		.await
		.unwrap();
	source.write_job_config(JobConfig { job_id: Some(id), graceperiod_minutes: 10, ..Default::default() }).await.unwrap();

	let data = snapshot::export(&source).await.unwrap();
	assert_eq!(data.jobs.len(), 1);

	let dest = store().await;
	let report = snapshot::import(&dest, data).await.unwrap();
	assert_eq!(report.jobs, 1);
	assert_eq!(report.configs, 1);

	let jobs = dest.get_jobs(Default::default()).await.unwrap();
	assert_eq!(jobs.len(), 1);
	assert_eq!(jobs[0].crabid.as_deref(), Some("nightly-build"));

	let config = dest.get_job_config(jobs[0].id).await.unwrap().unwrap();
	assert_eq!(config.graceperiod_minutes, 10);
}

#[tokio::test]
async fn importing_twice_is_idempotent() {
	let source = store().await;
	source.check_job(CheckJobRequest { host: "host-a".to_string(), user: "deploy".to_string(), crabid: None, command: "/bin/a.sh".to_string(), time: None, timezone: None }).await.unwrap();

	let data = snapshot::export(&source).await.unwrap();
	let dest = store().await;
	snapshot::import(&dest, snapshot::Snapshot { jobs: data.jobs.iter().map(|r| snapshot::JobRecord { job: r.job.clone(), config: r.config.clone() }).collect(), notifications: vec![] }).await.unwrap();
	let again = snapshot::Snapshot { jobs: data.jobs.into_iter().collect(), notifications: vec![] };
	snapshot::import(&dest, again).await.unwrap();

	let jobs = dest.get_jobs(Default::default()).await.unwrap();
	assert_eq!(jobs.len(), 1, "re-importing the same job must not duplicate it");
}
