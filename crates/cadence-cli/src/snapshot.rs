// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use anyhow::Result;
use cadence_core::{Job, JobConfig, Notification};
use cadence_store::{CheckJobRequest, JobFilter, Store};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct JobRecord {
	pub job: Job,
	pub config: Option<JobConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Snapshot {
	pub jobs: Vec<JobRecord>,
	pub notifications: Vec<Notification>,
}

pub struct ImportReport {
	pub jobs: usize,
	pub configs: usize,
	pub notifications: usize,
}

pub async fn export(store: &dyn Store) -> Result<Snapshot> {
	let jobs = store.get_jobs(JobFilter { include_deleted: true, ..Default::default() }).await?;
	let mut records = Vec::with_capacity(jobs.len());
	for job in jobs {
		let config = store.get_job_config(job.id).await?;
		records.push(JobRecord { job, config });
	}
	let notifications = store.get_notifications().await?;
	Ok(Snapshot { jobs: records, notifications })
}

/// Reconciles each job through the same `check_job` path the crontab
/// ingest endpoint uses, so importing twice is idempotent. Notifications
/// are always re-pointed at the freshly resolved job id rather than the
/// exported one, since ids are not stable across stores.
pub async fn import(store: &dyn Store, snapshot: Snapshot) -> Result<ImportReport> {
	let mut configs_written = 0;
	let mut job_id_map = std::collections::HashMap::new();

	for record in &snapshot.jobs {
		let req = CheckJobRequest {
			host: record.job.host.clone(),
			user: record.job.user.clone(),
			crabid: record.job.crabid.clone(),
			command: record.job.command.clone(),
			time: record.job.time.clone(),
			timezone: record.job.timezone.clone(),
		};
		let resolved_id = store.check_job(req).await?;
		job_id_map.insert(record.job.id, resolved_id);

		if let Some(config) = &record.config {
			let mut config = config.clone();
			config.id = 0;
			config.job_id = Some(resolved_id);
			store.write_job_config(config).await?;
			configs_written += 1;
		}
	}

	let mut notifications_written = 0;
	for notification in snapshot.notifications {
		let mut notification = notification;
		notification.id = cadence_core::NotificationId(0);
		notification.job_id = notification.job_id.and_then(|id| job_id_map.get(&id).copied());
		store.write_notification(notification).await?;
		notifications_written += 1;
	}

	Ok(ImportReport { jobs: job_id_map.len(), configs: configs_written, notifications: notifications_written })
}
