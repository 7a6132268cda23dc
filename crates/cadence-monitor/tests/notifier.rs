// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use async_trait::async_trait;
use cadence_core::{Event, FinishEvent, Job, JobConfig, JobId, Notification, NotificationId, NotificationMethod, StatusCode};
use cadence_monitor::{NotifyJobWindow, NotifyRecipient, Notifier, Reporter, ReporterError};
use cadence_store::{CheckJobRequest, JobFields, JobFilter, Store};
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

/// Store double exposing only the handful of reads the Notifier uses;
/// every other operation is unreachable from this test and panics if
/// ever called.
struct FixtureStore {
	notifications: Vec<Notification>,
	jobs: Vec<Job>,
}

#[async_trait]
impl Store for FixtureStore {
	async fn get_jobs(&self, filter: JobFilter) -> cadence_store::Result<Vec<Job>> {
		Ok(self
			.jobs
			.iter()
			.cloned()
			.filter(|j| filter.host.as_deref().is_none_or(|h| h == j.host) && filter.user.as_deref().is_none_or(|u| u == j.user))
			.collect())
	}
	async fn check_job(&self, _req: CheckJobRequest) -> cadence_store::Result<JobId> {
		unimplemented!()
	}
	async fn delete_job(&self, _id: JobId) -> cadence_store::Result<()> {
		unimplemented!()
	}
	async fn update_job(&self, _id: JobId, _fields: JobFields) -> cadence_store::Result<()> {
		unimplemented!()
	}
	async fn log_start(&self, _host: &str, _user: &str, _crabid: Option<&str>, _command: &str) -> cadence_store::Result<(JobId, bool)> {
		unimplemented!()
	}
	async fn log_finish(
		&self,
		_host: &str,
		_user: &str,
		_crabid: Option<&str>,
		_command: &str,
		_status: StatusCode,
		_stdout: Option<&str>,
		_stderr: Option<&str>,
	) -> cadence_store::Result<JobId> {
		unimplemented!()
	}
	async fn log_alarm(&self, _job_id: JobId, _status: StatusCode) -> cadence_store::Result<()> {
		unimplemented!()
	}
	async fn get_job_info(&self, _id: JobId) -> cadence_store::Result<Option<Job>> {
		unimplemented!()
	}
	async fn get_job_config(&self, _id: JobId) -> cadence_store::Result<Option<JobConfig>> {
		unimplemented!()
	}
	async fn write_job_config(&self, _config: JobConfig) -> cadence_store::Result<JobConfig> {
		unimplemented!()
	}
	async fn disable_inhibit(&self, _id: JobId) -> cadence_store::Result<()> {
		unimplemented!()
	}
	async fn get_orphan_configs(&self) -> cadence_store::Result<Vec<JobConfig>> {
		unimplemented!()
	}
	async fn relink_job_config(&self, _config_id: i64, _job_id: JobId) -> cadence_store::Result<()> {
		unimplemented!()
	}
	async fn get_job_events(
		&self,
		_id: JobId,
		_limit: Option<i64>,
		_start: Option<DateTime<Utc>>,
		_end: Option<DateTime<Utc>>,
	) -> cadence_store::Result<Vec<Event>> {
		unimplemented!()
	}
	async fn get_events_since(&self, _after_start: i64, _after_alarm: i64, _after_finish: i64) -> cadence_store::Result<Vec<Event>> {
		unimplemented!()
	}
	async fn get_job_finishes(
		&self,
		_id: JobId,
		_limit: Option<i64>,
		_before: Option<DateTime<Utc>>,
		_after: Option<DateTime<Utc>>,
	) -> cadence_store::Result<Vec<FinishEvent>> {
		unimplemented!()
	}
	async fn get_fail_events(&self, _limit: i64) -> cadence_store::Result<Vec<FinishEvent>> {
		unimplemented!()
	}
	async fn delete_old_events(&self, _before: DateTime<Utc>) -> cadence_store::Result<u64> {
		unimplemented!()
	}
	async fn get_job_output(&self, _finish_event_id: i64) -> cadence_store::Result<Option<(String, String)>> {
		unimplemented!()
	}
	async fn write_raw_crontab(&self, _host: &str, _user: &str, _lines: &[String]) -> cadence_store::Result<()> {
		unimplemented!()
	}
	async fn get_raw_crontab(&self, _host: &str, _user: &str) -> cadence_store::Result<Vec<String>> {
		unimplemented!()
	}
	async fn get_crontab(&self, _host: &str, _user: &str) -> cadence_store::Result<Vec<String>> {
		unimplemented!()
	}
	async fn save_crontab(
		&self,
		_host: &str,
		_user: &str,
		_lines: Vec<String>,
		_default_timezone: Option<String>,
	) -> cadence_store::Result<Vec<String>> {
		unimplemented!()
	}
	async fn get_notifications(&self) -> cadence_store::Result<Vec<Notification>> {
		Ok(self.notifications.clone())
	}
	async fn get_job_notifications(&self, _config_id: i64) -> cadence_store::Result<Vec<Notification>> {
		unimplemented!()
	}
	async fn get_match_notifications(&self, _host: Option<&str>, _user: Option<&str>) -> cadence_store::Result<Vec<Notification>> {
		unimplemented!()
	}
	async fn write_notification(&self, _notification: Notification) -> cadence_store::Result<Notification> {
		unimplemented!()
	}
	async fn delete_notification(&self, _id: NotificationId) -> cadence_store::Result<()> {
		unimplemented!()
	}
}

struct CapturingReporter {
	calls: Mutex<Vec<(Vec<NotifyRecipient>, Vec<NotifyJobWindow>)>>,
}

impl CapturingReporter {
	fn new() -> Self {
		Self { calls: Mutex::new(Vec::new()) }
	}
}

#[async_trait]
impl Reporter for CapturingReporter {
	async fn report(&self, recipients: &[NotifyRecipient], jobs: &[NotifyJobWindow]) -> Result<(), ReporterError> {
		self.calls.lock().await.push((recipients.to_vec(), jobs.to_vec()));
		Ok(())
	}
}

fn job(id: i64, command: &str) -> Job {
	Job {
		id: JobId(id),
		host: "host-a".to_string(),
		user: "deploy".to_string(),
		crabid: None,
		command: command.to_string(),
		time: None,
		timezone: None,
		installed_at: Utc::now(),
		deleted_at: None,
	}
}

fn notification(id: i64, job_id: i64, address: &str) -> Notification {
	Notification {
		id: NotificationId(id),
		job_id: Some(JobId(job_id)),
		host: None,
		user: None,
		method: NotificationMethod::Email,
		address: address.to_string(),
		time: Some("* * * * *".to_string()),
		timezone: None,
		skip_ok: false,
		skip_warning: false,
		skip_error: false,
		include_output: false,
	}
}

#[tokio::test]
async fn identical_job_sets_collapse_while_differing_ones_stay_separate() {
	// #13: two recipients watching the same job collapse into one report;
	// a recipient watching a different job gets its own.
	let store: Arc<dyn Store> = Arc::new(FixtureStore {
		jobs: vec![job(1, "/bin/a.sh"), job(2, "/bin/b.sh")],
		notifications: vec![
			notification(1, 1, "first@example.com"),
			notification(2, 1, "second@example.com"),
			notification(3, 2, "third@example.com"),
		],
	});
	let reporter = Arc::new(CapturingReporter::new());
	let notifier = Notifier::new(store, reporter.clone(), "0 0 * * *".to_string(), Some("UTC".to_string()));

	notifier.tick(Utc::now()).await.unwrap();

	let calls = reporter.calls.lock().await;
	assert_eq!(calls.len(), 2, "expected one collapsed call for job 1 and one separate call for job 2");

	let job1_call = calls.iter().find(|(_, jobs)| jobs.iter().any(|w| w.job_id == JobId(1))).unwrap();
	assert_eq!(job1_call.0.len(), 2, "both recipients watching job 1 should be grouped into the same report");
	assert_eq!(job1_call.1.len(), 1);

	let job2_call = calls.iter().find(|(_, jobs)| jobs.iter().any(|w| w.job_id == JobId(2))).unwrap();
	assert_eq!(job2_call.0.len(), 1);
}

#[tokio::test]
async fn notification_with_no_match_never_reports() {
	let store: Arc<dyn Store> = Arc::new(FixtureStore { jobs: vec![job(1, "/bin/a.sh")], notifications: vec![] });
	let reporter = Arc::new(CapturingReporter::new());
	let notifier = Notifier::new(store, reporter.clone(), "0 0 * * *".to_string(), Some("UTC".to_string()));

	notifier.tick(Utc::now()).await.unwrap();

	assert!(reporter.calls.lock().await.is_empty());
}
