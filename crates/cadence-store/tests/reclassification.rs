// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use cadence_core::{JobConfig, JobId, StatusCode};
use cadence_store::{CheckJobRequest, SqliteStore, Store};

async fn job_with_config(store: &SqliteStore, config: JobConfig) -> JobId {
	let id = store
		.check_job(CheckJobRequest {
			host: "host-a".to_string(),
			user: "deploy".to_string(),
			crabid: None,
			command: "/bin/backup.sh".to_string(),
			time: Some("* * * * *".to_string()),
			timezone: None,
		})
		.await
		.unwrap();
	store.write_job_config(JobConfig { job_id: Some(id), ..config }).await.unwrap();
	id
}

async fn finish_status(store: &SqliteStore, id: JobId, status: StatusCode, stdout: &str) -> StatusCode {
	store
		.log_finish("host-a", "deploy", None, "/bin/backup.sh", status, Some(stdout), None)
		.await
		.unwrap();
	store.get_job_finishes(id, Some(1), None, None).await.unwrap()[0].status
}

#[tokio::test]
async fn fail_pattern_downgrades_a_nominal_success() {
	// E5: a script exits 0 but its output matches the configured fail
	// pattern, so the reported SUCCESS is reclassified to FAIL.
	let store = SqliteStore::new(cadence_store::test_pool().await.unwrap());
	let id = job_with_config(&store, JobConfig { fail_pattern: Some("ERROR".to_string()), ..Default::default() }).await;

	let status = finish_status(&store, id, StatusCode::Success, "backup complete\nERROR: disk full").await;
	assert_eq!(status, StatusCode::Fail);
}

#[tokio::test]
async fn success_pattern_required_but_absent_without_fail_pattern_becomes_fail() {
	let store = SqliteStore::new(cadence_store::test_pool().await.unwrap());
	let id = job_with_config(&store, JobConfig { success_pattern: Some("OK".to_string()), ..Default::default() }).await;

	let status = finish_status(&store, id, StatusCode::Success, "done, no marker here").await;
	assert_eq!(status, StatusCode::Fail);
}

#[tokio::test]
async fn success_pattern_required_but_absent_with_fail_pattern_becomes_unknown() {
	let store = SqliteStore::new(cadence_store::test_pool().await.unwrap());
	let id = job_with_config(
		&store,
		JobConfig { success_pattern: Some("OK".to_string()), fail_pattern: Some("ERROR".to_string()), ..Default::default() },
	)
	.await;

	let status = finish_status(&store, id, StatusCode::Success, "done, no marker here").await;
	assert_eq!(status, StatusCode::Unknown);
}

#[tokio::test]
async fn fail_pattern_matches_across_the_stdout_stderr_boundary() {
	// The pattern spans the join point: "output" ends stdout, "ERROR" starts
	// stderr. It only matches if the two streams are joined with a
	// separator between them rather than concatenated directly.
	let store = SqliteStore::new(cadence_store::test_pool().await.unwrap());
	let id = job_with_config(&store, JobConfig { fail_pattern: Some("(?s)output.ERROR".to_string()), ..Default::default() }).await;

	store
		.log_finish("host-a", "deploy", None, "/bin/backup.sh", StatusCode::Success, Some("backup output"), Some("ERROR: disk full"))
		.await
		.unwrap();
	let status = store.get_job_finishes(id, Some(1), None, None).await.unwrap()[0].status;
	assert_eq!(status, StatusCode::Fail);
}

#[tokio::test]
async fn already_running_is_never_reclassified() {
	let store = SqliteStore::new(cadence_store::test_pool().await.unwrap());
	let id = job_with_config(&store, JobConfig { fail_pattern: Some(".*".to_string()), ..Default::default() }).await;

	let status = finish_status(&store, id, StatusCode::AlreadyRunning, "anything").await;
	assert_eq!(status, StatusCode::AlreadyRunning);
}

#[tokio::test]
async fn error_statuses_are_never_reclassified() {
	let store = SqliteStore::new(cadence_store::test_pool().await.unwrap());
	let id = job_with_config(&store, JobConfig { success_pattern: Some("OK".to_string()), ..Default::default() }).await;

	let status = finish_status(&store, id, StatusCode::CouldNotStart, "irrelevant output").await;
	assert_eq!(status, StatusCode::CouldNotStart);
}

#[tokio::test]
async fn happy_path_start_then_finish_round_trips_through_event_log() {
	// E1: a job starts, finishes successfully, and both events are
	// retrievable afterwards in newest-first order.
	let store = SqliteStore::new(cadence_store::test_pool().await.unwrap());
	let (id, inhibited) = store.log_start("host-a", "deploy", Some("backup"), "/bin/backup.sh").await.unwrap();
	assert!(!inhibited);
	store.log_finish("host-a", "deploy", Some("backup"), "/bin/backup.sh", StatusCode::Success, Some("ok"), None)
		.await
		.unwrap();

	let events = store.get_job_events(id, None, None, None).await.unwrap();
	assert_eq!(events.len(), 2);
	assert!(matches!(events[0], cadence_core::Event::Finish(_)));
	assert!(matches!(events[1], cadence_core::Event::Start(_)));
}
