// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::sync::Arc;
use std::time::{Duration, Instant};

use cadence_core::{JobConfig, StatusCode};
use cadence_monitor::Monitor;
use cadence_store::{CheckJobRequest, SqliteStore, Store};
use chrono::Utc;

async fn store() -> Arc<dyn Store> {
	Arc::new(SqliteStore::new(cadence_store::test_pool().await.unwrap()))
}

#[tokio::test]
async fn long_poll_wakes_on_new_event_before_timeout() {
	// #10 / E6: a long-poll waiter wakes promptly once a new event lands,
	// well before the requested timeout elapses.
	let store = store().await;
	let monitor = Monitor::bootstrap(store.clone()).await.unwrap();

	let writer_store = store.clone();
	let writer_monitor = monitor.clone();
	tokio::spawn(async move {
		tokio::time::sleep(Duration::from_millis(50)).await;
		writer_store.log_start("host-a", "deploy", None, "/bin/job.sh").await.unwrap();
		writer_monitor.poll().await.unwrap();
	});

	let start = Instant::now();
	let snapshot = monitor.wait_for_event_since(0, 0, 0, Duration::from_secs(5)).await;
	let elapsed = start.elapsed();

	assert!(elapsed < Duration::from_secs(2), "long-poll should wake well before the 5s timeout, took {elapsed:?}");
	assert!(snapshot.max_start_id > 0);
}

#[tokio::test]
async fn long_poll_respects_timeout_plus_jitter_bound_when_idle() {
	// #10: with no new events, the wait is bounded by timeout + uniform(0, 20s).
	let store = store().await;
	let monitor = Monitor::bootstrap(store).await.unwrap();

	let start = Instant::now();
	let snapshot = monitor.wait_for_event_since(0, 0, 0, Duration::from_millis(50)).await;
	let elapsed = start.elapsed();

	assert!(elapsed >= Duration::from_millis(50));
	assert!(elapsed <= Duration::from_secs(21), "wait exceeded the documented timeout+jitter bound: {elapsed:?}");
	assert_eq!(snapshot.max_start_id, 0);
}

#[tokio::test]
async fn late_then_missed_on_a_zero_graceperiod_job() {
	// E2: a scheduled job with no grace period goes straight from LATE to
	// MISSED once its deadline passes.
	let store = store().await;
	let id = store
		.check_job(CheckJobRequest {
			host: "host-a".to_string(),
			user: "deploy".to_string(),
			crabid: None,
			command: "/bin/job.sh".to_string(),
			time: Some("* * * * *".to_string()),
			timezone: None,
		})
		.await
		.unwrap();
	store
		.write_job_config(JobConfig { job_id: Some(id), graceperiod_minutes: 0, ..Default::default() })
		.await
		.unwrap();

	let monitor = Monitor::bootstrap(store).await.unwrap();
	monitor.tick(Utc::now()).await.unwrap();

	let late_snapshot = monitor.snapshot().await;
	assert_eq!(late_snapshot.jobs.get(&id).unwrap().status, Some(StatusCode::Late));

	monitor.sweep_timeouts().await.unwrap();
	let missed_snapshot = monitor.snapshot().await;
	assert_eq!(missed_snapshot.jobs.get(&id).unwrap().status, Some(StatusCode::Missed));
}

#[tokio::test]
async fn running_job_times_out_on_a_zero_timeout_config() {
	// E3: a job configured with a zero timeout is declared TIMEOUT as soon
	// as the sweep runs after it starts.
	let store = store().await;
	let id = store
		.check_job(CheckJobRequest {
			host: "host-a".to_string(),
			user: "deploy".to_string(),
			crabid: None,
			command: "/bin/job.sh".to_string(),
			time: None,
			timezone: None,
		})
		.await
		.unwrap();
	store.write_job_config(JobConfig { job_id: Some(id), timeout_minutes: 0, ..Default::default() }).await.unwrap();

	let monitor = Monitor::bootstrap(store.clone()).await.unwrap();
	store.log_start("host-a", "deploy", None, "/bin/job.sh").await.unwrap();
	monitor.poll().await.unwrap();

	let running_snapshot = monitor.snapshot().await;
	assert!(running_snapshot.jobs.get(&id).unwrap().running);

	monitor.sweep_timeouts().await.unwrap();
	let timed_out_snapshot = monitor.snapshot().await;
	let job_state = timed_out_snapshot.jobs.get(&id).unwrap();
	assert_eq!(job_state.status, Some(StatusCode::Timeout));
	assert!(!job_state.running);
}

#[tokio::test]
async fn bootstrap_replays_history_into_reliability() {
	let store = store().await;
	for _ in 0..3 {
		store
			.log_finish("host-a", "deploy", None, "/bin/job.sh", StatusCode::Success, Some("ok"), None)
			.await
			.unwrap();
	}
	store
		.log_finish("host-a", "deploy", None, "/bin/job.sh", StatusCode::Fail, Some("boom"), None)
		.await
		.unwrap();

	let monitor = Monitor::bootstrap(store).await.unwrap();
	let snapshot = monitor.snapshot().await;
	let state = snapshot.jobs.values().next().unwrap();
	assert_eq!(state.status, Some(StatusCode::Fail));
	assert_eq!(state.reliability(), 75);
}
