// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use cadence_core::StatusCode;
use cadence_store::{CheckJobRequest, SqliteStore, Store};

async fn store() -> SqliteStore {
	SqliteStore::new(cadence_store::test_pool().await.unwrap())
}

fn req(crabid: Option<&str>, command: &str) -> CheckJobRequest {
	CheckJobRequest {
		host: "host-a".to_string(),
		user: "deploy".to_string(),
		crabid: crabid.map(str::to_string),
		command: command.to_string(),
		time: Some("* * * * *".to_string()),
		timezone: None,
	}
}

#[tokio::test]
async fn identity_stable_across_alternating_crabid_and_command() {
	let store = store().await;
	let by_crabid = store.check_job(req(Some("backup"), "/bin/backup.sh")).await.unwrap();
	let by_command = store.check_job(req(None, "/bin/other.sh")).await.unwrap();
	assert_ne!(by_crabid, by_command);

	let repeat_by_crabid = store.check_job(req(Some("backup"), "/bin/backup.sh")).await.unwrap();
	let repeat_by_command = store.check_job(req(None, "/bin/other.sh")).await.unwrap();
	assert_eq!(by_crabid, repeat_by_crabid);
	assert_eq!(by_command, repeat_by_command);
}

#[tokio::test]
async fn command_then_crabid_adoption_preserves_id() {
	let store = store().await;
	let bare = store.check_job(req(None, "/bin/backup.sh")).await.unwrap();
	let adopted = store.check_job(req(Some("backup"), "/bin/backup.sh")).await.unwrap();
	assert_eq!(bare, adopted);

	let job = store.get_job_info(adopted).await.unwrap().unwrap();
	assert_eq!(job.crabid.as_deref(), Some("backup"));
}

#[tokio::test]
async fn undelete_on_reappearance_preserves_id_and_clears_deleted_at() {
	let store = store().await;
	let id = store.check_job(req(Some("backup"), "/bin/backup.sh")).await.unwrap();
	store.delete_job(id).await.unwrap();

	let deleted = store.get_job_info(id).await.unwrap().unwrap();
	assert!(deleted.is_deleted());

	let resurrected = store.check_job(req(Some("backup"), "/bin/backup.sh")).await.unwrap();
	assert_eq!(resurrected, id);

	let job = store.get_job_info(id).await.unwrap().unwrap();
	assert!(!job.is_deleted());
}

#[tokio::test]
async fn end_to_end_undelete_scenario() {
	// E4: a job disappears from a crontab submission (deleted), then
	// reappears in a later one (resurrected) with its history intact.
	let store = store().await;
	let id = store.check_job(req(Some("backup"), "/bin/backup.sh")).await.unwrap();
	store.log_finish("host-a", "deploy", Some("backup"), "/bin/backup.sh", StatusCode::Success, None, None)
		.await
		.unwrap();
	store.delete_job(id).await.unwrap();
	store.check_job(req(Some("backup"), "/bin/backup.sh")).await.unwrap();

	let finishes = store.get_job_finishes(id, None, None, None).await.unwrap();
	assert_eq!(finishes.len(), 1);
}

#[tokio::test]
async fn cursor_monotonic_under_concurrent_check_jobs() {
	let store = Arc::new(store().await);
	let mut handles = Vec::new();
	for worker in 0..8 {
		let store = Arc::clone(&store);
		handles.push(tokio::spawn(async move {
			for i in 0..200 {
				store
					.check_job(req(None, &format!("/bin/worker-{worker}-{i}.sh")))
					.await
					.unwrap();
			}
		}));
	}
	for handle in handles {
		handle.await.unwrap();
	}

	let jobs = store.get_jobs(Default::default()).await.unwrap();
	let mut ids: Vec<i64> = jobs.iter().map(|j| j.id.0).collect();
	let mut sorted = ids.clone();
	sorted.sort_unstable();
	ids.sort_unstable();
	assert_eq!(ids, sorted);
	assert_eq!(jobs.len(), 8 * 200);
	let unique: std::collections::HashSet<i64> = ids.into_iter().collect();
	assert_eq!(unique.len(), 8 * 200, "every concurrent check_job call must resolve to a distinct job");
}
