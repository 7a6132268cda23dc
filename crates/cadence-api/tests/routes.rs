// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use cadence_api::{create_router, AppState};
use cadence_monitor::Monitor;
use cadence_store::{SqliteStore, Store};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn test_app() -> (Router, Arc<dyn Store>) {
	let store: Arc<dyn Store> = Arc::new(SqliteStore::new(cadence_store::test_pool().await.unwrap()));
	let monitor = Monitor::bootstrap(store.clone()).await.unwrap();
	(create_router(AppState::new(store.clone(), monitor)), store)
}

async fn call(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
	let request = match body {
		Some(b) => Request::builder().method(method).uri(uri).header("content-type", "application/json").body(Body::from(b.to_string())).unwrap(),
		None => Request::builder().method(method).uri(uri).body(Body::empty()).unwrap(),
	};
	let response = app.oneshot(request).await.unwrap();
	let status = response.status();
	let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
	let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
	(status, value)
}

#[tokio::test]
async fn start_then_finish_round_trip() {
	let (app, _store) = test_app().await;

	let (status, body) = call(app.clone(), Method::PUT, "/api/0/start/host-a/deploy", Some(json!({"command": "/bin/job.sh"}))).await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["inhibit"], json!(false));

	let (status, _body) =
		call(app, Method::PUT, "/api/0/finish/host-a/deploy", Some(json!({"command": "/bin/job.sh", "status": 0, "stdout": "ok"}))).await;
	assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn finish_rejects_monitor_only_status_codes() {
	let (app, _store) = test_app().await;
	// -1 is StatusCode::Late, a Monitor-internal code a client may never send.
	let (status, body) =
		call(app, Method::PUT, "/api/0/finish/host-a/deploy", Some(json!({"command": "/bin/job.sh", "status": -1}))).await;
	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(body["error"], json!("bad_request"));
}

#[tokio::test]
async fn crontab_put_then_get_round_trips() {
	let (app, _store) = test_app().await;

	let lines = vec!["* * * * * /bin/job.sh".to_string()];
	let (status, body) = call(app.clone(), Method::PUT, "/api/0/crontab/host-a/deploy", Some(json!({"crontab": lines}))).await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["warning"], json!(Vec::<String>::new()));

	let (status, body) = call(app, Method::GET, "/api/0/crontab/host-a/deploy?raw=true", None).await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["crontab"], json!(lines));
}

#[tokio::test]
async fn job_info_404_for_unknown_job() {
	let (app, _store) = test_app().await;
	let (status, body) = call(app, Method::GET, "/api/0/jobs/999", None).await;
	assert_eq!(status, StatusCode::NOT_FOUND);
	assert_eq!(body["error"], json!("not_found"));
}

#[tokio::test]
async fn jobstatus_reflects_a_logged_start() {
	let (app, store) = test_app().await;
	store.log_start("host-a", "deploy", None, "/bin/job.sh").await.unwrap();

	let (status, body) = call(app, Method::GET, "/api/0/jobstatus?timeout_secs=1", None).await;
	assert_eq!(status, StatusCode::OK);
	assert!(body["max_start_id"].as_i64().unwrap() > 0);
}

#[tokio::test]
async fn summary_reports_job_count() {
	let (app, store) = test_app().await;
	store.log_start("host-a", "deploy", None, "/bin/job.sh").await.unwrap();

	let (status, body) = call(app, Method::GET, "/api/0/summary", None).await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["num_jobs"], json!(0));
}
