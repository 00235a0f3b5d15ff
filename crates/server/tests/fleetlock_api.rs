//! End-to-end scenarios against the router with an in-process `axum-test`
//! client: no cluster client configured, so every
//! reserve that succeeds does so without a drain round-trip.

use std::sync::Arc;

use axum_test::TestServer;
use serde_json::json;

use fleetlock_coordinator::RebootCoordinator;
use fleetlock_core::{GroupConfig, Groups};
use fleetlock_manager::LockManager;
use fleetlock_server::api::{AppState, router};
use fleetlock_state_memory::MemoryBackend;

fn server_with_single_slot_group() -> TestServer {
    let mut groups = Groups::new();
    groups.insert("default".to_string(), GroupConfig { slots: 1 });
    let names: Vec<_> = groups.keys().cloned().collect();

    let manager = LockManager::new(&groups, Box::new(MemoryBackend::new(names)));
    let coordinator = Arc::new(RebootCoordinator::new(manager, None));
    let app = router(AppState { coordinator });

    TestServer::new(app).unwrap()
}

fn fleetlock_request(server: &TestServer, path: &str, id: &str, group: &str) -> axum_test::TestResponse {
    server
        .post(path)
        .add_header("fleet-lock-protocol", "true")
        .json(&json!({ "client_params": { "id": id, "group": group } }))
}

#[tokio::test]
async fn basic_lock_and_release() {
    let server = server_with_single_slot_group();

    let response = fleetlock_request(&server, "/v1/pre-reboot", "u1", "default");
    response.assert_status_ok();

    let response = fleetlock_request(&server, "/v1/pre-reboot", "u2", "default");
    response.assert_status(axum::http::StatusCode::LOCKED);

    let response = fleetlock_request(&server, "/v1/steady-state", "u1", "default");
    response.assert_status_ok();

    let response = fleetlock_request(&server, "/v1/pre-reboot", "u2", "default");
    response.assert_status_ok();
}

#[tokio::test]
async fn reserve_is_idempotent() {
    let server = server_with_single_slot_group();

    fleetlock_request(&server, "/v1/pre-reboot", "u1", "default").assert_status_ok();
    fleetlock_request(&server, "/v1/pre-reboot", "u1", "default").assert_status_ok();
}

#[tokio::test]
async fn missing_header_is_rejected() {
    let server = server_with_single_slot_group();
    let response = server
        .post("/v1/pre-reboot")
        .json(&json!({ "client_params": { "id": "u1", "group": "default" } }));
    response.assert_status_bad_request();
}

#[tokio::test]
async fn invalid_group_is_rejected() {
    let server = server_with_single_slot_group();
    let response = fleetlock_request(&server, "/v1/pre-reboot", "u1", "bad group!");
    response.assert_status_bad_request();
}

#[tokio::test]
async fn empty_id_is_rejected() {
    let server = server_with_single_slot_group();
    let response = fleetlock_request(&server, "/v1/pre-reboot", "", "default");
    response.assert_status_bad_request();
}

#[tokio::test]
async fn unknown_path_is_not_found() {
    let server = server_with_single_slot_group();
    let response = server.get("/v1/nope").await;
    response.assert_status_not_found();
}

#[tokio::test]
async fn healthz_reports_ok() {
    let server = server_with_single_slot_group();
    let response = server.get("/healthz").await;
    response.assert_status_ok();
    response.assert_json(&json!({ "status": "ok", "error": "" }));
}

#[tokio::test]
async fn healthz_metrics_reflects_reservations() {
    let server = server_with_single_slot_group();
    fleetlock_request(&server, "/v1/pre-reboot", "u1", "default").assert_status_ok();

    let response = server.get("/healthz/metrics").await;
    response.assert_status_ok();
    response.assert_json(&json!({
        "reservations_granted": 1,
        "releases": 0,
        "drains_started": 0,
        "drains_completed": 0,
        "drains_failed": 0,
    }));
}
