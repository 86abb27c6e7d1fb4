mod common;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use common::{sheet_items, Harness};
use print_fulfillment_core::constants::OrderCustomStatus;
use print_fulfillment_core::orchestration::{JobQueue, JobWorker};
use print_fulfillment_core::web::{create_router, AppState};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::sync::broadcast;
use tower::ServiceExt; // for `oneshot`
use uuid::Uuid;

fn app(harness: &Harness) -> (Router, JobQueue, JobWorker) {
    let (queue, worker) = JobQueue::new(8);
    let router = create_router(AppState::new(queue.clone(), harness.coordinator.clone()));
    (router, queue, worker)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_reports_item_count() {
    let harness = Harness::new(sheet_items(1, 3, 10, 1));
    let (router, _queue, _worker) = app(&harness);

    let response = router.oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["item_count"], 3);
}

#[tokio::test]
async fn test_trigger_returns_accepted_job_and_status_is_queryable() {
    let harness = Harness::new(Vec::new());
    let (router, _queue, _worker) = app(&harness);

    let response = router
        .clone()
        .oneshot(post_json("/label", json!({"orderCustomId": 991})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let accepted = body_json(response).await;
    assert_eq!(accepted["kind"], "reprint_single_label");
    let job_id = accepted["job_id"].as_str().unwrap().to_string();
    assert_eq!(accepted["status_url"], format!("/jobs/{job_id}"));

    let response = router
        .oneshot(get(&format!("/jobs/{job_id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let status = body_json(response).await;
    assert_eq!(status["id"], job_id);
    assert_eq!(status["state"], "queued");
}

#[tokio::test]
async fn test_unknown_job_is_not_found() {
    let harness = Harness::new(Vec::new());
    let (router, _queue, _worker) = app(&harness);

    let response = router
        .oneshot(get(&format!("/jobs/{}", Uuid::new_v4())))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_malformed_trigger_body_is_rejected() {
    let harness = Harness::new(Vec::new());
    let (router, queue, _worker) = app(&harness);

    let response = router
        .oneshot(post_json("/sheet", json!({"batchId": 4})))
        .await
        .unwrap();

    assert!(response.status().is_client_error());
    assert!(queue.registry().is_empty());
}

#[tokio::test]
async fn test_every_trigger_route_enqueues_its_job() {
    let harness = Harness::new(Vec::new());
    let (router, queue, _worker) = app(&harness);
    let batch_guid = Uuid::new_v4();

    let requests = [
        (post_json("/label", json!({"orderCustomId": 5})), "reprint_single_label"),
        (
            post_json("/sheet/labels", json!({"batchGuid": batch_guid})),
            "reprint_sheet_labels",
        ),
        (
            post_json(
                "/sheet",
                json!({
                    "batchId": 4,
                    "batchGuid": batch_guid,
                    "fileUrl": "https://pdf.test/4.pdf",
                    "printerNo": 2
                }),
            ),
            "reprint_sheet",
        ),
        (post_json("/sheet/all", json!({})), "force_print_remaining"),
    ];

    for (request, kind) in requests {
        let response = router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(body_json(response).await["kind"], kind);
    }
    assert_eq!(queue.registry().len(), 4);
}

#[tokio::test]
async fn test_full_queue_answers_service_unavailable() {
    let harness = Harness::new(Vec::new());
    let (queue, _worker) = JobQueue::new(1);
    let router = create_router(AppState::new(queue, harness.coordinator.clone()));

    let first = router
        .clone()
        .oneshot(post_json("/label", json!({"orderCustomId": 1})))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::ACCEPTED);

    let second = router
        .oneshot(post_json("/label", json!({"orderCustomId": 2})))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_force_print_job_runs_to_success() {
    let harness = Harness::new(sheet_items(1, 4, 12, 1));
    let (router, queue, worker) = app(&harness);
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let worker_handle = worker.spawn(harness.coordinator.clone(), shutdown_rx);

    let response = router
        .oneshot(post_json("/sheet/all", json!({})))
        .await
        .unwrap();
    let job_id: Uuid = body_json(response).await["job_id"]
        .as_str()
        .unwrap()
        .parse()
        .unwrap();

    let mut finished = None;
    for _ in 0..100 {
        match queue.status(job_id) {
            Some(record) if record.state.is_finished() => {
                finished = Some(record);
                break;
            }
            _ => tokio::time::sleep(Duration::from_millis(10)).await,
        }
    }

    let record = finished.expect("job should finish");
    assert_eq!(serde_json::to_value(&record).unwrap()["state"], "succeeded");
    assert_eq!(
        harness.repository.item(4).unwrap().custom_status_id,
        OrderCustomStatus::Printed
    );

    shutdown_tx.send(()).unwrap();
    worker_handle.await.unwrap();
}
