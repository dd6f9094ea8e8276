use super::common::*;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use crate::workflows::offboarding::domain::ChecklistSeed;
use crate::workflows::offboarding::router::offboarding_router;

fn build_router() -> (
    axum::Router,
    Arc<crate::workflows::offboarding::service::OffboardingService<MemoryRepository, MemoryNotices>>,
) {
    let (service, _, _) = build_service();
    (offboarding_router(service.clone()), service)
}

fn post(uri: &str, actor: &str, roles: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-actor-id", actor)
        .header("x-actor-roles", roles)
        .body(Body::from(body.to_string()))
        .expect("request")
}

fn get(uri: &str, actor: &str, roles: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header("x-actor-id", actor)
        .header("x-actor-roles", roles)
        .body(Body::empty())
        .expect("request")
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

#[tokio::test]
async fn missing_actor_header_is_unauthorized() {
    let (router, _) = build_router();
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/offboarding/resignations")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "employee_id": "emp-17", "reason": "moving" }).to_string(),
        ))
        .expect("request");

    let response = router.oneshot(request).await.expect("dispatch");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn resignation_submission_returns_pending_case() {
    let (router, _) = build_router();
    let response = router
        .oneshot(post(
            "/api/v1/offboarding/resignations",
            "emp-17",
            "employee",
            json!({ "employee_id": "emp-17", "reason": "relocating" }),
        ))
        .await
        .expect("dispatch");

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let payload = json_body(response).await;
    assert_eq!(payload.get("status"), Some(&json!("pending")));
    assert_eq!(payload.get("initiator"), Some(&json!("employee")));
    assert!(payload.get("id").is_some());
}

#[tokio::test]
async fn employee_cannot_update_status_over_http() {
    let (router, service) = build_router();
    let request = service
        .submit_resignation(&employee_actor(), resignation())
        .expect("submission");

    let response = router
        .oneshot(post(
            &format!("/api/v1/offboarding/terminations/{}/status", request.id.0),
            "emp-17",
            "employee",
            json!({ "status": "under_review" }),
        ))
        .await
        .expect("dispatch");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_case_is_not_found() {
    let (router, _) = build_router();
    let response = router
        .oneshot(get(
            "/api/v1/offboarding/terminations/term-999999",
            "hr-1",
            "hr",
        ))
        .await
        .expect("dispatch");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn checklist_before_approval_conflicts() {
    let (router, service) = build_router();
    let request = service
        .submit_resignation(&employee_actor(), resignation())
        .expect("submission");

    let response = router
        .oneshot(post(
            &format!(
                "/api/v1/offboarding/terminations/{}/checklist",
                request.id.0
            ),
            "hr-1",
            "hr",
            json!({ "departments": ["IT"] }),
        ))
        .await
        .expect("dispatch");

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn clearance_flow_reports_progress_over_http() {
    let (router, service) = build_router();
    let id = approved_case(&service);
    let checklist = service
        .create_checklist(
            &hr_actor(),
            &id,
            ChecklistSeed {
                departments: vec!["IT".to_string(), "Finance".to_string()],
            },
        )
        .expect("checklist");

    let response = router
        .clone()
        .oneshot(post(
            &format!(
                "/api/v1/offboarding/checklists/{}/departments/IT",
                checklist.id.0
            ),
            "mgr-1",
            "manager",
            json!({ "decision": "approved" }),
        ))
        .await
        .expect("dispatch");
    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .clone()
        .oneshot(post(
            &format!("/api/v1/offboarding/checklists/{}/card", checklist.id.0),
            "hr-1",
            "hr",
            json!({ "returned": true }),
        ))
        .await
        .expect("dispatch");
    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .oneshot(get(
            &format!("/api/v1/offboarding/terminations/{}/checklist", id.0),
            "hr-1",
            "hr",
        ))
        .await
        .expect("dispatch");
    assert_eq!(response.status(), StatusCode::OK);

    let payload = json_body(response).await;
    let progress = payload.get("progress").expect("progress present");
    // 1/2 departments, vacuously complete equipment, card back:
    // 25 + 30 + 20 = 75.
    assert_eq!(progress.get("departments"), Some(&json!(50.0)));
    assert_eq!(progress.get("equipment"), Some(&json!(100.0)));
    assert_eq!(progress.get("card"), Some(&json!(100.0)));
    assert_eq!(progress.get("overall"), Some(&json!(75)));
}

#[tokio::test]
async fn stale_version_conflicts_over_http() {
    let (router, service) = build_router();
    let request = service
        .submit_resignation(&employee_actor(), resignation())
        .expect("submission");

    let response = router
        .oneshot(post(
            &format!("/api/v1/offboarding/terminations/{}/status", request.id.0),
            "hr-1",
            "hr",
            json!({ "status": "under_review", "expected_version": 9 }),
        ))
        .await
        .expect("dispatch");

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let payload = json_body(response).await;
    assert!(payload
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .contains("version"));
}

#[tokio::test]
async fn unknown_role_header_is_unauthorized() {
    let (router, _) = build_router();
    let response = router
        .oneshot(get(
            "/api/v1/offboarding/terminations",
            "emp-17",
            "wizard",
        ))
        .await
        .expect("dispatch");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
