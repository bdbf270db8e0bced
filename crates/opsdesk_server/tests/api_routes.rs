use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::{TimeZone, Utc};
use opsdesk_core::{
    AppState, EmbeddedStores, FixedClock, MemoryStateRepository, SqliteStateRepository,
    StateRepository,
};
use opsdesk_server::{router, ApiState};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

struct TestApp {
    router: Router,
    repo: Arc<MemoryStateRepository>,
}

fn test_app() -> TestApp {
    let clock = Arc::new(FixedClock::new(
        Utc.with_ymd_and_hms(2024, 8, 12, 12, 0, 0).unwrap(),
    ));
    let repo = Arc::new(MemoryStateRepository::in_memory(clock.clone()));
    let stores = EmbeddedStores::new(Arc::clone(&repo), clock);
    TestApp {
        router: router(ApiState::embedded(stores)),
        repo,
    }
}

fn empty_app() -> TestApp {
    let app = test_app();
    app.repo.save(&AppState::empty()).unwrap();
    app
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(value) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create_incident(app: &Router, body: Value) -> Value {
    let (status, created) = send(app, Method::POST, "/api/v1/incidents", Some(body)).await;
    assert_eq!(status, StatusCode::CREATED);
    created
}

#[tokio::test]
async fn healthz_reports_ok() {
    let app = test_app();
    let (status, body) = send(&app.router, Method::GET, "/healthz", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn first_list_returns_seeded_records() {
    let app = test_app();
    let (status, incidents) = send(&app.router, Method::GET, "/api/v1/incidents", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(incidents.as_array().unwrap().len(), 2);
    assert_eq!(incidents[0]["severity"], "P1");
    assert_eq!(incidents[0]["notes"].as_array().unwrap().len(), 2);

    let (status, runbooks) = send(&app.router, Method::GET, "/api/v1/runbooks", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(runbooks.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn create_incident_returns_camel_case_record() {
    let app = empty_app();
    let created = create_incident(
        &app.router,
        json!({ "title": "  Checkout errors ", "service": "Payments", "severity": "P1", "status": "Open" }),
    )
    .await;

    assert_eq!(created["title"], "Checkout errors");
    assert_eq!(created["status"], "Open");
    assert_eq!(created["createdAt"], "2024-08-12T12:00:00.000Z");
    assert_eq!(created["createdAt"], created["updatedAt"]);
    assert_eq!(created["notes"], json!([]));

    let (_, listed) = send(&app.router, Method::GET, "/api/v1/incidents", None).await;
    assert_eq!(listed[0], created);
}

#[tokio::test]
async fn create_incident_defaults_status_to_open() {
    let app = empty_app();
    let created = create_incident(
        &app.router,
        json!({ "title": "DNS flaps", "service": "Edge", "severity": "P2" }),
    )
    .await;
    assert_eq!(created["status"], "Open");
}

#[tokio::test]
async fn invalid_input_is_rejected_with_422() {
    let app = empty_app();

    let (status, body) = send(
        &app.router,
        Method::POST,
        "/api/v1/incidents",
        Some(json!({ "title": "   ", "service": "Edge", "severity": "P2" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].as_str().unwrap().contains("title"));

    let (status, _) = send(
        &app.router,
        Method::POST,
        "/api/v1/incidents",
        Some(json!({ "title": "x", "service": "Edge", "severity": "P9" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send(
        &app.router,
        Method::GET,
        "/api/v1/incidents?status=Pending",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (_, listed) = send(&app.router, Method::GET, "/api/v1/incidents", None).await;
    assert_eq!(listed, json!([]));
}

#[tokio::test]
async fn unknown_and_malformed_ids_answer_404() {
    let app = test_app();
    let missing = uuid::Uuid::new_v4();

    let (status, body) = send(
        &app.router,
        Method::GET,
        &format!("/api/v1/incidents/{missing}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Incident not found");

    let (status, _) = send(&app.router, Method::GET, "/api/v1/runbooks/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app.router,
        Method::POST,
        &format!("/api/v1/incidents/{missing}/close"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_note_close_and_reopen_flow() {
    let app = empty_app();
    let created = create_incident(
        &app.router,
        json!({ "title": "Checkout errors", "service": "Payments", "severity": "P1" }),
    )
    .await;
    let id = created["id"].as_str().unwrap().to_string();

    let (status, updated) = send(
        &app.router,
        Method::PUT,
        &format!("/api/v1/incidents/{id}"),
        Some(json!({ "severity": "P2" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["severity"], "P2");
    assert_eq!(updated["title"], "Checkout errors");
    assert_ne!(updated["updatedAt"], created["updatedAt"]);

    let (status, noted) = send(
        &app.router,
        Method::POST,
        &format!("/api/v1/incidents/{id}/notes"),
        Some(json!({ "author": "SRE", "text": "Investigating" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(noted["notes"][0]["author"], "SRE");
    assert_eq!(noted["notes"][0]["timestamp"], noted["updatedAt"]);

    let (_, closed) = send(&app.router, Method::POST, &format!("/api/v1/incidents/{id}/close"), None).await;
    assert_eq!(closed["status"], "Closed");
    let (_, reopened) = send(
        &app.router,
        Method::POST,
        &format!("/api/v1/incidents/{id}/reopen"),
        Some(json!({})),
    )
    .await;
    assert_eq!(reopened["status"], "Open");
}

#[tokio::test]
async fn delete_always_answers_204() {
    let app = empty_app();
    let created = create_incident(
        &app.router,
        json!({ "title": "Checkout errors", "service": "Payments", "severity": "P1" }),
    )
    .await;
    let uri = format!("/api/v1/incidents/{}", created["id"].as_str().unwrap());

    let (status, body) = send(&app.router, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, _) = send(&app.router, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app.router, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app.router, Method::DELETE, "/api/v1/runbooks/garbage", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn incident_list_applies_query_filters() {
    let app = empty_app();
    create_incident(
        &app.router,
        json!({ "title": "API timeout", "service": "Gateway", "severity": "P2", "status": "Open" }),
    )
    .await;
    create_incident(
        &app.router,
        json!({ "title": "DB slow", "service": "Core", "severity": "P1", "status": "Closed" }),
    )
    .await;

    let (_, hits) = send(
        &app.router,
        Method::GET,
        "/api/v1/incidents?q=api&status=Open&severity=P2",
        None,
    )
    .await;
    assert_eq!(hits.as_array().unwrap().len(), 1);
    assert_eq!(hits[0]["title"], "API timeout");

    let (_, hits) = send(&app.router, Method::GET, "/api/v1/incidents?status=Closed", None).await;
    assert_eq!(hits.as_array().unwrap().len(), 1);
    assert_eq!(hits[0]["title"], "DB slow");

    let (_, hits) = send(
        &app.router,
        Method::GET,
        "/api/v1/incidents?status=All&severity=All&service=Core",
        None,
    )
    .await;
    assert_eq!(hits.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn runbook_crud_and_tag_filter() {
    let app = empty_app();
    let (status, created) = send(
        &app.router,
        Method::POST,
        "/api/v1/runbooks",
        Some(json!({
            "title": "Cache eviction response",
            "tags": [" cache", "", "redis "],
            "content": "Flush hot keys."
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["tags"], json!(["cache", "redis"]));
    let id = created["id"].as_str().unwrap().to_string();

    let (_, hits) = send(&app.router, Method::GET, "/api/v1/runbooks?tag=redis", None).await;
    assert_eq!(hits.as_array().unwrap().len(), 1);
    let (_, hits) = send(&app.router, Method::GET, "/api/v1/runbooks?q=EVICTION", None).await;
    assert_eq!(hits.as_array().unwrap().len(), 1);

    let (status, updated) = send(
        &app.router,
        Method::PUT,
        &format!("/api/v1/runbooks/{id}"),
        Some(json!({ "tags": [] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["tags"], json!([]));
    assert_eq!(updated["content"], "Flush hot keys.");

    let (status, _) = send(
        &app.router,
        Method::PUT,
        &format!("/api/v1/runbooks/{id}"),
        Some(json!({ "content": "  " })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn records_survive_a_restart_on_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("opsdesk.sqlite3");
    let build = || {
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2024, 8, 12, 12, 0, 0).unwrap(),
        ));
        let repo = Arc::new(SqliteStateRepository::open(&path, clock.clone()).unwrap());
        router(ApiState::embedded(EmbeddedStores::new(repo, clock)))
    };

    let first = build();
    let created = create_incident(
        &first,
        json!({ "title": "Checkout errors", "service": "Payments", "severity": "P1" }),
    )
    .await;
    drop(first);

    let second = build();
    let uri = format!("/api/v1/incidents/{}", created["id"].as_str().unwrap());
    let (status, fetched) = send(&second, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);
}
