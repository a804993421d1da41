// libs/roster-cell/tests/handlers_test.rs
use std::sync::Arc;

use axum::body::Body;
use http::{header, Method, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use roster_cell::roster_routes;
use shared_database::AppState;
use shared_utils::test_utils::{roster_header, roster_tab_name, RosterRow, TestConfig, TestWorkbooks};

fn setup() -> (TestWorkbooks, axum::Router) {
    let config = TestConfig::default().to_app_config();
    let books = TestWorkbooks::new(&config);
    let app = roster_routes(Arc::new(AppState::with_workbooks(config, books.workbooks())));
    (books, app)
}

async fn post_json(app: axum::Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn edit_webhook_reconciles_and_reports() {
    let (books, app) = setup();
    let tab = roster_tab_name("783", "08/12", "12/12", Some("B"));
    books
        .roster
        .add_sheet(
            &tab,
            vec![roster_header(), RosterRow::new().date("12/12/2025").f("09:00", "reservado").build()],
        )
        .await;

    let (status, body) = post_json(
        app,
        "/edit",
        json!({ "sheet": tab, "row": 2, "column": 6, "oldValue": "", "newValue": "reservado" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["processed"], true);
    assert_eq!(body["rows"][0]["action"], "upsert");
    assert_eq!(books.booking.row_count("Horarios").await, 2);
}

#[tokio::test]
async fn edit_webhook_answers_ok_for_ignored_tabs() {
    let (_books, app) = setup();

    let (status, body) = post_json(
        app,
        "/edit",
        json!({ "sheet": "Plantão geral", "row": 2, "column": 6, "newValue": "reservado" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["processed"], false);
    assert!(body["ignored_reason"].is_string());
}

#[tokio::test]
async fn sync_and_cleanup_endpoints_return_reports() {
    let (books, app) = setup();
    books.seed_slot("Horarios", "01/12/2025", "08:00", "LIVRE", "F").await;

    let (status, body) = post_json(app.clone(), "/sync", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["markers_found"], 0);

    let (status, body) = post_json(app, "/orphans/cleanup", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["orphans_removed"].as_array().unwrap().len(), 1);
    assert_eq!(books.booking.row_count("Horarios").await, 1);
}
