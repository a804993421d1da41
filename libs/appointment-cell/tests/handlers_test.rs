// libs/appointment-cell/tests/handlers_test.rs
use std::sync::Arc;

use axum::body::Body;
use http::{header, Method, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use appointment_cell::appointment_routes;
use shared_database::{AppState, TabularStore};
use shared_utils::test_utils::{TestConfig, TestWorkbooks};

fn app(books: &TestWorkbooks) -> axum::Router {
    let config = TestConfig::default().to_app_config();
    appointment_routes(Arc::new(AppState::with_workbooks(config, books.workbooks())))
}

async fn post(app: axum::Router, content_type: &str, body: String) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/")
                .header(header::CONTENT_TYPE, content_type)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

fn booking(row_index: usize) -> String {
    json!({
        "rowIndex": row_index,
        "nome": "Ana Souza",
        "telefone": "48999990000",
        "dataNascimento": "01/02/1995",
        "observacoes": "Consulta de rotina"
    })
    .to_string()
}

#[tokio::test]
async fn plain_text_booking_is_accepted() {
    let books = TestWorkbooks::new(&TestConfig::default().to_app_config());
    let row = books.seed_slot("Horarios", "12/12/2025", "09:00", "LIVRE", "F").await;

    let (status, body) = post(app(&books), "text/plain;charset=utf-8", booking(row)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "sucesso": true,
            "mensagem": "Agendamento realizado com sucesso!",
            "data": "12/12/2025",
            "hora": "09:00"
        })
    );
    assert_eq!(books.booking.read_rows("Agendamentos").await.unwrap().len(), 2);
}

#[tokio::test]
async fn json_booking_with_triage_is_accepted() {
    let books = TestWorkbooks::new(&TestConfig::default().to_app_config());
    let row = books.seed_slot("Horarios", "12/12/2025", "09:00", "LIVRE", "F").await;
    let payload = json!({
        "rowIndex": row,
        "nome": "Ana Souza",
        "telefone": "48999990000",
        "triagem": { "tipo": "puericultura", "idadeMeses": 4, "nomeResponsavel": "Carla" }
    })
    .to_string();

    let (status, body) = post(app(&books), "application/json", payload).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sucesso"], json!(true));
}

#[tokio::test]
async fn unreadable_triage_still_books() {
    let books = TestWorkbooks::new(&TestConfig::default().to_app_config());
    let row = books.seed_slot("Horarios", "12/12/2025", "09:00", "LIVRE", "F").await;
    let payload = json!({
        "rowIndex": row,
        "nome": "Ana Souza",
        "telefone": "48999990000",
        "triagem": { "tipo": "geriatria", "semanasGestacao": "12", "primeiraConsulta": "talvez" }
    })
    .to_string();

    let (status, body) = post(app(&books), "text/plain", payload).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sucesso"], json!(true));
    assert_eq!(books.booking.read_rows("Agendamentos").await.unwrap().len(), 2);
}

#[tokio::test]
async fn booking_for_a_moved_slot_answers_409() {
    let books = TestWorkbooks::new(&TestConfig::default().to_app_config());
    let row = books.seed_slot("Horarios", "12/12/2025", "10:00", "LIVRE", "F").await;
    let payload = json!({
        "rowIndex": row,
        "nome": "Ana Souza",
        "telefone": "48999990000",
        "data": "12/12/2025",
        "hora": "09:00"
    })
    .to_string();

    let (status, _) = post(app(&books), "text/plain", payload).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(books.booking.read_rows("Horarios").await.unwrap().len(), 2);
}

#[tokio::test]
async fn taken_slot_answers_409() {
    let books = TestWorkbooks::new(&TestConfig::default().to_app_config());
    let row = books.seed_slot("Horarios", "12/12/2025", "09:00", "OCUPADO", "F").await;

    let (status, body) = post(app(&books), "text/plain", booking(row)).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        body["error"],
        json!("Esse horário acabou de ser ocupado. Por favor, escolha outro.")
    );
}

#[tokio::test]
async fn malformed_payload_answers_400() {
    let books = TestWorkbooks::new(&TestConfig::default().to_app_config());

    let (status, body) = post(app(&books), "text/plain", "{\"nome\":".to_string()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}
