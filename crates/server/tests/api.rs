use std::sync::Arc;

use api_types::receipt::ReceiptDraft;
use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use chrono::{Duration, TimeZone, Utc};
use http_body_util::BodyExt;
use receipts::{ReceiptError, ReceiptExtractor};
use sea_orm::Database;
use serde_json::{Value, json};
use tower::ServiceExt;

use engine::{Engine, FixedClock};
use migration::MigratorTrait;
use server::{AuthKeys, ServerState, router};

struct StubExtractor {
    fail: bool,
}

#[async_trait]
impl ReceiptExtractor for StubExtractor {
    async fn extract(
        &self,
        _bytes: Vec<u8>,
        filename: &str,
    ) -> Result<ReceiptDraft, ReceiptError> {
        if self.fail {
            return Err(ReceiptError::Failed);
        }
        let fields = serde_json::from_value(json!({
            "total_amount": {"value": 12.5},
            "supplier_name": {"value": filename},
        }))
        .unwrap();
        Ok(receipts::extract_draft(&fields, Utc::now()))
    }
}

async fn state_with_ttl(ttl: Duration) -> ServerState {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let now = Utc::now();
    let engine = Engine::builder()
        .database(db)
        .clock(Arc::new(FixedClock(now)))
        .password_cost(4)
        .build()
        .await
        .unwrap();
    ServerState::new(engine, AuthKeys::new("test-secret", ttl))
}

async fn app() -> Router {
    router(state_with_ttl(Duration::minutes(60)).await)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

async fn register_and_login(app: &Router, name: &str) -> String {
    let email = format!("{name}@example.com");
    let (status, _) = send(
        app,
        json_request(
            "POST",
            "/api/auth/register",
            None,
            json!({"name": name, "email": email, "password": "pw"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        app,
        json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({"email": email, "password": "pw"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

async fn create(app: &Router, token: &str, body: Value) -> Value {
    let (status, body) = send(app, json_request("POST", "/api/transactions", Some(token), body)).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body
}

fn multipart(field: &str, filename: &str, content_type: &str, data: &[u8]) -> (String, Vec<u8>) {
    let boundary = "finboard-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    (format!("multipart/form-data; boundary={boundary}"), body)
}

fn upload(token: &str, content_type: String, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/receipts/upload")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn root_reports_liveness() {
    let app = app().await;
    let response = app.clone().oneshot(get("/", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"Server is running..");
}

#[tokio::test]
async fn register_login_and_me() {
    let app = app().await;
    let token = register_and_login(&app, "alice").await;

    let (status, body) = send(&app, get("/api/auth/me", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "alice@example.com");
    assert_eq!(body["name"], "alice");
    assert!(body.get("passwordHash").is_none());

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/auth/register",
            None,
            json!({"name": "again", "email": "ALICE@example.com", "password": "x"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn wrong_password_is_invalid_credentials() {
    let app = app().await;
    register_and_login(&app, "alice").await;

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/auth/login",
            None,
            json!({"email": "alice@example.com", "password": "nope"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Invalid credentials"}));
}

#[tokio::test]
async fn protected_routes_require_a_valid_token() {
    let app = app().await;

    let (status, body) = send(&app, get("/api/auth/me", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"error": "Unauthorized"}));

    let (status, _) = send(&app, get("/api/transactions", Some("not-a-jwt"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, get("/api/dashboard", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn expired_token_is_rejected() {
    let app = router(state_with_ttl(Duration::minutes(-5)).await);
    let token = register_and_login(&app, "alice").await;

    let (status, _) = send(&app, get("/api/auth/me", Some(&token))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn transaction_crud_round_trip() {
    let app = app().await;
    let token = register_and_login(&app, "alice").await;

    let created = create(
        &app,
        &token,
        json!({
            "amount": 12.349,
            "type": "EXPENSE",
            "category": "FOOD",
            "description": "Lunch",
            "date": "2024-05-02"
        }),
    )
    .await;
    assert_eq!(created["amount"], 12.35);
    assert_eq!(created["type"], "EXPENSE");
    assert_eq!(created["category"], "FOOD");
    assert_eq!(created["date"], "2024-05-02T00:00:00Z");
    assert!(created["userId"].is_string());
    let id = created["id"].as_str().unwrap().to_string();

    let (status, body) = send(&app, get(&format!("/api/transactions/{id}"), Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["description"], "Lunch");

    let (status, body) = send(
        &app,
        json_request(
            "PUT",
            &format!("/api/transactions/{id}"),
            Some(&token),
            json!({"category": null, "description": "Team lunch"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["category"], Value::Null);
    assert_eq!(body["description"], "Team lunch");
    assert_eq!(body["amount"], 12.35);

    let (status, body) = send(
        &app,
        json_request("DELETE", &format!("/api/transactions/{id}"), Some(&token), json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].is_string());

    let (status, body) = send(&app, get(&format!("/api/transactions/{id}"), Some(&token))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "Transaction not found"}));
}

#[tokio::test]
async fn negative_amount_is_rejected() {
    let app = app().await;
    let token = register_and_login(&app, "alice").await;

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/transactions",
            Some(&token),
            json!({"amount": -5, "type": "INCOME"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Invalid amount"));
}

#[tokio::test]
async fn other_users_transactions_are_forbidden() {
    let app = app().await;
    let alice = register_and_login(&app, "alice").await;
    let bob = register_and_login(&app, "bob").await;

    let created = create(&app, &alice, json!({"amount": 5, "type": "EXPENSE"})).await;
    let uri = format!("/api/transactions/{}", created["id"].as_str().unwrap());

    let (status, body) = send(&app, get(&uri, Some(&bob))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, json!({"error": "Unauthorized"}));

    let (status, _) = send(&app, json_request("PUT", &uri, Some(&bob), json!({"amount": 1}))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, json_request("DELETE", &uri, Some(&bob), json!({}))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, body) = send(&app, get(&uri, Some(&alice))).await;
    assert_eq!(body["amount"], 5.0);

    let (status, _) = send(&app, get("/api/transactions/not-a-uuid", Some(&alice))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_applies_query_string() {
    let app = app().await;
    let token = register_and_login(&app, "alice").await;
    for (amount, kind, category, date) in [
        (10, "EXPENSE", "FOOD", "2024-01-05"),
        (20, "EXPENSE", "TRAVEL", "2024-02-05"),
        (30, "INCOME", "SALARY", "2024-02-20"),
    ] {
        create(
            &app,
            &token,
            json!({"amount": amount, "type": kind, "category": category, "date": date}),
        )
        .await;
    }

    let (status, body) = send(&app, get("/api/transactions?type=EXPENSE&sortBy=amount&sortOrder=asc", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    assert_eq!(body["transactions"][0]["amount"], 10.0);

    let (_, body) = send(
        &app,
        get("/api/transactions?startDate=2024-02-01&endDate=2024-02-28&limit=1&page=2", Some(&token)),
    )
    .await;
    assert_eq!(body["total"], 2);
    assert_eq!(body["transactions"].as_array().unwrap().len(), 1);
    assert_eq!(body["transactions"][0]["amount"], 20.0);

    let (_, body) = send(&app, get("/api/transactions?page=oops&limit=-1", Some(&token))).await;
    assert_eq!(body["total"], 3);
    assert_eq!(body["transactions"][0]["amount"], 30.0);

    let (status, body) = send(
        &app,
        get("/api/transactions?limit=18446744073709551615", Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["transactions"].as_array().unwrap().len(), 3);

    let (status, _) = send(&app, get("/api/transactions?type=TRANSFER", Some(&token))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, get("/api/transactions?category=PETS", Some(&token))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn dashboard_returns_all_sections() {
    let app = app().await;
    let token = register_and_login(&app, "alice").await;
    create(
        &app,
        &token,
        json!({"amount": 1000, "type": "INCOME", "category": "SALARY", "date": "2024-03-01"}),
    )
    .await;
    create(
        &app,
        &token,
        json!({"amount": 250.5, "type": "EXPENSE", "category": "RENT", "date": "2024-03-02"}),
    )
    .await;

    let (status, body) = send(&app, get("/api/dashboard?duration=all", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["kpiData"],
        json!({"income": 1000.0, "expenses": 250.5, "balance": 749.5})
    );
    assert_eq!(body["categoryBreakdown"].as_array().unwrap().len(), 2);
    assert_eq!(body["monthlyTrend"][0]["month"], "2024-03-01");
    assert_eq!(body["recentTransactions"][0]["amount"], 250.5);
}

#[tokio::test]
async fn dashboard_window_excludes_old_transactions() {
    let app = app().await;
    let token = register_and_login(&app, "alice").await;
    let old = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap().to_rfc3339();
    create(&app, &token, json!({"amount": 5, "type": "EXPENSE", "date": old})).await;
    create(&app, &token, json!({"amount": 7, "type": "EXPENSE"})).await;

    let (_, body) = send(&app, get("/api/dashboard?duration=1month", Some(&token))).await;
    assert_eq!(body["kpiData"]["expenses"], 7.0);

    let (_, body) = send(&app, get("/api/dashboard?duration=weekly", Some(&token))).await;
    assert_eq!(body["kpiData"]["expenses"], 12.0);
}

#[tokio::test]
async fn receipt_upload_returns_draft() {
    let state = state_with_ttl(Duration::minutes(60))
        .await
        .with_extractor(Arc::new(StubExtractor { fail: false }));
    let app = router(state);
    let token = register_and_login(&app, "alice").await;

    let (content_type, body) = multipart("receipt", "Corner Cafe", "image/jpeg", b"jpeg bytes");
    let (status, body) = send(&app, upload(&token, content_type, body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["amount"], 12.5);
    assert_eq!(body["data"]["category"], "FOOD");
    assert_eq!(body["data"]["type"], "EXPENSE");
    assert_eq!(body["data"]["description"], "Purchase from Corner Cafe");
    assert_eq!(body["data"]["merchantName"], "Corner Cafe");
}

#[tokio::test]
async fn receipt_upload_validates_the_file() {
    let state = state_with_ttl(Duration::minutes(60))
        .await
        .with_extractor(Arc::new(StubExtractor { fail: false }));
    let app = router(state);
    let token = register_and_login(&app, "alice").await;

    let (content_type, body) = multipart("other", "a.jpg", "image/jpeg", b"x");
    let (status, body) = send(&app, upload(&token, content_type, body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"success": false, "error": "No receipt image provided"}));

    let (content_type, body) = multipart("receipt", "notes.txt", "text/plain", b"x");
    let (status, body) = send(&app, upload(&token, content_type, body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let big = vec![0u8; 10 * 1024 * 1024 + 1];
    let (content_type, body) = multipart("receipt", "big.png", "image/png", &big);
    let (status, _) = send(&app, upload(&token, content_type, body)).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn receipt_extraction_failure_is_generic() {
    let failing = router(
        state_with_ttl(Duration::minutes(60))
            .await
            .with_extractor(Arc::new(StubExtractor { fail: true })),
    );
    let token = register_and_login(&failing, "alice").await;
    let (content_type, body) = multipart("receipt", "r.pdf", "application/pdf", b"%PDF");
    let (status, body) = send(&failing, upload(&token, content_type, body)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"success": false, "error": "Failed to process receipt"}));

    let unconfigured = app().await;
    let token = register_and_login(&unconfigured, "bob").await;
    let (content_type, body) = multipart("receipt", "r.pdf", "application/pdf", b"%PDF");
    let (status, _) = send(&unconfigured, upload(&token, content_type, body)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}
