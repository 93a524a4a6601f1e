//! Endpoints backed by outside providers: quote email, estimator and UPS.

mod common;

use axum::http::StatusCode;
use sea_orm::{ConnectionTrait, EntityTrait};
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::TestApp;
use iron_catalog::models::ProjectEstimateEntity;

const SSE_BODY: &str = "data: {\"choices\":[{\"delta\":{\"content\":\"Two \"}}]}\n\n\
data: {\"choices\":[{\"delta\":{\"content\":\"excavators\"}}]}\n\n\
data: [DONE]\n\n";

const ESTIMATE_FAILED_EVENT: &str = r#"data: {"error":"Failed to generate estimate"}"#;

/// App whose chat-completion provider answers every request with `sse`
async fn estimator_app(sse: &str) -> (TestApp, MockServer) {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string(sse),
        )
        .mount(&server)
        .await;

    let uri = server.uri();
    let app = TestApp::with_config(|cfg| {
        cfg.openai_base_url = uri;
        cfg.openai_api_key = Some("sk-test".to_string());
        cfg.openai_max_retries = 0;
    })
    .await;
    (app, server)
}

fn estimate_body() -> serde_json::Value {
    json!({
        "projectName": "Riverside Pad",
        "projectType": "Site Preparation",
        "location": "Tampa, FL",
        "terrain": "Sandy",
        "projectSize": "Medium (5-20 acres)",
        "duration": "6 months"
    })
}

fn rates_body() -> serde_json::Value {
    json!({
        "originCity": "Tampa",
        "originState": "FL",
        "originPostal": "33601",
        "destCity": "Atlanta",
        "destState": "GA",
        "destPostal": "30301",
        "weightLbs": 42,
        "lengthIn": 24,
        "widthIn": 18,
        "heightIn": 12
    })
}

#[tokio::test]
async fn quote_email_attaches_a_pdf() {
    let app = TestApp::new().await;
    app.insert_equipment("1001", "Caterpillar", "D6T", "Dozers", Some("$150,000")).await;

    let res = app
        .post(
            "/api/quotes/send-email",
            json!({
                "email": "buyer@example.com",
                "itemType": "equipment",
                "itemId": "1001",
                "quoteNumber": "Q-100",
                "quoteDate": "2026-03-09"
            }),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json(), json!({"success": true, "emailId": "email-1"}));

    let sent = app.mailer.messages();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "buyer@example.com");
    assert_eq!(sent[0].attachments[0].filename, "American_Iron_Quote_Q-100.pdf");
    assert!(sent[0].attachments[0].content.starts_with(b"%PDF"));
}

#[tokio::test]
async fn quote_email_for_unknown_item_is_not_found() {
    let app = TestApp::new().await;

    let res = app
        .post(
            "/api/quotes/send-email",
            json!({
                "email": "buyer@example.com",
                "itemType": "power-unit",
                "itemId": "42",
                "quoteNumber": "Q-101",
                "quoteDate": "2026-03-09"
            }),
        )
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert!(app.mailer.messages().is_empty());
}

#[tokio::test]
async fn quote_email_provider_failure_is_reported() {
    let app = TestApp::with_failing_mailer().await;
    let unit = app
        .insert_power_unit("PU-001", "Cummins QSK60", "Generator Sets", Some("Call for Price"))
        .await;

    let res = app
        .post(
            "/api/quotes/send-email",
            json!({
                "email": "buyer@example.com",
                "itemType": "power-unit",
                "itemId": unit.id.to_string(),
                "quoteNumber": "Q-102",
                "quoteDate": "2026-03-09T12:00:00Z"
            }),
        )
        .await;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    let body = res.json();
    assert_eq!(body["error"], "Failed to send email");
    assert_eq!(body["details"], "mailbox unavailable");
}

#[tokio::test]
async fn estimator_streams_and_saves_the_transcript() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string(SSE_BODY),
        )
        .expect(1)
        .mount(&server)
        .await;

    let uri = server.uri();
    let app = TestApp::with_config(|cfg| {
        cfg.openai_base_url = uri;
        cfg.openai_api_key = Some("sk-test".to_string());
        cfg.openai_max_retries = 0;
    })
    .await;

    let res = app.post("/api/estimate", estimate_body()).await;
    assert_eq!(res.status, StatusCode::OK);
    assert!(res
        .content_type
        .as_deref()
        .is_some_and(|ct| ct.starts_with("text/event-stream")));
    assert!(res.text.contains(r#"data: {"content":"Two "}"#));
    assert!(res.text.contains(r#"data: {"done":true}"#));

    let saved = ProjectEstimateEntity::find().all(app.db()).await.unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].estimate_result, "Two excavators");
}

#[tokio::test]
async fn estimator_reports_a_broken_upstream_stream_once() {
    let sse = "data: {\"choices\":[{\"delta\":{\"content\":\"Two \"}}]}\n\n\
data: {\"choices\":[{\"delta\":\n\n";
    let (app, _server) = estimator_app(sse).await;

    let res = app.post("/api/estimate", estimate_body()).await;
    assert_eq!(res.status, StatusCode::OK);
    let content_at = res.text.find(r#"data: {"content":"Two "}"#).unwrap();
    let error_at = res.text.find(ESTIMATE_FAILED_EVENT).unwrap();
    assert!(content_at < error_at);
    assert_eq!(res.text.matches(ESTIMATE_FAILED_EVENT).count(), 1);
    assert!(!res.text.contains(r#""done""#));

    let saved = ProjectEstimateEntity::find().all(app.db()).await.unwrap();
    assert!(saved.is_empty());
}

#[tokio::test]
async fn estimator_reports_a_failed_save_instead_of_done() {
    let (app, _server) = estimator_app(SSE_BODY).await;
    app.db()
        .execute_unprepared("DROP TABLE project_estimates")
        .await
        .unwrap();

    let res = app.post("/api/estimate", estimate_body()).await;
    assert_eq!(res.status, StatusCode::OK);
    assert!(res.text.contains(r#"data: {"content":"excavators"}"#));
    assert_eq!(res.text.matches(ESTIMATE_FAILED_EVENT).count(), 1);
    assert!(!res.text.contains(r#""done""#));
    assert!(res.text.trim_end().ends_with(ESTIMATE_FAILED_EVENT));
}

#[tokio::test]
async fn estimator_rejects_incomplete_projects() {
    let app = TestApp::new().await;
    let mut body = estimate_body();
    body["terrain"] = json!("");
    body["projectSize"] = json!("");

    let res = app.post("/api/estimate", body).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    let body = res.json();
    assert_eq!(body["error"], "Validation error");
    assert_eq!(body["details"][0]["path"], json!(["projectSize"]));
    assert_eq!(body["details"][1]["path"], json!(["terrain"]));
}

#[tokio::test]
async fn estimator_without_a_key_fails_before_streaming() {
    let app = TestApp::new().await;

    let res = app.post("/api/estimate", estimate_body()).await;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.json()["error"], "Failed to generate estimate");
}

#[tokio::test]
async fn ups_rates_are_sorted_cheapest_first() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/security/v1/oauth/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access_token": "tok", "expires_in": "14399"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/rating/v2403/Shop"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "RateResponse": {"RatedShipment": [
                {"Service": {"Code": "01"}, "TotalCharges": {"MonetaryValue": "145.10", "CurrencyCode": "USD"}},
                {"Service": {"Code": "03"}, "TotalCharges": {"MonetaryValue": "38.22", "CurrencyCode": "USD"}}
            ]}
        })))
        .mount(&server)
        .await;

    let uri = server.uri();
    let app = TestApp::with_config(|cfg| {
        cfg.ups_base_url = uri;
        cfg.ups_client_id = Some("id".to_string());
        cfg.ups_client_secret = Some("secret".to_string());
        cfg.ups_account_number = Some("A1B2C3".to_string());
    })
    .await;

    let res = app.post("/api/shipping/ups-rates", rates_body()).await;
    assert_eq!(res.status, StatusCode::OK);
    let body = res.json();
    assert_eq!(body["origin"], "Tampa, FL 33601");
    assert_eq!(body["rates"][0]["serviceName"], "UPS Ground");
    assert_eq!(body["rates"][1]["totalCharges"], "145.10");
}

#[tokio::test]
async fn ups_rates_validate_the_package() {
    let app = TestApp::new().await;
    let mut body = rates_body();
    body["weightLbs"] = json!(0);

    let res = app.post("/api/shipping/ups-rates", body).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    let body = res.json();
    assert_eq!(body["details"][0]["path"][0], "weightLbs");
    assert_eq!(body["details"][0]["message"], "weightLbs must be greater than 0");
}

#[tokio::test]
async fn ups_rates_without_credentials_fail() {
    let app = TestApp::with_config(|cfg| cfg.ups_account_number = Some("A1B2C3".to_string())).await;

    let res = app.post("/api/shipping/ups-rates", rates_body()).await;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    let body = res.json();
    assert_eq!(body["error"], "Failed to fetch UPS rates");
    assert_eq!(body["message"], "UPS credentials not configured");
    assert!(body.get("details").is_none());
}

#[tokio::test]
async fn ups_auth_rejection_reports_the_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/security/v1/oauth/token"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid client"))
        .expect(1)
        .mount(&server)
        .await;

    let uri = server.uri();
    let app = TestApp::with_config(|cfg| {
        cfg.ups_base_url = uri;
        cfg.ups_client_id = Some("id".to_string());
        cfg.ups_client_secret = Some("wrong".to_string());
        cfg.ups_account_number = Some("A1B2C3".to_string());
    })
    .await;

    let res = app.post("/api/shipping/ups-rates", rates_body()).await;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    let body = res.json();
    assert_eq!(body["error"], "Failed to fetch UPS rates");
    assert_eq!(body["message"], "UPS authentication failed: 401");
}
