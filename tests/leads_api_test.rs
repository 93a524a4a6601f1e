mod common;

use axum::http::{Method, StatusCode};
use sea_orm::EntityTrait;
use serde_json::json;

use common::TestApp;
use iron_catalog::models::{ContactInquiryEntity, QuoteRequestEntity};

fn quote_body() -> serde_json::Value {
    json!({
        "name": "Dana <Builder>",
        "email": "dana@example.com",
        "phone": "813-555-0101",
        "shipTo": "Atlanta, GA",
        "items": "2x 1R0750 oil filter",
        "notes": ""
    })
}

#[tokio::test]
async fn quote_request_is_stored_and_emailed() {
    let app = TestApp::new().await;

    let res = app.post("/api/quotes", quote_body()).await;
    assert_eq!(res.status, StatusCode::CREATED);
    let body = res.json();
    assert_eq!(body["status"], "pending");
    assert!(body["customerId"].is_null());

    let stored = QuoteRequestEntity::find().all(app.db()).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].items.as_deref(), Some("2x 1R0750 oil filter"));

    let mut sent = app.mailer.messages();
    sent.sort_by(|a, b| a.to.cmp(&b.to));
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].to, "dana@example.com");
    assert_eq!(sent[1].to, "sales@example.com");
    assert_eq!(sent[1].subject, "New Parts Quote Request from Dana <Builder>");
    assert_eq!(sent[1].reply_to.as_deref(), Some("dana@example.com"));
    assert!(sent[1].html.contains("Dana &lt;Builder&gt;"));
}

#[tokio::test]
async fn signed_in_quote_requests_are_tagged_with_the_customer() {
    let app = TestApp::new().await;
    let token = app.token_for("cust-42", Some("dana@example.com"));

    let res = app
        .request(Method::POST, "/api/quotes", Some(quote_body()), Some(&token))
        .await;
    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.json()["customerId"], "cust-42");
}

#[tokio::test]
async fn invalid_session_token_is_ignored_for_quote_requests() {
    let app = TestApp::new().await;

    let res = app
        .request(Method::POST, "/api/quotes", Some(quote_body()), Some("not-a-jwt"))
        .await;
    assert_eq!(res.status, StatusCode::CREATED);
    assert!(res.json()["customerId"].is_null());
}

#[tokio::test]
async fn invalid_quote_request_is_rejected() {
    let app = TestApp::new().await;

    let res = app
        .post("/api/quotes", json!({"name": "", "email": "not-an-email"}))
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    let body = res.json();
    assert_eq!(body["error"], "Validation error");
    let paths: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|issue| issue["path"][0].as_str().unwrap())
        .collect();
    assert_eq!(paths, vec!["email", "name"]);
    assert!(app.mailer.messages().is_empty());
}

#[tokio::test]
async fn malformed_json_is_a_validation_error() {
    let app = TestApp::new().await;

    let res = app.post("/api/contact", json!({"name": 12})).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json()["error"], "Validation error");
}

#[tokio::test]
async fn contact_inquiry_survives_email_failure() {
    let app = TestApp::with_failing_mailer().await;

    let res = app
        .post(
            "/api/contact",
            json!({"name": "Lee", "email": "lee@example.com", "message": "Is the D6T still available?"}),
        )
        .await;
    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.json()["message"], "Is the D6T still available?");
    assert_eq!(ContactInquiryEntity::find().all(app.db()).await.unwrap().len(), 1);
}
