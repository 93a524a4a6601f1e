use axum::{extract::State, response::Response, routing::post, Router};

use super::common::{created_response, JsonBody};
use crate::auth::MaybeAuthUser;
use crate::errors::{ResultExt, ServiceError};
use crate::models::{ContactInquiry, QuoteRequest};
use crate::services::leads::{CreateContactInquiry, CreateQuoteRequest};
use crate::AppState;

#[utoipa::path(
    post,
    path = "/api/quotes",
    request_body = CreateQuoteRequest,
    responses(
        (status = 201, description = "Quote request stored", body = QuoteRequest),
        (status = 400, description = "Validation error", body = crate::errors::ErrorResponse)
    ),
    security((), ("bearer_auth" = [])),
    tag = "leads"
)]
pub async fn create_quote_request(
    State(state): State<AppState>,
    MaybeAuthUser(user): MaybeAuthUser,
    JsonBody(payload): JsonBody<CreateQuoteRequest>,
) -> Result<Response, ServiceError> {
    let customer_id = user.map(|u| u.user_id).filter(|id| !id.is_empty());
    let saved = state
        .services
        .leads
        .create_quote_request(payload, customer_id)
        .await
        .or_public("Failed to create quote request")?;
    Ok(created_response(saved))
}

#[utoipa::path(
    post,
    path = "/api/contact",
    request_body = CreateContactInquiry,
    responses(
        (status = 201, description = "Inquiry stored", body = ContactInquiry),
        (status = 400, description = "Validation error", body = crate::errors::ErrorResponse)
    ),
    tag = "leads"
)]
pub async fn create_contact_inquiry(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreateContactInquiry>,
) -> Result<Response, ServiceError> {
    let saved = state
        .services
        .leads
        .create_contact_inquiry(payload)
        .await
        .or_public("Failed to create contact inquiry")?;
    Ok(created_response(saved))
}

/// Form endpoints; the session is optional and only tags quote requests
pub fn lead_routes() -> Router<AppState> {
    Router::new()
        .route("/quotes", post(create_quote_request))
        .route("/contact", post(create_contact_inquiry))
}
