use axum::{extract::State, response::Json, routing::post, Router};

use super::common::JsonBody;
use crate::errors::ResultExt;
use crate::services::quote_documents::{SendQuoteEmailRequest, SendQuoteEmailResponse};
use crate::{ApiResult, AppState};

#[utoipa::path(
    post,
    path = "/api/quotes/send-email",
    request_body = SendQuoteEmailRequest,
    responses(
        (status = 200, description = "Quotation emailed with PDF attached", body = SendQuoteEmailResponse),
        (status = 400, description = "Validation error or invalid id", body = crate::errors::ErrorResponse),
        (status = 404, description = "Item not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Email provider failure", body = crate::errors::ErrorResponse)
    ),
    tag = "quotes"
)]
pub async fn send_quote_email(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<SendQuoteEmailRequest>,
) -> ApiResult<SendQuoteEmailResponse> {
    let response = state
        .services
        .quote_documents
        .send_quote_email(payload)
        .await
        .or_public("Failed to send quote email")?;
    Ok(Json(response))
}

pub fn quote_document_routes() -> Router<AppState> {
    Router::new().route("/quotes/send-email", post(send_quote_email))
}
