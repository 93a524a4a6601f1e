use axum::{extract::State, response::Json, routing::post, Router};

use super::common::JsonBody;
use crate::services::shipping::{ShippingRateRequest, ShippingRatesResponse};
use crate::{ApiResult, AppState};

#[utoipa::path(
    post,
    path = "/api/shipping/ups-rates",
    request_body = ShippingRateRequest,
    responses(
        (status = 200, description = "Available services, cheapest first", body = ShippingRatesResponse),
        (status = 400, description = "Validation error", body = crate::errors::ErrorResponse),
        (status = 500, description = "Carrier not configured or authentication failed", body = crate::errors::ErrorResponse),
        (status = 502, description = "Carrier rejected the rating request", body = crate::errors::ErrorResponse)
    ),
    tag = "shipping"
)]
pub async fn ups_rates(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<ShippingRateRequest>,
) -> ApiResult<ShippingRatesResponse> {
    let rates = state.services.shipping.quote_rates(payload).await?;
    Ok(Json(rates))
}

pub fn shipping_routes() -> Router<AppState> {
    Router::new().route("/shipping/ups-rates", post(ups_rates))
}
