use std::convert::Infallible;
use std::time::Duration;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::post,
    Router,
};
use futures::stream::{Stream, StreamExt};

use super::common::JsonBody;
use crate::errors::{ResultExt, ServiceError};
use crate::services::estimator::{EstimateEvent, EstimateRequest, ESTIMATE_FAILED};
use crate::AppState;

fn to_sse(event: EstimateEvent) -> Result<Event, Infallible> {
    let data = serde_json::to_string(&event)
        .unwrap_or_else(|_| format!(r#"{{"error":"{}"}}"#, ESTIMATE_FAILED));
    Ok(Event::default().data(data))
}

#[utoipa::path(
    post,
    path = "/api/estimate",
    request_body = EstimateRequest,
    responses(
        (status = 200, description = "Event stream of `{content}` deltas ending with `{done: true}` or `{error}`", content_type = "text/event-stream", body = String),
        (status = 400, description = "Validation error", body = crate::errors::ErrorResponse),
        (status = 500, description = "Failed to generate estimate", body = crate::errors::ErrorResponse)
    ),
    tag = "estimator"
)]
pub async fn create_estimate(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<EstimateRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ServiceError> {
    let events = state
        .services
        .estimator
        .stream_estimate(payload)
        .await
        .or_public(ESTIMATE_FAILED)?;

    Ok(Sse::new(events.map(to_sse)).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    ))
}

pub fn estimator_routes() -> Router<AppState> {
    Router::new().route("/estimate", post(create_estimate))
}
