use axum::{extract::State, response::Json, routing::get, Router};

use crate::auth::AuthUser;
use crate::errors::ResultExt;
use crate::models::{ContactInquiry, CustomerOrder, CustomerPayment, QuoteRequest};
use crate::services::portal::PortalProfile;
use crate::{ApiResult, AppState};

#[utoipa::path(
    get,
    path = "/api/portal/profile",
    responses(
        (status = 200, description = "Session user and record counts", body = PortalProfile),
        (status = 400, description = "No email associated with account", body = crate::errors::ErrorResponse),
        (status = 401, description = "Missing, invalid or expired session")
    ),
    security(("bearer_auth" = [])),
    tag = "portal"
)]
pub async fn profile(State(state): State<AppState>, user: AuthUser) -> ApiResult<PortalProfile> {
    let profile = state
        .services
        .portal
        .profile(&user)
        .await
        .or_public("Failed to fetch profile")?;
    Ok(Json(profile))
}

#[utoipa::path(
    get,
    path = "/api/portal/quotes",
    responses(
        (status = 200, description = "Quote requests, newest first", body = Vec<QuoteRequest>),
        (status = 401, description = "Missing, invalid or expired session")
    ),
    security(("bearer_auth" = [])),
    tag = "portal"
)]
pub async fn quotes(State(state): State<AppState>, user: AuthUser) -> ApiResult<Vec<QuoteRequest>> {
    let quotes = state
        .services
        .portal
        .quotes(&user)
        .await
        .or_public("Failed to fetch quotes")?;
    Ok(Json(quotes))
}

#[utoipa::path(
    get,
    path = "/api/portal/orders",
    responses(
        (status = 200, description = "Orders, newest first", body = Vec<CustomerOrder>),
        (status = 401, description = "Missing, invalid or expired session")
    ),
    security(("bearer_auth" = [])),
    tag = "portal"
)]
pub async fn orders(State(state): State<AppState>, user: AuthUser) -> ApiResult<Vec<CustomerOrder>> {
    let orders = state
        .services
        .portal
        .orders(&user)
        .await
        .or_public("Failed to fetch orders")?;
    Ok(Json(orders))
}

#[utoipa::path(
    get,
    path = "/api/portal/payments",
    responses(
        (status = 200, description = "Payments, newest first", body = Vec<CustomerPayment>),
        (status = 401, description = "Missing, invalid or expired session")
    ),
    security(("bearer_auth" = [])),
    tag = "portal"
)]
pub async fn payments(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Vec<CustomerPayment>> {
    let payments = state
        .services
        .portal
        .payments(&user)
        .await
        .or_public("Failed to fetch payments")?;
    Ok(Json(payments))
}

#[utoipa::path(
    get,
    path = "/api/portal/inquiries",
    responses(
        (status = 200, description = "Contact inquiries, newest first", body = Vec<ContactInquiry>),
        (status = 400, description = "No email associated with account", body = crate::errors::ErrorResponse),
        (status = 401, description = "Missing, invalid or expired session")
    ),
    security(("bearer_auth" = [])),
    tag = "portal"
)]
pub async fn inquiries(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Vec<ContactInquiry>> {
    let inquiries = state
        .services
        .portal
        .inquiries(&user)
        .await
        .or_public("Failed to fetch inquiries")?;
    Ok(Json(inquiries))
}

/// Routes behind `auth_middleware`
pub fn portal_routes() -> Router<AppState> {
    Router::new()
        .route("/portal/profile", get(profile))
        .route("/portal/quotes", get(quotes))
        .route("/portal/orders", get(orders))
        .route("/portal/payments", get(payments))
        .route("/portal/inquiries", get(inquiries))
}
