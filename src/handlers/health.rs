use std::time::Instant;

use axum::{extract::State, http::StatusCode, response::Json, routing::get, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::AppState;

/// Component health status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Up,
    Down,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ComponentHealth {
    pub status: ComponentStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: ComponentStatus,
    pub version: String,
    pub timestamp: String,
    pub uptime_secs: u64,
    pub database: ComponentHealth,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StatusResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub environment: String,
    /// Which optional integrations have credentials
    pub integrations: IntegrationStatus,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IntegrationStatus {
    pub email: bool,
    pub estimator: bool,
    pub ups: bool,
    pub portal: bool,
}

static START_TIME: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

/// Records the process start for uptime reporting
pub fn init_start_time() {
    let _ = START_TIME.get_or_init(Instant::now);
}

fn uptime_secs() -> u64 {
    START_TIME.get().map(|t| t.elapsed().as_secs()).unwrap_or(0)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service and database are up", body = HealthResponse),
        (status = 503, description = "Database unreachable", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let started = Instant::now();
    let database = match crate::db::check_connection(&state.db).await {
        Ok(()) => ComponentHealth {
            status: ComponentStatus::Up,
            message: format!("{} reachable", crate::db::backend_name(&state.db)),
            latency_ms: Some(started.elapsed().as_millis() as u64),
        },
        Err(e) => {
            tracing::warn!("Health check database ping failed: {}", e);
            ComponentHealth {
                status: ComponentStatus::Down,
                message: "database unreachable".to_string(),
                latency_ms: None,
            }
        }
    };

    let status = database.status;
    let code = match status {
        ComponentStatus::Up => StatusCode::OK,
        ComponentStatus::Down => StatusCode::SERVICE_UNAVAILABLE,
    };
    (
        code,
        Json(HealthResponse {
            status,
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            uptime_secs: uptime_secs(),
            database,
        }),
    )
}

#[utoipa::path(
    get,
    path = "/api/status",
    responses((status = 200, description = "Build and configuration summary", body = StatusResponse)),
    tag = "health"
)]
pub async fn api_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let cfg = &state.config;
    let configured = |value: &Option<String>| value.as_deref().is_some_and(|v| !v.trim().is_empty());
    Json(StatusResponse {
        status: "ok".to_string(),
        service: "iron-catalog".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        environment: cfg.environment.clone(),
        integrations: IntegrationStatus {
            email: configured(&cfg.resend_api_key),
            estimator: configured(&cfg.openai_api_key),
            ups: configured(&cfg.ups_client_id)
                && configured(&cfg.ups_client_secret)
                && configured(&cfg.ups_account_number),
            portal: cfg.portal_secret().is_some(),
        },
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// `/health` lives outside `/api`; `/status` is nested under it
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

pub fn status_routes() -> Router<AppState> {
    Router::new().route("/status", get(api_status))
}
