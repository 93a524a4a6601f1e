//! Iron Catalog
//!
//! Heavy-equipment and parts catalog service: public catalog browsing, lead
//! capture with transactional email, quotation documents, a streaming AI
//! estimator, UPS rate shopping and a customer portal.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod common;
pub mod config;
pub mod db;
pub mod documents;
pub mod errors;
pub mod etl;
pub mod handlers;
pub mod middleware_helpers;
pub mod migrator;
pub mod models;
pub mod notifications;
pub mod openapi;
pub mod services;
pub mod tracing;

use std::sync::Arc;

use axum::{http::HeaderValue, middleware, response::Json, Router};
use tower_http::{compression::CompressionLayer, cors::{Any, CorsLayer}};

use crate::auth::AuthService;
use crate::db::DbPool;
use crate::notifications::{EmailSender, ResendEmailSender};

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbPool>,
    pub config: config::AppConfig,
    pub services: handlers::AppServices,
    pub auth: Arc<AuthService>,
}

impl AppState {
    /// Builds state with the configured email provider
    pub fn new(db: Arc<DbPool>, config: config::AppConfig) -> anyhow::Result<Self> {
        let http = services::build_http_client(config.http_timeout())?;
        let mailer: Arc<dyn EmailSender> = Arc::new(ResendEmailSender::new(
            http.clone(),
            config.resend_base_url.clone(),
            config.resend_api_key.clone(),
        ));
        Ok(Self::with_mailer(db, config, mailer, http))
    }

    /// Builds state around an explicit email sender
    pub fn with_mailer(
        db: Arc<DbPool>,
        config: config::AppConfig,
        mailer: Arc<dyn EmailSender>,
        http: reqwest::Client,
    ) -> Self {
        let services = handlers::AppServices::new(db.clone(), &config, mailer, http);
        let auth = Arc::new(AuthService::new(config.portal_secret().map(str::to_string)));
        Self {
            db,
            config,
            services,
            auth,
        }
    }
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<T>, errors::ServiceError>;

/// Everything mounted under `/api`
pub fn api_routes(auth: Arc<AuthService>) -> Router<AppState> {
    let portal = handlers::portal::portal_routes().route_layer(middleware::from_fn_with_state(
        auth.clone(),
        auth::auth_middleware,
    ));
    let leads = handlers::leads::lead_routes().route_layer(middleware::from_fn_with_state(
        auth,
        auth::optional_auth_middleware,
    ));

    Router::new()
        .merge(handlers::health::status_routes())
        .merge(handlers::catalog::catalog_routes())
        .merge(leads)
        .merge(handlers::quotes::quote_document_routes())
        .merge(handlers::estimator::estimator_routes())
        .merge(handlers::shipping::shipping_routes())
        .merge(portal)
}

/// CORS policy from configuration; `None` when nothing usable is configured
/// outside development.
pub fn cors_layer(cfg: &config::AppConfig) -> Option<CorsLayer> {
    let configured_origins: Option<Vec<HeaderValue>> = cfg
        .cors_allowed_origins
        .as_ref()
        .map(|raw| {
            raw.split(',')
                .filter_map(|origin| {
                    let trimmed = origin.trim();
                    if trimmed.is_empty() {
                        None
                    } else {
                        HeaderValue::from_str(trimmed).ok()
                    }
                })
                .collect::<Vec<_>>()
        })
        .filter(|origins| !origins.is_empty());

    if let Some(origins) = configured_origins {
        Some(
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods(Any)
                .allow_headers(Any)
                .allow_credentials(cfg.cors_allow_credentials),
        )
    } else if cfg.should_allow_permissive_cors() {
        Some(CorsLayer::permissive())
    } else {
        None
    }
}

/// Full application router with the shared middleware stack
pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.config).unwrap_or_else(CorsLayer::new);

    Router::new()
        .merge(handlers::health::health_routes())
        .nest("/api", api_routes(state.auth.clone()))
        .merge(openapi::swagger_ui())
        .layer(crate::tracing::configure_http_tracing())
        .layer(CompressionLayer::new())
        .layer(cors)
        // Ensure every request carries a request id for traceability
        .layer(middleware::from_fn(
            middleware_helpers::request_id::request_id_middleware,
        ))
        .with_state(state)
}
