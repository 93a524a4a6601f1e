use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::error::DbErr;
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::tracing::{log_error, ErrorKind};

fn current_request_id() -> Option<String> {
    crate::tracing::current_request_id().map(|rid| rid.as_str().to_string())
}

/// Error body returned by every endpoint
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "error": "Equipment not found",
    "request_id": "req-abc123xyz",
    "timestamp": "2026-03-09T10:30:00.000Z"
}))]
pub struct ErrorResponse {
    /// Human-readable error description
    #[schema(example = "Equipment not found")]
    pub error: String,
    /// Validation issues or upstream failure text
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub details: Option<serde_json::Value>,
    /// Provider failure text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Session failure code such as `AUTH_MISSING`
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "AUTH_MISSING")]
    pub code: Option<String>,
    /// Unique request identifier for support and debugging
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "req-abc123xyz")]
    pub request_id: Option<String>,
    /// ISO 8601 timestamp when error occurred
    #[schema(example = "2026-03-09T10:30:00.000Z")]
    pub timestamp: String,
}

impl ErrorResponse {
    /// Body for the current request, stamped with its id and the time
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
            message: None,
            code: None,
            request_id: current_request_id(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// One failed input rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ValidationIssue {
    pub path: Vec<String>,
    pub code: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(field: impl Into<String>, code: impl Into<String>, message: impl Into<String>) -> Self {
        let field = field.into();
        Self {
            path: if field.is_empty() { Vec::new() } else { vec![field] },
            code: code.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DbErr),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {} issue(s)", .0.len())]
    ValidationError(Vec<ValidationIssue>),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("External service error: {0}")]
    ExternalServiceError(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    /// A failed operation whose upstream cause is safe to show the caller
    #[error("{message}: {details}")]
    OperationFailed { message: String, details: String },

    /// A provider call that failed before answering; rendered as `{error, message}`
    #[error("{error}: {message}")]
    ProviderFailed { error: String, message: String },

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        let mut issues: Vec<ValidationIssue> = err
            .field_errors()
            .into_iter()
            .flat_map(|(field, errors)| {
                let field = camel_case(field);
                errors.iter().map(move |e| {
                    let message = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| default_rule_message(&field, &e.code));
                    ValidationIssue::new(field.as_str(), e.code.to_string(), message)
                })
            })
            .collect();
        issues.sort_by(|a, b| a.path.cmp(&b.path));
        ServiceError::ValidationError(issues)
    }
}

/// Issue paths use the wire names of request fields: `weight_lbs` -> `weightLbs`
pub fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = !out.is_empty();
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

fn default_rule_message(field: &str, code: &str) -> String {
    match code {
        "email" => format!("{} must be a valid email address", field),
        "length" => format!("{} has an invalid length", field),
        "range" => format!("{} is out of range", field),
        _ => format!("{} is invalid", field),
    }
}

impl ServiceError {
    /// Single field validation failure.
    pub fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        ServiceError::ValidationError(vec![ValidationIssue::new(field, "invalid", message)])
    }

    /// Returns the HTTP status code for this error.
    /// This is the single source of truth for error-to-status mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::ValidationError(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::ExternalServiceError(_) => StatusCode::BAD_GATEWAY,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::DatabaseError(_)
            | Self::InternalError(_)
            | Self::OperationFailed { .. }
            | Self::ProviderFailed { .. }
            | Self::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the error message suitable for HTTP responses.
    /// Internal errors return generic messages to avoid leaking implementation details.
    pub fn response_message(&self) -> String {
        match self {
            Self::DatabaseError(_) => "Database error".to_string(),
            Self::Other(_) => "Internal server error".to_string(),
            Self::ValidationError(_) => "Validation error".to_string(),
            Self::NotFound(msg)
            | Self::BadRequest(msg)
            | Self::Unauthorized(msg)
            | Self::ExternalServiceError(msg)
            | Self::ServiceUnavailable(msg)
            | Self::InternalError(msg) => msg.clone(),
            Self::OperationFailed { message, .. } => message.clone(),
            Self::ProviderFailed { error, .. } => error.clone(),
        }
    }

    fn response_details(&self) -> Option<serde_json::Value> {
        match self {
            Self::ValidationError(issues) => serde_json::to_value(issues).ok(),
            Self::OperationFailed { details, .. } => Some(json!(details)),
            _ => None,
        }
    }

    fn response_provider_message(&self) -> Option<String> {
        match self {
            Self::ProviderFailed { message, .. } => Some(message.clone()),
            _ => None,
        }
    }

    fn kind(&self) -> ErrorKind {
        match self {
            Self::DatabaseError(_) => ErrorKind::Database,
            Self::ValidationError(_) | Self::BadRequest(_) | Self::NotFound(_) => {
                ErrorKind::Validation
            }
            Self::Unauthorized(_) => ErrorKind::Auth,
            Self::ExternalServiceError(_) | Self::ServiceUnavailable(_) => ErrorKind::External,
            Self::ProviderFailed { .. } => ErrorKind::External,
            Self::InternalError(_) | Self::OperationFailed { .. } | Self::Other(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// Replaces an internal failure with a caller-facing message, logging the cause.
    /// Client errors (404, 400, 401) and upstream failures pass through untouched.
    pub fn public(self, message: &str) -> Self {
        if self.status_code().is_server_error()
            && !matches!(
                self,
                Self::ExternalServiceError(_)
                    | Self::ServiceUnavailable(_)
                    | Self::OperationFailed { .. }
                    | Self::ProviderFailed { .. }
            )
        {
            log_error(&self, self.kind(), Some(message));
            ServiceError::InternalError(message.to_string())
        } else {
            self
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let err = ErrorResponse {
            details: self.response_details(),
            message: self.response_provider_message(),
            ..ErrorResponse::new(self.response_message())
        };

        (status, Json(err)).into_response()
    }
}

// Result extensions for easier error handling
pub trait ResultExt<T> {
    /// Maps server-side failures to the given public message.
    fn or_public(self, message: &str) -> Result<T, ServiceError>;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: Into<ServiceError>,
{
    fn or_public(self, message: &str) -> Result<T, ServiceError> {
        self.map_err(|e| e.into().public(message))
    }
}
