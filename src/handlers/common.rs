use async_trait::async_trait;
use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use utoipa::IntoParams;

use crate::common::parse_leading_int;
use crate::errors::{ServiceError, ValidationIssue};
use crate::services::catalog::CatalogFilter;

/// Standard created response
pub fn created_response<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, Json(data)).into_response()
}

/// JSON body whose shape errors are reported like validation failures
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(body_rejection(rejection)),
        }
    }
}

fn body_rejection(rejection: JsonRejection) -> ServiceError {
    let code = match &rejection {
        JsonRejection::JsonDataError(_) => "invalid_type",
        JsonRejection::JsonSyntaxError(_) => "invalid_json",
        JsonRejection::MissingJsonContentType(_) => "invalid_content_type",
        _ => "invalid_body",
    };
    ServiceError::ValidationError(vec![ValidationIssue::new("", code, rejection.body_text())])
}

/// Parses a path id the same lenient way as query numbers
pub fn parse_path_id(raw: &str, message: &str) -> Result<i32, ServiceError> {
    parse_leading_int(raw)
        .and_then(|id| i32::try_from(id).ok())
        .ok_or_else(|| ServiceError::BadRequest(message.to_string()))
}

/// Query string of the catalog listings. Numbers stay strings so that
/// values such as `2abc` or `-1` fall back instead of rejecting the request.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CatalogQuery {
    /// Exact category match
    pub category: Option<String>,
    /// Exact subcategory match (parts only)
    pub subcategory: Option<String>,
    /// Case-insensitive substring search
    pub search: Option<String>,
    /// 1-based page number
    pub page: Option<String>,
    /// Page size, capped at 200
    pub limit: Option<String>,
}

fn positive(raw: Option<&str>) -> Option<u64> {
    raw.and_then(parse_leading_int)
        .filter(|n| *n > 0)
        .map(|n| n as u64)
}

fn non_empty(raw: Option<String>) -> Option<String> {
    raw.filter(|v| !v.is_empty())
}

impl CatalogQuery {
    pub fn into_filter(self, default_limit: u64) -> CatalogFilter {
        let page = positive(self.page.as_deref()).unwrap_or(1);
        let limit = positive(self.limit.as_deref()).unwrap_or(default_limit);
        CatalogFilter {
            category: non_empty(self.category),
            subcategory: non_empty(self.subcategory),
            search: non_empty(self.search),
            ..CatalogFilter::new(page, limit)
        }
    }
}
