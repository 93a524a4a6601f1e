/*!
 * # Session authentication
 *
 * Portal routes accept an HS256 bearer token issued by the storefront's
 * identity layer. The token's claims identify the customer; nothing is
 * looked up in the database.
 *
 * - `auth_middleware` rejects requests without a valid token
 * - `optional_auth_middleware` attaches the user when a valid token is sent
 */

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::errors::ErrorResponse;

/// Claim structure for session tokens
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image_url: Option<String>,
    pub exp: i64,
}

/// Authenticated customer extracted from the session token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_image_url: Option<String>,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email,
            first_name: claims.first_name,
            last_name: claims.last_name,
            profile_image_url: claims.profile_image_url,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum AuthError {
    #[error("Missing authentication")]
    MissingAuth,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Authentication is not configured")]
    NotConfigured,

    #[error("Token creation failed: {0}")]
    TokenCreation(String),
}

impl AuthError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingAuth => "AUTH_MISSING",
            Self::InvalidToken => "AUTH_INVALID_TOKEN",
            Self::TokenExpired => "AUTH_TOKEN_EXPIRED",
            Self::NotConfigured => "AUTH_NOT_CONFIGURED",
            Self::TokenCreation(_) => "AUTH_TOKEN_CREATION_FAILED",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message): (StatusCode, String) = match &self {
            Self::MissingAuth => (StatusCode::UNAUTHORIZED, "Authentication required".to_string()),
            Self::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "Invalid authentication token".to_string(),
            ),
            Self::TokenExpired => (StatusCode::UNAUTHORIZED, "Token has expired".to_string()),
            Self::NotConfigured => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Customer portal is not available".to_string(),
            ),
            Self::TokenCreation(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = ErrorResponse {
            code: Some(self.code().to_string()),
            ..ErrorResponse::new(message)
        };

        (status, Json(body)).into_response()
    }
}

/// Validates (and, for tooling and tests, issues) session tokens
#[derive(Clone)]
pub struct AuthService {
    secret: Option<String>,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("configured", &self.secret.is_some())
            .finish()
    }
}

impl AuthService {
    pub fn new(secret: Option<String>) -> Self {
        Self {
            secret: secret.filter(|s| !s.is_empty()),
        }
    }

    fn secret(&self) -> Result<&[u8], AuthError> {
        self.secret
            .as_deref()
            .map(str::as_bytes)
            .ok_or(AuthError::NotConfigured)
    }

    /// Validate a session token and extract the claims
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        decode::<Claims>(token, &DecodingKey::from_secret(self.secret()?), &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken,
            })
    }

    /// Sign claims for a customer, valid for `ttl`
    pub fn issue_token(&self, user: &AuthUser, ttl: ChronoDuration) -> Result<String, AuthError> {
        let claims = Claims {
            sub: user.user_id.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            profile_image_url: user.profile_image_url.clone(),
            exp: (Utc::now() + ttl).timestamp(),
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret()?),
        )
        .map_err(|e| AuthError::TokenCreation(e.to_string()))
    }

    /// `Ok(None)` when no bearer token is present
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<Option<AuthUser>, AuthError> {
        let Some(value) = headers.get(header::AUTHORIZATION) else {
            return Ok(None);
        };
        let value = value.to_str().map_err(|_| AuthError::InvalidToken)?;
        let Some(token) = value.strip_prefix("Bearer ") else {
            return Ok(None);
        };
        let claims = self.validate_token(token.trim())?;
        Ok(Some(claims.into()))
    }
}

/// Rejects the request unless it carries a valid session token
pub async fn auth_middleware(
    State(auth): State<Arc<AuthService>>,
    mut request: Request,
    next: Next,
) -> Response {
    match auth.authenticate(request.headers()) {
        Ok(Some(user)) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Ok(None) => AuthError::MissingAuth.into_response(),
        Err(e) => e.into_response(),
    }
}

/// Attaches the user when a valid token is sent; anonymous otherwise
pub async fn optional_auth_middleware(
    State(auth): State<Arc<AuthService>>,
    mut request: Request,
    next: Next,
) -> Response {
    match auth.authenticate(request.headers()) {
        Ok(Some(user)) => {
            request.extensions_mut().insert(user);
        }
        Ok(None) => {}
        Err(e) => debug!("Ignoring unusable session token: {}", e),
    }
    next.run(request).await
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AuthError::MissingAuth)
    }
}

/// Session user if the optional middleware attached one
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

#[async_trait]
impl<S> FromRequestParts<S> for MaybeAuthUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeAuthUser(parts.extensions.get::<AuthUser>().cloned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::http::HeaderValue;

    const SECRET: &str = "a-test-secret-that-is-long-enough-123";

    fn customer() -> AuthUser {
        AuthUser {
            user_id: "user-42".into(),
            email: Some("pat@example.com".into()),
            first_name: Some("Pat".into()),
            last_name: Some("Lee".into()),
            profile_image_url: None,
        }
    }

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );
        headers
    }

    #[test]
    fn issued_token_round_trips_claims() {
        let auth = AuthService::new(Some(SECRET.into()));
        let token = auth.issue_token(&customer(), ChronoDuration::hours(1)).unwrap();
        let user = auth.authenticate(&bearer(&token)).unwrap().unwrap();
        assert_eq!(user, customer());
    }

    #[test]
    fn classifies_token_failures() {
        let auth = AuthService::new(Some(SECRET.into()));
        assert_eq!(auth.authenticate(&HeaderMap::new()), Ok(None));
        assert_eq!(
            auth.authenticate(&bearer("not.a.jwt")),
            Err(AuthError::InvalidToken)
        );

        let expired = auth
            .issue_token(&customer(), ChronoDuration::hours(-1))
            .unwrap();
        assert_eq!(
            auth.authenticate(&bearer(&expired)),
            Err(AuthError::TokenExpired)
        );

        let other = AuthService::new(Some("another-secret-of-sufficient-length!".into()));
        let foreign = other.issue_token(&customer(), ChronoDuration::hours(1)).unwrap();
        assert_eq!(
            auth.authenticate(&bearer(&foreign)),
            Err(AuthError::InvalidToken)
        );
    }

    #[test]
    fn unconfigured_secret_rejects_tokens() {
        let auth = AuthService::new(None);
        assert_eq!(auth.validate_token("x"), Err(AuthError::NotConfigured));
        assert_eq!(AuthError::NotConfigured.code(), "AUTH_NOT_CONFIGURED");
        assert_eq!(AuthError::MissingAuth.code(), "AUTH_MISSING");
    }

    #[tokio::test]
    async fn auth_failures_use_the_shared_error_body() {
        let response = crate::tracing::scope_request_id(
            crate::tracing::RequestId::new("req-9"),
            async { AuthError::MissingAuth.into_response() },
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let payload: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(payload.error, "Authentication required");
        assert_eq!(payload.code.as_deref(), Some("AUTH_MISSING"));
        assert_eq!(payload.request_id.as_deref(), Some("req-9"));
    }
}
