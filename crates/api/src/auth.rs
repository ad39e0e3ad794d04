//! Request authentication middleware.
//!
//! User-facing routes carry an HS256 bearer token whose claims name the
//! user; the payment callback is authenticated by a shared secret in the
//! `X-Payment-Auth` header.

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use common::UserId;

use crate::error::ApiError;

/// Header carrying the payment system's shared credential.
pub const PAYMENT_AUTH_HEADER: &str = "X-Payment-Auth";

/// Secrets the middleware validates against, shared as axum state.
#[derive(Clone)]
pub struct AuthState {
    pub jwt_secret: String,
    pub payment_auth_secret: String,
}

/// Bearer token claims.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// The authenticated user id.
    pub uid: i64,
    /// Expiry, seconds since the epoch.
    pub exp: usize,
}

/// The authenticated user, inserted as a request extension.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub UserId);

/// Middleware requiring a valid user bearer token.
pub async fn require_user(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(req.headers())?;

    let claims = jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.jwt_secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map_err(|e| {
        tracing::warn!(error = %e, "rejected bearer token");
        ApiError::Unauthorized
    })?
    .claims;

    if claims.uid <= 0 {
        return Err(ApiError::Unauthorized);
    }

    req.extensions_mut().insert(AuthUser(UserId::new(claims.uid)));
    Ok(next.run(req).await)
}

/// Middleware requiring the payment system's shared header credential.
pub async fn require_payment(
    State(state): State<AuthState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = req
        .headers()
        .get(PAYMENT_AUTH_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;

    if header != state.payment_auth_secret {
        tracing::warn!("rejected payment callback credential");
        return Err(ApiError::Unauthorized);
    }

    Ok(next.run(req).await)
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, ApiError> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or(ApiError::Unauthorized)?;

    let header = header.to_str().map_err(|_| ApiError::Unauthorized)?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or(ApiError::Unauthorized)?
        .trim();

    if token.is_empty() {
        return Err(ApiError::Unauthorized);
    }

    Ok(token)
}
