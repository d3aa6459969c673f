use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use log::debug;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::core::shared::state::AppState;
use crate::goals::error::OkrError;
use crate::goals::models::Principal;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

/// Resolves an `Authorization` header value to the caller's principal.
/// Only verifies tokens; issuing them belongs to the identity provider.
pub fn resolve_bearer(header: Option<&str>, secret: Option<&str>) -> Result<Principal, OkrError> {
    let header =
        header.ok_or_else(|| OkrError::Unauthenticated("missing bearer token".to_string()))?;
    let token = header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| OkrError::Unauthenticated("malformed authorization header".to_string()))?;
    let secret = secret.ok_or_else(|| {
        OkrError::Unauthenticated("token verification is not configured".to_string())
    })?;

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map_err(|e| {
        debug!("Rejected bearer token: {e}");
        OkrError::Unauthenticated("invalid bearer token".to_string())
    })?;

    let user_id = Uuid::parse_str(&data.claims.sub)
        .map_err(|_| OkrError::Unauthenticated("token subject is not a user id".to_string()))?;
    Ok(Principal::new(user_id))
}

/// Extractor for handlers that need an authenticated caller.
pub struct AuthenticatedUser(pub Principal);

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for AuthenticatedUser {
    type Rejection = OkrError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok());
        resolve_bearer(header, state.jwt_secret.as_deref()).map(AuthenticatedUser)
    }
}
