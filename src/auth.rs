//! The authentication boundary.
//!
//! Token verification against identity providers happens upstream (gateway or
//! sidecar); by the time a request reaches this service it carries the
//! verified, opaque subject in the `x-vault-user` header. Deployments that
//! also want a shared secret between gateway and vault set `API_KEY`, which
//! turns on an `x-api-key` check for every request.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::envelope::ApiFailure;
use crate::state::AppState;

/// Header carrying the authenticated user id.
pub const USER_HEADER: &str = "x-vault-user";

/// Header carrying the shared API key, when one is configured.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Extractor yielding the authenticated user's opaque, stable id.
#[derive(Debug, Clone)]
pub struct AuthUser(pub String);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiFailure;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(expected) = state.api_key() {
            let provided = parts
                .headers
                .get(API_KEY_HEADER)
                .and_then(|value| value.to_str().ok());
            if provided != Some(expected) {
                return Err(ApiFailure::unauthorized("Invalid API key."));
            }
        }

        let user = parts
            .headers
            .get(USER_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty());

        match user {
            Some(user) => Ok(AuthUser(user.to_owned())),
            None => Err(ApiFailure::unauthorized("Authentication required.")),
        }
    }
}
