//! Bearer token authentication.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use tracing::debug;

use crate::domain::Identity;

use super::{error::ApiError, AppState};

/// Identity of the caller, taken from a verified `Authorization: Bearer` token
///
/// Handlers that take this extractor never run for unauthenticated requests.
#[derive(Debug)]
pub struct Requester(pub Identity);

impl FromRequestParts<AppState> for Requester {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or_else(ApiError::authentication_failed)?;
        let identity = state.tokens.verify(token).map_err(|err| {
            debug!(error = %err, "token rejected");
            ApiError::authentication_failed()
        })?;

        Ok(Requester(identity))
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
