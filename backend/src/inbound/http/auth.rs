//! Bearer token authentication for edge functions.
//!
//! Keep handlers focused on request/response mapping by concentrating
//! credential checks and caller identity derivation here.

use actix_web::HttpRequest;
use actix_web::http::header::AUTHORIZATION;
use tracing::debug;

use crate::domain::ports::{AccessTokenVerifier, RemoteError};
use crate::domain::{Error, UserId};

use super::ApiResult;

/// Extract the bearer token from the `Authorization` header.
pub fn bearer_token(request: &HttpRequest) -> ApiResult<&str> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .ok_or_else(|| Error::unauthorized("missing authorization header"))?;
    let value = header
        .to_str()
        .map_err(|_| Error::unauthorized("authorization header is not valid text"))?;
    let token = value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| Error::unauthorized("authorization header must be a bearer token"))?;
    Ok(token)
}

/// Resolve the caller behind the request's bearer token.
pub async fn authenticate(
    request: &HttpRequest,
    verifier: &dyn AccessTokenVerifier,
) -> ApiResult<UserId> {
    let token = bearer_token(request)?;
    verifier.verify(token).await.map_err(|err| match err {
        RemoteError::Transport { .. } | RemoteError::Malformed { .. } => Error::from(err),
        other => {
            debug!(error = %other, "access token rejected");
            Error::unauthorized("invalid or expired access token")
        }
    })
}
