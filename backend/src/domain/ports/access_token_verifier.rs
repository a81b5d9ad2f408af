//! Driving port used by edge functions to authenticate bearer tokens.

use async_trait::async_trait;

use crate::domain::UserId;

use super::RemoteError;

/// Resolves a caller's bearer token to the user it was issued for.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccessTokenVerifier: Send + Sync {
    /// Validate `token` with the platform auth API.
    async fn verify(&self, token: &str) -> Result<UserId, RemoteError>;
}

/// Verifier accepting exactly one token.
#[derive(Debug, Clone)]
pub struct FixtureAccessTokenVerifier {
    token: String,
    user_id: UserId,
}

impl FixtureAccessTokenVerifier {
    /// Accept `token` as `user_id` and reject everything else.
    pub fn new(token: impl Into<String>, user_id: UserId) -> Self {
        Self {
            token: token.into(),
            user_id,
        }
    }
}

#[async_trait]
impl AccessTokenVerifier for FixtureAccessTokenVerifier {
    async fn verify(&self, token: &str) -> Result<UserId, RemoteError> {
        if token == self.token {
            Ok(self.user_id.clone())
        } else {
            Err(RemoteError::unauthorized("unknown token"))
        }
    }
}
