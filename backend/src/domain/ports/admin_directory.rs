//! Port for role checks and account deletion through the admin API.

use async_trait::async_trait;

use crate::domain::UserId;

use super::RemoteError;

/// Privileged user administration.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AdminDirectory: Send + Sync {
    /// Whether `user_id` holds `role` (remote procedure `has_role`).
    async fn has_role(&self, user_id: &UserId, role: &str) -> Result<bool, RemoteError>;

    /// Permanently delete the auth account of `user_id`.
    async fn delete_user(&self, user_id: &UserId) -> Result<(), RemoteError>;
}

/// Directory where nobody holds any role.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureAdminDirectory;

#[async_trait]
impl AdminDirectory for FixtureAdminDirectory {
    async fn has_role(&self, _user_id: &UserId, _role: &str) -> Result<bool, RemoteError> {
        Ok(false)
    }

    async fn delete_user(&self, user_id: &UserId) -> Result<(), RemoteError> {
        Err(RemoteError::not_found(format!("user {user_id}")))
    }
}
