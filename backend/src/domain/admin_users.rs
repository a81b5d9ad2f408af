//! Account deletion behind the `admin-delete-user` edge function.

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::ports::AdminDirectory;
use crate::domain::{Error, UserId};

/// Role required to delete accounts.
pub const ADMIN_ROLE: &str = "admin";

/// Deletes user accounts on behalf of administrators.
pub struct AdminUserService {
    directory: Arc<dyn AdminDirectory>,
}

impl AdminUserService {
    /// Build the service.
    pub fn new(directory: Arc<dyn AdminDirectory>) -> Self {
        Self { directory }
    }

    /// Delete `target` if `caller` is an administrator.
    ///
    /// Administrators cannot delete their own account through this path.
    pub async fn delete_user(&self, caller: &UserId, target: &UserId) -> Result<(), Error> {
        if caller == target {
            return Err(Error::invalid_request(
                "administrators cannot delete their own account",
            ));
        }
        if !self.directory.has_role(caller, ADMIN_ROLE).await? {
            warn!(caller = %caller, target = %target, "non-admin attempted account deletion");
            return Err(Error::forbidden("admin role required"));
        }
        self.directory.delete_user(target).await?;
        info!(caller = %caller, target = %target, "account deleted");
        Ok(())
    }
}
