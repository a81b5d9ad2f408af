//! Shared HTTP adapter state.
//!
//! Handlers accept this state via `actix_web::web::Data` so they only depend
//! on domain services and ports and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{AccessTokenVerifier, AdminDirectory, ReferralLedger};
use crate::domain::{AdminUserService, ReferralService};

/// Parameter object bundling the port implementations handlers need.
#[derive(Clone)]
pub struct HttpStatePorts {
    /// Resolves bearer tokens to callers.
    pub tokens: Arc<dyn AccessTokenVerifier>,
    /// Referral bookkeeping.
    pub referrals: Arc<dyn ReferralLedger>,
    /// Role checks and account deletion.
    pub directory: Arc<dyn AdminDirectory>,
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub tokens: Arc<dyn AccessTokenVerifier>,
    pub referrals: Arc<ReferralService>,
    pub admin_users: Arc<AdminUserService>,
}

impl HttpState {
    /// Build the services from their ports.
    pub fn new(ports: HttpStatePorts) -> Self {
        Self {
            tokens: ports.tokens,
            referrals: Arc::new(ReferralService::new(ports.referrals)),
            admin_users: Arc::new(AdminUserService::new(ports.directory)),
        }
    }
}
