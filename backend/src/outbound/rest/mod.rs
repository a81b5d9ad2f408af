//! Adapters for the hosted database platform.
//!
//! One [`PlatformClient`] is shared by every adapter so a session refresh is
//! seen by all subsequent calls.

mod client;
mod dto;
mod edge;
mod entitlements;
mod flags;
mod leagues;
mod protection;
mod rewards;

use std::fmt::Display;
use std::sync::Arc;

pub use client::{PlatformClient, PlatformCredentials, QueryParam};
pub use edge::{RestAccessTokenVerifier, RestAdminDirectory, RestReferralLedger};
pub use entitlements::{RestAuthSession, RestEntitlementRepository};
pub use flags::{RestErrorReporter, RestFeatureFlagSource};
pub use leagues::RestLeagueRepository;
pub use protection::RestProtectionRepository;
pub use rewards::RestRewardRepository;

use mockable::Clock;

use crate::domain::ports::{KeyValueStore, NotificationSink};
use crate::domain::{SessionPorts, Sleeper};

fn eq(value: impl Display) -> String {
    format!("eq.{value}")
}

/// Device-side collaborators a session needs besides the platform.
pub struct DevicePorts {
    /// Device key-value store.
    pub store: Arc<dyn KeyValueStore>,
    /// User-visible notifications.
    pub notifications: Arc<dyn NotificationSink>,
    /// Time source.
    pub clock: Arc<dyn Clock>,
    /// Delay source.
    pub sleeper: Arc<dyn Sleeper>,
}

/// Wire every platform-backed session port to `client`.
pub fn session_ports(client: &Arc<PlatformClient>, device: DevicePorts) -> SessionPorts {
    SessionPorts {
        flags: Arc::new(RestFeatureFlagSource::new(Arc::clone(client))),
        entitlements: Arc::new(RestEntitlementRepository::new(Arc::clone(client))),
        auth: Arc::new(RestAuthSession::new(Arc::clone(client))),
        rewards: Arc::new(RestRewardRepository::new(Arc::clone(client))),
        leagues: Arc::new(RestLeagueRepository::new(Arc::clone(client))),
        protection: Arc::new(RestProtectionRepository::new(Arc::clone(client))),
        reporter: Arc::new(RestErrorReporter::new(Arc::clone(client))),
        store: device.store,
        notifications: device.notifications,
        clock: device.clock,
        sleeper: device.sleeper,
    }
}
