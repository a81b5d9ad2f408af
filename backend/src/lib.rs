//! Business rules of the questline habit tracker.
//!
//! - [`domain`]: the rules and the ports they drive.
//! - [`outbound`]: platform and device adapters.
//! - [`inbound`]: the edge function HTTP server.
//! - [`config`]: OrthoConfig settings.

pub mod config;
pub mod doc;
pub mod domain;
pub mod inbound;
pub mod outbound;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

/// Public OpenAPI surface used by tooling.
pub use doc::ApiDoc;
