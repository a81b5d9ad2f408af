//! HTTP inbound adapter serving the edge functions and health probes.

pub mod admin_users;
pub mod auth;
pub mod error;
pub mod health;
pub mod referrals;
pub mod state;
#[cfg(test)]
pub mod test_utils;

use actix_web::web;

use crate::domain::Error;

pub use error::{ApiResult, FailureBody};
pub use state::{HttpState, HttpStatePorts};

/// JSON extractor settings: malformed bodies answer with the failure envelope.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(16 * 1024)
        .error_handler(|err, _request| Error::invalid_request(err.to_string()).into())
}

/// Register the edge functions. Callers supply [`HttpState`] as app data.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .service(referrals::process_referral)
        .service(admin_users::admin_delete_user);
}
