//! OpenAPI documentation for the edge functions.
//!
//! [`ApiDoc`] registers the edge function paths, the health probes and the
//! failure envelope. It is exported via `cargo run --bin openapi-dump` for
//! external tooling.

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::ErrorCode;
use crate::inbound::http::FailureBody;
use crate::inbound::http::admin_users::{DeleteUserRequest, DeleteUserResponse};
use crate::inbound::http::referrals::{ProcessReferralRequest, ProcessReferralResponse};

/// Adds the bearer token security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "BearerToken",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}

/// OpenAPI document for the edge functions.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Questline edge functions",
        description = "Privileged HTTP endpoints for referral redemption, account deletion and health probes."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::referrals::process_referral,
        crate::inbound::http::admin_users::admin_delete_user,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        FailureBody,
        ErrorCode,
        ProcessReferralRequest,
        ProcessReferralResponse,
        DeleteUserRequest,
        DeleteUserResponse,
    )),
    tags(
        (name = "edge-functions", description = "Privileged operations for signed-in users"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
