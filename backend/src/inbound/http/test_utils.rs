//! Helpers shared by handler tests.

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{App, test, web};
use serde_json::Value;

use super::state::{HttpState, HttpStatePorts};
use crate::domain::UserId;
use crate::domain::ports::{
    FixtureAccessTokenVerifier, FixtureAdminDirectory, FixtureReferralLedger,
};

/// Bearer token accepted by [`state_with`].
pub const TOKEN: &str = "test-access-token";

/// State authenticating [`TOKEN`] as `caller`, with fixture ports adjusted by
/// `customise`.
pub fn state_with(caller: &UserId, customise: impl FnOnce(&mut HttpStatePorts)) -> HttpState {
    let mut ports = HttpStatePorts {
        tokens: Arc::new(FixtureAccessTokenVerifier::new(TOKEN, caller.clone())),
        referrals: Arc::new(FixtureReferralLedger),
        directory: Arc::new(FixtureAdminDirectory),
    };
    customise(&mut ports);
    HttpState::new(ports)
}

/// POST `body` to `path` on an app wired like the server and decode the reply.
pub async fn call_json(
    state: HttpState,
    path: &str,
    token: Option<&str>,
    body: Value,
) -> (StatusCode, Value) {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(super::configure),
    )
    .await;
    let mut request = test::TestRequest::post().uri(path).set_json(body);
    if let Some(token) = token {
        request = request.insert_header((AUTHORIZATION, format!("Bearer {token}")));
    }
    let response = test::call_service(&app, request.to_request()).await;
    let status = response.status();
    let body: Value = test::read_body_json(response).await;
    (status, body)
}
