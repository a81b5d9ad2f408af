//! Edge function server: referral redemption, account deletion and health
//! probes over the hosted platform's service API.

use std::sync::Arc;

use actix_web::{App, HttpServer, web};
use color_eyre::eyre::{Result, WrapErr};
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use questline::config::ServerSettings;
use questline::inbound::http::health::{HealthState, live, ready};
use questline::inbound::http::{self, HttpState, HttpStatePorts};
use questline::outbound::rest::{
    PlatformClient, PlatformCredentials, RestAccessTokenVerifier, RestAdminDirectory,
    RestReferralLedger,
};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = ServerSettings::load_from_iter(std::env::args_os())
        .wrap_err("load server settings")?;
    let client = Arc::new(
        PlatformClient::new(
            settings.platform_url()?,
            PlatformCredentials::service(settings.anon_key()?, settings.service_key()?),
            settings.request_timeout(),
        )
        .wrap_err("build platform client")?,
    );
    let state = HttpState::new(HttpStatePorts {
        tokens: Arc::new(RestAccessTokenVerifier::new(Arc::clone(&client))),
        referrals: Arc::new(RestReferralLedger::new(Arc::clone(&client))),
        directory: Arc::new(RestAdminDirectory::new(client)),
    });
    let bind_addr = settings.bind_addr()?;

    let health_state = web::Data::new(HealthState::new());
    let server_health_state = health_state.clone();
    let state = web::Data::new(state);
    let server = HttpServer::new(move || {
        App::new()
            .app_data(server_health_state.clone())
            .app_data(state.clone())
            .configure(http::configure)
            .service(ready)
            .service(live)
    })
    .bind(bind_addr)
    .wrap_err_with(|| format!("bind {bind_addr}"))?;

    health_state.mark_ready();
    info!(%bind_addr, "edge function server listening");
    server.run().await?;
    health_state.mark_unhealthy();
    Ok(())
}
