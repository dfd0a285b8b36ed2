//! Backend entry-point: loads settings, initialises tracing, and runs the
//! HTTP server until it is stopped.

use actix_web::web;
use ortho_config::OrthoConfig;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

use backend::inbound::http::health::HealthState;
use backend::server::{AppSettings, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = AppSettings::load()
        .map_err(|e| std::io::Error::other(format!("failed to load settings: {e}")))?;

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state.clone(), &settings)?;
    let result = server.await;
    health_state.mark_unhealthy();
    result
}
