//! Server construction and middleware wiring.

mod config;
mod state_builders;

pub use config::AppSettings;
pub use state_builders::build_http_state;

use std::sync::Arc;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
use mockable::DefaultClock;
use tracing::info;
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

use crate::Trace;
#[cfg(debug_assertions)]
use crate::doc::ApiDoc;
use crate::inbound::http::health::{HealthState, live, ready};
use crate::inbound::http::routes::configure_api;
use crate::inbound::http::state::HttpState;
use crate::outbound::queue::{ChannelJobQueue, TracingJobHandler};

/// Shared state handed to every worker's `App`.
#[derive(Clone)]
pub struct AppDependencies {
    pub health_state: web::Data<HealthState>,
    pub http_state: web::Data<HttpState>,
}

/// Assemble the application: probes at the root, the API under `/api/v1`,
/// and Swagger UI at `/docs` in debug builds.
pub fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
    } = deps;

    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .wrap(Trace)
        .service(web::scope("/api/v1").configure(configure_api))
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    app
}

/// Construct an Actix HTTP server from loaded settings.
///
/// Spawns the background job worker on the current runtime, so this must
/// be called from within it. Readiness flips once the listener is bound.
///
/// # Errors
/// Returns [`std::io::Error`] when the settings are inconsistent or the
/// socket cannot be bound.
pub fn create_server(
    health_state: web::Data<HealthState>,
    settings: &AppSettings,
) -> std::io::Result<Server> {
    let (jobs, _worker) =
        ChannelJobQueue::spawn(settings.job_queue_capacity(), Arc::new(TracingJobHandler));
    let http_state = build_http_state(settings, Arc::new(DefaultClock), Arc::new(jobs))
        .map_err(|e| std::io::Error::other(format!("invalid page settings: {e}")))?;
    let http_state = web::Data::new(http_state);
    let bind_addr = settings.bind_addr();

    let server_health_state = health_state.clone();
    let server = HttpServer::new(move || {
        build_app(AppDependencies {
            health_state: server_health_state.clone(),
            http_state: http_state.clone(),
        })
    })
    .bind(bind_addr)?
    .run();

    info!(%bind_addr, "listening");
    health_state.mark_ready();
    Ok(server)
}
