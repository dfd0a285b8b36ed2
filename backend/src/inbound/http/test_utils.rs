//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, web};

use crate::Trace;
use crate::domain::fixtures;
use crate::domain::ports::MockJobQueue;
use crate::inbound::http::routes::configure_api;
use crate::inbound::http::state::HttpState;
use crate::server::{AppSettings, build_http_state};

/// HTTP state over empty in-memory storage with the clock pinned to
/// [`fixtures::now`]. Background jobs are accepted and dropped.
pub fn memory_state() -> web::Data<HttpState> {
    let mut jobs = MockJobQueue::new();
    jobs.expect_enqueue().returning(|_| Ok(()));
    let state = build_http_state(&AppSettings::default(), fixtures::clock(), Arc::new(jobs))
        .expect("default settings are valid");
    web::Data::new(state)
}

/// The `/api/v1` scope over `state`, traced like the real server.
pub fn api_app(
    state: web::Data<HttpState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(state)
        .wrap(Trace)
        .service(web::scope("/api/v1").configure(configure_api))
}
