//! Hospital management backend.
//!
//! Layout follows ports and adapters: [`domain`] holds the business rules,
//! [`inbound`] the HTTP adapter, and [`outbound`] the storage, cache, and
//! job queue adapters. [`server`] wires them together.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod server;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use middleware::Trace;
