//! HTTP inbound adapter exposing REST endpoints.
//!
//! Handlers parse request DTOs into domain inputs, call one service, and
//! return domain entities as JSON. Domain errors become JSON error payloads
//! through [`error`].

pub mod billing;
pub mod counter_sales;
pub mod error;
pub mod health;
pub mod idempotency;
pub mod paging;
pub mod patients;
pub mod pharmacy;
pub mod reports;
pub mod routes;
pub mod schemas;
pub mod staff;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod validation;
pub mod visits;

pub use error::ApiResult;
