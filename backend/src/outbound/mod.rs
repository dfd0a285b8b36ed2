//! Outbound adapters implementing domain ports.
//!
//! - **persistence**: in-memory repositories, sequences, and idempotency
//!   records
//! - **cache**: bounded read-through cache for products
//! - **queue**: in-process job queue with a background worker
//!
//! Adapters translate between port contracts and their storage. They hold
//! no business rules.

pub mod cache;
pub mod persistence;
pub mod queue;
