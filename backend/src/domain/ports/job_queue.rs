//! Port for dispatching background jobs.

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::Job;

define_port_error! {
    /// Errors surfaced by the queue adapter.
    pub enum JobDispatchError {
        /// The queue is closed or unreachable.
        Unavailable { message: String } => "job queue is unavailable: {message}",
        /// The job was refused.
        Rejected { message: String } => "job was rejected: {message}",
    }
}

/// Fire-and-forget job dispatch.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Hand a job to the queue.
    async fn enqueue(&self, job: &Job) -> Result<(), JobDispatchError>;
}
