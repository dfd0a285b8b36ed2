//! In-process job queue backed by a tokio `mpsc` channel.
//!
//! [`ChannelJobQueue::spawn`] starts one worker task that hands each job to
//! a [`JobHandler`]. Handler failures are logged and never stop the worker.
//! Once every sender is dropped the worker drains the channel and exits.
//!
//! Enqueueing never waits: a full channel refuses the job so the request
//! that raised it is not held up behind the worker.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::domain::Job;
use crate::domain::ports::{JobDispatchError, JobQueue};

/// Processes jobs taken off the queue.
#[async_trait]
pub trait JobHandler: Send + Sync {
    /// Handle one job. Errors are logged by the worker.
    async fn handle(&self, job: Job) -> Result<(), String>;
}

/// Emits one structured event per job.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingJobHandler;

#[async_trait]
impl JobHandler for TracingJobHandler {
    async fn handle(&self, job: Job) -> Result<(), String> {
        match job {
            Job::LowStock {
                product_id,
                available,
                reorder_level,
            } => warn!(%product_id, available, reorder_level, "product below reorder level"),
            Job::BillSettled { bill_id, visit_id } => {
                info!(%bill_id, %visit_id, "bill settled");
            }
        }
        Ok(())
    }
}

/// Sender half of the queue.
#[derive(Debug, Clone)]
pub struct ChannelJobQueue {
    sender: mpsc::Sender<Job>,
}

impl ChannelJobQueue {
    /// Create a queue holding up to `capacity` pending jobs and spawn its
    /// worker on the current runtime.
    pub fn spawn(capacity: usize, handler: Arc<dyn JobHandler>) -> (Self, JoinHandle<()>) {
        let (sender, mut receiver) = mpsc::channel::<Job>(capacity.max(1));
        let worker = tokio::spawn(async move {
            while let Some(job) = receiver.recv().await {
                let kind = job.kind();
                match handler.handle(job).await {
                    Ok(()) => info!(job = kind, "job processed"),
                    Err(error) => warn!(job = kind, %error, "job failed"),
                }
            }
            info!("job worker stopped");
        });
        (Self { sender }, worker)
    }
}

#[async_trait]
impl JobQueue for ChannelJobQueue {
    async fn enqueue(&self, job: &Job) -> Result<(), JobDispatchError> {
        self.sender.try_send(job.clone()).map_err(|error| match error {
            TrySendError::Full(job) => {
                warn!(job = job.kind(), "job queue full, dropping job");
                JobDispatchError::rejected("job queue is full")
            }
            TrySendError::Closed(job) => {
                warn!(job = job.kind(), "job worker has stopped");
                JobDispatchError::unavailable("job worker has stopped")
            }
        })
    }
}

#[cfg(test)]
mod tests {
    //! Delivery and shutdown behaviour of the channel queue.

    use std::sync::Mutex;

    use rstest::rstest;

    use super::*;
    use crate::domain::{BillId, ProductId, VisitId};

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<Job>>,
    }

    #[async_trait]
    impl JobHandler for Recorder {
        async fn handle(&self, job: Job) -> Result<(), String> {
            self.seen.lock().map_err(|e| e.to_string())?.push(job);
            Ok(())
        }
    }

    #[rstest]
    #[tokio::test]
    async fn worker_receives_jobs_in_order() {
        let recorder = Arc::new(Recorder::default());
        let (queue, worker) = ChannelJobQueue::spawn(8, recorder.clone());
        let low = Job::LowStock {
            product_id: ProductId::random(),
            available: 2,
            reorder_level: 10,
        };
        let settled = Job::BillSettled {
            bill_id: BillId::random(),
            visit_id: VisitId::random(),
        };

        queue.enqueue(&low).await.expect("enqueue");
        queue.enqueue(&settled).await.expect("enqueue");
        drop(queue);
        worker.await.expect("worker joins");

        let seen = recorder.seen.lock().expect("lock").clone();
        assert_eq!(seen, vec![low, settled]);
    }

    #[rstest]
    #[tokio::test]
    async fn stopped_worker_is_unavailable() {
        let (queue, worker) = ChannelJobQueue::spawn(1, Arc::new(TracingJobHandler));
        worker.abort();
        let _ = worker.await;

        let err = queue
            .enqueue(&Job::BillSettled {
                bill_id: BillId::random(),
                visit_id: VisitId::random(),
            })
            .await
            .expect_err("closed");
        assert!(matches!(err, JobDispatchError::Unavailable { .. }));
    }

    #[rstest]
    #[tokio::test]
    async fn full_queue_refuses_without_waiting() {
        // The current-thread runtime does not poll the worker between the
        // two enqueues, so the single slot is still occupied.
        let recorder = Arc::new(Recorder::default());
        let (queue, worker) = ChannelJobQueue::spawn(1, recorder.clone());
        let first = Job::LowStock {
            product_id: ProductId::random(),
            available: 0,
            reorder_level: 5,
        };
        queue.enqueue(&first).await.expect("first job fits");

        let err = queue
            .enqueue(&Job::BillSettled {
                bill_id: BillId::random(),
                visit_id: VisitId::random(),
            })
            .await
            .expect_err("queue is full");
        assert!(matches!(err, JobDispatchError::Rejected { .. }));

        drop(queue);
        worker.await.expect("worker joins");
        assert_eq!(recorder.seen.lock().expect("lock").clone(), vec![first]);
    }
}
