//! Error mapping and job dispatch shared by domain services.

use std::fmt::Display;

use serde_json::json;
use tracing::warn;

use crate::domain::numbering::document_number;
use crate::domain::ports::{JobQueue, RepositoryError, SequenceGenerator, StockRepositoryError};
use crate::domain::{Error, Job, SequenceKind};

/// Map a repository failure, naming the store in the message.
pub(crate) fn map_repository_error(store: &str, error: RepositoryError) -> Error {
    match error {
        RepositoryError::Connection { message } => {
            Error::service_unavailable(format!("{store} repository unavailable: {message}"))
        }
        RepositoryError::Query { message } => {
            Error::internal(format!("{store} repository error: {message}"))
        }
        RepositoryError::Conflict { message } => Error::conflict(message),
    }
}

/// Map a stock adapter failure. Deduction shortfalls are conflicts.
pub(crate) fn map_stock_error(error: StockRepositoryError) -> Error {
    match error {
        StockRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("stock repository unavailable: {message}"))
        }
        StockRepositoryError::Query { message } => {
            Error::internal(format!("stock repository error: {message}"))
        }
        StockRepositoryError::Insufficient {
            batch_id,
            requested,
            available,
        } => Error::conflict("stock changed while the sale was being recorded; retry").with_details(
            json!({
                "batchId": batch_id,
                "requested": requested,
                "available": available,
            }),
        ),
        StockRepositoryError::UnknownBatch { batch_id } => {
            Error::internal(format!("stock batch {batch_id} disappeared"))
        }
    }
}

/// `404` naming the entity and id.
pub(crate) fn not_found(entity: &str, id: impl Display) -> Error {
    Error::not_found(format!("{entity} {id} not found")).with_details(json!({
        "entity": entity,
        "id": id.to_string(),
    }))
}

/// `409` for a duplicate unique field.
pub(crate) fn duplicate(entity: &str, field: &str, value: &str) -> Error {
    Error::conflict(format!("{entity} with this {field} already exists")).with_details(json!({
        "field": field,
        "code": "duplicate",
        "value": value,
    }))
}

/// Enqueue a job; failures are logged and never fail the caller.
pub(crate) async fn dispatch_job(queue: &dyn JobQueue, job: Job) {
    if let Err(error) = queue.enqueue(&job).await {
        warn!(job = job.kind(), %error, "failed to enqueue background job");
    }
}

/// Allocate the next `PREFIX-000001` number for `kind`.
pub(crate) async fn next_document_number(
    sequences: &dyn SequenceGenerator,
    kind: SequenceKind,
) -> Result<String, Error> {
    let prefix = kind
        .document_prefix()
        .ok_or_else(|| Error::internal(format!("sequence {kind} has no document prefix")))?;
    let value = sequences
        .next(kind)
        .await
        .map_err(|e| map_repository_error("sequence", e))?;
    Ok(document_number(prefix, value))
}
