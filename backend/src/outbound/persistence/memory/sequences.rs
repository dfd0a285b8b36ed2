//! Monotonic counters for document numbers and tokens.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::SequenceKind;
use crate::domain::ports::{RepositoryError, SequenceGenerator};

/// One counter per [`SequenceKind`], starting at 1.
#[derive(Debug, Default)]
pub struct MemorySequenceGenerator {
    counters: Mutex<HashMap<SequenceKind, u64>>,
}

impl MemorySequenceGenerator {
    /// Fresh counters.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SequenceGenerator for MemorySequenceGenerator {
    async fn next(&self, kind: SequenceKind) -> Result<u64, RepositoryError> {
        let mut counters = self.counters.lock().await;
        let counter = counters.entry(kind).or_insert(0);
        *counter = counter
            .checked_add(1)
            .ok_or_else(|| RepositoryError::query(format!("sequence {kind} exhausted")))?;
        Ok(*counter)
    }
}
