//! Error and result types shared by repository ports.

use super::define_port_error;

define_port_error! {
    /// Errors raised by repository adapters.
    pub enum RepositoryError {
        /// Storage could not be reached.
        Connection { message: String } => "repository connection failed: {message}",
        /// A query or mutation failed.
        Query { message: String } => "repository query failed: {message}",
        /// A uniqueness or existence constraint was violated.
        Conflict { message: String } => "repository constraint violated: {message}",
    }
}

/// One page of rows plus the unpaged total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListSlice<T> {
    /// Rows on the requested page.
    pub items: Vec<T>,
    /// Rows matching the filter across all pages.
    pub total: u64,
}

impl<T> ListSlice<T> {
    /// Empty result.
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
        }
    }
}
