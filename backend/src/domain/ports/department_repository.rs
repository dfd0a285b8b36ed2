//! Port for department persistence.

use async_trait::async_trait;
use pagination::PageRequest;

use super::{ListSlice, RepositoryError};
use crate::domain::{Department, DepartmentId};

/// Department list filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DepartmentFilter {
    /// Case-insensitive substring of the name.
    pub search: Option<String>,
    /// Restrict to active or inactive departments.
    pub active: Option<bool>,
}

impl DepartmentFilter {
    /// Whether `department` passes the filter.
    pub fn matches(&self, department: &Department) -> bool {
        self.active.is_none_or(|active| department.is_active == active)
            && self.search.as_deref().is_none_or(|needle| {
                department.name.to_lowercase().contains(&needle.to_lowercase())
            })
    }
}

/// Storage for departments. Names are unique ignoring case; adapters
/// report violations as [`RepositoryError::Conflict`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DepartmentRepository: Send + Sync {
    /// Insert a new department.
    async fn create(&self, department: &Department) -> Result<(), RepositoryError>;
    /// Replace an existing department.
    async fn update(&self, department: &Department) -> Result<(), RepositoryError>;
    /// Fetch by id.
    async fn find(&self, id: DepartmentId) -> Result<Option<Department>, RepositoryError>;
    /// Fetch by name, ignoring case.
    async fn find_by_name(&self, name: &str) -> Result<Option<Department>, RepositoryError>;
    /// Filtered page ordered by name.
    async fn list(
        &self,
        filter: &DepartmentFilter,
        page: PageRequest,
    ) -> Result<ListSlice<Department>, RepositoryError>;
    /// Every department.
    async fn all(&self) -> Result<Vec<Department>, RepositoryError>;
}
