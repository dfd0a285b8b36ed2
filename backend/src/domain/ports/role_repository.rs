//! Port for role persistence.

use async_trait::async_trait;
use pagination::PageRequest;

use super::{ListSlice, RepositoryError};
use crate::domain::{Role, RoleId};

/// Storage for roles. Names are unique ignoring case.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Insert a new role.
    async fn create(&self, role: &Role) -> Result<(), RepositoryError>;
    /// Replace an existing role.
    async fn update(&self, role: &Role) -> Result<(), RepositoryError>;
    /// Remove a role; `false` when it did not exist.
    async fn delete(&self, id: RoleId) -> Result<bool, RepositoryError>;
    /// Fetch by id.
    async fn find(&self, id: RoleId) -> Result<Option<Role>, RepositoryError>;
    /// Fetch by name, ignoring case.
    async fn find_by_name(&self, name: &str) -> Result<Option<Role>, RepositoryError>;
    /// Page ordered by name.
    async fn list(&self, page: PageRequest) -> Result<ListSlice<Role>, RepositoryError>;
}
