//! Port for employee persistence.

use async_trait::async_trait;
use pagination::PageRequest;

use super::{ListSlice, RepositoryError};
use crate::domain::{DepartmentId, Employee, EmployeeId, RoleId};

/// Employee list filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmployeeFilter {
    /// Owning department.
    pub department_id: Option<DepartmentId>,
    /// Assigned role.
    pub role_id: Option<RoleId>,
    /// Only employees with a consultation fee.
    pub doctors_only: bool,
    /// Case-insensitive substring of the name or email.
    pub search: Option<String>,
}

impl EmployeeFilter {
    /// Whether `employee` passes the filter.
    pub fn matches(&self, employee: &Employee) -> bool {
        self.department_id.is_none_or(|id| employee.department_id == id)
            && self.role_id.is_none_or(|id| employee.role_id == id)
            && (!self.doctors_only || employee.is_doctor())
            && self.search.as_deref().is_none_or(|needle| {
                let needle = needle.to_lowercase();
                employee.full_name().to_lowercase().contains(&needle)
                    || employee.email.contains(&needle)
            })
    }
}

/// Storage for employees. Emails are unique.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmployeeRepository: Send + Sync {
    /// Insert a new employee.
    async fn create(&self, employee: &Employee) -> Result<(), RepositoryError>;
    /// Replace an existing employee.
    async fn update(&self, employee: &Employee) -> Result<(), RepositoryError>;
    /// Fetch by id.
    async fn find(&self, id: EmployeeId) -> Result<Option<Employee>, RepositoryError>;
    /// Fetch by normalised email.
    async fn find_by_email(&self, email: &str) -> Result<Option<Employee>, RepositoryError>;
    /// Filtered page ordered by name.
    async fn list(
        &self,
        filter: &EmployeeFilter,
        page: PageRequest,
    ) -> Result<ListSlice<Employee>, RepositoryError>;
    /// Employees holding `role_id`.
    async fn count_with_role(&self, role_id: RoleId) -> Result<u64, RepositoryError>;
}
