//! Departments, roles, and employees.

use async_trait::async_trait;
use pagination::PageRequest;

use super::table::{Table, same_text};
use crate::domain::ports::{
    DepartmentFilter, DepartmentRepository, EmployeeFilter, EmployeeRepository, ListSlice,
    RepositoryError, RoleRepository,
};
use crate::domain::{Department, DepartmentId, Employee, EmployeeId, Role, RoleId};

/// Department storage with case-insensitive unique names.
#[derive(Debug, Default)]
pub struct MemoryDepartmentRepository {
    rows: Table<DepartmentId, Department>,
}

impl MemoryDepartmentRepository {
    /// Empty repository.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DepartmentRepository for MemoryDepartmentRepository {
    async fn create(&self, department: &Department) -> Result<(), RepositoryError> {
        self.rows
            .insert(department.id, department, |d| same_text(&d.name, &department.name))
            .await
    }

    async fn update(&self, department: &Department) -> Result<(), RepositoryError> {
        self.rows
            .replace(department.id, department, |_, d| {
                same_text(&d.name, &department.name)
            })
            .await
    }

    async fn find(&self, id: DepartmentId) -> Result<Option<Department>, RepositoryError> {
        Ok(self.rows.get(id).await)
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Department>, RepositoryError> {
        Ok(self.rows.find(|d| same_text(&d.name, name)).await)
    }

    async fn list(
        &self,
        filter: &DepartmentFilter,
        page: PageRequest,
    ) -> Result<ListSlice<Department>, RepositoryError> {
        Ok(self
            .rows
            .page(|d| filter.matches(d), |a, b| a.name.cmp(&b.name), page)
            .await)
    }

    async fn all(&self) -> Result<Vec<Department>, RepositoryError> {
        Ok(self.rows.select(|_| true, |a, b| a.name.cmp(&b.name)).await)
    }
}

/// Role storage with case-insensitive unique names.
#[derive(Debug, Default)]
pub struct MemoryRoleRepository {
    rows: Table<RoleId, Role>,
}

impl MemoryRoleRepository {
    /// Empty repository.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RoleRepository for MemoryRoleRepository {
    async fn create(&self, role: &Role) -> Result<(), RepositoryError> {
        self.rows
            .insert(role.id, role, |r| same_text(&r.name, &role.name))
            .await
    }

    async fn update(&self, role: &Role) -> Result<(), RepositoryError> {
        self.rows
            .replace(role.id, role, |_, r| same_text(&r.name, &role.name))
            .await
    }

    async fn delete(&self, id: RoleId) -> Result<bool, RepositoryError> {
        Ok(self.rows.remove(id).await)
    }

    async fn find(&self, id: RoleId) -> Result<Option<Role>, RepositoryError> {
        Ok(self.rows.get(id).await)
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Role>, RepositoryError> {
        Ok(self.rows.find(|r| same_text(&r.name, name)).await)
    }

    async fn list(&self, page: PageRequest) -> Result<ListSlice<Role>, RepositoryError> {
        Ok(self
            .rows
            .page(|_| true, |a, b| a.name.cmp(&b.name), page)
            .await)
    }
}

/// Employee storage with unique emails.
#[derive(Debug, Default)]
pub struct MemoryEmployeeRepository {
    rows: Table<EmployeeId, Employee>,
}

impl MemoryEmployeeRepository {
    /// Empty repository.
    pub fn new() -> Self {
        Self::default()
    }
}

fn by_name(a: &Employee, b: &Employee) -> std::cmp::Ordering {
    (&a.last_name, &a.first_name).cmp(&(&b.last_name, &b.first_name))
}

#[async_trait]
impl EmployeeRepository for MemoryEmployeeRepository {
    async fn create(&self, employee: &Employee) -> Result<(), RepositoryError> {
        self.rows
            .insert(employee.id, employee, |e| e.email == employee.email)
            .await
    }

    async fn update(&self, employee: &Employee) -> Result<(), RepositoryError> {
        self.rows
            .replace(employee.id, employee, |_, e| e.email == employee.email)
            .await
    }

    async fn find(&self, id: EmployeeId) -> Result<Option<Employee>, RepositoryError> {
        Ok(self.rows.get(id).await)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Employee>, RepositoryError> {
        Ok(self.rows.find(|e| e.email == email).await)
    }

    async fn list(
        &self,
        filter: &EmployeeFilter,
        page: PageRequest,
    ) -> Result<ListSlice<Employee>, RepositoryError> {
        Ok(self.rows.page(|e| filter.matches(e), by_name, page).await)
    }

    async fn count_with_role(&self, role_id: RoleId) -> Result<u64, RepositoryError> {
        Ok(self.rows.count(|e| e.role_id == role_id).await)
    }
}
