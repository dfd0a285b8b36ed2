//! Department, role, and employee administration.

use std::sync::Arc;

use mockable::Clock;
use pagination::PageRequest;
use serde_json::json;
use tracing::{info, warn};

use crate::domain::ports::{
    DepartmentFilter, DepartmentRepository, EmployeeFilter, EmployeeRepository, ListSlice,
    RoleRepository,
};
use crate::domain::service_support::{duplicate, map_repository_error, not_found};
use crate::domain::validation::field_error;
use crate::domain::{
    Department, DepartmentDraft, DepartmentId, Employee, EmployeeDraft, EmployeeId, Error, Role,
    RoleDraft, RoleId,
};

/// Staff administration service.
#[derive(Clone)]
pub struct StaffService {
    departments: Arc<dyn DepartmentRepository>,
    roles: Arc<dyn RoleRepository>,
    employees: Arc<dyn EmployeeRepository>,
    clock: Arc<dyn Clock>,
}

impl StaffService {
    /// Create the service over its repositories.
    pub fn new(
        departments: Arc<dyn DepartmentRepository>,
        roles: Arc<dyn RoleRepository>,
        employees: Arc<dyn EmployeeRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            departments,
            roles,
            employees,
            clock,
        }
    }

    // Departments

    /// Create a department with a unique name.
    pub async fn create_department(&self, draft: DepartmentDraft) -> Result<Department, Error> {
        self.ensure_department_name_free(&draft.name, None).await?;
        let department = Department {
            id: DepartmentId::random(),
            name: draft.name,
            description: draft.description,
            is_active: true,
            created_at: self.clock.utc(),
        };
        self.departments
            .create(&department)
            .await
            .map_err(|e| map_repository_error("department", e))?;
        info!(department_id = %department.id, name = %department.name, "department created");
        Ok(department)
    }

    /// Rename or redescribe a department.
    pub async fn update_department(
        &self,
        id: DepartmentId,
        draft: DepartmentDraft,
    ) -> Result<Department, Error> {
        let mut department = self.department(id).await?;
        self.ensure_department_name_free(&draft.name, Some(id)).await?;
        department.name = draft.name;
        department.description = draft.description;
        self.save_department(&department).await?;
        info!(department_id = %id, "department updated");
        Ok(department)
    }

    /// Activate or deactivate a department.
    pub async fn set_department_active(
        &self,
        id: DepartmentId,
        active: bool,
    ) -> Result<Department, Error> {
        let mut department = self.department(id).await?;
        department.is_active = active;
        self.save_department(&department).await?;
        info!(department_id = %id, active, "department activation changed");
        Ok(department)
    }

    /// Fetch one department.
    pub async fn department(&self, id: DepartmentId) -> Result<Department, Error> {
        self.departments
            .find(id)
            .await
            .map_err(|e| map_repository_error("department", e))?
            .ok_or_else(|| not_found("department", id))
    }

    /// List departments.
    pub async fn list_departments(
        &self,
        filter: &DepartmentFilter,
        page: PageRequest,
    ) -> Result<ListSlice<Department>, Error> {
        self.departments
            .list(filter, page)
            .await
            .map_err(|e| map_repository_error("department", e))
    }

    async fn save_department(&self, department: &Department) -> Result<(), Error> {
        self.departments
            .update(department)
            .await
            .map_err(|e| map_repository_error("department", e))
    }

    async fn ensure_department_name_free(
        &self,
        name: &str,
        except: Option<DepartmentId>,
    ) -> Result<(), Error> {
        let existing = self
            .departments
            .find_by_name(name)
            .await
            .map_err(|e| map_repository_error("department", e))?;
        match existing {
            Some(found) if Some(found.id) != except => {
                warn!(name, "duplicate department name rejected");
                Err(duplicate("department", "name", name))
            }
            _ => Ok(()),
        }
    }

    // Roles

    /// Create a role with a unique name.
    pub async fn create_role(&self, draft: RoleDraft) -> Result<Role, Error> {
        self.ensure_role_name_free(&draft.name, None).await?;
        let role = Role {
            id: RoleId::random(),
            name: draft.name,
            permissions: draft.permissions,
            created_at: self.clock.utc(),
        };
        self.roles
            .create(&role)
            .await
            .map_err(|e| map_repository_error("role", e))?;
        info!(role_id = %role.id, name = %role.name, "role created");
        Ok(role)
    }

    /// Rename a role or replace its permissions.
    pub async fn update_role(&self, id: RoleId, draft: RoleDraft) -> Result<Role, Error> {
        let mut role = self.role(id).await?;
        self.ensure_role_name_free(&draft.name, Some(id)).await?;
        role.name = draft.name;
        role.permissions = draft.permissions;
        self.roles
            .update(&role)
            .await
            .map_err(|e| map_repository_error("role", e))?;
        info!(role_id = %id, "role updated");
        Ok(role)
    }

    /// Delete a role no employee holds.
    pub async fn delete_role(&self, id: RoleId) -> Result<(), Error> {
        self.role(id).await?;
        let holders = self
            .employees
            .count_with_role(id)
            .await
            .map_err(|e| map_repository_error("employee", e))?;
        if holders > 0 {
            warn!(role_id = %id, holders, "role delete rejected while assigned");
            return Err(Error::conflict("role is assigned to employees")
                .with_details(json!({ "roleId": id, "employees": holders })));
        }
        let removed = self
            .roles
            .delete(id)
            .await
            .map_err(|e| map_repository_error("role", e))?;
        if !removed {
            return Err(not_found("role", id));
        }
        info!(role_id = %id, "role deleted");
        Ok(())
    }

    /// Fetch one role.
    pub async fn role(&self, id: RoleId) -> Result<Role, Error> {
        self.roles
            .find(id)
            .await
            .map_err(|e| map_repository_error("role", e))?
            .ok_or_else(|| not_found("role", id))
    }

    /// List roles.
    pub async fn list_roles(&self, page: PageRequest) -> Result<ListSlice<Role>, Error> {
        self.roles
            .list(page)
            .await
            .map_err(|e| map_repository_error("role", e))
    }

    async fn ensure_role_name_free(&self, name: &str, except: Option<RoleId>) -> Result<(), Error> {
        let existing = self
            .roles
            .find_by_name(name)
            .await
            .map_err(|e| map_repository_error("role", e))?;
        match existing {
            Some(found) if Some(found.id) != except => Err(duplicate("role", "name", name)),
            _ => Ok(()),
        }
    }

    // Employees

    /// Hire an employee into an active department.
    pub async fn create_employee(&self, draft: EmployeeDraft) -> Result<Employee, Error> {
        self.check_employee_references(&draft, None).await?;
        let employee = Employee {
            id: EmployeeId::random(),
            first_name: draft.first_name,
            last_name: draft.last_name,
            email: draft.email,
            phone: draft.phone,
            department_id: draft.department_id,
            role_id: draft.role_id,
            designation: draft.designation,
            consultation_fee: draft.consultation_fee,
            is_active: true,
            joined_on: draft.joined_on,
            created_at: self.clock.utc(),
        };
        self.employees
            .create(&employee)
            .await
            .map_err(|e| map_repository_error("employee", e))?;
        info!(employee_id = %employee.id, doctor = employee.is_doctor(), "employee created");
        Ok(employee)
    }

    /// Replace an employee's details.
    pub async fn update_employee(
        &self,
        id: EmployeeId,
        draft: EmployeeDraft,
    ) -> Result<Employee, Error> {
        let mut employee = self.employee(id).await?;
        self.check_employee_references(&draft, Some(&employee)).await?;
        employee.first_name = draft.first_name;
        employee.last_name = draft.last_name;
        employee.email = draft.email;
        employee.phone = draft.phone;
        employee.department_id = draft.department_id;
        employee.role_id = draft.role_id;
        employee.designation = draft.designation;
        employee.consultation_fee = draft.consultation_fee;
        employee.joined_on = draft.joined_on;
        self.save_employee(&employee).await?;
        info!(employee_id = %id, "employee updated");
        Ok(employee)
    }

    /// Activate or deactivate an employee.
    pub async fn set_employee_active(
        &self,
        id: EmployeeId,
        active: bool,
    ) -> Result<Employee, Error> {
        let mut employee = self.employee(id).await?;
        employee.is_active = active;
        self.save_employee(&employee).await?;
        info!(employee_id = %id, active, "employee activation changed");
        Ok(employee)
    }

    /// Fetch one employee.
    pub async fn employee(&self, id: EmployeeId) -> Result<Employee, Error> {
        self.employees
            .find(id)
            .await
            .map_err(|e| map_repository_error("employee", e))?
            .ok_or_else(|| not_found("employee", id))
    }

    /// List employees.
    pub async fn list_employees(
        &self,
        filter: &EmployeeFilter,
        page: PageRequest,
    ) -> Result<ListSlice<Employee>, Error> {
        self.employees
            .list(filter, page)
            .await
            .map_err(|e| map_repository_error("employee", e))
    }

    async fn save_employee(&self, employee: &Employee) -> Result<(), Error> {
        self.employees
            .update(employee)
            .await
            .map_err(|e| map_repository_error("employee", e))
    }

    /// The department must be active unless an update keeps the employee in
    /// the department they already belong to.
    async fn check_employee_references(
        &self,
        draft: &EmployeeDraft,
        current: Option<&Employee>,
    ) -> Result<(), Error> {
        let department = self
            .departments
            .find(draft.department_id)
            .await
            .map_err(|e| map_repository_error("department", e))?
            .ok_or_else(|| {
                field_error(
                    "departmentId",
                    "unknown_department",
                    "department does not exist",
                )
            })?;
        let unchanged = current.is_some_and(|e| e.department_id == department.id);
        if !department.is_active && !unchanged {
            return Err(field_error(
                "departmentId",
                "inactive_department",
                "department is inactive",
            ));
        }
        self.roles
            .find(draft.role_id)
            .await
            .map_err(|e| map_repository_error("role", e))?
            .ok_or_else(|| field_error("roleId", "unknown_role", "role does not exist"))?;
        let holder = self
            .employees
            .find_by_email(&draft.email)
            .await
            .map_err(|e| map_repository_error("employee", e))?;
        match holder {
            Some(found) if Some(found.id) != current.map(|e| e.id) => {
                Err(duplicate("employee", "email", &draft.email))
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
#[path = "staff_service_tests.rs"]
mod tests;
