//! Staff administration HTTP handlers.
//!
//! ```text
//! GET/POST /api/v1/departments        GET/PUT /api/v1/departments/{id}
//! POST     /api/v1/departments/{id}/activate | /deactivate
//! GET/POST /api/v1/roles              GET/PUT/DELETE /api/v1/roles/{id}
//! GET/POST /api/v1/employees          GET/PUT /api/v1/employees/{id}
//! POST     /api/v1/employees/{id}/activate | /deactivate
//! ```

use actix_web::{HttpRequest, HttpResponse, delete, get, post, put, web};
use chrono::NaiveDate;
use pagination::Paginated;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::ports::{DepartmentFilter, EmployeeFilter};
use crate::domain::{
    Department, DepartmentDraft, DepartmentId, Employee, EmployeeDraft, EmployeeId, EmployeeInput,
    Error, Money, Permission, Role, RoleDraft, RoleId,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::paging::{PageQuery, paginate};
use crate::inbound::http::schemas::{ErrorSchema, PaginatedSchema};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, parse_date, parse_id, parse_optional_id, parse_required_id, require,
};

const ID: FieldName = FieldName::new("id");
const NAME: FieldName = FieldName::new("name");
const PERMISSIONS: FieldName = FieldName::new("permissions");
const DEPARTMENT_ID: FieldName = FieldName::new("departmentId");
const ROLE_ID: FieldName = FieldName::new("roleId");

/// Department create/update payload.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

fn parse_department_request(payload: DepartmentRequest) -> Result<DepartmentDraft, Error> {
    let name = require(payload.name, NAME)?;
    DepartmentDraft::new(&name, payload.description.as_deref())
}

/// Department list filters.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DepartmentListQuery {
    /// Case-insensitive name substring.
    pub search: Option<String>,
    /// Restrict to active or inactive departments.
    pub active: Option<bool>,
}

/// Role create/update payload.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoleRequest {
    pub name: Option<String>,
    pub permissions: Option<Vec<String>>,
}

fn parse_role_request(payload: RoleRequest) -> Result<RoleDraft, Error> {
    let name = require(payload.name, NAME)?;
    let permissions = require(payload.permissions, PERMISSIONS)?
        .iter()
        .map(|raw| raw.parse::<Permission>())
        .collect::<Result<Vec<_>, _>>()?;
    RoleDraft::new(&name, permissions)
}

/// Employee create/update payload.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub department_id: Option<String>,
    pub role_id: Option<String>,
    pub designation: Option<String>,
    /// Fee per consultation in minor units. Present for consulting doctors.
    #[schema(value_type = Option<i64>)]
    pub consultation_fee: Option<Money>,
    /// `YYYY-MM-DD`.
    pub joined_on: Option<String>,
}

fn parse_employee_request(payload: EmployeeRequest) -> Result<EmployeeDraft, Error> {
    let joined_on_field = FieldName::new("joinedOn");
    let joined_on: NaiveDate = parse_date(
        &require(payload.joined_on, joined_on_field)?,
        joined_on_field,
    )?;
    EmployeeDraft::new(EmployeeInput {
        first_name: require(payload.first_name, FieldName::new("firstName"))?,
        last_name: require(payload.last_name, FieldName::new("lastName"))?,
        email: require(payload.email, FieldName::new("email"))?,
        phone: require(payload.phone, FieldName::new("phone"))?,
        department_id: parse_required_id(payload.department_id, DEPARTMENT_ID)?,
        role_id: parse_required_id(payload.role_id, ROLE_ID)?,
        designation: require(payload.designation, FieldName::new("designation"))?,
        consultation_fee: payload.consultation_fee,
        joined_on,
    })
}

/// Employee list filters.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct EmployeeListQuery {
    /// Owning department.
    pub department_id: Option<String>,
    /// Assigned role.
    pub role_id: Option<String>,
    /// Only employees with a consultation fee.
    pub doctors_only: Option<bool>,
    /// Case-insensitive name or email substring.
    pub search: Option<String>,
}

fn parse_employee_filter(query: EmployeeListQuery) -> Result<EmployeeFilter, Error> {
    Ok(EmployeeFilter {
        department_id: parse_optional_id(query.department_id, DEPARTMENT_ID)?,
        role_id: parse_optional_id(query.role_id, ROLE_ID)?,
        doctors_only: query.doctors_only.unwrap_or(false),
        search: query.search,
    })
}

/// Create a department.
#[utoipa::path(
    post,
    path = "/api/v1/departments",
    request_body = DepartmentRequest,
    responses(
        (status = 201, description = "Department created", body = Department),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 409, description = "Name already in use", body = ErrorSchema)
    ),
    tags = ["staff"],
    operation_id = "createDepartment"
)]
#[post("/departments")]
pub async fn create_department(
    state: web::Data<HttpState>,
    payload: web::Json<DepartmentRequest>,
) -> ApiResult<HttpResponse> {
    let draft = parse_department_request(payload.into_inner())?;
    let department = state.staff.create_department(draft).await?;
    Ok(HttpResponse::Created().json(department))
}

/// List departments.
#[utoipa::path(
    get,
    path = "/api/v1/departments",
    params(DepartmentListQuery, PageQuery),
    responses(
        (status = 200, description = "Departments", body = PaginatedSchema<Department>),
        (status = 400, description = "Invalid request", body = ErrorSchema)
    ),
    tags = ["staff"],
    operation_id = "listDepartments"
)]
#[get("/departments")]
pub async fn list_departments(
    state: web::Data<HttpState>,
    request: HttpRequest,
    filter: web::Query<DepartmentListQuery>,
    page: web::Query<PageQuery>,
) -> ApiResult<web::Json<Paginated<Department>>> {
    let page = page.into_inner().to_request(state.page_limits)?;
    let DepartmentListQuery { search, active } = filter.into_inner();
    let slice = state
        .staff
        .list_departments(&DepartmentFilter { search, active }, page)
        .await?;
    Ok(web::Json(paginate(slice, page, &request)))
}

/// Fetch a department.
#[utoipa::path(
    get,
    path = "/api/v1/departments/{id}",
    params(("id" = String, Path, description = "Department id")),
    responses(
        (status = 200, description = "Department", body = Department),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["staff"],
    operation_id = "getDepartment"
)]
#[get("/departments/{id}")]
pub async fn get_department(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<Department>> {
    let id: DepartmentId = parse_id(&path, ID)?;
    Ok(web::Json(state.staff.department(id).await?))
}

/// Replace a department's name and description.
#[utoipa::path(
    put,
    path = "/api/v1/departments/{id}",
    params(("id" = String, Path, description = "Department id")),
    request_body = DepartmentRequest,
    responses(
        (status = 200, description = "Department updated", body = Department),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema),
        (status = 409, description = "Name already in use", body = ErrorSchema)
    ),
    tags = ["staff"],
    operation_id = "updateDepartment"
)]
#[put("/departments/{id}")]
pub async fn update_department(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<DepartmentRequest>,
) -> ApiResult<web::Json<Department>> {
    let id: DepartmentId = parse_id(&path, ID)?;
    let draft = parse_department_request(payload.into_inner())?;
    Ok(web::Json(state.staff.update_department(id, draft).await?))
}

/// Reactivate a department.
#[utoipa::path(
    post,
    path = "/api/v1/departments/{id}/activate",
    params(("id" = String, Path, description = "Department id")),
    responses(
        (status = 200, description = "Department activated", body = Department),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["staff"],
    operation_id = "activateDepartment"
)]
#[post("/departments/{id}/activate")]
pub async fn activate_department(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<Department>> {
    let id: DepartmentId = parse_id(&path, ID)?;
    Ok(web::Json(state.staff.set_department_active(id, true).await?))
}

/// Deactivate a department.
#[utoipa::path(
    post,
    path = "/api/v1/departments/{id}/deactivate",
    params(("id" = String, Path, description = "Department id")),
    responses(
        (status = 200, description = "Department deactivated", body = Department),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["staff"],
    operation_id = "deactivateDepartment"
)]
#[post("/departments/{id}/deactivate")]
pub async fn deactivate_department(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<Department>> {
    let id: DepartmentId = parse_id(&path, ID)?;
    Ok(web::Json(state.staff.set_department_active(id, false).await?))
}

/// Create a role.
#[utoipa::path(
    post,
    path = "/api/v1/roles",
    request_body = RoleRequest,
    responses(
        (status = 201, description = "Role created", body = Role),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 409, description = "Name already in use", body = ErrorSchema)
    ),
    tags = ["staff"],
    operation_id = "createRole"
)]
#[post("/roles")]
pub async fn create_role(
    state: web::Data<HttpState>,
    payload: web::Json<RoleRequest>,
) -> ApiResult<HttpResponse> {
    let draft = parse_role_request(payload.into_inner())?;
    let role = state.staff.create_role(draft).await?;
    Ok(HttpResponse::Created().json(role))
}

/// List roles.
#[utoipa::path(
    get,
    path = "/api/v1/roles",
    params(PageQuery),
    responses(
        (status = 200, description = "Roles", body = PaginatedSchema<Role>),
        (status = 400, description = "Invalid request", body = ErrorSchema)
    ),
    tags = ["staff"],
    operation_id = "listRoles"
)]
#[get("/roles")]
pub async fn list_roles(
    state: web::Data<HttpState>,
    request: HttpRequest,
    page: web::Query<PageQuery>,
) -> ApiResult<web::Json<Paginated<Role>>> {
    let page = page.into_inner().to_request(state.page_limits)?;
    let slice = state.staff.list_roles(page).await?;
    Ok(web::Json(paginate(slice, page, &request)))
}

/// Fetch a role.
#[utoipa::path(
    get,
    path = "/api/v1/roles/{id}",
    params(("id" = String, Path, description = "Role id")),
    responses(
        (status = 200, description = "Role", body = Role),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["staff"],
    operation_id = "getRole"
)]
#[get("/roles/{id}")]
pub async fn get_role(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<Role>> {
    let id: RoleId = parse_id(&path, ID)?;
    Ok(web::Json(state.staff.role(id).await?))
}

/// Replace a role's name and permissions.
#[utoipa::path(
    put,
    path = "/api/v1/roles/{id}",
    params(("id" = String, Path, description = "Role id")),
    request_body = RoleRequest,
    responses(
        (status = 200, description = "Role updated", body = Role),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema),
        (status = 409, description = "Name already in use", body = ErrorSchema)
    ),
    tags = ["staff"],
    operation_id = "updateRole"
)]
#[put("/roles/{id}")]
pub async fn update_role(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<RoleRequest>,
) -> ApiResult<web::Json<Role>> {
    let id: RoleId = parse_id(&path, ID)?;
    let draft = parse_role_request(payload.into_inner())?;
    Ok(web::Json(state.staff.update_role(id, draft).await?))
}

/// Delete a role no employee holds.
#[utoipa::path(
    delete,
    path = "/api/v1/roles/{id}",
    params(("id" = String, Path, description = "Role id")),
    responses(
        (status = 204, description = "Role deleted"),
        (status = 404, description = "Not found", body = ErrorSchema),
        (status = 409, description = "Role still assigned", body = ErrorSchema)
    ),
    tags = ["staff"],
    operation_id = "deleteRole"
)]
#[delete("/roles/{id}")]
pub async fn delete_role(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id: RoleId = parse_id(&path, ID)?;
    state.staff.delete_role(id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Create an employee.
#[utoipa::path(
    post,
    path = "/api/v1/employees",
    request_body = EmployeeRequest,
    responses(
        (status = 201, description = "Employee created", body = Employee),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 409, description = "Email already in use", body = ErrorSchema)
    ),
    tags = ["staff"],
    operation_id = "createEmployee"
)]
#[post("/employees")]
pub async fn create_employee(
    state: web::Data<HttpState>,
    payload: web::Json<EmployeeRequest>,
) -> ApiResult<HttpResponse> {
    let draft = parse_employee_request(payload.into_inner())?;
    let employee = state.staff.create_employee(draft).await?;
    Ok(HttpResponse::Created().json(employee))
}

/// List employees.
#[utoipa::path(
    get,
    path = "/api/v1/employees",
    params(EmployeeListQuery, PageQuery),
    responses(
        (status = 200, description = "Employees", body = PaginatedSchema<Employee>),
        (status = 400, description = "Invalid request", body = ErrorSchema)
    ),
    tags = ["staff"],
    operation_id = "listEmployees"
)]
#[get("/employees")]
pub async fn list_employees(
    state: web::Data<HttpState>,
    request: HttpRequest,
    filter: web::Query<EmployeeListQuery>,
    page: web::Query<PageQuery>,
) -> ApiResult<web::Json<Paginated<Employee>>> {
    let page = page.into_inner().to_request(state.page_limits)?;
    let filter = parse_employee_filter(filter.into_inner())?;
    let slice = state.staff.list_employees(&filter, page).await?;
    Ok(web::Json(paginate(slice, page, &request)))
}

/// Fetch an employee.
#[utoipa::path(
    get,
    path = "/api/v1/employees/{id}",
    params(("id" = String, Path, description = "Employee id")),
    responses(
        (status = 200, description = "Employee", body = Employee),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["staff"],
    operation_id = "getEmployee"
)]
#[get("/employees/{id}")]
pub async fn get_employee(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<Employee>> {
    let id: EmployeeId = parse_id(&path, ID)?;
    Ok(web::Json(state.staff.employee(id).await?))
}

/// Replace an employee's details.
#[utoipa::path(
    put,
    path = "/api/v1/employees/{id}",
    params(("id" = String, Path, description = "Employee id")),
    request_body = EmployeeRequest,
    responses(
        (status = 200, description = "Employee updated", body = Employee),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema),
        (status = 409, description = "Email already in use", body = ErrorSchema)
    ),
    tags = ["staff"],
    operation_id = "updateEmployee"
)]
#[put("/employees/{id}")]
pub async fn update_employee(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<EmployeeRequest>,
) -> ApiResult<web::Json<Employee>> {
    let id: EmployeeId = parse_id(&path, ID)?;
    let draft = parse_employee_request(payload.into_inner())?;
    Ok(web::Json(state.staff.update_employee(id, draft).await?))
}

/// Reactivate an employee.
#[utoipa::path(
    post,
    path = "/api/v1/employees/{id}/activate",
    params(("id" = String, Path, description = "Employee id")),
    responses(
        (status = 200, description = "Employee activated", body = Employee),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["staff"],
    operation_id = "activateEmployee"
)]
#[post("/employees/{id}/activate")]
pub async fn activate_employee(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<Employee>> {
    let id: EmployeeId = parse_id(&path, ID)?;
    Ok(web::Json(state.staff.set_employee_active(id, true).await?))
}

/// Deactivate an employee.
#[utoipa::path(
    post,
    path = "/api/v1/employees/{id}/deactivate",
    params(("id" = String, Path, description = "Employee id")),
    responses(
        (status = 200, description = "Employee deactivated", body = Employee),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["staff"],
    operation_id = "deactivateEmployee"
)]
#[post("/employees/{id}/deactivate")]
pub async fn deactivate_employee(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<Employee>> {
    let id: EmployeeId = parse_id(&path, ID)?;
    Ok(web::Json(state.staff.set_employee_active(id, false).await?))
}
