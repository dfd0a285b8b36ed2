//! Patient registration HTTP handlers.
//!
//! ```text
//! GET/POST /api/v1/patients      GET/PUT /api/v1/patients/{id}
//! GET      /api/v1/patients/uhid/{uhid}
//! ```

use actix_web::{HttpRequest, HttpResponse, get, post, put, web};
use pagination::Paginated;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::ports::PatientFilter;
use crate::domain::{EmergencyContact, Error, Patient, PatientId, PatientInput};
use crate::inbound::http::ApiResult;
use crate::inbound::http::paging::{PageQuery, paginate};
use crate::inbound::http::schemas::{ErrorSchema, PaginatedSchema};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_id, parse_optional_date, require};

/// Emergency contact as submitted by clients.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyContactRequest {
    pub name: Option<String>,
    pub relation: Option<String>,
    pub phone: Option<String>,
}

/// Registration and demographic update payload.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PatientRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// `male`, `female` or `other`.
    pub gender: Option<String>,
    /// `YYYY-MM-DD`.
    pub date_of_birth: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    /// e.g. `O+`, `AB-`.
    pub blood_group: Option<String>,
    pub emergency_contact: Option<EmergencyContactRequest>,
}

fn parse_patient_request(payload: PatientRequest) -> Result<PatientInput, Error> {
    let emergency_contact = payload
        .emergency_contact
        .map(|contact| -> Result<_, Error> {
            Ok(EmergencyContact {
                name: require(contact.name, FieldName::new("emergencyContact.name"))?,
                relation: require(contact.relation, FieldName::new("emergencyContact.relation"))?,
                phone: require(contact.phone, FieldName::new("emergencyContact.phone"))?,
            })
        })
        .transpose()?;
    Ok(PatientInput {
        first_name: require(payload.first_name, FieldName::new("firstName"))?,
        last_name: payload.last_name,
        gender: require(payload.gender, FieldName::new("gender"))?,
        date_of_birth: parse_optional_date(payload.date_of_birth, FieldName::new("dateOfBirth"))?,
        phone: require(payload.phone, FieldName::new("phone"))?,
        email: payload.email,
        address: payload.address,
        blood_group: payload.blood_group,
        emergency_contact,
    })
}

/// Patient search filter.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PatientListQuery {
    /// Exact UHID, or a substring of the name or phone.
    pub query: Option<String>,
}

/// Register a patient and allocate a UHID.
#[utoipa::path(
    post,
    path = "/api/v1/patients",
    request_body = PatientRequest,
    responses(
        (status = 201, description = "Patient registered", body = Patient),
        (status = 400, description = "Invalid request", body = ErrorSchema)
    ),
    tags = ["patients"],
    operation_id = "registerPatient"
)]
#[post("/patients")]
pub async fn register_patient(
    state: web::Data<HttpState>,
    payload: web::Json<PatientRequest>,
) -> ApiResult<HttpResponse> {
    let input = parse_patient_request(payload.into_inner())?;
    let patient = state.patients.register(input).await?;
    Ok(HttpResponse::Created().json(patient))
}

/// Search patients, newest registrations first.
#[utoipa::path(
    get,
    path = "/api/v1/patients",
    params(PatientListQuery, PageQuery),
    responses(
        (status = 200, description = "Matching patients", body = PaginatedSchema<Patient>),
        (status = 400, description = "Invalid request", body = ErrorSchema)
    ),
    tags = ["patients"],
    operation_id = "searchPatients"
)]
#[get("/patients")]
pub async fn search_patients(
    state: web::Data<HttpState>,
    request: HttpRequest,
    filter: web::Query<PatientListQuery>,
    page: web::Query<PageQuery>,
) -> ApiResult<web::Json<Paginated<Patient>>> {
    let page = page.into_inner().to_request(state.page_limits)?;
    let filter = PatientFilter {
        query: filter.into_inner().query,
    };
    let slice = state.patients.search(&filter, page).await?;
    Ok(web::Json(paginate(slice, page, &request)))
}

/// Look a patient up by UHID.
#[utoipa::path(
    get,
    path = "/api/v1/patients/uhid/{uhid}",
    params(("uhid" = String, Path, description = "Hospital id, e.g. UH2026000001")),
    responses(
        (status = 200, description = "Patient", body = Patient),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["patients"],
    operation_id = "getPatientByUhid"
)]
#[get("/patients/uhid/{uhid}")]
pub async fn get_patient_by_uhid(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<Patient>> {
    Ok(web::Json(state.patients.get_by_uhid(&path).await?))
}

/// Fetch a patient.
#[utoipa::path(
    get,
    path = "/api/v1/patients/{id}",
    params(("id" = String, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Patient", body = Patient),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["patients"],
    operation_id = "getPatient"
)]
#[get("/patients/{id}")]
pub async fn get_patient(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<Patient>> {
    let id: PatientId = parse_id(&path, FieldName::new("id"))?;
    Ok(web::Json(state.patients.get(id).await?))
}

/// Replace a patient's demographics. The UHID never changes.
#[utoipa::path(
    put,
    path = "/api/v1/patients/{id}",
    params(("id" = String, Path, description = "Patient id")),
    request_body = PatientRequest,
    responses(
        (status = 200, description = "Patient updated", body = Patient),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["patients"],
    operation_id = "updatePatient"
)]
#[put("/patients/{id}")]
pub async fn update_patient(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<PatientRequest>,
) -> ApiResult<web::Json<Patient>> {
    let id: PatientId = parse_id(&path, FieldName::new("id"))?;
    let input = parse_patient_request(payload.into_inner())?;
    Ok(web::Json(state.patients.update(id, input).await?))
}
