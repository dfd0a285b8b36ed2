//! Visit lifecycle, clinical notes and queue HTTP handlers.
//!
//! ```text
//! GET/POST /api/v1/visits              GET /api/v1/visits/{id}
//! POST     /api/v1/visits/{id}/start | /complete | /cancel
//! PUT      /api/v1/visits/{id}/vitals | /assessment | /orders
//! GET      /api/v1/visits/{id}/eta     GET /api/v1/doctors/{id}/queue?date=
//! ```

use actix_web::{HttpRequest, HttpResponse, get, post, put, web};
use pagination::Paginated;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::ports::VisitFilter;
use crate::domain::{
    Assessment, CheckIn, EmployeeId, Error, MedicineOrder, Money, QueueEntry, QueueEstimate,
    ServiceOrder, Visit, VisitId, VisitOrders, Vitals,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::paging::{PageQuery, paginate};
use crate::inbound::http::schemas::{ErrorSchema, PaginatedSchema};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, parse_id, parse_optional, parse_optional_date, parse_optional_id,
    parse_required_id, require,
};

const ID: FieldName = FieldName::new("id");

/// Check-in payload.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckInRequest {
    pub patient_id: Option<String>,
    pub doctor_id: Option<String>,
    /// Must match the doctor's department when given.
    pub department_id: Option<String>,
}

fn parse_check_in(payload: CheckInRequest) -> Result<CheckIn, Error> {
    Ok(CheckIn {
        patient_id: parse_required_id(payload.patient_id, FieldName::new("patientId"))?,
        doctor_id: parse_required_id(payload.doctor_id, FieldName::new("doctorId"))?,
        department_id: parse_optional_id(payload.department_id, FieldName::new("departmentId"))?,
    })
}

/// Assessment payload.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentRequest {
    pub chief_complaint: Option<String>,
    pub diagnosis: Option<String>,
    pub notes: Option<String>,
}

fn parse_assessment(payload: AssessmentRequest) -> Result<Assessment, Error> {
    let complaint = require(payload.chief_complaint, FieldName::new("chiefComplaint"))?;
    Assessment::new(
        &complaint,
        payload.diagnosis.as_deref(),
        payload.notes.as_deref(),
    )
}

/// One prescribed medicine.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MedicineOrderRequest {
    pub product_id: Option<String>,
    pub quantity: Option<u32>,
    pub dosage: Option<String>,
    pub duration_days: Option<u32>,
}

/// One chargeable service.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceOrderRequest {
    pub name: Option<String>,
    /// Charge in minor units.
    #[schema(value_type = Option<i64>)]
    pub charge: Option<Money>,
}

/// Replacement order lists. Omitted lists are treated as empty.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrdersRequest {
    #[serde(default)]
    pub medicine_orders: Vec<MedicineOrderRequest>,
    #[serde(default)]
    pub service_orders: Vec<ServiceOrderRequest>,
}

fn parse_orders(payload: OrdersRequest) -> Result<VisitOrders, Error> {
    let medicine_orders = payload
        .medicine_orders
        .into_iter()
        .map(|order| -> Result<_, Error> {
            Ok(MedicineOrder {
                product_id: parse_required_id(
                    order.product_id,
                    FieldName::new("medicineOrders.productId"),
                )?,
                quantity: require(order.quantity, FieldName::new("medicineOrders.quantity"))?,
                dosage: require(order.dosage, FieldName::new("medicineOrders.dosage"))?,
                duration_days: order.duration_days,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    let service_orders = payload
        .service_orders
        .into_iter()
        .map(|order| -> Result<_, Error> {
            Ok(ServiceOrder {
                name: require(order.name, FieldName::new("serviceOrders.name"))?,
                charge: require(order.charge, FieldName::new("serviceOrders.charge"))?,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    VisitOrders::new(medicine_orders, service_orders)
}

/// Visit list filters.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct VisitListQuery {
    pub patient_id: Option<String>,
    pub doctor_id: Option<String>,
    /// `YYYY-MM-DD`.
    pub date: Option<String>,
    /// `waiting`, `in_consultation`, `completed` or `cancelled`.
    pub status: Option<String>,
}

fn parse_visit_filter(query: VisitListQuery) -> Result<VisitFilter, Error> {
    Ok(VisitFilter {
        patient_id: parse_optional_id(query.patient_id, FieldName::new("patientId"))?,
        doctor_id: parse_optional_id(query.doctor_id, FieldName::new("doctorId"))?,
        date: parse_optional_date(query.date, FieldName::new("date"))?,
        status: parse_optional(query.status)?,
    })
}

/// Queue day selector.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct QueueQuery {
    /// `YYYY-MM-DD`; defaults to today.
    pub date: Option<String>,
}

/// Check a patient in and issue a token.
#[utoipa::path(
    post,
    path = "/api/v1/visits",
    request_body = CheckInRequest,
    responses(
        (status = 201, description = "Visit opened", body = Visit),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 404, description = "Patient or doctor not found", body = ErrorSchema),
        (
            status = 409,
            description = "Doctor unavailable or patient already waiting",
            body = ErrorSchema
        )
    ),
    tags = ["visits"],
    operation_id = "checkIn"
)]
#[post("/visits")]
pub async fn check_in(
    state: web::Data<HttpState>,
    payload: web::Json<CheckInRequest>,
) -> ApiResult<HttpResponse> {
    let request = parse_check_in(payload.into_inner())?;
    let visit = state.visits.check_in(request).await?;
    Ok(HttpResponse::Created().json(visit))
}

/// List visits, newest check-ins first.
#[utoipa::path(
    get,
    path = "/api/v1/visits",
    params(VisitListQuery, PageQuery),
    responses(
        (status = 200, description = "Visits", body = PaginatedSchema<Visit>),
        (status = 400, description = "Invalid request", body = ErrorSchema)
    ),
    tags = ["visits"],
    operation_id = "listVisits"
)]
#[get("/visits")]
pub async fn list_visits(
    state: web::Data<HttpState>,
    request: HttpRequest,
    filter: web::Query<VisitListQuery>,
    page: web::Query<PageQuery>,
) -> ApiResult<web::Json<Paginated<Visit>>> {
    let page = page.into_inner().to_request(state.page_limits)?;
    let filter = parse_visit_filter(filter.into_inner())?;
    let slice = state.visits.list(&filter, page).await?;
    Ok(web::Json(paginate(slice, page, &request)))
}

/// Fetch a visit.
#[utoipa::path(
    get,
    path = "/api/v1/visits/{id}",
    params(("id" = String, Path, description = "Visit id")),
    responses(
        (status = 200, description = "Visit", body = Visit),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["visits"],
    operation_id = "getVisit"
)]
#[get("/visits/{id}")]
pub async fn get_visit(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<Visit>> {
    let id: VisitId = parse_id(&path, ID)?;
    Ok(web::Json(state.visits.get(id).await?))
}

/// Move a waiting visit into consultation.
#[utoipa::path(
    post,
    path = "/api/v1/visits/{id}/start",
    params(("id" = String, Path, description = "Visit id")),
    responses(
        (status = 200, description = "Consultation started", body = Visit),
        (status = 404, description = "Not found", body = ErrorSchema),
        (status = 409, description = "Illegal transition", body = ErrorSchema)
    ),
    tags = ["visits"],
    operation_id = "startConsultation"
)]
#[post("/visits/{id}/start")]
pub async fn start_consultation(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<Visit>> {
    let id: VisitId = parse_id(&path, ID)?;
    Ok(web::Json(state.visits.start_consultation(id).await?))
}

/// Complete a consultation.
#[utoipa::path(
    post,
    path = "/api/v1/visits/{id}/complete",
    params(("id" = String, Path, description = "Visit id")),
    responses(
        (status = 200, description = "Visit completed", body = Visit),
        (status = 404, description = "Not found", body = ErrorSchema),
        (status = 409, description = "Illegal transition", body = ErrorSchema)
    ),
    tags = ["visits"],
    operation_id = "completeVisit"
)]
#[post("/visits/{id}/complete")]
pub async fn complete_visit(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<Visit>> {
    let id: VisitId = parse_id(&path, ID)?;
    Ok(web::Json(state.visits.complete(id).await?))
}

/// Cancel an open visit.
#[utoipa::path(
    post,
    path = "/api/v1/visits/{id}/cancel",
    params(("id" = String, Path, description = "Visit id")),
    responses(
        (status = 200, description = "Visit cancelled", body = Visit),
        (status = 404, description = "Not found", body = ErrorSchema),
        (status = 409, description = "Illegal transition", body = ErrorSchema)
    ),
    tags = ["visits"],
    operation_id = "cancelVisit"
)]
#[post("/visits/{id}/cancel")]
pub async fn cancel_visit(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<Visit>> {
    let id: VisitId = parse_id(&path, ID)?;
    Ok(web::Json(state.visits.cancel(id).await?))
}

/// Record vital signs.
#[utoipa::path(
    put,
    path = "/api/v1/visits/{id}/vitals",
    params(("id" = String, Path, description = "Visit id")),
    request_body = Vitals,
    responses(
        (status = 200, description = "Vitals recorded", body = Visit),
        (status = 400, description = "Reading out of range", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema),
        (status = 409, description = "Visit closed", body = ErrorSchema)
    ),
    tags = ["visits"],
    operation_id = "recordVitals"
)]
#[put("/visits/{id}/vitals")]
pub async fn record_vitals(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<Vitals>,
) -> ApiResult<web::Json<Visit>> {
    let id: VisitId = parse_id(&path, ID)?;
    Ok(web::Json(
        state.visits.record_vitals(id, payload.into_inner()).await?,
    ))
}

/// Record the doctor's assessment.
#[utoipa::path(
    put,
    path = "/api/v1/visits/{id}/assessment",
    params(("id" = String, Path, description = "Visit id")),
    request_body = AssessmentRequest,
    responses(
        (status = 200, description = "Assessment recorded", body = Visit),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema),
        (status = 409, description = "Visit not in consultation", body = ErrorSchema)
    ),
    tags = ["visits"],
    operation_id = "recordAssessment"
)]
#[put("/visits/{id}/assessment")]
pub async fn record_assessment(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<AssessmentRequest>,
) -> ApiResult<web::Json<Visit>> {
    let id: VisitId = parse_id(&path, ID)?;
    let assessment = parse_assessment(payload.into_inner())?;
    Ok(web::Json(state.visits.record_assessment(id, assessment).await?))
}

/// Replace the visit's medicine and service orders.
#[utoipa::path(
    put,
    path = "/api/v1/visits/{id}/orders",
    params(("id" = String, Path, description = "Visit id")),
    request_body = OrdersRequest,
    responses(
        (status = 200, description = "Orders replaced", body = Visit),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 404, description = "Visit or product not found", body = ErrorSchema),
        (status = 409, description = "Visit not in consultation", body = ErrorSchema)
    ),
    tags = ["visits"],
    operation_id = "replaceOrders"
)]
#[put("/visits/{id}/orders")]
pub async fn replace_orders(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<OrdersRequest>,
) -> ApiResult<web::Json<Visit>> {
    let id: VisitId = parse_id(&path, ID)?;
    let orders = parse_orders(payload.into_inner())?;
    Ok(web::Json(state.visits.replace_orders(id, orders).await?))
}

/// Queue position and ETA for one visit.
#[utoipa::path(
    get,
    path = "/api/v1/visits/{id}/eta",
    params(("id" = String, Path, description = "Visit id")),
    responses(
        (status = 200, description = "Estimate", body = QueueEstimate),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["visits"],
    operation_id = "visitEta"
)]
#[get("/visits/{id}/eta")]
pub async fn visit_eta(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<QueueEstimate>> {
    let id: VisitId = parse_id(&path, ID)?;
    Ok(web::Json(state.visits.estimate(id).await?))
}

/// A doctor's visits for one day in token order, each with its estimate.
#[utoipa::path(
    get,
    path = "/api/v1/doctors/{id}/queue",
    params(("id" = String, Path, description = "Doctor (employee) id"), QueueQuery),
    responses(
        (status = 200, description = "Queue", body = Vec<QueueEntry>),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 404, description = "Doctor not found", body = ErrorSchema)
    ),
    tags = ["visits"],
    operation_id = "doctorQueue"
)]
#[get("/doctors/{id}/queue")]
pub async fn doctor_queue(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    query: web::Query<QueueQuery>,
) -> ApiResult<web::Json<Vec<QueueEntry>>> {
    let doctor_id: EmployeeId = parse_id(&path, ID)?;
    let date = parse_optional_date(query.into_inner().date, FieldName::new("date"))?;
    Ok(web::Json(state.visits.doctor_queue(doctor_id, date).await?))
}
