//! In-memory application harness shared by the integration suites.
//!
//! The app is the one the server runs, wired over fresh in-memory storage
//! with the clock pinned to 1 March 2026, 09:00 UTC. Helpers seed the
//! reference data most scenarios need through the public API.

use std::sync::Arc;

use actix_http::Request;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::{Method, StatusCode};
use actix_web::{test, web};
use backend::inbound::http::health::HealthState;
use backend::inbound::http::idempotency::IDEMPOTENCY_KEY_HEADER;
use backend::inbound::http::state::HttpState;
use backend::outbound::queue::{ChannelJobQueue, TracingJobHandler};
use backend::server::{AppDependencies, AppSettings, build_app, build_http_state};
use chrono::{DateTime, TimeZone, Utc};
use mockable::{Clock, MockClock};
use serde_json::{Value, json};

/// 1 March 2026, 09:00 UTC.
pub(crate) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0)
        .single()
        .expect("valid timestamp")
}

fn pinned_clock() -> Arc<dyn Clock> {
    let mut clock = MockClock::new();
    clock.expect_utc().returning(now);
    Arc::new(clock)
}

/// Fresh state with a running job worker. Must be called inside a runtime.
pub(crate) fn memory_state() -> web::Data<HttpState> {
    let (jobs, _worker) = ChannelJobQueue::spawn(16, Arc::new(TracingJobHandler));
    let state = build_http_state(&AppSettings::default(), pinned_clock(), Arc::new(jobs))
        .expect("default settings are valid");
    web::Data::new(state)
}

/// Initialise the full application over `state`.
pub(crate) async fn init_app(
    state: web::Data<HttpState>,
) -> impl Service<Request, Response = ServiceResponse, Error = actix_web::Error> {
    test::init_service(build_app(AppDependencies {
        health_state: web::Data::new(HealthState::new()),
        http_state: state,
    }))
    .await
}

/// A request against the API.
pub(crate) struct ApiCall<'a> {
    pub(crate) method: Method,
    pub(crate) path: &'a str,
    pub(crate) body: Option<Value>,
    pub(crate) idempotency_key: Option<&'a str>,
}

impl<'a> ApiCall<'a> {
    pub(crate) fn get(path: &'a str) -> Self {
        Self {
            method: Method::GET,
            path,
            body: None,
            idempotency_key: None,
        }
    }

    pub(crate) fn post(path: &'a str, body: Value) -> Self {
        Self {
            method: Method::POST,
            path,
            body: Some(body),
            idempotency_key: None,
        }
    }

    pub(crate) fn put(path: &'a str, body: Value) -> Self {
        Self {
            method: Method::PUT,
            path,
            body: Some(body),
            idempotency_key: None,
        }
    }

    pub(crate) fn with_key(mut self, key: &'a str) -> Self {
        self.idempotency_key = Some(key);
        self
    }
}

/// Send `call` and return the status with the JSON body, or `Null` when the
/// body is empty.
pub(crate) async fn send<S>(app: &S, call: ApiCall<'_>) -> (StatusCode, Value)
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let mut request = test::TestRequest::default()
        .method(call.method)
        .uri(call.path);
    if let Some(body) = call.body {
        request = request.set_json(body);
    }
    if let Some(key) = call.idempotency_key {
        request = request.insert_header((IDEMPOTENCY_KEY_HEADER, key));
    }
    let response = test::call_service(app, request.to_request()).await;
    let status = response.status();
    let bytes = test::read_body(response).await;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("JSON body")
    };
    (status, body)
}

/// Send `call` and assert the status, returning the body.
pub(crate) async fn expect_status<S>(app: &S, call: ApiCall<'_>, expected: StatusCode) -> Value
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let path = call.path.to_owned();
    let (status, body) = send(app, call).await;
    assert_eq!(status, expected, "{path}: {body}");
    body
}

/// String field of a JSON object.
pub(crate) fn text(value: &Value, field: &str) -> String {
    value
        .get(field)
        .and_then(Value::as_str)
        .unwrap_or_else(|| panic!("{field} missing from {value}"))
        .to_owned()
}

/// Reference data for an outpatient visit.
pub(crate) struct Clinic {
    pub(crate) department_id: String,
    pub(crate) doctor_id: String,
}

/// Create a General Medicine department, a doctor role, and a doctor
/// charging 500.00 per consultation.
pub(crate) async fn seed_clinic<S>(app: &S) -> Clinic
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let department = expect_status(
        app,
        ApiCall::post(
            "/api/v1/departments",
            json!({ "name": "General Medicine", "description": "OPD" }),
        ),
        StatusCode::CREATED,
    )
    .await;
    let role = expect_status(
        app,
        ApiCall::post(
            "/api/v1/roles",
            json!({ "name": "Doctor", "permissions": ["manage_visits"] }),
        ),
        StatusCode::CREATED,
    )
    .await;
    let doctor = expect_status(
        app,
        ApiCall::post(
            "/api/v1/employees",
            json!({
                "firstName": "Asha",
                "lastName": "Rao",
                "email": "asha.rao@example.org",
                "phone": "9876543210",
                "departmentId": text(&department, "id"),
                "roleId": text(&role, "id"),
                "designation": "Consultant",
                "consultationFee": 50_000,
                "joinedOn": "2020-01-06"
            }),
        ),
        StatusCode::CREATED,
    )
    .await;
    Clinic {
        department_id: text(&department, "id"),
        doctor_id: text(&doctor, "id"),
    }
}

/// Register a patient with the given first name and phone.
pub(crate) async fn register_patient<S>(app: &S, first_name: &str, phone: &str) -> Value
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    expect_status(
        app,
        ApiCall::post(
            "/api/v1/patients",
            json!({
                "firstName": first_name,
                "lastName": "Kumar",
                "gender": "male",
                "dateOfBirth": "1990-05-17",
                "phone": phone
            }),
        ),
        StatusCode::CREATED,
    )
    .await
}

/// Create a product with the given reorder level.
pub(crate) async fn create_product<S>(app: &S, name: &str, reorder_level: u32) -> Value
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    expect_status(
        app,
        ApiCall::post(
            "/api/v1/products",
            json!({
                "name": name,
                "genericName": "Paracetamol",
                "manufacturer": "Acme Pharma",
                "unit": "tablet",
                "reorderLevel": reorder_level
            }),
        ),
        StatusCode::CREATED,
    )
    .await
}

/// One received batch.
pub(crate) struct Batch<'a> {
    pub(crate) batch_number: &'a str,
    pub(crate) expiry_date: &'a str,
    pub(crate) quantity: u32,
    pub(crate) mrp: i64,
}

/// Receive `batches` of `product_id` on one GRN.
pub(crate) async fn receive_batches<S>(app: &S, product_id: &str, batches: &[Batch<'_>]) -> Value
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let items: Vec<Value> = batches
        .iter()
        .map(|batch| {
            json!({
                "productId": product_id,
                "batchNumber": batch.batch_number,
                "expiryDate": batch.expiry_date,
                "quantity": batch.quantity,
                "purchasePrice": batch.mrp / 2,
                "mrp": batch.mrp
            })
        })
        .collect();
    expect_status(
        app,
        ApiCall::post(
            "/api/v1/grns",
            json!({
                "supplierName": "MedSupply Ltd",
                "invoiceNumber": "INV-1001",
                "items": items
            }),
        ),
        StatusCode::CREATED,
    )
    .await
}
