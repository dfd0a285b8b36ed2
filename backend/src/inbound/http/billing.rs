//! Billing and reconciliation HTTP handlers.
//!
//! ```text
//! POST /api/v1/visits/{id}/bill     GET /api/v1/visits/{id}/bill
//! GET  /api/v1/visits/{id}/reconciliation
//! GET  /api/v1/bills                GET /api/v1/bills/{id}
//! POST /api/v1/bills/{id}/discount | /payments | /cancel
//! ```

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, get, post, web};
use pagination::Paginated;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::ports::BillFilter;
use crate::domain::{
    Bill, BillId, Error, Money, PaymentMethod, PaymentRequest, VisitId, VisitReconciliation,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::idempotency::{idempotency_key, replayable_response};
use crate::inbound::http::paging::{PageQuery, paginate};
use crate::inbound::http::schemas::{ErrorSchema, PaginatedSchema};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, parse_id, parse_optional, parse_optional_id, require,
};

const ID: FieldName = FieldName::new("id");

/// Discount payload.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DiscountRequest {
    /// Minor units; replaces any earlier discount.
    #[schema(value_type = Option<i64>)]
    pub discount: Option<Money>,
}

/// Payment payload.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentBody {
    /// Minor units; must not exceed the balance.
    #[schema(value_type = Option<i64>)]
    pub amount: Option<Money>,
    /// `cash`, `card` or `upi`.
    pub mode: Option<String>,
    /// Receipt or transaction reference.
    pub reference: Option<String>,
}

fn parse_payment(payload: PaymentBody) -> Result<PaymentRequest, Error> {
    let mode: PaymentMethod = require(payload.mode, FieldName::new("mode"))?.parse()?;
    Ok(PaymentRequest {
        amount: require(payload.amount, FieldName::new("amount"))?,
        mode,
        reference: payload.reference,
    })
}

/// Bill list filters.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct BillListQuery {
    /// `unpaid`, `partially_paid`, `paid` or `cancelled`.
    pub status: Option<String>,
    pub patient_id: Option<String>,
}

fn parse_bill_filter(query: BillListQuery) -> Result<BillFilter, Error> {
    Ok(BillFilter {
        status: parse_optional(query.status)?,
        patient_id: parse_optional_id(query.patient_id, FieldName::new("patientId"))?,
    })
}

/// Open the visit's bill, or refresh its lines while unpaid.
#[utoipa::path(
    post,
    path = "/api/v1/visits/{id}/bill",
    params(("id" = String, Path, description = "Visit id")),
    responses(
        (status = 201, description = "Bill opened", body = Bill),
        (status = 200, description = "Existing bill refreshed", body = Bill),
        (status = 404, description = "Visit not found", body = ErrorSchema),
        (status = 409, description = "Visit cancelled or bill closed", body = ErrorSchema)
    ),
    tags = ["billing"],
    operation_id = "generateBill"
)]
#[post("/visits/{id}/bill")]
pub async fn generate_bill(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let visit_id: VisitId = parse_id(&path, ID)?;
    let generated = state.billing.generate(visit_id).await?;
    let status = if generated.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok(HttpResponse::build(status).json(generated.bill))
}

/// Fetch the visit's bill.
#[utoipa::path(
    get,
    path = "/api/v1/visits/{id}/bill",
    params(("id" = String, Path, description = "Visit id")),
    responses(
        (status = 200, description = "Bill", body = Bill),
        (status = 404, description = "No bill for visit", body = ErrorSchema)
    ),
    tags = ["billing"],
    operation_id = "getVisitBill"
)]
#[get("/visits/{id}/bill")]
pub async fn get_visit_bill(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<Bill>> {
    let visit_id: VisitId = parse_id(&path, ID)?;
    Ok(web::Json(state.billing.for_visit(visit_id).await?))
}

/// Compare ordered, dispensed and billed medicine for a visit.
#[utoipa::path(
    get,
    path = "/api/v1/visits/{id}/reconciliation",
    params(("id" = String, Path, description = "Visit id")),
    responses(
        (status = 200, description = "Reconciliation", body = VisitReconciliation),
        (status = 404, description = "Visit not found", body = ErrorSchema)
    ),
    tags = ["billing"],
    operation_id = "reconcileVisit"
)]
#[get("/visits/{id}/reconciliation")]
pub async fn reconcile_visit(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<VisitReconciliation>> {
    let visit_id: VisitId = parse_id(&path, ID)?;
    Ok(web::Json(state.billing.reconcile(visit_id).await?))
}

/// List bills, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/bills",
    params(BillListQuery, PageQuery),
    responses(
        (status = 200, description = "Bills", body = PaginatedSchema<Bill>),
        (status = 400, description = "Invalid request", body = ErrorSchema)
    ),
    tags = ["billing"],
    operation_id = "listBills"
)]
#[get("/bills")]
pub async fn list_bills(
    state: web::Data<HttpState>,
    request: HttpRequest,
    filter: web::Query<BillListQuery>,
    page: web::Query<PageQuery>,
) -> ApiResult<web::Json<Paginated<Bill>>> {
    let page = page.into_inner().to_request(state.page_limits)?;
    let filter = parse_bill_filter(filter.into_inner())?;
    let slice = state.billing.list(&filter, page).await?;
    Ok(web::Json(paginate(slice, page, &request)))
}

/// Fetch a bill.
#[utoipa::path(
    get,
    path = "/api/v1/bills/{id}",
    params(("id" = String, Path, description = "Bill id")),
    responses(
        (status = 200, description = "Bill", body = Bill),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["billing"],
    operation_id = "getBill"
)]
#[get("/bills/{id}")]
pub async fn get_bill(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<Bill>> {
    let id: BillId = parse_id(&path, ID)?;
    Ok(web::Json(state.billing.get(id).await?))
}

/// Set the discount on an unpaid bill.
#[utoipa::path(
    post,
    path = "/api/v1/bills/{id}/discount",
    params(("id" = String, Path, description = "Bill id")),
    request_body = DiscountRequest,
    responses(
        (status = 200, description = "Discount applied", body = Bill),
        (status = 400, description = "Discount exceeds gross", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema),
        (status = 409, description = "Bill already paid against", body = ErrorSchema)
    ),
    tags = ["billing"],
    operation_id = "applyDiscount"
)]
#[post("/bills/{id}/discount")]
pub async fn apply_discount(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<DiscountRequest>,
) -> ApiResult<web::Json<Bill>> {
    let id: BillId = parse_id(&path, ID)?;
    let discount = require(payload.into_inner().discount, FieldName::new("discount"))?;
    Ok(web::Json(state.billing.apply_discount(id, discount).await?))
}

/// Record a payment.
///
/// Replays return `200` with `replayed: true`.
#[utoipa::path(
    post,
    path = "/api/v1/bills/{id}/payments",
    params(
        ("id" = String, Path, description = "Bill id"),
        ("Idempotency-Key" = Option<String>, Header, description = "UUID for idempotent requests")
    ),
    request_body = PaymentBody,
    responses(
        (status = 201, description = "Payment recorded", body = Bill),
        (status = 200, description = "Replayed payment", body = Bill),
        (status = 400, description = "Invalid amount", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema),
        (status = 409, description = "Bill closed or key reused", body = ErrorSchema)
    ),
    tags = ["billing"],
    operation_id = "recordPayment"
)]
#[post("/bills/{id}/payments")]
pub async fn record_payment(
    state: web::Data<HttpState>,
    request: HttpRequest,
    path: web::Path<String>,
    payload: web::Json<PaymentBody>,
) -> ApiResult<HttpResponse> {
    let id: BillId = parse_id(&path, ID)?;
    let key = idempotency_key(request.headers())?;
    let payment = parse_payment(payload.into_inner())?;
    let result = state.billing.record_payment(id, payment, key).await?;
    Ok(replayable_response(result, StatusCode::CREATED))
}

/// Void an unpaid bill.
#[utoipa::path(
    post,
    path = "/api/v1/bills/{id}/cancel",
    params(("id" = String, Path, description = "Bill id")),
    responses(
        (status = 200, description = "Bill cancelled", body = Bill),
        (status = 404, description = "Not found", body = ErrorSchema),
        (status = 409, description = "Bill already paid against", body = ErrorSchema)
    ),
    tags = ["billing"],
    operation_id = "cancelBill"
)]
#[post("/bills/{id}/cancel")]
pub async fn cancel_bill(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<Bill>> {
    let id: BillId = parse_id(&path, ID)?;
    Ok(web::Json(state.billing.cancel(id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BillStatus;
    use rstest::rstest;

    #[rstest]
    #[case(None, Some("cash"), "amount")]
    #[case(Some(100), None, "mode")]
    fn payment_requires_amount_and_mode(
        #[case] amount: Option<i64>,
        #[case] mode: Option<&str>,
        #[case] field: &str,
    ) {
        let payload = PaymentBody {
            amount: amount.map(Money::from_minor),
            mode: mode.map(str::to_owned),
            reference: None,
        };
        let err = parse_payment(payload).expect_err("incomplete payment");
        assert_eq!(err.details().expect("details")["field"], field);
    }

    #[rstest]
    fn bill_filter_parses_status() {
        let filter = parse_bill_filter(BillListQuery {
            status: Some("partially_paid".to_owned()),
            patient_id: None,
        })
        .expect("valid filter");
        assert_eq!(filter.status, Some(BillStatus::PartiallyPaid));
    }
}
