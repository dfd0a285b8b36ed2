//! Counter sale HTTP handlers.
//!
//! ```text
//! POST     /api/v1/counter-sales/availability
//! GET/POST /api/v1/counter-sales      GET /api/v1/counter-sales/{id}
//! ```
//!
//! Sale creation honours the `Idempotency-Key` header.

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, get, post, web};
use pagination::Paginated;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::ports::CounterSaleFilter;
use crate::domain::{
    CounterSale, CounterSaleDraft, CounterSaleId, Error, Money, PaymentMode, SaleAvailability,
    SaleLineRequest,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::idempotency::{idempotency_key, replayable_response};
use crate::inbound::http::paging::{PageQuery, paginate};
use crate::inbound::http::schemas::{ErrorSchema, PaginatedSchema};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, parse_id, parse_optional_date, parse_optional_id, parse_required_id, require,
};

/// One requested product.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaleItemRequest {
    pub product_id: Option<String>,
    pub quantity: Option<u32>,
}

fn parse_items(items: Vec<SaleItemRequest>) -> Result<Vec<SaleLineRequest>, Error> {
    items
        .into_iter()
        .map(|item| -> Result<_, Error> {
            Ok(SaleLineRequest {
                product_id: parse_required_id(item.product_id, FieldName::new("items.productId"))?,
                quantity: require(item.quantity, FieldName::new("items.quantity"))?,
            })
        })
        .collect()
}

/// Availability dry-run payload.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityRequest {
    #[serde(default)]
    pub items: Vec<SaleItemRequest>,
}

/// Sale payload.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CounterSaleRequest {
    pub patient_id: Option<String>,
    /// Required when `paymentMode` is `visit_bill`.
    pub visit_id: Option<String>,
    #[serde(default)]
    pub items: Vec<SaleItemRequest>,
    /// Minor units. Defaults to 0.
    #[schema(value_type = Option<i64>)]
    pub discount: Option<Money>,
    /// `cash`, `card`, `upi` or `visit_bill`.
    pub payment_mode: Option<String>,
}

fn parse_sale_request(payload: CounterSaleRequest) -> Result<CounterSaleDraft, Error> {
    let mode: PaymentMode = require(payload.payment_mode, FieldName::new("paymentMode"))?.parse()?;
    let lines = parse_items(payload.items)?;
    CounterSaleDraft::new(
        parse_optional_id(payload.patient_id, FieldName::new("patientId"))?,
        parse_optional_id(payload.visit_id, FieldName::new("visitId"))?,
        &lines,
        payload.discount.unwrap_or(Money::ZERO),
        mode,
    )
}

/// Sale list filters.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct CounterSaleListQuery {
    pub visit_id: Option<String>,
    pub patient_id: Option<String>,
    /// `YYYY-MM-DD` (UTC).
    pub date: Option<String>,
}

fn parse_sale_filter(query: CounterSaleListQuery) -> Result<CounterSaleFilter, Error> {
    Ok(CounterSaleFilter {
        visit_id: parse_optional_id(query.visit_id, FieldName::new("visitId"))?,
        patient_id: parse_optional_id(query.patient_id, FieldName::new("patientId"))?,
        date: parse_optional_date(query.date, FieldName::new("date"))?,
    })
}

/// Report stock sufficiency and the proposed batch allocation.
#[utoipa::path(
    post,
    path = "/api/v1/counter-sales/availability",
    request_body = AvailabilityRequest,
    responses(
        (status = 200, description = "Availability per merged line", body = SaleAvailability),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 404, description = "Product not found", body = ErrorSchema)
    ),
    tags = ["counter-sales"],
    operation_id = "checkAvailability"
)]
#[post("/counter-sales/availability")]
pub async fn check_availability(
    state: web::Data<HttpState>,
    payload: web::Json<AvailabilityRequest>,
) -> ApiResult<web::Json<SaleAvailability>> {
    let lines = parse_items(payload.into_inner().items)?;
    Ok(web::Json(
        state.counter_sales.check_availability(&lines).await?,
    ))
}

/// Sell over the counter, deducting stock first-expiry-first-out.
///
/// Replays return `200` with `replayed: true`.
#[utoipa::path(
    post,
    path = "/api/v1/counter-sales",
    request_body = CounterSaleRequest,
    params(
        ("Idempotency-Key" = Option<String>, Header, description = "UUID for idempotent requests")
    ),
    responses(
        (status = 201, description = "Sale recorded", body = CounterSale),
        (status = 200, description = "Replayed sale", body = CounterSale),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 404, description = "Product, patient or visit not found", body = ErrorSchema),
        (status = 409, description = "Insufficient stock or key reused", body = ErrorSchema)
    ),
    tags = ["counter-sales"],
    operation_id = "createCounterSale"
)]
#[post("/counter-sales")]
pub async fn create_counter_sale(
    state: web::Data<HttpState>,
    request: HttpRequest,
    payload: web::Json<CounterSaleRequest>,
) -> ApiResult<HttpResponse> {
    let key = idempotency_key(request.headers())?;
    let draft = parse_sale_request(payload.into_inner())?;
    let result = state.counter_sales.create(draft, key).await?;
    Ok(replayable_response(result, StatusCode::CREATED))
}

/// List sales, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/counter-sales",
    params(CounterSaleListQuery, PageQuery),
    responses(
        (status = 200, description = "Sales", body = PaginatedSchema<CounterSale>),
        (status = 400, description = "Invalid request", body = ErrorSchema)
    ),
    tags = ["counter-sales"],
    operation_id = "listCounterSales"
)]
#[get("/counter-sales")]
pub async fn list_counter_sales(
    state: web::Data<HttpState>,
    request: HttpRequest,
    filter: web::Query<CounterSaleListQuery>,
    page: web::Query<PageQuery>,
) -> ApiResult<web::Json<Paginated<CounterSale>>> {
    let page = page.into_inner().to_request(state.page_limits)?;
    let filter = parse_sale_filter(filter.into_inner())?;
    let slice = state.counter_sales.list(&filter, page).await?;
    Ok(web::Json(paginate(slice, page, &request)))
}

/// Fetch a sale.
#[utoipa::path(
    get,
    path = "/api/v1/counter-sales/{id}",
    params(("id" = String, Path, description = "Counter sale id")),
    responses(
        (status = 200, description = "Sale", body = CounterSale),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["counter-sales"],
    operation_id = "getCounterSale"
)]
#[get("/counter-sales/{id}")]
pub async fn get_counter_sale(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<CounterSale>> {
    let id: CounterSaleId = parse_id(&path, FieldName::new("id"))?;
    Ok(web::Json(state.counter_sales.get(id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ProductId;
    use rstest::rstest;

    fn item() -> SaleItemRequest {
        SaleItemRequest {
            product_id: Some(ProductId::random().to_string()),
            quantity: Some(2),
        }
    }

    #[rstest]
    fn visit_bill_sales_need_a_visit() {
        let payload = CounterSaleRequest {
            patient_id: None,
            visit_id: None,
            items: vec![item()],
            discount: None,
            payment_mode: Some("visit_bill".to_owned()),
        };
        let err = parse_sale_request(payload).expect_err("visit missing");
        assert_eq!(err.details().expect("details")["field"], "visitId");
    }

    #[rstest]
    fn discount_defaults_to_zero() {
        let payload = CounterSaleRequest {
            patient_id: None,
            visit_id: None,
            items: vec![item()],
            discount: None,
            payment_mode: Some("cash".to_owned()),
        };
        let draft = parse_sale_request(payload).expect("valid sale");
        assert_eq!(draft.discount, Money::ZERO);
        assert_eq!(draft.payment_mode, PaymentMode::Cash);
    }

    #[rstest]
    fn payment_mode_is_required() {
        let payload = CounterSaleRequest {
            patient_id: None,
            visit_id: None,
            items: vec![item()],
            discount: None,
            payment_mode: None,
        };
        let err = parse_sale_request(payload).expect_err("mode missing");
        assert_eq!(err.details().expect("details")["field"], "paymentMode");
    }
}
