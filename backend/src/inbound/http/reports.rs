//! Reporting HTTP handlers.
//!
//! ```text
//! GET /api/v1/reports/collections?from=&to=
//! GET /api/v1/reports/stock-alerts
//! GET /api/v1/reports/visits?date=
//! ```

use actix_web::{get, web};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::domain::{CollectionReport, StockAlerts, VisitSummary};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_date, parse_optional_date, require};

/// Inclusive day range for the collection report.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CollectionsQuery {
    /// First day, `YYYY-MM-DD`.
    pub from: Option<String>,
    /// Last day, `YYYY-MM-DD`.
    pub to: Option<String>,
}

/// Day selector for the visit summary.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct VisitSummaryQuery {
    /// `YYYY-MM-DD`; defaults to today.
    pub date: Option<String>,
}

/// Money received per day and mode from bill payments and counter sales.
#[utoipa::path(
    get,
    path = "/api/v1/reports/collections",
    params(CollectionsQuery),
    responses(
        (status = 200, description = "Collections", body = CollectionReport),
        (status = 400, description = "Missing or reversed range", body = ErrorSchema)
    ),
    tags = ["reports"],
    operation_id = "collectionsReport"
)]
#[get("/reports/collections")]
pub async fn collections(
    state: web::Data<HttpState>,
    query: web::Query<CollectionsQuery>,
) -> ApiResult<web::Json<CollectionReport>> {
    let CollectionsQuery { from, to } = query.into_inner();
    let from_field = FieldName::new("from");
    let to_field = FieldName::new("to");
    let from = parse_date(&require(from, from_field)?, from_field)?;
    let to = parse_date(&require(to, to_field)?, to_field)?;
    Ok(web::Json(state.reports.collections(from, to).await?))
}

/// Low-stock, expired and near-expiry alerts.
#[utoipa::path(
    get,
    path = "/api/v1/reports/stock-alerts",
    responses(
        (status = 200, description = "Stock alerts", body = StockAlerts),
        (status = 503, description = "Store unavailable", body = ErrorSchema)
    ),
    tags = ["reports"],
    operation_id = "stockAlerts"
)]
#[get("/reports/stock-alerts")]
pub async fn stock_alerts(state: web::Data<HttpState>) -> ApiResult<web::Json<StockAlerts>> {
    Ok(web::Json(state.reports.stock_alerts().await?))
}

/// Visit counts for one day by status and department.
#[utoipa::path(
    get,
    path = "/api/v1/reports/visits",
    params(VisitSummaryQuery),
    responses(
        (status = 200, description = "Visit summary", body = VisitSummary),
        (status = 400, description = "Invalid date", body = ErrorSchema)
    ),
    tags = ["reports"],
    operation_id = "visitSummary"
)]
#[get("/reports/visits")]
pub async fn visit_summary(
    state: web::Data<HttpState>,
    query: web::Query<VisitSummaryQuery>,
) -> ApiResult<web::Json<VisitSummary>> {
    let date = parse_optional_date(query.into_inner().date, FieldName::new("date"))?;
    Ok(web::Json(state.reports.visit_summary(date).await?))
}
