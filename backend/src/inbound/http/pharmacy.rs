//! Pharmacy catalogue, stock, intent and goods receipt HTTP handlers.
//!
//! ```text
//! GET/POST /api/v1/products         GET/PUT /api/v1/products/{id}
//! POST     /api/v1/products/{id}/deactivate
//! GET      /api/v1/products/{id}/stock
//! GET/POST /api/v1/intents          GET /api/v1/intents/{id}
//! POST     /api/v1/intents/{id}/cancel
//! GET/POST /api/v1/grns             GET /api/v1/grns/{id}
//! ```

use actix_web::{HttpRequest, HttpResponse, get, post, put, web};
use chrono::NaiveDate;
use pagination::Paginated;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::ports::{GrnFilter, IntentFilter, ProductFilter};
use crate::domain::{
    Error, Grn, GrnDraft, GrnId, GrnItemInput, Intent, IntentDraft, IntentId, Money, Product,
    ProductDraft, ProductId, StockSummary,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::paging::{PageQuery, paginate};
use crate::inbound::http::schemas::{ErrorSchema, PaginatedSchema};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, parse_date, parse_id, parse_optional, parse_optional_id, parse_required_id,
    require,
};

const ID: FieldName = FieldName::new("id");

/// Product create/update payload.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductRequest {
    pub name: Option<String>,
    pub generic_name: Option<String>,
    pub manufacturer: Option<String>,
    /// Dispensing unit, e.g. `tablet`.
    pub unit: Option<String>,
    /// Defaults to 0.
    pub reorder_level: Option<u32>,
}

fn parse_product_request(payload: ProductRequest) -> Result<ProductDraft, Error> {
    let name = require(payload.name, FieldName::new("name"))?;
    let unit = require(payload.unit, FieldName::new("unit"))?;
    ProductDraft::new(
        &name,
        payload.generic_name.as_deref(),
        payload.manufacturer.as_deref(),
        &unit,
        payload.reorder_level.unwrap_or(0),
    )
}

/// Product list filters.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductListQuery {
    /// Case-insensitive substring of the name or generic name.
    pub search: Option<String>,
    /// Restrict to active or inactive products.
    pub active: Option<bool>,
}

/// One requested product on an intent.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IntentItemRequest {
    pub product_id: Option<String>,
    pub quantity_requested: Option<u32>,
}

/// Purchase intent payload.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IntentRequest {
    #[serde(default)]
    pub items: Vec<IntentItemRequest>,
    pub note: Option<String>,
}

fn parse_intent_request(payload: IntentRequest) -> Result<IntentDraft, Error> {
    let items = payload
        .items
        .into_iter()
        .map(|item| -> Result<(ProductId, u32), Error> {
            Ok((
                parse_required_id(item.product_id, FieldName::new("items.productId"))?,
                require(
                    item.quantity_requested,
                    FieldName::new("items.quantityRequested"),
                )?,
            ))
        })
        .collect::<Result<Vec<_>, _>>()?;
    IntentDraft::new(items, payload.note.as_deref())
}

/// Intent list filters.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct IntentListQuery {
    /// `pending`, `partially_fulfilled`, `fulfilled` or `cancelled`.
    pub status: Option<String>,
}

/// One received line.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GrnItemRequest {
    pub product_id: Option<String>,
    pub batch_number: Option<String>,
    /// `YYYY-MM-DD`; must be after the receipt date.
    pub expiry_date: Option<String>,
    pub quantity: Option<u32>,
    /// Bonus units. Defaults to 0.
    pub free_quantity: Option<u32>,
    /// Cost per unit in minor units.
    #[schema(value_type = Option<i64>)]
    pub purchase_price: Option<Money>,
    /// Selling price per unit in minor units.
    #[schema(value_type = Option<i64>)]
    pub mrp: Option<Money>,
}

/// Goods receipt payload.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GrnRequest {
    pub supplier_name: Option<String>,
    pub invoice_number: Option<String>,
    /// Intent being fulfilled, if any.
    pub intent_id: Option<String>,
    #[serde(default)]
    pub items: Vec<GrnItemRequest>,
}

fn parse_grn_item(item: GrnItemRequest) -> Result<GrnItemInput, Error> {
    let expiry_field = FieldName::new("items.expiryDate");
    Ok(GrnItemInput {
        product_id: parse_required_id(item.product_id, FieldName::new("items.productId"))?,
        batch_number: require(item.batch_number, FieldName::new("items.batchNumber"))?,
        expiry_date: parse_date(&require(item.expiry_date, expiry_field)?, expiry_field)?,
        quantity: require(item.quantity, FieldName::new("items.quantity"))?,
        free_quantity: item.free_quantity.unwrap_or(0),
        purchase_price: require(item.purchase_price, FieldName::new("items.purchasePrice"))?,
        mrp: require(item.mrp, FieldName::new("items.mrp"))?,
    })
}

fn parse_grn_request(payload: GrnRequest, today: NaiveDate) -> Result<GrnDraft, Error> {
    let supplier = require(payload.supplier_name, FieldName::new("supplierName"))?;
    let invoice = require(payload.invoice_number, FieldName::new("invoiceNumber"))?;
    let intent_id = parse_optional_id(payload.intent_id, FieldName::new("intentId"))?;
    let items = payload
        .items
        .into_iter()
        .map(parse_grn_item)
        .collect::<Result<Vec<_>, _>>()?;
    GrnDraft::new(&supplier, &invoice, intent_id, items, today)
}

/// GRN list filters.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct GrnListQuery {
    /// Fulfilled intent.
    pub intent_id: Option<String>,
    /// Case-insensitive supplier substring.
    pub supplier: Option<String>,
}

/// Add a product to the catalogue.
#[utoipa::path(
    post,
    path = "/api/v1/products",
    request_body = ProductRequest,
    responses(
        (status = 201, description = "Product created", body = Product),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 409, description = "Name already in use", body = ErrorSchema)
    ),
    tags = ["pharmacy"],
    operation_id = "createProduct"
)]
#[post("/products")]
pub async fn create_product(
    state: web::Data<HttpState>,
    payload: web::Json<ProductRequest>,
) -> ApiResult<HttpResponse> {
    let draft = parse_product_request(payload.into_inner())?;
    let product = state.pharmacy.create_product(draft).await?;
    Ok(HttpResponse::Created().json(product))
}

/// Search the catalogue.
#[utoipa::path(
    get,
    path = "/api/v1/products",
    params(ProductListQuery, PageQuery),
    responses(
        (status = 200, description = "Products", body = PaginatedSchema<Product>),
        (status = 400, description = "Invalid request", body = ErrorSchema)
    ),
    tags = ["pharmacy"],
    operation_id = "listProducts"
)]
#[get("/products")]
pub async fn list_products(
    state: web::Data<HttpState>,
    request: HttpRequest,
    filter: web::Query<ProductListQuery>,
    page: web::Query<PageQuery>,
) -> ApiResult<web::Json<Paginated<Product>>> {
    let page = page.into_inner().to_request(state.page_limits)?;
    let ProductListQuery { search, active } = filter.into_inner();
    let slice = state
        .pharmacy
        .list_products(&ProductFilter { search, active }, page)
        .await?;
    Ok(web::Json(paginate(slice, page, &request)))
}

/// Fetch a product.
#[utoipa::path(
    get,
    path = "/api/v1/products/{id}",
    params(("id" = String, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product", body = Product),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["pharmacy"],
    operation_id = "getProduct"
)]
#[get("/products/{id}")]
pub async fn get_product(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<Product>> {
    let id: ProductId = parse_id(&path, ID)?;
    Ok(web::Json(state.pharmacy.product(id).await?))
}

/// Replace a product's catalogue fields.
#[utoipa::path(
    put,
    path = "/api/v1/products/{id}",
    params(("id" = String, Path, description = "Product id")),
    request_body = ProductRequest,
    responses(
        (status = 200, description = "Product updated", body = Product),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema),
        (status = 409, description = "Name already in use", body = ErrorSchema)
    ),
    tags = ["pharmacy"],
    operation_id = "updateProduct"
)]
#[put("/products/{id}")]
pub async fn update_product(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<ProductRequest>,
) -> ApiResult<web::Json<Product>> {
    let id: ProductId = parse_id(&path, ID)?;
    let draft = parse_product_request(payload.into_inner())?;
    Ok(web::Json(state.pharmacy.update_product(id, draft).await?))
}

/// Stop ordering and selling a product.
#[utoipa::path(
    post,
    path = "/api/v1/products/{id}/deactivate",
    params(("id" = String, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product deactivated", body = Product),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["pharmacy"],
    operation_id = "deactivateProduct"
)]
#[post("/products/{id}/deactivate")]
pub async fn deactivate_product(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<Product>> {
    let id: ProductId = parse_id(&path, ID)?;
    Ok(web::Json(state.pharmacy.deactivate_product(id).await?))
}

/// Available and expired units with batches in expiry order.
#[utoipa::path(
    get,
    path = "/api/v1/products/{id}/stock",
    params(("id" = String, Path, description = "Product id")),
    responses(
        (status = 200, description = "Stock summary", body = StockSummary),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["pharmacy"],
    operation_id = "productStock"
)]
#[get("/products/{id}/stock")]
pub async fn product_stock(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<StockSummary>> {
    let id: ProductId = parse_id(&path, ID)?;
    Ok(web::Json(state.pharmacy.stock_summary(id).await?))
}

/// Raise a purchase intent.
#[utoipa::path(
    post,
    path = "/api/v1/intents",
    request_body = IntentRequest,
    responses(
        (status = 201, description = "Intent raised", body = Intent),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 404, description = "Product not found", body = ErrorSchema)
    ),
    tags = ["pharmacy"],
    operation_id = "createIntent"
)]
#[post("/intents")]
pub async fn create_intent(
    state: web::Data<HttpState>,
    payload: web::Json<IntentRequest>,
) -> ApiResult<HttpResponse> {
    let draft = parse_intent_request(payload.into_inner())?;
    let intent = state.pharmacy.create_intent(draft).await?;
    Ok(HttpResponse::Created().json(intent))
}

/// List intents, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/intents",
    params(IntentListQuery, PageQuery),
    responses(
        (status = 200, description = "Intents", body = PaginatedSchema<Intent>),
        (status = 400, description = "Invalid request", body = ErrorSchema)
    ),
    tags = ["pharmacy"],
    operation_id = "listIntents"
)]
#[get("/intents")]
pub async fn list_intents(
    state: web::Data<HttpState>,
    request: HttpRequest,
    filter: web::Query<IntentListQuery>,
    page: web::Query<PageQuery>,
) -> ApiResult<web::Json<Paginated<Intent>>> {
    let page = page.into_inner().to_request(state.page_limits)?;
    let filter = IntentFilter {
        status: parse_optional(filter.into_inner().status)?,
    };
    let slice = state.pharmacy.list_intents(&filter, page).await?;
    Ok(web::Json(paginate(slice, page, &request)))
}

/// Fetch an intent.
#[utoipa::path(
    get,
    path = "/api/v1/intents/{id}",
    params(("id" = String, Path, description = "Intent id")),
    responses(
        (status = 200, description = "Intent", body = Intent),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["pharmacy"],
    operation_id = "getIntent"
)]
#[get("/intents/{id}")]
pub async fn get_intent(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<Intent>> {
    let id: IntentId = parse_id(&path, ID)?;
    Ok(web::Json(state.pharmacy.intent(id).await?))
}

/// Cancel an intent nothing has been received against.
#[utoipa::path(
    post,
    path = "/api/v1/intents/{id}/cancel",
    params(("id" = String, Path, description = "Intent id")),
    responses(
        (status = 200, description = "Intent cancelled", body = Intent),
        (status = 404, description = "Not found", body = ErrorSchema),
        (status = 409, description = "Intent already received against", body = ErrorSchema)
    ),
    tags = ["pharmacy"],
    operation_id = "cancelIntent"
)]
#[post("/intents/{id}/cancel")]
pub async fn cancel_intent(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<Intent>> {
    let id: IntentId = parse_id(&path, ID)?;
    Ok(web::Json(state.pharmacy.cancel_intent(id).await?))
}

/// Receive goods and shelve one batch per line.
#[utoipa::path(
    post,
    path = "/api/v1/grns",
    request_body = GrnRequest,
    responses(
        (status = 201, description = "Goods received", body = Grn),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 404, description = "Product or intent not found", body = ErrorSchema),
        (status = 409, description = "Intent closed or over-received", body = ErrorSchema)
    ),
    tags = ["pharmacy"],
    operation_id = "receiveGoods"
)]
#[post("/grns")]
pub async fn receive_grn(
    state: web::Data<HttpState>,
    payload: web::Json<GrnRequest>,
) -> ApiResult<HttpResponse> {
    let draft = parse_grn_request(payload.into_inner(), state.today())?;
    let grn = state.pharmacy.receive_grn(draft).await?;
    Ok(HttpResponse::Created().json(grn))
}

/// List goods receipts, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/grns",
    params(GrnListQuery, PageQuery),
    responses(
        (status = 200, description = "Goods receipts", body = PaginatedSchema<Grn>),
        (status = 400, description = "Invalid request", body = ErrorSchema)
    ),
    tags = ["pharmacy"],
    operation_id = "listGrns"
)]
#[get("/grns")]
pub async fn list_grns(
    state: web::Data<HttpState>,
    request: HttpRequest,
    filter: web::Query<GrnListQuery>,
    page: web::Query<PageQuery>,
) -> ApiResult<web::Json<Paginated<Grn>>> {
    let page = page.into_inner().to_request(state.page_limits)?;
    let GrnListQuery {
        intent_id,
        supplier,
    } = filter.into_inner();
    let filter = GrnFilter {
        intent_id: parse_optional_id(intent_id, FieldName::new("intentId"))?,
        supplier,
    };
    let slice = state.pharmacy.list_grns(&filter, page).await?;
    Ok(web::Json(paginate(slice, page, &request)))
}

/// Fetch a goods receipt.
#[utoipa::path(
    get,
    path = "/api/v1/grns/{id}",
    params(("id" = String, Path, description = "GRN id")),
    responses(
        (status = 200, description = "Goods receipt", body = Grn),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["pharmacy"],
    operation_id = "getGrn"
)]
#[get("/grns/{id}")]
pub async fn get_grn(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<Grn>> {
    let id: GrnId = parse_id(&path, ID)?;
    Ok(web::Json(state.pharmacy.grn(id).await?))
}
