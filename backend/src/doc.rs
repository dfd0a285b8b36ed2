//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] gathers every handler under `/api/v1` plus the health
//! probes. Entity schemas are collected from the handler annotations; the
//! error payload and the pagination links are registered explicitly through
//! their mirror types in [`crate::inbound::http::schemas`].
//!
//! The generated document is served by Swagger UI in debug builds and
//! exported via `cargo run --bin openapi-dump` for external tooling.

use crate::inbound::http::schemas::{ErrorCodeSchema, ErrorSchema, PageLinksSchema};
use utoipa::OpenApi;

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Hospital management backend API",
        description = "Staff, patients, visits, pharmacy, counter sales, billing and reports."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::staff::create_department,
        crate::inbound::http::staff::list_departments,
        crate::inbound::http::staff::get_department,
        crate::inbound::http::staff::update_department,
        crate::inbound::http::staff::activate_department,
        crate::inbound::http::staff::deactivate_department,
        crate::inbound::http::staff::create_role,
        crate::inbound::http::staff::list_roles,
        crate::inbound::http::staff::get_role,
        crate::inbound::http::staff::update_role,
        crate::inbound::http::staff::delete_role,
        crate::inbound::http::staff::create_employee,
        crate::inbound::http::staff::list_employees,
        crate::inbound::http::staff::get_employee,
        crate::inbound::http::staff::update_employee,
        crate::inbound::http::staff::activate_employee,
        crate::inbound::http::staff::deactivate_employee,
        crate::inbound::http::patients::register_patient,
        crate::inbound::http::patients::search_patients,
        crate::inbound::http::patients::get_patient_by_uhid,
        crate::inbound::http::patients::get_patient,
        crate::inbound::http::patients::update_patient,
        crate::inbound::http::visits::check_in,
        crate::inbound::http::visits::list_visits,
        crate::inbound::http::visits::get_visit,
        crate::inbound::http::visits::start_consultation,
        crate::inbound::http::visits::complete_visit,
        crate::inbound::http::visits::cancel_visit,
        crate::inbound::http::visits::record_vitals,
        crate::inbound::http::visits::record_assessment,
        crate::inbound::http::visits::replace_orders,
        crate::inbound::http::visits::visit_eta,
        crate::inbound::http::visits::doctor_queue,
        crate::inbound::http::pharmacy::create_product,
        crate::inbound::http::pharmacy::list_products,
        crate::inbound::http::pharmacy::get_product,
        crate::inbound::http::pharmacy::update_product,
        crate::inbound::http::pharmacy::deactivate_product,
        crate::inbound::http::pharmacy::product_stock,
        crate::inbound::http::pharmacy::create_intent,
        crate::inbound::http::pharmacy::list_intents,
        crate::inbound::http::pharmacy::get_intent,
        crate::inbound::http::pharmacy::cancel_intent,
        crate::inbound::http::pharmacy::receive_grn,
        crate::inbound::http::pharmacy::list_grns,
        crate::inbound::http::pharmacy::get_grn,
        crate::inbound::http::counter_sales::check_availability,
        crate::inbound::http::counter_sales::create_counter_sale,
        crate::inbound::http::counter_sales::list_counter_sales,
        crate::inbound::http::counter_sales::get_counter_sale,
        crate::inbound::http::billing::generate_bill,
        crate::inbound::http::billing::get_visit_bill,
        crate::inbound::http::billing::reconcile_visit,
        crate::inbound::http::billing::list_bills,
        crate::inbound::http::billing::get_bill,
        crate::inbound::http::billing::apply_discount,
        crate::inbound::http::billing::record_payment,
        crate::inbound::http::billing::cancel_bill,
        crate::inbound::http::reports::collections,
        crate::inbound::http::reports::stock_alerts,
        crate::inbound::http::reports::visit_summary,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(ErrorSchema, ErrorCodeSchema, PageLinksSchema)),
    tags(
        (name = "staff", description = "Departments, roles and employees"),
        (name = "patients", description = "Patient registration and lookup"),
        (name = "visits", description = "Check-in, consultation and doctor queues"),
        (name = "pharmacy", description = "Products, stock, intents and goods receipts"),
        (name = "counter-sales", description = "Pharmacy counter sales"),
        (name = "billing", description = "Visit bills, payments and reconciliation"),
        (name = "reports", description = "Collections, stock alerts and visit summaries"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
