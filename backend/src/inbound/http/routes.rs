//! Route table for the `/api/v1` scope.
//!
//! Shared by the server and by handler tests so both see the same routes and
//! extractor error handling.

use actix_web::web;

use super::error::{json_error_handler, path_error_handler, query_error_handler};
use super::{billing, counter_sales, patients, pharmacy, reports, staff, visits};

/// Register every API handler and the extractor error mappers.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(query_error_handler))
        .app_data(web::PathConfig::default().error_handler(path_error_handler))
        // staff
        .service(staff::create_department)
        .service(staff::list_departments)
        .service(staff::get_department)
        .service(staff::update_department)
        .service(staff::activate_department)
        .service(staff::deactivate_department)
        .service(staff::create_role)
        .service(staff::list_roles)
        .service(staff::get_role)
        .service(staff::update_role)
        .service(staff::delete_role)
        .service(staff::create_employee)
        .service(staff::list_employees)
        .service(staff::get_employee)
        .service(staff::update_employee)
        .service(staff::activate_employee)
        .service(staff::deactivate_employee)
        // patients; the UHID route precedes `{id}`
        .service(patients::register_patient)
        .service(patients::search_patients)
        .service(patients::get_patient_by_uhid)
        .service(patients::get_patient)
        .service(patients::update_patient)
        // visits
        .service(visits::check_in)
        .service(visits::list_visits)
        .service(visits::get_visit)
        .service(visits::start_consultation)
        .service(visits::complete_visit)
        .service(visits::cancel_visit)
        .service(visits::record_vitals)
        .service(visits::record_assessment)
        .service(visits::replace_orders)
        .service(visits::visit_eta)
        .service(visits::doctor_queue)
        // pharmacy
        .service(pharmacy::create_product)
        .service(pharmacy::list_products)
        .service(pharmacy::get_product)
        .service(pharmacy::update_product)
        .service(pharmacy::deactivate_product)
        .service(pharmacy::product_stock)
        .service(pharmacy::create_intent)
        .service(pharmacy::list_intents)
        .service(pharmacy::get_intent)
        .service(pharmacy::cancel_intent)
        .service(pharmacy::receive_grn)
        .service(pharmacy::list_grns)
        .service(pharmacy::get_grn)
        // counter sales
        .service(counter_sales::check_availability)
        .service(counter_sales::create_counter_sale)
        .service(counter_sales::list_counter_sales)
        .service(counter_sales::get_counter_sale)
        // billing
        .service(billing::generate_bill)
        .service(billing::get_visit_bill)
        .service(billing::reconcile_visit)
        .service(billing::list_bills)
        .service(billing::get_bill)
        .service(billing::apply_discount)
        .service(billing::record_payment)
        .service(billing::cancel_bill)
        // reports
        .service(reports::collections)
        .service(reports::stock_alerts)
        .service(reports::visit_summary);
}
