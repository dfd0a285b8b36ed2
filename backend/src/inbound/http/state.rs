//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain services and remain testable with in-memory adapters.

use std::sync::Arc;

use chrono::NaiveDate;
use mockable::Clock;
use pagination::PageLimits;

use crate::domain::{
    BillingService, CounterSaleService, PatientService, PharmacyService, ReportService,
    StaffService, VisitService,
};

/// Parameter object bundling the domain services exposed over HTTP.
#[derive(Clone)]
pub struct HttpStateServices {
    pub staff: StaffService,
    pub patients: PatientService,
    pub visits: VisitService,
    pub pharmacy: PharmacyService,
    pub counter_sales: CounterSaleService,
    pub billing: BillingService,
    pub reports: ReportService,
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub staff: StaffService,
    pub patients: PatientService,
    pub visits: VisitService,
    pub pharmacy: PharmacyService,
    pub counter_sales: CounterSaleService,
    pub billing: BillingService,
    pub reports: ReportService,
    pub page_limits: PageLimits,
    clock: Arc<dyn Clock>,
}

impl HttpState {
    /// Construct state from the service bundle.
    pub fn new(
        services: HttpStateServices,
        page_limits: PageLimits,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let HttpStateServices {
            staff,
            patients,
            visits,
            pharmacy,
            counter_sales,
            billing,
            reports,
        } = services;
        Self {
            staff,
            patients,
            visits,
            pharmacy,
            counter_sales,
            billing,
            reports,
            page_limits,
            clock,
        }
    }

    /// Current UTC date, used where request validation depends on "today".
    pub fn today(&self) -> NaiveDate {
        self.clock.utc().date_naive()
    }
}
