//! Read-only operational reports.

use std::sync::Arc;

use chrono::{DateTime, Days, NaiveDate, Utc};
use mockable::Clock;

use crate::domain::ports::{
    BillRepository, CounterSaleRepository, DepartmentRepository, ProductRepository,
    StockRepository, VisitRepository,
};
use crate::domain::reports::{collection_report, stock_alerts, validate_range, visit_summary};
use crate::domain::service_support::{map_repository_error, map_stock_error};
use crate::domain::{CollectionReport, Error, StockAlerts, VisitSummary};

/// Report settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportServiceConfig {
    /// Batches expiring within this many days are flagged.
    pub near_expiry_days: u32,
}

impl Default for ReportServiceConfig {
    fn default() -> Self {
        Self {
            near_expiry_days: 30,
        }
    }
}

/// Ports used by [`ReportService`].
#[derive(Clone)]
pub struct ReportPorts {
    /// Bills, for payments.
    pub bills: Arc<dyn BillRepository>,
    /// Counter sales.
    pub sales: Arc<dyn CounterSaleRepository>,
    /// Products, for reorder levels and names.
    pub products: Arc<dyn ProductRepository>,
    /// Stock batches.
    pub stock: Arc<dyn StockRepository>,
    /// Visits.
    pub visits: Arc<dyn VisitRepository>,
    /// Departments, for names.
    pub departments: Arc<dyn DepartmentRepository>,
}

/// Builds collection, stock, and visit reports.
#[derive(Clone)]
pub struct ReportService {
    ports: ReportPorts,
    clock: Arc<dyn Clock>,
    config: ReportServiceConfig,
}

impl ReportService {
    /// Create the service.
    pub fn new(ports: ReportPorts, clock: Arc<dyn Clock>, config: ReportServiceConfig) -> Self {
        Self {
            ports,
            clock,
            config,
        }
    }

    /// Takings per day and mode for an inclusive date range.
    pub async fn collections(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<CollectionReport, Error> {
        validate_range(from, to)?;
        let start = start_of(from);
        let end = to
            .checked_add_days(Days::new(1))
            .map_or(DateTime::<Utc>::MAX_UTC, start_of);
        let bills = self
            .ports
            .bills
            .with_payments_between(start, end)
            .await
            .map_err(|e| map_repository_error("bill", e))?;
        let sales = self
            .ports
            .sales
            .created_between(start, end)
            .await
            .map_err(|e| map_repository_error("counter sale", e))?;
        collection_report(from, to, &bills, &sales)
    }

    /// Low-stock, near-expiry, and expired-stock alerts as of today.
    pub async fn stock_alerts(&self) -> Result<StockAlerts, Error> {
        let products = self
            .ports
            .products
            .all()
            .await
            .map_err(|e| map_repository_error("product", e))?;
        let batches = self.ports.stock.all_batches().await.map_err(map_stock_error)?;
        Ok(stock_alerts(
            &products,
            &batches,
            self.clock.utc().date_naive(),
            self.config.near_expiry_days,
        ))
    }

    /// Visit counts by status and department for `date` (default today).
    pub async fn visit_summary(&self, date: Option<NaiveDate>) -> Result<VisitSummary, Error> {
        let date = date.unwrap_or_else(|| self.clock.utc().date_naive());
        let visits = self
            .ports
            .visits
            .on_date(date)
            .await
            .map_err(|e| map_repository_error("visit", e))?;
        let departments = self
            .ports
            .departments
            .all()
            .await
            .map_err(|e| map_repository_error("department", e))?;
        Ok(visit_summary(date, &visits, &departments))
    }
}

fn start_of(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(chrono::NaiveTime::MIN).and_utc()
}

#[cfg(test)]
#[path = "report_service_tests.rs"]
mod tests;
