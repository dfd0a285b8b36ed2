//! Counter sales: availability checks, FEFO allocation, and stock deduction.

use std::sync::Arc;

use chrono::NaiveDate;
use mockable::Clock;
use pagination::PageRequest;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::domain::idempotency::hash_payload;
use crate::domain::pharmacy::{allocate_fefo, available_quantity, merge_lines, shortage_error};
use crate::domain::ports::{
    BillRepository, CounterSaleFilter, CounterSaleRepository, JobQueue, ListSlice,
    PatientRepository, ProductRepository, SequenceGenerator, StockDeduction, StockRepository,
    VisitRepository,
};
use crate::domain::service_support::{
    dispatch_job, map_repository_error, map_stock_error, next_document_number, not_found,
};
use crate::domain::validation::field_value_error;
use crate::domain::{
    AvailabilityLine, BillStatus, CounterSale, CounterSaleDraft, CounterSaleId, Error,
    IdempotencyGuard, IdempotencyKey, Idempotent, IdempotentRequest, Job, Money, MutationType,
    PatientId, PaymentMode, Product, SaleLine, SaleLineRequest, SequenceKind, Shortage,
    StockBatch, VisitStatus,
};

/// Dry-run outcome for a prospective sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaleAvailability {
    /// One entry per merged product line.
    pub lines: Vec<AvailabilityLine>,
    /// `true` when every line is sufficient.
    pub sufficient: bool,
}

/// Stock position of one merged line, read once per sale.
struct LineStock {
    request: SaleLineRequest,
    product: Option<Product>,
    batches: Vec<StockBatch>,
    available: u64,
}

/// Counter sale service.
#[derive(Clone)]
pub struct CounterSaleService {
    sales: Arc<dyn CounterSaleRepository>,
    products: Arc<dyn ProductRepository>,
    stock: Arc<dyn StockRepository>,
    visits: Arc<dyn VisitRepository>,
    patients: Arc<dyn PatientRepository>,
    bills: Arc<dyn BillRepository>,
    sequences: Arc<dyn SequenceGenerator>,
    jobs: Arc<dyn JobQueue>,
    idempotency: IdempotencyGuard,
    clock: Arc<dyn Clock>,
}

/// Ports used by [`CounterSaleService`].
#[derive(Clone)]
pub struct CounterSalePorts {
    /// Sale storage.
    pub sales: Arc<dyn CounterSaleRepository>,
    /// Product catalogue.
    pub products: Arc<dyn ProductRepository>,
    /// Stock batches.
    pub stock: Arc<dyn StockRepository>,
    /// Visits, for visit-linked sales.
    pub visits: Arc<dyn VisitRepository>,
    /// Patients, for walk-in sales naming a patient.
    pub patients: Arc<dyn PatientRepository>,
    /// Bills, to refuse charging a settled bill.
    pub bills: Arc<dyn BillRepository>,
    /// Document numbers.
    pub sequences: Arc<dyn SequenceGenerator>,
    /// Low-stock notifications.
    pub jobs: Arc<dyn JobQueue>,
}

impl CounterSaleService {
    /// Create the service.
    pub fn new(
        ports: CounterSalePorts,
        idempotency: IdempotencyGuard,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            sales: ports.sales,
            products: ports.products,
            stock: ports.stock,
            visits: ports.visits,
            patients: ports.patients,
            bills: ports.bills,
            sequences: ports.sequences,
            jobs: ports.jobs,
            idempotency,
            clock,
        }
    }

    /// Report availability and the proposed allocation without changing stock.
    pub async fn check_availability(
        &self,
        lines: &[SaleLineRequest],
    ) -> Result<SaleAvailability, Error> {
        let merged = merge_lines(lines)?;
        let today = self.clock.utc().date_naive();
        let mut result = Vec::with_capacity(merged.len());
        for stock in self.read_stock(&merged, today).await? {
            result.push(AvailabilityLine {
                product_id: stock.request.product_id,
                requested: stock.request.quantity,
                available: stock.available,
                sufficient: stock.available >= u64::from(stock.request.quantity),
                allocations: allocate_fefo(&stock.batches, stock.request.quantity, today)?,
            });
        }
        let sufficient = result.iter().all(|line| line.sufficient);
        Ok(SaleAvailability {
            lines: result,
            sufficient,
        })
    }

    /// Record a sale, deducting stock first-expiry-first-out.
    ///
    /// With a key, a repeated identical request replays the stored sale.
    pub async fn create(
        &self,
        draft: CounterSaleDraft,
        key: Option<IdempotencyKey>,
    ) -> Result<Idempotent<CounterSale>, Error> {
        let payload_hash = hash_payload(&json!({
            "patientId": draft.patient_id,
            "visitId": draft.visit_id,
            "items": draft.lines,
            "discount": draft.discount,
            "paymentMode": draft.payment_mode,
        }))?;
        let request = IdempotentRequest {
            key,
            mutation_type: MutationType::CounterSales,
            payload_hash,
        };
        self.idempotency
            .run(request, move || self.record_sale(draft))
            .await
    }

    async fn record_sale(&self, draft: CounterSaleDraft) -> Result<CounterSale, Error> {
        let now = self.clock.utc();
        let today = now.date_naive();
        let patient_id = self.resolve_patient(&draft).await?;
        let stock = self.read_stock(&draft.lines, today).await?;
        for line in &stock {
            match &line.product {
                Some(product) if product.is_active => {}
                Some(_) => {
                    return Err(product_error(
                        line.request,
                        "inactive_product",
                        "product is inactive",
                    ));
                }
                None => {
                    return Err(product_error(
                        line.request,
                        "unknown_product",
                        "product does not exist",
                    ));
                }
            }
        }

        let shortages: Vec<Shortage> = stock
            .iter()
            .filter(|line| line.available < u64::from(line.request.quantity))
            .map(|line| Shortage {
                product_id: line.request.product_id,
                requested: line.request.quantity,
                available: line.available,
            })
            .collect();
        if !shortages.is_empty() {
            warn!(short = shortages.len(), "counter sale rejected for insufficient stock");
            return Err(shortage_error(&shortages));
        }

        let mut items = Vec::with_capacity(stock.len());
        for line in &stock {
            let allocations = allocate_fefo(&line.batches, line.request.quantity, today)?;
            let amount = Money::try_sum(allocations.iter().map(|a| a.amount))?;
            items.push(SaleLine {
                product_id: line.request.product_id,
                quantity: line.request.quantity,
                allocations,
                amount,
            });
        }
        let (subtotal, total) = draft.totals(&items)?;

        let number =
            next_document_number(self.sequences.as_ref(), SequenceKind::CounterSale).await?;
        let deductions: Vec<StockDeduction> = items
            .iter()
            .flat_map(|line| &line.allocations)
            .map(|a| StockDeduction {
                batch_id: a.batch_id,
                quantity: a.quantity,
            })
            .collect();
        if let Err(error) = self.stock.deduct(&deductions).await {
            warn!(%number, %error, "stock deduction failed; sale not recorded");
            return Err(map_stock_error(error));
        }

        let sale = CounterSale {
            id: CounterSaleId::random(),
            number,
            patient_id,
            visit_id: draft.visit_id,
            items,
            subtotal,
            discount: draft.discount,
            total,
            payment_mode: draft.payment_mode,
            created_at: now,
        };
        self.sales
            .create(&sale)
            .await
            .map_err(|e| map_repository_error("counter sale", e))?;
        info!(
            sale_id = %sale.id,
            number = %sale.number,
            total = sale.total.minor(),
            mode = %sale.payment_mode,
            "counter sale recorded"
        );
        self.flag_low_stock(&stock).await;
        Ok(sale)
    }

    /// The sale's patient: the visit's patient when a visit is linked,
    /// otherwise the explicit patient.
    async fn resolve_patient(&self, draft: &CounterSaleDraft) -> Result<Option<PatientId>, Error> {
        let Some(visit_id) = draft.visit_id else {
            if let Some(patient_id) = draft.patient_id {
                self.patients
                    .find(patient_id)
                    .await
                    .map_err(|e| map_repository_error("patient", e))?
                    .ok_or_else(|| not_found("patient", patient_id))?;
            }
            return Ok(draft.patient_id);
        };
        let visit = self
            .visits
            .find(visit_id)
            .await
            .map_err(|e| map_repository_error("visit", e))?
            .ok_or_else(|| not_found("visit", visit_id))?;
        if let Some(explicit) = draft.patient_id
            && explicit != visit.patient_id
        {
            return Err(field_value_error(
                "patientId",
                "patient_mismatch",
                explicit.to_string(),
                "patientId must match the visit's patient",
            ));
        }
        if draft.payment_mode == PaymentMode::VisitBill {
            if visit.status == VisitStatus::Cancelled {
                return Err(Error::conflict("cannot charge a cancelled visit")
                    .with_details(json!({ "visitId": visit_id, "status": visit.status })));
            }
            let bill = self
                .bills
                .find_by_visit(visit_id)
                .await
                .map_err(|e| map_repository_error("bill", e))?;
            if let Some(bill) = bill
                && matches!(bill.status, BillStatus::Paid | BillStatus::Cancelled)
            {
                return Err(Error::conflict("the visit's bill is closed")
                    .with_details(json!({ "billId": bill.id, "status": bill.status })));
            }
        }
        Ok(Some(visit.patient_id))
    }

    async fn read_stock(
        &self,
        lines: &[SaleLineRequest],
        today: NaiveDate,
    ) -> Result<Vec<LineStock>, Error> {
        let mut stock = Vec::with_capacity(lines.len());
        for request in lines {
            let product = self
                .products
                .find(request.product_id)
                .await
                .map_err(|e| map_repository_error("product", e))?;
            let batches = self
                .stock
                .batches_for(request.product_id)
                .await
                .map_err(map_stock_error)?;
            let available = available_quantity(&batches, request.product_id, today);
            stock.push(LineStock {
                request: *request,
                product,
                batches,
                available,
            });
        }
        Ok(stock)
    }

    async fn flag_low_stock(&self, stock: &[LineStock]) {
        for line in stock {
            let Some(product) = &line.product else {
                continue;
            };
            let threshold = u64::from(product.reorder_level);
            let remaining = line.available.saturating_sub(u64::from(line.request.quantity));
            // Only the sale that crosses the threshold raises the alert.
            if line.available >= threshold && remaining < threshold {
                info!(product_id = %product.id, remaining, "product below reorder level");
                dispatch_job(
                    self.jobs.as_ref(),
                    Job::LowStock {
                        product_id: product.id,
                        available: remaining,
                        reorder_level: product.reorder_level,
                    },
                )
                .await;
            }
        }
    }

    /// Fetch one sale.
    pub async fn get(&self, id: CounterSaleId) -> Result<CounterSale, Error> {
        self.sales
            .find(id)
            .await
            .map_err(|e| map_repository_error("counter sale", e))?
            .ok_or_else(|| not_found("counter sale", id))
    }

    /// List sales.
    pub async fn list(
        &self,
        filter: &CounterSaleFilter,
        page: PageRequest,
    ) -> Result<ListSlice<CounterSale>, Error> {
        self.sales
            .list(filter, page)
            .await
            .map_err(|e| map_repository_error("counter sale", e))
    }
}

fn product_error(line: SaleLineRequest, code: &str, message: &str) -> Error {
    field_value_error("items.productId", code, line.product_id.to_string(), message)
}

#[cfg(test)]
#[path = "counter_sale_service_tests.rs"]
mod tests;
