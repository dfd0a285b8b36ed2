//! Visit billing, payments, and order reconciliation.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use mockable::Clock;
use pagination::PageRequest;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domain::idempotency::hash_payload;
use crate::domain::pharmacy::available_quantity;
use crate::domain::ports::{
    BillFilter, BillRepository, CounterSaleRepository, EmployeeRepository, JobQueue, ListSlice,
    SequenceGenerator, StockRepository, VisitRepository,
};
use crate::domain::reconciliation::reconcile_visit;
use crate::domain::service_support::{
    dispatch_job, map_repository_error, map_stock_error, next_document_number, not_found,
};
use crate::domain::{
    Bill, BillId, BillStatus, Error, IdempotencyGuard, IdempotencyKey, Idempotent,
    IdempotentRequest, Job, Money, MutationType, PaymentMethod, RefreshOutcome, SequenceKind,
    Visit, VisitId, VisitReconciliation, VisitStatus, compose_bill_items,
};

/// A bill after generation, and whether it was newly opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedBill {
    /// Current bill.
    pub bill: Bill,
    /// `true` when this call opened the bill.
    pub created: bool,
}

/// A payment against a bill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    /// Amount paid.
    pub amount: Money,
    /// Settlement mode.
    pub mode: PaymentMethod,
    /// Receipt or transaction reference.
    pub reference: Option<String>,
}

/// Ports used by [`BillingService`].
#[derive(Clone)]
pub struct BillingPorts {
    /// Bill storage.
    pub bills: Arc<dyn BillRepository>,
    /// Visits being billed.
    pub visits: Arc<dyn VisitRepository>,
    /// Doctors, for consultation fees.
    pub employees: Arc<dyn EmployeeRepository>,
    /// Counter sales charged to visits.
    pub sales: Arc<dyn CounterSaleRepository>,
    /// Stock, for reconciliation.
    pub stock: Arc<dyn StockRepository>,
    /// Bill numbers.
    pub sequences: Arc<dyn SequenceGenerator>,
    /// Settlement notifications.
    pub jobs: Arc<dyn JobQueue>,
}

/// Billing service.
#[derive(Clone)]
pub struct BillingService {
    ports: BillingPorts,
    idempotency: IdempotencyGuard,
    clock: Arc<dyn Clock>,
}

impl BillingService {
    /// Create the service.
    pub fn new(ports: BillingPorts, idempotency: IdempotencyGuard, clock: Arc<dyn Clock>) -> Self {
        Self {
            ports,
            idempotency,
            clock,
        }
    }

    /// Open the visit's bill, or recompute the items of an existing one.
    pub async fn generate(&self, visit_id: VisitId) -> Result<GeneratedBill, Error> {
        let now = self.clock.utc();
        let visit = self.visit(visit_id).await?;
        if visit.status == VisitStatus::Cancelled {
            warn!(%visit_id, "bill requested for cancelled visit");
            return Err(Error::conflict("cannot bill a cancelled visit"));
        }
        let doctor = self
            .ports
            .employees
            .find(visit.doctor_id)
            .await
            .map_err(|e| map_repository_error("employee", e))?
            .ok_or_else(|| not_found("doctor", visit.doctor_id))?;
        let sales = self
            .ports
            .sales
            .for_visit(visit_id)
            .await
            .map_err(|e| map_repository_error("counter sale", e))?;
        let items = compose_bill_items(
            &doctor.full_name(),
            doctor.consultation_fee,
            &visit.service_orders,
            &sales,
        );

        if let Some(mut bill) = self.find_by_visit(visit_id).await? {
            let read = bill.clone();
            let outcome = bill.refresh(items, now)?;
            if outcome == RefreshOutcome::Updated {
                self.save(&read, &bill).await?;
                info!(bill_id = %bill.id, number = %bill.number, "bill refreshed");
            }
            return Ok(GeneratedBill {
                bill,
                created: false,
            });
        }

        let number =
            next_document_number(self.ports.sequences.as_ref(), SequenceKind::Bill).await?;
        let bill = Bill::open(
            BillId::random(),
            number,
            visit_id,
            visit.patient_id,
            items,
            now,
        )?;
        self.ports
            .bills
            .create(&bill)
            .await
            .map_err(|e| map_repository_error("bill", e))?;
        info!(
            bill_id = %bill.id,
            number = %bill.number,
            gross = bill.gross_amount.minor(),
            "bill opened"
        );
        Ok(GeneratedBill {
            bill,
            created: true,
        })
    }

    /// Set the discount on an unpaid bill.
    pub async fn apply_discount(&self, id: BillId, discount: Money) -> Result<Bill, Error> {
        let read = self.get(id).await?;
        let mut bill = read.clone();
        bill.apply_discount(discount, self.clock.utc())?;
        self.save(&read, &bill).await?;
        info!(bill_id = %id, discount = discount.minor(), "discount applied");
        Ok(bill)
    }

    /// Record a payment. With a key, a repeated request replays the bill as
    /// it stood after the original payment.
    pub async fn record_payment(
        &self,
        id: BillId,
        payment: PaymentRequest,
        key: Option<IdempotencyKey>,
    ) -> Result<Idempotent<Bill>, Error> {
        let payload_hash = hash_payload(&(id, &payment))?;
        let request = IdempotentRequest {
            key,
            mutation_type: MutationType::BillPayments,
            payload_hash,
        };
        self.idempotency
            .run(request, move || self.apply_payment(id, payment))
            .await
    }

    async fn apply_payment(&self, id: BillId, payment: PaymentRequest) -> Result<Bill, Error> {
        let read = self.get(id).await?;
        let mut bill = read.clone();
        if let Err(error) = bill.record_payment(
            payment.amount,
            payment.mode,
            payment.reference.as_deref(),
            self.clock.utc(),
        ) {
            warn!(bill_id = %id, amount = payment.amount.minor(), "payment rejected");
            return Err(error);
        }
        self.save(&read, &bill).await?;
        info!(
            bill_id = %id,
            amount = payment.amount.minor(),
            mode = %payment.mode,
            status = %bill.status,
            "payment recorded"
        );
        if bill.status == BillStatus::Paid {
            dispatch_job(
                self.ports.jobs.as_ref(),
                Job::BillSettled {
                    bill_id: bill.id,
                    visit_id: bill.visit_id,
                },
            )
            .await;
        }
        Ok(bill)
    }

    /// Void an unpaid bill.
    pub async fn cancel(&self, id: BillId) -> Result<Bill, Error> {
        let read = self.get(id).await?;
        let mut bill = read.clone();
        bill.cancel(self.clock.utc())?;
        self.save(&read, &bill).await?;
        info!(bill_id = %id, number = %bill.number, "bill cancelled");
        Ok(bill)
    }

    /// Fetch one bill.
    pub async fn get(&self, id: BillId) -> Result<Bill, Error> {
        self.ports
            .bills
            .find(id)
            .await
            .map_err(|e| map_repository_error("bill", e))?
            .ok_or_else(|| not_found("bill", id))
    }

    /// The visit's bill.
    pub async fn for_visit(&self, visit_id: VisitId) -> Result<Bill, Error> {
        self.visit(visit_id).await?;
        self.find_by_visit(visit_id)
            .await?
            .ok_or_else(|| not_found("bill for visit", visit_id))
    }

    /// List bills.
    pub async fn list(
        &self,
        filter: &BillFilter,
        page: PageRequest,
    ) -> Result<ListSlice<Bill>, Error> {
        self.ports
            .bills
            .list(filter, page)
            .await
            .map_err(|e| map_repository_error("bill", e))
    }

    /// Compare the visit's medicine orders with what was dispensed and
    /// billed.
    pub async fn reconcile(&self, visit_id: VisitId) -> Result<VisitReconciliation, Error> {
        let visit = self.visit(visit_id).await?;
        let sales = self
            .ports
            .sales
            .for_visit(visit_id)
            .await
            .map_err(|e| map_repository_error("counter sale", e))?;
        let bill = self.find_by_visit(visit_id).await?;

        let products: BTreeSet<_> = visit
            .medicine_orders
            .iter()
            .map(|order| order.product_id)
            .chain(sales.iter().flat_map(|s| s.items.iter().map(|l| l.product_id)))
            .collect();
        let today = self.clock.utc().date_naive();
        let mut available = BTreeMap::new();
        for product_id in products {
            let batches = self
                .ports
                .stock
                .batches_for(product_id)
                .await
                .map_err(map_stock_error)?;
            available.insert(product_id, available_quantity(&batches, product_id, today));
        }
        reconcile_visit(&visit, &sales, bill.as_ref(), |id| {
            available.get(&id).copied().unwrap_or(0)
        })
    }

    async fn visit(&self, id: VisitId) -> Result<Visit, Error> {
        self.ports
            .visits
            .find(id)
            .await
            .map_err(|e| map_repository_error("visit", e))?
            .ok_or_else(|| not_found("visit", id))
    }

    async fn find_by_visit(&self, visit_id: VisitId) -> Result<Option<Bill>, Error> {
        self.ports
            .bills
            .find_by_visit(visit_id)
            .await
            .map_err(|e| map_repository_error("bill", e))
    }

    /// Write `bill` over the copy read earlier. A concurrent change to the
    /// same bill surfaces as a conflict.
    async fn save(&self, read: &Bill, bill: &Bill) -> Result<(), Error> {
        self.ports
            .bills
            .update(read, bill)
            .await
            .map_err(|e| map_repository_error("bill", e))
    }
}

#[cfg(test)]
#[path = "billing_service_tests.rs"]
mod tests;
