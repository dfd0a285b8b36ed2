//! Cross-checks between a visit's orders, dispensed stock, and its bill.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::billing::Bill;
use super::pharmacy::{CounterSale, PaymentMode};
use super::visit::Visit;
use super::{BillId, Error, Money, ProductId, VisitId};

/// Order-versus-dispense position for one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationLine {
    /// Product.
    pub product_id: ProductId,
    /// Units prescribed; zero when dispensed without an order.
    pub ordered: u32,
    /// Units sold against the visit.
    pub dispensed: u32,
    /// `max(0, ordered - dispensed)`.
    pub pending: u32,
    /// Current sellable stock.
    pub available: u64,
}

/// Pharmacy charges compared with the bill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BillingReconciliation {
    /// The visit bill, if generated.
    pub bill_id: Option<BillId>,
    /// Total of the visit's `visit_bill` sales.
    pub pharmacy_charged: Money,
    /// Total of pharmacy lines on the bill.
    pub pharmacy_billed: Money,
    /// A bill exists and both totals agree.
    pub bill_in_sync: bool,
}

/// Full reconciliation for one visit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VisitReconciliation {
    /// Visit reconciled.
    pub visit_id: VisitId,
    /// Ordered products first, in order sequence, then unordered ones.
    pub lines: Vec<ReconciliationLine>,
    /// Billing comparison.
    pub billing: BillingReconciliation,
}

/// Reconcile `visit` against its `sales` and optional `bill`.
///
/// `available` reports current sellable stock for a product.
pub fn reconcile_visit(
    visit: &Visit,
    sales: &[CounterSale],
    bill: Option<&Bill>,
    available: impl Fn(ProductId) -> u64,
) -> Result<VisitReconciliation, Error> {
    let mut ordered: Vec<(ProductId, u32)> = Vec::new();
    for order in &visit.medicine_orders {
        match ordered.iter_mut().find(|(id, _)| *id == order.product_id) {
            Some((_, quantity)) => *quantity = quantity.saturating_add(order.quantity),
            None => ordered.push((order.product_id, order.quantity)),
        }
    }
    let mut dispensed: BTreeMap<ProductId, u32> = BTreeMap::new();
    let mut unordered: Vec<ProductId> = Vec::new();
    for line in sales.iter().flat_map(|sale| &sale.items) {
        let entry = dispensed.entry(line.product_id).or_default();
        *entry = entry.saturating_add(line.quantity);
        let known = ordered.iter().any(|(id, _)| *id == line.product_id);
        if !known && !unordered.contains(&line.product_id) {
            unordered.push(line.product_id);
        }
    }

    let lines = ordered
        .into_iter()
        .chain(unordered.into_iter().map(|id| (id, 0)))
        .map(|(product_id, ordered)| {
            let dispensed = dispensed.get(&product_id).copied().unwrap_or(0);
            ReconciliationLine {
                product_id,
                ordered,
                dispensed,
                pending: ordered.saturating_sub(dispensed),
                available: available(product_id),
            }
        })
        .collect();

    let pharmacy_charged = Money::try_sum(
        sales
            .iter()
            .filter(|sale| sale.payment_mode == PaymentMode::VisitBill)
            .map(|sale| sale.total),
    )?;
    let pharmacy_billed = bill.map(Bill::pharmacy_total).transpose()?.unwrap_or(Money::ZERO);
    Ok(VisitReconciliation {
        visit_id: visit.id,
        lines,
        billing: BillingReconciliation {
            bill_id: bill.map(|b| b.id),
            pharmacy_charged,
            pharmacy_billed,
            bill_in_sync: bill.is_some() && pharmacy_charged == pharmacy_billed,
        },
    })
}
