//! Read-only operational reports assembled from repository snapshots.

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use super::billing::{Bill, PaymentMethod};
use super::pharmacy::{CounterSale, PaymentMode, Product, StockBatch, available_quantity};
use super::staff::Department;
use super::visit::{Visit, VisitStatus};
use super::{BatchId, DepartmentId, Error, Money, ProductId};

/// Longest collection report, in days, inclusive of both ends.
pub const MAX_COLLECTION_DAYS: u64 = 92;

/// Amounts per counter payment mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ModeTotals {
    /// Cash.
    pub cash: Money,
    /// Card.
    pub card: Money,
    /// UPI.
    pub upi: Money,
}

impl ModeTotals {
    fn add(&mut self, mode: PaymentMode, amount: Money) -> Result<(), Error> {
        let slot = match mode {
            PaymentMode::Cash => &mut self.cash,
            PaymentMode::Card => &mut self.card,
            PaymentMode::Upi => &mut self.upi,
            PaymentMode::VisitBill => return Ok(()),
        };
        *slot = slot.try_add(amount)?;
        Ok(())
    }

    /// Sum across modes.
    pub fn total(&self) -> Result<Money, Error> {
        Money::try_sum([self.cash, self.card, self.upi])
    }
}

/// Money collected on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailyCollection {
    /// Day (UTC).
    pub date: NaiveDate,
    /// Bill payments by mode.
    pub bill_payments: ModeTotals,
    /// Directly settled counter sales by mode.
    pub counter_sales: ModeTotals,
    /// Both sources combined.
    pub total: Money,
}

/// Collections over an inclusive date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CollectionReport {
    /// First day.
    pub from: NaiveDate,
    /// Last day.
    pub to: NaiveDate,
    /// One entry per day, including days with no takings.
    pub days: Vec<DailyCollection>,
    /// Sum of every day.
    pub grand_total: Money,
}

/// Check a report range: `from <= to`, at most [`MAX_COLLECTION_DAYS`].
pub fn validate_range(from: NaiveDate, to: NaiveDate) -> Result<(), Error> {
    if from > to {
        return Err(Error::invalid_request("from must not be after to").with_details(json!({
            "field": "from",
            "code": "invalid_range",
        })));
    }
    let span = u64::try_from((to - from).num_days()).unwrap_or(u64::MAX) + 1;
    if span > MAX_COLLECTION_DAYS {
        return Err(Error::invalid_request(format!(
            "date range must not exceed {MAX_COLLECTION_DAYS} days"
        ))
        .with_details(json!({ "field": "to", "code": "range_too_long", "days": span })));
    }
    Ok(())
}

/// Build the collection report from bills and counter sales.
pub fn collection_report(
    from: NaiveDate,
    to: NaiveDate,
    bills: &[Bill],
    sales: &[CounterSale],
) -> Result<CollectionReport, Error> {
    validate_range(from, to)?;
    let mut days: BTreeMap<NaiveDate, (ModeTotals, ModeTotals)> = BTreeMap::new();
    let mut day = from;
    while day <= to {
        days.insert(day, Default::default());
        day = match day.checked_add_days(Days::new(1)) {
            Some(next) => next,
            None => break,
        };
    }
    for payment in bills.iter().flat_map(|bill| &bill.payments) {
        if let Some((billed, _)) = days.get_mut(&payment.paid_at.date_naive()) {
            billed.add(PaymentMethod::as_payment_mode(payment.mode), payment.amount)?;
        }
    }
    for sale in sales {
        if let Some((_, counter)) = days.get_mut(&sale.created_at.date_naive()) {
            counter.add(sale.payment_mode, sale.total)?;
        }
    }
    let days = days
        .into_iter()
        .map(|(date, (bill_payments, counter_sales))| {
            Ok(DailyCollection {
                date,
                total: bill_payments.total()?.try_add(counter_sales.total()?)?,
                bill_payments,
                counter_sales,
            })
        })
        .collect::<Result<Vec<_>, Error>>()?;
    let grand_total = Money::try_sum(days.iter().map(|d| d.total))?;
    Ok(CollectionReport {
        from,
        to,
        days,
        grand_total,
    })
}

/// Product below its reorder level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LowStockAlert {
    /// Product.
    pub product_id: ProductId,
    /// Product name.
    pub product_name: String,
    /// Sellable units.
    pub available: u64,
    /// Reorder threshold.
    pub reorder_level: u32,
}

/// Batch nearing or past expiry with stock on hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchAlert {
    /// Batch.
    pub batch_id: BatchId,
    /// Product.
    pub product_id: ProductId,
    /// Product name.
    pub product_name: String,
    /// Batch number.
    pub batch_number: String,
    /// Expiry date.
    pub expiry_date: NaiveDate,
    /// Units on hand.
    pub quantity_available: u32,
}

/// Pharmacy stock alerts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StockAlerts {
    /// Report date.
    pub as_of: NaiveDate,
    /// Active products below reorder level, by name.
    pub low_stock: Vec<LowStockAlert>,
    /// Batches expiring within the window, earliest first.
    pub near_expiry: Vec<BatchAlert>,
    /// Expired batches still holding stock, earliest first.
    pub expired: Vec<BatchAlert>,
}

/// Build stock alerts as of `today`.
pub fn stock_alerts(
    products: &[Product],
    batches: &[StockBatch],
    today: NaiveDate,
    near_expiry_days: u32,
) -> StockAlerts {
    let names: BTreeMap<ProductId, &str> =
        products.iter().map(|p| (p.id, p.name.as_str())).collect();
    let horizon = today
        .checked_add_days(Days::new(u64::from(near_expiry_days)))
        .unwrap_or(NaiveDate::MAX);

    let mut low_stock: Vec<LowStockAlert> = products
        .iter()
        .filter(|p| p.is_active)
        .filter_map(|p| {
            let available = available_quantity(batches, p.id, today);
            (available < u64::from(p.reorder_level)).then(|| LowStockAlert {
                product_id: p.id,
                product_name: p.name.clone(),
                available,
                reorder_level: p.reorder_level,
            })
        })
        .collect();
    low_stock.sort_by(|a, b| a.product_name.cmp(&b.product_name));

    let alert = |batch: &StockBatch| BatchAlert {
        batch_id: batch.id,
        product_id: batch.product_id,
        product_name: names.get(&batch.product_id).copied().unwrap_or_default().to_owned(),
        batch_number: batch.batch_number.clone(),
        expiry_date: batch.expiry_date,
        quantity_available: batch.quantity_available,
    };
    let mut stocked: Vec<&StockBatch> = batches
        .iter()
        .filter(|b| b.quantity_available > 0)
        .collect();
    stocked.sort_by_key(|b| (b.expiry_date, b.batch_number.clone()));
    let near_expiry = stocked
        .iter()
        .filter(|b| !b.is_expired(today) && b.expiry_date <= horizon)
        .map(|b| alert(b))
        .collect();
    let expired = stocked
        .iter()
        .filter(|b| b.is_expired(today))
        .map(|b| alert(b))
        .collect();
    StockAlerts {
        as_of: today,
        low_stock,
        near_expiry,
        expired,
    }
}

/// Visits in one status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusCount {
    /// Status.
    pub status: VisitStatus,
    /// Visit count.
    pub count: u32,
}

/// Visits in one department.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentCount {
    /// Department.
    pub department_id: DepartmentId,
    /// Department name.
    pub department_name: String,
    /// Visit count.
    pub count: u32,
}

/// Visit counts for one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VisitSummary {
    /// Day summarised.
    pub date: NaiveDate,
    /// All visits that day.
    pub total: u32,
    /// Every status, in lifecycle order, including zero counts.
    pub by_status: Vec<StatusCount>,
    /// Departments with at least one visit, by name.
    pub by_department: Vec<DepartmentCount>,
}

/// Summarise `visits` held on `date`.
pub fn visit_summary(
    date: NaiveDate,
    visits: &[Visit],
    departments: &[Department],
) -> VisitSummary {
    let day: Vec<&Visit> = visits.iter().filter(|v| v.visit_date == date).collect();
    let count = |n: usize| u32::try_from(n).unwrap_or(u32::MAX);
    let by_status = VisitStatus::ALL
        .into_iter()
        .map(|status| StatusCount {
            status,
            count: count(day.iter().filter(|v| v.status == status).count()),
        })
        .collect();
    let mut per_department: BTreeMap<DepartmentId, usize> = BTreeMap::new();
    for visit in &day {
        *per_department.entry(visit.department_id).or_default() += 1;
    }
    let mut by_department: Vec<DepartmentCount> = per_department
        .into_iter()
        .map(|(department_id, n)| DepartmentCount {
            department_id,
            department_name: departments
                .iter()
                .find(|d| d.id == department_id)
                .map(|d| d.name.clone())
                .unwrap_or_default(),
            count: count(n),
        })
        .collect();
    by_department.sort_by(|a, b| a.department_name.cmp(&b.department_name));
    VisitSummary {
        date,
        total: count(day.len()),
        by_status,
        by_department,
    }
}

#[cfg(test)]
mod tests;
