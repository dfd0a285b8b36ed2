//! Visit bills, discounts, and payments.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use super::pharmacy::{CounterSale, PaymentMode};
use super::validation::{field_error, field_value_error, non_negative_amount, optional_text};
use super::visit::ServiceOrder;
use super::{BillId, Error, Money, PatientId, VisitId};

/// Origin of a bill line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BillItemKind {
    /// Doctor's consultation fee.
    Consultation,
    /// A service order.
    Service,
    /// A counter sale charged to the visit.
    Pharmacy,
}

/// One chargeable line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BillItem {
    /// Line origin.
    pub kind: BillItemKind,
    /// Human-readable description.
    pub description: String,
    /// Source document, e.g. a counter sale number.
    pub reference: Option<String>,
    /// Charge.
    pub amount: Money,
}

/// Settlement state of a bill.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum BillStatus {
    /// Nothing paid.
    Unpaid,
    /// Some amount paid.
    PartiallyPaid,
    /// Net amount paid in full.
    Paid,
    /// Voided before payment.
    Cancelled,
}

impl BillStatus {
    const ALL: [BillStatus; 4] = [Self::Unpaid, Self::PartiallyPaid, Self::Paid, Self::Cancelled];

    /// Wire name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unpaid => "unpaid",
            Self::PartiallyPaid => "partially_paid",
            Self::Paid => "paid",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for BillStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BillStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| field_value_error("status", "invalid_status", s, "unknown bill status"))
    }
}

/// Payment instruments accepted at the billing desk.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Cash.
    Cash,
    /// Card.
    Card,
    /// UPI transfer.
    Upi,
}

impl PaymentMethod {
    /// The equivalent counter-sale mode, used when grouping collections.
    pub const fn as_payment_mode(self) -> PaymentMode {
        match self {
            Self::Cash => PaymentMode::Cash,
            Self::Card => PaymentMode::Card,
            Self::Upi => PaymentMode::Upi,
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_payment_mode().as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(Self::Cash),
            "card" => Ok(Self::Card),
            "upi" => Ok(Self::Upi),
            _ => Err(field_value_error(
                "mode",
                "invalid_payment_mode",
                s,
                "mode must be cash, card, or upi",
            )),
        }
    }
}

/// A recorded payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    /// Amount received.
    pub amount: Money,
    /// Instrument.
    pub mode: PaymentMethod,
    /// Receipt time.
    pub paid_at: DateTime<Utc>,
    /// Card slip or UPI reference.
    pub reference: Option<String>,
}

/// The bill for one visit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Bill {
    /// Stable identifier.
    pub id: BillId,
    /// Document number, e.g. `BILL-000001`.
    pub number: String,
    /// Billed visit; one bill per visit.
    pub visit_id: VisitId,
    /// Billed patient.
    pub patient_id: PatientId,
    /// Charge lines.
    pub items: Vec<BillItem>,
    /// Sum of item amounts.
    pub gross_amount: Money,
    /// Discount, at most the gross amount.
    pub discount: Money,
    /// `gross - discount`.
    pub net_amount: Money,
    /// Sum of payments.
    pub paid_amount: Money,
    /// `net - paid`.
    pub due_amount: Money,
    /// Settlement state.
    pub status: BillStatus,
    /// Payments in the order received.
    pub payments: Vec<Payment>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last change.
    pub updated_at: DateTime<Utc>,
}

/// Outcome of refreshing a bill's items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Items were recomputed and stored.
    Updated,
    /// Items already matched.
    Unchanged,
}

impl Bill {
    /// Open a new unpaid bill.
    pub fn open(
        id: BillId,
        number: String,
        visit_id: VisitId,
        patient_id: PatientId,
        items: Vec<BillItem>,
        now: DateTime<Utc>,
    ) -> Result<Self, Error> {
        let mut bill = Self {
            id,
            number,
            visit_id,
            patient_id,
            items: Vec::new(),
            gross_amount: Money::ZERO,
            discount: Money::ZERO,
            net_amount: Money::ZERO,
            paid_amount: Money::ZERO,
            due_amount: Money::ZERO,
            status: BillStatus::Unpaid,
            payments: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        bill.replace_items(items)?;
        Ok(bill)
    }

    /// Sum of pharmacy lines.
    pub fn pharmacy_total(&self) -> Result<Money, Error> {
        Money::try_sum(
            self.items
                .iter()
                .filter(|item| item.kind == BillItemKind::Pharmacy)
                .map(|item| item.amount),
        )
    }

    /// Recompute items. Bills with payments only accept identical items.
    pub fn refresh(
        &mut self,
        items: Vec<BillItem>,
        now: DateTime<Utc>,
    ) -> Result<RefreshOutcome, Error> {
        self.ensure_not_cancelled()?;
        if self.items == items {
            return Ok(RefreshOutcome::Unchanged);
        }
        if self.paid_amount > Money::ZERO {
            return Err(self.conflict("bill has payments and its charges have changed"));
        }
        self.replace_items(items)?;
        self.updated_at = now;
        Ok(RefreshOutcome::Updated)
    }

    /// Set the discount while nothing is paid.
    pub fn apply_discount(&mut self, discount: Money, now: DateTime<Utc>) -> Result<(), Error> {
        self.ensure_not_cancelled()?;
        if self.paid_amount > Money::ZERO {
            return Err(self.conflict("discount cannot change after payment"));
        }
        let discount = non_negative_amount("discount", discount)?;
        if discount > self.gross_amount {
            return Err(field_error(
                "discount",
                "discount_exceeds_gross",
                "discount must not exceed the gross amount",
            ));
        }
        self.discount = discount;
        self.recompute()?;
        self.updated_at = now;
        Ok(())
    }

    /// Record a payment no larger than the amount due.
    pub fn record_payment(
        &mut self,
        amount: Money,
        mode: PaymentMethod,
        reference: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<(), Error> {
        self.ensure_not_cancelled()?;
        if self.status == BillStatus::Paid {
            return Err(self.conflict("bill is already paid"));
        }
        if amount <= Money::ZERO {
            return Err(field_error(
                "amount",
                "non_positive_amount",
                "amount must be greater than zero",
            ));
        }
        if amount > self.due_amount {
            return Err(field_error("amount", "exceeds_due", "amount must not exceed the amount due")
                .with_details(json!({
                    "field": "amount",
                    "code": "exceeds_due",
                    "due": self.due_amount,
                })));
        }
        self.payments.push(Payment {
            amount,
            mode,
            paid_at: now,
            reference: optional_text("reference", reference, 80)?,
        });
        self.paid_amount = self.paid_amount.try_add(amount)?;
        self.recompute()?;
        self.updated_at = now;
        Ok(())
    }

    /// Void an unpaid bill.
    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<(), Error> {
        if self.status != BillStatus::Unpaid {
            return Err(self.conflict("only unpaid bills can be cancelled"));
        }
        self.status = BillStatus::Cancelled;
        self.updated_at = now;
        Ok(())
    }

    fn replace_items(&mut self, items: Vec<BillItem>) -> Result<(), Error> {
        self.gross_amount = Money::try_sum(items.iter().map(|item| item.amount))?;
        self.items = items;
        self.discount = self.discount.min(self.gross_amount);
        self.recompute()
    }

    fn recompute(&mut self) -> Result<(), Error> {
        self.net_amount = self.gross_amount.try_sub(self.discount)?;
        self.due_amount = self.net_amount.try_sub(self.paid_amount)?;
        if self.status != BillStatus::Cancelled {
            self.status = if self.paid_amount == Money::ZERO {
                BillStatus::Unpaid
            } else if self.due_amount > Money::ZERO {
                BillStatus::PartiallyPaid
            } else {
                BillStatus::Paid
            };
        }
        Ok(())
    }

    fn ensure_not_cancelled(&self) -> Result<(), Error> {
        if self.status == BillStatus::Cancelled {
            return Err(self.conflict("bill is cancelled"));
        }
        Ok(())
    }

    fn conflict(&self, message: &str) -> Error {
        Error::conflict(message).with_details(json!({
            "billId": self.id,
            "status": self.status,
        }))
    }
}

/// Charge lines for a visit: the consultation fee, each service order, and
/// each counter sale charged to the visit bill.
pub fn compose_bill_items(
    doctor_name: &str,
    consultation_fee: Option<Money>,
    service_orders: &[ServiceOrder],
    sales: &[CounterSale],
) -> Vec<BillItem> {
    let consultation = consultation_fee.map(|fee| BillItem {
        kind: BillItemKind::Consultation,
        description: format!("Consultation: {doctor_name}"),
        reference: None,
        amount: fee,
    });
    let services = service_orders.iter().map(|order| BillItem {
        kind: BillItemKind::Service,
        description: order.name.clone(),
        reference: None,
        amount: order.charge,
    });
    let pharmacy = sales
        .iter()
        .filter(|sale| sale.payment_mode == PaymentMode::VisitBill)
        .map(|sale| BillItem {
            kind: BillItemKind::Pharmacy,
            description: "Pharmacy".to_owned(),
            reference: Some(sale.number.clone()),
            amount: sale.total,
        });
    consultation.into_iter().chain(services).chain(pharmacy).collect()
}

#[cfg(test)]
mod tests;
