//! Domain primitives, aggregates, and services.
//!
//! Purpose: hold the hospital's business rules independent of transport and
//! storage. Entities validate their own invariants; services orchestrate
//! ports; adapters live in `crate::inbound` and `crate::outbound`.
//!
//! Public surface:
//! - Error / ErrorCode: transport-agnostic failure payload.
//! - Entities per module (staff, patient, visit, pharmacy, billing).
//! - Services wrapping the repository ports in [`ports`].

pub mod billing;
pub mod error;
pub mod idempotency;
pub mod ids;
pub mod jobs;
pub mod money;
pub mod numbering;
pub mod patient;
pub mod pharmacy;
pub mod ports;
pub mod reconciliation;
pub mod reports;
pub mod staff;
pub mod trace_id;
pub mod validation;
pub mod visit;

mod billing_service;
mod counter_sale_service;
#[cfg(test)]
pub(crate) mod fixtures;
mod patient_service;
mod pharmacy_service;
mod report_service;
pub(crate) mod service_support;
mod staff_service;
mod visit_service;

pub use self::billing::{
    Bill, BillItem, BillItemKind, BillStatus, Payment, PaymentMethod, RefreshOutcome,
    compose_bill_items,
};
pub use self::billing_service::{BillingPorts, BillingService, GeneratedBill, PaymentRequest};
pub use self::counter_sale_service::{CounterSalePorts, CounterSaleService, SaleAvailability};
pub use self::error::{Error, ErrorCode};
pub use self::idempotency::{
    IdempotencyConfig, IdempotencyGuard, IdempotencyKey, IdempotencyKeyValidationError, Idempotent,
    IdempotentRequest, MutationType, PayloadHash,
};
pub use self::ids::{
    BatchId, BillId, CounterSaleId, DepartmentId, EmployeeId, GrnId, IdParseError, IntentId,
    PatientId, ProductId, RoleId, VisitId,
};
pub use self::jobs::Job;
pub use self::money::Money;
pub use self::numbering::SequenceKind;
pub use self::patient::{
    BloodGroup, EmergencyContact, Gender, Patient, PatientDraft, PatientInput,
};
pub use self::patient_service::{PatientService, PatientServiceConfig};
pub use self::pharmacy::{
    AvailabilityLine, CounterSale, CounterSaleDraft, Grn, GrnDraft, GrnItem, GrnItemInput,
    Intent, IntentDraft, IntentItem, IntentStatus, PaymentMode, Product, ProductDraft,
    SaleLine, SaleLineRequest, Shortage, StockAllocation, StockBatch, StockSummary,
};
pub use self::pharmacy_service::PharmacyService;
pub use self::reconciliation::{BillingReconciliation, ReconciliationLine, VisitReconciliation};
pub use self::report_service::{ReportPorts, ReportService, ReportServiceConfig};
pub use self::reports::{
    BatchAlert, CollectionReport, DailyCollection, DepartmentCount, LowStockAlert, ModeTotals,
    StatusCount, StockAlerts, VisitSummary,
};
pub use self::staff::{
    Department, DepartmentDraft, Employee, EmployeeDraft, EmployeeInput, Permission, Role,
    RoleDraft,
};
pub use self::staff_service::StaffService;
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::visit::{
    Assessment, MedicineOrder, QueueEstimate, ServiceOrder, Visit, VisitOrders, VisitStatus,
    Vitals,
};
pub use self::visit_service::{CheckIn, QueueEntry, VisitService, VisitServiceConfig};
