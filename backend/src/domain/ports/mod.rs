//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports only: domain services depend on these traits and adapters in
//! `crate::outbound` implement them.

mod macros;
pub(crate) use macros::define_port_error;

mod bill_repository;
mod counter_sale_repository;
mod department_repository;
mod employee_repository;
mod grn_repository;
mod idempotency_store;
mod intent_repository;
mod job_queue;
mod patient_repository;
mod product_repository;
mod repository_error;
mod role_repository;
mod sequence_generator;
mod stock_repository;
mod visit_repository;

#[cfg(test)]
pub use bill_repository::MockBillRepository;
pub use bill_repository::{BillFilter, BillRepository};
#[cfg(test)]
pub use counter_sale_repository::MockCounterSaleRepository;
pub use counter_sale_repository::{CounterSaleFilter, CounterSaleRepository};
#[cfg(test)]
pub use department_repository::MockDepartmentRepository;
pub use department_repository::{DepartmentFilter, DepartmentRepository};
#[cfg(test)]
pub use employee_repository::MockEmployeeRepository;
pub use employee_repository::{EmployeeFilter, EmployeeRepository};
#[cfg(test)]
pub use grn_repository::MockGrnRepository;
pub use grn_repository::{GrnFilter, GrnRepository};
#[cfg(test)]
pub use idempotency_store::MockIdempotencyStore;
pub use idempotency_store::{IdempotencyStore, IdempotencyStoreError};
#[cfg(test)]
pub use intent_repository::MockIntentRepository;
pub use intent_repository::{IntentFilter, IntentRepository};
#[cfg(test)]
pub use job_queue::MockJobQueue;
pub use job_queue::{JobDispatchError, JobQueue};
#[cfg(test)]
pub use patient_repository::MockPatientRepository;
pub use patient_repository::{PatientFilter, PatientRepository};
#[cfg(test)]
pub use product_repository::MockProductRepository;
pub use product_repository::{ProductFilter, ProductRepository};
pub use repository_error::{ListSlice, RepositoryError};
#[cfg(test)]
pub use role_repository::MockRoleRepository;
pub use role_repository::RoleRepository;
#[cfg(test)]
pub use sequence_generator::MockSequenceGenerator;
pub use sequence_generator::SequenceGenerator;
#[cfg(test)]
pub use stock_repository::MockStockRepository;
pub use stock_repository::{StockDeduction, StockRepository, StockRepositoryError};
#[cfg(test)]
pub use visit_repository::MockVisitRepository;
pub use visit_repository::{VisitFilter, VisitRepository};
