//! In-memory repositories.
//!
//! Each adapter keeps its rows behind a `tokio::sync::RwLock`. Uniqueness
//! rules that a database would enforce with constraints are checked under
//! the write lock and reported as [`RepositoryError::Conflict`].
//!
//! [`RepositoryError::Conflict`]: crate::domain::ports::RepositoryError::Conflict

mod billing;
mod idempotency;
mod patients;
mod pharmacy;
mod sales;
mod sequences;
mod staff;
mod table;
mod visits;

pub use billing::MemoryBillRepository;
pub use idempotency::MemoryIdempotencyStore;
pub use patients::MemoryPatientRepository;
pub use pharmacy::{
    MemoryGrnRepository, MemoryIntentRepository, MemoryProductRepository, MemoryStockRepository,
};
pub use sales::MemoryCounterSaleRepository;
pub use sequences::MemorySequenceGenerator;
pub use staff::{MemoryDepartmentRepository, MemoryEmployeeRepository, MemoryRoleRepository};
pub use visits::MemoryVisitRepository;
