//! Persistence adapters for the repository ports.
//!
//! Storage is in-memory. Adapters translate nothing: domain entities are
//! stored as-is and constraints a database would enforce (unique names,
//! one bill per visit, atomic stock deductions) are checked under lock.
//!
//! ```
//! use backend::outbound::persistence::MemoryPatientRepository;
//!
//! let patients = MemoryPatientRepository::new();
//! # let _ = patients;
//! ```

mod memory;

pub use memory::{
    MemoryBillRepository, MemoryCounterSaleRepository, MemoryDepartmentRepository,
    MemoryEmployeeRepository, MemoryGrnRepository, MemoryIdempotencyStore, MemoryIntentRepository,
    MemoryPatientRepository, MemoryProductRepository, MemoryRoleRepository,
    MemorySequenceGenerator, MemoryStockRepository, MemoryVisitRepository,
};
