//! Builders that wire adapters into the domain services behind HTTP state.

use std::sync::Arc;

use mockable::{Clock, DefaultEnv};
use pagination::PageRequestError;

use crate::domain::ports::{
    BillRepository, CounterSaleRepository, DepartmentRepository, EmployeeRepository,
    GrnRepository, IntentRepository, JobQueue, PatientRepository, ProductRepository,
    RoleRepository, SequenceGenerator, StockRepository, VisitRepository,
};
use crate::domain::{
    BillingPorts, BillingService, CounterSalePorts, CounterSaleService, IdempotencyConfig,
    IdempotencyGuard, PatientService, PharmacyService, ReportPorts, ReportService, StaffService,
    VisitService,
};
use crate::inbound::http::state::{HttpState, HttpStateServices};
use crate::outbound::cache::CachedProductRepository;
use crate::outbound::persistence::{
    MemoryBillRepository, MemoryCounterSaleRepository, MemoryDepartmentRepository,
    MemoryEmployeeRepository, MemoryGrnRepository, MemoryIdempotencyStore, MemoryIntentRepository,
    MemoryPatientRepository, MemoryProductRepository, MemoryRoleRepository,
    MemorySequenceGenerator, MemoryStockRepository, MemoryVisitRepository,
};

use super::config::AppSettings;

/// One instance of every repository port.
#[derive(Clone)]
struct Repositories {
    departments: Arc<dyn DepartmentRepository>,
    roles: Arc<dyn RoleRepository>,
    employees: Arc<dyn EmployeeRepository>,
    patients: Arc<dyn PatientRepository>,
    visits: Arc<dyn VisitRepository>,
    products: Arc<dyn ProductRepository>,
    stock: Arc<dyn StockRepository>,
    intents: Arc<dyn IntentRepository>,
    grns: Arc<dyn GrnRepository>,
    sales: Arc<dyn CounterSaleRepository>,
    bills: Arc<dyn BillRepository>,
    sequences: Arc<dyn SequenceGenerator>,
}

impl Repositories {
    fn in_memory(product_cache_capacity: u64) -> Self {
        let products: Arc<dyn ProductRepository> = Arc::new(CachedProductRepository::new(
            Arc::new(MemoryProductRepository::new()),
            product_cache_capacity,
        ));
        Self {
            departments: Arc::new(MemoryDepartmentRepository::new()),
            roles: Arc::new(MemoryRoleRepository::new()),
            employees: Arc::new(MemoryEmployeeRepository::new()),
            patients: Arc::new(MemoryPatientRepository::new()),
            visits: Arc::new(MemoryVisitRepository::new()),
            products,
            stock: Arc::new(MemoryStockRepository::new()),
            intents: Arc::new(MemoryIntentRepository::new()),
            grns: Arc::new(MemoryGrnRepository::new()),
            sales: Arc::new(MemoryCounterSaleRepository::new()),
            bills: Arc::new(MemoryBillRepository::new()),
            sequences: Arc::new(MemorySequenceGenerator::new()),
        }
    }
}

/// Build HTTP state over fresh in-memory storage.
///
/// Products are read through a bounded cache. Idempotency records share one
/// store between counter sales and payments; their TTL comes from
/// `IDEMPOTENCY_TTL_HOURS`.
///
/// # Errors
/// Returns [`PageRequestError::InvalidLimits`] when the configured page
/// sizes are inconsistent.
pub fn build_http_state(
    settings: &AppSettings,
    clock: Arc<dyn Clock>,
    jobs: Arc<dyn JobQueue>,
) -> Result<HttpState, PageRequestError> {
    let page_limits = settings.page_limits()?;
    let repos = Repositories::in_memory(settings.product_cache_capacity());
    let idempotency = IdempotencyGuard::new(
        Arc::new(MemoryIdempotencyStore::new()),
        clock.clone(),
        IdempotencyConfig::from_env(&DefaultEnv::new()),
    );

    let services = HttpStateServices {
        staff: StaffService::new(
            repos.departments.clone(),
            repos.roles.clone(),
            repos.employees.clone(),
            clock.clone(),
        ),
        patients: PatientService::new(
            repos.patients.clone(),
            repos.sequences.clone(),
            clock.clone(),
            settings.patient_config(),
        ),
        visits: VisitService::new(
            repos.visits.clone(),
            repos.patients.clone(),
            repos.employees.clone(),
            repos.products.clone(),
            repos.sequences.clone(),
            clock.clone(),
            settings.visit_config(),
        ),
        pharmacy: PharmacyService::new(
            repos.products.clone(),
            repos.stock.clone(),
            repos.intents.clone(),
            repos.grns.clone(),
            repos.sequences.clone(),
            clock.clone(),
        ),
        counter_sales: CounterSaleService::new(
            CounterSalePorts {
                sales: repos.sales.clone(),
                products: repos.products.clone(),
                stock: repos.stock.clone(),
                visits: repos.visits.clone(),
                patients: repos.patients.clone(),
                bills: repos.bills.clone(),
                sequences: repos.sequences.clone(),
                jobs: jobs.clone(),
            },
            idempotency.clone(),
            clock.clone(),
        ),
        billing: BillingService::new(
            BillingPorts {
                bills: repos.bills.clone(),
                visits: repos.visits.clone(),
                employees: repos.employees.clone(),
                sales: repos.sales.clone(),
                stock: repos.stock.clone(),
                sequences: repos.sequences.clone(),
                jobs,
            },
            idempotency,
            clock.clone(),
        ),
        reports: ReportService::new(
            ReportPorts {
                bills: repos.bills,
                sales: repos.sales,
                products: repos.products,
                stock: repos.stock,
                visits: repos.visits,
                departments: repos.departments,
            },
            clock.clone(),
            settings.report_config(),
        ),
    };

    Ok(HttpState::new(services, page_limits, clock))
}
