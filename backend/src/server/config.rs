//! Application settings loaded via OrthoConfig.
//!
//! `consultation_minutes` carries an OrthoConfig default so an empty
//! environment still merges into a settings object. The remaining fields
//! are optional and their accessors fall back to the defaults below.

use std::net::SocketAddr;

use ortho_config::OrthoConfig;
use pagination::{PageLimits, PageRequestError};
use serde::Deserialize;

use crate::domain::{PatientServiceConfig, ReportServiceConfig, VisitServiceConfig};

const DEFAULT_BIND_ADDR: ([u8; 4], u16) = ([0, 0, 0, 0], 8080);
const DEFAULT_CONSULTATION_MINUTES: u32 = 10;
const DEFAULT_UHID_PREFIX: &str = "UH";
const DEFAULT_NEAR_EXPIRY_DAYS: u32 = 30;
const DEFAULT_PAGE_SIZE: u32 = 20;
const DEFAULT_PAGE_SIZE_MAX: u32 = 100;
const DEFAULT_PRODUCT_CACHE_CAPACITY: u64 = 512;
const DEFAULT_JOB_QUEUE_CAPACITY: usize = 256;

/// Server settings read from CLI arguments, `HMS_*` variables, and config
/// files.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "HMS")]
pub struct AppSettings {
    /// Socket address to listen on.
    pub bind_addr: Option<SocketAddr>,
    /// Average consultation length in minutes, used for queue ETAs.
    #[ortho_config(default = 10)]
    pub consultation_minutes: u32,
    /// Leading letters of every UHID.
    pub uhid_prefix: Option<String>,
    /// Batches expiring within this many days raise an alert.
    pub near_expiry_days: Option<u32>,
    /// Page size used when a list request names none.
    pub page_size_default: Option<u32>,
    /// Largest page size a list request may ask for.
    pub page_size_max: Option<u32>,
    /// Number of products held by the read cache.
    pub product_cache_capacity: Option<u64>,
    /// Pending background jobs before new ones are refused.
    pub job_queue_capacity: Option<usize>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            bind_addr: None,
            consultation_minutes: DEFAULT_CONSULTATION_MINUTES,
            uhid_prefix: None,
            near_expiry_days: None,
            page_size_default: None,
            page_size_max: None,
            product_cache_capacity: None,
            job_queue_capacity: None,
        }
    }
}

impl AppSettings {
    /// Address the HTTP listener binds to.
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
            .unwrap_or_else(|| SocketAddr::from(DEFAULT_BIND_ADDR))
    }

    /// Page size defaults and ceiling.
    ///
    /// # Errors
    /// Returns [`PageRequestError::InvalidLimits`] when the default is zero
    /// or exceeds the maximum.
    pub fn page_limits(&self) -> Result<PageLimits, PageRequestError> {
        PageLimits::new(
            self.page_size_default.unwrap_or(DEFAULT_PAGE_SIZE),
            self.page_size_max.unwrap_or(DEFAULT_PAGE_SIZE_MAX),
        )
    }

    /// Product cache size.
    pub fn product_cache_capacity(&self) -> u64 {
        self.product_cache_capacity
            .unwrap_or(DEFAULT_PRODUCT_CACHE_CAPACITY)
    }

    /// Job queue bound.
    pub fn job_queue_capacity(&self) -> usize {
        self.job_queue_capacity.unwrap_or(DEFAULT_JOB_QUEUE_CAPACITY)
    }

    pub(crate) fn patient_config(&self) -> PatientServiceConfig {
        PatientServiceConfig {
            uhid_prefix: self
                .uhid_prefix
                .clone()
                .unwrap_or_else(|| DEFAULT_UHID_PREFIX.to_owned()),
        }
    }

    pub(crate) fn visit_config(&self) -> VisitServiceConfig {
        VisitServiceConfig {
            consultation_minutes: self.consultation_minutes,
        }
    }

    pub(crate) fn report_config(&self) -> ReportServiceConfig {
        ReportServiceConfig {
            near_expiry_days: self.near_expiry_days.unwrap_or(DEFAULT_NEAR_EXPIRY_DAYS),
        }
    }
}
