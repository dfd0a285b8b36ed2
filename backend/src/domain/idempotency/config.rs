//! TTL configuration for idempotency records.

use std::time::Duration;

use mockable::Env;

/// Environment variable holding the record TTL in hours.
pub const IDEMPOTENCY_TTL_HOURS_ENV: &str = "IDEMPOTENCY_TTL_HOURS";

/// How long idempotency records stay replayable.
///
/// ```
/// # use backend::domain::idempotency::IdempotencyConfig;
/// # use std::time::Duration;
/// assert_eq!(IdempotencyConfig::default().ttl(), Duration::from_secs(24 * 3600));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdempotencyConfig {
    ttl: Duration,
}

impl IdempotencyConfig {
    const DEFAULT_TTL_HOURS: u64 = 24;
    const MIN_TTL_HOURS: u64 = 1;
    /// One year.
    const MAX_TTL_HOURS: u64 = 24 * 366;

    /// Read `IDEMPOTENCY_TTL_HOURS`, falling back to 24 hours when unset or
    /// unparsable. Values are clamped to between one hour and one year.
    pub fn from_env<E: Env>(env: &E) -> Self {
        let hours = env
            .string(IDEMPOTENCY_TTL_HOURS_ENV)
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .unwrap_or(Self::DEFAULT_TTL_HOURS)
            .clamp(Self::MIN_TTL_HOURS, Self::MAX_TTL_HOURS);
        Self::with_ttl(Duration::from_secs(hours * 3600))
    }

    /// Use an explicit TTL.
    pub const fn with_ttl(ttl: Duration) -> Self {
        Self { ttl }
    }

    /// Configured TTL.
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl Default for IdempotencyConfig {
    fn default() -> Self {
        Self::with_ttl(Duration::from_secs(Self::DEFAULT_TTL_HOURS * 3600))
    }
}
