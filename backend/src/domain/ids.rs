//! Strongly typed entity identifiers.
//!
//! Every aggregate is keyed by its own UUID newtype so a `PatientId` can
//! never be passed where a `VisitId` is expected.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Failure parsing an identifier from text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} must be a valid UUID")]
pub struct IdParseError {
    /// Human-readable identifier kind, e.g. `patient id`.
    pub kind: &'static str,
}

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
            utoipa::ToSchema,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Human-readable name used in validation messages.
            pub const KIND: &'static str = $kind;

            /// Parse and validate an identifier.
            pub fn new(raw: impl AsRef<str>) -> Result<Self, IdParseError> {
                let raw = raw.as_ref();
                if raw.trim() != raw {
                    return Err(IdParseError { kind: Self::KIND });
                }
                Uuid::parse_str(raw)
                    .map(Self)
                    .map_err(|_| IdParseError { kind: Self::KIND })
            }

            /// Generate a fresh random identifier.
            pub fn random() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wrap an existing UUID.
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Access the underlying UUID.
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl std::str::FromStr for $name {
            type Err = IdParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }
    };
}

define_id!(
    /// Identifier of a hospital department.
    DepartmentId, "department id"
);
define_id!(
    /// Identifier of a staff role.
    RoleId, "role id"
);
define_id!(
    /// Identifier of an employee.
    EmployeeId, "employee id"
);
define_id!(
    /// Identifier of a registered patient.
    PatientId, "patient id"
);
define_id!(
    /// Identifier of a patient visit.
    VisitId, "visit id"
);
define_id!(
    /// Identifier of a pharmacy product.
    ProductId, "product id"
);
define_id!(
    /// Identifier of a received stock batch.
    BatchId, "batch id"
);
define_id!(
    /// Identifier of a purchase intent.
    IntentId, "intent id"
);
define_id!(
    /// Identifier of a goods received note.
    GrnId, "grn id"
);
define_id!(
    /// Identifier of a pharmacy counter sale.
    CounterSaleId, "counter sale id"
);
define_id!(
    /// Identifier of a visit bill.
    BillId, "bill id"
);
