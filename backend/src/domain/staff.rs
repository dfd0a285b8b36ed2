//! Departments, roles, and employees.
//!
//! Drafts carry validated input for create and update operations; the
//! aggregates add identity, activation state, and timestamps.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::validation::{
    bounded_text, email_address, field_value_error, non_negative_amount, optional_text,
    phone_number,
};
use super::{DepartmentId, EmployeeId, Error, Money, RoleId};

/// Hospital department such as Cardiology or Pharmacy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    /// Stable identifier.
    pub id: DepartmentId,
    /// Display name, unique ignoring case.
    pub name: String,
    /// Optional free-text description.
    pub description: Option<String>,
    /// Inactive departments cannot receive new employees or visits.
    pub is_active: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Validated department fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepartmentDraft {
    /// Trimmed name, 2 to 80 characters.
    pub name: String,
    /// Trimmed description, if any.
    pub description: Option<String>,
}

impl DepartmentDraft {
    /// Validate raw department input.
    pub fn new(name: &str, description: Option<&str>) -> Result<Self, Error> {
        Ok(Self {
            name: bounded_text("name", name, 2, 80)?,
            description: optional_text("description", description, 500)?,
        })
    }
}

/// Capability granted to a role.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Register and edit patients.
    ManagePatients,
    /// Check patients in and run consultations.
    ManageVisits,
    /// Maintain products, intents, GRNs, and counter sales.
    ManagePharmacy,
    /// Generate bills and take payments.
    ManageBilling,
    /// Administer departments, roles, and employees.
    ManageStaff,
    /// Read operational reports.
    ViewReports,
}

impl Permission {
    /// Every permission, in declaration order.
    pub const ALL: [Permission; 6] = [
        Permission::ManagePatients,
        Permission::ManageVisits,
        Permission::ManagePharmacy,
        Permission::ManageBilling,
        Permission::ManageStaff,
        Permission::ViewReports,
    ];

    /// Wire representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ManagePatients => "manage_patients",
            Self::ManageVisits => "manage_visits",
            Self::ManagePharmacy => "manage_pharmacy",
            Self::ManageBilling => "manage_billing",
            Self::ManageStaff => "manage_staff",
            Self::ViewReports => "view_reports",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|permission| permission.as_str() == s)
            .ok_or_else(|| {
                field_value_error(
                    "permissions",
                    "invalid_permission",
                    s,
                    format!("unknown permission: {s}"),
                )
            })
    }
}

/// Named bundle of permissions assigned to employees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    /// Stable identifier.
    pub id: RoleId,
    /// Display name, unique ignoring case.
    pub name: String,
    /// Granted permissions.
    pub permissions: BTreeSet<Permission>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Validated role fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleDraft {
    /// Trimmed name, 2 to 60 characters.
    pub name: String,
    /// Granted permissions; duplicates collapse.
    pub permissions: BTreeSet<Permission>,
}

impl RoleDraft {
    /// Validate raw role input.
    pub fn new(
        name: &str,
        permissions: impl IntoIterator<Item = Permission>,
    ) -> Result<Self, Error> {
        Ok(Self {
            name: bounded_text("name", name, 2, 60)?,
            permissions: permissions.into_iter().collect(),
        })
    }
}

/// Staff member. Employees with a consultation fee are consulting doctors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    /// Stable identifier.
    pub id: EmployeeId,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Lowercased, unique email address.
    pub email: String,
    /// Contact number.
    pub phone: String,
    /// Owning department.
    pub department_id: DepartmentId,
    /// Assigned role.
    pub role_id: RoleId,
    /// Job title, e.g. "Consultant Physician".
    pub designation: String,
    /// Fee charged per consultation; `None` for non-consulting staff.
    pub consultation_fee: Option<Money>,
    /// Inactive employees cannot receive visits.
    pub is_active: bool,
    /// Date of joining.
    pub joined_on: NaiveDate,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Employee {
    /// Full display name.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// `true` when the employee takes consultations.
    pub fn is_doctor(&self) -> bool {
        self.consultation_fee.is_some()
    }
}

/// Raw employee input prior to validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmployeeInput {
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Email address.
    pub email: String,
    /// Contact number.
    pub phone: String,
    /// Owning department.
    pub department_id: DepartmentId,
    /// Assigned role.
    pub role_id: RoleId,
    /// Job title.
    pub designation: String,
    /// Optional consultation fee.
    pub consultation_fee: Option<Money>,
    /// Date of joining.
    pub joined_on: NaiveDate,
}

/// Validated employee fields. Referential checks happen in the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmployeeDraft {
    /// Trimmed given name.
    pub first_name: String,
    /// Trimmed family name.
    pub last_name: String,
    /// Normalised email.
    pub email: String,
    /// Validated phone.
    pub phone: String,
    /// Owning department.
    pub department_id: DepartmentId,
    /// Assigned role.
    pub role_id: RoleId,
    /// Trimmed designation.
    pub designation: String,
    /// Non-negative fee, if any.
    pub consultation_fee: Option<Money>,
    /// Date of joining.
    pub joined_on: NaiveDate,
}

impl EmployeeDraft {
    /// Validate raw employee input.
    pub fn new(input: EmployeeInput) -> Result<Self, Error> {
        let consultation_fee = input
            .consultation_fee
            .map(|fee| non_negative_amount("consultationFee", fee))
            .transpose()?;
        Ok(Self {
            first_name: bounded_text("firstName", &input.first_name, 1, 60)?,
            last_name: bounded_text("lastName", &input.last_name, 1, 60)?,
            email: email_address("email", &input.email)?,
            phone: phone_number("phone", &input.phone)?,
            department_id: input.department_id,
            role_id: input.role_id,
            designation: bounded_text("designation", &input.designation, 2, 80)?,
            consultation_fee,
            joined_on: input.joined_on,
        })
    }
}
