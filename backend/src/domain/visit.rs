//! Patient visits: lifecycle, clinical notes, orders, and queue estimates.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use super::validation::{
    bounded_text, field_error, field_value_error, non_negative_amount, optional_text,
    positive_quantity,
};
use super::{DepartmentId, EmployeeId, Error, Money, PatientId, ProductId, VisitId};

/// Where a visit is in its lifecycle.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum VisitStatus {
    /// Checked in, not yet seen.
    Waiting,
    /// With the doctor.
    InConsultation,
    /// Checked out.
    Completed,
    /// Abandoned before consultation.
    Cancelled,
}

impl VisitStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [VisitStatus; 4] = [
        Self::Waiting,
        Self::InConsultation,
        Self::Completed,
        Self::Cancelled,
    ];

    /// Wire name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::InConsultation => "in_consultation",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Waiting or in consultation.
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Waiting | Self::InConsultation)
    }

    /// Whether moving to `next` is a legal transition.
    pub const fn can_become(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Waiting, Self::InConsultation)
                | (Self::InConsultation, Self::Completed)
                | (Self::Waiting, Self::Cancelled)
        )
    }
}

impl fmt::Display for VisitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VisitStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| field_value_error("status", "invalid_status", s, "unknown visit status"))
    }
}

/// Vital signs recorded at triage or during consultation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Vitals {
    /// Body temperature in degrees Celsius.
    pub temperature_celsius: Option<f64>,
    /// Pulse in beats per minute.
    pub pulse_per_minute: Option<u32>,
    /// Systolic pressure in mmHg.
    pub systolic_mm_hg: Option<u32>,
    /// Diastolic pressure in mmHg.
    pub diastolic_mm_hg: Option<u32>,
    /// Oxygen saturation percentage.
    pub spo2_percent: Option<u32>,
    /// Weight in kilograms.
    pub weight_kg: Option<f64>,
    /// Height in centimetres.
    pub height_cm: Option<f64>,
}

fn check_range<T>(
    field: &str,
    value: Option<T>,
    ok: impl Fn(T) -> bool,
    bounds: &str,
) -> Result<(), Error>
where
    T: Copy + fmt::Display,
{
    match value {
        Some(v) if !ok(v) => Err(field_value_error(
            field,
            "out_of_range",
            v.to_string(),
            format!("{field} must be within {bounds}"),
        )),
        _ => Ok(()),
    }
}

impl Vitals {
    /// Check every supplied reading against physiological bounds.
    pub fn validate(self) -> Result<Self, Error> {
        let Self {
            temperature_celsius,
            pulse_per_minute,
            systolic_mm_hg,
            diastolic_mm_hg,
            spo2_percent,
            weight_kg,
            height_cm,
        } = self;
        if temperature_celsius.is_none()
            && pulse_per_minute.is_none()
            && systolic_mm_hg.is_none()
            && diastolic_mm_hg.is_none()
            && spo2_percent.is_none()
            && weight_kg.is_none()
            && height_cm.is_none()
        {
            return Err(field_error(
                "vitals",
                "missing_field",
                "at least one vital sign is required",
            ));
        }
        check_range(
            "temperatureCelsius",
            temperature_celsius,
            |t| (30.0..=45.0).contains(&t),
            "[30, 45]",
        )?;
        check_range(
            "pulsePerMinute",
            pulse_per_minute,
            |p| (20..=250).contains(&p),
            "[20, 250]",
        )?;
        check_range(
            "systolicMmHg",
            systolic_mm_hg,
            |s| (50..=260).contains(&s),
            "[50, 260]",
        )?;
        check_range(
            "diastolicMmHg",
            diastolic_mm_hg,
            |d| (30..=160).contains(&d),
            "[30, 160]",
        )?;
        check_range(
            "spo2Percent",
            spo2_percent,
            |s| (50..=100).contains(&s),
            "[50, 100]",
        )?;
        check_range(
            "weightKg",
            weight_kg,
            |w| w > 0.0 && w <= 500.0,
            "(0, 500]",
        )?;
        check_range(
            "heightCm",
            height_cm,
            |h| h > 0.0 && h <= 300.0,
            "(0, 300]",
        )?;
        if let (Some(systolic), Some(diastolic)) = (systolic_mm_hg, diastolic_mm_hg)
            && systolic <= diastolic
        {
            return Err(field_error(
                "systolicMmHg",
                "systolic_not_above_diastolic",
                "systolicMmHg must be greater than diastolicMmHg",
            ));
        }
        Ok(self)
    }
}

/// Doctor's findings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
    /// Presenting complaint.
    pub chief_complaint: String,
    /// Working diagnosis.
    pub diagnosis: Option<String>,
    /// Free-text notes.
    pub notes: Option<String>,
}

impl Assessment {
    /// Validate and trim raw text.
    pub fn new(
        chief_complaint: &str,
        diagnosis: Option<&str>,
        notes: Option<&str>,
    ) -> Result<Self, Error> {
        Ok(Self {
            chief_complaint: bounded_text("chiefComplaint", chief_complaint, 2, 500)?,
            diagnosis: optional_text("diagnosis", diagnosis, 500)?,
            notes: optional_text("notes", notes, 2000)?,
        })
    }
}

/// Prescribed medicine to be dispensed by the pharmacy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MedicineOrder {
    /// Prescribed product.
    pub product_id: ProductId,
    /// Units to dispense.
    pub quantity: u32,
    /// Dosage instructions, e.g. "1-0-1 after food".
    pub dosage: String,
    /// Course length.
    pub duration_days: Option<u32>,
}

/// Chargeable procedure or investigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceOrder {
    /// Service name, e.g. "Complete blood count".
    pub name: String,
    /// Charge in minor units.
    pub charge: Money,
}

/// Validated replacement order lists. Product existence is checked by the
/// visit service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisitOrders {
    /// Medicine orders.
    pub medicine_orders: Vec<MedicineOrder>,
    /// Service orders.
    pub service_orders: Vec<ServiceOrder>,
}

impl VisitOrders {
    /// Validate each order line.
    pub fn new(
        medicine_orders: Vec<MedicineOrder>,
        service_orders: Vec<ServiceOrder>,
    ) -> Result<Self, Error> {
        let medicine_orders = medicine_orders
            .into_iter()
            .map(|order| {
                Ok(MedicineOrder {
                    quantity: positive_quantity("medicineOrders.quantity", order.quantity)?,
                    dosage: bounded_text("medicineOrders.dosage", &order.dosage, 1, 200)?,
                    duration_days: order
                        .duration_days
                        .map(|days| positive_quantity("medicineOrders.durationDays", days))
                        .transpose()?,
                    product_id: order.product_id,
                })
            })
            .collect::<Result<Vec<_>, Error>>()?;
        let service_orders = service_orders
            .into_iter()
            .map(|order| {
                Ok(ServiceOrder {
                    name: bounded_text("serviceOrders.name", &order.name, 2, 120)?,
                    charge: non_negative_amount("serviceOrders.charge", order.charge)?,
                })
            })
            .collect::<Result<Vec<_>, Error>>()?;
        Ok(Self {
            medicine_orders,
            service_orders,
        })
    }
}

/// One patient encounter with a doctor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Visit {
    /// Stable identifier.
    pub id: VisitId,
    /// Patient seen.
    pub patient_id: PatientId,
    /// Consulting doctor.
    pub doctor_id: EmployeeId,
    /// The doctor's department.
    pub department_id: DepartmentId,
    /// Day of the visit.
    pub visit_date: NaiveDate,
    /// Queue token, unique per doctor and day.
    pub token_number: u32,
    /// Lifecycle state.
    pub status: VisitStatus,
    /// Check-in time.
    pub checked_in_at: DateTime<Utc>,
    /// Consultation start.
    pub consultation_started_at: Option<DateTime<Utc>>,
    /// Check-out time.
    pub checked_out_at: Option<DateTime<Utc>>,
    /// Latest vitals.
    pub vitals: Option<Vitals>,
    /// Doctor's assessment.
    pub assessment: Option<Assessment>,
    /// Medicines to dispense.
    pub medicine_orders: Vec<MedicineOrder>,
    /// Services to bill.
    pub service_orders: Vec<ServiceOrder>,
}

impl Visit {
    /// Move to `next`, stamping the matching timestamp.
    pub fn transition(&mut self, next: VisitStatus, now: DateTime<Utc>) -> Result<(), Error> {
        if !self.status.can_become(next) {
            return Err(Error::conflict(format!(
                "visit cannot move from {} to {next}",
                self.status
            ))
            .with_details(json!({ "from": self.status, "to": next })));
        }
        match next {
            VisitStatus::InConsultation => self.consultation_started_at = Some(now),
            VisitStatus::Completed => self.checked_out_at = Some(now),
            VisitStatus::Waiting | VisitStatus::Cancelled => {}
        }
        self.status = next;
        Ok(())
    }

    /// Record vitals; allowed while the visit is open.
    pub fn record_vitals(&mut self, vitals: Vitals) -> Result<(), Error> {
        if !self.status.is_open() {
            return Err(self.wrong_status("vitals can only be recorded on an open visit"));
        }
        self.vitals = Some(vitals.validate()?);
        Ok(())
    }

    /// Record the assessment; allowed only during consultation.
    pub fn record_assessment(&mut self, assessment: Assessment) -> Result<(), Error> {
        self.require_consultation("assessment")?;
        self.assessment = Some(assessment);
        Ok(())
    }

    /// Replace the order lists; allowed only during consultation.
    pub fn replace_orders(&mut self, orders: VisitOrders) -> Result<(), Error> {
        self.require_consultation("orders")?;
        self.medicine_orders = orders.medicine_orders;
        self.service_orders = orders.service_orders;
        Ok(())
    }

    fn require_consultation(&self, what: &str) -> Result<(), Error> {
        if self.status != VisitStatus::InConsultation {
            return Err(self.wrong_status(&format!("{what} can only be set during consultation")));
        }
        Ok(())
    }

    fn wrong_status(&self, message: &str) -> Error {
        Error::conflict(message).with_details(json!({ "status": self.status }))
    }
}

/// Queue position and wait estimate for one visit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QueueEstimate {
    /// Visit being estimated.
    pub visit_id: VisitId,
    /// Its token.
    pub token_number: u32,
    /// Current status.
    pub status: VisitStatus,
    /// Open visits with a lower token; `None` unless waiting.
    pub patients_ahead: Option<u32>,
    /// `patientsAhead × consultationMinutes`; `None` unless waiting.
    pub estimated_wait_minutes: Option<u32>,
    /// `now + estimatedWaitMinutes`; `None` unless waiting.
    pub estimated_start_at: Option<DateTime<Utc>>,
}

/// Estimate when `visit` will be seen.
///
/// `same_day` holds the doctor's visits for the visit date, in any order;
/// it may include `visit` itself.
pub fn estimate_queue(
    visit: &Visit,
    same_day: &[Visit],
    consultation_minutes: u32,
    now: DateTime<Utc>,
) -> QueueEstimate {
    let mut estimate = QueueEstimate {
        visit_id: visit.id,
        token_number: visit.token_number,
        status: visit.status,
        patients_ahead: None,
        estimated_wait_minutes: None,
        estimated_start_at: None,
    };
    if visit.status != VisitStatus::Waiting {
        return estimate;
    }
    let ahead = same_day
        .iter()
        .filter(|other| {
            other.doctor_id == visit.doctor_id
                && other.visit_date == visit.visit_date
                && other.token_number < visit.token_number
                && other.status.is_open()
        })
        .count();
    let ahead = u32::try_from(ahead).unwrap_or(u32::MAX);
    let wait = ahead.saturating_mul(consultation_minutes);
    estimate.patients_ahead = Some(ahead);
    estimate.estimated_wait_minutes = Some(wait);
    estimate.estimated_start_at = now.checked_add_signed(TimeDelta::minutes(i64::from(wait)));
    estimate
}

#[cfg(test)]
mod tests;
