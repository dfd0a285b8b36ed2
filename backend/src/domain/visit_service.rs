//! Check-in, consultation workflow, and queue estimates.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::NaiveDate;
use mockable::Clock;
use pagination::PageRequest;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::domain::ports::{
    EmployeeRepository, ListSlice, PatientRepository, ProductRepository, SequenceGenerator,
    VisitFilter, VisitRepository,
};
use crate::domain::service_support::{map_repository_error, not_found};
use crate::domain::validation::{field_error, field_value_error};
use crate::domain::visit::estimate_queue;
use crate::domain::{
    Assessment, DepartmentId, Employee, EmployeeId, Error, PatientId, QueueEstimate,
    SequenceKind, Visit, VisitId, VisitOrders, VisitStatus, Vitals,
};

/// Settings for queue estimation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisitServiceConfig {
    /// Average consultation length in minutes.
    pub consultation_minutes: u32,
}

impl Default for VisitServiceConfig {
    fn default() -> Self {
        Self {
            consultation_minutes: 10,
        }
    }
}

/// Check-in request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckIn {
    /// Patient arriving.
    pub patient_id: PatientId,
    /// Doctor to consult.
    pub doctor_id: EmployeeId,
    /// Must equal the doctor's department when given.
    pub department_id: Option<DepartmentId>,
}

/// One visit in a doctor's queue with its estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QueueEntry {
    /// The visit.
    pub visit: Visit,
    /// Queue position and ETA.
    pub estimate: QueueEstimate,
}

/// Visit lifecycle service.
#[derive(Clone)]
pub struct VisitService {
    visits: Arc<dyn VisitRepository>,
    patients: Arc<dyn PatientRepository>,
    employees: Arc<dyn EmployeeRepository>,
    products: Arc<dyn ProductRepository>,
    sequences: Arc<dyn SequenceGenerator>,
    clock: Arc<dyn Clock>,
    config: VisitServiceConfig,
}

impl VisitService {
    /// Create the service.
    pub fn new(
        visits: Arc<dyn VisitRepository>,
        patients: Arc<dyn PatientRepository>,
        employees: Arc<dyn EmployeeRepository>,
        products: Arc<dyn ProductRepository>,
        sequences: Arc<dyn SequenceGenerator>,
        clock: Arc<dyn Clock>,
        config: VisitServiceConfig,
    ) -> Self {
        Self {
            visits,
            patients,
            employees,
            products,
            sequences,
            clock,
            config,
        }
    }

    /// Check a patient in with a doctor and issue the next token.
    pub async fn check_in(&self, request: CheckIn) -> Result<Visit, Error> {
        let now = self.clock.utc();
        let today = now.date_naive();
        self.patients
            .find(request.patient_id)
            .await
            .map_err(|e| map_repository_error("patient", e))?
            .ok_or_else(|| not_found("patient", request.patient_id))?;
        let doctor = self.consulting_doctor(request.doctor_id).await?;
        if let Some(department_id) = request.department_id
            && department_id != doctor.department_id
        {
            return Err(field_value_error(
                "departmentId",
                "department_mismatch",
                department_id.to_string(),
                "departmentId must be the doctor's department",
            ));
        }

        let same_day = self.doctor_day(doctor.id, today).await?;
        if let Some(open) = same_day
            .iter()
            .find(|v| v.patient_id == request.patient_id && v.status.is_open())
        {
            warn!(
                patient_id = %request.patient_id,
                doctor_id = %doctor.id,
                "duplicate open visit rejected"
            );
            return Err(
                Error::conflict("patient already has an open visit with this doctor today")
                    .with_details(json!({ "visitId": open.id, "tokenNumber": open.token_number })),
            );
        }

        let token = self
            .sequences
            .next(SequenceKind::Token {
                doctor_id: doctor.id,
                date: today,
            })
            .await
            .map_err(|e| map_repository_error("sequence", e))?;
        let token_number = u32::try_from(token)
            .map_err(|_| Error::internal("token sequence exceeded u32 range"))?;
        let visit = Visit {
            id: VisitId::random(),
            patient_id: request.patient_id,
            doctor_id: doctor.id,
            department_id: doctor.department_id,
            visit_date: today,
            token_number,
            status: VisitStatus::Waiting,
            checked_in_at: now,
            consultation_started_at: None,
            checked_out_at: None,
            vitals: None,
            assessment: None,
            medicine_orders: Vec::new(),
            service_orders: Vec::new(),
        };
        self.visits
            .create(&visit)
            .await
            .map_err(|e| map_repository_error("visit", e))?;
        info!(
            visit_id = %visit.id,
            doctor_id = %doctor.id,
            token = token_number,
            "patient checked in"
        );
        Ok(visit)
    }

    /// `waiting → in_consultation`.
    pub async fn start_consultation(&self, id: VisitId) -> Result<Visit, Error> {
        self.transition(id, VisitStatus::InConsultation).await
    }

    /// `in_consultation → completed`.
    pub async fn complete(&self, id: VisitId) -> Result<Visit, Error> {
        self.transition(id, VisitStatus::Completed).await
    }

    /// `waiting → cancelled`.
    pub async fn cancel(&self, id: VisitId) -> Result<Visit, Error> {
        self.transition(id, VisitStatus::Cancelled).await
    }

    async fn transition(&self, id: VisitId, next: VisitStatus) -> Result<Visit, Error> {
        let mut visit = self.get(id).await?;
        let from = visit.status;
        if let Err(error) = visit.transition(next, self.clock.utc()) {
            warn!(visit_id = %id, %from, to = %next, "visit transition rejected");
            return Err(error);
        }
        self.save(&visit).await?;
        info!(visit_id = %id, %from, to = %next, "visit status changed");
        Ok(visit)
    }

    /// Record vitals on an open visit.
    pub async fn record_vitals(&self, id: VisitId, vitals: Vitals) -> Result<Visit, Error> {
        let mut visit = self.get(id).await?;
        visit.record_vitals(vitals)?;
        self.save(&visit).await?;
        info!(visit_id = %id, "vitals recorded");
        Ok(visit)
    }

    /// Record the assessment during consultation.
    pub async fn record_assessment(
        &self,
        id: VisitId,
        assessment: Assessment,
    ) -> Result<Visit, Error> {
        let mut visit = self.get(id).await?;
        visit.record_assessment(assessment)?;
        self.save(&visit).await?;
        info!(visit_id = %id, "assessment recorded");
        Ok(visit)
    }

    /// Replace medicine and service orders during consultation. Every
    /// ordered product must exist and be active.
    pub async fn replace_orders(&self, id: VisitId, orders: VisitOrders) -> Result<Visit, Error> {
        let mut visit = self.get(id).await?;
        let products: BTreeSet<_> = orders.medicine_orders.iter().map(|o| o.product_id).collect();
        for product_id in products {
            let product = self
                .products
                .find(product_id)
                .await
                .map_err(|e| map_repository_error("product", e))?;
            match product {
                Some(product) if product.is_active => {}
                Some(_) => {
                    return Err(field_value_error(
                        "medicineOrders.productId",
                        "inactive_product",
                        product_id.to_string(),
                        "product is inactive",
                    ));
                }
                None => {
                    return Err(field_value_error(
                        "medicineOrders.productId",
                        "unknown_product",
                        product_id.to_string(),
                        "product does not exist",
                    ));
                }
            }
        }
        visit.replace_orders(orders)?;
        self.save(&visit).await?;
        info!(
            visit_id = %id,
            medicines = visit.medicine_orders.len(),
            services = visit.service_orders.len(),
            "orders replaced"
        );
        Ok(visit)
    }

    /// Queue position and ETA for one visit.
    pub async fn estimate(&self, id: VisitId) -> Result<QueueEstimate, Error> {
        let visit = self.get(id).await?;
        let same_day = self.doctor_day(visit.doctor_id, visit.visit_date).await?;
        Ok(estimate_queue(
            &visit,
            &same_day,
            self.config.consultation_minutes,
            self.clock.utc(),
        ))
    }

    /// A doctor's visits on `date` by token, each with its estimate.
    pub async fn doctor_queue(
        &self,
        doctor_id: EmployeeId,
        date: Option<NaiveDate>,
    ) -> Result<Vec<QueueEntry>, Error> {
        let now = self.clock.utc();
        let date = date.unwrap_or_else(|| now.date_naive());
        self.employees
            .find(doctor_id)
            .await
            .map_err(|e| map_repository_error("employee", e))?
            .ok_or_else(|| not_found("doctor", doctor_id))?;
        let mut visits = self.doctor_day(doctor_id, date).await?;
        visits.sort_by_key(|v| v.token_number);
        let entries = visits
            .iter()
            .map(|visit| QueueEntry {
                estimate: estimate_queue(visit, &visits, self.config.consultation_minutes, now),
                visit: visit.clone(),
            })
            .collect();
        Ok(entries)
    }

    /// Fetch one visit.
    pub async fn get(&self, id: VisitId) -> Result<Visit, Error> {
        self.visits
            .find(id)
            .await
            .map_err(|e| map_repository_error("visit", e))?
            .ok_or_else(|| not_found("visit", id))
    }

    /// List visits.
    pub async fn list(
        &self,
        filter: &VisitFilter,
        page: PageRequest,
    ) -> Result<ListSlice<Visit>, Error> {
        self.visits
            .list(filter, page)
            .await
            .map_err(|e| map_repository_error("visit", e))
    }

    async fn save(&self, visit: &Visit) -> Result<(), Error> {
        self.visits
            .update(visit)
            .await
            .map_err(|e| map_repository_error("visit", e))
    }

    async fn doctor_day(
        &self,
        doctor_id: EmployeeId,
        date: NaiveDate,
    ) -> Result<Vec<Visit>, Error> {
        self.visits
            .for_doctor_on(doctor_id, date)
            .await
            .map_err(|e| map_repository_error("visit", e))
    }

    async fn consulting_doctor(&self, id: EmployeeId) -> Result<Employee, Error> {
        let doctor = self
            .employees
            .find(id)
            .await
            .map_err(|e| map_repository_error("employee", e))?
            .ok_or_else(|| not_found("doctor", id))?;
        if !doctor.is_active {
            return Err(field_error("doctorId", "inactive_doctor", "doctor is inactive"));
        }
        if !doctor.is_doctor() {
            return Err(field_error(
                "doctorId",
                "not_a_doctor",
                "employee does not take consultations",
            ));
        }
        Ok(doctor)
    }
}

#[cfg(test)]
#[path = "visit_service_tests.rs"]
mod tests;
