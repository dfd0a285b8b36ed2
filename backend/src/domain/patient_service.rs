//! Patient registration and lookup.

use std::sync::Arc;

use chrono::Datelike;
use mockable::Clock;
use pagination::PageRequest;
use tracing::info;

use crate::domain::numbering::uhid;
use crate::domain::ports::{ListSlice, PatientFilter, PatientRepository, SequenceGenerator};
use crate::domain::service_support::{map_repository_error, not_found};
use crate::domain::{Error, Patient, PatientDraft, PatientId, PatientInput, SequenceKind};

/// Settings for UHID allocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientServiceConfig {
    /// Leading letters of every UHID.
    pub uhid_prefix: String,
}

impl Default for PatientServiceConfig {
    fn default() -> Self {
        Self {
            uhid_prefix: "UH".to_owned(),
        }
    }
}

/// Registers patients and serves demographic lookups.
#[derive(Clone)]
pub struct PatientService {
    patients: Arc<dyn PatientRepository>,
    sequences: Arc<dyn SequenceGenerator>,
    clock: Arc<dyn Clock>,
    config: PatientServiceConfig,
}

impl PatientService {
    /// Create the service.
    pub fn new(
        patients: Arc<dyn PatientRepository>,
        sequences: Arc<dyn SequenceGenerator>,
        clock: Arc<dyn Clock>,
        config: PatientServiceConfig,
    ) -> Self {
        Self {
            patients,
            sequences,
            clock,
            config,
        }
    }

    /// Validate demographics and register a patient under the next UHID.
    pub async fn register(&self, input: PatientInput) -> Result<Patient, Error> {
        let now = self.clock.utc();
        let draft = PatientDraft::new(input, now.date_naive())?;
        let year = now.year();
        let sequence = self
            .sequences
            .next(SequenceKind::Uhid { year })
            .await
            .map_err(|e| map_repository_error("sequence", e))?;
        let patient = Patient {
            id: PatientId::random(),
            uhid: uhid(&self.config.uhid_prefix, year, sequence),
            first_name: draft.first_name,
            last_name: draft.last_name,
            gender: draft.gender,
            date_of_birth: draft.date_of_birth,
            phone: draft.phone,
            email: draft.email,
            address: draft.address,
            blood_group: draft.blood_group,
            emergency_contact: draft.emergency_contact,
            registered_at: now,
        };
        self.patients
            .create(&patient)
            .await
            .map_err(|e| map_repository_error("patient", e))?;
        info!(patient_id = %patient.id, uhid = %patient.uhid, "patient registered");
        Ok(patient)
    }

    /// Replace demographics; the UHID never changes.
    pub async fn update(&self, id: PatientId, input: PatientInput) -> Result<Patient, Error> {
        let draft = PatientDraft::new(input, self.clock.utc().date_naive())?;
        let mut patient = self.get(id).await?;
        patient.apply(draft);
        self.patients
            .update(&patient)
            .await
            .map_err(|e| map_repository_error("patient", e))?;
        info!(patient_id = %id, uhid = %patient.uhid, "patient updated");
        Ok(patient)
    }

    /// Fetch by id.
    pub async fn get(&self, id: PatientId) -> Result<Patient, Error> {
        self.patients
            .find(id)
            .await
            .map_err(|e| map_repository_error("patient", e))?
            .ok_or_else(|| not_found("patient", id))
    }

    /// Fetch by UHID, ignoring case.
    pub async fn get_by_uhid(&self, uhid: &str) -> Result<Patient, Error> {
        let trimmed = uhid.trim();
        self.patients
            .find_by_uhid(trimmed)
            .await
            .map_err(|e| map_repository_error("patient", e))?
            .ok_or_else(|| not_found("patient", trimmed))
    }

    /// Search by UHID, name, or phone.
    pub async fn search(
        &self,
        filter: &PatientFilter,
        page: PageRequest,
    ) -> Result<ListSlice<Patient>, Error> {
        self.patients
            .search(filter, page)
            .await
            .map_err(|e| map_repository_error("patient", e))
    }

    /// Age in whole years at the current clock date.
    pub fn age_of(&self, patient: &Patient) -> u32 {
        patient.age_on(self.clock.utc().date_naive())
    }
}

#[cfg(test)]
#[path = "patient_service_tests.rs"]
mod tests;
