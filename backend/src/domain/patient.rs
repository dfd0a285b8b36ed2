//! Patient registration records.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::validation::{
    bounded_text, email_address, field_error, field_value_error, optional_text, phone_number,
};
use super::{Error, PatientId};

/// Oldest accepted age at registration.
pub const MAX_AGE_YEARS: i32 = 150;

/// Recorded gender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    /// Male.
    Male,
    /// Female.
    Female,
    /// Other or undisclosed.
    Other,
}

impl FromStr for Gender {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "male" => Ok(Self::Male),
            "female" => Ok(Self::Female),
            "other" => Ok(Self::Other),
            _ => Err(field_value_error(
                "gender",
                "invalid_gender",
                s,
                "gender must be male, female, or other",
            )),
        }
    }
}

/// ABO blood group with Rh factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum BloodGroup {
    /// A positive.
    #[serde(rename = "A+")]
    APositive,
    /// A negative.
    #[serde(rename = "A-")]
    ANegative,
    /// B positive.
    #[serde(rename = "B+")]
    BPositive,
    /// B negative.
    #[serde(rename = "B-")]
    BNegative,
    /// AB positive.
    #[serde(rename = "AB+")]
    AbPositive,
    /// AB negative.
    #[serde(rename = "AB-")]
    AbNegative,
    /// O positive.
    #[serde(rename = "O+")]
    OPositive,
    /// O negative.
    #[serde(rename = "O-")]
    ONegative,
}

impl BloodGroup {
    const ALL: [BloodGroup; 8] = [
        Self::APositive,
        Self::ANegative,
        Self::BPositive,
        Self::BNegative,
        Self::AbPositive,
        Self::AbNegative,
        Self::OPositive,
        Self::ONegative,
    ];

    /// Conventional notation, e.g. `AB-`.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::APositive => "A+",
            Self::ANegative => "A-",
            Self::BPositive => "B+",
            Self::BNegative => "B-",
            Self::AbPositive => "AB+",
            Self::AbNegative => "AB-",
            Self::OPositive => "O+",
            Self::ONegative => "O-",
        }
    }
}

impl fmt::Display for BloodGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BloodGroup {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_uppercase();
        Self::ALL
            .into_iter()
            .find(|group| group.as_str() == wanted)
            .ok_or_else(|| {
                field_value_error(
                    "bloodGroup",
                    "invalid_blood_group",
                    s,
                    "bloodGroup must be one of A+, A-, B+, B-, AB+, AB-, O+, O-",
                )
            })
    }
}

/// Person to call in an emergency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyContact {
    /// Contact name.
    pub name: String,
    /// Relationship to the patient.
    pub relation: String,
    /// Contact number.
    pub phone: String,
}

/// A registered patient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    /// Stable identifier.
    pub id: PatientId,
    /// Unique hospital id; immutable after registration.
    pub uhid: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: Option<String>,
    /// Gender.
    pub gender: Gender,
    /// Date of birth.
    pub date_of_birth: NaiveDate,
    /// Contact number.
    pub phone: String,
    /// Lowercased email.
    pub email: Option<String>,
    /// Postal address.
    pub address: Option<String>,
    /// Blood group, when known.
    pub blood_group: Option<BloodGroup>,
    /// Emergency contact.
    pub emergency_contact: Option<EmergencyContact>,
    /// Registration timestamp.
    pub registered_at: DateTime<Utc>,
}

impl Patient {
    /// Display name.
    pub fn full_name(&self) -> String {
        match &self.last_name {
            Some(last) => format!("{} {last}", self.first_name),
            None => self.first_name.clone(),
        }
    }

    /// Age in whole years on `today`.
    pub fn age_on(&self, today: NaiveDate) -> u32 {
        age_in_years(self.date_of_birth, today)
    }

    /// Replace demographics. The UHID and id stay fixed.
    pub fn apply(&mut self, draft: PatientDraft) {
        self.first_name = draft.first_name;
        self.last_name = draft.last_name;
        self.gender = draft.gender;
        self.date_of_birth = draft.date_of_birth;
        self.phone = draft.phone;
        self.email = draft.email;
        self.address = draft.address;
        self.blood_group = draft.blood_group;
        self.emergency_contact = draft.emergency_contact;
    }

    /// `true` when `query` equals the UHID ignoring case, or appears in the
    /// name or phone.
    pub fn matches(&self, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.uhid.eq_ignore_ascii_case(&needle)
            || self.full_name().to_lowercase().contains(&needle)
            || self.phone.contains(&needle)
    }
}

/// Whole years between `birth` and `today`; zero when `today` precedes it.
pub fn age_in_years(birth: NaiveDate, today: NaiveDate) -> u32 {
    today.years_since(birth).unwrap_or(0)
}

/// Raw patient input prior to validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatientInput {
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: Option<String>,
    /// Gender wire value.
    pub gender: String,
    /// Date of birth.
    pub date_of_birth: Option<NaiveDate>,
    /// Contact number.
    pub phone: String,
    /// Email.
    pub email: Option<String>,
    /// Address.
    pub address: Option<String>,
    /// Blood group wire value.
    pub blood_group: Option<String>,
    /// Emergency contact.
    pub emergency_contact: Option<EmergencyContact>,
}

/// Validated demographics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientDraft {
    /// Trimmed given name.
    pub first_name: String,
    /// Trimmed family name.
    pub last_name: Option<String>,
    /// Gender.
    pub gender: Gender,
    /// Date of birth, within the last 150 years.
    pub date_of_birth: NaiveDate,
    /// Validated phone.
    pub phone: String,
    /// Lowercased email.
    pub email: Option<String>,
    /// Trimmed address.
    pub address: Option<String>,
    /// Blood group.
    pub blood_group: Option<BloodGroup>,
    /// Validated emergency contact.
    pub emergency_contact: Option<EmergencyContact>,
}

impl PatientDraft {
    /// Validate raw input against the clock date `today`.
    pub fn new(input: PatientInput, today: NaiveDate) -> Result<Self, Error> {
        let date_of_birth = input.date_of_birth.ok_or_else(|| {
            field_error("dateOfBirth", "missing_field", "dateOfBirth is required")
        })?;
        if date_of_birth > today {
            return Err(field_value_error(
                "dateOfBirth",
                "date_in_future",
                date_of_birth.to_string(),
                "dateOfBirth must not be in the future",
            ));
        }
        let earliest_year = today.year() - MAX_AGE_YEARS;
        // 29 February rolls forward to 1 March in non-leap years.
        let earliest = today
            .with_year(earliest_year)
            .or_else(|| NaiveDate::from_ymd_opt(earliest_year, 3, 1))
            .unwrap_or(NaiveDate::MIN);
        if date_of_birth < earliest {
            return Err(field_value_error(
                "dateOfBirth",
                "date_too_old",
                date_of_birth.to_string(),
                format!("dateOfBirth must be within the last {MAX_AGE_YEARS} years"),
            ));
        }
        let emergency_contact = input
            .emergency_contact
            .map(|contact| -> Result<_, Error> {
                Ok(EmergencyContact {
                    name: bounded_text("emergencyContact.name", &contact.name, 1, 80)?,
                    relation: bounded_text("emergencyContact.relation", &contact.relation, 1, 40)?,
                    phone: phone_number("emergencyContact.phone", &contact.phone)?,
                })
            })
            .transpose()?;
        Ok(Self {
            first_name: bounded_text("firstName", &input.first_name, 1, 80)?,
            last_name: optional_text("lastName", input.last_name.as_deref(), 80)?,
            gender: input.gender.trim().parse()?,
            date_of_birth,
            phone: phone_number("phone", &input.phone)?,
            email: match input.email.as_deref().map(str::trim) {
                None | Some("") => None,
                Some(raw) => Some(email_address("email", raw)?),
            },
            address: optional_text("address", input.address.as_deref(), 300)?,
            blood_group: match input.blood_group.as_deref().map(str::trim) {
                None | Some("") => None,
                Some(raw) => Some(raw.parse()?),
            },
            emergency_contact,
        })
    }
}
