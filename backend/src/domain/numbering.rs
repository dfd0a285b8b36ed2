//! Human-readable document numbers allocated from monotonic sequences.

use std::fmt;

use chrono::NaiveDate;

use super::EmployeeId;

/// A named counter. Each kind advances independently and never reuses a
/// value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SequenceKind {
    /// Patient UHIDs; restart every calendar year.
    Uhid {
        /// Registration year.
        year: i32,
    },
    /// Pharmacy purchase intents.
    Intent,
    /// Goods received notes.
    Grn,
    /// Counter sales.
    CounterSale,
    /// Visit bills.
    Bill,
    /// Consultation tokens for one doctor on one day.
    Token {
        /// Consulting doctor.
        doctor_id: EmployeeId,
        /// Visit date.
        date: NaiveDate,
    },
}

impl SequenceKind {
    /// Prefix of `PREFIX-000001` style numbers, where the kind has one.
    pub const fn document_prefix(self) -> Option<&'static str> {
        match self {
            Self::Intent => Some("IND"),
            Self::Grn => Some("GRN"),
            Self::CounterSale => Some("CS"),
            Self::Bill => Some("BILL"),
            Self::Uhid { .. } | Self::Token { .. } => None,
        }
    }
}

impl fmt::Display for SequenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uhid { year } => write!(f, "uhid:{year}"),
            Self::Intent => f.write_str("intent"),
            Self::Grn => f.write_str("grn"),
            Self::CounterSale => f.write_str("counter_sale"),
            Self::Bill => f.write_str("bill"),
            Self::Token { doctor_id, date } => write!(f, "token:{doctor_id}:{date}"),
        }
    }
}

/// Format a document number such as `GRN-000042`.
///
/// ```
/// # use backend::domain::numbering::document_number;
/// assert_eq!(document_number("BILL", 7), "BILL-000007");
/// assert_eq!(document_number("CS", 1_234_567), "CS-1234567");
/// ```
pub fn document_number(prefix: &str, sequence: u64) -> String {
    format!("{prefix}-{sequence:06}")
}

/// Format a UHID: prefix, four-digit year, six-digit sequence.
///
/// ```
/// # use backend::domain::numbering::uhid;
/// assert_eq!(uhid("UH", 2026, 1), "UH2026000001");
/// ```
pub fn uhid(prefix: &str, year: i32, sequence: u64) -> String {
    format!("{prefix}{year:04}{sequence:06}")
}
