//! The payroll data model.
//!
//! [`PayslipRecord`] is the product of the extraction engine: every field is
//! optional, because a payslip with an unusual layout simply yields fewer
//! fields — absence means "not found", never an error. [`StoredRecord`]
//! wraps a `PayslipRecord` with the metadata the pipeline attaches before
//! persistence (source file, chat binding, retrieval timestamp).
//!
//! Invariants kept by the extraction engine:
//! * `national_id`, when present, is exactly 10 ASCII digits.
//! * Currency and quantity fields contain no grouping separators and only
//!   ASCII digits (Persian digits are folded during extraction).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A structured payroll record extracted from one payslip document.
///
/// Produced once per document by [`crate::extract::engine::extract`] and
/// never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayslipRecord {
    /// Personal (given) name.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub name: Option<String>,
    /// Family name.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub family_name: Option<String>,
    /// National identifier — exactly 10 ASCII digits when present.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub national_id: Option<String>,
    /// Personnel number assigned by the employer.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub personnel_number: Option<String>,
    /// Social insurance number.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub insurance_number: Option<String>,
    /// Employer (company) name.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub employer: Option<String>,
    /// Fiscal year, taken only from a four-digit first line.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub year: Option<String>,
    /// Fiscal month (Persian month name).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub month: Option<String>,
    /// Standard working days in the period.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub working_days: Option<String>,
    /// Base salary.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub base_salary: Option<String>,
    /// Housing allowance.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub housing_allowance: Option<String>,
    /// Food allowance.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub food_allowance: Option<String>,
    /// Gross salary (salary and benefits).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub gross_salary: Option<String>,
    /// Employee's share of the insurance contribution.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub employee_insurance: Option<String>,
    /// Food expense deduction.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub food_expense: Option<String>,
    /// Total deductions.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub total_deductions: Option<String>,
    /// Net payment amount.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub net_payment: Option<String>,
    /// Net payment amount spelled out in words.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub net_payment_text: Option<String>,
}

impl PayslipRecord {
    /// True when no field was extracted at all.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.family_name.is_none()
            && self.national_id.is_none()
            && self.personnel_number.is_none()
            && self.insurance_number.is_none()
            && self.employer.is_none()
            && self.year.is_none()
            && self.month.is_none()
            && self.working_days.is_none()
            && self.base_salary.is_none()
            && self.housing_allowance.is_none()
            && self.food_allowance.is_none()
            && self.gross_salary.is_none()
            && self.employee_insurance.is_none()
            && self.food_expense.is_none()
            && self.total_deductions.is_none()
            && self.net_payment.is_none()
            && self.net_payment_text.is_none()
    }
}

/// A persisted record: the extracted payslip plus delivery metadata.
///
/// Created once per ingested document. After creation only two fields ever
/// change: `chat_id` when a recipient completes registration, and
/// `last_retrieved` when a payslip is delivered on request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    /// Store-assigned identifier.
    pub id: u64,
    /// The extracted fields.
    #[serde(flatten)]
    pub payslip: PayslipRecord,
    /// Absolute path of the source document.
    pub source_file: PathBuf,
    /// Chat the record is bound to, null until the recipient is verified.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub chat_id: Option<i64>,
    /// Timestamp of the last successful retrieval by the recipient.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub last_retrieved: Option<DateTime<Utc>>,
    /// When the record was ingested.
    pub ingested_at: DateTime<Utc>,
}
