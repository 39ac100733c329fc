//! Gestational calculator.
//!
//! Derives the pregnancy start date, estimated due date (EDD) and
//! gestational age from a [`GestationalRecord`] and an explicit reference
//! date. Nothing here reads the clock: callers capture "today" once and pass
//! it in, so every function is a pure function of its arguments.
//!
//! ```text
//! GestationalRecord ──resolve_start_date──► start ──estimated_due_date──► EDD
//!                                             │
//!                         reference date ─────┴──gestational_age_on──► weeks + days
//! ```

mod age;
mod anchor;

pub use age::*;
pub use anchor::*;

use chrono::{DateTime, Days, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Length of a term pregnancy counted from the start date (40 weeks).
pub const PREGNANCY_DURATION_DAYS: u32 = 280;

/// Calculator errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GestationError {
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Malformed gestational age: {0}")]
    MalformedGestationalAge(String),
}

pub type CalcResult<T> = Result<T, GestationError>;

/// Dating derived for one reference date. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GestationalResult {
    /// Anchor actually used (after fallback)
    pub basis: CalculationBasis,
    /// Pregnancy start date
    pub start_date: NaiveDate,
    /// Estimated due date
    pub estimated_due_date: NaiveDate,
    /// Gestational age on the reference date
    pub age: GestationalAge,
}

impl GestationalResult {
    /// Signed days from `reference` to the EDD (negative once overdue).
    pub fn days_until_due(&self, reference: NaiveDate) -> i64 {
        (self.estimated_due_date - reference).num_days()
    }
}

/// LMP and ultrasound dating side by side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasisComparison {
    pub lmp: GestationalResult,
    pub ultrasound: Option<GestationalResult>,
    /// `lmp.start_date - ultrasound.start_date` in days
    pub discrepancy_days: Option<i64>,
}

/// Start date according to the record's effective basis.
pub fn resolve_start_date(record: &GestationalRecord) -> CalcResult<NaiveDate> {
    match (record.official_basis, record.ultrasound) {
        (CalculationBasis::Ultrasound, Some(ultrasound)) => ultrasound.implied_start_date(),
        (CalculationBasis::Ultrasound, None) => {
            tracing::debug!("ultrasound basis selected without an ultrasound anchor, using LMP");
            Ok(record.lmp.date)
        }
        (CalculationBasis::Lmp, _) => Ok(record.lmp.date),
    }
}

/// EDD: start date plus 280 days.
///
/// Saturates at [`NaiveDate::MAX`], which no clinical date approaches.
pub fn estimated_due_date(start_date: NaiveDate) -> NaiveDate {
    start_date
        .checked_add_days(Days::new(u64::from(PREGNANCY_DURATION_DAYS)))
        .unwrap_or(NaiveDate::MAX)
}

/// Completed weeks and days from `start_date` to `reference_date`.
///
/// A reference date before the start date yields zero instead of a
/// negative age.
pub fn gestational_age_on(start_date: NaiveDate, reference_date: NaiveDate) -> GestationalAge {
    let elapsed = (reference_date - start_date).num_days();
    if elapsed <= 0 {
        return GestationalAge::ZERO;
    }
    // NaiveDate spans well under u32::MAX days
    GestationalAge::from_total_days(u32::try_from(elapsed).unwrap_or(u32::MAX))
}

/// Full dating for `record` as of `reference_date`.
pub fn compute(record: &GestationalRecord, reference_date: NaiveDate) -> CalcResult<GestationalResult> {
    let start_date = resolve_start_date(record)?;
    Ok(GestationalResult {
        basis: record.effective_basis(),
        start_date,
        estimated_due_date: estimated_due_date(start_date),
        age: gestational_age_on(start_date, reference_date),
    })
}

/// Compute both the LMP and the ultrasound dating regardless of the
/// official basis.
pub fn compare_bases(record: &GestationalRecord, reference_date: NaiveDate) -> CalcResult<BasisComparison> {
    let lmp = compute(&record.with_basis(CalculationBasis::Lmp), reference_date)?;
    let ultrasound = match record.ultrasound {
        Some(_) => Some(compute(
            &record.with_basis(CalculationBasis::Ultrasound),
            reference_date,
        )?),
        None => None,
    };
    let discrepancy_days = ultrasound
        .as_ref()
        .map(|us| (lmp.start_date - us.start_date).num_days());

    Ok(BasisComparison {
        lmp,
        ultrasound,
        discrepancy_days,
    })
}

/// Calendar date of a timestamp in its own time zone.
pub fn calendar_date<Tz: TimeZone>(timestamp: &DateTime<Tz>) -> NaiveDate {
    timestamp.date_naive()
}
