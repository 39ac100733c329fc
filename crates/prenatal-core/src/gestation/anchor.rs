//! Dating anchors and the gestational record that owns them.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use super::{CalcResult, GestationError, GestationalAge};

/// Accepted text layouts for calendar dates (ISO first, then day/month/year).
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y"];

/// Parse a calendar date entered as text.
pub fn parse_calendar_date(text: &str) -> CalcResult<NaiveDate> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(GestationError::InvalidDate("date is missing".into()));
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
        .ok_or_else(|| GestationError::InvalidDate(trimmed.to_string()))
}

/// Last-menstrual-period anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LmpAnchor {
    /// First day of the last menstrual period
    pub date: NaiveDate,
    /// Whether the patient is confident about the date
    pub reliable: bool,
}

impl LmpAnchor {
    /// Create a reliable LMP anchor.
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            reliable: true,
        }
    }

    /// Build from entered text.
    pub fn parse(date: &str, reliable: bool) -> CalcResult<Self> {
        Ok(Self {
            date: parse_calendar_date(date)?,
            reliable,
        })
    }
}

/// Gestational age measured by an early ultrasound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UltrasoundAnchor {
    /// Date the scan was performed
    pub exam_date: NaiveDate,
    /// Gestational age reported by the scan
    pub age_at_exam: GestationalAge,
}

impl UltrasoundAnchor {
    pub fn new(exam_date: NaiveDate, age_at_exam: GestationalAge) -> Self {
        Self {
            exam_date,
            age_at_exam,
        }
    }

    /// Build from entered text, e.g. `("2024-01-15", "8s 1d")`.
    pub fn parse(exam_date: &str, age_at_exam: &str) -> CalcResult<Self> {
        Ok(Self {
            exam_date: parse_calendar_date(exam_date)?,
            age_at_exam: age_at_exam.parse()?,
        })
    }

    /// Pregnancy start date implied by the scan.
    pub fn implied_start_date(&self) -> CalcResult<NaiveDate> {
        let offset = self.age_at_exam.total_days();
        self.exam_date
            .checked_sub_days(Days::new(offset))
            .ok_or_else(|| {
                GestationError::InvalidDate(format!(
                    "{} minus {} is out of range",
                    self.exam_date, self.age_at_exam
                ))
            })
    }
}

/// Which anchor the clinician declared authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalculationBasis {
    #[default]
    Lmp,
    Ultrasound,
}

impl CalculationBasis {
    /// Stable storage code.
    pub fn as_str(&self) -> &'static str {
        match self {
            CalculationBasis::Lmp => "lmp",
            CalculationBasis::Ultrasound => "ultrasound",
        }
    }

    /// Inverse of [`as_str`](Self::as_str); also accepts the clinical
    /// abbreviations DUM and USG.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_lowercase().as_str() {
            "lmp" | "dum" => Some(CalculationBasis::Lmp),
            "ultrasound" | "usg" | "us" => Some(CalculationBasis::Ultrasound),
            _ => None,
        }
    }
}

/// Pregnancy dating inputs for one patient.
///
/// Records are values: edits produce a new record that supersedes the old
/// one rather than mutating it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GestationalRecord {
    pub lmp: LmpAnchor,
    pub ultrasound: Option<UltrasoundAnchor>,
    pub official_basis: CalculationBasis,
}

impl GestationalRecord {
    /// Record dated by LMP alone.
    pub fn from_lmp(lmp: LmpAnchor) -> Self {
        Self {
            lmp,
            ultrasound: None,
            official_basis: CalculationBasis::Lmp,
        }
    }

    /// Copy of this record with an ultrasound anchor attached.
    pub fn with_ultrasound(self, ultrasound: UltrasoundAnchor) -> Self {
        Self {
            ultrasound: Some(ultrasound),
            ..self
        }
    }

    /// Copy of this record with a different official basis.
    pub fn with_basis(self, official_basis: CalculationBasis) -> Self {
        Self {
            official_basis,
            ..self
        }
    }

    /// Basis actually used for calculation: ultrasound only when selected
    /// and present, LMP otherwise.
    pub fn effective_basis(&self) -> CalculationBasis {
        match (self.official_basis, self.ultrasound) {
            (CalculationBasis::Ultrasound, Some(_)) => CalculationBasis::Ultrasound,
            _ => CalculationBasis::Lmp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_calendar_date_formats() {
        assert_eq!(parse_calendar_date("2023-11-20").unwrap(), date(2023, 11, 20));
        assert_eq!(parse_calendar_date(" 20/11/2023 ").unwrap(), date(2023, 11, 20));
    }

    #[test]
    fn test_parse_calendar_date_invalid() {
        for text in ["", "   ", "2023-02-30", "yesterday", "2023/11/20"] {
            assert!(matches!(
                parse_calendar_date(text),
                Err(GestationError::InvalidDate(_))
            ));
        }
    }

    #[test]
    fn test_implied_start_date() {
        let anchor = UltrasoundAnchor::parse("2024-01-15", "8s 1d").unwrap();
        assert_eq!(anchor.implied_start_date().unwrap(), date(2023, 11, 19));
    }

    #[test]
    fn test_ultrasound_parse_errors_are_typed() {
        assert!(matches!(
            UltrasoundAnchor::parse("not a date", "8s 1d"),
            Err(GestationError::InvalidDate(_))
        ));
        assert!(matches!(
            UltrasoundAnchor::parse("2024-01-15", "8 weeks"),
            Err(GestationError::MalformedGestationalAge(_))
        ));
    }

    #[test]
    fn test_effective_basis_falls_back_to_lmp() {
        let record = GestationalRecord::from_lmp(LmpAnchor::new(date(2023, 11, 20)))
            .with_basis(CalculationBasis::Ultrasound);
        assert_eq!(record.effective_basis(), CalculationBasis::Lmp);

        let with_us = record.with_ultrasound(UltrasoundAnchor::new(
            date(2024, 1, 15),
            GestationalAge::new(8, 1).unwrap(),
        ));
        assert_eq!(with_us.effective_basis(), CalculationBasis::Ultrasound);
    }

    #[test]
    fn test_basis_codes() {
        assert_eq!(CalculationBasis::from_code("DUM"), Some(CalculationBasis::Lmp));
        assert_eq!(CalculationBasis::from_code("usg"), Some(CalculationBasis::Ultrasound));
        assert_eq!(CalculationBasis::from_code("ultrasound"), Some(CalculationBasis::Ultrasound));
        assert_eq!(CalculationBasis::from_code("other"), None);
        assert_eq!(
            CalculationBasis::from_code(CalculationBasis::Ultrasound.as_str()),
            Some(CalculationBasis::Ultrasound)
        );
    }
}
