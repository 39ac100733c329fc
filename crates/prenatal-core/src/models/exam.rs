//! Laboratory and imaging exam models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::gestation::{GestationalAge, UltrasoundAnchor};

/// Review status of an exam result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExamStatus {
    Normal,
    /// Result outside the reference range
    Altered,
    /// Requested, no result yet
    Pending,
}

impl ExamStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExamStatus::Normal => "normal",
            ExamStatus::Altered => "altered",
            ExamStatus::Pending => "pending",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_lowercase().as_str() {
            "normal" => Some(ExamStatus::Normal),
            "altered" => Some(ExamStatus::Altered),
            "pending" => Some(ExamStatus::Pending),
            _ => None,
        }
    }
}

/// A requested or resulted exam.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Exam {
    pub exam_id: String,
    /// Patient local ID
    pub patient_id: String,
    /// Exam name (e.g. "Urocultura", "Glicemia de jejum")
    pub name: String,
    /// Collection or request date
    pub date: NaiveDate,
    /// Result as reported by the lab
    pub result: Option<String>,
    pub status: ExamStatus,
    /// Creation timestamp
    pub created_at: String,
}

impl Exam {
    /// Create a pending exam.
    pub fn new(patient_id: String, name: String, date: NaiveDate) -> Self {
        Self {
            exam_id: uuid::Uuid::new_v4().to_string(),
            patient_id,
            name,
            date,
            result: None,
            status: ExamStatus::Pending,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Altered results are surfaced as alerts.
    pub fn is_alert(&self) -> bool {
        self.status == ExamStatus::Altered
    }
}

/// An obstetric ultrasound.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ultrasound {
    pub ultrasound_id: String,
    /// Patient local ID
    pub patient_id: String,
    pub exam_date: NaiveDate,
    /// Gestational age estimated by the scan
    pub age_at_exam: GestationalAge,
    /// Estimated fetal weight in grams
    pub estimated_fetal_weight_g: Option<f64>,
    /// Growth percentile for the estimated weight
    pub percentile: Option<f64>,
    pub notes: String,
    /// Creation timestamp
    pub created_at: String,
}

impl Ultrasound {
    pub fn new(patient_id: String, exam_date: NaiveDate, age_at_exam: GestationalAge) -> Self {
        Self {
            ultrasound_id: uuid::Uuid::new_v4().to_string(),
            patient_id,
            exam_date,
            age_at_exam,
            estimated_fetal_weight_g: None,
            percentile: None,
            notes: String::new(),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Dating anchor derived from this scan.
    pub fn as_anchor(&self) -> UltrasoundAnchor {
        UltrasoundAnchor::new(self.exam_date, self.age_at_exam)
    }
}

/// The earliest scan, which is the one used for dating.
pub fn dating_scan(ultrasounds: &[Ultrasound]) -> Option<&Ultrasound> {
    ultrasounds.iter().min_by_key(|us| us.exam_date)
}
