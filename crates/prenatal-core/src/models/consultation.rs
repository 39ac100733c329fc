//! Prenatal consultation records.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Arterial blood pressure in mmHg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BloodPressure {
    pub systolic: u32,
    pub diastolic: u32,
}

impl BloodPressure {
    /// Parse `"130/85"`, optionally followed by `mmHg`.
    pub fn parse(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        let value = trimmed
            .strip_suffix("mmHg")
            .or_else(|| trimmed.strip_suffix("mmhg"))
            .unwrap_or(trimmed)
            .trim();
        let (systolic, diastolic) = value.split_once('/')?;
        let systolic: u32 = systolic.trim().parse().ok()?;
        let diastolic: u32 = diastolic.trim().parse().ok()?;
        if diastolic == 0 || diastolic >= systolic {
            return None;
        }
        Some(Self {
            systolic,
            diastolic,
        })
    }

    /// At or above 140/90, the usual threshold for gestational hypertension.
    pub fn is_elevated(&self) -> bool {
        self.systolic >= 140 || self.diastolic >= 90
    }
}

impl fmt::Display for BloodPressure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.systolic, self.diastolic)
    }
}

/// Whether the patient reports fetal movements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetalMovements {
    Present,
    Absent,
}

impl FetalMovements {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetalMovements::Present => "present",
            FetalMovements::Absent => "absent",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_lowercase().as_str() {
            "present" => Some(FetalMovements::Present),
            "absent" => Some(FetalMovements::Absent),
            _ => None,
        }
    }
}

/// A single prenatal visit.
///
/// Gestational age at the visit is derived from the patient's current
/// dating record, so it is not stored here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Consultation {
    pub consultation_id: String,
    /// Patient local ID
    pub patient_id: String,
    /// Visit date
    pub date: NaiveDate,
    /// Maternal weight in kg
    pub weight_kg: Option<f64>,
    pub blood_pressure: Option<BloodPressure>,
    /// Fundal height in cm
    pub uterine_height_cm: Option<f64>,
    /// Fetal heart rate (BCF) in bpm
    pub fetal_heart_rate_bpm: Option<u32>,
    pub fetal_movements: Option<FetalMovements>,
    /// Free-text clinical notes
    pub notes: String,
    /// Creation timestamp
    pub created_at: String,
}

impl Consultation {
    /// Create an empty consultation for a visit date.
    pub fn new(patient_id: String, date: NaiveDate) -> Self {
        Self {
            consultation_id: uuid::Uuid::new_v4().to_string(),
            patient_id,
            date,
            weight_kg: None,
            blood_pressure: None,
            uterine_height_cm: None,
            fetal_heart_rate_bpm: None,
            fetal_movements: None,
            notes: String::new(),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}
