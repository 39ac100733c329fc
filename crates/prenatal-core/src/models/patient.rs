//! Patient models.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Clinical risk classification shown on the patient list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskStatus {
    #[default]
    Low,
    High,
}

impl RiskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskStatus::Low => "low",
            RiskStatus::High => "high",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_lowercase().as_str() {
            "low" => Some(RiskStatus::Low),
            "high" => Some(RiskStatus::High),
            _ => None,
        }
    }
}

/// Gravida / para / abortus counts. Unknown counts stay `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ObstetricHistory {
    /// Number of pregnancies, including the current one
    pub gravida: Option<u32>,
    /// Number of births
    pub para: Option<u32>,
    /// Number of abortions or miscarriages
    pub abortus: Option<u32>,
}

impl fmt::Display for ObstetricHistory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let part = |n: Option<u32>| n.map(|v| v.to_string()).unwrap_or_else(|| "-".into());
        write!(
            f,
            "G{}P{}A{}",
            part(self.gravida),
            part(self.para),
            part(self.abortus)
        )
    }
}

/// A pregnant patient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    /// Local UUID - always present, generated locally
    pub patient_id: String,
    /// National identity document (CPF); unique when present
    pub document_id: Option<String>,
    /// Full name
    pub name: String,
    pub birth_date: Option<NaiveDate>,
    /// Phone or e-mail
    pub contact: Option<String>,
    pub history: ObstetricHistory,
    pub risk: RiskStatus,
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub updated_at: String,
}

impl Patient {
    /// Create a new low-risk patient.
    pub fn new(name: String) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            patient_id: uuid::Uuid::new_v4().to_string(),
            document_id: None,
            name,
            birth_date: None,
            contact: None,
            history: ObstetricHistory::default(),
            risk: RiskStatus::Low,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    pub fn is_high_risk(&self) -> bool {
        self.risk == RiskStatus::High
    }

    /// Maternal age in completed years on `reference`.
    pub fn age_on(&self, reference: NaiveDate) -> Option<u32> {
        self.birth_date.and_then(|birth| reference.years_since(birth))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_patient() {
        let patient = Patient::new("Maria Clara da Silva".into());
        assert_eq!(patient.name, "Maria Clara da Silva");
        assert_eq!(patient.risk, RiskStatus::Low);
        assert!(!patient.is_high_risk());
        assert_eq!(patient.patient_id.len(), 36); // UUID format
    }

    #[test]
    fn test_age_on() {
        let mut patient = Patient::new("Ana".into());
        assert_eq!(patient.age_on(NaiveDate::from_ymd_opt(2024, 7, 10).unwrap()), None);

        patient.birth_date = NaiveDate::from_ymd_opt(1990, 7, 11);
        assert_eq!(
            patient.age_on(NaiveDate::from_ymd_opt(2024, 7, 10).unwrap()),
            Some(33)
        );
        assert_eq!(
            patient.age_on(NaiveDate::from_ymd_opt(2024, 7, 11).unwrap()),
            Some(34)
        );
    }

    #[test]
    fn test_history_display() {
        let history = ObstetricHistory {
            gravida: Some(2),
            para: Some(1),
            abortus: None,
        };
        assert_eq!(history.to_string(), "G2P1A-");
    }

    #[test]
    fn test_risk_codes() {
        assert_eq!(RiskStatus::from_code("HIGH"), Some(RiskStatus::High));
        assert_eq!(RiskStatus::from_code(RiskStatus::Low.as_str()), Some(RiskStatus::Low));
        assert_eq!(RiskStatus::from_code("medium"), None);
    }
}
