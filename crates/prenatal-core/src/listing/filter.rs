//! Patient list filters and search matching.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strsim::jaro_winkler;

use crate::gestation::GestationalResult;
use crate::models::Patient;

/// Default window for [`PatientFilter::DueSoon`].
pub const DEFAULT_DUE_SOON_DAYS: u32 = 30;

/// Minimum Jaro-Winkler similarity for a fuzzy name token match.
pub const NAME_MATCH_THRESHOLD: f64 = 0.9;

/// Which patients to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatientFilter {
    #[default]
    All,
    HighRisk,
    /// EDD within `within_days` of the reference date
    DueSoon { within_days: u32 },
}

impl PatientFilter {
    /// Whether a patient with the given dating passes this filter.
    pub fn accepts(
        &self,
        patient: &Patient,
        gestation: Option<&GestationalResult>,
        reference: NaiveDate,
    ) -> bool {
        match self {
            PatientFilter::All => true,
            PatientFilter::HighRisk => patient.is_high_risk(),
            PatientFilter::DueSoon { within_days } => gestation
                .map(|g| {
                    let remaining = g.days_until_due(reference);
                    remaining >= 0 && remaining <= i64::from(*within_days)
                })
                .unwrap_or(false),
        }
    }
}

/// Case- and accent-insensitive search over name and document.
pub fn matches_search(patient: &Patient, term: &str) -> bool {
    let term = fold(term.trim());
    if term.is_empty() {
        return true;
    }

    let name = fold(&patient.name);
    if name.contains(&term) {
        return true;
    }

    if let Some(document) = &patient.document_id {
        if fold(document).contains(&term) {
            return true;
        }
    }

    name.split_whitespace()
        .any(|token| jaro_winkler(token, &term) >= NAME_MATCH_THRESHOLD)
}

/// Lowercase and strip the diacritics common in Portuguese names.
fn fold(text: &str) -> String {
    text.chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            other => other,
        })
        .collect()
}
