//! Patient list: every patient with her current dating, filtered and searched.

mod filter;

pub use filter::*;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::db::{Database, DbResult};
use crate::gestation::{self, GestationalResult};
use crate::models::Patient;

/// One row of the patient list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientListEntry {
    pub patient: Patient,
    /// `None` when no dating has been entered yet
    pub gestation: Option<GestationalResult>,
}

/// Builds patient list views from the record store.
pub struct PatientList<'a> {
    db: &'a Database,
}

impl<'a> PatientList<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Patients passing `filter` and matching `search`, ordered by name,
    /// with gestational data computed for `reference`.
    pub fn entries(
        &self,
        filter: PatientFilter,
        search: &str,
        reference: NaiveDate,
    ) -> DbResult<Vec<PatientListEntry>> {
        let mut entries = Vec::new();
        for patient in self.db.list_patients()? {
            if !matches_search(&patient, search) {
                continue;
            }
            let gestation = self.gestation_for(&patient.patient_id, reference)?;
            if filter.accepts(&patient, gestation.as_ref(), reference) {
                entries.push(PatientListEntry { patient, gestation });
            }
        }

        tracing::debug!(?filter, count = entries.len(), "built patient list");
        Ok(entries)
    }

    /// Single entry for a patient.
    pub fn entry(&self, patient_id: &str, reference: NaiveDate) -> DbResult<PatientListEntry> {
        let patient = self.db.require_patient(patient_id)?;
        let gestation = self.gestation_for(patient_id, reference)?;
        Ok(PatientListEntry { patient, gestation })
    }

    fn gestation_for(
        &self,
        patient_id: &str,
        reference: NaiveDate,
    ) -> DbResult<Option<GestationalResult>> {
        self.db
            .current_gestational_record(patient_id)?
            .map(|stored| gestation::compute(&stored.record, reference))
            .transpose()
            .map_err(Into::into)
    }
}
