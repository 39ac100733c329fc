//! Pregnancy dashboard summary and consultation log.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::db::{Database, DbResult};
use crate::gestation::{self, BasisComparison, GestationalAge, GestationalRecord, GestationalResult};
use crate::models::{BloodPressure, Consultation, Exam, Patient, PendingItem};

/// Most recent vital signs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatestMeasurements {
    /// Visit the measurements come from
    pub date: NaiveDate,
    pub weight_kg: Option<f64>,
    pub blood_pressure: Option<BloodPressure>,
    pub fetal_heart_rate_bpm: Option<u32>,
}

impl From<&Consultation> for LatestMeasurements {
    fn from(consultation: &Consultation) -> Self {
        Self {
            date: consultation.date,
            weight_kg: consultation.weight_kg,
            blood_pressure: consultation.blood_pressure,
            fetal_heart_rate_bpm: consultation.fetal_heart_rate_bpm,
        }
    }
}

/// A consultation with values derived for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsultationLogEntry {
    pub consultation: Consultation,
    /// Gestational age on the visit date (`None` without dating)
    pub gestational_age: Option<GestationalAge>,
    /// Weight difference from the previous visit that recorded a weight
    pub weight_change_kg: Option<f64>,
}

/// Build the consultation log, most recent visit first.
///
/// `consultations` must be in chronological order, as returned by the store.
pub fn consultation_log(
    record: Option<&GestationalRecord>,
    consultations: &[Consultation],
) -> gestation::CalcResult<Vec<ConsultationLogEntry>> {
    let start = record.map(gestation::resolve_start_date).transpose()?;

    let mut previous_weight: Option<f64> = None;
    let mut entries = Vec::with_capacity(consultations.len());
    for consultation in consultations {
        let weight_change_kg = match (previous_weight, consultation.weight_kg) {
            (Some(before), Some(now)) => Some(round_tenth(now - before)),
            _ => None,
        };
        if consultation.weight_kg.is_some() {
            previous_weight = consultation.weight_kg;
        }

        entries.push(ConsultationLogEntry {
            consultation: consultation.clone(),
            gestational_age: start.map(|s| gestation::gestational_age_on(s, consultation.date)),
            weight_change_kg,
        });
    }

    entries.reverse();
    Ok(entries)
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Everything the pregnancy dashboard shows for one patient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PregnancySummary {
    pub patient: Patient,
    /// Reference date the derived values were computed for
    pub reference_date: NaiveDate,
    pub gestation: Option<GestationalResult>,
    /// LMP and ultrasound dating side by side
    pub dating_comparison: Option<BasisComparison>,
    pub latest_measurements: Option<LatestMeasurements>,
    /// Open items, urgent first
    pub pending_items: Vec<PendingItem>,
    /// Exams with altered results
    pub exam_alerts: Vec<Exam>,
    pub consultation_count: usize,
}

impl PregnancySummary {
    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Summary exporter.
pub struct SummaryExporter<'a> {
    db: &'a Database,
}

impl<'a> SummaryExporter<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Dashboard summary for a patient as of `reference`.
    pub fn export_patient(
        &self,
        patient_id: &str,
        reference: NaiveDate,
    ) -> DbResult<PregnancySummary> {
        let patient = self.db.require_patient(patient_id)?;
        let record = self.db.current_gestational_record(patient_id)?.map(|s| s.record);

        let gestation = record
            .as_ref()
            .map(|r| gestation::compute(r, reference))
            .transpose()?;
        let dating_comparison = record
            .as_ref()
            .map(|r| gestation::compare_bases(r, reference))
            .transpose()?;

        let consultations = self.db.list_consultations_for_patient(patient_id)?;
        let latest_measurements = consultations.last().map(LatestMeasurements::from);

        let pending_items = self
            .db
            .list_pending_items(patient_id)?
            .into_iter()
            .filter(|item| !item.done)
            .collect();

        let exam_alerts = self
            .db
            .list_exams_for_patient(patient_id)?
            .into_iter()
            .filter(Exam::is_alert)
            .collect();

        Ok(PregnancySummary {
            patient,
            reference_date: reference,
            gestation,
            dating_comparison,
            latest_measurements,
            pending_items,
            exam_alerts,
            consultation_count: consultations.len(),
        })
    }

    /// Consultation log for a patient.
    pub fn consultation_log(&self, patient_id: &str) -> DbResult<Vec<ConsultationLogEntry>> {
        self.db.require_patient(patient_id)?;
        let record = self.db.current_gestational_record(patient_id)?.map(|s| s.record);
        let consultations = self.db.list_consultations_for_patient(patient_id)?;
        Ok(consultation_log(record.as_ref(), &consultations)?)
    }
}
