//! Prenatal Core Library
//!
//! Local-first prenatal record keeping built around a single gestational
//! calculator.
//!
//! # Architecture
//!
//! ```text
//!   LMP date ──┐
//!              ├──► GestationalRecord ──► gestation::compute(record, today)
//!   Dating US ─┘     (superseded,               │
//!                     never edited)             ▼
//!                                   start date · EDD · weeks + days
//!                                               │
//!                 ┌─────────────────┬───────────┴─────────┬──────────────────┐
//!                 ▼                 ▼                     ▼                  ▼
//!           Patient list    Dashboard summary    Consultation log      Chart series
//! ```
//!
//! # Core Principle
//!
//! **Derived dating is never stored.** Every view recomputes it from the
//! current record and an explicit reference date.
//!
//! # Modules
//!
//! - [`gestation`]: Gestational calculator (start date, EDD, age)
//! - [`models`]: Domain types (Patient, Consultation, Exam, Ultrasound, PendingItem)
//! - [`db`]: SQLite record store
//! - [`listing`]: Patient list filters and search
//! - [`export`]: Dashboard summary and chart series

pub mod db;
pub mod export;
pub mod gestation;
pub mod listing;
pub mod models;

// Re-export commonly used types
pub use db::{Database, StoredGestationalRecord};
pub use export::{ChartExporter, ChartSeries, PregnancySummary, SummaryExporter};
pub use gestation::{
    CalculationBasis, GestationalAge, GestationalRecord, GestationalResult, LmpAnchor,
    UltrasoundAnchor,
};
pub use listing::{PatientFilter, PatientList, PatientListEntry};
pub use models::{
    BloodPressure, Consultation, Exam, ExamStatus, FetalMovements, Patient, PendingItem,
    RiskStatus, Ultrasound,
};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

use chrono::NaiveDate;

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum PrenatalError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<db::DbError> for PrenatalError {
    fn from(e: db::DbError) -> Self {
        match e {
            db::DbError::NotFound(what) => PrenatalError::NotFound(what),
            db::DbError::Gestation(inner) => inner.into(),
            other => PrenatalError::DatabaseError(other.to_string()),
        }
    }
}

impl From<gestation::GestationError> for PrenatalError {
    fn from(e: gestation::GestationError) -> Self {
        PrenatalError::InvalidInput(e.to_string())
    }
}

impl From<serde_json::Error> for PrenatalError {
    fn from(e: serde_json::Error) -> Self {
        PrenatalError::SerializationError(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for PrenatalError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        PrenatalError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a database at the given path.
#[uniffi::export]
pub fn open_database(path: String) -> Result<Arc<PrenatalCore>, PrenatalError> {
    let db = Database::open(&path)?;
    Ok(Arc::new(PrenatalCore {
        db: Arc::new(Mutex::new(db)),
    }))
}

/// Create an in-memory database (for testing).
#[uniffi::export]
pub fn open_database_in_memory() -> Result<Arc<PrenatalCore>, PrenatalError> {
    let db = Database::open_in_memory()?;
    Ok(Arc::new(PrenatalCore {
        db: Arc::new(Mutex::new(db)),
    }))
}

/// Stateless dating from form text. Dates are `YYYY-MM-DD` (or
/// `DD/MM/YYYY`), the ultrasound age is `"8s 1d"`, the basis is `lmp` or
/// `ultrasound`.
#[uniffi::export]
pub fn compute_gestation(
    entry: FfiDatingEntry,
    reference_date: String,
) -> Result<FfiGestationalResult, PrenatalError> {
    let record = GestationalRecord::try_from(entry)?;
    let reference = gestation::parse_calendar_date(&reference_date)?;
    Ok(gestation::compute(&record, reference)?.into())
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe database wrapper for FFI.
#[derive(uniffi::Object)]
pub struct PrenatalCore {
    db: Arc<Mutex<Database>>,
}

#[uniffi::export]
impl PrenatalCore {
    // =========================================================================
    // Patient Operations
    // =========================================================================

    /// Register a new patient.
    pub fn create_patient(
        &self,
        name: String,
        document_id: Option<String>,
    ) -> Result<FfiPatient, PrenatalError> {
        if name.trim().is_empty() {
            return Err(PrenatalError::InvalidInput("patient name is required".into()));
        }
        let db = self.db.lock()?;
        let mut patient = Patient::new(name);
        patient.document_id = document_id;
        db.insert_patient(&patient)?;
        Ok(patient.into())
    }

    /// Get a patient by local ID.
    pub fn get_patient(&self, patient_id: String) -> Result<Option<FfiPatient>, PrenatalError> {
        let db = self.db.lock()?;
        let patient = db.get_patient(&patient_id)?;
        Ok(patient.map(|p| p.into()))
    }

    /// Change a patient's risk classification (`low` or `high`).
    pub fn set_patient_risk(&self, patient_id: String, risk: String) -> Result<bool, PrenatalError> {
        let risk = RiskStatus::from_code(&risk)
            .ok_or_else(|| PrenatalError::InvalidInput(format!("unknown risk status: {}", risk)))?;
        let db = self.db.lock()?;
        Ok(db.set_patient_risk(&patient_id, risk)?)
    }

    /// Patient list with dating computed for `reference_date`.
    pub fn list_patients(
        &self,
        filter: FfiPatientFilter,
        search: String,
        reference_date: String,
    ) -> Result<Vec<FfiPatientListEntry>, PrenatalError> {
        let reference = gestation::parse_calendar_date(&reference_date)?;
        let db = self.db.lock()?;
        let entries = PatientList::new(&db).entries(filter.into(), &search, reference)?;
        Ok(entries.into_iter().map(|e| e.into()).collect())
    }

    // =========================================================================
    // Dating Operations
    // =========================================================================

    /// Replace the patient's dating record and return the resulting dating.
    pub fn set_dating(
        &self,
        patient_id: String,
        entry: FfiDatingEntry,
        reference_date: String,
    ) -> Result<FfiGestationalResult, PrenatalError> {
        let record = GestationalRecord::try_from(entry)?;
        let reference = gestation::parse_calendar_date(&reference_date)?;
        let result = gestation::compute(&record, reference)?;

        let db = self.db.lock()?;
        db.replace_gestational_record(&patient_id, &record)?;
        Ok(result.into())
    }

    /// Current dating for a patient, if any was entered.
    pub fn current_gestation(
        &self,
        patient_id: String,
        reference_date: String,
    ) -> Result<Option<FfiGestationalResult>, PrenatalError> {
        let reference = gestation::parse_calendar_date(&reference_date)?;
        let db = self.db.lock()?;
        let entry = PatientList::new(&db).entry(&patient_id, reference)?;
        Ok(entry.gestation.map(|g| g.into()))
    }

    // =========================================================================
    // Consultation Operations
    // =========================================================================

    /// Record a consultation; returns its ID.
    pub fn add_consultation(&self, consultation: FfiConsultation) -> Result<String, PrenatalError> {
        let consultation = Consultation::try_from(consultation)?;
        let db = self.db.lock()?;
        db.require_patient(&consultation.patient_id)?;
        db.insert_consultation(&consultation)?;
        Ok(consultation.consultation_id)
    }

    /// Consultation log, most recent first.
    pub fn list_consultations(
        &self,
        patient_id: String,
    ) -> Result<Vec<FfiConsultationLogEntry>, PrenatalError> {
        let db = self.db.lock()?;
        let log = SummaryExporter::new(&db).consultation_log(&patient_id)?;
        Ok(log.into_iter().map(|e| e.into()).collect())
    }

    // =========================================================================
    // Pending Items
    // =========================================================================

    /// Flip a pending item between open and done.
    pub fn toggle_pending_item(&self, item_id: String) -> Result<bool, PrenatalError> {
        let db = self.db.lock()?;
        db.toggle_pending_item(&item_id)?
            .ok_or_else(|| PrenatalError::NotFound(format!("pending item {}", item_id)))
    }

    // =========================================================================
    // Export Operations
    // =========================================================================

    /// Dashboard summary as JSON.
    pub fn export_summary_json(
        &self,
        patient_id: String,
        reference_date: String,
    ) -> Result<String, PrenatalError> {
        let reference = gestation::parse_calendar_date(&reference_date)?;
        let db = self.db.lock()?;
        let summary = SummaryExporter::new(&db).export_patient(&patient_id, reference)?;
        Ok(summary.to_json()?)
    }

    /// Chart series as JSON.
    pub fn export_charts_json(&self, patient_id: String) -> Result<String, PrenatalError> {
        let db = self.db.lock()?;
        let charts = ChartExporter::new(&db).export_patient(&patient_id)?;
        Ok(charts.to_json()?)
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// Dating form as entered by the clinician.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDatingEntry {
    pub lmp_date: String,
    pub lmp_reliable: bool,
    pub ultrasound_date: Option<String>,
    pub ultrasound_age: Option<String>,
    pub official_basis: String,
}

impl TryFrom<FfiDatingEntry> for GestationalRecord {
    type Error = PrenatalError;

    fn try_from(entry: FfiDatingEntry) -> Result<Self, Self::Error> {
        let official_basis = CalculationBasis::from_code(&entry.official_basis).ok_or_else(|| {
            PrenatalError::InvalidInput(format!("unknown calculation basis: {}", entry.official_basis))
        })?;

        let lmp = LmpAnchor::parse(&entry.lmp_date, entry.lmp_reliable)?;
        let ultrasound = match (entry.ultrasound_date.as_deref(), entry.ultrasound_age.as_deref()) {
            (Some(date), Some(age)) => Some(UltrasoundAnchor::parse(date, age)?),
            (None, None) => None,
            _ => {
                return Err(PrenatalError::InvalidInput(
                    "ultrasound date and gestational age must be given together".into(),
                ))
            }
        };

        Ok(GestationalRecord {
            lmp,
            ultrasound,
            official_basis,
        })
    }
}

/// FFI-safe dating result.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiGestationalResult {
    pub basis: String,
    pub start_date: String,
    pub estimated_due_date: String,
    pub weeks: u32,
    pub days: u32,
}

impl From<GestationalResult> for FfiGestationalResult {
    fn from(result: GestationalResult) -> Self {
        Self {
            basis: result.basis.as_str().to_string(),
            start_date: result.start_date.to_string(),
            estimated_due_date: result.estimated_due_date.to_string(),
            weeks: result.age.weeks(),
            days: result.age.days(),
        }
    }
}

/// FFI-safe patient.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatient {
    pub patient_id: String,
    pub document_id: Option<String>,
    pub name: String,
    pub risk: String,
    pub obstetric_history: String,
}

impl From<Patient> for FfiPatient {
    fn from(patient: Patient) -> Self {
        Self {
            obstetric_history: patient.history.to_string(),
            risk: patient.risk.as_str().to_string(),
            patient_id: patient.patient_id,
            document_id: patient.document_id,
            name: patient.name,
        }
    }
}

/// FFI-safe patient list filter.
#[derive(Debug, Clone, uniffi::Enum)]
pub enum FfiPatientFilter {
    All,
    HighRisk,
    DueSoon { within_days: u32 },
}

impl From<FfiPatientFilter> for PatientFilter {
    fn from(filter: FfiPatientFilter) -> Self {
        match filter {
            FfiPatientFilter::All => PatientFilter::All,
            FfiPatientFilter::HighRisk => PatientFilter::HighRisk,
            FfiPatientFilter::DueSoon { within_days } => PatientFilter::DueSoon { within_days },
        }
    }
}

/// FFI-safe patient list row.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatientListEntry {
    pub patient: FfiPatient,
    pub gestation: Option<FfiGestationalResult>,
}

impl From<PatientListEntry> for FfiPatientListEntry {
    fn from(entry: PatientListEntry) -> Self {
        Self {
            patient: entry.patient.into(),
            gestation: entry.gestation.map(|g| g.into()),
        }
    }
}

/// FFI-safe consultation input.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiConsultation {
    pub patient_id: String,
    pub date: String,
    pub weight_kg: Option<f64>,
    /// `"130/85"`
    pub blood_pressure: Option<String>,
    pub uterine_height_cm: Option<f64>,
    pub fetal_heart_rate_bpm: Option<u32>,
    /// `present` or `absent`
    pub fetal_movements: Option<String>,
    pub notes: String,
}

impl TryFrom<FfiConsultation> for Consultation {
    type Error = PrenatalError;

    fn try_from(input: FfiConsultation) -> Result<Self, Self::Error> {
        let date: NaiveDate = gestation::parse_calendar_date(&input.date)?;
        let mut consultation = Consultation::new(input.patient_id, date);

        consultation.blood_pressure = input
            .blood_pressure
            .map(|text| {
                BloodPressure::parse(&text).ok_or_else(|| {
                    PrenatalError::InvalidInput(format!("invalid blood pressure: {}", text))
                })
            })
            .transpose()?;
        consultation.fetal_movements = input
            .fetal_movements
            .map(|code| {
                FetalMovements::from_code(&code).ok_or_else(|| {
                    PrenatalError::InvalidInput(format!("invalid fetal movements: {}", code))
                })
            })
            .transpose()?;
        consultation.weight_kg = input.weight_kg;
        consultation.uterine_height_cm = input.uterine_height_cm;
        consultation.fetal_heart_rate_bpm = input.fetal_heart_rate_bpm;
        consultation.notes = input.notes;
        Ok(consultation)
    }
}

/// FFI-safe consultation log row.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiConsultationLogEntry {
    pub consultation_id: String,
    pub date: String,
    /// `"32s 5d"`, absent without dating
    pub gestational_age: Option<String>,
    pub weight_kg: Option<f64>,
    pub weight_change_kg: Option<f64>,
    pub blood_pressure: Option<String>,
    pub fetal_heart_rate_bpm: Option<u32>,
    pub notes: String,
}

impl From<export::ConsultationLogEntry> for FfiConsultationLogEntry {
    fn from(entry: export::ConsultationLogEntry) -> Self {
        let c = entry.consultation;
        Self {
            consultation_id: c.consultation_id,
            date: c.date.to_string(),
            gestational_age: entry.gestational_age.map(|age| age.to_string()),
            weight_kg: c.weight_kg,
            weight_change_kg: entry.weight_change_kg,
            blood_pressure: c.blood_pressure.map(|bp| bp.to_string()),
            fetal_heart_rate_bpm: c.fetal_heart_rate_bpm,
            notes: c.notes,
        }
    }
}
