//! Gestational record storage.
//!
//! Records are never updated in place. Replacing a patient's dating inserts
//! a new row and stamps the previous current row with `superseded_at`, in one
//! transaction.

use rusqlite::{params, OptionalExtension, Row};

use super::{parse_optional_date, parse_stored_date, Database, DbError, DbResult};
use crate::gestation::{
    CalculationBasis, GestationalAge, GestationalRecord, LmpAnchor, UltrasoundAnchor,
};

/// A stored gestational record with its bookkeeping columns.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredGestationalRecord {
    pub record_id: String,
    pub patient_id: String,
    pub record: GestationalRecord,
    pub recorded_at: String,
    pub superseded_at: Option<String>,
}

impl StoredGestationalRecord {
    pub fn is_current(&self) -> bool {
        self.superseded_at.is_none()
    }
}

const RECORD_COLUMNS: &str = r#"
    record_id, patient_id, lmp_date, lmp_reliable, us_exam_date,
    us_weeks, us_days, official_basis, recorded_at, superseded_at
"#;

impl Database {
    /// Make `record` the patient's current dating, superseding any previous one.
    pub fn replace_gestational_record(
        &self,
        patient_id: &str,
        record: &GestationalRecord,
    ) -> DbResult<StoredGestationalRecord> {
        self.require_patient(patient_id)?;

        let now = chrono::Utc::now().to_rfc3339();
        let stored = StoredGestationalRecord {
            record_id: uuid::Uuid::new_v4().to_string(),
            patient_id: patient_id.to_string(),
            record: *record,
            recorded_at: now.clone(),
            superseded_at: None,
        };

        let tx = self.conn.unchecked_transaction()?;
        let superseded = tx.execute(
            r#"
            UPDATE gestational_records SET superseded_at = ?1
            WHERE patient_id = ?2 AND superseded_at IS NULL
            "#,
            params![now, patient_id],
        )?;

        let ultrasound = record.ultrasound.as_ref();
        tx.execute(
            r#"
            INSERT INTO gestational_records (
                record_id, patient_id, lmp_date, lmp_reliable, us_exam_date,
                us_weeks, us_days, official_basis, recorded_at, superseded_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, NULL)
            "#,
            params![
                stored.record_id,
                stored.patient_id,
                record.lmp.date.to_string(),
                record.lmp.reliable,
                ultrasound.map(|us| us.exam_date.to_string()),
                ultrasound.map(|us| us.age_at_exam.weeks()),
                ultrasound.map(|us| us.age_at_exam.days()),
                record.official_basis.as_str(),
                stored.recorded_at,
            ],
        )?;
        tx.commit()?;

        tracing::debug!(
            patient_id,
            record_id = %stored.record_id,
            superseded,
            basis = record.official_basis.as_str(),
            "replaced gestational record"
        );
        Ok(stored)
    }

    /// Current dating record for a patient.
    pub fn current_gestational_record(
        &self,
        patient_id: &str,
    ) -> DbResult<Option<StoredGestationalRecord>> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {} FROM gestational_records WHERE patient_id = ? AND superseded_at IS NULL",
                    RECORD_COLUMNS
                ),
                [patient_id],
                RecordRow::from_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// Every dating record for a patient, oldest first.
    pub fn gestational_history(&self, patient_id: &str) -> DbResult<Vec<StoredGestationalRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {} FROM gestational_records
            WHERE patient_id = ?
            ORDER BY recorded_at ASC, superseded_at IS NULL ASC
            "#,
            RECORD_COLUMNS
        ))?;

        let rows = stmt.query_map([patient_id], RecordRow::from_row)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?.try_into()?);
        }
        Ok(records)
    }
}

/// Intermediate row struct for database mapping.
struct RecordRow {
    record_id: String,
    patient_id: String,
    lmp_date: String,
    lmp_reliable: bool,
    us_exam_date: Option<String>,
    us_weeks: Option<u32>,
    us_days: Option<u32>,
    official_basis: String,
    recorded_at: String,
    superseded_at: Option<String>,
}

impl RecordRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            record_id: row.get(0)?,
            patient_id: row.get(1)?,
            lmp_date: row.get(2)?,
            lmp_reliable: row.get(3)?,
            us_exam_date: row.get(4)?,
            us_weeks: row.get(5)?,
            us_days: row.get(6)?,
            official_basis: row.get(7)?,
            recorded_at: row.get(8)?,
            superseded_at: row.get(9)?,
        })
    }
}

impl TryFrom<RecordRow> for StoredGestationalRecord {
    type Error = DbError;

    fn try_from(row: RecordRow) -> Result<Self, Self::Error> {
        let official_basis = CalculationBasis::from_code(&row.official_basis).ok_or_else(|| {
            DbError::Constraint(format!("Unknown calculation basis: {}", row.official_basis))
        })?;

        let ultrasound = match (parse_optional_date(row.us_exam_date)?, row.us_weeks, row.us_days) {
            (Some(exam_date), Some(weeks), Some(days)) => Some(UltrasoundAnchor::new(
                exam_date,
                GestationalAge::new(weeks, days)?,
            )),
            (None, None, None) => None,
            _ => {
                return Err(DbError::Constraint(format!(
                    "Incomplete ultrasound anchor on record {}",
                    row.record_id
                )))
            }
        };

        Ok(StoredGestationalRecord {
            record_id: row.record_id,
            patient_id: row.patient_id,
            record: GestationalRecord {
                lmp: LmpAnchor {
                    date: parse_stored_date(&row.lmp_date)?,
                    reliable: row.lmp_reliable,
                },
                ultrasound,
                official_basis,
            },
            recorded_at: row.recorded_at,
            superseded_at: row.superseded_at,
        })
    }
}
