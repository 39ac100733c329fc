//! Consultation database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{parse_stored_date, Database, DbError, DbResult};
use crate::models::{BloodPressure, Consultation, FetalMovements};

const CONSULTATION_COLUMNS: &str = r#"
    consultation_id, patient_id, date, weight_kg, bp_systolic, bp_diastolic,
    uterine_height_cm, fetal_heart_rate_bpm, fetal_movements, notes, created_at
"#;

impl Database {
    /// Record a consultation.
    pub fn insert_consultation(&self, consultation: &Consultation) -> DbResult<()> {
        let bp = consultation.blood_pressure.as_ref();
        self.conn.execute(
            r#"
            INSERT INTO consultations (
                consultation_id, patient_id, date, weight_kg, bp_systolic, bp_diastolic,
                uterine_height_cm, fetal_heart_rate_bpm, fetal_movements, notes, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                consultation.consultation_id,
                consultation.patient_id,
                consultation.date.to_string(),
                consultation.weight_kg,
                bp.map(|b| b.systolic),
                bp.map(|b| b.diastolic),
                consultation.uterine_height_cm,
                consultation.fetal_heart_rate_bpm,
                consultation.fetal_movements.map(|m| m.as_str()),
                consultation.notes,
                consultation.created_at,
            ],
        )?;
        Ok(())
    }

    /// Get a consultation by ID.
    pub fn get_consultation(&self, consultation_id: &str) -> DbResult<Option<Consultation>> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {} FROM consultations WHERE consultation_id = ?",
                    CONSULTATION_COLUMNS
                ),
                [consultation_id],
                ConsultationRow::from_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// All consultations for a patient, oldest visit first.
    pub fn list_consultations_for_patient(&self, patient_id: &str) -> DbResult<Vec<Consultation>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {} FROM consultations
            WHERE patient_id = ?
            ORDER BY date ASC, created_at ASC
            "#,
            CONSULTATION_COLUMNS
        ))?;

        let rows = stmt.query_map([patient_id], ConsultationRow::from_row)?;

        let mut consultations = Vec::new();
        for row in rows {
            consultations.push(row?.try_into()?);
        }
        Ok(consultations)
    }

    /// Delete a consultation.
    pub fn delete_consultation(&self, consultation_id: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "DELETE FROM consultations WHERE consultation_id = ?",
            [consultation_id],
        )?;
        Ok(rows_affected > 0)
    }
}

/// Intermediate row struct for database mapping.
struct ConsultationRow {
    consultation_id: String,
    patient_id: String,
    date: String,
    weight_kg: Option<f64>,
    bp_systolic: Option<u32>,
    bp_diastolic: Option<u32>,
    uterine_height_cm: Option<f64>,
    fetal_heart_rate_bpm: Option<u32>,
    fetal_movements: Option<String>,
    notes: String,
    created_at: String,
}

impl ConsultationRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            consultation_id: row.get(0)?,
            patient_id: row.get(1)?,
            date: row.get(2)?,
            weight_kg: row.get(3)?,
            bp_systolic: row.get(4)?,
            bp_diastolic: row.get(5)?,
            uterine_height_cm: row.get(6)?,
            fetal_heart_rate_bpm: row.get(7)?,
            fetal_movements: row.get(8)?,
            notes: row.get(9)?,
            created_at: row.get(10)?,
        })
    }
}

impl TryFrom<ConsultationRow> for Consultation {
    type Error = DbError;

    fn try_from(row: ConsultationRow) -> Result<Self, Self::Error> {
        let fetal_movements = row
            .fetal_movements
            .map(|code| {
                FetalMovements::from_code(&code)
                    .ok_or_else(|| DbError::Constraint(format!("Unknown fetal movements: {}", code)))
            })
            .transpose()?;

        let blood_pressure = match (row.bp_systolic, row.bp_diastolic) {
            (Some(systolic), Some(diastolic)) => Some(BloodPressure {
                systolic,
                diastolic,
            }),
            _ => None,
        };

        Ok(Consultation {
            consultation_id: row.consultation_id,
            patient_id: row.patient_id,
            date: parse_stored_date(&row.date)?,
            weight_kg: row.weight_kg,
            blood_pressure,
            uterine_height_cm: row.uterine_height_cm,
            fetal_heart_rate_bpm: row.fetal_heart_rate_bpm,
            fetal_movements,
            notes: row.notes,
            created_at: row.created_at,
        })
    }
}
