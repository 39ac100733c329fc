//! Exam and ultrasound database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{parse_stored_date, Database, DbError, DbResult};
use crate::gestation::GestationalAge;
use crate::models::{Exam, ExamStatus, Ultrasound};

impl Database {
    /// Insert an exam.
    pub fn insert_exam(&self, exam: &Exam) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO exams (exam_id, patient_id, name, date, result, status, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                exam.exam_id,
                exam.patient_id,
                exam.name,
                exam.date.to_string(),
                exam.result,
                exam.status.as_str(),
                exam.created_at,
            ],
        )?;
        Ok(())
    }

    /// Record a result for an exam.
    pub fn update_exam_result(
        &self,
        exam_id: &str,
        result: Option<&str>,
        status: ExamStatus,
    ) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE exams SET result = ?1, status = ?2 WHERE exam_id = ?3",
            params![result, status.as_str(), exam_id],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get an exam by ID.
    pub fn get_exam(&self, exam_id: &str) -> DbResult<Option<Exam>> {
        self.conn
            .query_row(
                r#"
                SELECT exam_id, patient_id, name, date, result, status, created_at
                FROM exams
                WHERE exam_id = ?
                "#,
                [exam_id],
                ExamRow::from_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// All exams for a patient, most recent first.
    pub fn list_exams_for_patient(&self, patient_id: &str) -> DbResult<Vec<Exam>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT exam_id, patient_id, name, date, result, status, created_at
            FROM exams
            WHERE patient_id = ?
            ORDER BY date DESC, created_at DESC
            "#,
        )?;

        let rows = stmt.query_map([patient_id], ExamRow::from_row)?;

        let mut exams = Vec::new();
        for row in rows {
            exams.push(row?.try_into()?);
        }
        Ok(exams)
    }

    /// Delete an exam.
    pub fn delete_exam(&self, exam_id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM exams WHERE exam_id = ?", [exam_id])?;
        Ok(rows_affected > 0)
    }

    /// Insert an ultrasound.
    pub fn insert_ultrasound(&self, ultrasound: &Ultrasound) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO ultrasounds (
                ultrasound_id, patient_id, exam_date, age_weeks, age_days,
                estimated_fetal_weight_g, percentile, notes, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                ultrasound.ultrasound_id,
                ultrasound.patient_id,
                ultrasound.exam_date.to_string(),
                ultrasound.age_at_exam.weeks(),
                ultrasound.age_at_exam.days(),
                ultrasound.estimated_fetal_weight_g,
                ultrasound.percentile,
                ultrasound.notes,
                ultrasound.created_at,
            ],
        )?;
        Ok(())
    }

    /// Get an ultrasound by ID.
    pub fn get_ultrasound(&self, ultrasound_id: &str) -> DbResult<Option<Ultrasound>> {
        self.conn
            .query_row(
                r#"
                SELECT ultrasound_id, patient_id, exam_date, age_weeks, age_days,
                       estimated_fetal_weight_g, percentile, notes, created_at
                FROM ultrasounds
                WHERE ultrasound_id = ?
                "#,
                [ultrasound_id],
                UltrasoundRow::from_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// All ultrasounds for a patient, oldest first (dating scan first).
    pub fn list_ultrasounds_for_patient(&self, patient_id: &str) -> DbResult<Vec<Ultrasound>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT ultrasound_id, patient_id, exam_date, age_weeks, age_days,
                   estimated_fetal_weight_g, percentile, notes, created_at
            FROM ultrasounds
            WHERE patient_id = ?
            ORDER BY exam_date ASC, created_at ASC
            "#,
        )?;

        let rows = stmt.query_map([patient_id], UltrasoundRow::from_row)?;

        let mut ultrasounds = Vec::new();
        for row in rows {
            ultrasounds.push(row?.try_into()?);
        }
        Ok(ultrasounds)
    }

    /// Delete an ultrasound.
    pub fn delete_ultrasound(&self, ultrasound_id: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "DELETE FROM ultrasounds WHERE ultrasound_id = ?",
            [ultrasound_id],
        )?;
        Ok(rows_affected > 0)
    }
}

/// Intermediate row struct for database mapping.
struct ExamRow {
    exam_id: String,
    patient_id: String,
    name: String,
    date: String,
    result: Option<String>,
    status: String,
    created_at: String,
}

impl ExamRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            exam_id: row.get(0)?,
            patient_id: row.get(1)?,
            name: row.get(2)?,
            date: row.get(3)?,
            result: row.get(4)?,
            status: row.get(5)?,
            created_at: row.get(6)?,
        })
    }
}

impl TryFrom<ExamRow> for Exam {
    type Error = DbError;

    fn try_from(row: ExamRow) -> Result<Self, Self::Error> {
        let status = ExamStatus::from_code(&row.status)
            .ok_or_else(|| DbError::Constraint(format!("Unknown exam status: {}", row.status)))?;

        Ok(Exam {
            exam_id: row.exam_id,
            patient_id: row.patient_id,
            name: row.name,
            date: parse_stored_date(&row.date)?,
            result: row.result,
            status,
            created_at: row.created_at,
        })
    }
}

/// Intermediate row struct for database mapping.
struct UltrasoundRow {
    ultrasound_id: String,
    patient_id: String,
    exam_date: String,
    age_weeks: u32,
    age_days: u32,
    estimated_fetal_weight_g: Option<f64>,
    percentile: Option<f64>,
    notes: String,
    created_at: String,
}

impl UltrasoundRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            ultrasound_id: row.get(0)?,
            patient_id: row.get(1)?,
            exam_date: row.get(2)?,
            age_weeks: row.get(3)?,
            age_days: row.get(4)?,
            estimated_fetal_weight_g: row.get(5)?,
            percentile: row.get(6)?,
            notes: row.get(7)?,
            created_at: row.get(8)?,
        })
    }
}

impl TryFrom<UltrasoundRow> for Ultrasound {
    type Error = DbError;

    fn try_from(row: UltrasoundRow) -> Result<Self, Self::Error> {
        Ok(Ultrasound {
            ultrasound_id: row.ultrasound_id,
            patient_id: row.patient_id,
            exam_date: parse_stored_date(&row.exam_date)?,
            age_at_exam: GestationalAge::new(row.age_weeks, row.age_days)?,
            estimated_fetal_weight_g: row.estimated_fetal_weight_g,
            percentile: row.percentile,
            notes: row.notes,
            created_at: row.created_at,
        })
    }
}
