//! Patient database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{parse_optional_date, Database, DbError, DbResult};
use crate::models::{ObstetricHistory, Patient, RiskStatus};

const PATIENT_COLUMNS: &str = r#"
    patient_id, document_id, name, birth_date, contact,
    gravida, para, abortus, risk, created_at, updated_at
"#;

impl Database {
    /// Insert a new patient.
    pub fn insert_patient(&self, patient: &Patient) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO patients (
                patient_id, document_id, name, birth_date, contact,
                gravida, para, abortus, risk, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                patient.patient_id,
                patient.document_id,
                patient.name,
                patient.birth_date.map(|d| d.to_string()),
                patient.contact,
                patient.history.gravida,
                patient.history.para,
                patient.history.abortus,
                patient.risk.as_str(),
                patient.created_at,
                patient.updated_at,
            ],
        )?;
        tracing::debug!(patient_id = %patient.patient_id, "inserted patient");
        Ok(())
    }

    /// Update an existing patient.
    pub fn update_patient(&self, patient: &Patient) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE patients SET
                document_id = ?2,
                name = ?3,
                birth_date = ?4,
                contact = ?5,
                gravida = ?6,
                para = ?7,
                abortus = ?8,
                risk = ?9,
                updated_at = datetime('now')
            WHERE patient_id = ?1
            "#,
            params![
                patient.patient_id,
                patient.document_id,
                patient.name,
                patient.birth_date.map(|d| d.to_string()),
                patient.contact,
                patient.history.gravida,
                patient.history.para,
                patient.history.abortus,
                patient.risk.as_str(),
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Change a patient's risk classification.
    pub fn set_patient_risk(&self, patient_id: &str, risk: RiskStatus) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE patients SET risk = ?, updated_at = datetime('now') WHERE patient_id = ?",
            [risk.as_str(), patient_id],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a patient by local ID.
    pub fn get_patient(&self, patient_id: &str) -> DbResult<Option<Patient>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM patients WHERE patient_id = ?", PATIENT_COLUMNS),
                [patient_id],
                PatientRow::from_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// Get a patient by identity document.
    pub fn get_patient_by_document(&self, document_id: &str) -> DbResult<Option<Patient>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM patients WHERE document_id = ?", PATIENT_COLUMNS),
                [document_id],
                PatientRow::from_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// Search patients by name prefix or exact document.
    pub fn search_patients(&self, query: &str, limit: usize) -> DbResult<Vec<Patient>> {
        let pattern = format!("{}%", query);
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {} FROM patients
            WHERE name LIKE ?1 OR document_id = ?2
            ORDER BY name
            LIMIT ?3
            "#,
            PATIENT_COLUMNS
        ))?;

        let rows = stmt.query_map(params![pattern, query, limit as i64], PatientRow::from_row)?;
        collect_patients(rows)
    }

    /// List all patients.
    pub fn list_patients(&self) -> DbResult<Vec<Patient>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM patients ORDER BY name",
            PATIENT_COLUMNS
        ))?;

        let rows = stmt.query_map([], PatientRow::from_row)?;
        collect_patients(rows)
    }

    /// Delete a patient and, by cascade, all of her records.
    pub fn delete_patient(&self, patient_id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM patients WHERE patient_id = ?", [patient_id])?;
        Ok(rows_affected > 0)
    }

    /// Fail with `NotFound` unless the patient exists.
    pub fn require_patient(&self, patient_id: &str) -> DbResult<Patient> {
        self.get_patient(patient_id)?
            .ok_or_else(|| DbError::NotFound(format!("patient {}", patient_id)))
    }
}

fn collect_patients(
    rows: impl Iterator<Item = rusqlite::Result<PatientRow>>,
) -> DbResult<Vec<Patient>> {
    let mut patients = Vec::new();
    for row in rows {
        patients.push(row?.try_into()?);
    }
    Ok(patients)
}

/// Intermediate row struct for database mapping.
struct PatientRow {
    patient_id: String,
    document_id: Option<String>,
    name: String,
    birth_date: Option<String>,
    contact: Option<String>,
    gravida: Option<u32>,
    para: Option<u32>,
    abortus: Option<u32>,
    risk: String,
    created_at: String,
    updated_at: String,
}

impl PatientRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            patient_id: row.get(0)?,
            document_id: row.get(1)?,
            name: row.get(2)?,
            birth_date: row.get(3)?,
            contact: row.get(4)?,
            gravida: row.get(5)?,
            para: row.get(6)?,
            abortus: row.get(7)?,
            risk: row.get(8)?,
            created_at: row.get(9)?,
            updated_at: row.get(10)?,
        })
    }
}

impl TryFrom<PatientRow> for Patient {
    type Error = DbError;

    fn try_from(row: PatientRow) -> Result<Self, Self::Error> {
        let risk = RiskStatus::from_code(&row.risk)
            .ok_or_else(|| DbError::Constraint(format!("Unknown risk status: {}", row.risk)))?;

        Ok(Patient {
            patient_id: row.patient_id,
            document_id: row.document_id,
            name: row.name,
            birth_date: parse_optional_date(row.birth_date)?,
            contact: row.contact,
            history: ObstetricHistory {
                gravida: row.gravida,
                para: row.para,
                abortus: row.abortus,
            },
            risk,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn setup_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[test]
    fn test_insert_and_get() {
        let db = setup_db();

        let mut patient = Patient::new("Maria Clara da Silva".into());
        patient.document_id = Some("123.456.789-00".into());
        patient.birth_date = NaiveDate::from_ymd_opt(1992, 3, 14);
        patient.history = ObstetricHistory {
            gravida: Some(2),
            para: Some(1),
            abortus: Some(0),
        };
        patient.risk = RiskStatus::High;

        db.insert_patient(&patient).unwrap();

        let retrieved = db.get_patient(&patient.patient_id).unwrap().unwrap();
        assert_eq!(retrieved, patient);
    }

    #[test]
    fn test_update_patient() {
        let db = setup_db();

        let mut patient = Patient::new("Ana".into());
        db.insert_patient(&patient).unwrap();

        patient.contact = Some("(11) 99999-0000".into());
        patient.history.gravida = Some(1);
        assert!(db.update_patient(&patient).unwrap());

        let retrieved = db.get_patient(&patient.patient_id).unwrap().unwrap();
        assert_eq!(retrieved.contact, Some("(11) 99999-0000".into()));
        assert_eq!(retrieved.history.gravida, Some(1));
    }

    #[test]
    fn test_set_risk() {
        let db = setup_db();
        let patient = Patient::new("Ana".into());
        db.insert_patient(&patient).unwrap();

        assert!(db.set_patient_risk(&patient.patient_id, RiskStatus::High).unwrap());
        assert!(db.require_patient(&patient.patient_id).unwrap().is_high_risk());
        assert!(!db.set_patient_risk("missing", RiskStatus::High).unwrap());
    }

    #[test]
    fn test_document_lookup_and_uniqueness() {
        let db = setup_db();

        let mut first = Patient::new("Ana".into());
        first.document_id = Some("111".into());
        db.insert_patient(&first).unwrap();

        let found = db.get_patient_by_document("111").unwrap().unwrap();
        assert_eq!(found.patient_id, first.patient_id);

        let mut duplicate = Patient::new("Beatriz".into());
        duplicate.document_id = Some("111".into());
        assert!(db.insert_patient(&duplicate).is_err());
    }

    #[test]
    fn test_search_patients() {
        let db = setup_db();

        let mut with_doc = Patient::new("Luana".into());
        with_doc.document_id = Some("999".into());
        db.insert_patient(&Patient::new("Maria".into())).unwrap();
        db.insert_patient(&Patient::new("Mariana".into())).unwrap();
        db.insert_patient(&with_doc).unwrap();

        let results = db.search_patients("Mari", 10).unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.iter().any(|p| p.name == "Maria"));
        assert!(results.iter().any(|p| p.name == "Mariana"));

        let results = db.search_patients("999", 10).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "Luana");
    }

    #[test]
    fn test_list_and_delete() {
        let db = setup_db();

        let beatriz = Patient::new("Beatriz".into());
        db.insert_patient(&beatriz).unwrap();
        db.insert_patient(&Patient::new("Ana".into())).unwrap();

        let names: Vec<String> = db.list_patients().unwrap().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["Ana", "Beatriz"]);

        assert!(db.delete_patient(&beatriz.patient_id).unwrap());
        assert!(db.get_patient(&beatriz.patient_id).unwrap().is_none());
        assert!(matches!(
            db.require_patient(&beatriz.patient_id),
            Err(DbError::NotFound(_))
        ));
    }
}
