//! SQLite schema definition.

/// Complete database schema for prenatal records.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Patients
-- ============================================================================

CREATE TABLE IF NOT EXISTS patients (
    patient_id TEXT PRIMARY KEY,
    document_id TEXT UNIQUE,                     -- CPF; NULL when not collected
    name TEXT NOT NULL,
    birth_date TEXT,                             -- YYYY-MM-DD
    contact TEXT,
    gravida INTEGER,
    para INTEGER,
    abortus INTEGER,
    risk TEXT NOT NULL DEFAULT 'low' CHECK (risk IN ('low', 'high')),
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_patients_name ON patients(name);

-- ============================================================================
-- Gestational Records (Superseded, never updated in place)
-- ============================================================================

CREATE TABLE IF NOT EXISTS gestational_records (
    record_id TEXT PRIMARY KEY,
    patient_id TEXT NOT NULL REFERENCES patients(patient_id) ON DELETE CASCADE,
    lmp_date TEXT NOT NULL,
    lmp_reliable INTEGER NOT NULL DEFAULT 1,
    us_exam_date TEXT,
    us_weeks INTEGER,
    us_days INTEGER CHECK (us_days IS NULL OR us_days BETWEEN 0 AND 6),
    official_basis TEXT NOT NULL DEFAULT 'lmp' CHECK (official_basis IN ('lmp', 'ultrasound')),
    recorded_at TEXT NOT NULL,
    superseded_at TEXT,
    CHECK (
        (us_exam_date IS NULL AND us_weeks IS NULL AND us_days IS NULL)
        OR (us_exam_date IS NOT NULL AND us_weeks IS NOT NULL AND us_days IS NOT NULL)
    )
);

-- At most one current record per patient
CREATE UNIQUE INDEX IF NOT EXISTS idx_gestational_current
    ON gestational_records(patient_id) WHERE superseded_at IS NULL;
CREATE INDEX IF NOT EXISTS idx_gestational_patient ON gestational_records(patient_id, recorded_at);

-- ============================================================================
-- Consultations
-- ============================================================================

CREATE TABLE IF NOT EXISTS consultations (
    consultation_id TEXT PRIMARY KEY,
    patient_id TEXT NOT NULL REFERENCES patients(patient_id) ON DELETE CASCADE,
    date TEXT NOT NULL,
    weight_kg REAL,
    bp_systolic INTEGER,
    bp_diastolic INTEGER,
    uterine_height_cm REAL,
    fetal_heart_rate_bpm INTEGER,
    fetal_movements TEXT CHECK (fetal_movements IS NULL OR fetal_movements IN ('present', 'absent')),
    notes TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    CHECK ((bp_systolic IS NULL) = (bp_diastolic IS NULL))
);

CREATE INDEX IF NOT EXISTS idx_consultations_patient ON consultations(patient_id, date);

-- ============================================================================
-- Exams
-- ============================================================================

CREATE TABLE IF NOT EXISTS exams (
    exam_id TEXT PRIMARY KEY,
    patient_id TEXT NOT NULL REFERENCES patients(patient_id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    date TEXT NOT NULL,
    result TEXT,
    status TEXT NOT NULL DEFAULT 'pending' CHECK (status IN ('normal', 'altered', 'pending')),
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_exams_patient ON exams(patient_id, date);
CREATE INDEX IF NOT EXISTS idx_exams_status ON exams(status);

-- ============================================================================
-- Ultrasounds
-- ============================================================================

CREATE TABLE IF NOT EXISTS ultrasounds (
    ultrasound_id TEXT PRIMARY KEY,
    patient_id TEXT NOT NULL REFERENCES patients(patient_id) ON DELETE CASCADE,
    exam_date TEXT NOT NULL,
    age_weeks INTEGER NOT NULL,
    age_days INTEGER NOT NULL CHECK (age_days BETWEEN 0 AND 6),
    estimated_fetal_weight_g REAL,
    percentile REAL,
    notes TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_ultrasounds_patient ON ultrasounds(patient_id, exam_date);

-- ============================================================================
-- Pending Items
-- ============================================================================

CREATE TABLE IF NOT EXISTS pending_items (
    item_id TEXT PRIMARY KEY,
    patient_id TEXT NOT NULL REFERENCES patients(patient_id) ON DELETE CASCADE,
    text TEXT NOT NULL,
    urgent INTEGER NOT NULL DEFAULT 0,
    done INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_pending_patient ON pending_items(patient_id);
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        conn.execute(
            "INSERT INTO patients (patient_id, name) VALUES ('p1', 'Maria')",
            [],
        )
        .unwrap();
        conn
    }

    #[test]
    fn test_schema_valid() {
        let conn = Connection::open_in_memory().unwrap();
        let result = conn.execute_batch(SCHEMA);
        assert!(result.is_ok(), "Schema should be valid SQL: {:?}", result);
    }

    #[test]
    fn test_schema_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        assert!(conn.execute_batch(SCHEMA).is_ok());
    }

    #[test]
    fn test_single_current_record_per_patient() {
        let conn = setup();

        conn.execute(
            "INSERT INTO gestational_records (record_id, patient_id, lmp_date, recorded_at) VALUES ('r1', 'p1', '2023-11-20', '2024-01-01T00:00:00Z')",
            [],
        )
        .unwrap();

        // Second current record for the same patient must fail
        let result = conn.execute(
            "INSERT INTO gestational_records (record_id, patient_id, lmp_date, recorded_at) VALUES ('r2', 'p1', '2023-11-21', '2024-01-02T00:00:00Z')",
            [],
        );
        assert!(result.is_err());

        // Superseded records may accumulate
        let result = conn.execute(
            "INSERT INTO gestational_records (record_id, patient_id, lmp_date, recorded_at, superseded_at) VALUES ('r0', 'p1', '2023-11-19', '2023-12-01T00:00:00Z', '2024-01-01T00:00:00Z')",
            [],
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_partial_ultrasound_rejected() {
        let conn = setup();

        let result = conn.execute(
            "INSERT INTO gestational_records (record_id, patient_id, lmp_date, us_exam_date, recorded_at) VALUES ('r1', 'p1', '2023-11-20', '2024-01-15', '2024-01-01T00:00:00Z')",
            [],
        );
        assert!(result.is_err());

        let result = conn.execute(
            "INSERT INTO ultrasounds (ultrasound_id, patient_id, exam_date, age_weeks, age_days) VALUES ('u1', 'p1', '2024-01-15', 8, 7)",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_cascade_delete() {
        let conn = setup();
        conn.execute(
            "INSERT INTO exams (exam_id, patient_id, name, date) VALUES ('e1', 'p1', 'TSH', '2024-06-01')",
            [],
        )
        .unwrap();

        conn.execute("DELETE FROM patients WHERE patient_id = 'p1'", [])
            .unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM exams", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}
