//! End-to-end tests against an on-disk record store.

use chrono::NaiveDate;
use prenatal_core::db::Database;
use prenatal_core::export::{ChartExporter, SummaryExporter};
use prenatal_core::gestation::{
    CalculationBasis, GestationalAge, GestationalRecord, LmpAnchor, UltrasoundAnchor,
};
use prenatal_core::listing::{PatientFilter, PatientList};
use prenatal_core::models::{
    BloodPressure, Consultation, Exam, ExamStatus, Patient, PendingItem, RiskStatus, Ultrasound,
};
use tempfile::TempDir;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_prenatal_workflow_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("prenatal.db");
    let reference = date(2024, 7, 10);

    let patient_id = {
        let db = Database::open(&path).unwrap();

        let mut patient = Patient::new("Maria Clara da Silva".into());
        patient.document_id = Some("123.456.789-00".into());
        db.insert_patient(&patient).unwrap();

        // First dating by LMP, later corrected by the dating scan
        let by_lmp = GestationalRecord::from_lmp(LmpAnchor::new(date(2023, 11, 20)));
        db.replace_gestational_record(&patient.patient_id, &by_lmp)
            .unwrap();

        let scan = Ultrasound::new(
            patient.patient_id.clone(),
            date(2024, 1, 15),
            GestationalAge::new(8, 1).unwrap(),
        );
        db.insert_ultrasound(&scan).unwrap();
        let corrected = by_lmp
            .with_ultrasound(scan.as_anchor())
            .with_basis(CalculationBasis::Ultrasound);
        db.replace_gestational_record(&patient.patient_id, &corrected)
            .unwrap();

        for (day, weight, height) in [(date(2024, 6, 12), 68.2, 29.0), (date(2024, 7, 10), 70.2, 32.0)] {
            let mut visit = Consultation::new(patient.patient_id.clone(), day);
            visit.weight_kg = Some(weight);
            visit.uterine_height_cm = Some(height);
            visit.blood_pressure = BloodPressure::parse("120/80");
            db.insert_consultation(&visit).unwrap();
        }

        let exam = Exam::new(patient.patient_id.clone(), "Urocultura".into(), date(2024, 6, 20));
        db.insert_exam(&exam).unwrap();
        db.update_exam_result(&exam.exam_id, Some("Positiva"), ExamStatus::Altered)
            .unwrap();

        db.insert_pending_item(&PendingItem::new(
            patient.patient_id.clone(),
            "Agendar curva glicêmica".into(),
            true,
        ))
        .unwrap();

        db.set_patient_risk(&patient.patient_id, RiskStatus::High)
            .unwrap();
        patient.patient_id
    };

    let db = Database::open(&path).unwrap();

    let history = db.gestational_history(&patient_id).unwrap();
    assert_eq!(history.len(), 2);
    assert!(!history[0].is_current());
    assert!(history[1].is_current());
    assert_eq!(history[0].record.official_basis, CalculationBasis::Lmp);

    let list = PatientList::new(&db);
    let entries = list.entries(PatientFilter::HighRisk, "silva", reference).unwrap();
    assert_eq!(entries.len(), 1);
    let gestation = entries[0].gestation.unwrap();
    assert_eq!(gestation.estimated_due_date, date(2024, 8, 25));
    assert_eq!(gestation.age, GestationalAge::new(33, 3).unwrap());

    let summary = SummaryExporter::new(&db)
        .export_patient(&patient_id, reference)
        .unwrap();
    assert_eq!(summary.consultation_count, 2);
    assert_eq!(summary.exam_alerts.len(), 1);
    assert_eq!(summary.pending_items.len(), 1);
    assert_eq!(summary.dating_comparison.unwrap().discrepancy_days, Some(1));

    let log = SummaryExporter::new(&db)
        .consultation_log(&patient_id)
        .unwrap();
    assert_eq!(log[0].weight_change_kg, Some(2.0));
    assert_eq!(log[0].gestational_age, Some(GestationalAge::new(33, 3).unwrap()));

    let charts = ChartExporter::new(&db).export_patient(&patient_id).unwrap();
    let weeks: Vec<u32> = charts.uterine_height.points.iter().map(|p| p.week).collect();
    assert_eq!(weeks, vec![29, 33]);
    assert_eq!(charts.uterine_height.to_csv(), "week,uterine_height_cm\n29,29\n33,32\n");
}

#[test]
fn test_deleting_patient_removes_records() {
    let db = Database::open_in_memory().unwrap();
    let patient = Patient::new("Ana Souza".into());
    db.insert_patient(&patient).unwrap();
    db.replace_gestational_record(
        &patient.patient_id,
        &GestationalRecord::from_lmp(LmpAnchor::new(date(2024, 3, 1))),
    )
    .unwrap();
    db.insert_consultation(&Consultation::new(patient.patient_id.clone(), date(2024, 5, 1)))
        .unwrap();

    assert!(db.delete_patient(&patient.patient_id).unwrap());
    assert!(db
        .current_gestational_record(&patient.patient_id)
        .unwrap()
        .is_none());
    assert!(db
        .list_consultations_for_patient(&patient.patient_id)
        .unwrap()
        .is_empty());
}
