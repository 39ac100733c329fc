//! Chart series for the pregnancy dashboard and ultrasound growth view.

use serde::{Deserialize, Serialize};

use crate::db::{Database, DbError, DbResult};
use crate::gestation::{self, GestationalRecord};
use crate::models::{Consultation, Ultrasound};

/// One point on a chart, keyed by completed gestational week.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub week: u32,
    pub value: f64,
}

/// A named measurement series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub name: String,
    pub unit: String,
    pub points: Vec<SeriesPoint>,
}

impl ChartSeries {
    fn new(name: &str, unit: &str, mut points: Vec<SeriesPoint>) -> Self {
        points.sort_by_key(|p| p.week);
        Self {
            name: name.to_string(),
            unit: unit.to_string(),
            points,
        }
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Export to CSV format.
    pub fn to_csv(&self) -> String {
        let mut csv = String::new();

        // Header
        csv.push_str(&format!("week,{}\n", csv_header(&self.name, &self.unit)));

        for point in &self.points {
            csv.push_str(&format!("{},{}\n", point.week, point.value));
        }

        csv
    }
}

fn csv_header(name: &str, unit: &str) -> String {
    format!("{}_{}", name, unit).replace(|c: char| c == ',' || c == ' ', "_")
}

/// Maternal weight by gestational week at each visit.
pub fn maternal_weight_series(
    record: &GestationalRecord,
    consultations: &[Consultation],
) -> gestation::CalcResult<ChartSeries> {
    visit_series(record, consultations, "maternal_weight", "kg", |c| c.weight_kg)
}

/// Fundal height by gestational week at each visit.
pub fn uterine_height_series(
    record: &GestationalRecord,
    consultations: &[Consultation],
) -> gestation::CalcResult<ChartSeries> {
    visit_series(record, consultations, "uterine_height", "cm", |c| c.uterine_height_cm)
}

/// Estimated fetal weight at the age reported by each scan.
pub fn fetal_weight_series(ultrasounds: &[Ultrasound]) -> ChartSeries {
    let points = ultrasounds
        .iter()
        .filter_map(|us| {
            us.estimated_fetal_weight_g.map(|value| SeriesPoint {
                week: us.age_at_exam.weeks(),
                value,
            })
        })
        .collect();
    ChartSeries::new("estimated_fetal_weight", "g", points)
}

fn visit_series(
    record: &GestationalRecord,
    consultations: &[Consultation],
    name: &str,
    unit: &str,
    measure: impl Fn(&Consultation) -> Option<f64>,
) -> gestation::CalcResult<ChartSeries> {
    let start = gestation::resolve_start_date(record)?;
    let points = consultations
        .iter()
        .filter_map(|c| {
            measure(c).map(|value| SeriesPoint {
                week: gestation::gestational_age_on(start, c.date).weeks(),
                value,
            })
        })
        .collect();
    Ok(ChartSeries::new(name, unit, points))
}

/// Patient-level chart bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientCharts {
    pub patient_id: String,
    pub maternal_weight: ChartSeries,
    pub uterine_height: ChartSeries,
    pub fetal_weight: ChartSeries,
}

impl PatientCharts {
    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Chart exporter.
pub struct ChartExporter<'a> {
    db: &'a Database,
}

impl<'a> ChartExporter<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Build every series for a patient. Requires a dating record.
    pub fn export_patient(&self, patient_id: &str) -> DbResult<PatientCharts> {
        self.db.require_patient(patient_id)?;
        let stored = self
            .db
            .current_gestational_record(patient_id)?
            .ok_or_else(|| DbError::NotFound(format!("gestational record for {}", patient_id)))?;

        let consultations = self.db.list_consultations_for_patient(patient_id)?;
        let ultrasounds = self.db.list_ultrasounds_for_patient(patient_id)?;

        Ok(PatientCharts {
            patient_id: patient_id.to_string(),
            maternal_weight: maternal_weight_series(&stored.record, &consultations)?,
            uterine_height: uterine_height_series(&stored.record, &consultations)?,
            fetal_weight: fetal_weight_series(&ultrasounds),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gestation::{GestationalAge, LmpAnchor};
    use crate::models::Patient;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record() -> GestationalRecord {
        GestationalRecord::from_lmp(LmpAnchor::new(date(2023, 11, 20)))
    }

    fn visit(d: NaiveDate, weight: Option<f64>, height: Option<f64>) -> Consultation {
        let mut c = Consultation::new("p".into(), d);
        c.weight_kg = weight;
        c.uterine_height_cm = height;
        c
    }

    #[test]
    fn test_weight_series_by_week() {
        let visits = vec![
            visit(date(2024, 7, 10), Some(70.2), Some(32.0)),
            visit(date(2024, 6, 12), Some(68.2), None),
            visit(date(2024, 6, 26), None, Some(31.0)),
        ];

        let weight = maternal_weight_series(&record(), &visits).unwrap();
        assert_eq!(
            weight.points,
            vec![
                SeriesPoint { week: 29, value: 68.2 },
                SeriesPoint { week: 33, value: 70.2 },
            ]
        );

        let height = uterine_height_series(&record(), &visits).unwrap();
        assert_eq!(height.points.len(), 2);
        assert_eq!(height.points[0].week, 31);
    }

    #[test]
    fn test_fetal_weight_series() {
        let mut early = Ultrasound::new("p".into(), date(2024, 1, 15), GestationalAge::new(8, 1).unwrap());
        early.estimated_fetal_weight_g = None;
        let mut late = Ultrasound::new("p".into(), date(2024, 5, 20), GestationalAge::new(26, 1).unwrap());
        late.estimated_fetal_weight_g = Some(910.0);

        let series = fetal_weight_series(&[late, early]);
        assert_eq!(series.points, vec![SeriesPoint { week: 26, value: 910.0 }]);
    }

    #[test]
    fn test_csv() {
        let series = ChartSeries::new(
            "maternal_weight",
            "kg",
            vec![SeriesPoint { week: 12, value: 61.2 }, SeriesPoint { week: 8, value: 60.5 }],
        );
        assert_eq!(series.to_csv(), "week,maternal_weight_kg\n8,60.5\n12,61.2\n");
    }

    #[test]
    fn test_export_requires_dating() {
        let db = Database::open_in_memory().unwrap();
        let patient = Patient::new("Maria".into());
        db.insert_patient(&patient).unwrap();

        let exporter = ChartExporter::new(&db);
        assert!(matches!(
            exporter.export_patient(&patient.patient_id),
            Err(DbError::NotFound(_))
        ));

        db.replace_gestational_record(&patient.patient_id, &record())
            .unwrap();
        let mut c = Consultation::new(patient.patient_id.clone(), date(2024, 7, 10));
        c.weight_kg = Some(70.2);
        db.insert_consultation(&c).unwrap();

        let charts = exporter.export_patient(&patient.patient_id).unwrap();
        assert_eq!(charts.maternal_weight.points, vec![SeriesPoint { week: 33, value: 70.2 }]);
        assert!(charts.fetal_weight.points.is_empty());
        assert!(charts.to_json().unwrap().contains("maternal_weight"));
    }
}
