//! Subcommand handlers. Each writes its report to the given writer.

use std::io::Write;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use tracing::info;

use prenatal_core::db::Database;
use prenatal_core::export::{ChartExporter, SummaryExporter};
use prenatal_core::gestation::{
    self, CalculationBasis, GestationalAge, GestationalRecord, GestationalResult, LmpAnchor,
    UltrasoundAnchor,
};
use prenatal_core::listing::{PatientFilter, PatientList};
use prenatal_core::models::{
    BloodPressure, Consultation, Exam, ExamStatus, FetalMovements, ObstetricHistory, Patient,
    PendingItem, RiskStatus, Ultrasound,
};

use crate::cli::{
    BasisArg, Command, ConsultCommand, DatingArgs, DatingCommand, ExamCommand, ExamStatusArg,
    ExportCommand, MovementsArg, PatientCommand, PendingCommand, RiskArg, UltrasoundCommand,
};
use crate::config::{ChartFormat, PrenatalConfig};

/// Build a dating record from form fields.
pub fn dating_record(args: &DatingArgs) -> Result<GestationalRecord> {
    let lmp = LmpAnchor::parse(&args.lmp, !args.lmp_uncertain)
        .with_context(|| format!("invalid LMP date: {}", args.lmp))?;
    let mut record = GestationalRecord::from_lmp(lmp).with_basis(match args.basis {
        BasisArg::Lmp => CalculationBasis::Lmp,
        BasisArg::Ultrasound => CalculationBasis::Ultrasound,
    });

    if let (Some(date), Some(age)) = (&args.us_date, &args.us_age) {
        let anchor = UltrasoundAnchor::parse(date, age).context("invalid ultrasound dating")?;
        record = record.with_ultrasound(anchor);
    }
    Ok(record)
}

/// Stateless calculator.
pub fn calc(args: &DatingArgs, reference: NaiveDate, out: &mut dyn Write) -> Result<()> {
    let record = dating_record(args)?;
    let comparison = gestation::compare_bases(&record, reference)?;
    let result = gestation::compute(&record, reference)?;

    write_dating(out, &result, reference)?;
    if let (Some(us), Some(discrepancy)) = (comparison.ultrasound, comparison.discrepancy_days) {
        writeln!(
            out,
            "LMP dating: EDD {} ({}) | ultrasound dating: EDD {} ({}) | difference {} days",
            comparison.lmp.estimated_due_date,
            comparison.lmp.age,
            us.estimated_due_date,
            us.age,
            discrepancy
        )?;
    }
    Ok(())
}

fn write_dating(out: &mut dyn Write, result: &GestationalResult, reference: NaiveDate) -> Result<()> {
    writeln!(out, "Basis:       {}", result.basis.as_str())?;
    writeln!(out, "Start date:  {}", result.start_date)?;
    writeln!(out, "Due date:    {}", result.estimated_due_date)?;
    writeln!(out, "Age on {}: {}", reference, result.age)?;
    Ok(())
}

/// Handlers that need the record store.
pub struct Session<'a> {
    pub db: &'a Database,
    pub config: &'a PrenatalConfig,
    /// "Today", captured once per invocation
    pub reference: NaiveDate,
}

impl<'a> Session<'a> {
    pub fn run(&self, command: Command, out: &mut dyn Write) -> Result<()> {
        match command {
            Command::Calc(args) => calc(&args, self.reference, out),
            Command::Patient { command } => self.patient(command, out),
            Command::Dating { command } => self.dating(command, out),
            Command::Consult { command } => self.consult(command, out),
            Command::Exam { command } => self.exam(command, out),
            Command::Ultrasound { command } => self.ultrasound(command, out),
            Command::Pending { command } => self.pending(command, out),
            Command::Export { command } => self.export(command, out),
        }
    }

    fn patient(&self, command: PatientCommand, out: &mut dyn Write) -> Result<()> {
        match command {
            PatientCommand::Add {
                name,
                document,
                birth_date,
                contact,
                gravida,
                para,
                abortus,
            } => {
                if name.trim().is_empty() {
                    bail!("patient name is required");
                }
                let mut patient = Patient::new(name.trim().to_string());
                patient.document_id = document;
                patient.birth_date = birth_date;
                patient.contact = contact;
                patient.history = ObstetricHistory {
                    gravida,
                    para,
                    abortus,
                };
                self.db
                    .insert_patient(&patient)
                    .context("failed to register patient")?;
                info!(patient_id = %patient.patient_id, "registered patient");
                writeln!(out, "{}", patient.patient_id)?;
            }
            PatientCommand::List {
                high_risk,
                due_soon,
                within,
                search,
            } => {
                let filter = if high_risk {
                    PatientFilter::HighRisk
                } else if due_soon {
                    PatientFilter::DueSoon {
                        within_days: within.unwrap_or(self.config.list.due_soon_days),
                    }
                } else {
                    PatientFilter::All
                };

                let entries = PatientList::new(self.db).entries(filter, &search, self.reference)?;
                for entry in entries {
                    let dating = match entry.gestation {
                        Some(g) => format!("{}  EDD {}", g.age, g.estimated_due_date),
                        None => "no dating".to_string(),
                    };
                    writeln!(
                        out,
                        "{}  {:<30}  {:<4}  {}",
                        entry.patient.patient_id,
                        entry.patient.name,
                        entry.patient.risk.as_str(),
                        dating
                    )?;
                }
            }
            PatientCommand::Show { id } => {
                let entry = PatientList::new(self.db).entry(&id, self.reference)?;
                let patient = &entry.patient;
                writeln!(out, "Name:     {}", patient.name)?;
                if let Some(document) = &patient.document_id {
                    writeln!(out, "Document: {}", document)?;
                }
                if let Some(age) = patient.age_on(self.reference) {
                    writeln!(out, "Age:      {}", age)?;
                }
                if let Some(contact) = &patient.contact {
                    writeln!(out, "Contact:  {}", contact)?;
                }
                writeln!(out, "History:  {}", patient.history)?;
                writeln!(out, "Risk:     {}", patient.risk.as_str())?;
                match &entry.gestation {
                    Some(result) => write_dating(out, result, self.reference)?,
                    None => writeln!(out, "No dating recorded")?,
                }
            }
            PatientCommand::Risk { id, risk } => {
                let risk = match risk {
                    RiskArg::Low => RiskStatus::Low,
                    RiskArg::High => RiskStatus::High,
                };
                if !self.db.set_patient_risk(&id, risk)? {
                    bail!("patient not found: {}", id);
                }
                writeln!(out, "{} is now {} risk", id, risk.as_str())?;
            }
        }
        Ok(())
    }

    fn dating(&self, command: DatingCommand, out: &mut dyn Write) -> Result<()> {
        match command {
            DatingCommand::Set { patient, dating } => {
                let record = dating_record(&dating)?;
                let result = gestation::compute(&record, self.reference)?;
                self.db
                    .replace_gestational_record(&patient, &record)
                    .with_context(|| format!("failed to store dating for {}", patient))?;
                write_dating(out, &result, self.reference)?;
            }
            DatingCommand::Show { patient } => {
                self.db.require_patient(&patient)?;
                let Some(stored) = self.db.current_gestational_record(&patient)? else {
                    bail!("no dating recorded for {}", patient);
                };
                let comparison = gestation::compare_bases(&stored.record, self.reference)?;
                let result = gestation::compute(&stored.record, self.reference)?;
                write_dating(out, &result, self.reference)?;
                writeln!(
                    out,
                    "LMP:        {} ({}) EDD {}",
                    stored.record.lmp.date,
                    if stored.record.lmp.reliable { "reliable" } else { "uncertain" },
                    comparison.lmp.estimated_due_date
                )?;
                if let (Some(anchor), Some(us)) = (stored.record.ultrasound, comparison.ultrasound) {
                    writeln!(
                        out,
                        "Ultrasound: {} at {} EDD {}",
                        anchor.exam_date, anchor.age_at_exam, us.estimated_due_date
                    )?;
                }
                if let Some(days) = comparison.discrepancy_days {
                    writeln!(out, "Difference: {} days", days)?;
                }
            }
            DatingCommand::History { patient } => {
                self.db.require_patient(&patient)?;
                for stored in self.db.gestational_history(&patient)? {
                    let state = if stored.is_current() { "current" } else { "superseded" };
                    let start = gestation::resolve_start_date(&stored.record)?;
                    writeln!(
                        out,
                        "{}  {:<10}  {:<10}  start {}",
                        stored.recorded_at,
                        state,
                        stored.record.effective_basis().as_str(),
                        start
                    )?;
                }
            }
        }
        Ok(())
    }

    fn consult(&self, command: ConsultCommand, out: &mut dyn Write) -> Result<()> {
        match command {
            ConsultCommand::Add {
                patient,
                date,
                weight,
                bp,
                uterine_height,
                fhr,
                movements,
                notes,
            } => {
                self.db.require_patient(&patient)?;
                let mut consultation = Consultation::new(patient, date.unwrap_or(self.reference));
                consultation.weight_kg = weight;
                consultation.blood_pressure = bp
                    .map(|text| {
                        BloodPressure::parse(&text)
                            .with_context(|| format!("invalid blood pressure: {}", text))
                    })
                    .transpose()?;
                consultation.uterine_height_cm = uterine_height;
                consultation.fetal_heart_rate_bpm = fhr;
                consultation.fetal_movements = movements.map(|m| match m {
                    MovementsArg::Present => FetalMovements::Present,
                    MovementsArg::Absent => FetalMovements::Absent,
                });
                consultation.notes = notes;

                self.db.insert_consultation(&consultation)?;
                if consultation
                    .blood_pressure
                    .map(|bp| bp.is_elevated())
                    .unwrap_or(false)
                {
                    writeln!(out, "warning: elevated blood pressure")?;
                }
                writeln!(out, "{}", consultation.consultation_id)?;
            }
            ConsultCommand::List { patient } => {
                let log = SummaryExporter::new(self.db).consultation_log(&patient)?;
                for entry in log {
                    let c = &entry.consultation;
                    writeln!(
                        out,
                        "{}  {:<7}  weight {}{}  bp {}  fhr {}",
                        c.date,
                        entry
                            .gestational_age
                            .map(|a| a.to_string())
                            .unwrap_or_else(|| "-".into()),
                        c.weight_kg.map(|w| format!("{w} kg")).unwrap_or_else(|| "-".into()),
                        entry
                            .weight_change_kg
                            .map(|d| format!(" ({d:+})"))
                            .unwrap_or_default(),
                        c.blood_pressure
                            .map(|bp| bp.to_string())
                            .unwrap_or_else(|| "-".into()),
                        c.fetal_heart_rate_bpm
                            .map(|f| f.to_string())
                            .unwrap_or_else(|| "-".into()),
                    )?;
                }
            }
        }
        Ok(())
    }

    fn exam(&self, command: ExamCommand, out: &mut dyn Write) -> Result<()> {
        match command {
            ExamCommand::Add {
                patient,
                name,
                date,
            } => {
                self.db.require_patient(&patient)?;
                let exam = Exam::new(patient, name, date.unwrap_or(self.reference));
                self.db.insert_exam(&exam)?;
                writeln!(out, "{}", exam.exam_id)?;
            }
            ExamCommand::SetResult { id, status, text } => {
                let status = match status {
                    ExamStatusArg::Normal => ExamStatus::Normal,
                    ExamStatusArg::Altered => ExamStatus::Altered,
                    ExamStatusArg::Pending => ExamStatus::Pending,
                };
                if !self.db.update_exam_result(&id, text.as_deref(), status)? {
                    bail!("exam not found: {}", id);
                }
                writeln!(out, "{} is now {}", id, status.as_str())?;
            }
            ExamCommand::List { patient } => {
                self.db.require_patient(&patient)?;
                for exam in self.db.list_exams_for_patient(&patient)? {
                    writeln!(
                        out,
                        "{}  {}  {:<8}  {}  {}",
                        exam.exam_id,
                        exam.date,
                        exam.status.as_str(),
                        exam.name,
                        exam.result.as_deref().unwrap_or("")
                    )?;
                }
            }
        }
        Ok(())
    }

    fn ultrasound(&self, command: UltrasoundCommand, out: &mut dyn Write) -> Result<()> {
        match command {
            UltrasoundCommand::Add {
                patient,
                date,
                age,
                efw,
                percentile,
                notes,
            } => {
                self.db.require_patient(&patient)?;
                let age: GestationalAge = age.parse().context("invalid gestational age")?;
                let mut scan = Ultrasound::new(patient, date, age);
                scan.estimated_fetal_weight_g = efw;
                scan.percentile = percentile;
                scan.notes = notes;
                self.db.insert_ultrasound(&scan)?;
                writeln!(out, "{}", scan.ultrasound_id)?;
            }
            UltrasoundCommand::List { patient } => {
                self.db.require_patient(&patient)?;
                for scan in self.db.list_ultrasounds_for_patient(&patient)? {
                    writeln!(
                        out,
                        "{}  {}  {:<7}  efw {}",
                        scan.ultrasound_id,
                        scan.exam_date,
                        scan.age_at_exam,
                        scan.estimated_fetal_weight_g
                            .map(|g| format!("{g} g"))
                            .unwrap_or_else(|| "-".into())
                    )?;
                }
            }
        }
        Ok(())
    }

    fn pending(&self, command: PendingCommand, out: &mut dyn Write) -> Result<()> {
        match command {
            PendingCommand::Add {
                patient,
                text,
                urgent,
            } => {
                self.db.require_patient(&patient)?;
                let item = PendingItem::new(patient, text, urgent);
                self.db.insert_pending_item(&item)?;
                writeln!(out, "{}", item.item_id)?;
            }
            PendingCommand::Toggle { id } => match self.db.toggle_pending_item(&id)? {
                Some(done) => writeln!(out, "{} {}", id, if done { "done" } else { "open" })?,
                None => bail!("pending item not found: {}", id),
            },
            PendingCommand::List { patient } => {
                self.db.require_patient(&patient)?;
                for item in self.db.list_pending_items(&patient)? {
                    writeln!(
                        out,
                        "{}  [{}]{}  {}",
                        item.item_id,
                        if item.done { "x" } else { " " },
                        if item.urgent { " !" } else { "  " },
                        item.text
                    )?;
                }
            }
        }
        Ok(())
    }

    fn export(&self, command: ExportCommand, out: &mut dyn Write) -> Result<()> {
        match command {
            ExportCommand::Summary { patient } => {
                let summary = SummaryExporter::new(self.db).export_patient(&patient, self.reference)?;
                writeln!(out, "{}", summary.to_json()?)?;
            }
            ExportCommand::Charts { patient, csv } => {
                let charts = ChartExporter::new(self.db).export_patient(&patient)?;
                if csv || self.config.export.chart_format == ChartFormat::Csv {
                    for series in [&charts.maternal_weight, &charts.uterine_height, &charts.fetal_weight] {
                        writeln!(out, "{}", series.to_csv())?;
                    }
                } else {
                    writeln!(out, "{}", charts.to_json()?)?;
                }
            }
        }
        Ok(())
    }
}
