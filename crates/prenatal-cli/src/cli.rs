use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};

/// Prenatal records and gestational dating.
#[derive(Parser, Debug)]
#[command(name = "prenatal", version, about = "Prenatal records and gestational dating")]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to TOML configuration file (default: ./prenatal.toml if present).
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the database path from config.
    #[arg(long, global = true)]
    pub database: Option<PathBuf>,

    /// Reference date for derived values (default: today).
    #[arg(long, global = true, value_parser = parse_date)]
    pub on: Option<NaiveDate>,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compute dating without touching the database.
    Calc(DatingArgs),
    /// Manage patients.
    Patient {
        #[command(subcommand)]
        command: PatientCommand,
    },
    /// Manage a patient's dating record.
    Dating {
        #[command(subcommand)]
        command: DatingCommand,
    },
    /// Record and review consultations.
    Consult {
        #[command(subcommand)]
        command: ConsultCommand,
    },
    /// Record and review lab exams.
    Exam {
        #[command(subcommand)]
        command: ExamCommand,
    },
    /// Record and review ultrasounds.
    Ultrasound {
        #[command(subcommand)]
        command: UltrasoundCommand,
    },
    /// Manage pending items.
    Pending {
        #[command(subcommand)]
        command: PendingCommand,
    },
    /// Export dashboard data.
    Export {
        #[command(subcommand)]
        command: ExportCommand,
    },
}

/// Dating form fields.
#[derive(clap::Args, Debug)]
pub struct DatingArgs {
    /// Last menstrual period (YYYY-MM-DD or DD/MM/YYYY).
    #[arg(long)]
    pub lmp: String,

    /// Mark the LMP as uncertain.
    #[arg(long)]
    pub lmp_uncertain: bool,

    /// Ultrasound exam date.
    #[arg(long, requires = "us_age")]
    pub us_date: Option<String>,

    /// Gestational age reported by the ultrasound, e.g. "8s 1d".
    #[arg(long, requires = "us_date")]
    pub us_age: Option<String>,

    /// Official calculation basis.
    #[arg(long, value_enum, default_value_t = BasisArg::Lmp)]
    pub basis: BasisArg,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum BasisArg {
    Lmp,
    Ultrasound,
}

#[derive(Subcommand, Debug)]
pub enum PatientCommand {
    /// Register a patient.
    Add {
        /// Full name
        name: String,
        /// Document number (CPF or similar)
        #[arg(long)]
        document: Option<String>,
        /// Birth date
        #[arg(long, value_parser = parse_date)]
        birth_date: Option<NaiveDate>,
        /// Phone or other contact
        #[arg(long)]
        contact: Option<String>,
        /// Number of pregnancies
        #[arg(long)]
        gravida: Option<u32>,
        /// Number of births
        #[arg(long)]
        para: Option<u32>,
        /// Number of abortions
        #[arg(long)]
        abortus: Option<u32>,
    },
    /// List patients with their current dating.
    List {
        /// Only high-risk patients
        #[arg(long, conflicts_with = "due_soon")]
        high_risk: bool,
        /// Only patients due within the configured window
        #[arg(long)]
        due_soon: bool,
        /// Override the due-soon window in days
        #[arg(long, requires = "due_soon")]
        within: Option<u32>,
        /// Name or document search term
        #[arg(short, long, default_value = "")]
        search: String,
    },
    /// Show one patient.
    Show {
        /// Patient ID
        id: String,
    },
    /// Set risk classification.
    Risk {
        /// Patient ID
        id: String,
        #[arg(value_enum)]
        risk: RiskArg,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RiskArg {
    Low,
    High,
}

#[derive(Subcommand, Debug)]
pub enum DatingCommand {
    /// Replace the patient's dating record.
    Set {
        /// Patient ID
        patient: String,
        #[command(flatten)]
        dating: DatingArgs,
    },
    /// Show current dating with LMP and ultrasound side by side.
    Show {
        /// Patient ID
        patient: String,
    },
    /// Show every dating record, oldest first.
    History {
        /// Patient ID
        patient: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConsultCommand {
    /// Record a consultation.
    Add {
        /// Patient ID
        patient: String,
        /// Visit date (default: reference date)
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
        /// Maternal weight in kg
        #[arg(long)]
        weight: Option<f64>,
        /// Blood pressure, e.g. "120/80"
        #[arg(long)]
        bp: Option<String>,
        /// Uterine height in cm
        #[arg(long)]
        uterine_height: Option<f64>,
        /// Fetal heart rate in bpm
        #[arg(long)]
        fhr: Option<u32>,
        /// Fetal movements
        #[arg(long, value_enum)]
        movements: Option<MovementsArg>,
        /// Free-text notes
        #[arg(long, default_value = "")]
        notes: String,
    },
    /// Consultation log, most recent first.
    List {
        /// Patient ID
        patient: String,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum MovementsArg {
    Present,
    Absent,
}

#[derive(Subcommand, Debug)]
pub enum ExamCommand {
    /// Request an exam (starts as pending).
    Add {
        /// Patient ID
        patient: String,
        /// Exam name
        name: String,
        /// Exam date (default: reference date)
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },
    /// Record an exam result.
    #[command(name = "result")]
    SetResult {
        /// Exam ID
        id: String,
        #[arg(value_enum)]
        status: ExamStatusArg,
        /// Result text
        #[arg(long)]
        text: Option<String>,
    },
    /// List exams, newest first.
    List {
        /// Patient ID
        patient: String,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExamStatusArg {
    Normal,
    Altered,
    Pending,
}

#[derive(Subcommand, Debug)]
pub enum UltrasoundCommand {
    /// Record an ultrasound.
    Add {
        /// Patient ID
        patient: String,
        /// Exam date
        #[arg(long, value_parser = parse_date)]
        date: NaiveDate,
        /// Gestational age reported by the exam, e.g. "8s 1d"
        #[arg(long)]
        age: String,
        /// Estimated fetal weight in grams
        #[arg(long)]
        efw: Option<f64>,
        /// Weight percentile
        #[arg(long)]
        percentile: Option<f64>,
        /// Free-text notes
        #[arg(long, default_value = "")]
        notes: String,
    },
    /// List ultrasounds, oldest first.
    List {
        /// Patient ID
        patient: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum PendingCommand {
    /// Add a pending item.
    Add {
        /// Patient ID
        patient: String,
        /// What needs doing
        text: String,
        /// Mark as urgent
        #[arg(long)]
        urgent: bool,
    },
    /// Flip an item between open and done.
    Toggle {
        /// Item ID
        id: String,
    },
    /// List pending items, urgent first.
    List {
        /// Patient ID
        patient: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ExportCommand {
    /// Dashboard summary as JSON.
    Summary {
        /// Patient ID
        patient: String,
    },
    /// Chart series.
    Charts {
        /// Patient ID
        patient: String,
        /// Output as CSV (one block per series)
        #[arg(long)]
        csv: bool,
    },
}

fn parse_date(text: &str) -> Result<NaiveDate, String> {
    prenatal_core::gestation::parse_calendar_date(text).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("prenatal").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_calc_args() {
        let cli = parse(&[
            "calc", "--lmp", "2023-11-20", "--us-date", "2024-01-15", "--us-age", "8s 1d",
            "--basis", "ultrasound", "--on", "2024-07-10",
        ]);
        assert_eq!(cli.on, NaiveDate::from_ymd_opt(2024, 7, 10));
        match cli.command {
            Command::Calc(args) => {
                assert_eq!(args.lmp, "2023-11-20");
                assert_eq!(args.us_age.as_deref(), Some("8s 1d"));
                assert_eq!(args.basis, BasisArg::Ultrasound);
                assert!(!args.lmp_uncertain);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_ultrasound_fields_go_together() {
        let result = Cli::try_parse_from(["prenatal", "calc", "--lmp", "2023-11-20", "--us-date", "2024-01-15"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = parse(&["patient", "list", "--due-soon", "--within", "14", "-vv", "--on", "10/07/2024"]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.on, NaiveDate::from_ymd_opt(2024, 7, 10));
        match cli.command {
            Command::Patient {
                command: PatientCommand::List { due_soon, within, high_risk, .. },
            } => {
                assert!(due_soon);
                assert!(!high_risk);
                assert_eq!(within, Some(14));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_rejects_bad_reference_date() {
        assert!(Cli::try_parse_from(["prenatal", "--on", "tomorrow", "patient", "list"]).is_err());
        assert!(Cli::try_parse_from(["prenatal", "patient", "list", "--high-risk", "--due-soon"]).is_err());
    }

    #[test]
    fn test_consult_add() {
        let cli = parse(&["consult", "add", "p-1", "--weight", "70.2", "--bp", "130/85", "--movements", "present"]);
        match cli.command {
            Command::Consult {
                command: ConsultCommand::Add { patient, weight, bp, movements, date, .. },
            } => {
                assert_eq!(patient, "p-1");
                assert_eq!(weight, Some(70.2));
                assert_eq!(bp.as_deref(), Some("130/85"));
                assert_eq!(movements, Some(MovementsArg::Present));
                assert!(date.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
