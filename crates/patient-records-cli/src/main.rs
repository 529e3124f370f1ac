use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use patient_records_core::config::DATABASE_ENV_VAR;
use patient_records_core::{
    Database, Gender, ImportConfig, Patient, PatientInput, RecordError, RecordService,
    RecordsConfig, SearchCriteria, SortField, SortSpec,
};

#[derive(Parser)]
#[command(name = "patient-records")]
#[command(about = "Import, validate and search patient records")]
struct Cli {
    /// SQLite database file
    #[arg(long, global = true, env = DATABASE_ENV_VAR)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a CSV file. Nothing is stored unless every row is valid.
    Import {
        file: PathBuf,
        /// Field delimiter
        #[arg(long, default_value_t = ',')]
        delimiter: char,
    },
    /// List patients
    List {
        /// Case-insensitive match on first or last name
        #[arg(long)]
        filter: Option<String>,
        #[arg(long, value_enum)]
        sort: Option<SortArg>,
        /// Sort descending
        #[arg(long, requires = "sort")]
        desc: bool,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Add a single patient
    Add {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        /// Birth date (YYYY-MM-DD)
        #[arg(long)]
        birth_date: NaiveDate,
        /// Male or Female
        #[arg(long)]
        gender: Gender,
    },
    /// Update an existing patient. Omitted fields keep their stored value.
    Update {
        id: i64,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        /// Birth date (YYYY-MM-DD)
        #[arg(long)]
        birth_date: Option<NaiveDate>,
        #[arg(long)]
        gender: Option<Gender>,
    },
    /// Show one patient as JSON
    Show { id: i64 },
}

#[derive(Clone, Copy, ValueEnum)]
enum SortArg {
    FirstName,
    LastName,
}

impl From<SortArg> for SortField {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::FirstName => SortField::FirstName,
            SortArg::LastName => SortField::LastName,
        }
    }
}

fn main() -> ExitCode {
    if let Err(e) = init_tracing() {
        eprintln!("Failed to initialise logging: {}", e);
    }

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report(&e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("patient_records=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()?;
    Ok(())
}

/// Violations are listed one per line; anything else is a single message.
fn report(error: &anyhow::Error) {
    match error.downcast_ref::<RecordError>() {
        Some(RecordError::Invalid(violations)) => {
            eprintln!("Rejected with {} problem(s):", violations.len());
            for violation in violations {
                eprintln!("  {}", violation);
            }
        }
        _ => eprintln!("Error: {:#}", error),
    }
}

fn run(cli: Cli) -> Result<()> {
    let import = match &cli.command {
        Commands::Import { delimiter, .. } => ImportConfig::default().with_delimiter(*delimiter)?,
        _ => ImportConfig::default(),
    };
    let config = RecordsConfig::resolve(cli.database, import);

    let db = Database::open(config.database_path()).with_context(|| {
        format!("Failed to open database {}", config.database_path().display())
    })?;
    let service = RecordService::with_config(&db, config.import().clone());

    match cli.command {
        Commands::Import { file, .. } => {
            let bytes =
                std::fs::read(&file).with_context(|| format!("Failed to read {}", file.display()))?;
            let count = service.upload(&bytes)?;
            println!("Imported {} patient(s) from {}", count, file.display());
        }
        Commands::List {
            filter,
            sort,
            desc,
            json,
        } => {
            let mut criteria = SearchCriteria {
                filter,
                sort: None,
            };
            if let Some(sort) = sort {
                let field = SortField::from(sort);
                criteria = criteria.sorted_by(if desc {
                    SortSpec::descending(field)
                } else {
                    SortSpec::ascending(field)
                });
            }

            let patients = service.search(&criteria)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&patients)?);
            } else if patients.is_empty() {
                println!("No patients found.");
            } else {
                for patient in &patients {
                    print_row(patient);
                }
            }
        }
        Commands::Add {
            first_name,
            last_name,
            birth_date,
            gender,
        } => {
            let patient =
                service.create(PatientInput::new(first_name, last_name, birth_date, gender))?;
            println!("Added patient {}", describe(&patient));
        }
        Commands::Update {
            id,
            first_name,
            last_name,
            birth_date,
            gender,
        } => {
            let current = service.get(id)?.ok_or(RecordError::NotFound(id))?;
            let mut input = PatientInput::from(current);
            if let Some(first_name) = first_name {
                input.first_name = first_name;
            }
            if let Some(last_name) = last_name {
                input.last_name = last_name;
            }
            if birth_date.is_some() {
                input.birth_date = birth_date;
            }
            if gender.is_some() {
                input.gender = gender;
            }

            let patient = service.update(id, input)?;
            println!("Updated patient {}", describe(&patient));
        }
        Commands::Show { id } => {
            let patient = service.get(id)?.ok_or(RecordError::NotFound(id))?;
            println!("{}", serde_json::to_string_pretty(&patient)?);
        }
    }

    Ok(())
}

fn describe(patient: &Patient) -> String {
    match patient.id {
        Some(id) => format!("{} ({})", id, patient.display_name()),
        None => patient.display_name(),
    }
}

fn print_row(patient: &Patient) {
    println!(
        "ID: {}, Name: {}, Birthday: {}, Gender: {}",
        patient.id.unwrap_or_default(),
        patient.display_name(),
        patient.birth_date,
        patient.gender
    );
}
