use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};

use consult_portal_lib::api_client::{ApiClient, ConsultBackend};
use consult_portal_lib::config::Config;
use consult_portal_lib::models::Gender;
use consult_portal_lib::pages::{DoctorReview, Page, PatientPortal, PatientResultPage};
use consult_portal_lib::router::Route;

/// Terminal client for the medical consultation portal
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Backend base URL (overrides CONSULT_API_URL and the config file)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Route a portal path and render the page
    Open {
        /// e.g. "/", "/patient/result/<id>", "/doctor"
        path: String,
    },
    /// Submit a patient intake form
    Intake(IntakeArgs),
    /// Show consultation results for an appointment
    Results {
        appointment_id: String,
    },
    /// Doctor workflow
    Doctor {
        #[command(subcommand)]
        command: DoctorCommand,
    },
    /// Show or write the config file
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(clap::Args, Debug)]
struct IntakeArgs {
    #[arg(long)]
    age: String,

    /// male, female or other
    #[arg(long, default_value = "male", value_parser = parse_gender)]
    gender: Gender,

    #[arg(long)]
    chief_complaint: String,

    #[arg(long)]
    symptoms: String,

    /// How long the symptoms have lasted, e.g. "3 weeks"
    #[arg(long)]
    duration: String,

    /// Comma-separated
    #[arg(long, default_value = "")]
    medical_history: String,

    /// Comma-separated
    #[arg(long, default_value = "")]
    medications: String,

    /// Comma-separated
    #[arg(long, default_value = "")]
    allergies: String,

    /// Fasting glucose (mg/dL)
    #[arg(long, default_value = "")]
    glucose: String,

    /// HbA1c (%)
    #[arg(long, default_value = "")]
    hba1c: String,

    /// Total cholesterol (mg/dL)
    #[arg(long, default_value = "")]
    cholesterol: String,

    #[arg(long, default_value = "")]
    triglycerides: String,

    #[arg(long, default_value = "")]
    hdl: String,

    #[arg(long, default_value = "")]
    ldl: String,

    /// e.g. "120/80"
    #[arg(long, default_value = "")]
    blood_pressure: String,

    #[arg(long, default_value = "")]
    bmi: String,
}

#[derive(Subcommand, Debug)]
enum DoctorCommand {
    /// List appointments for the configured doctor
    List,
    /// Analyze and approve one appointment
    Review {
        appointment_id: String,

        #[arg(long)]
        notes: String,

        /// Use the record-scoped analyze endpoint
        #[arg(long)]
        record_endpoint: bool,

        /// Approve without requesting AI analysis
        #[arg(long)]
        no_ai: bool,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Print the effective configuration
    Show,
    /// Write the default config file if none exists
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr; stdout carries the rendered page
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load_or_default();

    if let Command::Config { command } = &args.command {
        return run_config(command, &config, args.api_url.as_deref());
    }

    let api_url = config.resolve_api_url(args.api_url.as_deref());
    info!("Backend: {}", api_url);
    let client = ApiClient::new(&api_url).context("Invalid backend URL")?;

    match args.command {
        Command::Open { path } => {
            let route = Route::parse(&path)?;
            debug!("Opening {}", route);
            let mut page = Page::for_route(&route, &config);
            page.mount(&client).await;
            print!("{}", page.render());
        }
        Command::Intake(intake) => {
            let mut page = PatientPortal::for_doctor(&config.doctor_id);
            fill_intake(&mut page, intake);
            let outcome = page.submit(&client).await;
            print!("{}", page.render());
            outcome.context("Intake was not submitted")?;
        }
        Command::Results { appointment_id } => {
            let mut page = PatientResultPage::new(appointment_id.trim());
            page.fetch(&client).await;
            print!("{}", page.render());
        }
        Command::Doctor {
            command: DoctorCommand::List,
        } => {
            let mut page = DoctorReview::dashboard(&config.doctor_id);
            page.mount(&client).await;
            print!("{}", page.render());
        }
        Command::Doctor {
            command:
                DoctorCommand::Review {
                    appointment_id,
                    notes,
                    record_endpoint,
                    no_ai,
                },
        } => {
            let mut page = if record_endpoint {
                DoctorReview::record_view(&config.doctor_id, &appointment_id)
            } else {
                DoctorReview::dashboard(&config.doctor_id)
            };
            page.mount(&client).await;
            if !record_endpoint {
                let (ticket, id) = page.select_by_id(&appointment_id);
                let record = client.get_patient_record(&id).await;
                page.apply_record(ticket, record);
            }
            page.set_notes(&notes);
            let outcome = page.submit_analysis(&client, !no_ai).await;
            print!("{}", page.render());
            outcome.context("Analysis was not approved")?;
        }
        // Handled before connecting
        Command::Config { .. } => {}
    }

    Ok(())
}

/// Strict on the command line; stored records are read leniently
fn parse_gender(value: &str) -> Result<Gender, String> {
    value.parse()
}

fn fill_intake(page: &mut PatientPortal, args: IntakeArgs) {
    let draft = &mut page.draft;
    draft.age = args.age;
    draft.gender = args.gender;
    draft.chief_complaint = args.chief_complaint;
    draft.symptoms = args.symptoms;
    draft.symptom_duration = args.duration;
    draft.medical_history = args.medical_history;
    draft.current_medications = args.medications;
    draft.allergies = args.allergies;

    let labs = &mut page.labs;
    labs.glucose = args.glucose;
    labs.hba1c = args.hba1c;
    labs.cholesterol = args.cholesterol;
    labs.triglycerides = args.triglycerides;
    labs.hdl = args.hdl;
    labs.ldl = args.ldl;
    labs.blood_pressure = args.blood_pressure;
    labs.bmi = args.bmi;
}

fn run_config(command: &ConfigCommand, config: &Config, api_url: Option<&str>) -> Result<()> {
    match command {
        ConfigCommand::Show => {
            let path = Config::config_path()?;
            let effective = Config {
                api_base_url: config.resolve_api_url(api_url),
                ..config.clone()
            };
            println!("# {}", path.display());
            println!("{}", serde_json::to_string_pretty(&effective)?);
        }
        ConfigCommand::Init => {
            let path = Config::config_path()?;
            if path.exists() {
                println!("Config already exists at {}", path.display());
            } else {
                let saved = config.save()?;
                println!("Wrote {}", saved.display());
            }
        }
    }
    Ok(())
}
