mod cli;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ember::config::EmberConfig;

#[derive(Parser)]
#[command(name = "ember", version, about = "Medication reminders and a gentle companion for caregivers")]
struct Cli {
    /// Config file (defaults to ~/.ember/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one reminder cycle: fetch medications and log due alerts
    Poll,
    /// Serve the dashboard API and medication source
    Serve,
    /// Print the schedule, medications due now, and recent alerts
    Dashboard,
    /// Talk to the companion
    Chat {
        /// Device latitude in decimal degrees
        #[arg(long, requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,
        /// Device longitude in decimal degrees
        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,
        /// Behave as if location access was refused
        #[arg(long, conflicts_with_all = ["lat", "lon"])]
        no_location: bool,
        /// Send a single message and exit
        #[arg(long, short)]
        message: Option<String>,
    },
    /// Manage the medication schedule
    Med {
        #[command(subcommand)]
        action: MedAction,
    },
    /// Check database health
    Doctor,
}

#[derive(Subcommand)]
enum MedAction {
    /// Add a medication to the schedule
    Add {
        name: String,
        dosage: String,
        /// Free text, e.g. "daily", "twice daily", "every 8 hours"
        frequency: String,
        /// ISO 8601 time of the last dose
        #[arg(long)]
        last_taken: Option<String>,
    },
    /// List scheduled medications
    List,
    /// Remove a medication from the schedule
    Remove { id: String },
    /// Record that a dose was just taken
    Taken { id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EmberConfig::load_from(path)?,
        None => EmberConfig::load()?,
    };

    // Log to stderr so stdout stays clean for command output.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Poll => cli::poll::poll(&config).await?,
        Command::Serve => ember::server::serve(config).await?,
        Command::Dashboard => cli::dashboard::dashboard(&config).await?,
        Command::Chat {
            lat,
            lon,
            no_location,
            message,
        } => {
            let device = cli::chat::device_location(lat, lon, no_location);
            cli::chat::chat(&config, device, message.as_deref()).await?;
        }
        Command::Med { action } => match action {
            MedAction::Add {
                name,
                dosage,
                frequency,
                last_taken,
            } => cli::meds::add(&config, &name, &dosage, &frequency, last_taken.as_deref())?,
            MedAction::List => cli::meds::list(&config)?,
            MedAction::Remove { id } => cli::meds::remove(&config, &id)?,
            MedAction::Taken { id } => cli::meds::taken(&config, &id)?,
        },
        Command::Doctor => cli::doctor::doctor(&config)?,
    }

    Ok(())
}
