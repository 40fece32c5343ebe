//! Fieldwork CLI - inspect and maintain territory progress in a JSON fixture

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "fieldwork")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to the JSON fixture holding every document
    #[arg(short, long, default_value = "./fieldwork.json")]
    fixture: PathBuf,

    /// Path to an engine configuration file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Congregation to operate on
    #[arg(long, default_value = "default")]
    congregation: String,

    /// Display name recorded on links and used in logs
    #[arg(long, default_value = "admin")]
    user: String,

    /// Role code of the acting user
    #[arg(long, default_value = "administrator")]
    role: String,

    /// Do not write changes back to the fixture
    #[arg(long)]
    dry_run: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Congregation overview and configuration
    Status,

    /// Show a territory's addresses, progress and links
    Territory {
        /// Territory id
        id: String,

        /// Print the projections as JSON
        #[arg(long)]
        json: bool,
    },

    /// Classify every unit of an address
    Classify {
        /// Map (address) id
        map: String,
    },

    /// Recompute an address's progress from its units
    Recount {
        /// Map (address) id
        map: String,
    },

    /// Put visited units of an address back to their initial status
    Reset {
        /// Map (address) id
        map: String,
    },

    /// Delete every unit on one floor
    DeleteFloor {
        /// Map (address) id
        map: String,

        floor: i64,
    },

    /// Add a floor of units
    AddFloor {
        /// Map (address) id
        map: String,

        floor: i64,

        /// Unit numbers in visiting order
        #[arg(required = true, num_args = 1..)]
        units: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    let session = commands::Session::open(commands::SessionArgs {
        fixture: cli.fixture,
        config: cli.config,
        congregation: cli.congregation,
        user: cli.user,
        role: cli.role,
        dry_run: cli.dry_run,
    })
    .await?;

    // Execute command
    match cli.command {
        Commands::Status => {
            commands::status::execute(&session).await?;
        }
        Commands::Territory { id, json } => {
            commands::territory::execute(&session, &id, json)?;
        }
        Commands::Classify { map } => {
            commands::classify::execute(&session, &map).await?;
        }
        Commands::Recount { map } => {
            commands::maintain::recount(&session, &map).await?;
        }
        Commands::Reset { map } => {
            commands::maintain::reset(&session, &map).await?;
        }
        Commands::DeleteFloor { map, floor } => {
            commands::maintain::delete_floor(&session, &map, floor).await?;
        }
        Commands::AddFloor { map, floor, units } => {
            commands::maintain::add_floor(&session, &map, floor, &units).await?;
        }
    }

    Ok(())
}
