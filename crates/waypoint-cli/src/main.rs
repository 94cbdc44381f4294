//! Waypoint CLI - travel document ingestion and trip expense tracking
//!
//! Usage:
//!   waypoint init                         Initialize the data directory
//!   waypoint upload TRIP -f FILE          Upload a receipt or travel document
//!   waypoint process TRIP                 Extract and consolidate a trip
//!   waypoint serve --port 3000            Start the web server

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;
use waypoint_core::TripStore;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let data_dir = cli
        .data_dir
        .clone()
        .unwrap_or_else(TripStore::default_data_dir);
    let store = TripStore::new(data_dir);

    match cli.command {
        Commands::Init => commands::cmd_init(&store),
        Commands::Upload { trip, file, kind } => {
            commands::cmd_upload(&store, &trip, &file, kind.as_deref())
        }
        Commands::Process { trip } => commands::cmd_process(&store, &trip).await,
        Commands::Trips { action } => match action {
            None | Some(TripsAction::List) => commands::cmd_trips_list(&store),
            Some(TripsAction::Show { trip }) => commands::cmd_trips_show(&store, &trip),
            Some(TripsAction::Archive { trip }) => commands::cmd_trips_archive(&store, &trip),
            Some(TripsAction::Delete { trip, yes }) => {
                commands::cmd_trips_delete(&store, &trip, yes)
            }
        },
        Commands::Expenses { trip } => commands::cmd_expenses(&store, &trip),
        Commands::Thumbnail { trip, file, output } => {
            commands::cmd_thumbnail(&store, &trip, &file, &output)
        }
        Commands::Extract { file, prompt } => commands::cmd_extract(&file, &prompt).await,
        Commands::Serve { host, port } => commands::cmd_serve(store, &host, port).await,
        Commands::Status => commands::cmd_status(&store).await,
    }
}
