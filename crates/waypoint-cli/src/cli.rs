//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI
//! arguments. The actual command implementations are in the `commands`
//! module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Waypoint - turn travel paperwork into structured trip records
#[derive(Parser)]
#[command(name = "waypoint")]
#[command(about = "Travel document ingestion and trip expense tracking", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Data directory (defaults to ~/.local/share/waypoint)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the data directory
    Init,

    /// Upload a receipt or travel document into a trip
    Upload {
        /// Trip name (created on first upload)
        trip: String,

        /// File to upload (PDF or image)
        #[arg(short, long)]
        file: PathBuf,

        /// Override the document kind (receipt, travel_document)
        #[arg(long)]
        kind: Option<String>,
    },

    /// Classify, extract and consolidate every document in a trip
    Process {
        /// Trip name (provisional trips may be renamed)
        trip: String,
    },

    /// Trip management
    Trips {
        #[command(subcommand)]
        action: Option<TripsAction>,
    },

    /// List a trip's expenses
    Expenses {
        /// Trip name
        trip: String,
    },

    /// Render a display thumbnail for a stored file
    Thumbnail {
        /// Trip name
        trip: String,

        /// Stored filename (as listed in expense sources)
        file: String,

        /// Output JPEG path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Run one extraction against a file and print the parsed fields
    Extract {
        /// File to analyze
        file: PathBuf,

        /// Prompt to use (analyze_document, extract_trip_details, parse_expense)
        #[arg(long, default_value = "analyze_document")]
        prompt: String,
    },

    /// Start the web server
    Serve {
        /// Bind address
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port
        #[arg(short, long, default_value_t = 3000)]
        port: u16,
    },

    /// Show configuration and extraction backend health
    Status,
}

#[derive(Subcommand)]
pub enum TripsAction {
    /// List trips (default)
    List,

    /// Show one trip's metadata
    Show {
        /// Trip name
        trip: String,
    },

    /// Move a trip to the archive
    Archive {
        /// Trip name
        trip: String,
    },

    /// Delete a trip and all its files
    Delete {
        /// Trip name
        trip: String,

        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}
