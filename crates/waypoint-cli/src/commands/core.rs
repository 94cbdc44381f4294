//! Core workflow commands: init, upload, process, extract, thumbnail, status

use std::collections::HashMap;
use std::path::Path;

use anyhow::{anyhow, Context, Result};

use waypoint_core::ai::parsing::extract_json_object;
use waypoint_core::models::DocumentKind;
use waypoint_core::{
    ConversionCache, ConversionOptions, Ingestor, PromptId, PromptLibrary, TripProcessor,
    TripStore, VisionBackend, VisionClient,
};

/// Initialize the data directory layout
pub fn cmd_init(store: &TripStore) -> Result<()> {
    std::fs::create_dir_all(store.trips_root())?;
    std::fs::create_dir_all(store.archive_root())?;
    println!("Initialized data directory at {}", store.data_dir().display());
    Ok(())
}

/// Upload one file into a trip
pub fn cmd_upload(store: &TripStore, trip: &str, file: &Path, kind: Option<&str>) -> Result<()> {
    if !file.exists() {
        return Err(anyhow!("File not found: {}", file.display()));
    }

    let kind_override = kind
        .map(|raw| raw.parse::<DocumentKind>().map_err(|e| anyhow!(e)))
        .transpose()?;

    let bytes = std::fs::read(file).context("Failed to read upload")?;
    let name = file
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow!("Invalid file name"))?;

    store.create_trip(trip)?;
    let upload = Ingestor::new().ingest(store, trip, name, &bytes, None, kind_override)?;

    println!(
        "Stored {} as {} ({}, {} bytes)",
        upload.original_name, upload.file_name, upload.kind, upload.byte_size
    );
    Ok(())
}

/// Run a consolidation pass over a trip
pub async fn cmd_process(store: &TripStore, trip: &str) -> Result<()> {
    let client = VisionClient::from_env()
        .ok_or_else(|| anyhow!("GEMINI_API_KEY not configured; extraction unavailable"))?;

    let processor = TripProcessor::new(store.clone(), Some(client))?;
    let report = processor.process_trip(trip).await?;

    println!("\nTrip: {}", report.trip_name);
    println!("{}", "─".repeat(60));
    for file in &report.processed_files {
        println!("  {:<40} {:?}", file.file, file.status);
    }
    println!(
        "\n{} expenses, {} travel documents",
        report.expense_count, report.travel_document_count
    );

    if !report.errors.is_empty() {
        println!("\nFiles needing manual entry:");
        for error in &report.errors {
            println!("  {} - {}", error.file, error.error);
        }
    }
    println!();
    Ok(())
}

/// List a trip's expenses
pub fn cmd_expenses(store: &TripStore, trip: &str) -> Result<()> {
    let expenses = store.load_expenses(trip)?;
    if expenses.is_empty() {
        println!("No expenses for trip '{}'", trip);
        return Ok(());
    }

    println!("\nExpenses for {} ({})", trip, expenses.len());
    println!("{}", "─".repeat(70));
    let mut total = 0.0;
    for expense in &expenses {
        let marker = if expense.excluded {
            "excluded"
        } else if expense.needs_review {
            "review"
        } else {
            ""
        };
        println!(
            "  {} {:<24} ${:>9.2}  {:<14} {}",
            expense.date, expense.merchant, expense.amount, expense.category, marker
        );
        if !expense.excluded {
            total += expense.amount;
        }
    }
    println!("{}", "─".repeat(70));
    println!("  Total: ${:.2}\n", total);
    Ok(())
}

/// Render a display thumbnail for a stored file
pub fn cmd_thumbnail(store: &TripStore, trip: &str, file: &str, output: &Path) -> Result<()> {
    let source = {
        let receipt = store.receipts_dir(trip).join(file);
        if receipt.is_file() {
            receipt
        } else {
            let travel = store.travel_docs_dir(trip).join(file);
            if travel.is_file() {
                travel
            } else {
                return Err(anyhow!("File not found in trip '{}': {}", trip, file));
            }
        }
    };

    let stem = Path::new(file)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file);
    let cache_path = store.thumbnails_dir(trip).join(format!("{}.jpg", stem));

    let cache = ConversionCache::new();
    let bytes = cache.get_display_artifact(&source, &cache_path, &ConversionOptions::thumbnail())?;
    std::fs::write(output, &bytes)?;

    println!("Wrote {} ({} bytes)", output.display(), bytes.len());
    Ok(())
}

/// Run one extraction against a file and print the parsed fields
pub async fn cmd_extract(file: &Path, prompt: &str) -> Result<()> {
    if !file.exists() {
        return Err(anyhow!("File not found: {}", file.display()));
    }

    let prompt_id = match prompt {
        "analyze_document" => PromptId::AnalyzeDocument,
        "extract_trip_details" => PromptId::ExtractTripDetails,
        "parse_expense" => PromptId::ParseExpense,
        other => return Err(anyhow!("Unknown prompt: {}", other)),
    };

    let client = VisionClient::from_env()
        .ok_or_else(|| anyhow!("GEMINI_API_KEY not configured; extraction unavailable"))?;

    let mut prompts = PromptLibrary::new();
    let rendered = prompts.get(prompt_id)?.render_user(&HashMap::new());

    println!("Extracting with {} ({})...", prompt_id.as_str(), client.model());
    let raw = client.extract(file, &rendered).await?;

    match extract_json_object(&raw) {
        Some(fields) => {
            println!("{}", serde_json::to_string_pretty(&fields)?);
        }
        None => {
            println!("No recoverable JSON. Raw response:\n{}", raw);
        }
    }
    Ok(())
}

/// Show configuration and extraction backend health
pub async fn cmd_status(store: &TripStore) -> Result<()> {
    println!("\nWaypoint status");
    println!("{}", "─".repeat(50));
    println!("  Data dir:  {}", store.data_dir().display());
    println!("  Trips:     {}", store.list_trips()?.len());

    match VisionClient::from_env() {
        Some(client) => {
            let healthy = client.health_check().await;
            println!("  AI model:  {}", client.model());
            println!(
                "  AI status: {}",
                if healthy { "reachable" } else { "unreachable" }
            );
        }
        None => {
            println!("  AI model:  not configured (set GEMINI_API_KEY)");
        }
    }
    println!();
    Ok(())
}
