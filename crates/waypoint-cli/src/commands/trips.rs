//! Trip management commands

use anyhow::{anyhow, Result};

use waypoint_core::TripStore;

/// List all active trips
pub fn cmd_trips_list(store: &TripStore) -> Result<()> {
    let trips = store.list_trips()?;
    if trips.is_empty() {
        println!("No trips yet. Upload a receipt with 'waypoint upload'.");
        return Ok(());
    }

    println!("\nTrips ({})", trips.len());
    println!("{}", "─".repeat(70));
    for trip in &trips {
        let destination = trip.destination.as_deref().unwrap_or("-");
        let dates = match (trip.start_date, trip.end_date) {
            (Some(start), Some(end)) => format!("{} → {}", start, end),
            (Some(start), None) => format!("{} →", start),
            _ => "-".to_string(),
        };
        println!("  {:<28} {:<24} {}", trip.name, destination, dates);
    }
    println!();
    Ok(())
}

/// Show one trip's metadata
pub fn cmd_trips_show(store: &TripStore, trip: &str) -> Result<()> {
    let metadata = store.load_metadata(trip)?;
    println!("{}", serde_json::to_string_pretty(&metadata)?);
    Ok(())
}

/// Move a trip to the archive
pub fn cmd_trips_archive(store: &TripStore, trip: &str) -> Result<()> {
    store.archive_trip(trip)?;
    println!("Archived trip '{}'", trip);
    Ok(())
}

/// Delete a trip and all its files
pub fn cmd_trips_delete(store: &TripStore, trip: &str, yes: bool) -> Result<()> {
    if !store.trip_exists(trip) {
        return Err(anyhow!("Trip not found: {}", trip));
    }
    if !yes {
        return Err(anyhow!(
            "Deleting '{}' removes all of its receipts and records. Re-run with --yes to confirm.",
            trip
        ));
    }
    store.delete_trip(trip)?;
    println!("Deleted trip '{}'", trip);
    Ok(())
}
