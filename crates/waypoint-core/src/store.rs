//! Trip store
//!
//! Repository over the flat per-trip file layout:
//!
//! ```text
//! <data>/trips/<fs_name>/
//!     metadata.json        TripMetadata
//!     expenses.json        ordered list of ExpenseRecord
//!     receipts/            uploaded receipt files
//!     travel_documents/    uploaded travel documents
//!     thumbnails/          conversion cache (display size)
//!     converted/           conversion cache (full size)
//! <data>/archive/<fs_name>/
//! ```
//!
//! Writes are whole-file overwrites (read-modify-write), no append
//! semantics, no schema versioning. Pipeline logic only touches this
//! interface so a different storage backend can be substituted later.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::{Error, Result};
use crate::models::{ExpenseRecord, TripMetadata};

pub const METADATA_FILE: &str = "metadata.json";
pub const EXPENSES_FILE: &str = "expenses.json";
pub const RECEIPTS_DIR: &str = "receipts";
pub const TRAVEL_DOCS_DIR: &str = "travel_documents";
pub const THUMBNAILS_DIR: &str = "thumbnails";
pub const CONVERTED_DIR: &str = "converted";

/// Filesystem-backed trip repository
#[derive(Clone)]
pub struct TripStore {
    data_dir: PathBuf,
}

impl TripStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Default data directory (~/.local/share/waypoint)
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("waypoint")
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn trips_root(&self) -> PathBuf {
        self.data_dir.join("trips")
    }

    pub fn archive_root(&self) -> PathBuf {
        self.data_dir.join("archive")
    }

    pub fn trip_dir(&self, trip: &str) -> PathBuf {
        self.trips_root().join(trip)
    }

    pub fn receipts_dir(&self, trip: &str) -> PathBuf {
        self.trip_dir(trip).join(RECEIPTS_DIR)
    }

    pub fn travel_docs_dir(&self, trip: &str) -> PathBuf {
        self.trip_dir(trip).join(TRAVEL_DOCS_DIR)
    }

    pub fn thumbnails_dir(&self, trip: &str) -> PathBuf {
        self.trip_dir(trip).join(THUMBNAILS_DIR)
    }

    pub fn converted_dir(&self, trip: &str) -> PathBuf {
        self.trip_dir(trip).join(CONVERTED_DIR)
    }

    pub fn trip_exists(&self, trip: &str) -> bool {
        self.trip_dir(trip).is_dir()
    }

    /// Create a trip directory with its receipts/ subdirectory and seed
    /// metadata. Existing trips are left untouched.
    pub fn create_trip(&self, trip: &str) -> Result<TripMetadata> {
        let dir = self.trip_dir(trip);
        fs::create_dir_all(dir.join(RECEIPTS_DIR))?;

        match self.load_metadata(trip) {
            Ok(metadata) => Ok(metadata),
            Err(Error::NotFound(_)) => {
                let metadata = TripMetadata::new(trip);
                self.save_metadata(trip, &metadata)?;
                Ok(metadata)
            }
            Err(e) => Err(e),
        }
    }

    /// List trips (active only), by metadata
    pub fn list_trips(&self) -> Result<Vec<TripMetadata>> {
        let root = self.trips_root();
        if !root.is_dir() {
            return Ok(Vec::new());
        }

        let mut names: Vec<String> = fs::read_dir(&root)?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_dir())
            .filter_map(|entry| entry.file_name().to_str().map(String::from))
            .collect();
        names.sort();

        let mut trips = Vec::with_capacity(names.len());
        for name in names {
            match self.load_metadata(&name) {
                Ok(metadata) => trips.push(metadata),
                Err(Error::NotFound(_)) => trips.push(TripMetadata::new(&name)),
                Err(e) => {
                    warn!(trip = %name, error = %e, "Skipping unreadable trip metadata");
                }
            }
        }
        Ok(trips)
    }

    pub fn load_metadata(&self, trip: &str) -> Result<TripMetadata> {
        let path = self.trip_dir(trip).join(METADATA_FILE);
        if !path.is_file() {
            return Err(Error::NotFound(format!("metadata for trip {}", trip)));
        }
        let raw = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn save_metadata(&self, trip: &str, metadata: &TripMetadata) -> Result<()> {
        let dir = self.trip_dir(trip);
        fs::create_dir_all(&dir)?;
        let raw = serde_json::to_string_pretty(metadata)?;
        fs::write(dir.join(METADATA_FILE), raw)?;
        Ok(())
    }

    /// Load the expense list; a missing file is an empty list
    pub fn load_expenses(&self, trip: &str) -> Result<Vec<ExpenseRecord>> {
        let path = self.trip_dir(trip).join(EXPENSES_FILE);
        if !path.is_file() {
            return Ok(Vec::new());
        }
        let raw = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn save_expenses(&self, trip: &str, expenses: &[ExpenseRecord]) -> Result<()> {
        let dir = self.trip_dir(trip);
        fs::create_dir_all(&dir)?;
        let raw = serde_json::to_string_pretty(expenses)?;
        fs::write(dir.join(EXPENSES_FILE), raw)?;
        Ok(())
    }

    /// Rename a trip directory. Fails without touching anything when the
    /// target already exists.
    pub fn rename_trip(&self, old: &str, new: &str) -> Result<()> {
        let old_dir = self.trip_dir(old);
        let new_dir = self.trip_dir(new);

        if !old_dir.is_dir() {
            return Err(Error::NotFound(format!("trip {}", old)));
        }
        if new_dir.exists() {
            return Err(Error::InvalidData(format!(
                "a trip named {} already exists",
                new
            )));
        }

        fs::rename(&old_dir, &new_dir)?;
        Ok(())
    }

    pub fn delete_trip(&self, trip: &str) -> Result<()> {
        let dir = self.trip_dir(trip);
        if !dir.is_dir() {
            return Err(Error::NotFound(format!("trip {}", trip)));
        }
        fs::remove_dir_all(&dir)?;
        Ok(())
    }

    /// Move a trip to the archive, stamping its metadata. An existing
    /// archived trip of the same name is replaced.
    pub fn archive_trip(&self, trip: &str) -> Result<()> {
        let dir = self.trip_dir(trip);
        if !dir.is_dir() {
            return Err(Error::NotFound(format!("trip {}", trip)));
        }

        let archive_root = self.archive_root();
        fs::create_dir_all(&archive_root)?;
        let dest = archive_root.join(trip);
        if dest.is_dir() {
            fs::remove_dir_all(&dest)?;
        }

        fs::rename(&dir, &dest)?;

        // Stamp in the new location; the move already happened so a stamp
        // failure only loses the timestamp
        let metadata_path = dest.join(METADATA_FILE);
        if metadata_path.is_file() {
            if let Ok(raw) = fs::read_to_string(&metadata_path) {
                if let Ok(mut metadata) = serde_json::from_str::<TripMetadata>(&raw) {
                    metadata.archived_date =
                        Some(chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string());
                    if let Ok(raw) = serde_json::to_string_pretty(&metadata) {
                        let _ = fs::write(&metadata_path, raw);
                    }
                }
            }
        }
        Ok(())
    }

    pub fn add_expense(&self, trip: &str, record: ExpenseRecord) -> Result<()> {
        let mut expenses = self.load_expenses(trip)?;
        expenses.push(record);
        self.save_expenses(trip, &expenses)
    }

    /// Replace an expense by id. The stored source path is preserved when
    /// the update carries an empty one.
    pub fn update_expense(&self, trip: &str, mut record: ExpenseRecord) -> Result<()> {
        let mut expenses = self.load_expenses(trip)?;
        let slot = expenses
            .iter_mut()
            .find(|e| e.id == record.id)
            .ok_or_else(|| Error::NotFound(format!("expense {}", record.id)))?;

        if record.source.is_empty() {
            record.source = slot.source.clone();
        }
        *slot = record;
        self.save_expenses(trip, &expenses)
    }

    /// Remove an expense and its backing file. The file is only deleted when
    /// it resolves inside the trip directory.
    pub fn delete_expense(&self, trip: &str, expense_id: &str) -> Result<()> {
        let mut expenses = self.load_expenses(trip)?;
        let index = expenses
            .iter()
            .position(|e| e.id == expense_id)
            .ok_or_else(|| Error::NotFound(format!("expense {}", expense_id)))?;

        let removed = expenses.remove(index);
        self.save_expenses(trip, &expenses)?;

        if !removed.source.is_empty() {
            let trip_dir = self.trip_dir(trip);
            let backing = trip_dir.join(&removed.source);
            if let (Ok(canonical_file), Ok(canonical_dir)) =
                (backing.canonicalize(), trip_dir.canonicalize())
            {
                if canonical_file.starts_with(&canonical_dir) {
                    let _ = fs::remove_file(&canonical_file);
                } else {
                    warn!(path = %backing.display(),
                        "Expense source outside trip directory, skipping delete");
                }
            }
        }
        Ok(())
    }

    /// Files in receipts/, sorted by name for a deterministic batch order
    pub fn list_receipt_files(&self, trip: &str) -> Result<Vec<String>> {
        list_files(&self.receipts_dir(trip))
    }

    /// Files in travel_documents/, sorted by name
    pub fn list_travel_document_files(&self, trip: &str) -> Result<Vec<String>> {
        list_files(&self.travel_docs_dir(trip))
    }

    /// Relocate a misfiled travel document out of receipts/. Part of the
    /// classification's observable effect.
    pub fn move_to_travel_documents(&self, trip: &str, file_name: &str) -> Result<()> {
        let from = self.receipts_dir(trip).join(file_name);
        let to_dir = self.travel_docs_dir(trip);
        fs::create_dir_all(&to_dir)?;
        fs::rename(&from, to_dir.join(file_name))?;
        Ok(())
    }
}

fn list_files(dir: &Path) -> Result<Vec<String>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut names: Vec<String> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_file())
        .filter_map(|entry| entry.file_name().to_str().map(String::from))
        .collect();
    names.sort();
    Ok(names)
}
