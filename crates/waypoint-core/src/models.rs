//! Domain models for Waypoint

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Expense categories
///
/// The set is closed on purpose: downstream aggregation keys on these exact
/// strings, so anything the extractor invents collapses to `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Category {
    Meals,
    Transportation,
    Lodging,
    Entertainment,
    Groceries,
    Shopping,
    Gas,
    #[default]
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Meals => "Meals",
            Self::Transportation => "Transportation",
            Self::Lodging => "Lodging",
            Self::Entertainment => "Entertainment",
            Self::Groceries => "Groceries",
            Self::Shopping => "Shopping",
            Self::Gas => "Gas",
            Self::Other => "Other",
        }
    }

    pub fn all() -> &'static [Category] {
        &[
            Self::Meals,
            Self::Transportation,
            Self::Lodging,
            Self::Entertainment,
            Self::Groceries,
            Self::Shopping,
            Self::Gas,
            Self::Other,
        ]
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    // Exact case-sensitive match; the normalizer maps Err to Other.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Meals" => Ok(Self::Meals),
            "Transportation" => Ok(Self::Transportation),
            "Lodging" => Ok(Self::Lodging),
            "Entertainment" => Ok(Self::Entertainment),
            "Groceries" => Ok(Self::Groceries),
            "Shopping" => Ok(Self::Shopping),
            "Gas" => Ok(Self::Gas),
            "Other" => Ok(Self::Other),
            _ => Err(format!("Unknown category: {}", s)),
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What kind of document an uploaded file is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Receipt,
    TravelDocument,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Receipt => "receipt",
            Self::TravelDocument => "travel_document",
        }
    }
}

impl std::str::FromStr for DocumentKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "receipt" => Ok(Self::Receipt),
            "travel_document" | "travel" => Ok(Self::TravelDocument),
            _ => Err(format!("Unknown document kind: {}", s)),
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a classification decision was reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceSource {
    /// Filename keyword heuristic (cheap, deterministic)
    FilenameHeuristic,
    /// The model's own `type` field from the combined analysis prompt
    AiSelfReport,
}

/// Result of classifying one uploaded file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub kind: DocumentKind,
    pub source: ConfidenceSource,
}

/// One night of a multi-night hotel stay
///
/// Preserved verbatim from extraction; additive context only. The record's
/// top-level amount/tax_amount remain the authoritative totals.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StayNight {
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub room_rate: f64,
    #[serde(default)]
    pub tax_rate: f64,
    #[serde(default)]
    pub tax_percentage: String,
    #[serde(default)]
    pub daily_total: f64,
}

/// A normalized expense line item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseRecord {
    /// Opaque unique token
    pub id: String,
    pub date: NaiveDate,
    pub merchant: String,
    /// Non-negative; floored to 0.01 when extraction yields zero/negative
    pub amount: f64,
    #[serde(default)]
    pub tax_amount: f64,
    pub category: Category,
    #[serde(default)]
    pub note: String,
    /// Free-text location harvested for destination voting
    #[serde(default)]
    pub location: String,
    /// Trip-relative path to the originating file
    pub source: String,
    #[serde(default)]
    pub is_travel_document: bool,
    /// User can exclude from totals without deleting
    #[serde(default)]
    pub excluded: bool,
    /// Set when extraction yielded a non-positive amount or failed outright
    #[serde(default)]
    pub needs_review: bool,
    #[serde(default)]
    pub is_hotel_stay: bool,
    #[serde(default)]
    pub daily_breakdown: Vec<StayNight>,
}

/// Consolidated trip metadata
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TripMetadata {
    /// User-facing display name
    pub name: String,
    /// Sanitized directory-safe name; may differ from `name`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filesystem_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Stamped when the trip is moved to the archive
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archived_date: Option<String>,
}

impl TripMetadata {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }
}

/// A file accepted at the upload boundary
#[derive(Debug, Clone, Serialize)]
pub struct StoredUpload {
    pub original_name: String,
    /// Filename actually stored (sanitized, de-duplicated, possibly .jpg)
    pub file_name: String,
    pub stored_path: std::path::PathBuf,
    pub byte_size: u64,
    pub declared_mime: Option<String>,
    pub detected_extension: String,
    pub kind: DocumentKind,
}

/// Outcome of processing one file in a batch
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    ProcessedAsExpense,
    MovedAndProcessed,
    Processed,
    Skipped,
    Failed,
}

/// Per-file entry in a batch report
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedFile {
    pub file: String,
    pub kind: DocumentKind,
    pub status: FileStatus,
}

/// Per-file error in a batch report
#[derive(Debug, Clone, Serialize)]
pub struct FileError {
    pub file: String,
    pub error: String,
}

/// Result of one consolidation pass over a trip
///
/// The batch is reported successful whenever the store writes succeeded;
/// individual file failures appear in `errors` so the user can identify
/// which receipts need manual entry.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub trip_name: String,
    pub expense_count: usize,
    pub travel_document_count: usize,
    pub processed_files: Vec<ProcessedFile>,
    pub errors: Vec<FileError>,
    pub metadata: TripMetadata,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_category_roundtrip() {
        for cat in Category::all() {
            assert_eq!(Category::from_str(cat.as_str()).unwrap(), *cat);
        }
    }

    #[test]
    fn test_category_is_case_sensitive() {
        assert!(Category::from_str("meals").is_err());
        assert!(Category::from_str("MEALS").is_err());
        assert!(Category::from_str("Food").is_err());
    }

    #[test]
    fn test_document_kind_parse() {
        assert_eq!(
            DocumentKind::from_str("travel_document").unwrap(),
            DocumentKind::TravelDocument
        );
        assert_eq!(
            DocumentKind::from_str("Receipt").unwrap(),
            DocumentKind::Receipt
        );
        assert!(DocumentKind::from_str("invoice").is_err());
    }

    #[test]
    fn test_expense_record_serde_defaults() {
        let json = r#"{
            "id": "abc",
            "date": "2025-06-12",
            "merchant": "Cafe",
            "amount": 18.5,
            "category": "Meals",
            "source": "receipts/lunch.jpg"
        }"#;
        let record: ExpenseRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.tax_amount, 0.0);
        assert!(!record.excluded);
        assert!(!record.needs_review);
        assert!(record.daily_breakdown.is_empty());
    }
}
