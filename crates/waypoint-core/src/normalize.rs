//! Expense normalizer
//!
//! Maps a parsed extraction fragment into a canonical [`ExpenseRecord`] with
//! defaulted and validated fields. Bad input never raises: every malformed
//! field degrades to a safe default. Only an upstream extraction failure
//! produces a record explicitly tagged for user review.

use std::path::Path;

use chrono::NaiveDate;
use tracing::warn;
use uuid::Uuid;

use crate::ai::parsing::DocumentAnalysis;
use crate::models::{Category, ExpenseRecord};

/// Floor applied when extraction yields a zero or negative amount. A
/// zero-amount expense is treated as a parsing failure, not a free item;
/// the record is flagged `needs_review` so the user can correct it.
const MIN_AMOUNT: f64 = 0.01;

/// Note text marking a record that extraction could not read at all.
pub const FAILED_NOTE: &str = "Failed to process automatically";

/// Normalize one extraction fragment into an expense record
pub fn normalize(analysis: &DocumentAnalysis, file_name: &str, source: &str) -> ExpenseRecord {
    let date = normalize_date(analysis.date.as_deref());
    let merchant = analysis
        .merchant
        .clone()
        .unwrap_or_else(|| file_stem(file_name));

    let raw_amount = analysis.amount.unwrap_or(0.0);
    let needs_review = raw_amount <= 0.0;
    let amount = if needs_review { MIN_AMOUNT } else { raw_amount };

    let tax_amount = analysis.tax_amount.unwrap_or(0.0).max(0.0);

    let category = match analysis.category.as_deref() {
        Some(raw) => raw.parse::<Category>().unwrap_or_else(|_| {
            warn!(category = raw, file = file_name, "Unknown category, coercing to Other");
            Category::Other
        }),
        None => Category::Other,
    };

    ExpenseRecord {
        id: Uuid::new_v4().to_string(),
        date,
        merchant,
        amount,
        tax_amount,
        category,
        note: analysis.note.clone().unwrap_or_default(),
        location: analysis.location.clone().unwrap_or_default(),
        source: source.to_string(),
        is_travel_document: false,
        excluded: false,
        needs_review,
        is_hotel_stay: analysis.is_hotel_stay,
        daily_breakdown: analysis.daily_breakdown.clone(),
    }
}

/// Fallback record for a file extraction could not process. A legitimate
/// persisted state requiring user review, not an error.
pub fn failed_record(file_name: &str, source: &str) -> ExpenseRecord {
    ExpenseRecord {
        id: Uuid::new_v4().to_string(),
        date: today(),
        merchant: file_stem(file_name),
        amount: MIN_AMOUNT,
        tax_amount: 0.0,
        category: Category::Other,
        note: FAILED_NOTE.to_string(),
        location: String::new(),
        source: source.to_string(),
        is_travel_document: false,
        excluded: false,
        needs_review: true,
        is_hotel_stay: false,
        daily_breakdown: Vec::new(),
    }
}

/// Strict `YYYY-MM-DD`; anything else defaults to the processing date.
fn normalize_date(raw: Option<&str>) -> NaiveDate {
    raw.and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok())
        .unwrap_or_else(today)
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn file_stem(file_name: &str) -> String {
    Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("Unknown")
        .to_string()
}
