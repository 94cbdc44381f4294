//! JSON recovery for vision model responses
//!
//! Model output is adversarial to parse: code fences, prose wrapping,
//! inconsistent key casing. Recovery runs three tiers, first success wins:
//!
//! 1. Parse the entire text as JSON.
//! 2. Scan for the outermost `{...}` span and parse that.
//! 3. Regex-match natural-language phrases ("trip to X", "departure ...
//!    <date>", "return ... <date>") and synthesize a minimal field map.
//!
//! All three failing means processed-with-no-data; callers substitute a
//! fallback record rather than erroring the batch.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::models::StayNight;

/// Extract a JSON object from possibly noisy model text
pub fn extract_json_object(raw: &str) -> Option<Map<String, Value>> {
    let raw = raw.trim();

    // Tier 1: the whole text is JSON
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(raw) {
        return Some(map);
    }

    // Tier 2: first-to-last brace span
    let start = raw.find('{');
    let end = raw.rfind('}');
    if let (Some(s), Some(e)) = (start, end) {
        if s < e {
            if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(&raw[s..=e]) {
                return Some(map);
            }
        }
    }

    // Tier 3: natural-language phrases
    parse_natural_language(raw)
}

fn trip_phrase_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(?:trip.*?to|destination.*?is|traveling.*?to|visiting)\s*:?\s*([A-Za-z][A-Za-z\s,]*)")
            .expect("valid regex")
    })
}

fn start_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(?:start|departure|from).*?(\d{4}-\d{2}-\d{2}|\d{1,2}/\d{1,2}/\d{4})")
            .expect("valid regex")
    })
}

fn end_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(?:end|return|to).*?(\d{4}-\d{2}-\d{2}|\d{1,2}/\d{1,2}/\d{4})")
            .expect("valid regex")
    })
}

/// Synthesize a minimal field map from prose
fn parse_natural_language(content: &str) -> Option<Map<String, Value>> {
    let mut map = Map::new();

    if let Some(caps) = trip_phrase_re().captures(content) {
        let name = caps[1].trim().to_string();
        map.insert("trip_name".to_string(), Value::String(name));
    }
    if let Some(caps) = start_date_re().captures(content) {
        map.insert("start_date".to_string(), Value::String(caps[1].to_string()));
    }
    if let Some(caps) = end_date_re().captures(content) {
        map.insert("end_date".to_string(), Value::String(caps[1].to_string()));
    }

    if map.is_empty() {
        None
    } else {
        Some(map)
    }
}

/// String field, tolerating numeric values
fn field_str(map: &Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key)? {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Numeric field, tolerating numeric strings ("12.34", "$12.34")
fn field_f64(map: &Map<String, Value>, key: &str) -> Option<f64> {
    match map.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_start_matches('$').parse::<f64>().ok(),
        _ => None,
    }
}

fn field_bool(map: &Map<String, Value>, key: &str) -> bool {
    matches!(map.get(key), Some(Value::Bool(true)))
}

/// Expense-scoped fragment from the combined analysis prompt
///
/// Every field is optional; the normalizer supplies defaults. The fragment
/// is the last place loosely-typed data is allowed to exist.
#[derive(Debug, Clone, Default)]
pub struct DocumentAnalysis {
    /// Model's self-reported document type ("receipt" / "travel_document")
    pub kind: Option<String>,
    pub date: Option<String>,
    pub merchant: Option<String>,
    pub amount: Option<f64>,
    pub tax_amount: Option<f64>,
    pub category: Option<String>,
    pub note: Option<String>,
    pub location: Option<String>,
    pub is_hotel_stay: bool,
    pub daily_breakdown: Vec<StayNight>,
}

impl DocumentAnalysis {
    pub fn from_fields(map: &Map<String, Value>) -> Self {
        let daily_breakdown = map
            .get("daily_breakdown")
            .and_then(|v| serde_json::from_value::<Vec<StayNight>>(v.clone()).ok())
            .unwrap_or_default();

        Self {
            kind: field_str(map, "type"),
            date: field_str(map, "date"),
            merchant: field_str(map, "merchant"),
            amount: field_f64(map, "amount"),
            tax_amount: field_f64(map, "tax_amount"),
            category: field_str(map, "category"),
            note: field_str(map, "note"),
            location: field_str(map, "location"),
            is_hotel_stay: field_bool(map, "is_hotel_stay"),
            daily_breakdown,
        }
    }
}

/// Trip-scoped fragment from the travel-document prompt
#[derive(Debug, Clone, Default)]
pub struct TripDetails {
    pub destination: Option<String>,
    pub trip_name: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub notes: Option<String>,
}

impl TripDetails {
    /// Build from a field map, tolerating the key variants models produce
    /// (camelCase, departure_date/return_date aliases).
    pub fn from_fields(map: &Map<String, Value>) -> Self {
        Self {
            destination: field_str(map, "destination"),
            trip_name: field_str(map, "trip_name").or_else(|| field_str(map, "tripName")),
            start_date: field_str(map, "start_date")
                .or_else(|| field_str(map, "startDate"))
                .or_else(|| field_str(map, "departure_date")),
            end_date: field_str(map, "end_date")
                .or_else(|| field_str(map, "endDate"))
                .or_else(|| field_str(map, "return_date")),
            notes: field_str(map, "notes"),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.destination.is_none()
            && self.trip_name.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
            && self.notes.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_json() {
        let map = extract_json_object(r#"{"merchant": "Target", "amount": 27.00}"#).unwrap();
        assert_eq!(field_str(&map, "merchant").unwrap(), "Target");
        assert_eq!(field_f64(&map, "amount").unwrap(), 27.00);
    }

    #[test]
    fn test_json_wrapped_in_prose() {
        let raw = "Here's the extraction:\n```json\n{\"merchant\": \"Cafe\", \"amount\": 9.5}\n```\nDone!";
        let map = extract_json_object(raw).unwrap();
        assert_eq!(field_str(&map, "merchant").unwrap(), "Cafe");
    }

    #[test]
    fn test_multiline_span() {
        let raw = "Result:\n{\n  \"date\": \"2025-06-12\",\n  \"amount\": 18.50\n}\nthanks";
        let map = extract_json_object(raw).unwrap();
        assert_eq!(field_str(&map, "date").unwrap(), "2025-06-12");
    }

    #[test]
    fn test_natural_language_fallback() {
        let raw = "Departure 2025-06-12. Return 2025-06-16. Looks like a trip to Austin.";
        let map = extract_json_object(raw).unwrap();
        assert_eq!(field_str(&map, "trip_name").unwrap(), "Austin");
        assert_eq!(field_str(&map, "start_date").unwrap(), "2025-06-12");
        assert_eq!(field_str(&map, "end_date").unwrap(), "2025-06-16");
    }

    #[test]
    fn test_total_failure_yields_none() {
        assert!(extract_json_object("no structure here at all").is_none());
        assert!(extract_json_object("").is_none());
    }

    #[test]
    fn test_document_analysis_from_fields() {
        let map = extract_json_object(
            r#"{
                "type": "receipt",
                "date": "2025-06-13",
                "merchant": "Hotel Azul",
                "amount": "330.00",
                "tax_amount": 30.0,
                "category": "Lodging",
                "location": "Austin, TX",
                "is_hotel_stay": true,
                "daily_breakdown": [
                    {"date": "2025-06-12", "room_rate": 150.0, "tax_rate": 15.0,
                     "tax_percentage": "10.0%", "daily_total": 165.0}
                ]
            }"#,
        )
        .unwrap();

        let analysis = DocumentAnalysis::from_fields(&map);
        assert_eq!(analysis.kind.as_deref(), Some("receipt"));
        assert_eq!(analysis.amount, Some(330.0));
        assert!(analysis.is_hotel_stay);
        assert_eq!(analysis.daily_breakdown.len(), 1);
        assert_eq!(analysis.daily_breakdown[0].room_rate, 150.0);
    }

    #[test]
    fn test_trip_details_key_aliases() {
        let map = extract_json_object(
            r#"{"destination": "Austin, TX", "departure_date": "2025-06-12",
                "return_date": "2025-06-16"}"#,
        )
        .unwrap();
        let details = TripDetails::from_fields(&map);
        assert_eq!(details.start_date.as_deref(), Some("2025-06-12"));
        assert_eq!(details.end_date.as_deref(), Some("2025-06-16"));
    }

    #[test]
    fn test_blank_strings_are_none() {
        let map = extract_json_object(r#"{"merchant": "  ", "note": ""}"#).unwrap();
        let analysis = DocumentAnalysis::from_fields(&map);
        assert!(analysis.merchant.is_none());
        assert!(analysis.note.is_none());
    }
}
