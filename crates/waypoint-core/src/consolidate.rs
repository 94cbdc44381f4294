//! Trip metadata consolidator
//!
//! Folds destination/date/notes signals harvested across all of a trip's
//! documents into one authoritative metadata record, and computes the final
//! human-readable + filesystem-safe trip name for provisional trips.
//!
//! Merge rules, per field:
//! - destination / trip name: travel-document fragments always outrank
//!   expense-inferred values, regardless of arrival order; among travel
//!   documents the first seen wins. With no travel document at all, the most
//!   frequent expense location wins (ties by first-seen).
//! - dates: widen only. New start replaces old only if strictly earlier,
//!   new end only if strictly later.
//! - notes: first non-empty wins.

use std::path::Path;
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use tracing::debug;

use crate::ai::parsing::TripDetails;
use crate::models::{Category, ExpenseRecord, TripMetadata};

/// IATA airport codes mapped to "City, Region" for transportation-expense
/// destination inference.
const AIRPORT_CODES: &[(&str, &str)] = &[
    // US major cities
    ("AUS", "Austin, TX"),
    ("DFW", "Dallas, TX"),
    ("IAH", "Houston, TX"),
    ("LAX", "Los Angeles, CA"),
    ("JFK", "New York, NY"),
    ("LGA", "New York, NY"),
    ("ORD", "Chicago, IL"),
    ("ATL", "Atlanta, GA"),
    ("MIA", "Miami, FL"),
    ("SEA", "Seattle, WA"),
    ("SFO", "San Francisco, CA"),
    ("LAS", "Las Vegas, NV"),
    ("PHX", "Phoenix, AZ"),
    ("DEN", "Denver, CO"),
    ("MSP", "Minneapolis, MN"),
    ("DTW", "Detroit, MI"),
    ("BOS", "Boston, MA"),
    ("PHL", "Philadelphia, PA"),
    ("BWI", "Baltimore, MD"),
    ("DCA", "Washington, DC"),
    ("IAD", "Washington, DC"),
    ("CLT", "Charlotte, NC"),
    ("MCO", "Orlando, FL"),
    ("FLL", "Fort Lauderdale, FL"),
    ("SAN", "San Diego, CA"),
    ("TPA", "Tampa, FL"),
    ("PDX", "Portland, OR"),
    ("MSY", "New Orleans, LA"),
    ("BNA", "Nashville, TN"),
    ("RDU", "Raleigh, NC"),
    ("CLE", "Cleveland, OH"),
    ("PIT", "Pittsburgh, PA"),
    ("SLC", "Salt Lake City, UT"),
    ("SAT", "San Antonio, TX"),
    ("MEM", "Memphis, TN"),
    ("STL", "St. Louis, MO"),
    // Canada
    ("YYZ", "Toronto, ON"),
    ("YVR", "Vancouver, BC"),
    ("YUL", "Montreal, QC"),
    ("YYC", "Calgary, AB"),
    ("YEG", "Edmonton, AB"),
    ("YOW", "Ottawa, ON"),
    ("YHZ", "Halifax, NS"),
    ("YWG", "Winnipeg, MB"),
    // Europe
    ("LHR", "London, UK"),
    ("LGW", "London, UK"),
    ("CDG", "Paris, France"),
    ("ORY", "Paris, France"),
    ("FRA", "Frankfurt, Germany"),
    ("MUC", "Munich, Germany"),
    ("BER", "Berlin, Germany"),
    ("AMS", "Amsterdam, Netherlands"),
    ("FCO", "Rome, Italy"),
    ("MAD", "Madrid, Spain"),
    ("BCN", "Barcelona, Spain"),
    ("ZUR", "Zurich, Switzerland"),
    ("VIE", "Vienna, Austria"),
    ("CPH", "Copenhagen, Denmark"),
    ("ARN", "Stockholm, Sweden"),
    ("OSL", "Oslo, Norway"),
    ("HEL", "Helsinki, Finland"),
    ("DUB", "Dublin, Ireland"),
    ("BRU", "Brussels, Belgium"),
    ("LIS", "Lisbon, Portugal"),
    ("ATH", "Athens, Greece"),
    ("IST", "Istanbul, Turkey"),
    ("SVO", "Moscow, Russia"),
    // Asia Pacific
    ("NRT", "Tokyo, Japan"),
    ("HND", "Tokyo, Japan"),
    ("KIX", "Osaka, Japan"),
    ("ICN", "Seoul, South Korea"),
    ("PEK", "Beijing, China"),
    ("PVG", "Shanghai, China"),
    ("HKG", "Hong Kong"),
    ("SIN", "Singapore"),
    ("BKK", "Bangkok, Thailand"),
    ("KUL", "Kuala Lumpur, Malaysia"),
    ("CGK", "Jakarta, Indonesia"),
    ("MNL", "Manila, Philippines"),
    ("SYD", "Sydney, Australia"),
    ("MEL", "Melbourne, Australia"),
    ("BNE", "Brisbane, Australia"),
    ("PER", "Perth, Australia"),
    ("AKL", "Auckland, New Zealand"),
    ("DEL", "Delhi, India"),
    ("BOM", "Mumbai, India"),
    ("BLR", "Bangalore, India"),
    // Middle East & Africa
    ("DXB", "Dubai, UAE"),
    ("DOH", "Doha, Qatar"),
    ("CAI", "Cairo, Egypt"),
    ("JNB", "Johannesburg, South Africa"),
    ("CPT", "Cape Town, South Africa"),
    // South America
    ("GRU", "São Paulo, Brazil"),
    ("GIG", "Rio de Janeiro, Brazil"),
    ("SCL", "Santiago, Chile"),
    ("LIM", "Lima, Peru"),
    ("BOG", "Bogotá, Colombia"),
    ("EZE", "Buenos Aires, Argentina"),
];

fn airport_city(code: &str) -> Option<&'static str> {
    AIRPORT_CODES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, city)| *city)
}

fn destination_patterns() -> &'static [Regex; 5] {
    static RES: OnceLock<[Regex; 5]> = OnceLock::new();
    RES.get_or_init(|| {
        [
            // "to AUS)" / "to AUS."
            Regex::new(r"to\s+([A-Z]{3})\s*[\)\.]").expect("valid regex"),
            // "to Austin (AUS)"
            Regex::new(r"to\s+([A-Za-z\s]+)\s*\(([A-Z]{3})\)").expect("valid regex"),
            // " to Austin, TX."
            Regex::new(r"\s+to\s+([A-Za-z\s,]+?)[\.\,\;]").expect("valid regex"),
            // "Destination: Austin"
            Regex::new(r"(?i)destination:?\s*([A-Za-z\s,]+)").expect("valid regex"),
            // "arriving in Austin"
            Regex::new(r"(?i)arriving\s+in\s+([A-Za-z\s,]+)").expect("valid regex"),
        ]
    })
}

/// Scan free text (expense note + merchant) for a flight-style destination:
/// an airport code from the table, or a literal "to <City>" phrase.
pub fn infer_destination(text: &str) -> Option<String> {
    for pattern in destination_patterns() {
        if let Some(caps) = pattern.captures(text) {
            let candidate = caps[1].trim().to_string();

            if let Some(city) = airport_city(&candidate) {
                return Some(city.to_string());
            }
            if candidate.len() > 2 {
                return Some(candidate);
            }
        }
    }
    None
}

fn paren_city_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\([^)]+\s+([^,)]+)(?:,\s*[^)]+)?\)").expect("valid regex")
    })
}

fn direction_prefix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^(Downtown|North|South|East|West|Central)\s+").expect("valid regex")
    })
}

fn airport_suffix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)([A-Za-z\s]+)\s+Airport").expect("valid regex"))
}

/// Extract a bare city name from the location formats extraction produces:
/// "City, State", "LAX (Los Angeles)", "Downtown Portland", "Foo Airport".
pub fn extract_city(destination: &str) -> String {
    let destination = destination.trim();
    if destination.is_empty() {
        return "Trip".to_string();
    }

    if let Some(caps) = paren_city_re().captures(destination) {
        return caps[1].trim().to_string();
    }

    if destination.contains(',') {
        let city_part = destination.split(',').next().unwrap_or(destination).trim();
        return direction_prefix_re().replace(city_part, "").to_string();
    }

    let cleaned = direction_prefix_re().replace(destination, "").to_string();

    if let Some(caps) = airport_suffix_re().captures(&cleaned) {
        return caps[1].trim().to_string();
    }

    cleaned
}

/// Sanitize a display name into a directory-safe token: strip everything
/// outside `[A-Za-z0-9 _-]`, spaces to underscores, collapse runs, trim.
pub fn sanitize_name(name: &str) -> String {
    let kept: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == ' ' || *c == '-' || *c == '_')
        .collect();

    let mut out = String::with_capacity(kept.len());
    let mut last_underscore = false;
    for c in kept.chars() {
        let c = if c == ' ' { '_' } else { c };
        if c == '_' {
            if !last_underscore {
                out.push('_');
            }
            last_underscore = true;
        } else {
            out.push(c);
            last_underscore = false;
        }
    }

    let trimmed = out.trim_matches('_');
    if trimmed.is_empty() {
        "untitled".to_string()
    } else {
        trimmed.to_string()
    }
}

fn provisional_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^temp_\d+$").expect("valid regex"))
}

/// Whether a trip directory name is a generated placeholder token
pub fn is_provisional(name: &str) -> bool {
    provisional_re().is_match(name)
}

/// Final display + filesystem name pair for a trip
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalName {
    pub display: String,
    pub filesystem: String,
}

/// Resolve a display name against existing sibling directories, appending an
/// incrementing numeric suffix until unique.
pub fn resolve_collision(trips_root: &Path, display: &str) -> FinalName {
    let base_fs = sanitize_name(display);
    let mut filesystem = base_fs.clone();
    let mut display_name = display.to_string();
    let mut counter = 1;

    while trips_root.join(&filesystem).exists() {
        counter += 1;
        filesystem = format!("{}_{}", base_fs, counter);
        display_name = format!("{} {}", display, counter);
    }

    FinalName {
        display: display_name,
        filesystem,
    }
}

/// Where a destination signal came from. Travel documents outrank
/// expense-inferred signals regardless of arrival order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SignalSource {
    TravelDocument,
    ExpenseInference,
}

/// Accumulates fragments for one trip, in upload order
pub struct TripConsolidator {
    metadata: TripMetadata,
    destination_source: Option<SignalSource>,
    /// Candidate display city when no destination string is available
    trip_name: Option<String>,
    /// Expense location strings in first-seen order with counts
    location_votes: Vec<(String, usize)>,
}

impl TripConsolidator {
    pub fn new(metadata: TripMetadata) -> Self {
        // A destination already persisted from an earlier pass keeps
        // travel-document priority so re-runs cannot demote it.
        let destination_source = metadata
            .destination
            .as_ref()
            .map(|_| SignalSource::TravelDocument);

        Self {
            metadata,
            destination_source,
            trip_name: None,
            location_votes: Vec::new(),
        }
    }

    pub fn metadata(&self) -> &TripMetadata {
        &self.metadata
    }

    /// Fold in a travel-document fragment
    pub fn apply_trip_details(&mut self, details: &TripDetails) {
        // First travel document wins among travel documents; expense-inferred
        // values are always displaced.
        if self.destination_source != Some(SignalSource::TravelDocument) {
            if let Some(ref destination) = details.destination {
                self.metadata.destination = Some(destination.clone());
                self.trip_name = Some(
                    details
                        .trip_name
                        .clone()
                        .unwrap_or_else(|| extract_city(destination)),
                );
                self.destination_source = Some(SignalSource::TravelDocument);
            } else if let Some(ref name) = details.trip_name {
                if self.trip_name.is_none() {
                    self.trip_name = Some(name.clone());
                }
            }
        }

        self.widen(
            parse_date(details.start_date.as_deref()),
            parse_date(details.end_date.as_deref()),
        );

        if self.metadata.notes.as_deref().unwrap_or("").is_empty() {
            if let Some(ref notes) = details.notes {
                if !notes.is_empty() {
                    self.metadata.notes = Some(notes.clone());
                }
            }
        }
    }

    /// Fold in a normalized expense record
    pub fn apply_expense(&mut self, record: &ExpenseRecord) {
        self.widen(Some(record.date), Some(record.date));

        if !record.location.is_empty() {
            self.vote(&record.location);
        }

        if record.category == Category::Transportation && self.metadata.destination.is_none() {
            let text = format!("{} {}", record.note, record.merchant);
            if let Some(destination) = infer_destination(&text) {
                debug!(destination = %destination, source = %record.source,
                    "Inferred destination from transportation expense");
                self.trip_name = Some(extract_city(&destination));
                self.metadata.destination = Some(destination);
                self.destination_source = Some(SignalSource::ExpenseInference);
            }
        }
    }

    fn vote(&mut self, location: &str) {
        if let Some(entry) = self
            .location_votes
            .iter_mut()
            .find(|(loc, _)| loc == location)
        {
            entry.1 += 1;
        } else {
            self.location_votes.push((location.to_string(), 1));
        }
    }

    fn widen(&mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) {
        if let Some(start) = start {
            match self.metadata.start_date {
                Some(current) if start >= current => {}
                _ => self.metadata.start_date = Some(start),
            }
        }
        if let Some(end) = end {
            match self.metadata.end_date {
                Some(current) if end <= current => {}
                _ => self.metadata.end_date = Some(end),
            }
        }
    }

    /// Apply the frequency-based location fallback. Called once, after every
    /// fragment has been folded in.
    pub fn finalize_votes(&mut self) {
        if self.metadata.destination.is_none() {
            // Most frequent location; only a strictly higher count displaces
            // an earlier entry, so ties break first-seen
            let mut winner: Option<(String, usize)> = None;
            for (location, count) in &self.location_votes {
                match winner {
                    Some((_, best)) if *count <= best => {}
                    _ => winner = Some((location.clone(), *count)),
                }
            }
            if let Some((location, _)) = winner {
                self.trip_name = Some(extract_city(&location));
                self.metadata.destination = Some(location);
            }
        }
        self.location_votes.clear();
    }

    pub fn into_metadata(mut self) -> TripMetadata {
        self.finalize_votes();
        self.metadata
    }

    /// Display name for a finalized provisional trip: city plus a
    /// " <Month> <Year>" suffix when a start date is known. None when the
    /// trip never acquired a usable destination — it keeps its placeholder
    /// identity until a human supplies one.
    pub fn display_name(&self) -> Option<String> {
        let city = match (&self.metadata.destination, &self.trip_name) {
            (Some(destination), _) => extract_city(destination),
            (None, Some(name)) => name.clone(),
            (None, None) => return None,
        };

        match self.metadata.start_date {
            Some(start) => Some(format!("{} {}", city, start.format("%B %Y"))),
            None => Some(city),
        }
    }
}

fn parse_date(raw: Option<&str>) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw?.trim(), "%Y-%m-%d").ok()
}

/// Re-point expense sources to trip-relative paths after a move or rename,
/// so no record references a now-nonexistent location.
pub fn repoint_sources(expenses: &mut [ExpenseRecord]) {
    for expense in expenses.iter_mut() {
        for subdir in ["receipts/", "travel_documents/"] {
            if let Some(pos) = expense.source.rfind(subdir) {
                if pos > 0 {
                    expense.source = expense.source[pos..].to_string();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ExpenseRecord;
    use uuid::Uuid;

    fn expense(date: &str, category: Category, note: &str, location: &str) -> ExpenseRecord {
        ExpenseRecord {
            id: Uuid::new_v4().to_string(),
            date: date.parse().unwrap(),
            merchant: "Merchant".to_string(),
            amount: 10.0,
            tax_amount: 0.0,
            category,
            note: note.to_string(),
            location: location.to_string(),
            source: "receipts/x.jpg".to_string(),
            is_travel_document: false,
            excluded: false,
            needs_review: false,
            is_hotel_stay: false,
            daily_breakdown: Vec::new(),
        }
    }

    fn details(destination: Option<&str>, start: Option<&str>, end: Option<&str>) -> TripDetails {
        TripDetails {
            destination: destination.map(String::from),
            trip_name: None,
            start_date: start.map(String::from),
            end_date: end.map(String::from),
            notes: None,
        }
    }

    #[test]
    fn test_airport_code_inference() {
        assert_eq!(
            infer_destination("Flight UA1234 to AUS)."),
            Some("Austin, TX".to_string())
        );
        assert_eq!(
            infer_destination("Economy to Austin (AUS) nonstop"),
            Some("Austin".to_string())
        );
        assert_eq!(
            infer_destination("Destination: Denver"),
            Some("Denver".to_string())
        );
        assert_eq!(infer_destination("groceries and sundries"), None);
    }

    #[test]
    fn test_extract_city_formats() {
        assert_eq!(extract_city("Austin, TX"), "Austin");
        assert_eq!(extract_city("Downtown Portland"), "Portland");
        assert_eq!(extract_city("Downtown Austin, TX"), "Austin");
        assert_eq!(extract_city("Narita Airport"), "Narita");
        assert_eq!(extract_city(""), "Trip");
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("Austin June 2025"), "Austin_June_2025");
        assert_eq!(sanitize_name("  São Paulo!!  "), "So_Paulo");
        assert_eq!(sanitize_name("a   b"), "a_b");
        assert_eq!(sanitize_name("!!!"), "untitled");
    }

    #[test]
    fn test_is_provisional() {
        assert!(is_provisional("temp_171234"));
        assert!(!is_provisional("temp_"));
        assert!(!is_provisional("Austin_June_2025"));
        assert!(!is_provisional("temp_12x"));
    }

    #[test]
    fn test_date_widening_is_order_independent() {
        let starts = ["2025-06-12", "2025-06-10", "2025-06-15"];
        let ends = ["2025-06-14", "2025-06-16", "2025-06-13"];

        // Apply in several arrival orders; result must not change
        for rotation in 0..3 {
            let mut consolidator = TripConsolidator::new(TripMetadata::new("temp_1"));
            for i in 0..3 {
                let idx = (i + rotation) % 3;
                consolidator
                    .apply_trip_details(&details(None, Some(starts[idx]), Some(ends[idx])));
            }
            let metadata = consolidator.into_metadata();
            assert_eq!(metadata.start_date.unwrap().to_string(), "2025-06-10");
            assert_eq!(metadata.end_date.unwrap().to_string(), "2025-06-16");
        }
    }

    #[test]
    fn test_expense_dates_widen_range() {
        let mut consolidator = TripConsolidator::new(TripMetadata::new("temp_1"));
        consolidator.apply_trip_details(&details(None, Some("2025-06-12"), Some("2025-06-14")));
        consolidator.apply_expense(&expense("2025-06-16", Category::Meals, "", ""));
        consolidator.apply_expense(&expense("2025-06-13", Category::Meals, "", ""));

        let metadata = consolidator.into_metadata();
        assert_eq!(metadata.start_date.unwrap().to_string(), "2025-06-12");
        assert_eq!(metadata.end_date.unwrap().to_string(), "2025-06-16");
    }

    #[test]
    fn test_first_travel_document_wins_among_travel_documents() {
        let mut consolidator = TripConsolidator::new(TripMetadata::new("temp_1"));
        consolidator.apply_trip_details(&details(Some("Austin, TX"), None, None));
        consolidator.apply_trip_details(&details(Some("Dallas, TX"), None, None));

        assert_eq!(
            consolidator.metadata().destination.as_deref(),
            Some("Austin, TX")
        );
    }

    #[test]
    fn travel_doc_priority_is_order_independent() {
        // The deliberate asymmetry: a travel document's destination displaces
        // an expense-inferred one even when it arrives later, while an
        // expense inference never displaces a travel document's.
        let flight = expense(
            "2025-06-12",
            Category::Transportation,
            "Flight to AUS).",
            "",
        );

        // Expense first, travel document second
        let mut consolidator = TripConsolidator::new(TripMetadata::new("temp_1"));
        consolidator.apply_expense(&flight);
        assert_eq!(
            consolidator.metadata().destination.as_deref(),
            Some("Austin, TX")
        );
        consolidator.apply_trip_details(&details(Some("Dallas, TX"), None, None));
        assert_eq!(
            consolidator.metadata().destination.as_deref(),
            Some("Dallas, TX")
        );

        // Travel document first, expense second
        let mut consolidator = TripConsolidator::new(TripMetadata::new("temp_1"));
        consolidator.apply_trip_details(&details(Some("Dallas, TX"), None, None));
        consolidator.apply_expense(&flight);
        assert_eq!(
            consolidator.metadata().destination.as_deref(),
            Some("Dallas, TX")
        );
    }

    #[test]
    fn test_transportation_inference_only_when_unset() {
        let mut consolidator = TripConsolidator::new(TripMetadata::new("temp_1"));
        consolidator.apply_expense(&expense(
            "2025-06-12",
            Category::Transportation,
            "Flight to AUS).",
            "",
        ));
        // Second inference does not displace the first
        consolidator.apply_expense(&expense(
            "2025-06-13",
            Category::Transportation,
            "Train to Dallas, TX.",
            "",
        ));
        assert_eq!(
            consolidator.metadata().destination.as_deref(),
            Some("Austin, TX")
        );
    }

    #[test]
    fn test_location_voting_fallback() {
        let mut consolidator = TripConsolidator::new(TripMetadata::new("temp_1"));
        consolidator.apply_expense(&expense("2025-06-12", Category::Meals, "", "Austin, TX"));
        consolidator.apply_expense(&expense("2025-06-13", Category::Meals, "", "Dallas, TX"));
        consolidator.apply_expense(&expense("2025-06-14", Category::Meals, "", "Austin, TX"));

        let metadata = consolidator.into_metadata();
        assert_eq!(metadata.destination.as_deref(), Some("Austin, TX"));
    }

    #[test]
    fn test_location_voting_tie_breaks_first_seen() {
        let mut consolidator = TripConsolidator::new(TripMetadata::new("temp_1"));
        consolidator.apply_expense(&expense("2025-06-12", Category::Meals, "", "Dallas, TX"));
        consolidator.apply_expense(&expense("2025-06-13", Category::Meals, "", "Austin, TX"));

        let metadata = consolidator.into_metadata();
        assert_eq!(metadata.destination.as_deref(), Some("Dallas, TX"));
    }

    #[test]
    fn test_notes_first_non_empty_wins() {
        let mut consolidator = TripConsolidator::new(TripMetadata::new("temp_1"));
        let mut first = details(None, None, None);
        first.notes = Some("Quarterly offsite".to_string());
        let mut second = details(None, None, None);
        second.notes = Some("Some other note".to_string());

        consolidator.apply_trip_details(&first);
        consolidator.apply_trip_details(&second);
        assert_eq!(
            consolidator.metadata().notes.as_deref(),
            Some("Quarterly offsite")
        );
    }

    #[test]
    fn test_display_name_with_and_without_start_date() {
        let mut consolidator = TripConsolidator::new(TripMetadata::new("temp_1"));
        consolidator.apply_trip_details(&details(
            Some("Austin, TX"),
            Some("2025-06-12"),
            Some("2025-06-16"),
        ));
        assert_eq!(consolidator.display_name().unwrap(), "Austin June 2025");

        let mut consolidator = TripConsolidator::new(TripMetadata::new("temp_1"));
        consolidator.apply_trip_details(&details(Some("Austin, TX"), None, None));
        assert_eq!(consolidator.display_name().unwrap(), "Austin");

        let consolidator = TripConsolidator::new(TripMetadata::new("temp_1"));
        assert!(consolidator.display_name().is_none());
    }

    #[test]
    fn test_resolve_collision_appends_counter() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("Austin")).unwrap();
        std::fs::create_dir(dir.path().join("Austin_2")).unwrap();

        let name = resolve_collision(dir.path(), "Austin");
        assert_eq!(name.filesystem, "Austin_3");
        assert_eq!(name.display, "Austin 3");

        let name = resolve_collision(dir.path(), "Boston");
        assert_eq!(name.filesystem, "Boston");
        assert_eq!(name.display, "Boston");
    }

    #[test]
    fn test_repoint_sources() {
        let mut expenses = vec![
            expense("2025-06-12", Category::Meals, "", ""),
            expense("2025-06-12", Category::Meals, "", ""),
        ];
        expenses[0].source = "data/trips/temp_1/receipts/lunch.jpg".to_string();
        expenses[1].source = "travel_documents/itinerary.pdf".to_string();

        repoint_sources(&mut expenses);
        assert_eq!(expenses[0].source, "receipts/lunch.jpg");
        assert_eq!(expenses[1].source, "travel_documents/itinerary.pdf");
    }
}
