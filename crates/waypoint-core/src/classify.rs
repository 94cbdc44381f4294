//! Document classifier
//!
//! Filename keyword heuristics decide whether an uploaded file is a travel
//! document or a receipt. The prefilter is deliberately cheap and
//! false-negative tolerant: ambiguous or keyword-less names fall through to
//! receipt, where the combined analysis prompt asks the model to self-report
//! `type`, and that self-report overrides the heuristic when present.

use crate::models::{Classification, ConfidenceSource, DocumentKind};

/// Filename fragments that mark a travel document, including common
/// misspellings and carrier/hotel-chain brand names.
const TRAVEL_KEYWORDS: &[&str] = &[
    "itinerary",
    "itenary",
    "itenery",
    "confirmation",
    "boarding",
    "flight",
    "airline",
    "travel",
    "reservation",
    "ticket",
    "eticket",
    "hotel",
    "booking",
    "gmail",
    "fw_",
    "trip",
    "marriott",
    "hilton",
    "hyatt",
    "delta",
    "united",
    "southwest",
    "jetblue",
    "amtrak",
    "airbnb",
    "expedia",
];

/// Filename fragments that mark a purchase receipt. A travel keyword match
/// alongside any of these stays a receipt ("hotel_receipt.pdf").
const RECEIPT_KEYWORDS: &[&str] = &[
    "receipt",
    "invoice",
    "bill",
    "grocery",
    "restaurant",
    "cafe",
    "parking",
    "pharmacy",
];

/// Classify a file by its name alone. Never fails; unknown or empty
/// filenames default to receipt.
pub fn classify(file_name: &str) -> Classification {
    let lower = file_name.to_lowercase();

    let travel = TRAVEL_KEYWORDS.iter().any(|k| lower.contains(k));
    let receipt = RECEIPT_KEYWORDS.iter().any(|k| lower.contains(k));

    let kind = if travel && !receipt {
        DocumentKind::TravelDocument
    } else {
        DocumentKind::Receipt
    };

    Classification {
        kind,
        source: ConfidenceSource::FilenameHeuristic,
    }
}

/// Classify with the model's self-reported `type` field taking priority
/// over the filename heuristic when it parses to a known kind.
pub fn classify_with_self_report(file_name: &str, self_report: Option<&str>) -> Classification {
    if let Some(reported) = self_report {
        if let Ok(kind) = reported.parse::<DocumentKind>() {
            return Classification {
                kind,
                source: ConfidenceSource::AiSelfReport,
            };
        }
    }
    classify(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_travel_keywords_classify_as_travel() {
        for name in [
            "itinerary_austin.pdf",
            "Fw_ Flight Confirmation.pdf",
            "boarding_pass.jpg",
            "delta_eticket.pdf",
            "Gmail - Your Reservation.pdf",
            "trip_summary.png",
        ] {
            assert_eq!(
                classify(name).kind,
                DocumentKind::TravelDocument,
                "{} should be a travel document",
                name
            );
        }
    }

    #[test]
    fn test_plain_names_default_to_receipt() {
        for name in ["lunch.jpg", "IMG_2041.jpeg", "scan001.pdf", ""] {
            assert_eq!(classify(name).kind, DocumentKind::Receipt);
        }
    }

    #[test]
    fn test_receipt_keyword_beats_travel_keyword() {
        // Stricter rule: travel keywords only win when no receipt keyword
        // matches, so hotel receipts stay expenses.
        assert_eq!(
            classify("hotel_receipt.pdf").kind,
            DocumentKind::Receipt
        );
        assert_eq!(
            classify("parking_at_airport_hotel.jpg").kind,
            DocumentKind::Receipt
        );
    }

    #[test]
    fn test_classification_is_case_insensitive() {
        assert_eq!(
            classify("ITINERARY.PDF").kind,
            DocumentKind::TravelDocument
        );
    }

    #[test]
    fn test_self_report_overrides_heuristic() {
        let c = classify_with_self_report("scan001.pdf", Some("travel_document"));
        assert_eq!(c.kind, DocumentKind::TravelDocument);
        assert_eq!(c.source, ConfidenceSource::AiSelfReport);

        // Heuristic says travel, the model disagrees
        let c = classify_with_self_report("itinerary.pdf", Some("receipt"));
        assert_eq!(c.kind, DocumentKind::Receipt);
        assert_eq!(c.source, ConfidenceSource::AiSelfReport);
    }

    #[test]
    fn test_unparseable_self_report_falls_back() {
        let c = classify_with_self_report("itinerary.pdf", Some("paperwork"));
        assert_eq!(c.kind, DocumentKind::TravelDocument);
        assert_eq!(c.source, ConfidenceSource::FilenameHeuristic);
    }
}
