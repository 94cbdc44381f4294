//! The document ingestion and consolidation pipeline
//!
//! One consolidation pass per trip: every file in receipts/ is classified
//! (heuristic plus the model's self-report), misfiled travel documents are
//! moved, extraction fragments are normalized into expenses or folded into
//! trip metadata, and a provisional trip is renamed to its final identity.
//!
//! Individual file failures never abort the batch; they surface per-file in
//! the [`BatchReport`] while the batch is reported successful whenever the
//! store writes succeeded.

use std::collections::HashSet;

use tracing::{info, warn};

use crate::ai::parsing::{extract_json_object, DocumentAnalysis, TripDetails};
use crate::ai::{VisionBackend, VisionClient};
use crate::classify::classify_with_self_report;
use crate::consolidate::{
    is_provisional, repoint_sources, resolve_collision, TripConsolidator,
};
use crate::error::{Error, Result};
use crate::models::{
    BatchReport, DocumentKind, ExpenseRecord, FileError, FileStatus, ProcessedFile,
};
use crate::normalize::{failed_record, normalize};
use crate::prompts::{PromptId, PromptLibrary};
use crate::store::{TripStore, RECEIPTS_DIR, TRAVEL_DOCS_DIR};

/// Runs consolidation passes over trips
pub struct TripProcessor {
    store: TripStore,
    client: Option<VisionClient>,
    analyze_prompt: String,
    trip_prompt: String,
}

impl TripProcessor {
    /// Build a processor. Prompt resolution (override dir, embedded
    /// defaults) happens once here; the prompts carry no variables.
    pub fn new(store: TripStore, client: Option<VisionClient>) -> Result<Self> {
        let mut prompts = PromptLibrary::new();
        let vars = std::collections::HashMap::new();
        let analyze_prompt = prompts.get(PromptId::AnalyzeDocument)?.render_user(&vars);
        let trip_prompt = prompts.get(PromptId::ExtractTripDetails)?.render_user(&vars);

        Ok(Self {
            store,
            client,
            analyze_prompt,
            trip_prompt,
        })
    }

    pub fn store(&self) -> &TripStore {
        &self.store
    }

    /// Process every document in a trip and consolidate its metadata.
    ///
    /// Missing AI credentials are fatal to the whole operation (config
    /// error, surfaced immediately); per-file extraction failures degrade to
    /// flagged fallback records.
    pub async fn process_trip(&self, trip: &str) -> Result<BatchReport> {
        let client = self.client.as_ref().ok_or_else(|| {
            Error::ExtractionUnavailable("vision API key not configured".into())
        })?;

        if !self.store.trip_exists(trip) {
            return Err(Error::NotFound(format!("trip {}", trip)));
        }

        let metadata = match self.store.load_metadata(trip) {
            Ok(metadata) => metadata,
            Err(Error::NotFound(_)) => crate::models::TripMetadata::new(trip),
            Err(e) => return Err(e),
        };
        let mut expenses = self.store.load_expenses(trip)?;

        // Re-processing must not duplicate records
        let known_sources: HashSet<String> =
            expenses.iter().map(|e| e.source.clone()).collect();

        let mut consolidator = TripConsolidator::new(metadata);
        let mut processed_files = Vec::new();
        let mut errors = Vec::new();
        let mut travel_document_count = 0usize;

        // Pass 1: everything uploaded as a receipt
        for file_name in self.store.list_receipt_files(trip)? {
            let receipt_source = format!("{}/{}", RECEIPTS_DIR, file_name);
            let travel_source = format!("{}/{}", TRAVEL_DOCS_DIR, file_name);
            if known_sources.contains(&receipt_source) || known_sources.contains(&travel_source)
            {
                processed_files.push(ProcessedFile {
                    file: file_name,
                    kind: DocumentKind::Receipt,
                    status: FileStatus::Skipped,
                });
                continue;
            }

            let path = self.store.receipts_dir(trip).join(&file_name);
            let analysis = match client.extract(&path, &self.analyze_prompt).await {
                Ok(raw) => extract_json_object(&raw),
                Err(e) => {
                    warn!(file = %file_name, error = %e, "Extraction failed");
                    errors.push(FileError {
                        file: file_name.clone(),
                        error: e.to_string(),
                    });
                    expenses.push(failed_record(&file_name, &receipt_source));
                    processed_files.push(ProcessedFile {
                        file: file_name,
                        kind: DocumentKind::Receipt,
                        status: FileStatus::Failed,
                    });
                    continue;
                }
            };

            let Some(fields) = analysis else {
                // Three-tier recovery exhausted: processed with no data
                warn!(file = %file_name, "No recoverable JSON in extraction response");
                errors.push(FileError {
                    file: file_name.clone(),
                    error: "no recoverable JSON in extraction response".to_string(),
                });
                expenses.push(failed_record(&file_name, &receipt_source));
                processed_files.push(ProcessedFile {
                    file: file_name,
                    kind: DocumentKind::Receipt,
                    status: FileStatus::Failed,
                });
                continue;
            };

            let analysis = DocumentAnalysis::from_fields(&fields);
            let classification =
                classify_with_self_report(&file_name, analysis.kind.as_deref());

            match classification.kind {
                DocumentKind::TravelDocument => {
                    // Relocation is part of the classification's observable
                    // effect; a failed move leaves the file for the next run.
                    if let Err(e) = self.store.move_to_travel_documents(trip, &file_name) {
                        warn!(file = %file_name, error = %e, "Failed to move travel document");
                        errors.push(FileError {
                            file: file_name.clone(),
                            error: format!("failed to move travel document: {}", e),
                        });
                        processed_files.push(ProcessedFile {
                            file: file_name,
                            kind: DocumentKind::TravelDocument,
                            status: FileStatus::Failed,
                        });
                        continue;
                    }

                    let details = TripDetails::from_fields(&fields);
                    if !details.is_empty() {
                        consolidator.apply_trip_details(&details);
                    }
                    if let Some(record) =
                        travel_document_expense(&analysis, &file_name, &travel_source)
                    {
                        consolidator.apply_expense(&record);
                        expenses.push(record);
                    }
                    travel_document_count += 1;
                    processed_files.push(ProcessedFile {
                        file: file_name,
                        kind: DocumentKind::TravelDocument,
                        status: FileStatus::MovedAndProcessed,
                    });
                }
                DocumentKind::Receipt => {
                    let record = normalize(&analysis, &file_name, &receipt_source);
                    consolidator.apply_expense(&record);
                    expenses.push(record);
                    processed_files.push(ProcessedFile {
                        file: file_name,
                        kind: DocumentKind::Receipt,
                        status: FileStatus::ProcessedAsExpense,
                    });
                }
            }
        }

        // Pass 2: documents already filed under travel_documents/
        for file_name in self.store.list_travel_document_files(trip)? {
            let travel_source = format!("{}/{}", TRAVEL_DOCS_DIR, file_name);
            let already_moved = processed_files
                .iter()
                .any(|p| p.file == file_name && p.status == FileStatus::MovedAndProcessed);
            if already_moved || known_sources.contains(&travel_source) {
                continue;
            }

            let path = self.store.travel_docs_dir(trip).join(&file_name);
            match client.extract(&path, &self.trip_prompt).await {
                Ok(raw) => {
                    if let Some(fields) = extract_json_object(&raw) {
                        let details = TripDetails::from_fields(&fields);
                        if !details.is_empty() {
                            consolidator.apply_trip_details(&details);
                        }
                        let analysis = DocumentAnalysis::from_fields(&fields);
                        if let Some(record) =
                            travel_document_expense(&analysis, &file_name, &travel_source)
                        {
                            consolidator.apply_expense(&record);
                            expenses.push(record);
                        }
                    }
                    travel_document_count += 1;
                    processed_files.push(ProcessedFile {
                        file: file_name,
                        kind: DocumentKind::TravelDocument,
                        status: FileStatus::Processed,
                    });
                }
                Err(e) => {
                    warn!(file = %file_name, error = %e, "Travel document extraction failed");
                    errors.push(FileError {
                        file: file_name.clone(),
                        error: e.to_string(),
                    });
                    processed_files.push(ProcessedFile {
                        file: file_name,
                        kind: DocumentKind::TravelDocument,
                        status: FileStatus::Failed,
                    });
                }
            }
        }

        consolidator.finalize_votes();
        let display_name = consolidator.display_name();
        let mut metadata = consolidator.into_metadata();

        self.store.save_expenses(trip, &expenses)?;
        self.store.save_metadata(trip, &metadata)?;

        // Finalize: provisional trips take a destination/date-derived name
        let mut final_trip = trip.to_string();
        if is_provisional(trip) {
            if let Some(display) = display_name {
                let final_name = resolve_collision(&self.store.trips_root(), &display);
                match self.store.rename_trip(trip, &final_name.filesystem) {
                    Ok(()) => {
                        metadata.name = final_name.display.clone();
                        metadata.filesystem_name = Some(final_name.filesystem.clone());
                        repoint_sources(&mut expenses);
                        self.store
                            .save_metadata(&final_name.filesystem, &metadata)?;
                        self.store
                            .save_expenses(&final_name.filesystem, &expenses)?;
                        final_trip = final_name.filesystem;
                    }
                    Err(e) => {
                        // Recoverable: the trip keeps its provisional
                        // identity and no records are lost
                        warn!(trip = %trip, error = %e, "Trip rename failed");
                    }
                }
            }
        }

        info!(
            trip = %final_trip,
            expenses = expenses.len(),
            travel_documents = travel_document_count,
            errors = errors.len(),
            "Consolidation pass complete"
        );

        Ok(BatchReport {
            trip_name: metadata.name.clone(),
            expense_count: expenses.len(),
            travel_document_count,
            processed_files,
            errors,
            metadata,
        })
    }
}

/// Travel documents that carry a positive amount are included as expenses by
/// default; the user can exclude them later.
fn travel_document_expense(
    analysis: &DocumentAnalysis,
    file_name: &str,
    source: &str,
) -> Option<ExpenseRecord> {
    let amount = analysis.amount.unwrap_or(0.0);
    if amount <= 0.0 {
        return None;
    }

    let mut record = normalize(analysis, file_name, source);
    if analysis.merchant.is_none() {
        record.merchant = "Travel Service".to_string();
    }
    record.is_travel_document = true;
    Some(record)
}
