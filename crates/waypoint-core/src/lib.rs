//! Waypoint Core Library
//!
//! Shared functionality for the Waypoint trip expense tracker:
//! - Document classification (receipt vs travel document)
//! - Vision extraction client with JSON recovery
//! - Expense normalization into canonical records
//! - Trip metadata consolidation and provisional-trip renaming
//! - Image/PDF-to-JPEG conversion with a timestamp-validated cache
//! - Flat-file trip store (per-trip metadata.json / expenses.json)
//! - Prompt library with embedded defaults and user overrides

pub mod ai;
pub mod classify;
pub mod consolidate;
pub mod convert;
pub mod error;
pub mod ingest;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod prompts;
pub mod store;

pub use ai::{GeminiBackend, MockBackend, VisionBackend, VisionClient};
pub use classify::{classify, classify_with_self_report};
pub use consolidate::TripConsolidator;
pub use convert::{ConversionBackend, ConversionCache, ConversionOptions};
pub use error::{Error, Result};
pub use ingest::Ingestor;
pub use models::{
    BatchReport, Category, Classification, ConfidenceSource, DocumentKind, ExpenseRecord,
    StayNight, StoredUpload, TripMetadata,
};
pub use pipeline::TripProcessor;
pub use prompts::{Prompt, PromptId, PromptLibrary};
pub use store::TripStore;
