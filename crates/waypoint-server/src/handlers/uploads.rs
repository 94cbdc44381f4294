//! Upload and batch-processing handlers

use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use tracing::info;

use crate::handlers::safe_component;
use crate::{AppError, AppState, MAX_UPLOAD_SIZE};
use waypoint_core::models::{BatchReport, DocumentKind, StoredUpload};
use waypoint_core::{Ingestor, TripProcessor};

/// POST /api/trips/:trip/uploads - Accept one file (multipart)
///
/// Fields: `file` (required), `type` (optional override: receipt or
/// travel_document). The trip directory is created on first upload.
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    Path(trip): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<StoredUpload>, AppError> {
    let trip = safe_component(&trip)?.to_string();

    let mut file: Option<(String, Vec<u8>, Option<String>)> = None;
    let mut kind_override: Option<DocumentKind> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| AppError::bad_request("Invalid multipart body"))?
    {
        match field.name() {
            Some("file") => {
                let name = field
                    .file_name()
                    .ok_or_else(|| AppError::bad_request("Missing upload filename"))?
                    .to_string();
                let mime = field.content_type().map(String::from);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|_| {
                        AppError::bad_request("Invalid request body or file too large (max 10MB)")
                    })?
                    .to_vec();
                file = Some((name, bytes, mime));
            }
            Some("type") => {
                let raw = field
                    .text()
                    .await
                    .map_err(|_| AppError::bad_request("Invalid type field"))?;
                kind_override = raw.parse::<DocumentKind>().ok();
            }
            _ => {}
        }
    }

    let (name, bytes, mime) =
        file.ok_or_else(|| AppError::bad_request("No file field in upload"))?;
    if bytes.is_empty() {
        return Err(AppError::bad_request("No file data provided"));
    }
    if bytes.len() > MAX_UPLOAD_SIZE {
        return Err(AppError::bad_request("File size too large. Maximum 10MB allowed."));
    }

    state
        .store
        .create_trip(&trip)
        .map_err(AppError::from_core)?;

    let ingestor = Ingestor::new();
    let upload = ingestor
        .ingest(&state.store, &trip, &name, &bytes, mime.as_deref(), kind_override)
        .map_err(AppError::from_core)?;

    info!(trip = %trip, file = %upload.file_name, kind = %upload.kind, "Upload stored");
    Ok(Json(upload))
}

/// POST /api/trips/:trip/process - Run a consolidation pass over the trip
pub async fn process_trip(
    State(state): State<Arc<AppState>>,
    Path(trip): Path<String>,
) -> Result<Json<BatchReport>, AppError> {
    let trip = safe_component(&trip)?;

    let processor = TripProcessor::new(state.store.clone(), state.client.clone())
        .map_err(AppError::from_core)?;
    let report = processor
        .process_trip(trip)
        .await
        .map_err(AppError::from_core)?;

    Ok(Json(report))
}
