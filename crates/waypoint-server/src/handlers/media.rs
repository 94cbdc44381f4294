//! Thumbnail and converted-image streaming

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};

use crate::handlers::safe_component;
use crate::{AppError, AppState};
use waypoint_core::{ConversionCache, ConversionOptions};

/// GET /api/trips/:trip/files/:file/thumbnail - Display-sized JPEG
pub async fn thumbnail(
    State(state): State<Arc<AppState>>,
    Path((trip, file)): Path<(String, String)>,
) -> Result<Response, AppError> {
    serve_conversion(&state, &trip, &file, true)
}

/// GET /api/trips/:trip/files/:file/converted - Full-size JPEG rendition
pub async fn converted(
    State(state): State<Arc<AppState>>,
    Path((trip, file)): Path<(String, String)>,
) -> Result<Response, AppError> {
    serve_conversion(&state, &trip, &file, false)
}

fn serve_conversion(
    state: &AppState,
    trip: &str,
    file: &str,
    thumbnail: bool,
) -> Result<Response, AppError> {
    let trip = safe_component(trip)?;
    let file = safe_component(file)?;

    let source = locate_source(state, trip, file)
        .ok_or_else(|| AppError::not_found("File not found"))?;

    let stem = std::path::Path::new(file)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file);

    let (cache_dir, opts) = if thumbnail {
        (state.store.thumbnails_dir(trip), ConversionOptions::thumbnail())
    } else {
        (state.store.converted_dir(trip), ConversionOptions::full_size())
    };
    let cache_path = cache_dir.join(format!("{}.jpg", stem));

    let cache = ConversionCache::new();
    let bytes = cache
        .get_display_artifact(&source, &cache_path, &opts)
        .map_err(AppError::from_core)?;

    Ok((
        [
            (header::CONTENT_TYPE, "image/jpeg"),
            (header::CACHE_CONTROL, "public, max-age=3600"),
        ],
        bytes,
    )
        .into_response())
}

/// A stored file may live under receipts/ or travel_documents/
fn locate_source(state: &AppState, trip: &str, file: &str) -> Option<PathBuf> {
    let receipt = state.store.receipts_dir(trip).join(file);
    if receipt.is_file() {
        return Some(receipt);
    }
    let travel = state.store.travel_docs_dir(trip).join(file);
    if travel.is_file() {
        return Some(travel);
    }
    None
}
