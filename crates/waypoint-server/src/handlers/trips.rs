//! Trip and expense handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;

use crate::handlers::safe_component;
use crate::{AppError, AppState, SuccessResponse};
use waypoint_core::consolidate::sanitize_name;
use waypoint_core::models::{ExpenseRecord, TripMetadata};

#[derive(Debug, Deserialize)]
pub struct CreateTripRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTripRequest {
    pub name: Option<String>,
    pub destination: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub notes: Option<String>,
}

/// GET /api/trips - List all active trips
pub async fn list_trips(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<TripMetadata>>, AppError> {
    let trips = state.store.list_trips().map_err(AppError::from_core)?;
    Ok(Json(trips))
}

/// POST /api/trips - Create a trip
pub async fn create_trip(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateTripRequest>,
) -> Result<Json<TripMetadata>, AppError> {
    if body.name.trim().is_empty() {
        return Err(AppError::bad_request("Trip name is required"));
    }
    let name = sanitize_name(&body.name);
    let metadata = state
        .store
        .create_trip(&name)
        .map_err(AppError::from_core)?;
    Ok(Json(metadata))
}

/// GET /api/trips/:trip - Get trip metadata
pub async fn get_trip(
    State(state): State<Arc<AppState>>,
    Path(trip): Path<String>,
) -> Result<Json<TripMetadata>, AppError> {
    let trip = safe_component(&trip)?;
    let metadata = state
        .store
        .load_metadata(trip)
        .map_err(AppError::from_core)?;
    Ok(Json(metadata))
}

/// PATCH /api/trips/:trip - Update trip metadata, renaming the directory
/// when the name changes
pub async fn update_trip(
    State(state): State<Arc<AppState>>,
    Path(trip): Path<String>,
    Json(body): Json<UpdateTripRequest>,
) -> Result<Json<TripMetadata>, AppError> {
    let trip = safe_component(&trip)?;
    let mut metadata = state
        .store
        .load_metadata(trip)
        .map_err(AppError::from_core)?;

    if let Some(ref destination) = body.destination {
        metadata.destination = Some(destination.clone());
    }
    if let Some(ref raw) = body.start_date {
        let date = raw
            .parse()
            .map_err(|_| AppError::bad_request("Invalid start_date format (use YYYY-MM-DD)"))?;
        metadata.start_date = Some(date);
    }
    if let Some(ref raw) = body.end_date {
        let date = raw
            .parse()
            .map_err(|_| AppError::bad_request("Invalid end_date format (use YYYY-MM-DD)"))?;
        metadata.end_date = Some(date);
    }
    if let Some(ref notes) = body.notes {
        metadata.notes = Some(notes.clone());
    }

    let mut current = trip.to_string();
    if let Some(ref name) = body.name {
        let new_fs = sanitize_name(name);
        if new_fs != current {
            state
                .store
                .rename_trip(&current, &new_fs)
                .map_err(AppError::from_core)?;
            current = new_fs.clone();
        }
        metadata.name = name.clone();
        metadata.filesystem_name = Some(new_fs);
    }

    state
        .store
        .save_metadata(&current, &metadata)
        .map_err(AppError::from_core)?;
    Ok(Json(metadata))
}

/// DELETE /api/trips/:trip - Delete a trip and all its files
pub async fn delete_trip(
    State(state): State<Arc<AppState>>,
    Path(trip): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    let trip = safe_component(&trip)?;
    state.store.delete_trip(trip).map_err(AppError::from_core)?;
    Ok(Json(SuccessResponse { success: true }))
}

/// POST /api/trips/:trip/archive - Move a trip to the archive
pub async fn archive_trip(
    State(state): State<Arc<AppState>>,
    Path(trip): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    let trip = safe_component(&trip)?;
    state
        .store
        .archive_trip(trip)
        .map_err(AppError::from_core)?;
    Ok(Json(SuccessResponse { success: true }))
}

/// GET /api/trips/:trip/expenses - List a trip's expenses
pub async fn list_expenses(
    State(state): State<Arc<AppState>>,
    Path(trip): Path<String>,
) -> Result<Json<Vec<ExpenseRecord>>, AppError> {
    let trip = safe_component(&trip)?;
    if !state.store.trip_exists(trip) {
        return Err(AppError::not_found("Trip not found"));
    }
    let expenses = state
        .store
        .load_expenses(trip)
        .map_err(AppError::from_core)?;
    Ok(Json(expenses))
}

/// PUT /api/trips/:trip/expenses/:id - Replace an expense (edit/exclude)
pub async fn update_expense(
    State(state): State<Arc<AppState>>,
    Path((trip, id)): Path<(String, String)>,
    Json(record): Json<ExpenseRecord>,
) -> Result<Json<SuccessResponse>, AppError> {
    let trip = safe_component(&trip)?;
    if record.id != id {
        return Err(AppError::bad_request("Expense id mismatch"));
    }
    state
        .store
        .update_expense(trip, record)
        .map_err(AppError::from_core)?;
    Ok(Json(SuccessResponse { success: true }))
}

/// DELETE /api/trips/:trip/expenses/:id - Remove an expense and its file
pub async fn delete_expense(
    State(state): State<Arc<AppState>>,
    Path((trip, id)): Path<(String, String)>,
) -> Result<Json<SuccessResponse>, AppError> {
    let trip = safe_component(&trip)?;
    state
        .store
        .delete_expense(trip, &id)
        .map_err(AppError::from_core)?;
    Ok(Json(SuccessResponse { success: true }))
}
