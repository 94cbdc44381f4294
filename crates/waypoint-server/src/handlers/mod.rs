//! Request handlers

mod media;
mod trips;
mod uploads;

pub use media::*;
pub use trips::*;
pub use uploads::*;

use axum::Json;

/// GET /api/health
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Reject path components that could escape the trip layout
pub(crate) fn safe_component(raw: &str) -> Result<&str, crate::AppError> {
    if raw.is_empty()
        || raw == "."
        || raw == ".."
        || raw.contains('/')
        || raw.contains('\\')
    {
        return Err(crate::AppError::bad_request("Invalid path component"));
    }
    Ok(raw)
}
