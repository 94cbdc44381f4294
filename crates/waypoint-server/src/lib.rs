//! Waypoint Web Server
//!
//! Axum-based REST API over the waypoint-core pipeline: uploads, batch
//! processing, trip/expense reads and edits, and cached thumbnail/converted
//! image streaming. HTTP plumbing only — all engineering substance lives in
//! waypoint-core.

use std::sync::Arc;

use axum::{
    http::{HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Serialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

use waypoint_core::{TripStore, VisionClient};

mod handlers;

#[cfg(test)]
mod tests;

/// Maximum file upload size (10 MB)
pub const MAX_UPLOAD_SIZE: usize = waypoint_core::ingest::MAX_UPLOAD_BYTES;

/// Shared application state
pub struct AppState {
    pub store: TripStore,
    pub client: Option<VisionClient>,
}

impl AppState {
    pub fn new(store: TripStore, client: Option<VisionClient>) -> Self {
        Self { store, client }
    }
}

/// Build the application router
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_origin("*".parse::<HeaderValue>().expect("valid header"))
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/trips", get(handlers::list_trips).post(handlers::create_trip))
        .route(
            "/api/trips/:trip",
            get(handlers::get_trip)
                .patch(handlers::update_trip)
                .delete(handlers::delete_trip),
        )
        .route("/api/trips/:trip/archive", post(handlers::archive_trip))
        .route("/api/trips/:trip/process", post(handlers::process_trip))
        .route("/api/trips/:trip/uploads", post(handlers::upload_file))
        .route("/api/trips/:trip/expenses", get(handlers::list_expenses))
        .route(
            "/api/trips/:trip/expenses/:id",
            put(handlers::update_expense).delete(handlers::delete_expense),
        )
        .route(
            "/api/trips/:trip/files/:file/thumbnail",
            get(handlers::thumbnail),
        )
        .route(
            "/api/trips/:trip/files/:file/converted",
            get(handlers::converted),
        )
        .layer(axum::extract::DefaultBodyLimit::max(MAX_UPLOAD_SIZE + 1024))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the server until shutdown
pub async fn serve(state: Arc<AppState>, host: &str, port: u16) -> anyhow::Result<()> {
    let app = router(state);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Waypoint server listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

/// Generic success response body
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn not_found(msg: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn internal(msg: &str) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn service_unavailable(msg: &str) -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            message: msg.to_string(),
            internal: None,
        }
    }

    /// Map a core error onto the HTTP taxonomy
    pub fn from_core(err: waypoint_core::Error) -> Self {
        use waypoint_core::Error;
        match err {
            Error::NotFound(msg) => Self::not_found(&msg),
            Error::InvalidData(msg) => Self::bad_request(&msg),
            Error::ExtractionUnavailable(msg) => Self::service_unavailable(&msg),
            other => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: "An internal error occurred".to_string(),
                internal: Some(other.into()),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let err = err.into();
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            // Return a generic message to the client
            message: "An internal error occurred".to_string(),
            // Keep the full error for logging
            internal: Some(err),
        }
    }
}
