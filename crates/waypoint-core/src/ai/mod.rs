//! Pluggable vision extraction backend abstraction
//!
//! One blocking round trip per file: the backend receives a file path plus a
//! natural-language instruction and returns the model's raw text. No retries,
//! no streaming. Everything downstream of the raw text (JSON recovery, typed
//! fragments) lives in [`parsing`].
//!
//! # Architecture
//!
//! - `VisionBackend` trait: the extraction interface
//! - `VisionClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Backend implementations: `GeminiBackend`, `MockBackend`
//!
//! # Configuration
//!
//! Environment variables:
//! - `WAYPOINT_AI_BACKEND`: Backend to use (gemini, mock). Default: gemini
//! - `GEMINI_API_KEY`: API key (required for the gemini backend)
//! - `GEMINI_MODEL`: Model name (default: gemini-1.5-flash)

mod gemini;
mod mock;
pub mod parsing;

pub use gemini::GeminiBackend;
pub use mock::MockBackend;

use std::path::Path;

use async_trait::async_trait;

use crate::error::Result;

/// Trait defining the interface for vision extraction backends
#[async_trait]
pub trait VisionBackend: Send + Sync {
    /// Send one file plus an instruction, returning the raw response text.
    ///
    /// Fails with `Error::ExtractionUnavailable` when no credential is
    /// configured and `Error::ExtractionFailed` on transport errors or a
    /// malformed upstream envelope. Callers substitute a fallback record
    /// instead of aborting the batch.
    async fn extract(&self, file_path: &Path, prompt: &str) -> Result<String>;

    /// Check if the backend is reachable
    async fn health_check(&self) -> bool;

    /// Get the model name (for logging)
    fn model(&self) -> &str;
}

/// Concrete vision client enum
///
/// Provides Clone and compile-time dispatch without Box<dyn> overhead.
#[derive(Clone)]
pub enum VisionClient {
    /// Gemini vision API over HTTP
    Gemini(GeminiBackend),
    /// Mock backend for testing
    Mock(MockBackend),
}

impl VisionClient {
    /// Create a vision client from environment variables
    ///
    /// Returns None when the selected backend is not configured (no
    /// credential); AI-dependent operations then degrade per the error
    /// taxonomy instead of crashing.
    pub fn from_env() -> Option<Self> {
        let backend =
            std::env::var("WAYPOINT_AI_BACKEND").unwrap_or_else(|_| "gemini".to_string());

        match backend.to_lowercase().as_str() {
            "gemini" => GeminiBackend::from_env().map(VisionClient::Gemini),
            "mock" => Some(VisionClient::Mock(MockBackend::new())),
            _ => {
                tracing::warn!(backend = %backend, "Unknown WAYPOINT_AI_BACKEND, falling back to gemini");
                GeminiBackend::from_env().map(VisionClient::Gemini)
            }
        }
    }

    /// Create a Gemini backend directly
    pub fn gemini(api_key: &str, model: &str) -> Self {
        VisionClient::Gemini(GeminiBackend::new(api_key, model))
    }

    /// Create a mock backend for testing
    pub fn mock(backend: MockBackend) -> Self {
        VisionClient::Mock(backend)
    }
}

#[async_trait]
impl VisionBackend for VisionClient {
    async fn extract(&self, file_path: &Path, prompt: &str) -> Result<String> {
        match self {
            VisionClient::Gemini(b) => b.extract(file_path, prompt).await,
            VisionClient::Mock(b) => b.extract(file_path, prompt).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            VisionClient::Gemini(b) => b.health_check().await,
            VisionClient::Mock(b) => b.health_check().await,
        }
    }

    fn model(&self) -> &str {
        match self {
            VisionClient::Gemini(b) => b.model(),
            VisionClient::Mock(b) => b.model(),
        }
    }
}
