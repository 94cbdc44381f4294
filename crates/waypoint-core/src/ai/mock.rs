//! Mock backend for testing
//!
//! Scripted responses keyed by filename substring, with failure injection
//! and call counting. Useful for unit tests and development without a
//! configured API key.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::{Error, Result};

use super::VisionBackend;

/// Mock vision backend
///
/// `extract` returns the first scripted response whose filename pattern is a
/// substring of the requested file's name, then the default response, and
/// otherwise fails like an unreachable service.
#[derive(Clone, Default)]
pub struct MockBackend {
    responses: Arc<Mutex<Vec<(String, String)>>>,
    default_response: Arc<Mutex<Option<String>>>,
    failure: Arc<Mutex<Option<String>>>,
    calls: Arc<AtomicUsize>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a response for files whose name contains `pattern`
    pub fn with_response(self, pattern: &str, response: &str) -> Self {
        self.responses
            .lock()
            .expect("mock lock")
            .push((pattern.to_string(), response.to_string()));
        self
    }

    /// Script a response for any file without a pattern match
    pub fn with_default_response(self, response: &str) -> Self {
        *self.default_response.lock().expect("mock lock") = Some(response.to_string());
        self
    }

    /// Make every extraction fail with the given message
    pub fn failing(message: &str) -> Self {
        let mock = Self::default();
        *mock.failure.lock().expect("mock lock") = Some(message.to_string());
        mock
    }

    /// Number of extract calls made so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VisionBackend for MockBackend {
    async fn extract(&self, file_path: &Path, _prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(message) = self.failure.lock().expect("mock lock").clone() {
            return Err(Error::ExtractionFailed(message));
        }

        let file_name = file_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();

        let scripted = self
            .responses
            .lock()
            .expect("mock lock")
            .iter()
            .find(|(pattern, _)| file_name.contains(pattern.as_str()))
            .map(|(_, response)| response.clone());

        if let Some(response) = scripted {
            return Ok(response);
        }

        if let Some(default) = self.default_response.lock().expect("mock lock").clone() {
            return Ok(default);
        }

        Err(Error::ExtractionFailed(format!(
            "no scripted response for {}",
            file_name
        )))
    }

    async fn health_check(&self) -> bool {
        self.failure.lock().expect("mock lock").is_none()
    }

    fn model(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_response_by_pattern() {
        let mock = MockBackend::new()
            .with_response("lunch", r#"{"amount": 18.50}"#)
            .with_default_response("{}");

        let out = mock.extract(Path::new("/tmp/lunch.jpg"), "p").await.unwrap();
        assert!(out.contains("18.50"));

        let out = mock.extract(Path::new("/tmp/other.jpg"), "p").await.unwrap();
        assert_eq!(out, "{}");
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let mock = MockBackend::failing("HTTP 500");
        let err = mock.extract(Path::new("a.jpg"), "p").await.unwrap_err();
        assert!(matches!(err, Error::ExtractionFailed(_)));
        assert!(!mock.health_check().await);
    }
}
