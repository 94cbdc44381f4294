//! Upload ingest
//!
//! Accepts PDF and common raster formats, sanitizes and de-duplicates
//! filenames, and normalizes every non-PDF image to JPEG at ingest time
//! (source format is not preserved) through the same conversion chain used
//! for thumbnails. A failed conversion falls back to storing the original
//! bytes rather than rejecting the upload.

use std::fs;
use std::io::Write;
use std::path::Path;

use tracing::warn;

use crate::classify::classify;
use crate::consolidate::sanitize_name;
use crate::convert::{ConversionCache, ConversionOptions};
use crate::error::{Error, Result};
use crate::models::{DocumentKind, StoredUpload};
use crate::store::TripStore;

pub const ALLOWED_EXTENSIONS: &[&str] = &[
    "pdf", "png", "jpg", "jpeg", "heic", "tiff", "tif", "webp", "bmp", "gif",
];

/// Maximum accepted upload size (10 MB)
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// De-duplicate within a directory by suffixing an incrementing counter
pub fn unique_filename(dir: &Path, stem: &str, extension: &str) -> String {
    let mut candidate = format!("{}.{}", stem, extension);
    let mut counter = 0;
    while dir.join(&candidate).exists() {
        counter += 1;
        candidate = format!("{}_{}.{}", stem, counter, extension);
    }
    candidate
}

/// Ingests uploads into a trip's receipts/ or travel_documents/ directory
pub struct Ingestor {
    cache: ConversionCache,
}

impl Default for Ingestor {
    fn default() -> Self {
        Self::new()
    }
}

impl Ingestor {
    pub fn new() -> Self {
        Self {
            cache: ConversionCache::new(),
        }
    }

    pub fn with_cache(cache: ConversionCache) -> Self {
        Self { cache }
    }

    /// Store one uploaded file. The filename heuristic picks the target
    /// subdirectory unless the caller overrides the kind.
    pub fn ingest(
        &self,
        store: &TripStore,
        trip: &str,
        original_name: &str,
        bytes: &[u8],
        declared_mime: Option<&str>,
        kind_override: Option<DocumentKind>,
    ) -> Result<StoredUpload> {
        let extension = Path::new(original_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(Error::InvalidData(format!(
                "Invalid file type .{}; only PDF and image files are allowed",
                extension
            )));
        }
        if bytes.len() > MAX_UPLOAD_BYTES {
            return Err(Error::InvalidData(
                "File size too large; maximum 10MB allowed".into(),
            ));
        }

        let kind = kind_override.unwrap_or_else(|| classify(original_name).kind);
        let target_dir = match kind {
            DocumentKind::Receipt => store.receipts_dir(trip),
            DocumentKind::TravelDocument => store.travel_docs_dir(trip),
        };
        fs::create_dir_all(&target_dir)?;

        let stem = sanitize_name(
            Path::new(original_name)
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("upload"),
        );

        let file_name = if extension == "pdf" {
            // PDFs are stored as-is
            let file_name = unique_filename(&target_dir, &stem, "pdf");
            fs::write(target_dir.join(&file_name), bytes)?;
            file_name
        } else {
            self.store_as_jpeg(&target_dir, &stem, &extension, bytes)?
        };

        let stored_path = target_dir.join(&file_name);
        let byte_size = fs::metadata(&stored_path)?.len();

        Ok(StoredUpload {
            original_name: original_name.to_string(),
            file_name,
            stored_path,
            byte_size,
            declared_mime: declared_mime.map(String::from),
            detected_extension: extension,
            kind,
        })
    }

    /// Normalize a raster upload to JPEG; keep the original bytes when the
    /// conversion chain fails.
    fn store_as_jpeg(
        &self,
        target_dir: &Path,
        stem: &str,
        extension: &str,
        bytes: &[u8],
    ) -> Result<String> {
        let mut staging = tempfile::Builder::new()
            .suffix(&format!(".{}", extension))
            .tempfile()?;
        staging.write_all(bytes)?;
        staging.flush()?;

        let file_name = unique_filename(target_dir, stem, "jpg");
        let target = target_dir.join(&file_name);

        match self
            .cache
            .convert_to(staging.path(), &target, &ConversionOptions::full_size())
        {
            Ok(()) => Ok(file_name),
            Err(e) => {
                warn!(error = %e, "Ingest conversion failed, storing original bytes");
                let file_name = unique_filename(target_dir, stem, extension);
                fs::write(target_dir.join(&file_name), bytes)?;
                Ok(file_name)
            }
        }
    }
}
