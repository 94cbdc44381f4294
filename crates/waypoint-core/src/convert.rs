//! Image/PDF-to-JPEG conversion with a timestamp-validated cache
//!
//! Regeneration runs through an ordered chain of conversion backends,
//! stopping at the first success:
//!
//! 1. [`ImageBackend`] — in-process decode/downscale/re-encode via the
//!    `image` crate (raster formats).
//! 2. [`PdftoppmBackend`] — external `pdftoppm` rasterizer (PDFs), with the
//!    same bounded downscale as a post-step.
//! 3. Total failure degrades to a synthetic placeholder; a thumbnail request
//!    never fails outright.
//!
//! Cache validity is purely mtime-based: a cached artifact is valid iff its
//! modification time is at or after the source's. Writes are atomic from the
//! caller's perspective (rendered to a temp file, persisted into place).

use std::fs;
use std::io::BufWriter;
use std::path::Path;
use std::process::Command;
use std::time::SystemTime;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, Rgb, RgbImage};
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Bounds and encoding quality for one conversion
#[derive(Debug, Clone, Copy)]
pub struct ConversionOptions {
    pub max_width: u32,
    pub max_height: u32,
    pub quality: u8,
}

impl ConversionOptions {
    /// Inline display thumbnails
    pub fn thumbnail() -> Self {
        Self {
            max_width: 300,
            max_height: 200,
            quality: 85,
        }
    }

    /// Full-size conversion (ingest normalization, converted/ cache)
    pub fn full_size() -> Self {
        Self {
            max_width: 2048,
            max_height: 2048,
            quality: 85,
        }
    }
}

/// One concrete method of rasterizing a source file to JPEG
pub trait ConversionBackend: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether this backend should be attempted for the given source
    fn supports(&self, source: &Path) -> bool;

    /// Write a JPEG rendition of `source` to `dest`
    fn convert(&self, source: &Path, dest: &Path, opts: &ConversionOptions) -> Result<()>;
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default()
}

/// Downscale to fit the bounds, preserving aspect ratio. Never upscales.
fn bounded_resize(img: DynamicImage, opts: &ConversionOptions) -> DynamicImage {
    let (width, height) = img.dimensions();
    if width <= opts.max_width && height <= opts.max_height {
        return img;
    }
    img.resize(opts.max_width, opts.max_height, FilterType::Lanczos3)
}

fn write_jpeg(img: &DynamicImage, dest: &Path, quality: u8) -> Result<()> {
    let rgb = img.to_rgb8();
    let file = fs::File::create(dest)?;
    let mut writer = BufWriter::new(file);
    let encoder = JpegEncoder::new_with_quality(&mut writer, quality);
    rgb.write_with_encoder(encoder)
        .map_err(|e| Error::Conversion(format!("JPEG encode failed: {}", e)))?;
    Ok(())
}

/// In-process raster conversion via the `image` crate
pub struct ImageBackend;

impl ConversionBackend for ImageBackend {
    fn name(&self) -> &'static str {
        "image"
    }

    fn supports(&self, source: &Path) -> bool {
        // The image crate reads the first frame of every raster format we
        // accept; PDFs go to the rasterizer backend.
        extension_of(source) != "pdf"
    }

    fn convert(&self, source: &Path, dest: &Path, opts: &ConversionOptions) -> Result<()> {
        let img = image::open(source)
            .map_err(|e| Error::Conversion(format!("decode failed: {}", e)))?;
        let img = bounded_resize(img, opts);
        write_jpeg(&img, dest, opts.quality)
    }
}

/// External `pdftoppm` rasterizer for PDFs (first page only)
pub struct PdftoppmBackend;

impl ConversionBackend for PdftoppmBackend {
    fn name(&self) -> &'static str {
        "pdftoppm"
    }

    fn supports(&self, source: &Path) -> bool {
        extension_of(source) == "pdf"
    }

    fn convert(&self, source: &Path, dest: &Path, opts: &ConversionOptions) -> Result<()> {
        let work_dir = tempfile::tempdir()?;
        let out_prefix = work_dir.path().join("page");

        let status = Command::new("pdftoppm")
            .args(["-jpeg", "-r", "150", "-f", "1", "-singlefile"])
            .arg(source)
            .arg(&out_prefix)
            .output()
            .map_err(|e| Error::Conversion(format!("pdftoppm failed to run: {}", e)))?;

        if !status.status.success() {
            return Err(Error::Conversion(format!(
                "pdftoppm exited with {}",
                status.status
            )));
        }

        let rendered = out_prefix.with_extension("jpg");
        if !rendered.is_file() {
            return Err(Error::Conversion("pdftoppm produced no output".into()));
        }

        // Post-process: bounded downscale + re-encode. Fall back to the raw
        // render when it cannot be decoded.
        match image::open(&rendered) {
            Ok(img) => write_jpeg(&bounded_resize(img, opts), dest, opts.quality),
            Err(_) => {
                fs::copy(&rendered, dest)?;
                Ok(())
            }
        }
    }
}

// 5x7 bitmap glyphs for the placeholder label (uppercase letters only;
// unknown characters render as blank columns).
const GLYPHS: &[(char, [u8; 7])] = &[
    ('A', [0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001]),
    ('B', [0b11110, 0b10001, 0b10001, 0b11110, 0b10001, 0b10001, 0b11110]),
    ('C', [0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110]),
    ('D', [0b11110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b11110]),
    ('E', [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b11111]),
    ('F', [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000]),
    ('G', [0b01110, 0b10001, 0b10000, 0b10111, 0b10001, 0b10001, 0b01110]),
    ('H', [0b10001, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001]),
    ('I', [0b01110, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110]),
    ('J', [0b00111, 0b00010, 0b00010, 0b00010, 0b00010, 0b10010, 0b01100]),
    ('L', [0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b11111]),
    ('M', [0b10001, 0b11011, 0b10101, 0b10101, 0b10001, 0b10001, 0b10001]),
    ('N', [0b10001, 0b11001, 0b10101, 0b10011, 0b10001, 0b10001, 0b10001]),
    ('O', [0b01110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110]),
    ('P', [0b11110, 0b10001, 0b10001, 0b11110, 0b10000, 0b10000, 0b10000]),
    ('R', [0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001]),
    ('S', [0b01111, 0b10000, 0b10000, 0b01110, 0b00001, 0b00001, 0b11110]),
    ('T', [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100]),
    ('U', [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110]),
    ('V', [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01010, 0b00100]),
    ('W', [0b10001, 0b10001, 0b10001, 0b10101, 0b10101, 0b10101, 0b01010]),
];

const PLACEHOLDER_WIDTH: u32 = 300;
const PLACEHOLDER_HEIGHT: u32 = 200;
const GLYPH_SCALE: u32 = 3;

/// Synthetic stand-in when every backend fails: neutral background, border,
/// centered label (typically the uppercased extension).
pub fn placeholder_jpeg(label: &str) -> Vec<u8> {
    let background = Rgb([248u8, 249, 250]);
    let border = Rgb([222u8, 226, 230]);
    let ink = Rgb([108u8, 117, 125]);

    let mut img = RgbImage::from_pixel(PLACEHOLDER_WIDTH, PLACEHOLDER_HEIGHT, background);

    for x in 0..PLACEHOLDER_WIDTH {
        img.put_pixel(x, 0, border);
        img.put_pixel(x, PLACEHOLDER_HEIGHT - 1, border);
    }
    for y in 0..PLACEHOLDER_HEIGHT {
        img.put_pixel(0, y, border);
        img.put_pixel(PLACEHOLDER_WIDTH - 1, y, border);
    }

    let glyph_width = 6 * GLYPH_SCALE; // 5 columns + 1 gap
    let label: Vec<char> = label.chars().take(12).collect();
    let text_width = glyph_width * label.len() as u32;
    let x0 = PLACEHOLDER_WIDTH.saturating_sub(text_width) / 2;
    let y0 = PLACEHOLDER_HEIGHT.saturating_sub(7 * GLYPH_SCALE) / 2;

    for (i, c) in label.iter().enumerate() {
        if let Some((_, rows)) = GLYPHS.iter().find(|(g, _)| g == c) {
            let gx = x0 + glyph_width * i as u32;
            for (row, bits) in rows.iter().enumerate() {
                for col in 0..5u32 {
                    if bits & (1 << (4 - col)) != 0 {
                        for dy in 0..GLYPH_SCALE {
                            for dx in 0..GLYPH_SCALE {
                                let px = gx + col * GLYPH_SCALE + dx;
                                let py = y0 + row as u32 * GLYPH_SCALE + dy;
                                if px < PLACEHOLDER_WIDTH && py < PLACEHOLDER_HEIGHT {
                                    img.put_pixel(px, py, ink);
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    let mut bytes = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut bytes, 85);
    // Encoding an in-memory RGB buffer cannot fail for these dimensions
    let _ = img.write_with_encoder(encoder);
    bytes
}

/// Timestamp-validated conversion cache over an ordered backend chain
pub struct ConversionCache {
    backends: Vec<Box<dyn ConversionBackend>>,
}

impl Default for ConversionCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversionCache {
    /// Default chain: in-process image crate, then pdftoppm
    pub fn new() -> Self {
        Self {
            backends: vec![Box::new(ImageBackend), Box::new(PdftoppmBackend)],
        }
    }

    /// Custom chain, for tests and alternate deployments
    pub fn with_backends(backends: Vec<Box<dyn ConversionBackend>>) -> Self {
        Self { backends }
    }

    /// Serve the cached JPEG for `source`, regenerating when stale. Never
    /// fails for a readable source: total backend failure degrades to a
    /// placeholder (which is not cached, so a later backend install
    /// recovers without manual invalidation).
    pub fn get_display_artifact(
        &self,
        source: &Path,
        cache_path: &Path,
        opts: &ConversionOptions,
    ) -> Result<Vec<u8>> {
        let source_mtime = mtime(source)
            .map_err(|_| Error::NotFound(format!("source file {}", source.display())))?;

        if let Ok(cache_mtime) = mtime(cache_path) {
            if cache_mtime >= source_mtime {
                debug!(cache = %cache_path.display(), "Serving cached conversion");
                return Ok(fs::read(cache_path)?);
            }
        }

        if let Some(parent) = cache_path.parent() {
            fs::create_dir_all(parent)?;
        }

        match self.run_chain(source, cache_path, opts) {
            Ok(()) => Ok(fs::read(cache_path)?),
            Err(e) => {
                warn!(source = %source.display(), error = %e,
                    "All conversion backends failed, serving placeholder");
                let label = extension_of(source).to_uppercase();
                let label = if label.is_empty() { "FILE".to_string() } else { label };
                Ok(placeholder_jpeg(&label))
            }
        }
    }

    /// Convert without cache semantics (ingest normalization). Errors when
    /// every applicable backend fails.
    pub fn convert_to(
        &self,
        source: &Path,
        dest: &Path,
        opts: &ConversionOptions,
    ) -> Result<()> {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        self.run_chain(source, dest, opts)
    }

    fn run_chain(&self, source: &Path, dest: &Path, opts: &ConversionOptions) -> Result<()> {
        let dir = dest
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| std::env::temp_dir());

        let mut last_error =
            Error::Conversion(format!("no backend supports {}", source.display()));

        for backend in &self.backends {
            if !backend.supports(source) {
                continue;
            }

            // Render next to the destination so the final persist is an
            // atomic rename; no partial file is ever served.
            let staging = tempfile::NamedTempFile::new_in(&dir)?;
            match backend.convert(source, staging.path(), opts) {
                Ok(()) => {
                    staging
                        .persist(dest)
                        .map_err(|e| Error::Conversion(format!("persist failed: {}", e)))?;
                    debug!(backend = backend.name(), dest = %dest.display(), "Converted");
                    return Ok(());
                }
                Err(e) => {
                    warn!(backend = backend.name(), source = %source.display(),
                        error = %e, "Conversion backend failed, trying next");
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }
}

fn mtime(path: &Path) -> std::io::Result<SystemTime> {
    fs::metadata(path)?.modified()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    /// Backend that counts invocations and writes a fixed payload
    struct CountingBackend {
        calls: Arc<AtomicUsize>,
        succeed: bool,
    }

    impl ConversionBackend for CountingBackend {
        fn name(&self) -> &'static str {
            "counting"
        }
        fn supports(&self, _source: &Path) -> bool {
            true
        }
        fn convert(&self, _source: &Path, dest: &Path, _opts: &ConversionOptions) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.succeed {
                fs::write(dest, b"converted-jpeg")?;
                Ok(())
            } else {
                Err(Error::Conversion("scripted failure".into()))
            }
        }
    }

    fn counting_cache(succeed: bool) -> (ConversionCache, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = ConversionCache::with_backends(vec![Box::new(CountingBackend {
            calls: calls.clone(),
            succeed,
        })]);
        (cache, calls)
    }

    fn set_mtime(path: &Path, when: SystemTime) {
        let file = fs::File::options().write(true).open(path).unwrap();
        file.set_modified(when).unwrap();
    }

    #[test]
    fn test_fresh_cache_skips_backends() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("receipt.jpg");
        let cached = dir.path().join("thumbnails/receipt.jpg");
        fs::write(&source, b"source").unwrap();
        fs::create_dir_all(cached.parent().unwrap()).unwrap();
        fs::write(&cached, b"cached-bytes").unwrap();

        // Cache strictly newer than source
        let now = SystemTime::now();
        set_mtime(&source, now - Duration::from_secs(60));
        set_mtime(&cached, now);

        let (cache, calls) = counting_cache(true);
        let bytes = cache
            .get_display_artifact(&source, &cached, &ConversionOptions::thumbnail())
            .unwrap();
        assert_eq!(bytes, b"cached-bytes");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_stale_cache_regenerates() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("receipt.jpg");
        let cached = dir.path().join("thumbnails/receipt.jpg");
        fs::write(&source, b"source").unwrap();
        fs::create_dir_all(cached.parent().unwrap()).unwrap();
        fs::write(&cached, b"old-bytes").unwrap();

        // Source touched after the cache was written
        let now = SystemTime::now();
        set_mtime(&cached, now - Duration::from_secs(60));
        set_mtime(&source, now);

        let (cache, calls) = counting_cache(true);
        let bytes = cache
            .get_display_artifact(&source, &cached, &ConversionOptions::thumbnail())
            .unwrap();
        assert_eq!(bytes, b"converted-jpeg");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(fs::read(&cached).unwrap(), b"converted-jpeg");
    }

    #[test]
    fn test_missing_cache_generates_once_then_serves() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("receipt.jpg");
        let cached = dir.path().join("thumbnails/receipt.jpg");
        fs::write(&source, b"source").unwrap();

        let (cache, calls) = counting_cache(true);
        let opts = ConversionOptions::thumbnail();
        cache.get_display_artifact(&source, &cached, &opts).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // Second request hits the cache
        cache.get_display_artifact(&source, &cached, &opts).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_total_failure_serves_placeholder_uncached() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("scan.pdf");
        let cached = dir.path().join("thumbnails/scan.jpg");
        fs::write(&source, b"not a real pdf").unwrap();

        let (cache, _) = counting_cache(false);
        let bytes = cache
            .get_display_artifact(&source, &cached, &ConversionOptions::thumbnail())
            .unwrap();

        // JPEG magic bytes, and nothing cached
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        assert!(!cached.exists());
    }

    #[test]
    fn test_missing_source_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let (cache, _) = counting_cache(true);
        let err = cache
            .get_display_artifact(
                &dir.path().join("nope.jpg"),
                &dir.path().join("thumb.jpg"),
                &ConversionOptions::thumbnail(),
            )
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_image_backend_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("big.png");
        let dest = dir.path().join("out.jpg");

        // 800x600 solid image, bounded to 300x200
        let img = RgbImage::from_pixel(800, 600, Rgb([10, 20, 30]));
        img.save(&source).unwrap();

        ImageBackend
            .convert(&source, &dest, &ConversionOptions::thumbnail())
            .unwrap();

        let out = image::open(&dest).unwrap();
        let (w, h) = out.dimensions();
        assert!(w <= 300 && h <= 200);
        // Aspect ratio preserved (4:3 within 300x200 bounds -> 266x200)
        assert_eq!(h, 200);
    }

    #[test]
    fn test_image_backend_never_upscales() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("small.png");
        let dest = dir.path().join("out.jpg");

        let img = RgbImage::from_pixel(100, 80, Rgb([200, 200, 200]));
        img.save(&source).unwrap();

        ImageBackend
            .convert(&source, &dest, &ConversionOptions::thumbnail())
            .unwrap();

        let out = image::open(&dest).unwrap();
        assert_eq!(out.dimensions(), (100, 80));
    }

    #[test]
    fn test_placeholder_is_valid_jpeg() {
        let bytes = placeholder_jpeg("PDF");
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        let img = image::load_from_memory(&bytes).unwrap();
        assert_eq!(img.dimensions(), (300, 200));
    }

    #[test]
    fn test_backend_support_split() {
        assert!(ImageBackend.supports(Path::new("a.jpg")));
        assert!(!ImageBackend.supports(Path::new("a.pdf")));
        assert!(PdftoppmBackend.supports(Path::new("a.pdf")));
        assert!(!PdftoppmBackend.supports(Path::new("a.jpg")));
    }
}
