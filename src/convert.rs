//! Conversion entry points.
//!
//! [`Converter`] owns the configuration and the renderer and is cheap to
//! clone (two `Arc`s), so the HTTP layer keeps one in its state and every
//! request works on its own clone. The free functions are conveniences for
//! one-shot callers such as the CLI.
//!
//! ## Artifact ownership
//!
//! [`Converter::convert`] creates two temporary files. The HTML one never
//! outlives the call: it is removed as soon as the renderer exits, and every
//! early return drops its guard. The PDF one is returned to the caller, who
//! owns its deletion from then on. If anything fails before that hand-off the
//! PDF guard is dropped too, so a failed conversion leaves nothing behind.

use crate::config::ConversionConfig;
use crate::error::ConversionError;
use crate::pipeline::artifact::{ArtifactKind, TemporaryArtifact};
use crate::pipeline::pdf::{PdfRenderer, WkhtmltopdfRenderer};
use crate::pipeline::{document, markdown};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::io::AsyncReadExt;
use tracing::{debug, info, warn};

/// Markdown-to-PDF converter with an injectable renderer.
#[derive(Clone)]
pub struct Converter {
    config: Arc<ConversionConfig>,
    renderer: Arc<dyn PdfRenderer>,
}

impl fmt::Debug for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Converter")
            .field("config", &self.config)
            .field("renderer", &"<dyn PdfRenderer>")
            .finish()
    }
}

impl Converter {
    /// Converter backed by wkhtmltopdf at `config.renderer_binary`.
    pub fn new(config: ConversionConfig) -> Self {
        let renderer = Arc::new(WkhtmltopdfRenderer::from_config(&config));
        Self::with_renderer(config, renderer)
    }

    /// Converter backed by a caller-supplied renderer.
    pub fn with_renderer(config: ConversionConfig, renderer: Arc<dyn PdfRenderer>) -> Self {
        Self {
            config: Arc::new(config),
            renderer,
        }
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    /// Render Markdown to the complete HTML document handed to the renderer.
    ///
    /// Runs on the blocking pool: highlighting a long code listing is pure
    /// CPU work.
    pub async fn render_html(&self, markdown_text: &str) -> Result<String, ConversionError> {
        let markdown_text = markdown_text.to_owned();
        let theme = self.config.highlight_theme.clone();

        tokio::task::spawn_blocking(move || -> Result<String, ConversionError> {
            let fragment = markdown::markdown_to_html(&markdown_text)?;
            let css = markdown::highlight_css(&theme)?;
            Ok(document::wrap_document(&fragment, &css))
        })
        .await
        .map_err(|e| ConversionError::Internal(format!("Markdown task panicked: {e}")))?
    }

    /// Convert Markdown to a PDF file on local storage.
    ///
    /// # Returns
    /// The PDF as a [`TemporaryArtifact`]; dropping it deletes the file.
    ///
    /// # Errors
    /// Any failure while rendering HTML, writing the intermediate file,
    /// running the renderer, or validating its output. No temporary file
    /// survives an error.
    pub async fn convert(&self, markdown_text: &str) -> Result<TemporaryArtifact, ConversionError> {
        let total_start = Instant::now();
        info!("Starting conversion: {} bytes of Markdown", markdown_text.len());

        // ── Step 1–2: Markdown → wrapped HTML ────────────────────────────────
        let html = self.render_html(markdown_text).await?;

        // ── Step 3: Persist HTML ─────────────────────────────────────────────
        let temp_dir = self.config.temp_dir.as_deref();
        let html_file = TemporaryArtifact::create(ArtifactKind::Html, temp_dir)?;
        tokio::fs::write(html_file.path(), html.as_bytes())
            .await
            .map_err(|source| ConversionError::HtmlWrite {
                path: html_file.path().to_path_buf(),
                source,
            })?;
        debug!("Wrote {} bytes of HTML to {}", html.len(), html_file.path().display());

        // ── Step 4: Render PDF ───────────────────────────────────────────────
        let pdf_file = TemporaryArtifact::create(ArtifactKind::Pdf, temp_dir)?;
        let render_start = Instant::now();
        self.renderer
            .render(html_file.path(), pdf_file.path())
            .await?;
        let render_duration_ms = render_start.elapsed().as_millis() as u64;
        html_file.remove();

        // ── Step 5: Validate output ──────────────────────────────────────────
        let size = verify_pdf(pdf_file.path()).await?;

        info!(
            "Conversion complete: {} bytes of PDF, render {}ms, {}ms total",
            size,
            render_duration_ms,
            total_start.elapsed().as_millis()
        );

        Ok(pdf_file)
    }

    /// Convert and write the PDF to `output_path`.
    ///
    /// Uses atomic write (temp sibling + rename) to prevent partial files.
    /// Returns the number of bytes written.
    pub async fn convert_to_file(
        &self,
        markdown_text: &str,
        output_path: impl AsRef<Path>,
    ) -> Result<u64, ConversionError> {
        let pdf = self.convert(markdown_text).await?;
        let path = output_path.as_ref();
        let io_err = |source| ConversionError::OutputIo {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }

        // Copy rather than rename: the temp dir may be on another filesystem.
        let tmp_path = path.with_extension("pdf.tmp");
        let written = match tokio::fs::copy(pdf.path(), &tmp_path).await {
            Ok(n) => n,
            Err(e) => {
                discard_partial(&tmp_path).await;
                return Err(io_err(e));
            }
        };
        pdf.remove();

        if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
            discard_partial(&tmp_path).await;
            return Err(io_err(e));
        }

        Ok(written)
    }
}

/// Convert Markdown with wkhtmltopdf using `config`.
pub async fn convert(
    markdown_text: &str,
    config: &ConversionConfig,
) -> Result<TemporaryArtifact, ConversionError> {
    Converter::new(config.clone()).convert(markdown_text).await
}

/// Convert Markdown with wkhtmltopdf and write the PDF to `output_path`.
pub async fn convert_to_file(
    markdown_text: &str,
    output_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<u64, ConversionError> {
    Converter::new(config.clone())
        .convert_to_file(markdown_text, output_path)
        .await
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Check the renderer left a non-empty file starting with `%PDF`.
async fn verify_pdf(path: &Path) -> Result<u64, ConversionError> {
    let io_err = |source| ConversionError::OutputIo {
        path: path.to_path_buf(),
        source,
    };

    let size = tokio::fs::metadata(path).await.map_err(io_err)?.len();
    if size == 0 {
        return Err(ConversionError::EmptyOutput {
            path: path.to_path_buf(),
        });
    }

    let mut magic = [0u8; 4];
    let mut file = tokio::fs::File::open(path).await.map_err(io_err)?;
    let not_a_pdf = |magic| ConversionError::NotAPdf {
        path: path.to_path_buf(),
        magic,
    };
    let read = file.read_exact(&mut magic).await;
    match read {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Err(not_a_pdf(magic)),
        Err(e) => return Err(io_err(e)),
    }
    if &magic != b"%PDF" {
        return Err(not_a_pdf(magic));
    }

    Ok(size)
}

/// Remove a half-written output sibling. Absent is fine.
async fn discard_partial(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!("Removed partial output {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove {}: {}", path.display(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::BoxFuture;
    use std::path::PathBuf;
    use std::sync::Mutex;

    /// Writes fixed bytes and remembers which HTML path it was given.
    struct FixedRenderer {
        bytes: &'static [u8],
        seen_html: Mutex<Option<PathBuf>>,
    }

    impl FixedRenderer {
        fn new(bytes: &'static [u8]) -> Arc<Self> {
            Arc::new(Self {
                bytes,
                seen_html: Mutex::new(None),
            })
        }
    }

    impl PdfRenderer for FixedRenderer {
        fn render<'a>(
            &'a self,
            html: &'a Path,
            pdf: &'a Path,
        ) -> BoxFuture<'a, Result<(), ConversionError>> {
            Box::pin(async move {
                *self.seen_html.lock().unwrap() = Some(html.to_path_buf());
                tokio::fs::write(pdf, self.bytes).await.unwrap();
                Ok(())
            })
        }
    }

    fn config_in(dir: &Path) -> ConversionConfig {
        ConversionConfig::builder().temp_dir(dir).build().unwrap()
    }

    fn entries(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[tokio::test]
    async fn render_html_contains_shell_and_highlighting() {
        let converter = Converter::new(ConversionConfig::default());
        let html = converter
            .render_html("# Title\n\n```rust\nfn main() {}\n```\n")
            .await
            .unwrap();
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains("codehilite"));
        assert!(html.contains(".hl-"));
    }

    #[tokio::test]
    async fn success_keeps_only_the_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = FixedRenderer::new(b"%PDF-1.4\n%fake\n");
        let converter = Converter::with_renderer(config_in(dir.path()), renderer.clone());

        let pdf = converter.convert("# Hello\n\n**bold**").await.unwrap();
        let html_path = renderer.seen_html.lock().unwrap().clone().unwrap();

        assert!(!html_path.exists(), "HTML artifact must be gone");
        assert!(pdf.path().exists());
        assert_eq!(pdf.kind(), ArtifactKind::Pdf);
        assert_eq!(entries(dir.path()), 1);

        drop(pdf);
        assert_eq!(entries(dir.path()), 0);
    }

    #[tokio::test]
    async fn empty_output_is_rejected_and_cleaned_up() {
        let dir = tempfile::tempdir().unwrap();
        let converter = Converter::with_renderer(config_in(dir.path()), FixedRenderer::new(b""));
        let err = converter.convert("text").await.unwrap_err();
        assert!(matches!(err, ConversionError::EmptyOutput { .. }), "got: {err}");
        assert_eq!(entries(dir.path()), 0);
    }

    #[tokio::test]
    async fn non_pdf_output_is_rejected_and_cleaned_up() {
        let dir = tempfile::tempdir().unwrap();
        let converter =
            Converter::with_renderer(config_in(dir.path()), FixedRenderer::new(b"<html>oops"));
        let err = converter.convert("text").await.unwrap_err();
        match err {
            ConversionError::NotAPdf { magic, .. } => assert_eq!(&magic, b"<htm"),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(entries(dir.path()), 0);
    }

    #[tokio::test]
    async fn missing_renderer_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConversionConfig::builder()
            .temp_dir(dir.path())
            .renderer_binary("/definitely/not/a/real/wkhtmltopdf")
            .build()
            .unwrap();
        let err = convert("# Hi", &config).await.unwrap_err();
        assert!(matches!(err, ConversionError::RendererNotFound { .. }), "got: {err}");
        assert_eq!(entries(dir.path()), 0);
    }

    #[tokio::test]
    async fn short_output_is_not_a_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let converter = Converter::with_renderer(config_in(dir.path()), FixedRenderer::new(b"%P"));
        let err = converter.convert("text").await.unwrap_err();
        match err {
            ConversionError::NotAPdf { magic, .. } => assert_eq!(&magic[..2], b"%P"),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(entries(dir.path()), 0);
    }

    #[tokio::test]
    async fn failed_copy_leaves_no_partial_output() {
        let temp = tempfile::tempdir().unwrap();
        let out_dir = tempfile::tempdir().unwrap();
        let out = out_dir.path().join("doc.pdf");
        // A directory where the sibling should go makes the copy fail.
        std::fs::create_dir(out.with_extension("pdf.tmp")).unwrap();
        let converter = Converter::with_renderer(
            config_in(temp.path()),
            FixedRenderer::new(b"%PDF-1.7\nbody\n"),
        );

        let err = converter.convert_to_file("# Doc", &out).await.unwrap_err();

        assert!(matches!(err, ConversionError::OutputIo { .. }), "got: {err}");
        assert!(!out.exists());
        assert_eq!(entries(temp.path()), 0);
    }

    #[tokio::test]
    async fn discard_partial_removes_file_and_ignores_missing() {
        let dir = tempfile::tempdir().unwrap();
        let partial = dir.path().join("doc.pdf.tmp");
        std::fs::write(&partial, b"%PDF-1.7\npartial").unwrap();

        discard_partial(&partial).await;
        assert!(!partial.exists());

        discard_partial(&partial).await;
        assert_eq!(entries(dir.path()), 0);
    }

    #[tokio::test]
    async fn convert_to_file_writes_atomically() {
        let temp = tempfile::tempdir().unwrap();
        let out_dir = tempfile::tempdir().unwrap();
        let out = out_dir.path().join("nested").join("doc.pdf");
        let converter = Converter::with_renderer(
            config_in(temp.path()),
            FixedRenderer::new(b"%PDF-1.7\nbody\n"),
        );

        let written = converter.convert_to_file("# Doc", &out).await.unwrap();

        assert_eq!(written, 14);
        assert_eq!(std::fs::read(&out).unwrap(), b"%PDF-1.7\nbody\n");
        assert!(!out.with_extension("pdf.tmp").exists());
        assert_eq!(entries(temp.path()), 0);
    }
}
