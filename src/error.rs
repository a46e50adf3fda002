//! Error types for the md2pdf library.
//!
//! Every failure of the conversion pipeline is a [`ConversionError`]. The HTTP
//! layer turns it into a `500` whose body carries the message, so each variant
//! is worded for the person who submitted the form as much as for the
//! operator reading the log.
//!
//! Failing to delete a temporary file is not represented
//! here: cleanup is best-effort, logged at `warn` level by
//! [`crate::pipeline::artifact`], and never changes the outcome of a request.

use std::path::PathBuf;
use thiserror::Error;

use crate::pipeline::artifact::ArtifactKind;

/// All errors returned by the md2pdf conversion pipeline.
#[derive(Debug, Error)]
pub enum ConversionError {
    // ── Temporary files ───────────────────────────────────────────────────
    /// Could not create a uniquely named temporary file.
    #[error("Failed to create temporary {kind} file: {source}")]
    TempFile {
        kind: ArtifactKind,
        #[source]
        source: std::io::Error,
    },

    /// Could not write the intermediate HTML document.
    #[error("Failed to write intermediate HTML to '{path}': {source}")]
    HtmlWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Markdown ──────────────────────────────────────────────────────────
    /// Markdown or syntax-highlighting failed.
    #[error("Markdown rendering failed: {0}")]
    Markdown(String),

    // ── Renderer ──────────────────────────────────────────────────────────
    /// The renderer binary does not exist or is not executable.
    #[error(
        "PDF renderer '{binary}' not found.\n\
Install wkhtmltopdf or point --renderer / WKHTMLTOPDF_PATH at it."
    )]
    RendererNotFound { binary: PathBuf },

    /// The renderer binary exists but could not be started.
    #[error("Failed to start PDF renderer '{binary}': {source}")]
    RendererSpawn {
        binary: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The renderer ran and reported failure.
    #[error("PDF renderer exited with {status}: {stderr}")]
    RendererFailed { status: String, stderr: String },

    /// The renderer did not finish in time and was killed.
    #[error("PDF renderer timed out after {secs}s")]
    RendererTimeout { secs: u64 },

    // ── Output ────────────────────────────────────────────────────────────
    /// The renderer succeeded but wrote nothing.
    #[error("PDF renderer produced an empty file at '{path}'")]
    EmptyOutput { path: PathBuf },

    /// The renderer wrote something that is not a PDF.
    #[error("PDF renderer output is not a PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// Could not read or move the finished PDF.
    #[error("Failed to access PDF output '{path}': {source}")]
    OutputIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renderer_failed_display_carries_stderr() {
        let e = ConversionError::RendererFailed {
            status: "exit status: 1".into(),
            stderr: "Exit with code 1 due to network error: ContentNotFoundError".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("exit status: 1"), "got: {msg}");
        assert!(msg.contains("ContentNotFoundError"), "got: {msg}");
    }

    #[test]
    fn renderer_not_found_mentions_override() {
        let e = ConversionError::RendererNotFound {
            binary: PathBuf::from("/opt/wk/bin/wkhtmltopdf"),
        };
        let msg = e.to_string();
        assert!(msg.contains("/opt/wk/bin/wkhtmltopdf"));
        assert!(msg.contains("WKHTMLTOPDF_PATH"));
    }

    #[test]
    fn timeout_display() {
        let e = ConversionError::RendererTimeout { secs: 30 };
        assert!(e.to_string().contains("30s"));
    }

    #[test]
    fn temp_file_display_names_kind() {
        let e = ConversionError::TempFile {
            kind: ArtifactKind::Html,
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let msg = e.to_string();
        assert!(msg.contains("HTML"), "got: {msg}");
        assert!(msg.contains("denied"), "got: {msg}");
    }
}
