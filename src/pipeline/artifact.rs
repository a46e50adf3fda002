//! Temporary conversion artifacts.
//!
//! Every conversion produces two files on local storage: the wrapped HTML
//! handed to the renderer and the PDF it writes back. Both are uniquely named
//! via [`tempfile`] so concurrent requests never share a path, and both are
//! owned by a [`TemporaryArtifact`] that deletes the file when it goes out of
//! scope. That makes "delete on every exit path" a property of ownership:
//! an early `?` return, a panic, or the HTTP handler finishing its response all
//! end with the guard being dropped.
//!
//! Deletion happens exactly once. [`TemporaryArtifact::remove`] consumes the
//! guard; `Drop` only acts if `remove` was never called. A failed deletion is
//! logged and otherwise ignored.

use crate::error::ConversionError;
use std::fmt;
use std::path::Path;
use tempfile::TempPath;
use tracing::{debug, warn};

/// Which pipeline stage produced the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Html,
    Pdf,
}

impl ArtifactKind {
    fn suffix(self) -> &'static str {
        match self {
            ArtifactKind::Html => ".html",
            ArtifactKind::Pdf => ".pdf",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKind::Html => f.write_str("HTML"),
            ArtifactKind::Pdf => f.write_str("PDF"),
        }
    }
}

/// A uniquely named temporary file that is deleted when dropped.
#[derive(Debug)]
pub struct TemporaryArtifact {
    path: Option<TempPath>,
    kind: ArtifactKind,
}

impl TemporaryArtifact {
    /// Create an empty, uniquely named file in `dir` (or the system temp dir).
    ///
    /// The file handle is closed straight away; only the path is kept, so an
    /// external process can open the file on every platform.
    pub fn create(kind: ArtifactKind, dir: Option<&Path>) -> Result<Self, ConversionError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("md2pdf-").suffix(kind.suffix());

        let file = match dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(|source| ConversionError::TempFile { kind, source })?;

        let path = file.into_temp_path();
        debug!("Created {} artifact {}", kind, path.display());

        Ok(Self {
            path: Some(path),
            kind,
        })
    }

    /// Location of the file on disk.
    pub fn path(&self) -> &Path {
        // Only `None` once released, which consumes or drops the guard.
        self.path.as_deref().unwrap_or_else(|| Path::new(""))
    }

    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    /// Delete the file now instead of waiting for the guard to drop.
    pub fn remove(mut self) {
        self.release();
    }

    fn release(&mut self) {
        let Some(path) = self.path.take() else {
            return;
        };
        let shown = path.to_path_buf();
        match path.close() {
            Ok(()) => debug!("Removed {} artifact {}", self.kind, shown.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("{} artifact {} already gone", self.kind, shown.display())
            }
            Err(e) => warn!(
                "Failed to remove {} artifact {}: {}",
                self.kind,
                shown.display(),
                e
            ),
        }
    }
}

impl Drop for TemporaryArtifact {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_uses_kind_suffix_and_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let html = TemporaryArtifact::create(ArtifactKind::Html, Some(dir.path())).unwrap();
        let pdf = TemporaryArtifact::create(ArtifactKind::Pdf, Some(dir.path())).unwrap();

        let html_name = html.path().file_name().unwrap().to_string_lossy().to_string();
        let pdf_name = pdf.path().file_name().unwrap().to_string_lossy().to_string();
        assert!(html_name.starts_with("md2pdf-") && html_name.ends_with(".html"));
        assert!(pdf_name.starts_with("md2pdf-") && pdf_name.ends_with(".pdf"));
        assert!(html.path().starts_with(dir.path()));
    }

    #[test]
    fn names_are_unique() {
        let dir = tempfile::tempdir().unwrap();
        let a = TemporaryArtifact::create(ArtifactKind::Pdf, Some(dir.path())).unwrap();
        let b = TemporaryArtifact::create(ArtifactKind::Pdf, Some(dir.path())).unwrap();
        assert_ne!(a.path(), b.path());
    }

    #[test]
    fn drop_deletes_file() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = TemporaryArtifact::create(ArtifactKind::Html, Some(dir.path())).unwrap();
        let path = artifact.path().to_path_buf();
        assert!(path.exists());
        drop(artifact);
        assert!(!path.exists());
    }

    #[test]
    fn remove_deletes_file() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = TemporaryArtifact::create(ArtifactKind::Pdf, Some(dir.path())).unwrap();
        let path = artifact.path().to_path_buf();
        artifact.remove();
        assert!(!path.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn already_deleted_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = TemporaryArtifact::create(ArtifactKind::Pdf, Some(dir.path())).unwrap();
        std::fs::remove_file(artifact.path()).unwrap();
        artifact.remove();
    }

    #[test]
    fn release_logs_each_outcome_at_debug() {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            let dir = tempfile::tempdir().unwrap();
            let kept = TemporaryArtifact::create(ArtifactKind::Html, Some(dir.path())).unwrap();
            let gone = TemporaryArtifact::create(ArtifactKind::Pdf, Some(dir.path())).unwrap();
            std::fs::remove_file(gone.path()).unwrap();

            kept.remove();
            drop(gone);
            assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
        });
    }

    #[test]
    fn missing_directory_is_a_temp_file_error() {
        let err = TemporaryArtifact::create(
            ArtifactKind::Html,
            Some(Path::new("/definitely/not/a/real/dir")),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConversionError::TempFile {
                kind: ArtifactKind::Html,
                ..
            }
        ));
    }
}
