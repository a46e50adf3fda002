//! HTML → PDF via an external renderer process.
//!
//! ## Why a trait?
//!
//! The production renderer is wkhtmltopdf, a separate binary that may be
//! missing, slow, or broken on a given host. [`PdfRenderer`] is the seam that
//! lets the converter stay ignorant of how the PDF is produced: tests inject
//! renderers that write canned bytes or fail on purpose, and another engine
//! can be slotted in without touching the artifact lifecycle.
//!
//! ## Why tokio::process?
//!
//! A render takes anywhere from 200 ms to several seconds. Spawning with
//! `tokio::process` and awaiting the exit keeps the runtime's worker threads
//! free for other requests while the renderer runs. `kill_on_drop` means the
//! timeout only has to drop the wait future for the child to be killed.

use crate::config::{ConversionConfig, PdfOptions};
use crate::error::ConversionError;
use futures::future::BoxFuture;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

/// Something that turns an HTML file into a PDF file.
pub trait PdfRenderer: Send + Sync {
    /// Render the document at `html` into `pdf`, overwriting it.
    fn render<'a>(
        &'a self,
        html: &'a Path,
        pdf: &'a Path,
    ) -> BoxFuture<'a, Result<(), ConversionError>>;
}

/// Renders through the wkhtmltopdf command-line tool.
#[derive(Debug, Clone)]
pub struct WkhtmltopdfRenderer {
    binary: PathBuf,
    options: PdfOptions,
    timeout: Duration,
}

impl WkhtmltopdfRenderer {
    pub fn new(binary: impl Into<PathBuf>, options: PdfOptions, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            options,
            timeout,
        }
    }

    pub fn from_config(config: &ConversionConfig) -> Self {
        Self::new(
            config.renderer_binary.clone(),
            config.pdf.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Full argument list: options first, then input and output paths.
    pub fn args(&self, html: &Path, pdf: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = self
            .options
            .to_args()
            .into_iter()
            .map(OsString::from)
            .collect();
        args.push(html.as_os_str().to_owned());
        args.push(pdf.as_os_str().to_owned());
        args
    }

    async fn run(&self, html: &Path, pdf: &Path) -> Result<(), ConversionError> {
        let args = self.args(html, pdf);
        debug!("Invoking {} {:?}", self.binary.display(), args);

        let child = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| {
                if source.kind() == std::io::ErrorKind::NotFound {
                    ConversionError::RendererNotFound {
                        binary: self.binary.clone(),
                    }
                } else {
                    ConversionError::RendererSpawn {
                        binary: self.binary.clone(),
                        source,
                    }
                }
            })?;

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result
                .map_err(|e| ConversionError::Internal(format!("Waiting for PDF renderer: {e}")))?,
            Err(_) => {
                // Dropping the wait future killed the child.
                warn!(
                    "PDF renderer exceeded {}s on {}; killed",
                    self.timeout.as_secs(),
                    html.display()
                );
                return Err(ConversionError::RendererTimeout {
                    secs: self.timeout.as_secs(),
                });
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(ConversionError::RendererFailed {
                status: output.status.to_string(),
                stderr: if stderr.is_empty() {
                    "(no output)".to_string()
                } else {
                    stderr
                },
            });
        }

        Ok(())
    }
}

impl PdfRenderer for WkhtmltopdfRenderer {
    fn render<'a>(
        &'a self,
        html: &'a Path,
        pdf: &'a Path,
    ) -> BoxFuture<'a, Result<(), ConversionError>> {
        Box::pin(self.run(html, pdf))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_end_with_input_then_output() {
        let r = WkhtmltopdfRenderer::from_config(&ConversionConfig::default());
        let args = r.args(Path::new("/tmp/in.html"), Path::new("/tmp/out.pdf"));
        let n = args.len();
        assert_eq!(args[n - 2], OsString::from("/tmp/in.html"));
        assert_eq!(args[n - 1], OsString::from("/tmp/out.pdf"));
        assert_eq!(args[0], OsString::from("--encoding"));
        assert!(args.contains(&OsString::from("--quiet")));
    }

    #[test]
    fn from_config_copies_timeout_and_binary() {
        let config = ConversionConfig::builder()
            .renderer_binary("/opt/wk/wkhtmltopdf")
            .timeout_secs(7)
            .build()
            .unwrap();
        let r = WkhtmltopdfRenderer::from_config(&config);
        assert_eq!(r.binary(), Path::new("/opt/wk/wkhtmltopdf"));
        assert_eq!(r.timeout, Duration::from_secs(7));
    }

    #[tokio::test]
    async fn missing_binary_is_renderer_not_found() {
        let r = WkhtmltopdfRenderer::new(
            "/definitely/not/a/real/wkhtmltopdf",
            PdfOptions::default(),
            Duration::from_secs(5),
        );
        let err = r
            .render(Path::new("/tmp/in.html"), Path::new("/tmp/out.pdf"))
            .await
            .unwrap_err();
        assert!(
            matches!(err, ConversionError::RendererNotFound { .. }),
            "got: {err}"
        );
    }
}
