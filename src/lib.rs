//! # md2pdf
//!
//! Turn Markdown into a downloadable PDF, from a web form, the command line,
//! or your own code.
//!
//! ## Why this crate?
//!
//! Browsers print HTML, not Markdown, and "paste it into a word processor"
//! loses code highlighting and tables. This crate renders Markdown to a
//! print-styled HTML page and hands it to wkhtmltopdf, keeping the
//! intermediate files on a short leash: nothing written during a
//! conversion outlives the request that caused it.
//!
//! ## Pipeline Overview
//!
//! ```text
//! Markdown
//!  │
//!  ├─ 1. Markdown  pulldown-cmark + syntect (CPU-bound, spawn_blocking)
//!  ├─ 2. Document  wrap in print CSS + highlight theme
//!  ├─ 3. Artifact  write md2pdf-*.html to the temp dir
//!  ├─ 4. Render    wkhtmltopdf → md2pdf-*.pdf (timeout, killed on expiry)
//!  ├─ 5. Verify    non-empty, starts with %PDF
//!  └─ 6. Hand-off  PDF artifact to the caller; HTML already deleted
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use md2pdf::{convert, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::default();
//!     let pdf = convert("# Hello\n\nThis is **bold**.", &config).await?;
//!     std::fs::copy(pdf.path(), "hello.pdf")?;
//!     // `pdf` is deleted from the temp dir when it goes out of scope.
//!     Ok(())
//! }
//! ```
//!
//! Serving the form:
//!
//! ```rust,no_run
//! use md2pdf::{serve, ConversionConfig, Converter, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     let server = ServerConfig::default();
//!     let listener = tokio::net::TcpListener::bind(server.bind).await?;
//!     serve(listener, Converter::new(ConversionConfig::default()), &server).await
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `md2pdf` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! md2pdf = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod pipeline;
pub mod sanitize;
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder, PdfOptions, ServerConfig};
pub use convert::{convert, convert_to_file, Converter};
pub use error::ConversionError;
pub use pipeline::artifact::{ArtifactKind, TemporaryArtifact};
pub use pipeline::pdf::{PdfRenderer, WkhtmltopdfRenderer};
pub use sanitize::sanitize_filename;
pub use server::{router, serve};
