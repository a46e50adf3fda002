//! Pipeline stages for Markdown-to-PDF conversion.
//!
//! Each submodule implements exactly one step, so each is testable on its
//! own and the renderer can be swapped without touching the others.
//!
//! ## Data Flow
//!
//! ```text
//! markdown ──▶ document ──▶ artifact ──▶ pdf ──▶ artifact
//! (fragment)   (shell+CSS)  (.html tmp)  (wkhtmltopdf) (.pdf tmp)
//! ```
//!
//! 1. [`markdown`] pulldown-cmark with tables, syntect for code blocks;
//!    CPU-bound, so the converter runs it in `spawn_blocking`
//! 2. [`document`] wrap the fragment in the print stylesheet
//! 3. [`artifact`] uniquely named temp files deleted on drop
//! 4. [`pdf`]      the [`pdf::PdfRenderer`] seam and the wkhtmltopdf
//!    process driver; the only stage that leaves the process

pub mod artifact;
pub mod document;
pub mod markdown;
pub mod pdf;
