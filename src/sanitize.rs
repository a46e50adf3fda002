//! Download filename sanitising.
//!
//! The name a user types into the form ends up in a `Content-Disposition`
//! header and, on their machine, on disk. [`sanitize_filename`] reduces it to
//! a conservative character set and guarantees a `.pdf` extension. It is a
//! total function: every input yields a usable name.
//!
//! ## Rule Order
//!
//! The extension check runs on the raw input, before stripping, so that
//! `"report.pdf!"` gains a second extension (`report.pdf.pdf`) rather than
//! being accepted because stripping happened to expose `.pdf`.

use once_cell::sync::Lazy;
use regex::Regex;

/// Name used when nothing usable survives sanitising.
pub const DEFAULT_FILENAME: &str = "document.pdf";

const PDF_EXTENSION: &str = ".pdf";

/// Everything outside ASCII letters, digits, `-`, `_`, whitespace and `.`.
static RE_DISALLOWED: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9\-_\s.]").unwrap());

/// Clean a user-supplied download name.
///
/// 1. Append `.pdf` unless the raw name already ends with it (any case)
/// 2. Drop every character not in `[A-Za-z0-9-_.]` or whitespace
/// 3. Fall back to [`DEFAULT_FILENAME`] if the result is empty or just `.pdf`
pub fn sanitize_filename(raw: &str) -> String {
    let with_extension = ensure_pdf_extension(raw);
    let cleaned = RE_DISALLOWED.replace_all(&with_extension, "");

    if cleaned.is_empty() || cleaned == PDF_EXTENSION {
        DEFAULT_FILENAME.to_string()
    } else {
        cleaned.into_owned()
    }
}

fn ensure_pdf_extension(raw: &str) -> String {
    if raw.to_lowercase().ends_with(PDF_EXTENSION) {
        raw.to_string()
    } else {
        format!("{raw}{PDF_EXTENSION}")
    }
}
