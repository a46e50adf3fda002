use axum::extract::State;
use axum::http::{header, HeaderValue};
use axum::response::{Html, IntoResponse, Response};
use axum::Form;
use serde::Deserialize;
use tracing::{debug, info};

use super::error::ApiError;
use super::AppState;
use crate::error::ConversionError;
use crate::pipeline::artifact::TemporaryArtifact;
use crate::sanitize::{sanitize_filename, DEFAULT_FILENAME};

/// The upload page. The textarea is always empty.
pub const FORM_PAGE: &str = include_str!("form.html");

/// Fields posted by the form.
#[derive(Debug, Deserialize)]
pub struct ConversionRequest {
    #[serde(rename = "markdown", default)]
    pub markdown_text: String,
    #[serde(rename = "filename", default = "default_filename")]
    pub requested_filename: String,
}

fn default_filename() -> String {
    DEFAULT_FILENAME.to_string()
}

/// `GET /`
pub async fn index() -> Html<&'static str> {
    Html(FORM_PAGE)
}

/// `POST /`: convert the submitted Markdown and send the PDF back as a
/// download.
pub async fn submit(
    State(state): State<AppState>,
    Form(req): Form<ConversionRequest>,
) -> Result<Response, ApiError> {
    if req.markdown_text.trim().is_empty() {
        debug!("Empty Markdown submitted; showing the form again");
        return Ok(Html(FORM_PAGE).into_response());
    }

    let pdf = state.converter.convert(&req.markdown_text).await?;
    let filename = sanitize_filename(&req.requested_filename);

    let bytes = read_and_remove(pdf).await?;
    info!("Sending {} ({} bytes)", filename, bytes.len());

    let disposition = HeaderValue::from_str(&content_disposition(&filename))
        .map_err(|e| ApiError::Internal(format!("Invalid download name {filename:?}: {e}")))?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("application/pdf")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

/// Load the finished PDF into memory. The artifact goes away whether or not
/// the read worked.
async fn read_and_remove(pdf: TemporaryArtifact) -> Result<Vec<u8>, ConversionError> {
    let pdf_path = pdf.path().to_path_buf();
    let read = tokio::fs::read(&pdf_path).await;
    pdf.remove();
    read.map_err(|source| ConversionError::OutputIo {
        path: pdf_path,
        source,
    })
}

/// `attachment; filename="<name>"`. Each non-space whitespace character
/// becomes one space so the value stays a single visible-ASCII header line;
/// nothing is trimmed or collapsed.
pub fn content_disposition(filename: &str) -> String {
    let flat: String = filename
        .chars()
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .collect();
    format!("attachment; filename=\"{flat}\"")
}
