//! HTTP front end: one page, one form.
//!
//! ```text
//! GET  /  → form page
//! POST /  → empty markdown ─▶ form page again
//!         → convert ─▶ sanitize filename ─▶ PDF attachment
//!                   └▶ 500 "Error converting PDF: …"
//! ```
//!
//! Requests share nothing but the [`Converter`], which is read-only; each
//! conversion gets its own uniquely named temporary files.

mod error;
mod routes;

pub use error::ApiError;
pub use routes::{content_disposition, ConversionRequest, FORM_PAGE};

use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::convert::Converter;

/// State injected into every handler.
#[derive(Clone, Debug)]
pub struct AppState {
    pub converter: Converter,
}

/// Build the application router.
pub fn router(converter: Converter, config: &ServerConfig) -> Router {
    Router::new()
        .route("/", get(routes::index).post(routes::submit))
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { converter })
}

/// Serve on an already bound listener until Ctrl-C.
pub async fn serve(
    listener: TcpListener,
    converter: Converter,
    config: &ServerConfig,
) -> std::io::Result<()> {
    info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, router(converter, config))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutting down"),
        Err(e) => {
            warn!("Cannot listen for Ctrl-C ({e}); running until killed");
            std::future::pending::<()>().await;
        }
    }
}
