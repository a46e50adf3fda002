//! # wkhtmltopdf-locate
//!
//! Find the [wkhtmltopdf](https://wkhtmltopdf.org/) binary so callers do not
//! have to hard-code an install path per machine.
//!
//! ## Resolution order
//!
//! 1. An explicit path handed to [`locate`] (e.g. a `--renderer` flag).
//! 2. The `WKHTMLTOPDF_PATH` environment variable.
//! 3. Every directory on `PATH`.
//! 4. The platform's well-known install locations (the Windows installer's
//!    `C:\Program Files\wkhtmltopdf\bin`, Homebrew prefixes, `/usr/bin`, …).
//!
//! An explicit path that does not exist is an error; it is never silently
//! replaced by a discovered one. Steps 2–4 are resolved once per process and
//! cached.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use wkhtmltopdf_locate::locate;
//!
//! let binary = locate(None).expect("wkhtmltopdf is not installed");
//! println!("using {}", binary.display());
//! ```

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use thiserror::Error;

// ── Public constants ─────────────────────────────────────────────────────────

/// Environment variable that overrides discovery.
pub const ENV_BINARY_PATH: &str = "WKHTMLTOPDF_PATH";

/// Program name looked up on `PATH`.
#[cfg(windows)]
pub const BINARY_NAME: &str = "wkhtmltopdf.exe";
#[cfg(not(windows))]
pub const BINARY_NAME: &str = "wkhtmltopdf";

// ── Error type ───────────────────────────────────────────────────────────────

/// Errors returned by wkhtmltopdf-locate.
#[derive(Error, Debug)]
pub enum LocateError {
    /// The caller named a binary that is not there.
    #[error("wkhtmltopdf not found at explicit path '{path}'")]
    ExplicitPathMissing { path: PathBuf },

    /// Nothing usable on `PATH` or in the well-known locations.
    #[error(
        "wkhtmltopdf not found.\n\
Searched {searched} location(s) on PATH and the default install directories.\n\
Install it from https://wkhtmltopdf.org/downloads.html or set WKHTMLTOPDF_PATH."
    )]
    NotFound { searched: usize },
}

// ── Internal: platform defaults ──────────────────────────────────────────────

fn well_known_locations() -> Vec<PathBuf> {
    match std::env::consts::OS {
        "windows" => vec![
            PathBuf::from(r"C:\Program Files\wkhtmltopdf\bin\wkhtmltopdf.exe"),
            PathBuf::from(r"C:\Program Files (x86)\wkhtmltopdf\bin\wkhtmltopdf.exe"),
        ],
        "macos" => vec![
            PathBuf::from("/usr/local/bin/wkhtmltopdf"),
            PathBuf::from("/opt/homebrew/bin/wkhtmltopdf"),
        ],
        _ => vec![
            PathBuf::from("/usr/bin/wkhtmltopdf"),
            PathBuf::from("/usr/local/bin/wkhtmltopdf"),
        ],
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

// ── Thread-safe singleton path cache ─────────────────────────────────────────

static DISCOVERED_PATH: OnceLock<PathBuf> = OnceLock::new();

// ── Public API ───────────────────────────────────────────────────────────────

/// Resolve the wkhtmltopdf binary.
///
/// `explicit` wins when given. Otherwise the environment override, `PATH`
/// and the platform defaults are consulted, and a successful discovery is
/// cached for the rest of the process.
pub fn locate(explicit: Option<&Path>) -> Result<PathBuf, LocateError> {
    if let Some(path) = explicit {
        return resolve_explicit(path);
    }

    if let Some(path) = DISCOVERED_PATH.get() {
        return Ok(path.clone());
    }

    let path = resolve(
        std::env::var_os(ENV_BINARY_PATH),
        std::env::var_os("PATH"),
        &well_known_locations(),
    )?;

    let _ = DISCOVERED_PATH.set(path.clone());
    Ok(path)
}

/// Returns `true` when [`locate`] would succeed without an explicit path.
pub fn is_installed() -> bool {
    locate(None).is_ok()
}

// ── Internal helpers ─────────────────────────────────────────────────────────

fn resolve_explicit(path: &Path) -> Result<PathBuf, LocateError> {
    if is_executable(path) {
        return Ok(path.to_path_buf());
    }
    // A bare program name ("wkhtmltopdf") is looked up on PATH.
    if path.components().count() == 1 {
        if let Some(found) = search_path(path.as_os_str(), std::env::var_os("PATH")) {
            return Ok(found);
        }
    }
    Err(LocateError::ExplicitPathMissing {
        path: path.to_path_buf(),
    })
}

fn resolve(
    env_override: Option<OsString>,
    path_var: Option<OsString>,
    defaults: &[PathBuf],
) -> Result<PathBuf, LocateError> {
    // 1. Environment variable override.
    if let Some(env_path) = env_override.filter(|v| !v.is_empty()) {
        let p = PathBuf::from(env_path);
        if is_executable(&p) {
            return Ok(p);
        }
        // Fall through: a stale override should not hide a working install.
        eprintln!(
            "wkhtmltopdf-locate: {ENV_BINARY_PATH} '{}' is not an executable file; searching PATH",
            p.display()
        );
    }

    // 2. PATH.
    let searched_on_path = path_var
        .as_ref()
        .map(|v| std::env::split_paths(v).count())
        .unwrap_or(0);
    if let Some(found) = search_path(OsStr::new(BINARY_NAME), path_var) {
        return Ok(found);
    }

    // 3. Platform defaults.
    if let Some(found) = defaults.iter().find(|p| is_executable(p)) {
        return Ok(found.clone());
    }

    Err(LocateError::NotFound {
        searched: searched_on_path + defaults.len(),
    })
}

fn search_path(name: &OsStr, path_var: Option<OsString>) -> Option<PathBuf> {
    let path_var = path_var?;
    std::env::split_paths(&path_var)
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable(candidate))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
