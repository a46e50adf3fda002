//! Configuration types for Markdown-to-PDF conversion and the web server.
//!
//! Conversion behaviour is controlled through [`ConversionConfig`], built via
//! its [`ConversionConfigBuilder`]. The renderer binary location is part of
//! the config rather than a constant so the same build runs on a laptop with
//! Homebrew, a Windows box with the official installer, or a container with
//! the binary somewhere under `/opt`.

use crate::error::ConversionError;
use crate::pipeline::markdown;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

/// Default page size passed to the renderer.
pub const DEFAULT_PAGE_SIZE: &str = "A4";

/// Default margin applied to all four sides.
pub const DEFAULT_MARGIN: &str = "20mm";

/// Default syntax-highlighting theme (one of syntect's bundled themes).
pub const DEFAULT_THEME: &str = "InspiredGitHub";

/// Default port the server listens on.
pub const DEFAULT_PORT: u16 = 5000;

/// Configuration for a Markdown-to-PDF conversion.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use md2pdf::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .renderer_binary("/usr/local/bin/wkhtmltopdf")
///     .timeout_secs(30)
///     .build()
///     .unwrap();
/// assert_eq!(config.pdf.page_size, "A4");
/// ```
#[derive(Debug, Clone)]
pub struct ConversionConfig {
    /// Path (or bare program name) of the wkhtmltopdf binary. Default: `wkhtmltopdf`.
    ///
    /// Usually filled in at startup from [`wkhtmltopdf_locate::locate`].
    pub renderer_binary: PathBuf,

    /// Options forwarded to the renderer on every invocation.
    pub pdf: PdfOptions,

    /// Seconds the renderer may run before it is killed. Default: 60.
    pub timeout_secs: u64,

    /// Directory for the intermediate HTML and PDF files.
    /// If None, uses the system temp directory.
    pub temp_dir: Option<PathBuf>,

    /// syntect theme used for fenced code blocks. Default: `InspiredGitHub`.
    pub highlight_theme: String,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            renderer_binary: PathBuf::from(wkhtmltopdf_locate::BINARY_NAME),
            pdf: PdfOptions::default(),
            timeout_secs: 60,
            temp_dir: None,
            highlight_theme: DEFAULT_THEME.to_string(),
        }
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn renderer_binary(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.renderer_binary = path.into();
        self
    }

    pub fn page_size(mut self, size: impl Into<String>) -> Self {
        self.config.pdf.page_size = size.into();
        self
    }

    /// Set all four margins at once.
    pub fn margin(mut self, margin: impl Into<String>) -> Self {
        let margin = margin.into();
        self.config.pdf.margin_top = margin.clone();
        self.config.pdf.margin_right = margin.clone();
        self.config.pdf.margin_bottom = margin.clone();
        self.config.pdf.margin_left = margin;
        self
    }

    pub fn encoding(mut self, encoding: impl Into<String>) -> Self {
        self.config.pdf.encoding = encoding.into();
        self
    }

    pub fn quiet(mut self, v: bool) -> Self {
        self.config.pdf.quiet = v;
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout_secs = secs.max(1);
        self
    }

    pub fn temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.temp_dir = Some(dir.into());
        self
    }

    pub fn highlight_theme(mut self, theme: impl Into<String>) -> Self {
        self.config.highlight_theme = theme.into();
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, ConversionError> {
        let c = &self.config;
        if c.renderer_binary.as_os_str().is_empty() {
            return Err(ConversionError::InvalidConfig(
                "Renderer binary path must not be empty".into(),
            ));
        }
        if c.pdf.page_size.trim().is_empty() {
            return Err(ConversionError::InvalidConfig(
                "Page size must not be empty".into(),
            ));
        }
        if c.pdf.encoding.trim().is_empty() {
            return Err(ConversionError::InvalidConfig(
                "Encoding must not be empty".into(),
            ));
        }
        for margin in c.pdf.margins() {
            if !is_valid_length(margin) {
                return Err(ConversionError::InvalidConfig(format!(
                    "Margin must be a number with a unit (mm, cm, in, px), got '{margin}'"
                )));
            }
        }
        if !markdown::theme_exists(&c.highlight_theme) {
            return Err(ConversionError::InvalidConfig(format!(
                "Unknown highlight theme '{}'. Available: {}",
                c.highlight_theme,
                markdown::theme_names().join(", ")
            )));
        }
        Ok(self.config)
    }
}

/// Options passed to wkhtmltopdf on every call.
///
/// Mirrors the renderer's own flag names so the mapping in
/// [`PdfOptions::to_args`] stays one-to-one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfOptions {
    /// `--encoding`. Default: `UTF-8`.
    pub encoding: String,
    /// `--page-size`. Default: `A4`.
    pub page_size: String,
    pub margin_top: String,
    pub margin_right: String,
    pub margin_bottom: String,
    pub margin_left: String,
    /// `--quiet`. Default: true.
    pub quiet: bool,
}

impl Default for PdfOptions {
    fn default() -> Self {
        Self {
            encoding: "UTF-8".to_string(),
            page_size: DEFAULT_PAGE_SIZE.to_string(),
            margin_top: DEFAULT_MARGIN.to_string(),
            margin_right: DEFAULT_MARGIN.to_string(),
            margin_bottom: DEFAULT_MARGIN.to_string(),
            margin_left: DEFAULT_MARGIN.to_string(),
            quiet: true,
        }
    }
}

impl PdfOptions {
    /// The margins in top, right, bottom, left order.
    pub fn margins(&self) -> [&str; 4] {
        [
            self.margin_top.as_str(),
            self.margin_right.as_str(),
            self.margin_bottom.as_str(),
            self.margin_left.as_str(),
        ]
    }

    /// Render the options as renderer command-line arguments.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![
            "--encoding".to_string(),
            self.encoding.clone(),
            "--page-size".to_string(),
            self.page_size.clone(),
            "--margin-top".to_string(),
            self.margin_top.clone(),
            "--margin-right".to_string(),
            self.margin_right.clone(),
            "--margin-bottom".to_string(),
            self.margin_bottom.clone(),
            "--margin-left".to_string(),
            self.margin_left.clone(),
        ];
        if self.quiet {
            args.push("--quiet".to_string());
        }
        args
    }
}

/// `12mm`, `1.5cm`, `0.75in`, `40px`, or a bare number (wkhtmltopdf reads it as mm).
fn is_valid_length(s: &str) -> bool {
    let s = s.trim();
    let number = ["mm", "cm", "in", "px"]
        .iter()
        .find_map(|unit| s.strip_suffix(unit))
        .unwrap_or(s);
    !number.is_empty() && number.parse::<f64>().map(|n| n >= 0.0).unwrap_or(false)
}

/// Configuration for the HTTP server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind. Default: all interfaces, port 5000.
    pub bind: SocketAddr,

    /// Largest accepted form body in bytes. Default: 10 MiB.
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)),
            max_body_bytes: 10 * 1024 * 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_renderer_contract() {
        let c = ConversionConfig::default();
        assert_eq!(c.pdf.encoding, "UTF-8");
        assert_eq!(c.pdf.page_size, "A4");
        assert_eq!(c.pdf.margins(), ["20mm"; 4]);
        assert!(c.pdf.quiet);
        assert_eq!(c.timeout_secs, 60);
        assert!(c.temp_dir.is_none());
    }

    #[test]
    fn default_args() {
        let args = PdfOptions::default().to_args();
        assert_eq!(
            args,
            vec![
                "--encoding",
                "UTF-8",
                "--page-size",
                "A4",
                "--margin-top",
                "20mm",
                "--margin-right",
                "20mm",
                "--margin-bottom",
                "20mm",
                "--margin-left",
                "20mm",
                "--quiet",
            ]
        );
    }

    #[test]
    fn quiet_off_drops_flag() {
        let config = ConversionConfig::builder().quiet(false).build().unwrap();
        assert!(!config.pdf.to_args().contains(&"--quiet".to_string()));
    }

    #[test]
    fn margin_sets_all_sides() {
        let config = ConversionConfig::builder().margin("1in").build().unwrap();
        assert_eq!(config.pdf.margins(), ["1in"; 4]);
    }

    #[test]
    fn timeout_is_clamped_to_one_second() {
        let config = ConversionConfig::builder().timeout_secs(0).build().unwrap();
        assert_eq!(config.timeout_secs, 1);
    }

    #[test]
    fn invalid_margin_rejected() {
        let err = ConversionConfig::builder().margin("wide").build().unwrap_err();
        assert!(matches!(err, ConversionError::InvalidConfig(_)));
    }

    #[test]
    fn unknown_theme_rejected() {
        let err = ConversionConfig::builder()
            .highlight_theme("NoSuchTheme")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("NoSuchTheme"));
    }

    #[test]
    fn empty_page_size_rejected() {
        assert!(ConversionConfig::builder().page_size(" ").build().is_err());
    }

    #[test]
    fn length_parsing() {
        assert!(is_valid_length("20mm"));
        assert!(is_valid_length("1.5cm"));
        assert!(is_valid_length("0.5in"));
        assert!(is_valid_length("12"));
        assert!(!is_valid_length("mm"));
        assert!(!is_valid_length("-3mm"));
        assert!(!is_valid_length(""));
    }

    #[test]
    fn server_default_binds_all_interfaces_on_5000() {
        let s = ServerConfig::default();
        assert_eq!(s.bind.to_string(), "0.0.0.0:5000");
    }
}
