//! CLI binary for md2pdf.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ConversionConfig` / `ServerConfig`, then either serves the web form or
//! converts one file.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use md2pdf::config::{DEFAULT_MARGIN, DEFAULT_PAGE_SIZE, DEFAULT_THEME};
use md2pdf::{serve, ConversionConfig, Converter, ServerConfig};
use std::io::{self, Read};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::warn;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Serve the form on http://127.0.0.1:5000
  md2pdf

  # Serve on another port, local connections only
  md2pdf serve --bind 127.0.0.1:8080

  # Convert a file
  md2pdf convert notes.md -o notes.pdf

  # Convert stdin, Letter paper, 1in margins
  cat README.md | md2pdf convert - -o readme.pdf --page-size Letter --margin 1in

  # Inspect the HTML handed to the renderer
  md2pdf convert notes.md -o notes.html --html-only

ENVIRONMENT VARIABLES:
  WKHTMLTOPDF_PATH        Path to the wkhtmltopdf binary (otherwise searched on PATH)
  MD2PDF_BIND             Listen address for `serve`
  MD2PDF_TIMEOUT          Renderer timeout in seconds
  MD2PDF_PAGE_SIZE        Page size (A4, Letter, …)
  MD2PDF_MARGIN           Margin on all four sides (e.g. 20mm, 1in)
  MD2PDF_THEME            Code highlighting theme
  MD2PDF_TEMP_DIR         Directory for intermediate files
  RUST_LOG                Overrides -v / -q log filtering

SETUP:
  Install wkhtmltopdf from https://wkhtmltopdf.org/downloads.html.
  On Windows the default C:\Program Files\wkhtmltopdf\bin is found automatically.
"#;

/// Convert Markdown to PDF from a web form or the command line.
#[derive(Parser, Debug)]
#[command(
    name = "md2pdf",
    version,
    about = "Convert Markdown to PDF from a web form or the command line",
    long_about = "Convert Markdown to PDF. Without a subcommand, serves a small web form \
where Markdown can be pasted and downloaded as a PDF. Rendering uses pulldown-cmark with \
syntax-highlighted code blocks and the wkhtmltopdf engine.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Server options when no subcommand is given.
    #[command(flatten)]
    serve: ServeArgs,

    #[command(flatten)]
    render: RenderArgs,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "MD2PDF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "MD2PDF_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the web form (default).
    Serve(ServeArgs),
    /// Convert one Markdown file.
    Convert(ConvertArgs),
}

#[derive(Args, Debug, Clone)]
struct ServeArgs {
    /// Address to listen on.
    #[arg(long, env = "MD2PDF_BIND", default_value = "0.0.0.0:5000")]
    bind: SocketAddr,

    /// Largest accepted form body in bytes.
    #[arg(long, env = "MD2PDF_MAX_BODY_BYTES", default_value_t = 10 * 1024 * 1024)]
    max_body_bytes: usize,
}

#[derive(Args, Debug)]
struct ConvertArgs {
    /// Markdown file to convert, or `-` for stdin.
    input: String,

    /// Where to write the result.
    #[arg(short, long)]
    output: PathBuf,

    /// Write the intermediate HTML instead of a PDF.
    #[arg(long)]
    html_only: bool,
}

/// Flags shared by all subcommands.
#[derive(Args, Debug)]
struct RenderArgs {
    /// wkhtmltopdf binary. Also read from WKHTMLTOPDF_PATH.
    #[arg(long, global = true)]
    renderer: Option<PathBuf>,

    /// Renderer timeout in seconds.
    #[arg(long, global = true, env = "MD2PDF_TIMEOUT", default_value_t = 60)]
    timeout: u64,

    /// Page size passed to the renderer.
    #[arg(long, global = true, env = "MD2PDF_PAGE_SIZE", default_value = DEFAULT_PAGE_SIZE)]
    page_size: String,

    /// Margin on all four sides.
    #[arg(long, global = true, env = "MD2PDF_MARGIN", default_value = DEFAULT_MARGIN)]
    margin: String,

    /// Syntax highlighting theme for code blocks.
    #[arg(long, global = true, env = "MD2PDF_THEME", default_value = DEFAULT_THEME)]
    theme: String,

    /// Directory for intermediate files (default: system temp dir).
    #[arg(long, global = true, env = "MD2PDF_TEMP_DIR")]
    temp_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = build_config(&cli.render)?;

    match cli.command {
        Some(Command::Convert(args)) => run_convert(&args, config, cli.quiet).await,
        Some(Command::Serve(args)) => run_serve(&args, config, cli.quiet).await,
        None => run_serve(&cli.serve, config, cli.quiet).await,
    }
}

/// Map CLI args to `ConversionConfig`.
fn build_config(args: &RenderArgs) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .renderer_binary(resolve_renderer(args.renderer.as_deref()))
        .timeout_secs(args.timeout)
        .page_size(&args.page_size)
        .margin(&args.margin)
        .highlight_theme(&args.theme);

    if let Some(ref dir) = args.temp_dir {
        builder = builder.temp_dir(dir);
    }

    builder.build().context("Invalid configuration")
}

/// Find wkhtmltopdf once. A miss is not fatal: the server still starts and
/// every conversion reports the missing renderer.
fn resolve_renderer(explicit: Option<&Path>) -> PathBuf {
    match wkhtmltopdf_locate::locate(explicit) {
        Ok(path) => path,
        Err(e) => {
            warn!("{e}");
            explicit
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(wkhtmltopdf_locate::BINARY_NAME))
        }
    }
}

async fn run_serve(args: &ServeArgs, config: ConversionConfig, quiet: bool) -> Result<()> {
    let server = ServerConfig {
        bind: args.bind,
        max_body_bytes: args.max_body_bytes,
    };

    let listener = tokio::net::TcpListener::bind(server.bind)
        .await
        .with_context(|| format!("Failed to bind {}", server.bind))?;
    let port = listener.local_addr().context("No local address")?.port();

    if !quiet {
        eprintln!("{} {}", cyan("◆"), bold("md2pdf is running"));
        eprintln!(
            "  {}  {}",
            dim("renderer"),
            config.renderer_binary.display()
        );
        eprintln!("  {}     {}", dim("open"), green(&format!("http://127.0.0.1:{port}")));
        eprintln!("  {}", dim("Ctrl-C to stop"));
    }

    serve(listener, Converter::new(config), &server)
        .await
        .context("Server failed")
}

async fn run_convert(args: &ConvertArgs, config: ConversionConfig, quiet: bool) -> Result<()> {
    let markdown_text = read_input(&args.input).await?;
    let converter = Converter::new(config);
    let start = Instant::now();

    let written = if args.html_only {
        let html = converter
            .render_html(&markdown_text)
            .await
            .context("Markdown rendering failed")?;
        tokio::fs::write(&args.output, html.as_bytes())
            .await
            .with_context(|| format!("Failed to write {}", args.output.display()))?;
        html.len() as u64
    } else {
        converter
            .convert_to_file(&markdown_text, &args.output)
            .await
            .context("Conversion failed")?
    };

    if !quiet {
        eprintln!(
            "{}  {} bytes  {}ms  →  {}",
            green("✔"),
            written,
            start.elapsed().as_millis(),
            bold(&args.output.display().to_string()),
        );
    }

    Ok(())
}

/// Read Markdown from a path, or stdin for `-`.
async fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let text = tokio::task::spawn_blocking(|| -> io::Result<String> {
            let mut buf = String::new();
            io::stdin().lock().read_to_string(&mut buf)?;
            Ok(buf)
        })
        .await
        .context("stdin reader panicked")?
        .context("Failed to read Markdown from stdin")?;
        Ok(text)
    } else {
        tokio::fs::read_to_string(input)
            .await
            .with_context(|| format!("Failed to read {input}"))
    }
}
