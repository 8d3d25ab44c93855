//! CLI binary for docscan.
//!
//! A thin shim over the library crate that maps CLI flags to `CliValues` and
//! `ScanConfig`, shows progress, and turns errors into exit codes.

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use console::style;
use docscan::{
    run, CliValues, ConsoleOperator, PageLimit, ProgressCallback, RunSummary, ScanConfig,
    ScanError, ScanProgressCallback, Stage, EXIT_RUNTIME, EXIT_USAGE,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Prints one line per captured page and shows a spinner while each assembly
/// stage runs. No spinner is active while the operator is being prompted.
struct CliProgressCallback {
    spinner: Mutex<Option<ProgressBar>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            spinner: Mutex::new(None),
        })
    }
}

impl ScanProgressCallback for CliProgressCallback {
    fn on_scan_start(&self, limit: Option<u32>) {
        let what = match limit {
            Some(n) => format!("Scanning up to {n} page(s)…"),
            None => "Scanning…".to_string(),
        };
        eprintln!("{} {}", style("◆").cyan(), style(what).bold());
    }

    fn on_page_captured(&self, page_num: usize, path: &Path) {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        eprintln!(
            "  {} Page {:>3}  {}",
            style("✓").green(),
            page_num,
            style(name).dim()
        );
    }

    fn on_scan_complete(&self, pages: usize) {
        eprintln!(
            "{} {} page(s) captured",
            style("◆").cyan(),
            style(pages).bold()
        );
    }

    fn on_stage_start(&self, stage: Stage) {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}  {elapsed:.dim}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_message(format!("{stage}…"));
        bar.enable_steady_tick(Duration::from_millis(80));

        if let Ok(mut slot) = self.spinner.lock() {
            *slot = Some(bar);
        }
    }

    fn on_stage_complete(&self, stage: Stage, elapsed_ms: u64) {
        if let Some(bar) = self.spinner.lock().ok().and_then(|mut s| s.take()) {
            bar.finish_and_clear();
        }
        eprintln!(
            "  {} {:<18} {}",
            style("✓").green(),
            stage.to_string(),
            style(format!("{:.1}s", elapsed_ms as f64 / 1000.0)).dim()
        );
    }
}

impl CliProgressCallback {
    /// Clear a spinner left behind by a failed stage.
    fn abandon(&self) {
        if let Some(bar) = self.spinner.lock().ok().and_then(|mut s| s.take()) {
            bar.finish_and_clear();
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Scan a receipt, stop with 'q' after the last page
  docscan --date 2020-01-05 --title "Costco receipt" --page-size letter

  # Two-page letter from the document feeder, tagged
  docscan --date 2020-02-11 --title "Lease renewal" --company "Acme Rentals" \
          --who Alice --keyword housing --multipage 2 --source "ADF Duplex"

  # Re-use last run's values but review each one before scanning
  docscan --interactive

OUTPUT NAME:
  <date>[, <company>][, <who>], <title>.pdf   in --output-dir

EXIT CODES:
  0  success
  1  usage or validation error (missing date/title, unknown page size, bad flag)
  2  a collaborator tool failed (scanner, convert, ocrmypdf, pdftk)

ENVIRONMENT VARIABLES:
  DOCSCAN_SETTINGS_DIR    Where last-used values are kept (default: ~/.config/docscan)
  DOCSCAN_SCANNER         Scanner driver program     (default: scanimage)
  DOCSCAN_ASSEMBLER       Raster-to-PDF program      (default: convert)
  DOCSCAN_OCR             OCR program                (default: ocrmypdf)
  DOCSCAN_PDF_METADATA    PDF metadata program       (default: pdftk)
  RUST_LOG                Log filter, e.g. docscan=debug
"#;

/// Scan paper documents into searchable, metadata-stamped PDFs.
#[derive(Parser, Debug)]
#[command(
    name = "docscan",
    version,
    about = "Scan paper documents into searchable, metadata-stamped PDFs",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Document date (YYYY-MM-DD).
    #[arg(long)]
    date: Option<String>,

    /// Document title.
    #[arg(long)]
    title: Option<String>,

    /// Keyword to embed in the PDF. Repeatable.
    #[arg(long = "keyword", value_name = "KEYWORD")]
    keywords: Vec<String>,

    /// Who the document concerns (PDF subject; also added as a keyword).
    #[arg(long)]
    who: Option<String>,

    /// Issuing company (PDF author; also added as a keyword).
    #[arg(long)]
    company: Option<String>,

    /// Page size: letter, legal, or auto.
    #[arg(long)]
    page_size: Option<String>,

    /// Review every field at a prompt before scanning.
    #[arg(long)]
    interactive: bool,

    /// Stop after this many pages (default: until the feeder is empty or 'q').
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    multipage: Option<u32>,

    /// SANE device name (default: the driver's first device).
    #[arg(long, env = "DOCSCAN_DEVICE")]
    device: Option<String>,

    /// Document source, e.g. "ADF Duplex" or "Flatbed".
    #[arg(long, env = "DOCSCAN_SOURCE")]
    source: Option<String>,

    /// Scan resolution in dpi (75–1200).
    #[arg(long, env = "DOCSCAN_RESOLUTION", default_value_t = 300,
          value_parser = clap::value_parser!(u32).range(75..=1200))]
    resolution: u32,

    /// Colour mode passed to the scanner (Color, Gray, Lineart).
    #[arg(long, env = "DOCSCAN_MODE", default_value = "Color")]
    mode: String,

    /// Where the finished PDF is placed.
    #[arg(short, long, env = "DOCSCAN_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Where pages and intermediate files are written.
    #[arg(long, env = "DOCSCAN_WORK_DIR")]
    work_dir: Option<PathBuf>,

    /// Where last-used values are persisted.
    #[arg(long, env = "DOCSCAN_SETTINGS_DIR")]
    settings_dir: Option<PathBuf>,

    /// OCR language(s), e.g. eng or eng+deu.
    #[arg(long, env = "DOCSCAN_OCR_LANGUAGE")]
    ocr_language: Option<String>,

    #[arg(long, env = "DOCSCAN_SCANNER", hide = true)]
    scanner_program: Option<PathBuf>,

    #[arg(long, env = "DOCSCAN_ASSEMBLER", hide = true)]
    assembler_program: Option<PathBuf>,

    #[arg(long, env = "DOCSCAN_OCR", hide = true)]
    ocr_program: Option<PathBuf>,

    #[arg(long, env = "DOCSCAN_PDF_METADATA", hide = true)]
    pdf_metadata_program: Option<PathBuf>,

    /// Print a JSON run summary on stdout.
    #[arg(long)]
    json: bool,

    /// Disable page and stage progress output.
    #[arg(long, env = "DOCSCAN_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return exit_code(parse_failure_code(e.kind()));
        }
    };

    // ── Logging setup ────────────────────────────────────────────────────
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
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

    // ── Build config ─────────────────────────────────────────────────────
    let progress = show_progress.then(CliProgressCallback::new);

    let config = match build_config(&cli, progress.clone().map(|p| p as ProgressCallback)) {
        Ok(c) => c,
        Err(e) => return report_error(&e),
    };

    // ── Run ──────────────────────────────────────────────────────────────
    let mut operator = ConsoleOperator::new();
    let result = run(&cli_values(&cli), cli.interactive, &config, &mut operator).await;

    match result {
        Ok(summary) => match report_success(&cli, &summary) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("{} {e:#}", style("error:").red().bold());
                exit_code(EXIT_RUNTIME)
            }
        },
        Err(e) => {
            if let Some(p) = progress {
                p.abandon();
            }
            report_error(&e)
        }
    }
}

/// Map document flags to `CliValues`.
fn cli_values(cli: &Cli) -> CliValues {
    CliValues {
        date: cli.date.clone(),
        title: cli.title.clone(),
        subject: cli.who.clone(),
        company: cli.company.clone(),
        keywords: cli.keywords.clone(),
        page_size: cli.page_size.clone(),
        page_limit: cli
            .multipage
            .and_then(NonZeroU32::new)
            .map(PageLimit::Pages),
    }
}

/// Map run flags to `ScanConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ScanConfig, ScanError> {
    let mut builder = ScanConfig::builder()
        .resolution(cli.resolution)
        .mode(cli.mode.clone())
        .output_dir(cli.output_dir.clone());

    if let Some(ref device) = cli.device {
        builder = builder.device(device.clone());
    }
    if let Some(ref source) = cli.source {
        builder = builder.source(source.clone());
    }
    if let Some(ref dir) = cli.work_dir {
        builder = builder.work_dir(dir.clone());
    }
    if let Some(ref dir) = cli.settings_dir {
        builder = builder.settings_dir(dir.clone());
    }
    if let Some(ref lang) = cli.ocr_language {
        builder = builder.ocr_language(lang.clone());
    }
    if let Some(ref p) = cli.scanner_program {
        builder = builder.scanner_program(p.clone());
    }
    if let Some(ref p) = cli.assembler_program {
        builder = builder.assembler_program(p.clone());
    }
    if let Some(ref p) = cli.ocr_program {
        builder = builder.ocr_program(p.clone());
    }
    if let Some(ref p) = cli.pdf_metadata_program {
        builder = builder.pdf_metadata_program(p.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build()
}

fn report_success(cli: &Cli, summary: &RunSummary) -> Result<()> {
    if cli.json {
        let json =
            serde_json::to_string_pretty(summary).context("Failed to serialise run summary")?;
        println!("{json}");
    } else if !cli.quiet {
        eprintln!(
            "{}  {} page(s)  {}ms  →  {}",
            style("✔").green(),
            summary.pages,
            summary.total_duration_ms,
            style(summary.output_path.display()).bold(),
        );
    }
    Ok(())
}

fn report_error(e: &ScanError) -> ExitCode {
    eprintln!("{} {e}", style("error:").red().bold());
    if e.is_usage() {
        eprintln!(
            "\nUsage: docscan --date <YYYY-MM-DD> --title <TITLE> [--page-size <letter|legal|auto>] [OPTIONS]\n\
             For more information, try '--help'."
        );
    }
    exit_code(e.exit_code())
}

/// Exit code for a clap parse failure.
///
/// Unknown flags and bad values are usage errors (exit 1), not clap's
/// default of 2. `--help` and `--version` succeed.
fn parse_failure_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
        _ => EXIT_USAGE,
    }
}

fn exit_code(code: i32) -> ExitCode {
    ExitCode::from(code as u8)
}
