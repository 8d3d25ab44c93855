//! Configuration and document-parameter types.
//!
//! Two structs split the inputs of a run:
//!
//! * [`ScanParameters`] — *what* is being scanned: the document fields the
//!   operator types in (date, title, subject, company, keywords, page size,
//!   page limit). Resolved from CLI flags, persisted defaults, and prompts;
//!   immutable once the scan loop begins.
//! * [`ScanConfig`] — *how* the run is carried out: scanner device, working
//!   and output directories, collaborator programs. Built via
//!   [`ScanConfigBuilder`].

use crate::error::ScanError;
use crate::progress::ProgressCallback;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::str::FromStr;

// ── Page size ────────────────────────────────────────────────────────────

/// Physical page size requested from the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageSize {
    /// US Letter, 8.5 × 11 in.
    #[default]
    Letter,
    /// US Legal, 8.5 × 14 in.
    Legal,
    /// Let the device decide; no dimensions are passed.
    Auto,
}

impl PageSize {
    /// Scan-area width and height in millimetres, or `None` for [`PageSize::Auto`].
    pub fn dimensions_mm(self) -> Option<(f32, f32)> {
        match self {
            PageSize::Letter => Some((215.9, 279.4)),
            PageSize::Legal => Some((215.9, 355.6)),
            PageSize::Auto => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PageSize::Letter => "letter",
            PageSize::Legal => "legal",
            PageSize::Auto => "auto",
        }
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PageSize {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "letter" => Ok(PageSize::Letter),
            "legal" => Ok(PageSize::Legal),
            "auto" => Ok(PageSize::Auto),
            "" => Err(ScanError::InvalidParameter {
                field: "page size",
                reason: "must not be empty (letter, legal, auto)".into(),
            }),
            other => Err(ScanError::InvalidParameter {
                field: "page size",
                reason: format!("'{other}' is not one of letter, legal, auto"),
            }),
        }
    }
}

// ── Page limit ───────────────────────────────────────────────────────────

/// Maximum number of pages the capture loop will request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PageLimit {
    /// Keep scanning until the device or the operator stops (default).
    #[default]
    Unbounded,
    /// Stop after this many pages.
    Pages(NonZeroU32),
}

impl PageLimit {
    /// True once `captured` pages satisfy the limit.
    pub fn is_reached(self, captured: usize) -> bool {
        match self {
            PageLimit::Unbounded => false,
            PageLimit::Pages(n) => captured >= n.get() as usize,
        }
    }
}

impl fmt::Display for PageLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageLimit::Unbounded => Ok(()),
            PageLimit::Pages(n) => write!(f, "{n}"),
        }
    }
}

impl FromStr for PageLimit {
    type Err = ScanError;

    /// An empty string means unbounded; otherwise a positive integer.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(PageLimit::Unbounded);
        }
        s.parse::<NonZeroU32>()
            .map(PageLimit::Pages)
            .map_err(|_| ScanError::InvalidParameter {
                field: "page limit",
                reason: format!("'{s}' is not a positive integer"),
            })
    }
}

// ── Document parameters ──────────────────────────────────────────────────

static RE_DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());

static RE_UNSAFE_NAME_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[/\\\x00-\x1f\x7f]").unwrap());

/// Fully resolved and validated document fields for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanParameters {
    /// Document date, `YYYY-MM-DD`.
    pub date: String,
    pub title: String,
    /// Who the document concerns. Empty when not given.
    pub subject: String,
    /// Issuing company. Empty when not given.
    pub company: String,
    /// Explicit keywords, in the order given.
    pub keywords: Vec<String>,
    pub page_size: PageSize,
    pub page_limit: PageLimit,
}

impl ScanParameters {
    /// Check the invariants every run relies on.
    pub fn validate(&self) -> Result<(), ScanError> {
        if self.date.trim().is_empty() {
            return Err(ScanError::InvalidParameter {
                field: "date",
                reason: "must not be empty (use --date YYYY-MM-DD)".into(),
            });
        }
        if !RE_DATE.is_match(&self.date) {
            return Err(ScanError::InvalidParameter {
                field: "date",
                reason: format!("'{}' is not in YYYY-MM-DD form", self.date),
            });
        }
        if self.title.trim().is_empty() {
            return Err(ScanError::InvalidParameter {
                field: "title",
                reason: "must not be empty (use --title <TITLE>)".into(),
            });
        }
        Ok(())
    }

    /// Base file name shared by every artifact of this run:
    /// `date[, company][, subject], title`.
    ///
    /// Path separators and control characters are replaced with `-` so the
    /// result is always a single path component.
    pub fn document_name(&self) -> String {
        let mut parts: Vec<&str> = vec![self.date.as_str()];
        if !self.company.is_empty() {
            parts.push(&self.company);
        }
        if !self.subject.is_empty() {
            parts.push(&self.subject);
        }
        parts.push(&self.title);
        RE_UNSAFE_NAME_CHARS
            .replace_all(&parts.join(", "), "-")
            .into_owned()
    }

    /// Keywords written into the PDF: the explicit list followed by the
    /// subject and company, without empties or duplicates.
    pub fn all_keywords(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::with_capacity(self.keywords.len() + 2);
        let extra = [self.subject.as_str(), self.company.as_str()];
        for kw in self.keywords.iter().map(String::as_str).chain(extra) {
            let kw = kw.trim();
            if !kw.is_empty() && !out.iter().any(|k| k == kw) {
                out.push(kw.to_string());
            }
        }
        out
    }
}

// ── Collaborator programs ────────────────────────────────────────────────

/// Executables used for each external stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Programs {
    /// Scanner-capture driver (SANE `scanimage`).
    pub scanner: PathBuf,
    /// Raster-to-PDF assembler (ImageMagick `convert`).
    pub assembler: PathBuf,
    /// OCR and cleanup (`ocrmypdf`).
    pub ocr: PathBuf,
    /// PDF info dump/update (`pdftk`).
    pub pdf_metadata: PathBuf,
}

impl Default for Programs {
    fn default() -> Self {
        Self {
            scanner: PathBuf::from("scanimage"),
            assembler: PathBuf::from("convert"),
            ocr: PathBuf::from("ocrmypdf"),
            pdf_metadata: PathBuf::from("pdftk"),
        }
    }
}

// ── Run configuration ────────────────────────────────────────────────────

/// Configuration for a scanning run.
///
/// # Example
/// ```rust
/// use docscan::ScanConfig;
///
/// let config = ScanConfig::builder()
///     .resolution(300)
///     .device("epson2:libusb:001:004")
///     .output_dir("/srv/archive")
///     .build()
///     .unwrap();
/// assert_eq!(config.resolution, 300);
/// ```
#[derive(Clone)]
pub struct ScanConfig {
    /// SANE device name. `None` lets the driver pick its default device.
    pub device: Option<String>,

    /// Document source, e.g. `ADF Duplex` or `Flatbed`.
    pub source: Option<String>,

    /// Scan resolution in dpi. Range: 75–1200. Default: 300.
    pub resolution: u32,

    /// Colour mode passed to the driver. Default: `Color`.
    pub mode: String,

    /// Where pages and intermediate PDFs are written.
    pub work_dir: PathBuf,

    /// Where the finished PDF is placed. Default: current directory.
    pub output_dir: PathBuf,

    /// Where last-used document fields are persisted.
    pub settings_dir: PathBuf,

    /// OCR language(s), e.g. `eng+deu`. `None` uses the OCR tool's default.
    pub ocr_language: Option<String>,

    /// Identity recorded in the `ScannedBy` info field.
    pub scanned_by: String,

    pub programs: Programs,

    /// Receives page and stage events. Optional.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            device: None,
            source: None,
            resolution: 300,
            mode: "Color".to_string(),
            work_dir: default_work_dir(),
            output_dir: PathBuf::from("."),
            settings_dir: crate::settings::settings_dir(),
            ocr_language: None,
            scanned_by: default_scanned_by(),
            programs: Programs::default(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ScanConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanConfig")
            .field("device", &self.device)
            .field("source", &self.source)
            .field("resolution", &self.resolution)
            .field("mode", &self.mode)
            .field("work_dir", &self.work_dir)
            .field("output_dir", &self.output_dir)
            .field("settings_dir", &self.settings_dir)
            .field("ocr_language", &self.ocr_language)
            .field("scanned_by", &self.scanned_by)
            .field("programs", &self.programs)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ScanProgressCallback>"),
            )
            .finish()
    }
}

impl ScanConfig {
    /// Create a new builder for `ScanConfig`.
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder {
            config: Self::default(),
        }
    }
}

/// `cache_dir()/docscan/work`, or the temp dir when no cache dir exists.
pub fn default_work_dir() -> PathBuf {
    dirs::cache_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".cache")))
        .unwrap_or_else(std::env::temp_dir)
        .join("docscan")
        .join("work")
}

fn default_scanned_by() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .ok()
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Builder for [`ScanConfig`].
#[derive(Debug)]
pub struct ScanConfigBuilder {
    config: ScanConfig,
}

impl ScanConfigBuilder {
    pub fn device(mut self, device: impl Into<String>) -> Self {
        self.config.device = Some(device.into());
        self
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.config.source = Some(source.into());
        self
    }

    pub fn resolution(mut self, dpi: u32) -> Self {
        self.config.resolution = dpi;
        self
    }

    pub fn mode(mut self, mode: impl Into<String>) -> Self {
        self.config.mode = mode.into();
        self
    }

    pub fn work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.work_dir = dir.into();
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn settings_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.settings_dir = dir.into();
        self
    }

    pub fn ocr_language(mut self, lang: impl Into<String>) -> Self {
        self.config.ocr_language = Some(lang.into());
        self
    }

    pub fn scanned_by(mut self, who: impl Into<String>) -> Self {
        self.config.scanned_by = who.into();
        self
    }

    pub fn scanner_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.config.programs.scanner = program.into();
        self
    }

    pub fn assembler_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.config.programs.assembler = program.into();
        self
    }

    pub fn ocr_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.config.programs.ocr = program.into();
        self
    }

    pub fn pdf_metadata_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.config.programs.pdf_metadata = program.into();
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ScanConfig, ScanError> {
        let c = &self.config;
        if !(75..=1200).contains(&c.resolution) {
            return Err(ScanError::InvalidConfig(format!(
                "Resolution must be 75–1200 dpi, got {}",
                c.resolution
            )));
        }
        if c.mode.trim().is_empty() {
            return Err(ScanError::InvalidConfig("Colour mode must not be empty".into()));
        }
        if c.work_dir == c.output_dir {
            return Err(ScanError::InvalidConfig(format!(
                "Working directory and output directory must differ ({})",
                c.work_dir.display()
            )));
        }
        Ok(self.config)
    }
}
