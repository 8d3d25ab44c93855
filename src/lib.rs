//! # docscan
//!
//! Scan paper documents into searchable, metadata-stamped PDFs.
//!
//! The heavy lifting is done by well-known external tools; this crate is the
//! glue that collects the document's metadata, drives the scanner page by
//! page, and carries the pages through assembly, OCR and stamping until a
//! single PDF named after the document lands in the output directory.
//!
//! ## Pipeline Overview
//!
//! ```text
//! operator
//!  │
//!  ├─ 1. Settings  reload last-used date/title/subject/company/keywords/size
//!  ├─ 2. Resolve   CLI flags over persisted values, optional prompts, validate
//!  ├─ 3. Capture   scanimage, one page per call, until limit / ADF empty / 'q'
//!  ├─ 4. Assemble  convert pages → PDF
//!  ├─ 5. OCR       ocrmypdf: text layer, deskew, cleanup, title/author/keywords
//!  ├─ 6. Stamp     pdftk: ScannedBy, ScanDate, Company, Subject
//!  └─ 7. Finalize  "<date>[, company][, subject], <title>.pdf" in the output dir
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docscan::{run, CliValues, ConsoleOperator, ScanConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cli = CliValues {
//!         date: Some("2020-01-05".into()),
//!         title: Some("Costco receipt".into()),
//!         page_size: Some("letter".into()),
//!         ..Default::default()
//!     };
//!     let config = ScanConfig::builder().output_dir("/srv/archive").build()?;
//!     let summary = run(&cli, false, &config, &mut ConsoleOperator::new()).await?;
//!     println!("{} pages → {}", summary.pages, summary.output_path.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `docscan` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod operator;
pub mod pipeline;
pub mod progress;
pub mod resolve;
pub mod session;
pub mod settings;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{PageLimit, PageSize, Programs, ScanConfig, ScanConfigBuilder, ScanParameters};
pub use error::{ScanError, EXIT_RUNTIME, EXIT_USAGE};
pub use operator::{ConsoleOperator, Operator};
pub use pipeline::capture::PageSequence;
pub use progress::{NoopProgressCallback, ProgressCallback, ScanProgressCallback, Stage};
pub use resolve::CliValues;
pub use session::{assemble, run, RunSummary};
pub use settings::PersistedDefaults;
