//! Progress-callback trait for page and stage events.
//!
//! Inject an [`Arc<dyn ScanProgressCallback>`] via
//! [`crate::config::ScanConfigBuilder::progress_callback`] to be told when a
//! page lands on disk and when each assembly stage starts and finishes.
//!
//! # Example
//!
//! ```rust
//! use docscan::{ScanConfig, ScanProgressCallback};
//! use std::path::Path;
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct PageCounter {
//!     pages: AtomicUsize,
//! }
//!
//! impl ScanProgressCallback for PageCounter {
//!     fn on_page_captured(&self, page_num: usize, path: &Path) {
//!         self.pages.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("page {page_num} → {}", path.display());
//!     }
//! }
//!
//! let counter = Arc::new(PageCounter { pages: AtomicUsize::new(0) });
//! let config = ScanConfig::builder()
//!     .progress_callback(counter as Arc<dyn ScanProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// The four assembly stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Page images → one PDF.
    Assemble,
    /// OCR, deskew, background removal, cleanup.
    Ocr,
    /// Dump, augment and reapply the info block.
    Metadata,
    /// Move into the output directory, remove intermediates.
    Finalize,
}

impl Stage {
    pub const ALL: [Stage; 4] = [Stage::Assemble, Stage::Ocr, Stage::Metadata, Stage::Finalize];
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Assemble => "Assembling PDF",
            Stage::Ocr => "Running OCR",
            Stage::Metadata => "Writing metadata",
            Stage::Finalize => "Finalizing",
        })
    }
}

/// Called by the scan loop and the assembly pipeline as the run proceeds.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Events are delivered sequentially from the task
/// driving the run.
pub trait ScanProgressCallback: Send + Sync {
    /// Called once before the first capture attempt.
    ///
    /// # Arguments
    /// * `limit` — page limit, `None` when unbounded
    fn on_scan_start(&self, limit: Option<u32>) {
        let _ = limit;
    }

    /// Called after a page image has been written.
    ///
    /// # Arguments
    /// * `page_num` — 1-indexed page number
    /// * `path`     — where the page image was written
    fn on_page_captured(&self, page_num: usize, path: &Path) {
        let _ = (page_num, path);
    }

    /// Called once when the capture loop ends, for whatever reason.
    fn on_scan_complete(&self, pages: usize) {
        let _ = pages;
    }

    /// Called before an assembly stage begins.
    fn on_stage_start(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called after an assembly stage succeeds.
    fn on_stage_complete(&self, stage: Stage, elapsed_ms: u64) {
        let _ = (stage, elapsed_ms);
    }
}

/// Convenience alias for a shared callback.
pub type ProgressCallback = Arc<dyn ScanProgressCallback>;

/// A no-op implementation, handy for tests or when progress is unwanted.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgressCallback;

impl ScanProgressCallback for NoopProgressCallback {}
