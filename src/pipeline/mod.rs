//! Pipeline stages for scanning a paper document into an archived PDF.
//!
//! Each submodule wraps exactly one external collaborator (or, for
//! [`finalize`], the file moves that end the run).
//!
//! ## Data Flow
//!
//! ```text
//! capture ──▶ assemble ──▶ ocr ──▶ metadata ──▶ finalize
//! (scanimage)  (convert)  (ocrmypdf)  (pdftk)    (rename + cleanup)
//! ```
//!
//! 1. [`capture`]  — one driver call per page into the working directory
//! 2. [`assemble`] — page images, in capture order, into one PDF
//! 3. [`ocr`]      — text layer, deskew, background removal, title/author/keywords
//! 4. [`metadata`] — append ScannedBy/ScanDate/Company/Subject to the info block
//! 5. [`finalize`] — promote into the output directory, delete intermediates
//!
//! Nothing is written to the output directory before step 5.

pub mod assemble;
pub mod capture;
pub mod finalize;
pub mod metadata;
pub mod ocr;
pub mod tool;

use std::path::{Path, PathBuf};

/// Intermediate PDFs and text files for one document in the working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkFiles {
    /// Output of [`assemble`].
    pub images_pdf: PathBuf,
    /// Output of [`ocr`].
    pub ocr_pdf: PathBuf,
    /// Augmented info block fed back to the metadata tool.
    pub info: PathBuf,
    /// Output of [`metadata`]; the file that gets promoted.
    pub final_pdf: PathBuf,
}

impl WorkFiles {
    pub fn new(work_dir: &Path, document_name: &str) -> Self {
        let file = |suffix: &str| work_dir.join(format!("{document_name}.{suffix}"));
        Self {
            images_pdf: file("images.pdf"),
            ocr_pdf: file("ocr.pdf"),
            info: file("info.txt"),
            final_pdf: file("final.pdf"),
        }
    }

    pub fn all(&self) -> [&Path; 4] {
        [
            self.images_pdf.as_path(),
            self.ocr_pdf.as_path(),
            self.info.as_path(),
            self.final_pdf.as_path(),
        ]
    }
}
