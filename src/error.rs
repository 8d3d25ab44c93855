//! Error types for the docscan library.
//!
//! Every failure is terminal for the run; nothing is retried. The variants
//! fall into two families that the binary maps to distinct exit codes:
//!
//! * **Usage** ([`ScanError::InvalidParameter`], [`ScanError::InvalidConfig`])
//!   — the operator supplied bad or missing input. Detected before any side
//!   effect, reported with the offending field, exit code `1`.
//!
//! * **Runtime** (everything else) — a collaborator tool failed, the working
//!   directory could not be written, and so on. Exit code `2`. Files already
//!   written to the working directory are left in place for inspection.
//!
//! A scanner driver that reports "no more input" is *not* an error; the
//! capture loop treats it as the normal end of the document.

use std::path::PathBuf;
use thiserror::Error;

/// Exit code for usage and validation failures.
pub const EXIT_USAGE: i32 = 1;

/// Exit code for fatal runtime failures surfaced from a collaborator.
pub const EXIT_RUNTIME: i32 = 2;

/// All errors returned by the docscan library.
#[derive(Debug, Error)]
pub enum ScanError {
    // ── Usage errors ──────────────────────────────────────────────────────
    /// A resolved document field failed validation.
    #[error("Invalid {field}: {reason}")]
    InvalidParameter { field: &'static str, reason: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Operator I/O ──────────────────────────────────────────────────────
    /// Reading the operator's answer from the terminal failed.
    #[error("Failed to read operator input: {0}")]
    Prompt(#[source] std::io::Error),

    // ── Collaborator errors ───────────────────────────────────────────────
    /// The collaborator program could not be started at all.
    #[error("{tool} program '{program}' could not be started: {detail}\nIs it installed and on PATH?")]
    CollaboratorNotFound {
        tool: &'static str,
        program: String,
        detail: String,
    },

    /// The collaborator ran and exited unsuccessfully.
    #[error("{tool} failed ({status}): {stderr}")]
    CollaboratorFailed {
        tool: &'static str,
        status: String,
        stderr: String,
    },

    /// The scanner reported end-of-input before a single page was captured.
    #[error("No pages were captured; the scanner reported no input on the first attempt")]
    NoPagesCaptured,

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write inside the working directory.
    #[error("Working directory error at '{path}': {source}")]
    WorkDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not persist the last-used settings.
    #[error("Failed to save settings to '{path}': {source}")]
    SettingsWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not place the final PDF in the output directory.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ScanError {
    /// True for errors caused by operator input rather than the environment.
    pub fn is_usage(&self) -> bool {
        matches!(
            self,
            ScanError::InvalidParameter { .. } | ScanError::InvalidConfig(_)
        )
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        if self.is_usage() {
            EXIT_USAGE
        } else {
            EXIT_RUNTIME
        }
    }
}
