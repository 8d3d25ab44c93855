//! OCR and cleanup: add a text layer and tidy up the scanned pages.
//!
//! Deskew, background removal and page cleanup are all delegated to the OCR
//! tool. This stage also sets the first metadata: title, author (the
//! company) and the joined keyword list.

use crate::config::{ScanConfig, ScanParameters};
use crate::error::ScanError;
use crate::pipeline::tool::Invocation;
use std::ffi::OsString;
use std::path::Path;
use tracing::info;

/// Arguments for the OCR tool, excluding the input and output files.
pub fn ocr_args(params: &ScanParameters, config: &ScanConfig) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["--deskew", "--clean", "--remove-background", "--rotate-pages"]
        .into_iter()
        .map(OsString::from)
        .collect();

    if let Some(ref lang) = config.ocr_language {
        args.push("--language".into());
        args.push(lang.into());
    }

    // Joined with `=` so a value starting with '-' is never read as a flag.
    args.push(format!("--title={}", params.title).into());
    args.push(format!("--author={}", params.company).into());
    args.push(format!("--keywords={}", params.all_keywords().join(", ")).into());
    args
}

/// Run OCR over `input`, writing a searchable, cleaned PDF to `out`.
pub async fn ocr_pdf(
    params: &ScanParameters,
    config: &ScanConfig,
    input: &Path,
    out: &Path,
) -> Result<(), ScanError> {
    Invocation::new("OCR", &config.programs.ocr)
        .args(ocr_args(params, config))
        .arg(input.as_os_str())
        .arg(out.as_os_str())
        .run()
        .await?;

    info!("OCR complete: {}", out.display());
    Ok(())
}
