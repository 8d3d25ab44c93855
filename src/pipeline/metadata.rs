//! PDF info block: dump, append custom fields, reapply.
//!
//! The metadata tool speaks a line-oriented key/value format:
//!
//! ```text
//! InfoBegin
//! InfoKey: Title
//! InfoValue: Costco receipt
//! NumberOfPages: 2
//! ```
//!
//! The dump is kept as-is and the custom records are appended after it, so
//! everything the OCR stage wrote (title, author, keywords) survives.

use crate::config::{ScanConfig, ScanParameters};
use crate::error::ScanError;
use crate::pipeline::tool::Invocation;
use chrono::{DateTime, Local, SecondsFormat};
use std::path::Path;
use tracing::{debug, info};

/// Custom info fields recorded for every scan, in write order.
pub fn custom_fields(
    params: &ScanParameters,
    config: &ScanConfig,
    scanned_at: DateTime<Local>,
) -> Vec<(&'static str, String)> {
    vec![
        ("ScannedBy", config.scanned_by.clone()),
        ("ScanDate", scanned_at.to_rfc3339_opts(SecondsFormat::Secs, false)),
        ("Company", params.company.clone()),
        ("Subject", params.subject.clone()),
    ]
}

/// Append `fields` to a dumped info block.
///
/// Values are flattened to a single line; the format has no escaping for
/// line breaks.
pub fn augment_info(dump: &str, fields: &[(&str, String)]) -> String {
    let mut out = String::with_capacity(dump.len() + fields.len() * 48);
    out.push_str(dump);
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    for (key, value) in fields {
        let value = value.replace(['\r', '\n'], " ");
        out.push_str("InfoBegin\n");
        out.push_str(&format!("InfoKey: {key}\n"));
        out.push_str(&format!("InfoValue: {value}\n"));
    }
    out
}

/// Dump the info block of `input`, augment it, and write the result to `out`.
pub async fn stamp_metadata(
    params: &ScanParameters,
    config: &ScanConfig,
    input: &Path,
    info_file: &Path,
    out: &Path,
) -> Result<(), ScanError> {
    let pdftk = &config.programs.pdf_metadata;

    let dump = Invocation::new("PDF metadata dump", pdftk)
        .arg(input.as_os_str())
        .arg("dump_data_utf8")
        .run()
        .await?;
    let dump = String::from_utf8_lossy(&dump.stdout);
    debug!("Dumped {} bytes of metadata from {}", dump.len(), input.display());

    let info = augment_info(&dump, &custom_fields(params, config, Local::now()));
    tokio::fs::write(info_file, info)
        .await
        .map_err(|e| ScanError::WorkDir {
            path: info_file.to_path_buf(),
            source: e,
        })?;

    Invocation::new("PDF metadata update", pdftk)
        .arg(input.as_os_str())
        .arg("update_info_utf8")
        .arg(info_file.as_os_str())
        .arg("output")
        .arg(out.as_os_str())
        .run()
        .await?;

    info!("Metadata written: {}", out.display());
    Ok(())
}
