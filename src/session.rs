//! One scanning run, start to finish.
//!
//! ```text
//! settings::load ─▶ resolve ─▶ settings::save ─▶ capture ─▶ assemble
//!                     │                                        │
//!            ValidationError (exit 1)            assemble → ocr → metadata → finalize
//! ```
//!
//! Every step is a hard dependency on the previous one and every failure is
//! terminal. Settings are saved before scanning starts, so they persist even
//! when a later stage fails. Working files are only removed on success.

use crate::config::{ScanConfig, ScanParameters};
use crate::error::ScanError;
use crate::operator::Operator;
use crate::pipeline::assemble::assemble_pdf;
use crate::pipeline::capture::{self, PageSequence};
use crate::pipeline::{finalize, metadata, ocr, WorkFiles};
use crate::progress::Stage;
use crate::resolve::{self, CliValues};
use crate::settings;
use serde::Serialize;
use std::future::Future;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub document_name: String,
    pub output_path: PathBuf,
    pub pages: usize,
    pub parameters: ScanParameters,
    pub total_duration_ms: u64,
}

/// Resolve parameters, scan, and assemble the final PDF.
///
/// # Arguments
/// * `cli`         — values given on the command line
/// * `interactive` — offer every field to the operator before scanning
/// * `config`      — devices, directories, collaborator programs
/// * `operator`    — answers field prompts and the between-page question
///
/// # Errors
/// [`ScanError::InvalidParameter`] before any side effect when validation
/// fails; any other variant once scanning has begun.
pub async fn run(
    cli: &CliValues,
    interactive: bool,
    config: &ScanConfig,
    operator: &mut dyn Operator,
) -> Result<RunSummary, ScanError> {
    let total_start = Instant::now();

    // ── Step 1: Resolve parameters ───────────────────────────────────────
    let defaults = settings::load(&config.settings_dir);
    let params = resolve::resolve(cli, &defaults, interactive, operator)?;
    info!("Scanning \"{}\"", params.document_name());

    // ── Step 2: Persist for next time ────────────────────────────────────
    settings::save(&config.settings_dir, &params)?;

    // ── Step 3: Capture pages ────────────────────────────────────────────
    let pages = capture::capture(&params, config, operator).await?;
    info!("Captured {} page(s)", pages.len());

    // ── Step 4: Assemble, OCR, stamp, promote ────────────────────────────
    let output_path = assemble(&pages, &params, config).await?;

    let summary = RunSummary {
        document_name: pages.document_name.clone(),
        output_path,
        pages: pages.len(),
        parameters: params,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };
    info!(
        "Run complete: {} page(s) → {} in {}ms",
        summary.pages,
        summary.output_path.display(),
        summary.total_duration_ms
    );
    Ok(summary)
}

/// Turn captured pages into the final, metadata-stamped PDF.
///
/// Returns the path of the promoted file in the output directory.
pub async fn assemble(
    pages: &PageSequence,
    params: &ScanParameters,
    config: &ScanConfig,
) -> Result<PathBuf, ScanError> {
    if pages.is_empty() {
        return Err(ScanError::NoPagesCaptured);
    }

    let files = WorkFiles::new(&config.work_dir, &pages.document_name);
    let dest = finalize::output_path(&config.output_dir, &pages.document_name);

    run_stage(
        config,
        Stage::Assemble,
        assemble_pdf(pages, config, &files.images_pdf),
    )
    .await?;

    run_stage(
        config,
        Stage::Ocr,
        ocr::ocr_pdf(params, config, &files.images_pdf, &files.ocr_pdf),
    )
    .await?;

    run_stage(
        config,
        Stage::Metadata,
        metadata::stamp_metadata(params, config, &files.ocr_pdf, &files.info, &files.final_pdf),
    )
    .await?;

    run_stage(config, Stage::Finalize, async {
        finalize::promote(&files.final_pdf, &dest).await?;
        finalize::clean_up(pages, &files).await
    })
    .await?;

    Ok(dest)
}

/// Await one stage, timing it and notifying the progress callback.
async fn run_stage<T>(
    config: &ScanConfig,
    stage: Stage,
    fut: impl Future<Output = Result<T, ScanError>>,
) -> Result<T, ScanError> {
    if let Some(ref cb) = config.progress_callback {
        cb.on_stage_start(stage);
    }
    info!("{}…", stage);

    let start = Instant::now();
    let value = fut.await?;
    let elapsed_ms = start.elapsed().as_millis() as u64;

    if let Some(ref cb) = config.progress_callback {
        cb.on_stage_complete(stage, elapsed_ms);
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PageLimit, PageSize};

    #[test]
    fn test_summary_json_shape() {
        let summary = RunSummary {
            document_name: "2020-01-05, Costco receipt".into(),
            output_path: PathBuf::from("/archive/2020-01-05, Costco receipt.pdf"),
            pages: 2,
            parameters: ScanParameters {
                date: "2020-01-05".into(),
                title: "Costco receipt".into(),
                subject: String::new(),
                company: String::new(),
                keywords: vec![],
                page_size: PageSize::Letter,
                page_limit: PageLimit::Unbounded,
            },
            total_duration_ms: 4200,
        };

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["document_name"], "2020-01-05, Costco receipt");
        assert_eq!(json["output_path"], "/archive/2020-01-05, Costco receipt.pdf");
        assert_eq!(json["pages"], 2);
        assert_eq!(json["parameters"]["page_size"], "letter");
        assert_eq!(json["parameters"]["page_limit"], "Unbounded");
    }

    #[tokio::test]
    async fn test_assemble_rejects_empty_sequence() {
        let config = ScanConfig::builder()
            .work_dir("/tmp/docscan-work")
            .build()
            .unwrap();
        let pages = PageSequence {
            document_name: "2020-01-05, Costco receipt".into(),
            pages: Vec::new(),
        };
        let params = ScanParameters {
            date: "2020-01-05".into(),
            title: "Costco receipt".into(),
            subject: String::new(),
            company: String::new(),
            keywords: vec![],
            page_size: PageSize::Auto,
            page_limit: PageLimit::Unbounded,
        };
        let err = assemble(&pages, &params, &config).await.unwrap_err();
        assert!(matches!(err, ScanError::NoPagesCaptured));
    }
}
