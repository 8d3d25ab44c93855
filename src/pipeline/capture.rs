//! Scan Loop: drive the scanner driver one page at a time.
//!
//! ```text
//! ┌──────────────┐  ok   ┌────────────┐  limit reached ──▶ done
//! │ driver call  │──────▶│ write page │──┤
//! └──────────────┘       └────────────┘  └─▶ operator: any key ─▶ loop
//!        │ non-zero                                   q / Esc ─▶ done
//!        ▼
//!      done (device exhausted, e.g. ADF empty)
//! ```
//!
//! A failing driver is the normal way an automatic document feeder says
//! "no more paper", so it ends the loop without an error. The page file is
//! only written after the driver succeeds, so no partial page is left behind.

use crate::config::{ScanConfig, ScanParameters};
use crate::error::ScanError;
use crate::operator::Operator;
use crate::pipeline::tool::Invocation;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Raw image format requested from the driver.
pub const PAGE_FORMAT: &str = "pnm";

/// Captured page images, in capture order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageSequence {
    /// Base name the pages were written under.
    pub document_name: String,
    pub pages: Vec<PathBuf>,
}

impl PageSequence {
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

/// Path of 1-indexed page `index` inside `work_dir`.
pub fn page_path(work_dir: &Path, document_name: &str, index: usize) -> PathBuf {
    work_dir.join(format!("{document_name}-page-{index:03}.{PAGE_FORMAT}"))
}

/// Driver arguments for one page.
pub fn device_args(params: &ScanParameters, config: &ScanConfig) -> Vec<OsString> {
    let mut args: Vec<OsString> = Vec::new();
    if let Some(ref device) = config.device {
        args.push("--device-name".into());
        args.push(device.into());
    }
    if let Some(ref source) = config.source {
        args.push("--source".into());
        args.push(source.into());
    }
    args.push("--resolution".into());
    args.push(config.resolution.to_string().into());
    args.push("--mode".into());
    args.push(config.mode.clone().into());
    args.push(format!("--format={PAGE_FORMAT}").into());
    if let Some((w, h)) = params.page_size.dimensions_mm() {
        args.push("-x".into());
        args.push(w.to_string().into());
        args.push("-y".into());
        args.push(h.to_string().into());
    }
    args
}

/// Capture pages until the limit, device exhaustion, or an operator stop.
pub async fn capture(
    params: &ScanParameters,
    config: &ScanConfig,
    operator: &mut dyn Operator,
) -> Result<PageSequence, ScanError> {
    let work_dir = &config.work_dir;
    tokio::fs::create_dir_all(work_dir)
        .await
        .map_err(|e| ScanError::WorkDir {
            path: work_dir.clone(),
            source: e,
        })?;

    let mut seq = PageSequence {
        document_name: params.document_name(),
        pages: Vec::new(),
    };

    if let Some(ref cb) = config.progress_callback {
        cb.on_scan_start(match params.page_limit {
            crate::config::PageLimit::Unbounded => None,
            crate::config::PageLimit::Pages(n) => Some(n.get()),
        });
    }

    let driver = Invocation::new("Scanner", &config.programs.scanner)
        .args(device_args(params, config));

    loop {
        let index = seq.len() + 1;
        let output = driver.output().await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(
                "Scanner stopped before page {} ({}): {}",
                index,
                output.status,
                stderr.trim()
            );
            break;
        }

        let path = page_path(work_dir, &seq.document_name, index);
        tokio::fs::write(&path, &output.stdout)
            .await
            .map_err(|e| ScanError::WorkDir {
                path: path.clone(),
                source: e,
            })?;
        info!("Captured page {} → {}", index, path.display());

        if let Some(ref cb) = config.progress_callback {
            cb.on_page_captured(index, &path);
        }
        seq.pages.push(path);

        if params.page_limit.is_reached(seq.len()) {
            info!("Page limit of {} reached", seq.len());
            break;
        }
        if !operator.next_page(seq.len()).map_err(ScanError::Prompt)? {
            info!("Operator finished after {} page(s)", seq.len());
            break;
        }
    }

    if let Some(ref cb) = config.progress_callback {
        cb.on_scan_complete(seq.len());
    }

    Ok(seq)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PageLimit, PageSize};

    fn params(page_size: PageSize) -> ScanParameters {
        ScanParameters {
            date: "2020-01-05".into(),
            title: "Costco receipt".into(),
            subject: String::new(),
            company: String::new(),
            keywords: vec![],
            page_size,
            page_limit: PageLimit::Unbounded,
        }
    }

    fn strings(args: Vec<OsString>) -> Vec<String> {
        args.into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_page_path_is_zero_padded() {
        let p = page_path(Path::new("/work"), "2020-01-05, Costco receipt", 7);
        assert_eq!(p, PathBuf::from("/work/2020-01-05, Costco receipt-page-007.pnm"));
    }

    #[test]
    fn test_device_args_letter() {
        let config = ScanConfig::builder()
            .device("epson2:net:10.0.0.5")
            .resolution(300)
            .build()
            .unwrap();
        let args = strings(device_args(&params(PageSize::Letter), &config));
        assert_eq!(
            args,
            vec![
                "--device-name",
                "epson2:net:10.0.0.5",
                "--resolution",
                "300",
                "--mode",
                "Color",
                "--format=pnm",
                "-x",
                "215.9",
                "-y",
                "279.4",
            ]
        );
    }

    #[test]
    fn test_device_args_auto_has_no_dimensions() {
        let config = ScanConfig::builder()
            .source("ADF Duplex")
            .mode("Gray")
            .build()
            .unwrap();
        let args = strings(device_args(&params(PageSize::Auto), &config));
        assert!(!args.contains(&"-x".to_string()));
        assert!(args.windows(2).any(|w| w == ["--source", "ADF Duplex"]));
        assert!(args.windows(2).any(|w| w == ["--mode", "Gray"]));
    }

    #[test]
    fn test_device_args_legal_height() {
        let config = ScanConfig::default();
        let args = strings(device_args(&params(PageSize::Legal), &config));
        assert!(args.windows(2).any(|w| w == ["-y", "355.6"]));
    }
}
