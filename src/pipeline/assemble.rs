//! Raster-to-PDF assembly: page images, in capture order, into one PDF.

use crate::config::ScanConfig;
use crate::error::ScanError;
use crate::pipeline::capture::PageSequence;
use crate::pipeline::tool::Invocation;
use std::path::Path;
use tracing::info;

/// Concatenate every page of `pages` into `out`.
pub async fn assemble_pdf(
    pages: &PageSequence,
    config: &ScanConfig,
    out: &Path,
) -> Result<(), ScanError> {
    if pages.is_empty() {
        return Err(ScanError::NoPagesCaptured);
    }

    Invocation::new("PDF assembler", &config.programs.assembler)
        .args(pages.pages.iter().map(|p| p.as_os_str().to_owned()))
        .arg(out.as_os_str())
        .run()
        .await?;

    info!("Assembled {} page(s) into {}", pages.len(), out.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_sequence_never_invokes_assembler() {
        let config = ScanConfig::builder()
            .work_dir("/tmp/docscan-work")
            .assembler_program("/nonexistent/convert")
            .build()
            .unwrap();
        let pages = PageSequence {
            document_name: "2020-01-05, Costco receipt".into(),
            pages: Vec::new(),
        };

        let err = tokio_test::block_on(assemble_pdf(&pages, &config, Path::new("/tmp/out.pdf")))
            .unwrap_err();
        assert!(matches!(err, ScanError::NoPagesCaptured));
    }
}
