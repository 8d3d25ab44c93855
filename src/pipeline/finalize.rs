//! Promote the finished PDF into the output directory and clean up.
//!
//! This is the only place the output directory is written to, so a failure
//! anywhere earlier leaves it untouched.

use crate::error::ScanError;
use crate::pipeline::capture::PageSequence;
use crate::pipeline::WorkFiles;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Output path for `document_name` inside `output_dir`.
pub fn output_path(output_dir: &Path, document_name: &str) -> PathBuf {
    output_dir.join(format!("{document_name}.pdf"))
}

/// Move `finished` to `dest`.
///
/// A plain rename when both live on the same filesystem; otherwise the file
/// is copied next to `dest` under a temporary name and renamed into place so
/// `dest` never exists half-written.
pub async fn promote(finished: &Path, dest: &Path) -> Result<(), ScanError> {
    let out_err = |e: std::io::Error| ScanError::OutputWriteFailed {
        path: dest.to_path_buf(),
        source: e,
    };

    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(out_err)?;
    }

    if tokio::fs::try_exists(dest).await.unwrap_or(false) {
        warn!("Replacing existing {}", dest.display());
    }

    if tokio::fs::rename(finished, dest).await.is_ok() {
        return Ok(());
    }

    debug!("Rename failed; copying {} across filesystems", finished.display());
    let tmp_path = dest.with_extension("pdf.tmp");
    if let Err(e) = copy_into_place(finished, &tmp_path, dest).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(out_err(e));
    }
    tokio::fs::remove_file(finished).await.map_err(|e| ScanError::WorkDir {
        path: finished.to_path_buf(),
        source: e,
    })?;
    Ok(())
}

async fn copy_into_place(finished: &Path, tmp_path: &Path, dest: &Path) -> std::io::Result<()> {
    tokio::fs::copy(finished, tmp_path).await?;
    tokio::fs::rename(tmp_path, dest).await
}

/// Remove every page image and intermediate file of this document.
pub async fn clean_up(pages: &PageSequence, files: &WorkFiles) -> Result<(), ScanError> {
    let targets = pages
        .pages
        .iter()
        .map(PathBuf::as_path)
        .chain(files.all());

    let mut removed = 0usize;
    for path in targets {
        match tokio::fs::remove_file(path).await {
            Ok(()) => removed += 1,
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                return Err(ScanError::WorkDir {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
        }
    }

    info!("Removed {} working file(s)", removed);
    Ok(())
}
