//! Subprocess invocation for the external collaborators.
//!
//! Every stage of the workflow is an external program. This module runs one
//! to completion and turns the two ways it can go wrong into [`ScanError`]s:
//! it could not be started ([`ScanError::CollaboratorNotFound`]) or it exited
//! non-zero ([`ScanError::CollaboratorFailed`], carrying its stderr).

use crate::error::ScanError;
use std::ffi::OsString;
use std::path::Path;
use std::process::{Output, Stdio};
use tokio::process::Command;
use tracing::debug;

/// One collaborator command line.
#[derive(Debug, Clone)]
pub struct Invocation<'a> {
    /// Human-readable role, used in error messages ("Scanner", "OCR", …).
    pub tool: &'static str,
    pub program: &'a Path,
    pub args: Vec<OsString>,
}

impl<'a> Invocation<'a> {
    pub fn new(tool: &'static str, program: &'a Path) -> Self {
        Self {
            tool,
            program,
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Run to completion and return the raw output, whatever the exit status.
    ///
    /// Fails only when the program cannot be started.
    pub async fn output(&self) -> Result<Output, ScanError> {
        debug!(
            "{}: {} {}",
            self.tool,
            self.program.display(),
            self.args
                .iter()
                .map(|a| a.to_string_lossy())
                .collect::<Vec<_>>()
                .join(" ")
        );

        Command::new(self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| ScanError::CollaboratorNotFound {
                tool: self.tool,
                program: self.program.display().to_string(),
                detail: e.to_string(),
            })
    }

    /// Run to completion, failing on a non-zero exit status.
    pub async fn run(&self) -> Result<Output, ScanError> {
        let output = self.output().await?;
        if output.status.success() {
            Ok(output)
        } else {
            Err(failure(self.tool, &output))
        }
    }
}

/// Build a [`ScanError::CollaboratorFailed`] from an unsuccessful run.
pub fn failure(tool: &'static str, output: &Output) -> ScanError {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    ScanError::CollaboratorFailed {
        tool,
        status: output.status.to_string(),
        stderr: if stderr.is_empty() {
            "(no error output)".to_string()
        } else {
            stderr
        },
    }
}
