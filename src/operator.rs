//! Operator interaction: editable field prompts and the between-page keypress.
//!
//! The resolver and the scan loop talk to the person at the scanner only
//! through the [`Operator`] trait, so a run can be driven from a terminal
//! ([`ConsoleOperator`]) or from a script in tests.

use console::{style, Key, Term};
use std::io::{self, BufRead};
use tokio::runtime::{Handle, RuntimeFlavor};

/// The person standing at the scanner.
pub trait Operator {
    /// Offer `current` for editing under `label` and return the response.
    ///
    /// The caller trims the response; an empty answer keeps `current`.
    fn edit(&mut self, label: &str, current: &str) -> io::Result<String>;

    /// Ask whether to scan another page after `captured` pages.
    /// `false` means the operator pressed the stop key.
    fn next_page(&mut self, captured: usize) -> io::Result<bool>;
}

/// Terminal-backed operator writing prompts to stderr.
///
/// On a TTY fields are edited in place (the current value is pre-filled) and
/// the between-page question takes a single keypress: `q` or Esc stops, any
/// other key continues. Without a TTY both fall back to reading a line from
/// stdin, and end of input stops the scan.
pub struct ConsoleOperator {
    term: Term,
}

impl ConsoleOperator {
    pub fn new() -> Self {
        Self {
            term: Term::stderr(),
        }
    }

    /// `None` at end of input.
    fn read_stdin_line(&self) -> io::Result<Option<String>> {
        let mut line = String::new();
        match blocking(|| io::stdin().lock().read_line(&mut line))? {
            0 => Ok(None),
            _ => Ok(Some(line)),
        }
    }
}

/// Run a blocking terminal read.
///
/// On a multi-threaded runtime the worker hands its other tasks off first
/// (`block_in_place`); a current-thread runtime or no runtime at all just
/// blocks.
fn blocking<T>(read: impl FnOnce() -> T) -> T {
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(read)
        }
        _ => read(),
    }
}

impl Default for ConsoleOperator {
    fn default() -> Self {
        Self::new()
    }
}

impl Operator for ConsoleOperator {
    fn edit(&mut self, label: &str, current: &str) -> io::Result<String> {
        if self.term.is_term() {
            self.term.write_str(&format!("{} ", style(format!("{label}:")).bold()))?;
            blocking(|| self.term.read_line_initial_text(current))
        } else {
            self.term.write_line(&format!("{label} [{current}]: "))?;
            Ok(self.read_stdin_line()?.unwrap_or_default())
        }
    }

    fn next_page(&mut self, captured: usize) -> io::Result<bool> {
        let prompt = format!(
            "{} {captured} page(s) scanned. Load the next page and press any key, or {} to finish.",
            style("◆").cyan(),
            style("q").bold()
        );
        self.term.write_line(&prompt)?;

        if self.term.is_term() {
            let key = blocking(|| self.term.read_key())?;
            Ok(!matches!(key, Key::Escape | Key::Char('q') | Key::Char('Q')))
        } else {
            // Closed stdin stops the scan like the stop key.
            Ok(self
                .read_stdin_line()?
                .is_some_and(|line| !line.trim().eq_ignore_ascii_case("q")))
        }
    }
}
