//! Argument Resolver: CLI flags + persisted defaults (+ prompts) → parameters.
//!
//! Resolution happens in three steps, each independently testable:
//!
//! 1. [`candidate`] — pure merge; every field is the CLI value when given,
//!    otherwise the persisted value, otherwise empty.
//! 2. [`prompt`] — only in interactive mode: each field is offered to the
//!    operator pre-filled with the candidate; an empty answer keeps it.
//! 3. [`validate`] — date, title and page size are checked and the result
//!    becomes an immutable [`ScanParameters`].

use crate::config::{PageLimit, PageSize, ScanParameters};
use crate::error::ScanError;
use crate::operator::Operator;
use crate::settings::PersistedDefaults;
use tracing::debug;

/// Values supplied on the command line. `None` / empty means "not given".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliValues {
    pub date: Option<String>,
    pub title: Option<String>,
    /// `--who`
    pub subject: Option<String>,
    pub company: Option<String>,
    /// `--keyword`, repeatable.
    pub keywords: Vec<String>,
    pub page_size: Option<String>,
    /// `--multipage`
    pub page_limit: Option<PageLimit>,
}

/// Merged but not yet validated field values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Candidate {
    pub date: String,
    pub title: String,
    pub subject: String,
    pub company: String,
    pub keywords: Vec<String>,
    pub page_size: String,
    pub page_limit: PageLimit,
}

/// Merge CLI values over persisted defaults.
pub fn candidate(cli: &CliValues, defaults: &PersistedDefaults) -> Candidate {
    let pick = |v: &Option<String>, d: &str| v.clone().unwrap_or_else(|| d.to_string());

    Candidate {
        date: pick(&cli.date, &defaults.date),
        title: pick(&cli.title, &defaults.title),
        subject: pick(&cli.subject, &defaults.subject),
        company: pick(&cli.company, &defaults.company),
        keywords: if cli.keywords.is_empty() {
            defaults.keywords.clone()
        } else {
            cli.keywords.clone()
        },
        page_size: pick(&cli.page_size, &defaults.page_size),
        page_limit: cli.page_limit.unwrap_or_default(),
    }
}

/// Offer every field to the operator for editing.
pub fn prompt(mut c: Candidate, operator: &mut dyn Operator) -> Result<Candidate, ScanError> {
    let mut ask = |label: &str, current: &str| -> Result<String, ScanError> {
        let answer = operator.edit(label, current).map_err(ScanError::Prompt)?;
        let answer = answer.trim();
        Ok(if answer.is_empty() {
            current.to_string()
        } else {
            answer.to_string()
        })
    };

    c.date = ask("Date (YYYY-MM-DD)", &c.date)?;
    c.title = ask("Title", &c.title)?;
    c.subject = ask("Who", &c.subject)?;
    c.company = ask("Company", &c.company)?;

    let joined = c.keywords.join(", ");
    let keywords = ask("Keywords (comma separated)", &joined)?;
    if keywords != joined {
        c.keywords = keywords
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect();
    }

    c.page_size = ask("Page size (letter, legal, auto)", &c.page_size)?;

    let limit = c.page_limit.to_string();
    let answer = ask("Page limit (empty = no limit)", &limit)?;
    if answer != limit {
        c.page_limit = answer.parse()?;
    }

    Ok(c)
}

/// Check a candidate and freeze it into [`ScanParameters`].
pub fn validate(c: Candidate) -> Result<ScanParameters, ScanError> {
    let page_size = c.page_size.parse::<PageSize>();

    let params = ScanParameters {
        date: c.date,
        title: c.title,
        subject: c.subject,
        company: c.company,
        keywords: c.keywords,
        page_size: page_size.as_ref().ok().copied().unwrap_or_default(),
        page_limit: c.page_limit,
    };
    params.validate()?;

    Ok(ScanParameters {
        page_size: page_size?,
        ..params
    })
}

/// Run the whole resolution: merge, optionally prompt, validate.
pub fn resolve(
    cli: &CliValues,
    defaults: &PersistedDefaults,
    interactive: bool,
    operator: &mut dyn Operator,
) -> Result<ScanParameters, ScanError> {
    let mut c = candidate(cli, defaults);
    debug!("Candidate parameters: {:?}", c);

    if interactive {
        c = prompt(c, operator)?;
    }

    validate(c)
}
