//! Settings Store: last-used document fields, one plain-text file per field.
//!
//! ```text
//! ~/.config/docscan/
//!   ├─ date        2020-01-05
//!   ├─ title       Costco receipt
//!   ├─ subject
//!   ├─ company
//!   ├─ keywords    one keyword per line
//!   └─ page_size   letter
//! ```
//!
//! [`load`] never fails: anything missing or unreadable comes back empty.
//! [`save`] overwrites every field unconditionally and is called before the
//! scan starts, so the values survive a run that fails later on.

use crate::config::ScanParameters;
use crate::error::ScanError;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const DATE: &str = "date";
const TITLE: &str = "title";
const SUBJECT: &str = "subject";
const COMPANY: &str = "company";
const KEYWORDS: &str = "keywords";
const PAGE_SIZE: &str = "page_size";

/// Last-used values of every persisted field. Missing fields are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedDefaults {
    pub date: String,
    pub title: String,
    pub subject: String,
    pub company: String,
    pub keywords: Vec<String>,
    /// Kept as text: a hand-edited file may hold an unrecognised size, which
    /// is reported by validation rather than silently dropped.
    pub page_size: String,
}

/// Default settings directory: `config_dir()/docscan`.
///
/// Override by setting `DOCSCAN_SETTINGS_DIR`.
pub fn settings_dir() -> PathBuf {
    if let Ok(override_dir) = std::env::var("DOCSCAN_SETTINGS_DIR") {
        if !override_dir.is_empty() {
            return PathBuf::from(override_dir);
        }
    }

    dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
        .unwrap_or_else(std::env::temp_dir)
        .join("docscan")
}

/// Read the persisted defaults from `dir`.
pub fn load(dir: &Path) -> PersistedDefaults {
    let defaults = PersistedDefaults {
        date: read_field(dir, DATE),
        title: read_field(dir, TITLE),
        subject: read_field(dir, SUBJECT),
        company: read_field(dir, COMPANY),
        keywords: split_keywords(&read_field(dir, KEYWORDS)),
        page_size: read_field(dir, PAGE_SIZE),
    };
    debug!("Loaded settings from {}: {:?}", dir.display(), defaults);
    defaults
}

/// Overwrite every persisted field in `dir` with the values in `params`.
///
/// Keywords are stored trimmed, with blank ones dropped, so what [`load`]
/// returns is exactly what was written. The page limit is not persisted.
pub fn save(dir: &Path, params: &ScanParameters) -> Result<(), ScanError> {
    std::fs::create_dir_all(dir).map_err(|e| ScanError::SettingsWriteFailed {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let fields = [
        (DATE, params.date.clone()),
        (TITLE, params.title.clone()),
        (SUBJECT, params.subject.clone()),
        (COMPANY, params.company.clone()),
        (KEYWORDS, join_keywords(&params.keywords)),
        (PAGE_SIZE, params.page_size.to_string()),
    ];

    for (name, value) in fields {
        let path = dir.join(name);
        std::fs::write(&path, format!("{value}\n"))
            .map_err(|e| ScanError::SettingsWriteFailed { path, source: e })?;
    }

    debug!("Saved settings to {}", dir.display());
    Ok(())
}

fn read_field(dir: &Path, name: &str) -> String {
    let path = dir.join(name);
    match std::fs::read_to_string(&path) {
        Ok(s) => s.trim_end_matches(['\n', '\r']).to_string(),
        Err(e) if e.kind() == ErrorKind::NotFound => String::new(),
        Err(e) => {
            warn!("Ignoring unreadable setting {}: {}", path.display(), e);
            String::new()
        }
    }
}

// Keywords are newline-delimited, so a keyword may contain commas. They are
// normalised the same way `split_keywords` reads them back.
fn join_keywords(keywords: &[String]) -> String {
    keywords
        .iter()
        .map(|k| k.replace(['\n', '\r'], " ").trim().to_string())
        .filter(|k| !k.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn split_keywords(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}
