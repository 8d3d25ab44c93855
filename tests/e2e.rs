//! End-to-end tests for docscan.
//!
//! The real pipeline runs against tiny shell scripts standing in for
//! `scanimage`, `convert`, `ocrmypdf` and `pdftk`. Each test gets its own
//! directory of symlinks to those scripts; a script records its arguments
//! next to the symlink it was invoked through, outside the working directory,
//! so tests can check what was asked of it without leaving leftovers.
//!
//! Run with:
//!   RUST_LOG=docscan=debug cargo test --test e2e -- --nocapture

#![cfg(unix)]

use docscan::{
    run, settings, CliValues, Operator, PageLimit, PageSize, ScanConfig, ScanError,
};
use std::fs;
use std::io;
use std::num::NonZeroU32;
use std::os::unix::fs::{symlink, PermissionsExt};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tempfile::TempDir;
use tracing_subscriber::EnvFilter;

// ── Test helpers ─────────────────────────────────────────────────────────────

// Scripts keep their state next to `$0`, which is a per-test symlink.
const SCANNER: &str = r#"#!/bin/sh
dir=$(dirname "$0")
fail_on=$(cat "$dir/fail_on")
n=$(cat "$dir/scanner.count" 2>/dev/null || echo 0)
n=$((n + 1))
echo "$n" > "$dir/scanner.count"
echo "$@" >> "$dir/scanner.args"
if [ "$fail_on" -ne 0 ] && [ "$n" -ge "$fail_on" ]; then
  echo "scanimage: sane_start: Document feeder out of documents" >&2
  exit 7
fi
printf 'P5\n1 1\n255\n\001'
"#;

const ASSEMBLER: &str = r#"#!/bin/sh
dir=$(dirname "$0")
for last; do :; done
for arg; do
  if [ "$arg" != "$last" ]; then
    cat "$arg" > /dev/null || exit 1
    echo "$arg" >> "$dir/assembler.args"
  fi
done
printf '%%PDF-1.4 images\n' > "$last"
"#;

const OCR: &str = r#"#!/bin/sh
dir=$(dirname "$0")
printf '%s\n' "$@" > "$dir/ocr.args"
in=""; out=""
for arg; do in="$out"; out="$arg"; done
cp "$in" "$out"
"#;

const OCR_FAILING: &str = r#"#!/bin/sh
echo "ocrmypdf: page 1 is too small to OCR" >&2
exit 2
"#;

const PDFTK: &str = r#"#!/bin/sh
dir=$(dirname "$0")
case "$2" in
  dump_data_utf8)
    printf 'InfoBegin\nInfoKey: Title\nInfoValue: Costco receipt\nNumberOfPages: 2\n'
    ;;
  update_info_utf8)
    cp "$3" "$dir/pdftk.info"
    cp "$1" "$5"
    ;;
  *)
    echo "unexpected pdftk call: $*" >&2
    exit 1
    ;;
esac
"#;

/// Write every fake collaborator once per test process.
///
/// Tests only symlink to these files. Writing an executable while another
/// test thread is spawning a child can make exec fail with ETXTBSY.
fn scripts_dir() -> &'static Path {
    static SCRIPTS: OnceLock<TempDir> = OnceLock::new();
    SCRIPTS
        .get_or_init(|| {
            let dir = tempfile::tempdir().unwrap();
            for (name, body) in [
                ("scanner", SCANNER),
                ("assembler", ASSEMBLER),
                ("ocr", OCR),
                ("ocr-failing", OCR_FAILING),
                ("pdftk", PDFTK),
            ] {
                let path = dir.path().join(name);
                fs::write(&path, body).unwrap();
                fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
            }
            dir
        })
        .path()
}

/// Route library logs through the test harness so `RUST_LOG` shows each
/// collaborator command line next to the failing test.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A scratch area with fake collaborators and separate work/output/settings dirs.
struct Bench {
    _tmp: TempDir,
    bin: PathBuf,
    work: PathBuf,
    output: PathBuf,
    settings: PathBuf,
}

impl Bench {
    /// `fail_on`: scanner call number that reports "out of documents" (0 = never).
    fn new(fail_on: u32) -> Self {
        init_tracing();
        let tmp = tempfile::tempdir().unwrap();
        let bin = tmp.path().join("bin");
        fs::create_dir_all(&bin).unwrap();
        fs::write(bin.join("fail_on"), fail_on.to_string()).unwrap();

        let bench = Self {
            bin,
            work: tmp.path().join("work"),
            output: tmp.path().join("archive"),
            settings: tmp.path().join("settings"),
            _tmp: tmp,
        };
        for name in ["scanner", "assembler", "ocr", "pdftk"] {
            bench.link(name, name);
        }
        bench
    }

    fn link(&self, name: &str, target: &str) {
        let path = self.bin.join(name);
        let _ = fs::remove_file(&path);
        symlink(scripts_dir().join(target), path).unwrap();
    }

    fn config(&self) -> ScanConfig {
        ScanConfig::builder()
            .work_dir(&self.work)
            .output_dir(&self.output)
            .settings_dir(&self.settings)
            .scanned_by("tester")
            .scanner_program(self.bin.join("scanner"))
            .assembler_program(self.bin.join("assembler"))
            .ocr_program(self.bin.join("ocr"))
            .pdf_metadata_program(self.bin.join("pdftk"))
            .build()
            .unwrap()
    }

    fn scanner_calls(&self) -> u32 {
        fs::read_to_string(self.bin.join("scanner.count"))
            .map(|s| s.trim().parse().unwrap())
            .unwrap_or(0)
    }

    fn recorded(&self, name: &str) -> String {
        fs::read_to_string(self.bin.join(name)).unwrap_or_default()
    }
}

fn entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = match fs::read_dir(dir) {
        Ok(rd) => rd
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect(),
        Err(_) => Vec::new(),
    };
    names.sort();
    names
}

fn receipt() -> CliValues {
    CliValues {
        date: Some("2020-01-05".into()),
        title: Some("Costco receipt".into()),
        page_size: Some("letter".into()),
        ..Default::default()
    }
}

/// Presses "continue" until `stop_after` pages, never edits a field.
struct ScriptedOperator {
    stop_after: Option<usize>,
    asked: usize,
}

impl ScriptedOperator {
    fn keep_going() -> Self {
        Self {
            stop_after: None,
            asked: 0,
        }
    }

    fn stop_after(n: usize) -> Self {
        Self {
            stop_after: Some(n),
            asked: 0,
        }
    }
}

impl Operator for ScriptedOperator {
    fn edit(&mut self, _label: &str, _current: &str) -> io::Result<String> {
        Ok(String::new())
    }

    fn next_page(&mut self, captured: usize) -> io::Result<bool> {
        self.asked += 1;
        Ok(self.stop_after.map_or(true, |n| captured < n))
    }
}

// ── Full runs ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_two_pages_then_feeder_empty() {
    let bench = Bench::new(3);
    let mut op = ScriptedOperator::keep_going();

    let summary = run(&receipt(), false, &bench.config(), &mut op)
        .await
        .expect("run should succeed");

    assert_eq!(summary.pages, 2);
    assert_eq!(summary.document_name, "2020-01-05, Costco receipt");
    assert_eq!(
        summary.output_path,
        bench.output.join("2020-01-05, Costco receipt.pdf")
    );
    assert_eq!(entries(&bench.output), ["2020-01-05, Costco receipt.pdf"]);
    assert_eq!(
        fs::read_to_string(&summary.output_path).unwrap(),
        "%PDF-1.4 images\n"
    );
    assert!(entries(&bench.work).is_empty(), "leftovers: {:?}", entries(&bench.work));

    assert_eq!(bench.scanner_calls(), 3);
    assert_eq!(op.asked, 2);
}

#[tokio::test]
async fn test_collaborators_receive_expected_arguments() {
    let bench = Bench::new(3);
    let cli = CliValues {
        subject: Some("Alice".into()),
        company: Some("Costco".into()),
        keywords: vec!["receipt".into()],
        ..receipt()
    };
    run(&cli, false, &bench.config(), &mut ScriptedOperator::keep_going())
        .await
        .unwrap();

    let scanner = bench.recorded("scanner.args");
    assert!(
        scanner.contains("--resolution 300 --mode Color --format=pnm -x 215.9 -y 279.4"),
        "scanner args: {scanner}"
    );

    let pages: Vec<String> = bench
        .recorded("assembler.args")
        .lines()
        .map(|l| Path::new(l).file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        pages,
        [
            "2020-01-05, Costco, Alice, Costco receipt-page-001.pnm",
            "2020-01-05, Costco, Alice, Costco receipt-page-002.pnm",
        ]
    );

    let ocr = bench.recorded("ocr.args");
    assert!(ocr.contains("--title=Costco receipt\n"), "ocr args: {ocr}");
    assert!(ocr.contains("--author=Costco\n"), "ocr args: {ocr}");
    assert!(ocr.contains("--keywords=receipt, Alice, Costco\n"), "ocr args: {ocr}");

    let info = bench.recorded("pdftk.info");
    assert!(info.starts_with("InfoBegin\nInfoKey: Title\n"), "info: {info}");
    assert!(info.contains("InfoKey: ScannedBy\nInfoValue: tester\n"));
    assert!(info.contains("InfoKey: ScanDate\nInfoValue: "));
    assert!(info.contains("InfoKey: Company\nInfoValue: Costco\n"));
    assert!(info.contains("InfoKey: Subject\nInfoValue: Alice\n"));

    assert_eq!(
        entries(&bench.output),
        ["2020-01-05, Costco, Alice, Costco receipt.pdf"]
    );
}

#[tokio::test]
async fn test_settings_saved_and_reused() {
    let bench = Bench::new(2);
    run(&receipt(), false, &bench.config(), &mut ScriptedOperator::keep_going())
        .await
        .unwrap();

    let saved = settings::load(&bench.settings);
    assert_eq!(saved.date, "2020-01-05");
    assert_eq!(saved.title, "Costco receipt");
    assert_eq!(saved.company, "");
    assert_eq!(saved.subject, "");
    assert!(saved.keywords.is_empty());
    assert_eq!(saved.page_size, "letter");

    // Second run with no flags at all picks everything up from the store.
    let bench2 = Bench::new(2);
    let config = ScanConfig {
        settings_dir: bench.settings.clone(),
        ..bench2.config()
    };
    let summary = run(
        &CliValues::default(),
        false,
        &config,
        &mut ScriptedOperator::keep_going(),
    )
    .await
    .unwrap();
    assert_eq!(summary.document_name, "2020-01-05, Costco receipt");
    assert_eq!(summary.parameters.page_size, PageSize::Letter);
}

// ── Scan loop termination ────────────────────────────────────────────────────

#[tokio::test]
async fn test_page_limit_caps_capture() {
    let bench = Bench::new(0);
    let cli = CliValues {
        page_limit: Some(PageLimit::Pages(NonZeroU32::new(3).unwrap())),
        ..receipt()
    };
    let mut op = ScriptedOperator::keep_going();
    let summary = run(&cli, false, &bench.config(), &mut op).await.unwrap();

    assert_eq!(summary.pages, 3);
    assert_eq!(bench.scanner_calls(), 3);
    // No question after the last page allowed by the limit.
    assert_eq!(op.asked, 2);
}

#[tokio::test]
async fn test_driver_failure_stops_before_limit() {
    let bench = Bench::new(2);
    let cli = CliValues {
        page_limit: Some(PageLimit::Pages(NonZeroU32::new(5).unwrap())),
        ..receipt()
    };
    let summary = run(&cli, false, &bench.config(), &mut ScriptedOperator::keep_going())
        .await
        .unwrap();

    assert_eq!(summary.pages, 1);
    assert_eq!(bench.scanner_calls(), 2);
}

#[tokio::test]
async fn test_operator_stop_key_ends_scan() {
    let bench = Bench::new(0);
    let mut op = ScriptedOperator::stop_after(1);
    let summary = run(&receipt(), false, &bench.config(), &mut op).await.unwrap();

    assert_eq!(summary.pages, 1);
    assert_eq!(bench.scanner_calls(), 1);
    assert_eq!(op.asked, 1);
}

// ── Failures ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_validation_error_has_no_side_effects() {
    let bench = Bench::new(0);
    let cli = CliValues {
        title: None,
        ..receipt()
    };
    let err = run(&cli, false, &bench.config(), &mut ScriptedOperator::keep_going())
        .await
        .unwrap_err();

    assert!(matches!(err, ScanError::InvalidParameter { field: "title", .. }));
    assert_eq!(err.exit_code(), 1);
    assert_eq!(bench.scanner_calls(), 0);
    assert!(!bench.settings.exists());
    assert!(!bench.work.exists());
}

#[tokio::test]
async fn test_unknown_page_size_is_rejected() {
    let bench = Bench::new(0);
    let cli = CliValues {
        page_size: Some("tabloid".into()),
        ..receipt()
    };
    let err = run(&cli, false, &bench.config(), &mut ScriptedOperator::keep_going())
        .await
        .unwrap_err();
    assert!(matches!(err, ScanError::InvalidParameter { field: "page size", .. }));
    assert_eq!(bench.scanner_calls(), 0);
}

#[tokio::test]
async fn test_empty_feeder_on_first_page() {
    let bench = Bench::new(1);
    let err = run(&receipt(), false, &bench.config(), &mut ScriptedOperator::keep_going())
        .await
        .unwrap_err();

    assert!(matches!(err, ScanError::NoPagesCaptured));
    assert_eq!(err.exit_code(), 2);
    assert!(entries(&bench.output).is_empty());
    // Settings are written before scanning and survive the failure.
    assert_eq!(settings::load(&bench.settings).title, "Costco receipt");
}

#[tokio::test]
async fn test_ocr_failure_promotes_nothing() {
    let bench = Bench::new(3);
    bench.link("ocr", "ocr-failing");

    let err = run(&receipt(), false, &bench.config(), &mut ScriptedOperator::keep_going())
        .await
        .unwrap_err();

    match &err {
        ScanError::CollaboratorFailed { tool, stderr, .. } => {
            assert_eq!(*tool, "OCR");
            assert!(stderr.contains("too small"), "stderr: {stderr}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.exit_code(), 2);
    assert!(entries(&bench.output).is_empty());

    // Pages and the assembled PDF stay behind for inspection.
    assert_eq!(
        entries(&bench.work),
        [
            "2020-01-05, Costco receipt-page-001.pnm",
            "2020-01-05, Costco receipt-page-002.pnm",
            "2020-01-05, Costco receipt.images.pdf",
        ]
    );
}

#[tokio::test]
async fn test_missing_scanner_program_is_fatal() {
    let bench = Bench::new(0);
    let config = ScanConfig {
        programs: docscan::Programs {
            scanner: bench.bin.join("no-such-scanner"),
            ..bench.config().programs
        },
        ..bench.config()
    };
    let err = run(&receipt(), false, &config, &mut ScriptedOperator::keep_going())
        .await
        .unwrap_err();
    assert!(matches!(err, ScanError::CollaboratorNotFound { tool: "Scanner", .. }));
}
