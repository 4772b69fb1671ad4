//! Durable run artifacts: the human-readable log file and the JSON output
//! stream, plus the upload/notification seams fired at teardown.
//!
//! Both files are created eagerly so a crash mid-run still leaves readable
//! artifacts. The JSON file is a single array opened with a `{}` sentinel
//! element, letting every real record be appended with a leading comma.

use crate::decision::PlannedAction;
use crate::record::Record;
use crate::registry::Selector;
use crate::types::Mode;
use chrono::Utc;
use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Severity / Notifier / Uploader
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Object-storage upload seam. Failures are reported, never fatal.
pub trait Uploader {
    fn upload(&self, path: &Path, content_type: &str) -> Result<(), String>;
}

/// Chat notification seam.
pub trait Notifier {
    fn post(
        &self,
        title: &str,
        body: &str,
        severity: Severity,
        mention: Option<&str>,
    ) -> Result<(), String>;
}

#[derive(Debug, Default)]
pub struct NoopUploader;

impl Uploader for NoopUploader {
    fn upload(&self, _path: &Path, _content_type: &str) -> Result<(), String> {
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn post(
        &self,
        _title: &str,
        _body: &str,
        _severity: Severity,
        _mention: Option<&str>,
    ) -> Result<(), String> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// AuditSink
// ---------------------------------------------------------------------------

pub struct AuditSink {
    log: File,
    log_path: PathBuf,
    json: File,
    json_path: PathBuf,
    finalized: bool,
}

impl AuditSink {
    /// Create both artifact files. Fails fast if either path is unwritable.
    pub fn open(log_path: &Path, json_path: &Path) -> std::io::Result<Self> {
        let log = File::create(log_path)?;
        let mut json = File::create(json_path)?;
        json.write_all(b"[\n  {}")?;
        Ok(Self {
            log,
            log_path: log_path.to_path_buf(),
            json,
            json_path: json_path.to_path_buf(),
            finalized: false,
        })
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    pub fn json_path(&self) -> &Path {
        &self.json_path
    }

    pub fn header(&mut self, mode: Mode, destination: &str, selector: &Selector) {
        self.line(&format!(
            "ospub run started {}",
            Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
        ));
        self.line(&format!("mode: {mode}"));
        self.line(&format!("destination: {destination}"));
        self.line(&format!("selector: {}", selector.describe()));
        self.line("");
    }

    /// One log line. Write failures on an already-open log are not worth
    /// failing the run over; they are surfaced through tracing instead.
    pub fn line(&mut self, text: &str) {
        if let Err(e) = writeln!(self.log, "{text}") {
            tracing::error!(error = %e, "audit log write failed");
        }
    }

    /// One audit entry for an executed or skipped action, with its diff
    /// block when there is one.
    pub fn action(&mut self, planned: &PlannedAction) {
        self.line(&planned.headline());
        if planned.diff.count() > 0 {
            let rendered = planned.diff.render("    ");
            for l in rendered.lines() {
                self.line(l);
            }
        }
    }

    pub fn footer(&mut self, report: &str) {
        self.line("");
        for l in report.lines() {
            self.line(l);
        }
        self.line(&format!(
            "ospub run finished {}",
            Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
        ));
    }

    /// Append one record body to the JSON output array.
    pub fn append_record(&mut self, record: &Record) {
        let body = record.to_json_line();
        if let Err(e) = write!(self.json, ",\n  {body}") {
            tracing::error!(error = %e, "audit json write failed");
        }
    }

    /// Flush and upload the partial log so reviewers can read it while an
    /// interactive run waits for confirmation.
    pub fn upload_partial(&mut self, uploader: &dyn Uploader) {
        let _ = self.log.flush();
        if let Err(e) = uploader.upload(&self.log_path, "text/plain") {
            tracing::error!(error = %e, "partial log upload failed");
        }
    }

    /// Close the JSON array, flush both files and ship them. Idempotent;
    /// runs on every exit path. Upload and notification failures are
    /// reported but never alter the run's outcome.
    pub fn finalize(
        &mut self,
        uploader: &dyn Uploader,
        notifier: &dyn Notifier,
        title: &str,
        body: &str,
        severity: Severity,
    ) {
        if self.finalized {
            return;
        }
        self.finalized = true;

        if let Err(e) = self.json.write_all(b"\n]\n") {
            tracing::error!(error = %e, "audit json close failed");
        }
        let _ = self.json.flush();
        let _ = self.log.flush();

        if let Err(e) = uploader.upload(&self.log_path, "text/plain") {
            tracing::error!(error = %e, "log upload failed");
        }
        if let Err(e) = uploader.upload(&self.json_path, "application/json") {
            tracing::error!(error = %e, "json upload failed");
        }
        if let Err(e) = notifier.post(title, body, severity, None) {
            tracing::error!(error = %e, "notification failed");
        }
    }
}

impl Drop for AuditSink {
    fn drop(&mut self) {
        // Last-resort close so a panic still leaves valid JSON behind.
        if !self.finalized {
            let _ = self.json.write_all(b"\n]\n");
            let _ = self.json.flush();
            let _ = self.log.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::Diff;
    use crate::record::fixtures::service;
    use std::sync::Mutex;
    use tempfile::TempDir;

    fn sink(dir: &TempDir) -> AuditSink {
        AuditSink::open(&dir.path().join("run.log"), &dir.path().join("out.json")).unwrap()
    }

    fn planned_create(name: &str) -> PlannedAction {
        PlannedAction {
            target: service(name),
            prior: None,
            action: crate::types::ActionKind::Create,
            diff: Diff::empty(),
            update_violation: false,
        }
    }

    #[test]
    fn files_created_eagerly() {
        let dir = TempDir::new().unwrap();
        let _sink = sink(&dir);
        assert!(dir.path().join("run.log").exists());
        assert!(dir.path().join("out.json").exists());
    }

    #[test]
    fn json_stream_is_valid_array_after_finalize() {
        let dir = TempDir::new().unwrap();
        let mut s = sink(&dir);
        s.append_record(&service("svc-a"));
        s.append_record(&service("svc-b"));
        s.finalize(&NoopUploader, &NoopNotifier, "t", "b", Severity::Info);
        drop(s);

        let text = std::fs::read_to_string(dir.path().join("out.json")).unwrap();
        let values: Vec<serde_json::Value> = serde_json::from_str(&text).unwrap();
        assert_eq!(values.len(), 3);
        assert!(values[0].as_object().unwrap().is_empty());
        assert_eq!(values[1]["name"], "svc-a");
        assert_eq!(values[2]["name"], "svc-b");
    }

    #[test]
    fn empty_run_produces_sentinel_only_array() {
        let dir = TempDir::new().unwrap();
        let mut s = sink(&dir);
        s.finalize(&NoopUploader, &NoopNotifier, "t", "b", Severity::Info);
        drop(s);

        let text = std::fs::read_to_string(dir.path().join("out.json")).unwrap();
        let values: Vec<serde_json::Value> = serde_json::from_str(&text).unwrap();
        assert_eq!(values.len(), 1);
    }

    #[test]
    fn drop_without_finalize_still_closes_array() {
        let dir = TempDir::new().unwrap();
        let mut s = sink(&dir);
        s.append_record(&service("svc-a"));
        drop(s);

        let text = std::fs::read_to_string(dir.path().join("out.json")).unwrap();
        assert!(serde_json::from_str::<Vec<serde_json::Value>>(&text).is_ok());
    }

    #[test]
    fn action_lines_and_diffs_reach_the_log() {
        let dir = TempDir::new().unwrap();
        let mut s = sink(&dir);
        s.header(Mode::ReadOnly, "production", &Selector::All);
        s.action(&planned_create("svc-a"));
        s.finalize(&NoopUploader, &NoopNotifier, "t", "b", Severity::Info);
        drop(s);

        let text = std::fs::read_to_string(dir.path().join("run.log")).unwrap();
        assert!(text.contains("mode: read-only"));
        assert!(text.contains("CREATE service 'svc-a'"));
    }

    struct RecordingUploader(Mutex<Vec<String>>);

    impl Uploader for RecordingUploader {
        fn upload(&self, path: &Path, _content_type: &str) -> Result<(), String> {
            self.0.lock().unwrap().push(path.display().to_string());
            Ok(())
        }
    }

    #[test]
    fn finalize_uploads_both_artifacts_once() {
        let dir = TempDir::new().unwrap();
        let uploader = RecordingUploader(Mutex::new(Vec::new()));
        let mut s = sink(&dir);
        s.finalize(&uploader, &NoopNotifier, "t", "b", Severity::Info);
        s.finalize(&uploader, &NoopNotifier, "t", "b", Severity::Info);
        assert_eq!(uploader.0.lock().unwrap().len(), 2);
    }

    struct FailingUploader;

    impl Uploader for FailingUploader {
        fn upload(&self, _path: &Path, _content_type: &str) -> Result<(), String> {
            Err("bucket offline".to_string())
        }
    }

    #[test]
    fn upload_failure_does_not_panic_or_error() {
        let dir = TempDir::new().unwrap();
        let mut s = sink(&dir);
        s.finalize(&FailingUploader, &NoopNotifier, "t", "b", Severity::Critical);
    }
}
