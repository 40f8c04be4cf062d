use std::path::Path;

use crate::models::{RunSummary, TestResultRecord};

pub const NO_RESULTS: &str = "No test results to analyze.";
pub const NO_FAILURES: &str = "No failed tests found in this report.";

const SEPARATOR: &str = "----------------------------";

pub fn failed(records: &[TestResultRecord]) -> impl Iterator<Item = &TestResultRecord> {
    records.iter().filter(|r| r.is_failed())
}

/// Counts and pass rate as a fixed text block.
pub fn summarize(records: &[TestResultRecord]) -> String {
    if records.is_empty() {
        return NO_RESULTS.to_string();
    }

    let summary = RunSummary::from_records(records);
    format!(
        "--- Automation Report Summary ---\n\
         Total Tests: {}\n\
         Passed: {}\n\
         Failed: {}\n\
         Skipped: {}\n\
         Pass Rate: {:.2}%\n\
         ---------------------------------",
        summary.total, summary.passed, summary.failed, summary.skipped, summary.pass_rate
    )
}

/// Name, suite path, error, duration and video link of every failed test.
pub fn failure_report(records: &[TestResultRecord]) -> String {
    let mut failures = failed(records).peekable();
    if failures.peek().is_none() {
        return NO_FAILURES.to_string();
    }

    let mut out = String::from("--- Failed Tests Details ---\n");
    for record in failures {
        out.push_str(&format!(
            "Test Name: {}\nSuite: {} -> {}\n",
            record.name, record.labels.suite, record.labels.sub_suite
        ));
        if let Some(ref message) = record.error_message {
            out.push_str(&format!("Error Message: {}\n", message));
        }
        out.push_str(&format!("Duration: {:.2} seconds\n", record.duration_secs));
        if let Some(ref video) = record.video_path {
            out.push_str(&format!("Video Link: {}\n", video_uri(video)));
        }
        out.push_str(SEPARATOR);
        out.push('\n');
    }
    out
}

/// `file://` URI for a local video, with Windows separators turned into `/`.
pub fn video_uri(path: &Path) -> String {
    let normalized = path.to_string_lossy().replace('\\', "/");
    if normalized.starts_with('/') {
        format!("file://{}", normalized)
    } else {
        format!("file:///{}", normalized)
    }
}
