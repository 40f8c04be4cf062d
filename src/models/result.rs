use std::path::PathBuf;

use serde::Serialize;

use super::status::TestStatus;

/// Placeholder used for identity and label fields the artifact leaves out.
pub const NOT_AVAILABLE: &str = "N/A";

/// One executed test, normalized from its result artifact.
#[derive(Debug, Clone, Serialize)]
pub struct TestResultRecord {
    pub uuid: String,
    pub name: String,
    pub status: TestStatus,
    /// Epoch milliseconds as written by the reporter (any JSON number).
    pub start_ms: Option<f64>,
    pub stop_ms: Option<f64>,
    pub duration_secs: f64,
    pub description: String,
    pub labels: Classification,
    pub test_case_id: Option<String>,
    pub error_message: Option<String>,
    pub video_path: Option<PathBuf>,
}

/// Epic/feature/suite labels flattened out of the artifact's label list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub epic: String,
    pub feature: String,
    pub suite: String,
    pub sub_suite: String,
}

impl Default for Classification {
    fn default() -> Self {
        Self {
            epic: NOT_AVAILABLE.into(),
            feature: NOT_AVAILABLE.into(),
            suite: NOT_AVAILABLE.into(),
            sub_suite: NOT_AVAILABLE.into(),
        }
    }
}

impl TestResultRecord {
    pub fn is_failed(&self) -> bool {
        self.status == TestStatus::Failed
    }
}

/// Seconds between two epoch-millisecond timestamps; zero when either is
/// missing or the stop precedes the start.
pub fn duration_secs(start_ms: Option<f64>, stop_ms: Option<f64>) -> f64 {
    let (Some(start), Some(stop)) = (start_ms, stop_ms) else {
        return 0.0;
    };
    let secs = (stop - start) / 1000.0;
    if secs.is_finite() && secs > 0.0 { secs } else { 0.0 }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Percentage of passed tests, 0 for an empty run.
    pub pass_rate: f64,
}

impl RunSummary {
    pub fn from_records(records: &[TestResultRecord]) -> Self {
        let count = |status| records.iter().filter(|r| r.status == status).count();
        let total = records.len();
        let passed = count(TestStatus::Passed);
        let pass_rate = if total == 0 {
            0.0
        } else {
            passed as f64 / total as f64 * 100.0
        };

        Self {
            total,
            passed,
            failed: count(TestStatus::Failed),
            skipped: count(TestStatus::Skipped),
            pass_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_requires_both_timestamps() {
        assert_eq!(duration_secs(Some(1_000.0), Some(4_456.0)), 3.456);
        assert_eq!(duration_secs(None, Some(4_456.0)), 0.0);
        assert_eq!(duration_secs(Some(1_000.0), None), 0.0);
    }

    #[test]
    fn duration_never_negative() {
        assert_eq!(duration_secs(Some(5_000.0), Some(1_000.0)), 0.0);
        assert_eq!(duration_secs(Some(f64::MAX), Some(-f64::MAX)), 0.0);
    }

    #[test]
    fn extreme_timestamps_do_not_overflow() {
        let secs = duration_secs(Some(-1.0), Some(i64::MAX as f64));
        assert!(secs.is_finite());
        assert!(secs > 0.0);
        assert_eq!(duration_secs(Some(-f64::MAX), Some(f64::MAX)), 0.0);
    }

    #[test]
    fn fractional_milliseconds() {
        assert_eq!(duration_secs(Some(1.7e12), Some(1.7e12 + 1_500.0)), 1.5);
    }
}
