use std::collections::HashMap;

use serde::Deserialize;

use crate::error::ArtifactError;
use crate::models::{Classification, NOT_AVAILABLE, TestResultRecord, TestStatus, duration_secs};

use super::video::VideoLocator;

/// Normalize one `*-result.json` body, correlating it with a recorded video.
pub fn parse_artifact(text: &str, videos: &VideoLocator) -> Result<TestResultRecord, ArtifactError> {
    let raw: AllureResult = serde_json::from_str(text)?;
    Ok(raw.into_record(videos))
}

// --- Allure result deserialization types ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AllureResult {
    uuid: Option<String>,
    name: Option<String>,
    status: Option<String>,
    // Some reporters write float milliseconds.
    start: Option<f64>,
    stop: Option<f64>,
    description: Option<String>,
    status_details: Option<StatusDetails>,
    #[serde(default)]
    labels: Vec<AllureLabel>,
    test_case_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusDetails {
    message: Option<String>,
    trace: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AllureLabel {
    name: String,
    value: String,
}

impl StatusDetails {
    /// The message field when it says something, else the first trace line.
    fn error_message(self) -> Option<String> {
        let message = self.message.filter(|m| !m.trim().is_empty());
        message.or_else(|| {
            self.trace
                .as_deref()
                .and_then(|trace| trace.lines().next())
                .map(str::trim_end)
                .filter(|line| !line.is_empty())
                .map(String::from)
        })
    }
}

impl AllureResult {
    fn into_record(self, videos: &VideoLocator) -> TestResultRecord {
        let status = self
            .status
            .as_deref()
            .map(TestStatus::parse)
            .unwrap_or_default();

        let error_message = if status == TestStatus::Failed {
            self.status_details.and_then(StatusDetails::error_message)
        } else {
            None
        };

        let video_path = self.uuid.as_deref().and_then(|uuid| videos.find(uuid));

        TestResultRecord {
            uuid: self.uuid.unwrap_or_else(|| NOT_AVAILABLE.into()),
            name: self.name.unwrap_or_else(|| NOT_AVAILABLE.into()),
            status,
            start_ms: self.start,
            stop_ms: self.stop,
            duration_secs: duration_secs(self.start, self.stop),
            description: self.description.unwrap_or_default(),
            labels: flatten_labels(self.labels),
            test_case_id: self.test_case_id,
            error_message,
            video_path,
        }
    }
}

fn flatten_labels(labels: Vec<AllureLabel>) -> Classification {
    // Later labels with the same name overwrite earlier ones.
    let mut by_name: HashMap<String, String> = labels
        .into_iter()
        .map(|label| (label.name, label.value))
        .collect();
    let mut take = |key: &str| by_name.remove(key).unwrap_or_else(|| NOT_AVAILABLE.into());

    Classification {
        epic: take("epic"),
        feature: take("feature"),
        suite: take("suite"),
        sub_suite: take("subSuite"),
    }
}
