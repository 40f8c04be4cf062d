//! Test-run report analysis for the video player end-to-end suite.
//!
//! Loads the Allure `*-result.json` artifacts a run leaves behind, links each
//! test to its recorded video, summarizes the outcome, and can ask a
//! generative-text service for failure insights.

pub mod config;
pub mod credential;
pub mod diagnostics;
pub mod error;
pub mod insight;
pub mod loader;
pub mod models;
pub mod report;

pub use diagnostics::Diagnostics;
pub use insight::{GenerativeBackend, InsightClient, ModelInfo};
pub use loader::{ResultLoader, VideoLocator};
pub use models::{RunSummary, TestResultRecord, TestStatus};
