pub mod gemini;

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::InsightConfig;
use crate::credential::{Credential, ENV_VAR, LOCAL_CONFIG_FILE};
use crate::diagnostics::Diagnostics;
use crate::error::InsightError;
use crate::models::TestResultRecord;
use crate::report;

pub use gemini::GeminiBackend;

pub const DEFAULT_INSTRUCTION: &str =
    "Analyze the following text and provide key insights and possible recommendations:";

const ROOT_CAUSE_INSTRUCTION: &str = "Given the following error messages from failed automation tests, \
     identify common patterns, suggest potential root causes, and recommend actionable steps to investigate or fix:";

const DISABLED_INSIGHTS: &str =
    "LLM model is not initialized. Set GOOGLE_API_KEY in the environment or report-lens.local.toml.";
pub const DISABLED_FAILURE_ANALYSIS: &str =
    "LLM model is not initialized. Cannot analyze failures with LLM.";
pub const DISABLED_TEST_INSIGHT: &str =
    "LLM model is not initialized. Cannot get specific test insights.";
pub const NO_FAILED_TESTS: &str = "No failed tests to analyze with LLM.";
pub const NO_ERROR_MESSAGES: &str =
    "No specific error messages found in failed tests for LLM analysis.";

const GENERATE_CONTENT: &str = "generateContent";

/// A model as reported by the service's model listing.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    pub name: String,
    #[serde(default)]
    pub supported_generation_methods: Vec<String>,
}

impl ModelInfo {
    pub fn supports_generation(&self) -> bool {
        self.supported_generation_methods
            .iter()
            .any(|m| m == GENERATE_CONTENT)
    }
}

/// Remote generative-text service seam.
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    /// All models visible to the configured key.
    async fn list_models(&self) -> Result<Vec<ModelInfo>, InsightError>;

    /// Generate text for `prompt` with the named model.
    async fn generate(&self, model: &str, prompt: &str) -> Result<String, InsightError>;

    /// Display name for this backend (e.g., "Gemini").
    fn name(&self) -> &str;
}

enum Mode {
    Disabled,
    Enabled {
        backend: Box<dyn GenerativeBackend>,
        model: String,
    },
}

/// Generated commentary on test failures.
///
/// Once disabled (no credential, no usable model) the client stays disabled
/// and every call answers with a fixed message without touching the network.
pub struct InsightClient {
    mode: Mode,
    diagnostics: Arc<Diagnostics>,
}

impl InsightClient {
    pub fn disabled(diagnostics: Arc<Diagnostics>) -> Self {
        Self {
            mode: Mode::Disabled,
            diagnostics,
        }
    }

    /// Build a Gemini-backed client, or a disabled one when there is no
    /// credential or the service offers no usable model.
    pub async fn connect(
        credential: Option<Credential>,
        settings: &InsightConfig,
        diagnostics: Arc<Diagnostics>,
    ) -> Self {
        let Some(credential) = credential else {
            diagnostics.error(format!(
                "{} not found in the environment or {}. LLM features will NOT be available.",
                ENV_VAR, LOCAL_CONFIG_FILE
            ));
            return Self::disabled(diagnostics);
        };

        match GeminiBackend::new(credential, settings) {
            Ok(backend) => {
                Self::with_backend(Box::new(backend), &settings.preferred_model, diagnostics).await
            }
            Err(e) => {
                diagnostics.error(format!(
                    "Failed to build LLM client: {}. LLM features will NOT be available.",
                    e
                ));
                Self::disabled(diagnostics)
            }
        }
    }

    /// Pick a model from `backend`, preferring `preferred`.
    pub async fn with_backend(
        backend: Box<dyn GenerativeBackend>,
        preferred: &str,
        diagnostics: Arc<Diagnostics>,
    ) -> Self {
        let models = match backend.list_models().await {
            Ok(models) => models,
            Err(e) => {
                diagnostics.error(format!(
                    "Failed to initialize LLM model due to an API error: {}. LLM features will NOT be available.",
                    e
                ));
                return Self::disabled(diagnostics);
            }
        };

        let Some(model) = select_model(&models, preferred) else {
            diagnostics.error(format!(
                "{}. LLM features will NOT be available.",
                InsightError::NoModels
            ));
            return Self::disabled(diagnostics);
        };

        if is_preferred(&model, preferred) {
            diagnostics.info(format!(
                "{} model '{}' initialized successfully.",
                backend.name(),
                model
            ));
        } else {
            diagnostics.info(format!(
                "{} model '{}' not available. Initialized with '{}'.",
                backend.name(),
                preferred,
                model
            ));
        }

        Self {
            mode: Mode::Enabled { backend, model },
            diagnostics,
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self.mode, Mode::Enabled { .. })
    }

    pub fn model(&self) -> Option<&str> {
        match self.mode {
            Mode::Enabled { ref model, .. } => Some(model),
            Mode::Disabled => None,
        }
    }

    /// Send `instruction` and `text` as one prompt and return the reply. A
    /// blank instruction falls back to [`DEFAULT_INSTRUCTION`].
    pub async fn try_insights(&self, text: &str, instruction: &str) -> Result<String, InsightError> {
        let Mode::Enabled { ref backend, ref model } = self.mode else {
            return Err(InsightError::Disabled);
        };

        let instruction = if instruction.trim().is_empty() {
            DEFAULT_INSTRUCTION
        } else {
            instruction
        };
        let prompt = format!("{}\n\nText: {}", instruction, text);
        tracing::debug!("sending {} byte prompt to {}", prompt.len(), model);
        backend.generate(model, &prompt).await
    }

    /// Like [`InsightClient::try_insights`], with every failure rendered as text.
    pub async fn get_insights(&self, text: &str, instruction: &str) -> String {
        match self.try_insights(text, instruction).await {
            Ok(reply) => reply,
            Err(InsightError::Disabled) => DISABLED_INSIGHTS.to_string(),
            Err(e) => {
                self.diagnostics
                    .warn(format!("LLM request failed: {}", e));
                format!("Error accessing the LLM model: {}", e)
            }
        }
    }

    /// Root-cause analysis over the distinct error messages of failed tests.
    pub async fn analyze_failures(&self, records: &[TestResultRecord]) -> String {
        if !self.is_enabled() {
            return DISABLED_FAILURE_ANALYSIS.to_string();
        }

        let mut failed = report::failed(records).peekable();
        if failed.peek().is_none() {
            return NO_FAILED_TESTS.to_string();
        }

        let messages = unique_messages(failed);
        if messages.is_empty() {
            return NO_ERROR_MESSAGES.to_string();
        }

        self.diagnostics.info("--- LLM Analysis of Failures ---");
        self.get_insights(&messages.join("\n"), ROOT_CAUSE_INSTRUCTION)
            .await
    }

    /// Debugging guidance for the first test named `name`.
    pub async fn insight_for_test(&self, records: &[TestResultRecord], name: &str) -> String {
        let Some(record) = records.iter().find(|r| r.name == name) else {
            return format!("Test '{}' not found in the report.", name);
        };
        if !self.is_enabled() {
            return DISABLED_TEST_INSIGHT.to_string();
        }

        let instruction = format!(
            "Analyze the following details for a test case '{}'. \
             Provide insights into its status, potential reasons for failure (if applicable), \
             and suggest next steps for debugging or improvement:",
            record.name
        );

        self.diagnostics
            .info(format!("--- LLM Insight for Test: {} ---", name));
        self.get_insights(&describe(record), &instruction).await
    }
}

fn select_model(models: &[ModelInfo], preferred: &str) -> Option<String> {
    let mut usable = models.iter().filter(|m| m.supports_generation());
    let first = usable.clone().next()?;

    let chosen = usable.find(|m| is_preferred(&m.name, preferred)).unwrap_or(first);
    Some(chosen.name.clone())
}

/// Listings name models `models/<id>`; accept the preference either way.
fn is_preferred(name: &str, preferred: &str) -> bool {
    let strip = |s: &str| s.strip_prefix("models/").unwrap_or(s).to_string();
    strip(name) == strip(preferred)
}

/// Distinct non-empty messages in first-seen order.
fn unique_messages<'a>(failed: impl Iterator<Item = &'a TestResultRecord>) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    failed
        .filter_map(|r| r.error_message.as_deref())
        .filter(|m| !m.trim().is_empty())
        .filter(|m| seen.insert(*m))
        .collect()
}

fn describe(record: &TestResultRecord) -> String {
    let mut text = format!(
        "Test Name: {}\nStatus: {}\nDescription: {}\n",
        record.name, record.status, record.description
    );
    if let Some(ref message) = record.error_message {
        text.push_str(&format!("Error Message: {}\n", message));
    }
    if let Some(ref video) = record.video_path {
        text.push_str(&format!("Associated Video: {}\n", video.display()));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(name: &str, methods: &[&str]) -> ModelInfo {
        ModelInfo {
            name: name.to_string(),
            supported_generation_methods: methods.iter().map(|m| m.to_string()).collect(),
        }
    }

    #[test]
    fn prefers_named_model() {
        let models = vec![
            model("models/gemini-1.5-flash", &["generateContent"]),
            model("models/gemini-pro", &["generateContent"]),
        ];
        assert_eq!(
            select_model(&models, "gemini-pro").as_deref(),
            Some("models/gemini-pro")
        );
        assert_eq!(
            select_model(&models, "models/gemini-pro").as_deref(),
            Some("models/gemini-pro")
        );
    }

    #[test]
    fn falls_back_to_first_generating_model() {
        let models = vec![
            model("models/embedding-001", &["embedContent"]),
            model("models/gemini-1.5-flash", &["generateContent"]),
            model("models/gemini-1.5-pro", &["generateContent"]),
        ];
        assert_eq!(
            select_model(&models, "gemini-pro").as_deref(),
            Some("models/gemini-1.5-flash")
        );
    }

    #[test]
    fn preferred_model_must_support_generation() {
        let models = vec![
            model("models/gemini-pro", &["countTokens"]),
            model("models/gemini-1.5-flash", &["generateContent"]),
        ];
        assert_eq!(
            select_model(&models, "gemini-pro").as_deref(),
            Some("models/gemini-1.5-flash")
        );
    }

    #[test]
    fn no_generating_models() {
        let models = vec![model("models/embedding-001", &["embedContent"])];
        assert!(select_model(&models, "gemini-pro").is_none());
        assert!(select_model(&[], "gemini-pro").is_none());
    }
}
