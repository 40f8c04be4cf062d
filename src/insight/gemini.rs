//! REST adapter for the Gemini generative-language API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use serde_json::json;

use crate::config::InsightConfig;
use crate::credential::Credential;
use crate::error::InsightError;

use super::{GenerativeBackend, ModelInfo};

const API_KEY_HEADER: &str = "x-goog-api-key";
const API_VERSION: &str = "v1beta";
const PAGE_SIZE: &str = "1000";

pub struct GeminiBackend {
    http: reqwest::Client,
    base_url: String,
    credential: Credential,
}

impl GeminiBackend {
    pub fn new(credential: Credential, settings: &InsightConfig) -> Result<Self, InsightError> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = settings.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            http: builder.build()?,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            credential,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}/{}", self.base_url, API_VERSION, path)
    }

    /// Attach the key, send, and turn non-2xx replies into errors.
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, InsightError> {
        let response = request
            .header(API_KEY_HEADER, self.credential.expose())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(InsightError::Status {
                status: status.as_u16(),
                body: body.trim().to_string(),
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl GenerativeBackend for GeminiBackend {
    async fn list_models(&self) -> Result<Vec<ModelInfo>, InsightError> {
        let mut models = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut params = vec![("pageSize", PAGE_SIZE.to_string())];
            if let Some(token) = page_token.take() {
                params.push(("pageToken", token));
            }
            let url = Url::parse_with_params(&self.url("models"), &params)
                .map_err(|e| InsightError::InvalidUrl(e.to_string()))?;

            let page: ListModelsResponse = self.send(self.http.get(url)).await?.json().await?;
            models.extend(page.models);

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        tracing::debug!("{} models listed", models.len());
        Ok(models)
    }

    async fn generate(&self, model: &str, prompt: &str) -> Result<String, InsightError> {
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });
        let url = self.url(&format!("{}:generateContent", model));

        let response: GenerateResponse = self
            .send(self.http.post(url).json(&body))
            .await?
            .json()
            .await?;
        response.into_text()
    }

    fn name(&self) -> &str {
        "Gemini"
    }
}

// --- REST deserialization types ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListModelsResponse {
    #[serde(default)]
    models: Vec<ModelInfo>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GenerateResponse {
    /// Text of the first candidate, parts concatenated.
    fn into_text(self) -> Result<String, InsightError> {
        if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(InsightError::EmptyResponse(format!("prompt blocked: {}", reason)));
        }

        let Some(candidate) = self.candidates.into_iter().next() else {
            return Err(InsightError::EmptyResponse("no candidates returned".into()));
        };

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.is_empty() {
            let reason = candidate.finish_reason.unwrap_or_else(|| "unknown".into());
            return Err(InsightError::EmptyResponse(format!(
                "candidate has no text (finish reason: {})",
                reason
            )));
        }
        Ok(text)
    }
}
