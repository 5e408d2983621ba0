use crate::translation::prompt::{request_text, TranslationConfiguration};
use crate::utils::{ApiConfig, Result, TranslatorError};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::future::Future;
use tracing::debug;

/// Text-to-text translation capability used by the batch translator.
///
/// Implemented by [`GeminiClient`] and by any
/// `Fn(&str, &TranslationConfiguration) -> Result<String>`.
pub trait Translator: Send + Sync {
    fn translate(
        &self,
        text: &str,
        config: &TranslationConfiguration,
    ) -> impl Future<Output = Result<String>> + Send;
}

impl<F> Translator for F
where
    F: Fn(&str, &TranslationConfiguration) -> Result<String> + Send + Sync,
{
    fn translate(
        &self,
        text: &str,
        config: &TranslationConfiguration,
    ) -> impl Future<Output = Result<String>> + Send {
        std::future::ready(self(text, config))
    }
}

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
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
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GeminiClient {
    pub fn new(api: &ApiConfig, api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder().timeout(api.timeout()).build()?;

        Ok(Self {
            client,
            endpoint: api.endpoint.trim_end_matches('/').to_string(),
            model: api.model.clone(),
            api_key: api_key.into(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn call_api(&self, prompt: &str) -> Result<String> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
        };

        let url = format!("{}/models/{}:generateContent", self.endpoint, self.model);
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TranslatorError::ApiError(format!(
                "API returned {}: {}",
                status, body
            )));
        }

        let api_response: GenerateContentResponse = response.json().await?;
        extract_text(api_response)
    }
}

fn extract_text(response: GenerateContentResponse) -> Result<String> {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(TranslatorError::ApiError(format!("prompt blocked: {}", reason)));
    }

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| TranslatorError::ApiError("No candidates in response".to_string()))?;

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(TranslatorError::ApiError(format!(
            "No text content in response (finish reason: {})",
            candidate.finish_reason.as_deref().unwrap_or("unknown")
        )));
    }

    Ok(text.trim().to_string())
}

impl Translator for GeminiClient {
    async fn translate(&self, text: &str, config: &TranslationConfiguration) -> Result<String> {
        debug!(model = %self.model, chars = text.chars().count(), "Requesting translation");
        self.call_api(&request_text(config, text)).await
    }
}
