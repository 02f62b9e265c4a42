//! Text generation backend.
//!
//! This module provides the interface the commentator uses to talk to a
//! generative-text API, and the Gemini implementation of it.
//!
//! # Architecture
//!
//! - [`AskAsync`]: Core trait defining async LLM interaction
//! - [`GeminiClient`]: `generateContent` REST client implementing [`AskAsync`]
//!
//! Requests are made once. A failed or empty response is returned as an
//! error and the caller decides how to recover.

use crate::utils::truncate_for_log;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::time::Instant;
use tracing::{info, instrument, warn};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-pro-latest";

/// Trait for async LLM interaction.
///
/// Implementors of this trait can send a prompt to an LLM and receive the
/// generated text.
pub trait AskAsync {
    /// Send a prompt to the LLM and receive its text response.
    ///
    /// # Returns
    ///
    /// The generated text, or an error if the request failed or the backend
    /// produced no usable candidate.
    async fn ask(&self, prompt: &str) -> Result<String, Box<dyn Error>>;
}

/// Sampling and safety settings sent with every request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSettings {
    pub model: String,
    pub max_output_tokens: u32,
    pub temperature: f32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_output_tokens: 150,
            temperature: 0.7,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
    safety_settings: Vec<SafetySetting>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct SafetySetting {
    category: &'static str,
    threshold: &'static str,
}

const SAFETY_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

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
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Text of the first candidate's parts, trimmed. `None` when empty.
    fn first_text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect::<String>();
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }

    fn explain_empty(&self) -> String {
        if let Some(reason) = self
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
        {
            return format!("no candidates returned (block reason: {})", reason);
        }
        match self.candidates.first().and_then(|c| c.finish_reason.as_deref()) {
            Some(reason) => format!("empty candidate (finish reason: {})", reason),
            None => "no candidates returned".to_string(),
        }
    }
}

/// Gemini `generateContent` client.
pub struct GeminiClient {
    api_key: String,
    settings: GenerationSettings,
    base_url: String,
    http: reqwest::Client,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("settings", &self.settings)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, settings: GenerationSettings, http: reqwest::Client) -> Self {
        Self {
            api_key: api_key.into(),
            settings,
            base_url: DEFAULT_BASE_URL.to_string(),
            http,
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    fn request<'a>(&self, prompt: &'a str) -> GenerateContentRequest<'a> {
        GenerateContentRequest {
            contents: vec![Content {
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: self.settings.max_output_tokens,
                temperature: self.settings.temperature,
            },
            safety_settings: SAFETY_CATEGORIES
                .into_iter()
                .map(|category| SafetySetting {
                    category,
                    threshold: "BLOCK_NONE",
                })
                .collect(),
        }
    }
}

impl AskAsync for GeminiClient {
    #[instrument(level = "info", skip_all, fields(model = %self.settings.model))]
    async fn ask(&self, prompt: &str) -> Result<String, Box<dyn Error>> {
        let t0 = Instant::now();
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.settings.model
        );

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&self.request(prompt))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        let dt = t0.elapsed();

        if !status.is_success() {
            warn!(elapsed_ms = dt.as_millis(), %status, "Gemini API call failed");
            return Err(format!("Gemini API error ({}): {}", status, truncate_for_log(&body, 300)).into());
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&body)?;
        match parsed.first_text() {
            Some(text) => {
                info!(elapsed_ms = dt.as_millis(), chars = text.chars().count(), "Gemini API call succeeded");
                Ok(text)
            }
            None => Err(parsed.explain_empty().into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{StubResponse, StubServer};
    use serde_json::json;

    const PATH: &str = "/v1beta/models/gemini-pro-latest:generateContent";

    fn client(server: &StubServer) -> GeminiClient {
        GeminiClient::new("gem-key", GenerationSettings::default(), reqwest::Client::new())
            .with_base_url(server.base_url())
    }

    #[tokio::test]
    async fn test_ask_returns_first_candidate_text() {
        let server = StubServer::start().await;
        server.route(
            "POST",
            PATH,
            StubResponse::json(
                200,
                json!({
                    "candidates": [
                        {"content": {"role": "model", "parts": [{"text": "  Rates on hold; "}, {"text": "markets calm.\n"}]}, "finishReason": "STOP"},
                        {"content": {"parts": [{"text": "ignored"}]}}
                    ]
                }),
            ),
        );

        let text = client(&server).ask("Comment on rates").await.unwrap();
        assert_eq!(text, "Rates on hold; markets calm.");

        let request = &server.requests()[0];
        assert_eq!(request.header("x-goog-api-key"), Some("gem-key"));
        let body = request.body_json();
        assert_eq!(body["contents"][0]["parts"][0]["text"], "Comment on rates");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 150);
        assert_eq!(body["safetySettings"].as_array().unwrap().len(), 4);
        assert_eq!(body["safetySettings"][0]["threshold"], "BLOCK_NONE");
    }

    #[tokio::test]
    async fn test_ask_blocked_prompt_is_an_error() {
        let server = StubServer::start().await;
        server.route(
            "POST",
            PATH,
            StubResponse::json(200, json!({"promptFeedback": {"blockReason": "SAFETY"}})),
        );

        let err = client(&server).ask("prompt").await.unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }

    #[tokio::test]
    async fn test_ask_empty_candidate_is_an_error() {
        let server = StubServer::start().await;
        server.route(
            "POST",
            PATH,
            StubResponse::json(
                200,
                json!({"candidates": [{"content": {"parts": [{"text": "   "}]}, "finishReason": "MAX_TOKENS"}]}),
            ),
        );

        let err = client(&server).ask("prompt").await.unwrap_err();
        assert!(err.to_string().contains("MAX_TOKENS"));
    }

    #[tokio::test]
    async fn test_ask_http_error_is_an_error() {
        let server = StubServer::start().await;
        server.route(
            "POST",
            PATH,
            StubResponse::json(429, json!({"error": {"code": 429, "status": "RESOURCE_EXHAUSTED"}})),
        );

        let err = client(&server).ask("prompt").await.unwrap_err();
        assert!(err.to_string().contains("429"));
    }
}
