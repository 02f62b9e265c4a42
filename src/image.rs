//! Optional image rendering stage.
//!
//! [`DeepAiRenderer`] posts the prompt to DeepAI's `text2img` endpoint,
//! reads `output_url` from the reply and downloads the asset. Whatever goes
//! wrong (transport error, non-2xx status such as 402 Payment Required,
//! malformed JSON, missing `output_url`, failed download) is logged and
//! reported as `None`.

use crate::models::RenderedImage;
use crate::utils::truncate_for_log;
use serde::Deserialize;
use std::error::Error;
use std::time::Instant;
use tracing::{info, instrument, warn};

pub const DEFAULT_BASE_URL: &str = "https://api.deepai.org";

/// Turns a text prompt into an image.
pub trait ImageRenderer {
    /// Render `prompt`. Never fails: any error yields `None`.
    async fn render(&self, prompt: &str) -> Option<RenderedImage>;
}

#[derive(Debug, Deserialize)]
struct Text2ImgResponse {
    output_url: Option<String>,
    err: Option<String>,
}

/// DeepAI `text2img` client.
pub struct DeepAiRenderer {
    api_key: String,
    base_url: String,
    http: reqwest::Client,
}

impl std::fmt::Debug for DeepAiRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeepAiRenderer")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl DeepAiRenderer {
    pub fn new(api_key: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            http,
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    async fn try_render(&self, prompt: &str) -> Result<RenderedImage, Box<dyn Error>> {
        let url = format!("{}/api/text2img", self.base_url);
        let response = self
            .http
            .post(&url)
            .header("api-key", &self.api_key)
            .json(&serde_json::json!({ "text": prompt }))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(format!("DeepAI error ({}): {}", status, truncate_for_log(&body, 300)).into());
        }

        let parsed: Text2ImgResponse = serde_json::from_str(&body)?;
        let output_url = match parsed.output_url.filter(|u| !u.trim().is_empty()) {
            Some(u) => u,
            None => {
                let reason = parsed.err.unwrap_or_else(|| "missing output_url".to_string());
                return Err(format!("DeepAI returned no image: {}", reason).into());
            }
        };

        let asset = self.http.get(&output_url).send().await?.error_for_status()?;
        let content_type = asset
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = asset.bytes().await?.to_vec();
        if bytes.is_empty() {
            return Err(format!("image asset at {} was empty", output_url).into());
        }

        Ok(RenderedImage {
            bytes,
            source_url: output_url,
            content_type,
        })
    }
}

impl ImageRenderer for DeepAiRenderer {
    #[instrument(level = "info", skip_all)]
    async fn render(&self, prompt: &str) -> Option<RenderedImage> {
        let t0 = Instant::now();
        match self.try_render(prompt).await {
            Ok(image) => {
                info!(
                    elapsed_ms = t0.elapsed().as_millis(),
                    bytes = image.bytes.len(),
                    url = %image.source_url,
                    "Rendered image"
                );
                Some(image)
            }
            Err(e) => {
                warn!(elapsed_ms = t0.elapsed().as_millis(), error = %e, "Image rendering failed");
                None
            }
        }
    }
}
