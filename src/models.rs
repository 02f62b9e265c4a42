//! Data models passed between pipeline stages.
//!
//! This module defines the values each stage produces and hands to the next:
//! - [`Article`]: The single news item selected by a news source
//! - [`CommentaryResult`]: LLM commentary (and optional image prompt) for that article
//! - [`RenderedImage`]: Raw image bytes produced by the image renderer
//! - [`PostOutcome`]: The result of submitting the post to the platform
//! - [`RunReport`]: Everything a run produced, including its terminal [`RunOutcome`]
//!
//! Each value is created by exactly one stage and is never mutated afterwards.

use serde::{Deserialize, Serialize};

/// A news item selected for commentary.
///
/// `title` and `url` are always non-empty. When the source has no usable
/// description, `summary` holds a copy of the title.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Article {
    /// The headline.
    pub title: String,
    /// Absolute `http`/`https` link to the story.
    pub url: String,
    /// Plain-text description of the story.
    pub summary: String,
}

/// Where the body of a [`CommentaryResult`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyOrigin {
    /// Text returned by the generation backend.
    Generated,
    /// The configured fallback sentence, used when generation failed.
    Placeholder,
}

/// Commentary produced for an [`Article`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CommentaryResult {
    /// Short analytical comment. Never empty.
    pub body: String,
    /// Visual description used to render an image, when one was requested.
    pub image_prompt: Option<String>,
    /// Set when the image description request failed and `body` stands in
    /// as the image prompt.
    #[serde(default)]
    pub image_prompt_fallback: bool,
    /// Whether `body` is generated text or the placeholder.
    pub origin: BodyOrigin,
}

/// An image fetched from the rendering backend.
#[derive(Clone, PartialEq, Eq)]
pub struct RenderedImage {
    /// Raw image bytes as served by the backend.
    pub bytes: Vec<u8>,
    /// URL the bytes were downloaded from.
    pub source_url: String,
    /// `Content-Type` reported for the asset, if any.
    pub content_type: Option<String>,
}

impl std::fmt::Debug for RenderedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderedImage")
            .field("bytes", &self.bytes.len())
            .field("source_url", &self.source_url)
            .field("content_type", &self.content_type)
            .finish()
    }
}

/// Result of a publish attempt.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PostOutcome {
    pub success: bool,
    /// Platform identifier of the created post.
    pub post_id: Option<String>,
    /// Why the submission failed.
    pub error: Option<String>,
    /// Why an image was dropped in favour of a text-only post.
    pub media_error: Option<String>,
    /// The exact text that was submitted.
    pub text: String,
}

impl PostOutcome {
    pub fn posted(post_id: String, text: String, media_error: Option<String>) -> Self {
        Self {
            success: true,
            post_id: Some(post_id),
            error: None,
            media_error,
            text,
        }
    }

    pub fn failed(error: String, text: String, media_error: Option<String>) -> Self {
        Self {
            success: false,
            post_id: None,
            error: Some(error),
            media_error,
            text,
        }
    }
}

/// Terminal state of a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RunOutcome {
    /// The publisher was invoked. The outcome may still be a failure.
    Published(PostOutcome),
    /// The run stopped before publishing.
    Aborted { reason: String },
}

impl RunOutcome {
    /// `true` when a post was actually created.
    pub fn posted(&self) -> bool {
        matches!(self, RunOutcome::Published(outcome) if outcome.success)
    }
}

/// One failure observed during a run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Diagnostic {
    /// Failure class, e.g. `generation_failure`.
    pub kind: String,
    pub message: String,
    /// `false` when the failure ended the run.
    pub recovered: bool,
}

/// Everything a single run produced.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RunReport {
    /// The date of the run in `YYYY-MM-DD` format.
    pub local_date: String,
    /// The local time of the run in `HH:MM:SS` format.
    pub local_time: String,
    pub article: Option<Article>,
    pub commentary: Option<CommentaryResult>,
    /// Whether an image was rendered for this run.
    pub image_rendered: bool,
    pub diagnostics: Vec<Diagnostic>,
    pub outcome: RunOutcome,
}
