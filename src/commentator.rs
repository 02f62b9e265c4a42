//! Commentary generation with placeholder fallback.
//!
//! [`Commentator`] turns an article into a [`CommentaryResult`]. It bounds
//! its inputs, asks the backend for a short analytical post, cleans the
//! reply, and falls back to a fixed placeholder sentence when the backend
//! fails. `comment` always returns a non-empty body.

use crate::api::AskAsync;
use crate::compose::{char_len, truncate_with_ellipsis};
use crate::models::{BodyOrigin, CommentaryResult};
use crate::prompts::{self, Language};
use crate::utils::{bound_text, truncate_for_log};
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info, instrument, warn};

/// Upper bound on the title placed into a prompt.
pub const MAX_TITLE_CHARS: usize = 300;
/// Upper bound on the summary placed into a prompt.
pub const MAX_SUMMARY_CHARS: usize = 1000;

static LEADING_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?i)(post|tweet|description|投稿文|ツイート)\s*[:：]\s*").unwrap());

static WRAPPING_QUOTES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^["“「『](?s)(.*)["”」』]$"#).unwrap());

/// Clean a generated reply into plain post text.
///
/// Drops an echoed label such as `Tweet:`, unwraps surrounding quotes,
/// removes hashtag tokens and collapses whitespace.
pub fn clean_commentary(raw: &str) -> String {
    let text = raw.trim();
    let text = LEADING_LABEL.replace(text, "");
    let text = WRAPPING_QUOTES.replace(text.trim(), "$1");
    text.split_whitespace()
        .filter(|word| !word.starts_with('#') && !word.starts_with('＃'))
        .join(" ")
}

/// Produces commentary for an article through an [`AskAsync`] backend.
#[derive(Debug)]
pub struct Commentator<A> {
    backend: A,
    language: Language,
    placeholder: String,
    target_chars: usize,
    ellipsis: String,
    image_prompts: bool,
}

impl<A> Commentator<A>
where
    A: AskAsync,
{
    pub fn new(backend: A, language: Language) -> Self {
        Self {
            backend,
            language,
            placeholder: language.placeholder().to_string(),
            target_chars: 117,
            ellipsis: "...".to_string(),
            image_prompts: false,
        }
    }

    /// Replace the placeholder sentence. Blank values are ignored.
    pub fn with_placeholder(mut self, placeholder: &str) -> Self {
        let placeholder = placeholder.trim();
        if !placeholder.is_empty() {
            self.placeholder = placeholder.to_string();
        }
        self
    }

    /// Length the prompt asks the model to stay within. Longer replies are
    /// cut to this length.
    pub fn with_target_chars(mut self, target_chars: usize) -> Self {
        self.target_chars = target_chars;
        self
    }

    /// Marker appended to a reply cut to the target length.
    pub fn with_ellipsis(mut self, ellipsis: &str) -> Self {
        self.ellipsis = ellipsis.to_string();
        self
    }

    /// Also request an image description with every comment.
    pub fn with_image_prompts(mut self, enabled: bool) -> Self {
        self.image_prompts = enabled;
        self
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    /// Generate commentary for an article.
    ///
    /// Never fails: backend errors and empty replies yield the placeholder.
    /// When image prompts are enabled and the description request fails, the
    /// body doubles as the image prompt.
    #[instrument(level = "info", skip_all)]
    pub async fn comment(&self, title: &str, summary: &str) -> CommentaryResult {
        let title = bound_text(title, MAX_TITLE_CHARS);
        let summary = bound_text(summary, MAX_SUMMARY_CHARS);
        let prompt = prompts::commentary(self.language, &title, &summary, self.target_chars);

        let (body, origin) = match self.backend.ask(&prompt).await {
            Ok(reply) => {
                let body = clean_commentary(&reply);
                if body.is_empty() {
                    warn!(reply = %truncate_for_log(&reply, 200), "Reply was empty after cleanup; using placeholder");
                    (self.placeholder.clone(), BodyOrigin::Placeholder)
                } else {
                    let chars = char_len(&body);
                    if chars > self.target_chars {
                        warn!(chars, target = self.target_chars, "Reply exceeded the target length; truncating");
                    }
                    let body = truncate_with_ellipsis(&body, self.target_chars, &self.ellipsis);
                    info!(chars = char_len(&body), "Generated commentary");
                    (body, BodyOrigin::Generated)
                }
            }
            Err(e) => {
                warn!(error = %e, "Commentary generation failed; using placeholder");
                (self.placeholder.clone(), BodyOrigin::Placeholder)
            }
        };

        let mut image_prompt_fallback = false;
        let image_prompt = if self.image_prompts {
            match self.image_prompt(&title, &summary).await {
                Some(description) => Some(description),
                None => {
                    debug!("Using commentary body as image prompt");
                    image_prompt_fallback = true;
                    Some(body.clone())
                }
            }
        } else {
            None
        };

        CommentaryResult {
            body,
            image_prompt,
            image_prompt_fallback,
            origin,
        }
    }

    /// Ask the backend for a one-sentence visual description of the article.
    #[instrument(level = "info", skip_all)]
    pub async fn image_prompt(&self, title: &str, summary: &str) -> Option<String> {
        let title = bound_text(title, MAX_TITLE_CHARS);
        let summary = bound_text(summary, MAX_SUMMARY_CHARS);
        let prompt = prompts::image_description(&title, &summary);

        match self.backend.ask(&prompt).await {
            Ok(reply) => {
                let description = clean_commentary(&reply);
                (!description.is_empty()).then_some(description)
            }
            Err(e) => {
                warn!(error = %e, "Image description request failed");
                None
            }
        }
    }
}
