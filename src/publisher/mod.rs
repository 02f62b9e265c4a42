//! Publishing stage.
//!
//! [`Publisher`] owns the publishing policy and delegates the platform calls
//! to a [`PostClient`]:
//!
//! 1. Assemble `body + separator + link [+ separator + #tag]` within the
//!    character limit (see [`crate::compose`]).
//! 2. Upload the image, if any. A rejected upload is logged and the post
//!    goes out text-only.
//! 3. Re-check the limit on the final string and create the post.
//!
//! Submission failures are captured in the returned [`PostOutcome`].
//!
//! # Clients
//!
//! | Client | Module | Notes |
//! |--------|--------|-------|
//! | X | [`x`] | OAuth 1.0a signed v1.1 media upload and v2 tweet creation |
//! | Dry run | [`dry_run`] | Logs the post, calls nothing |

pub mod dry_run;
pub mod oauth;
pub mod x;

use crate::compose::{self, PostFormat};
use crate::models::{PostOutcome, RenderedImage};
use crate::utils::random_tag;
use std::error::Error;
use tracing::{error, info, instrument, warn};

pub use dry_run::DryRunClient;
pub use x::XClient;

/// Platform calls needed to publish a post.
pub trait PostClient {
    /// Register an image and return the platform's media handle.
    async fn upload_media(&self, image: &RenderedImage) -> Result<String, Box<dyn Error>>;

    /// Create a post and return its identifier.
    async fn create_post(&self, text: &str, media_ids: &[String]) -> Result<String, Box<dyn Error>>;
}

/// The platform client selected by configuration.
#[derive(Debug)]
pub enum Target {
    X(XClient),
    DryRun(DryRunClient),
}

impl PostClient for Target {
    async fn upload_media(&self, image: &RenderedImage) -> Result<String, Box<dyn Error>> {
        match self {
            Target::X(client) => client.upload_media(image).await,
            Target::DryRun(client) => client.upload_media(image).await,
        }
    }

    async fn create_post(&self, text: &str, media_ids: &[String]) -> Result<String, Box<dyn Error>> {
        match self {
            Target::X(client) => client.create_post(text, media_ids).await,
            Target::DryRun(client) => client.create_post(text, media_ids).await,
        }
    }
}

/// Composes and submits posts through a [`PostClient`].
#[derive(Debug)]
pub struct Publisher<C> {
    client: C,
    format: PostFormat,
    tag_len: Option<usize>,
}

impl<C> Publisher<C>
where
    C: PostClient,
{
    /// A publisher that appends a five character tag to every post.
    pub fn new(client: C, format: PostFormat) -> Self {
        Self {
            client,
            format,
            tag_len: Some(5),
        }
    }

    /// Tag length, or `None` to post without a tag.
    pub fn with_tag_len(mut self, tag_len: Option<usize>) -> Self {
        self.tag_len = tag_len.filter(|len| *len > 0);
        self
    }

    #[cfg(test)]
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Publish `body` with `link` and an optional image.
    #[instrument(level = "info", skip_all, fields(%link, image = image.is_some()))]
    pub async fn publish(&self, body: &str, link: &str, image: Option<RenderedImage>) -> PostOutcome {
        let tag = self.tag_len.map(random_tag);
        let text = compose::assemble(body, link, tag.as_deref(), &self.format);

        let mut media_ids = Vec::new();
        let mut media_error = None;
        if let Some(image) = image {
            match self.client.upload_media(&image).await {
                Ok(media_id) => media_ids.push(media_id),
                Err(e) => {
                    warn!(error = %e, "Media upload failed; falling back to a text-only post");
                    media_error = Some(e.to_string());
                }
            }
        }

        let text = compose::enforce_limit(&text, &self.format);
        match self.client.create_post(&text, &media_ids).await {
            Ok(post_id) => {
                info!(%post_id, media = media_ids.len(), "Post created");
                PostOutcome::posted(post_id, text, media_error)
            }
            Err(e) => {
                error!(error = %e, "Post submission failed");
                PostOutcome::failed(e.to_string(), text, media_error)
            }
        }
    }
}
