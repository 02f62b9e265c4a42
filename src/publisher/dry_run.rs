//! Client that logs posts instead of submitting them.

use super::PostClient;
use crate::models::RenderedImage;
use std::cell::Cell;
use std::error::Error;
use tracing::info;

#[derive(Debug, Default)]
pub struct DryRunClient {
    uploads: Cell<usize>,
}

impl DryRunClient {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PostClient for DryRunClient {
    async fn upload_media(&self, image: &RenderedImage) -> Result<String, Box<dyn Error>> {
        self.uploads.set(self.uploads.get() + 1);
        info!(bytes = image.bytes.len(), source = %image.source_url, "[dry run] would upload media");
        Ok(format!("dry-run-media-{}", self.uploads.get()))
    }

    async fn create_post(&self, text: &str, media_ids: &[String]) -> Result<String, Box<dyn Error>> {
        info!(%text, ?media_ids, "[dry run] would create post");
        Ok("dry-run".to_string())
    }
}
