//! Failure taxonomy for pipeline runs and startup configuration.
//!
//! Stage adapters report problems through their contract return types
//! (`None`, a placeholder, a failed [`crate::models::PostOutcome`]). The
//! orchestrator turns each of those into a [`StageFailure`] so every failure
//! is logged once with whether it was recovered or ended the run.

use crate::models::Diagnostic;
use thiserror::Error;

/// A failure observed in one pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StageFailure {
    /// The news source produced no usable article.
    #[error("news source unavailable: {0}")]
    SourceUnavailable(String),

    /// The generation backend errored or returned no usable text.
    #[error("text generation failed: {0}")]
    GenerationFailure(String),

    /// Image rendering or the asset download failed.
    #[error("image rendering failed: {0}")]
    ImageFailure(String),

    /// The platform rejected the image upload.
    #[error("media upload failed: {0}")]
    MediaUploadFailure(String),

    /// The post itself could not be created.
    #[error("publish failed: {0}")]
    PublishFailure(String),
}

impl StageFailure {
    /// Only a missing article or a failed post ends the run.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            StageFailure::SourceUnavailable(_) | StageFailure::PublishFailure(_)
        )
    }

    /// Stable snake_case name used in logs and run reports.
    pub fn kind(&self) -> &'static str {
        match self {
            StageFailure::SourceUnavailable(_) => "source_unavailable",
            StageFailure::GenerationFailure(_) => "generation_failure",
            StageFailure::ImageFailure(_) => "image_failure",
            StageFailure::MediaUploadFailure(_) => "media_upload_failure",
            StageFailure::PublishFailure(_) => "publish_failure",
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic {
            kind: self.kind().to_string(),
            message: self.to_string(),
            recovered: !self.is_fatal(),
        }
    }
}

/// Startup configuration problems. Reported before any network call.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required credential {0} (set it in the environment or pass it on the command line)")]
    MissingCredential(&'static str),

    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("failed to read settings file {path}: {source}")]
    SettingsIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings file {path}: {source}")]
    SettingsParse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}
