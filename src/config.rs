//! Runtime configuration.
//!
//! Values come from three layers, highest precedence first:
//!
//! 1. command-line flags and their environment variables ([`Cli`]),
//! 2. an optional YAML settings file ([`Settings`]),
//! 3. built-in defaults.
//!
//! [`Config::build`] merges the layers once at startup and validates the
//! result. Nothing downstream reads the environment again.

use crate::api::{self, DEFAULT_MODEL, GenerationSettings};
use crate::cli::Cli;
use crate::compose::PostFormat;
use crate::errors::ConfigError;
use crate::image;
use crate::prompts::Language;
use crate::publisher::oauth::OAuthCredentials;
use crate::publisher::x;
use crate::sources::newsapi::{self, DEFAULT_SOURCES};
use crate::sources::rss::DEFAULT_FEED_URL;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, instrument};
use url::Url;

/// Browser-like user agent; some feeds refuse obvious bots.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_COMMENT_CHARS: usize = 117;
pub const DEFAULT_TAG_LEN: usize = 5;

/// Which headline source to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Rss,
    Newsapi,
}

/// Non-secret tuning loaded from the YAML settings file.
///
/// Every field is optional; unset fields fall through to the defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub source: Option<SourceKind>,
    pub feed_url: Option<String>,
    pub newsapi_sources: Option<String>,
    pub language: Option<Language>,
    pub model: Option<String>,
    pub max_output_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub max_post_chars: Option<usize>,
    pub comment_chars: Option<usize>,
    pub separator: Option<String>,
    pub ellipsis: Option<String>,
    pub tag: Option<bool>,
    pub tag_len: Option<usize>,
    pub placeholder: Option<String>,
    pub images: Option<bool>,
    pub http_timeout_secs: Option<u64>,
    pub user_agent: Option<String>,
    pub report_dir: Option<String>,
    pub endpoints: EndpointSettings,
}

/// Base URL overrides for the remote services, e.g. to go through a proxy.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct EndpointSettings {
    pub gemini: Option<String>,
    pub newsapi: Option<String>,
    pub deepai: Option<String>,
    pub x_api: Option<String>,
    pub x_upload: Option<String>,
}

/// Resolved base URLs for the remote services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub gemini: String,
    pub newsapi: String,
    pub deepai: String,
    pub x_api: String,
    pub x_upload: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            gemini: api::DEFAULT_BASE_URL.to_string(),
            newsapi: newsapi::DEFAULT_BASE_URL.to_string(),
            deepai: image::DEFAULT_BASE_URL.to_string(),
            x_api: x::DEFAULT_API_BASE.to_string(),
            x_upload: x::DEFAULT_UPLOAD_BASE.to_string(),
        }
    }
}

impl Endpoints {
    fn resolve(overrides: EndpointSettings) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let pick = |value: Option<String>, default: String, field| match value {
            Some(url) => http_url(url, field),
            None => Ok(default),
        };
        Ok(Self {
            gemini: pick(overrides.gemini, defaults.gemini, "endpoints.gemini")?,
            newsapi: pick(overrides.newsapi, defaults.newsapi, "endpoints.newsapi")?,
            deepai: pick(overrides.deepai, defaults.deepai, "endpoints.deepai")?,
            x_api: pick(overrides.x_api, defaults.x_api, "endpoints.x_api")?,
            x_upload: pick(overrides.x_upload, defaults.x_upload, "endpoints.x_upload")?,
        })
    }
}

impl Settings {
    /// Load settings from a YAML file.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::SettingsIo {
            path: path.to_string(),
            source,
        })?;
        Self::from_yaml(path, &raw)
    }

    fn from_yaml(path: &str, raw: &str) -> Result<Self, ConfigError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw).map_err(|source| ConfigError::SettingsParse {
            path: path.to_string(),
            source,
        })
    }
}

/// Where headlines come from.
#[derive(Clone, PartialEq)]
pub enum SourceConfig {
    Rss { feed_url: String },
    NewsApi { api_key: String, sources: String },
}

impl std::fmt::Debug for SourceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceConfig::Rss { feed_url } => f.debug_struct("Rss").field("feed_url", feed_url).finish(),
            SourceConfig::NewsApi { sources, .. } => f
                .debug_struct("NewsApi")
                .field("api_key", &"<redacted>")
                .field("sources", sources)
                .finish(),
        }
    }
}

/// Validated, immutable configuration for one run.
#[derive(Clone)]
pub struct Config {
    pub source: SourceConfig,
    pub gemini_api_key: String,
    pub generation: GenerationSettings,
    pub language: Language,
    /// Overrides the per-language placeholder.
    pub placeholder: Option<String>,
    pub comment_chars: usize,
    pub format: PostFormat,
    /// `None` disables the dedup tag.
    pub tag_len: Option<usize>,
    /// `None` disables the image stage.
    pub deepai_api_key: Option<String>,
    /// `None` only in dry-run mode.
    pub x_credentials: Option<OAuthCredentials>,
    pub dry_run: bool,
    pub http_timeout: Duration,
    pub user_agent: String,
    pub report_dir: Option<String>,
    pub endpoints: Endpoints,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("source", &self.source)
            .field("generation", &self.generation)
            .field("language", &self.language)
            .field("comment_chars", &self.comment_chars)
            .field("format", &self.format)
            .field("tag_len", &self.tag_len)
            .field("images", &self.images_enabled())
            .field("dry_run", &self.dry_run)
            .field("http_timeout", &self.http_timeout)
            .field("report_dir", &self.report_dir)
            .field("endpoints", &self.endpoints)
            .finish_non_exhaustive()
    }
}

/// A value that is set and not blank.
fn present(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn require(value: &Option<String>, name: &'static str) -> Result<String, ConfigError> {
    present(value).ok_or(ConfigError::MissingCredential(name))
}

fn positive<T>(value: T, field: &'static str) -> Result<T, ConfigError>
where
    T: PartialOrd + Default + std::fmt::Display + Copy,
{
    if value > T::default() {
        Ok(value)
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("must be greater than zero, got {}", value),
        })
    }
}

fn http_url(value: String, field: &'static str) -> Result<String, ConfigError> {
    match Url::parse(&value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.host_str().is_some() => Ok(value),
        Ok(url) => Err(ConfigError::Invalid {
            field,
            reason: format!("expected an http(s) URL, got scheme {:?}", url.scheme()),
        }),
        Err(e) => Err(ConfigError::Invalid {
            field,
            reason: e.to_string(),
        }),
    }
}

impl Config {
    /// Merge CLI/env values over `settings` and validate the result.
    ///
    /// # Errors
    ///
    /// [`ConfigError::MissingCredential`] when a mandatory secret is absent,
    /// [`ConfigError::Invalid`] for out-of-range or malformed values.
    #[instrument(level = "info", skip_all)]
    pub fn build(cli: &Cli, settings: Settings) -> Result<Self, ConfigError> {
        let gemini_api_key = require(&cli.gemini_api_key, "GEMINI_API_KEY")?;

        let source = match cli.source.or(settings.source).unwrap_or(SourceKind::Rss) {
            SourceKind::Rss => {
                let feed_url = cli
                    .feed_url
                    .clone()
                    .or(settings.feed_url)
                    .unwrap_or_else(|| DEFAULT_FEED_URL.to_string());
                SourceConfig::Rss {
                    feed_url: http_url(feed_url, "feed_url")?,
                }
            }
            SourceKind::Newsapi => SourceConfig::NewsApi {
                api_key: require(&cli.newsapi_api_key, "NEWSAPI_API_KEY")?,
                sources: cli
                    .newsapi_sources
                    .clone()
                    .or(settings.newsapi_sources)
                    .unwrap_or_else(|| DEFAULT_SOURCES.to_string()),
            },
        };

        let x_credentials = if cli.dry_run {
            None
        } else {
            Some(OAuthCredentials {
                consumer_key: require(&cli.x_consumer_key, "X_CONSUMER_KEY")?,
                consumer_secret: require(&cli.x_consumer_secret, "X_CONSUMER_SECRET")?,
                access_token: require(&cli.x_access_token, "X_ACCESS_TOKEN")?,
                access_token_secret: require(&cli.x_access_token_secret, "X_ACCESS_TOKEN_SECRET")?,
            })
        };

        let temperature = settings.temperature.unwrap_or(0.7);
        if !(0.0..=2.0).contains(&temperature) {
            return Err(ConfigError::Invalid {
                field: "temperature",
                reason: format!("must be between 0 and 2, got {}", temperature),
            });
        }
        let generation = GenerationSettings {
            model: cli
                .model
                .clone()
                .or(settings.model)
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            max_output_tokens: positive(settings.max_output_tokens.unwrap_or(150), "max_output_tokens")?,
            temperature,
        };

        let defaults = PostFormat::default();
        let format = PostFormat {
            max_chars: positive(
                cli.max_post_chars.or(settings.max_post_chars).unwrap_or(defaults.max_chars),
                "max_post_chars",
            )?,
            separator: settings.separator.unwrap_or(defaults.separator),
            ellipsis: settings.ellipsis.unwrap_or(defaults.ellipsis),
        };

        let tag_enabled = !cli.no_tag && settings.tag.unwrap_or(true);
        let tag_len = if tag_enabled {
            Some(positive(
                cli.tag_len.or(settings.tag_len).unwrap_or(DEFAULT_TAG_LEN),
                "tag_len",
            )?)
        } else {
            None
        };

        let images_wanted = !cli.no_images && settings.images.unwrap_or(true);
        let deepai_api_key = present(&cli.deepai_api_key).filter(|_| images_wanted);

        let config = Config {
            source,
            gemini_api_key,
            generation,
            language: cli.language.or(settings.language).unwrap_or(Language::English),
            placeholder: present(&settings.placeholder),
            comment_chars: positive(
                cli.comment_chars.or(settings.comment_chars).unwrap_or(DEFAULT_COMMENT_CHARS),
                "comment_chars",
            )?,
            format,
            tag_len,
            deepai_api_key,
            x_credentials,
            dry_run: cli.dry_run,
            http_timeout: Duration::from_secs(positive(
                cli.http_timeout_secs
                    .or(settings.http_timeout_secs)
                    .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS),
                "http_timeout_secs",
            )?),
            user_agent: present(&cli.user_agent)
                .or_else(|| present(&settings.user_agent))
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            report_dir: present(&cli.report_dir).or_else(|| present(&settings.report_dir)),
            endpoints: Endpoints::resolve(settings.endpoints)?,
        };

        info!(
            images = config.images_enabled(),
            dry_run = config.dry_run,
            max_post_chars = config.format.max_chars,
            "Configuration loaded"
        );
        Ok(config)
    }

    pub fn images_enabled(&self) -> bool {
        self.deepai_api_key.is_some()
    }
}
