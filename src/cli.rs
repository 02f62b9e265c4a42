//! Command-line interface definitions.
//!
//! Every option can also be supplied through the environment variable named
//! in its `env` attribute. Unset options fall back to the YAML settings file
//! and then to built-in defaults (see [`crate::config`]).

use crate::config::SourceKind;
use crate::prompts::Language;
use clap::Parser;

/// Command-line arguments for one bot run.
///
/// # Examples
///
/// ```sh
/// # Post the top BBC headline with commentary (secrets from .env)
/// news_commentary_bot
///
/// # Japanese commentary, no image, print instead of posting
/// news_commentary_bot --language ja --no-images --dry-run
///
/// # Keep a JSON record of every run
/// news_commentary_bot --report-dir ./runs
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML settings file
    #[arg(short, long, env = "BOT_CONFIG")]
    pub config: Option<String>,

    /// Headline source
    #[arg(long, value_enum, env = "NEWS_SOURCE")]
    pub source: Option<SourceKind>,

    /// RSS feed URL (rss source)
    #[arg(long, env = "NEWS_FEED_URL")]
    pub feed_url: Option<String>,

    /// Comma-separated NewsAPI source ids (newsapi source)
    #[arg(long, env = "NEWSAPI_SOURCES")]
    pub newsapi_sources: Option<String>,

    /// Commentary language
    #[arg(short, long, value_enum, env = "COMMENTARY_LANGUAGE")]
    pub language: Option<Language>,

    /// Gemini model name
    #[arg(long, env = "GEMINI_MODEL")]
    pub model: Option<String>,

    /// Maximum characters in the final post
    #[arg(long, env = "MAX_POST_CHARS")]
    pub max_post_chars: Option<usize>,

    /// Character budget requested from the model for the commentary
    #[arg(long, env = "COMMENT_CHARS")]
    pub comment_chars: Option<usize>,

    /// Length of the random dedup tag
    #[arg(long, env = "TAG_LEN")]
    pub tag_len: Option<usize>,

    /// Post without the random dedup tag
    #[arg(long)]
    pub no_tag: bool,

    /// Skip image rendering even when a DeepAI key is configured
    #[arg(long)]
    pub no_images: bool,

    /// Log and print the post instead of submitting it
    #[arg(long, env = "DRY_RUN")]
    pub dry_run: bool,

    /// Per-request HTTP timeout in seconds
    #[arg(long, env = "HTTP_TIMEOUT_SECS")]
    pub http_timeout_secs: Option<u64>,

    /// User agent sent with every request
    #[arg(long, env = "HTTP_USER_AGENT")]
    pub user_agent: Option<String>,

    /// Directory for JSON run reports
    #[arg(short, long, env = "REPORT_DIR")]
    pub report_dir: Option<String>,

    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    /// NewsAPI key (newsapi source only)
    #[arg(long, env = "NEWSAPI_API_KEY", hide_env_values = true)]
    pub newsapi_api_key: Option<String>,

    /// DeepAI key; images are disabled without it
    #[arg(long, env = "DEEPAI_API_KEY", hide_env_values = true)]
    pub deepai_api_key: Option<String>,

    /// X consumer (API) key
    #[arg(long, env = "X_CONSUMER_KEY", hide_env_values = true)]
    pub x_consumer_key: Option<String>,

    /// X consumer (API) secret
    #[arg(long, env = "X_CONSUMER_SECRET", hide_env_values = true)]
    pub x_consumer_secret: Option<String>,

    /// X access token
    #[arg(long, env = "X_ACCESS_TOKEN", hide_env_values = true)]
    pub x_access_token: Option<String>,

    /// X access token secret
    #[arg(long, env = "X_ACCESS_TOKEN_SECRET", hide_env_values = true)]
    pub x_access_token_secret: Option<String>,
}
