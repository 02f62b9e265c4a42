//! # News Commentary Bot
//!
//! Fetches one current headline, asks an LLM for a short expert-style
//! commentary on it, optionally renders an illustrative image, and posts the
//! commentary with the article link to X. Intended to run on a schedule
//! (cron, systemd timer); every invocation is an independent run.
//!
//! ## Usage
//!
//! ```sh
//! news_commentary_bot --report-dir ./runs
//! ```
//!
//! ## Architecture
//!
//! One run moves through four stages:
//! 1. **Source**: the first usable item of an RSS feed or NewsAPI
//! 2. **Commentary**: Gemini writes the post body (placeholder on failure)
//! 3. **Image**: DeepAI renders an image when a key is configured
//! 4. **Publish**: body, link and dedup tag are fitted to the character
//!    limit and posted, with the image when its upload succeeds
//!
//! Exit status is 0 when a post was made or there was no article to post,
//! 1 when publishing failed and 2 for configuration errors.

use clap::Parser;
use std::process::ExitCode;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod commentator;
mod compose;
mod config;
mod errors;
mod image;
mod models;
mod outputs;
mod pipeline;
mod prompts;
mod publisher;
mod sources;
#[cfg(test)]
mod test_support;
mod utils;

use api::GeminiClient;
use cli::Cli;
use commentator::Commentator;
use config::{Config, Settings, SourceConfig};
use errors::ConfigError;
use image::DeepAiRenderer;
use models::{RunOutcome, RunReport};
use outputs::json;
use pipeline::Pipeline;
use publisher::{DryRunClient, Publisher, Target, XClient};
use sources::{NewsApiSource, RssSource, Source};
use utils::{ensure_writable_dir, http_client};

fn load_config(cli: &Cli) -> Result<Config, ConfigError> {
    let settings = match cli.config.as_deref() {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    Config::build(cli, settings)
}

/// Wire the adapters selected by `config` into a pipeline and run it once.
async fn run(config: &Config) -> Result<RunReport, ConfigError> {
    let http = http_client(config.http_timeout, &config.user_agent)?;

    let endpoints = &config.endpoints;

    let source = match &config.source {
        SourceConfig::Rss { feed_url } => Source::Rss(RssSource::new(feed_url.clone(), http.clone())),
        SourceConfig::NewsApi { api_key, sources } => Source::NewsApi(
            NewsApiSource::new(api_key.clone(), sources.clone(), http.clone())
                .with_base_url(&endpoints.newsapi),
        ),
    };

    let backend = GeminiClient::new(
        config.gemini_api_key.clone(),
        config.generation.clone(),
        http.clone(),
    )
    .with_base_url(&endpoints.gemini);
    let mut commentator = Commentator::new(backend, config.language)
        .with_target_chars(config.comment_chars)
        .with_ellipsis(&config.format.ellipsis)
        .with_image_prompts(config.images_enabled());
    if let Some(placeholder) = config.placeholder.as_deref() {
        commentator = commentator.with_placeholder(placeholder);
    }
    debug!(language = ?config.language, placeholder = %commentator.placeholder(), "Commentator ready");

    let renderer = config
        .deepai_api_key
        .as_ref()
        .map(|key| DeepAiRenderer::new(key.clone(), http.clone()).with_base_url(&endpoints.deepai));

    let target = match &config.x_credentials {
        Some(credentials) => Target::X(
            XClient::new(credentials.clone(), http).with_base_urls(&endpoints.x_api, &endpoints.x_upload),
        ),
        None => Target::DryRun(DryRunClient::new()),
    };
    let publisher = Publisher::new(target, config.format.clone()).with_tag_len(config.tag_len);

    Ok(Pipeline::new(source, commentator, renderer, publisher).run().await)
}

/// One line saying what the run produced.
fn summary_line(report: &RunReport, dry_run: bool) -> String {
    match &report.outcome {
        RunOutcome::Published(outcome) if outcome.success && dry_run => {
            format!("[dry run] would post: {}", outcome.text)
        }
        RunOutcome::Published(outcome) if outcome.success => {
            format!("posted {}", outcome.post_id.as_deref().unwrap_or_default())
        }
        RunOutcome::Published(outcome) => format!(
            "no post made: publish failed: {}",
            outcome.error.as_deref().unwrap_or("unknown error")
        ),
        RunOutcome::Aborted { reason } => format!("no post made: {}", reason),
    }
}

/// 1 when the publisher was invoked and failed, 0 otherwise.
fn exit_status(outcome: &RunOutcome) -> u8 {
    match outcome {
        RunOutcome::Published(outcome) if !outcome.success => 1,
        _ => 0,
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("news_commentary_bot starting up");

    let args = Cli::parse();
    debug!(config = ?args.config, dry_run = args.dry_run, "Parsed CLI arguments");

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Configuration error");
            eprintln!("configuration error: {}", e);
            return ExitCode::from(2);
        }
    };
    debug!(?config, "Resolved configuration");

    // Early check: fail before any network call if reports cannot be written
    if let Some(dir) = config.report_dir.as_deref() {
        if let Err(e) = ensure_writable_dir(dir).await {
            error!(path = %dir, error = %e, "Report directory is not writable (fix perms or choose a different path)");
            eprintln!("configuration error: report directory {} is not writable: {}", dir, e);
            return ExitCode::from(2);
        }
    }

    let report = match run(&config).await {
        Ok(report) => report,
        Err(e) => {
            error!(error = %e, "Failed to set up the pipeline");
            eprintln!("configuration error: {}", e);
            return ExitCode::from(2);
        }
    };

    if let Some(dir) = config.report_dir.as_deref() {
        if let Err(e) = json::write_report(&report, dir).await {
            error!(path = %dir, error = %e, "Failed to write run report");
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        posted = report.outcome.posted(),
        diagnostics = report.diagnostics.len(),
        "Execution complete"
    );
    println!("{}", summary_line(&report, config.dry_run));

    ExitCode::from(exit_status(&report.outcome))
}
