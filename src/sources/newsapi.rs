//! NewsAPI top-headlines source.
//!
//! Calls `GET /v2/top-headlines?sources=...` with the key in the
//! `X-Api-Key` header and applies the shared selection policy to the
//! returned articles. NewsAPI replaces withdrawn stories with the literal
//! title `[Removed]`; those entries are skipped.

use super::{Candidate, NewsSource, select_first};
use crate::models::Article;
use crate::utils::truncate_for_log;
use serde::Deserialize;
use std::error::Error;
use tracing::{error, info, instrument, warn};

pub const DEFAULT_BASE_URL: &str = "https://newsapi.org";
pub const DEFAULT_SOURCES: &str = "bbc-news";

const REMOVED_TITLE: &str = "[Removed]";

#[derive(Debug, Deserialize)]
struct HeadlinesResponse {
    status: String,
    #[serde(default)]
    articles: Vec<HeadlineArticle>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HeadlineArticle {
    title: Option<String>,
    url: Option<String>,
    description: Option<String>,
}

/// News source backed by the NewsAPI headline endpoint.
#[derive(Debug)]
pub struct NewsApiSource {
    api_key: String,
    sources: String,
    base_url: String,
    http: reqwest::Client,
}

impl NewsApiSource {
    pub fn new(api_key: impl Into<String>, sources: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            api_key: api_key.into(),
            sources: sources.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            http,
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    async fn try_fetch(&self) -> Result<Option<Article>, Box<dyn Error>> {
        let url = format!("{}/v2/top-headlines", self.base_url);
        let response = self
            .http
            .get(&url)
            .header("X-Api-Key", &self.api_key)
            .query(&[("sources", self.sources.as_str())])
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(format!("NewsAPI error ({}): {}", status, truncate_for_log(&text, 300)).into());
        }

        let parsed: HeadlinesResponse = serde_json::from_str(&text)?;
        if parsed.status != "ok" {
            let message = parsed.message.unwrap_or_else(|| parsed.status.clone());
            return Err(format!("NewsAPI returned status {}", message).into());
        }

        info!(count = parsed.articles.len(), "Received headlines");
        let candidates = parsed
            .articles
            .into_iter()
            .filter(|a| a.title.as_deref().map(str::trim) != Some(REMOVED_TITLE))
            .map(|a| Candidate {
                title: a.title,
                link: a.url,
                description: a.description,
            });
        Ok(select_first(candidates))
    }
}

impl NewsSource for NewsApiSource {
    #[instrument(level = "info", skip_all, fields(sources = %self.sources))]
    async fn fetch(&self) -> Option<Article> {
        match self.try_fetch().await {
            Ok(Some(article)) => {
                info!(title = %article.title, url = %article.url, "Selected headline");
                Some(article)
            }
            Ok(None) => {
                warn!("No headline with a title and a usable link");
                None
            }
            Err(e) => {
                error!(error = %e, "Headline fetch failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{StubResponse, StubServer};
    use serde_json::json;

    fn source(server: &StubServer) -> NewsApiSource {
        NewsApiSource::new("news-key", "bbc-news", reqwest::Client::new())
            .with_base_url(server.base_url())
    }

    #[tokio::test]
    async fn test_fetch_skips_removed_and_sends_key() {
        let server = StubServer::start().await;
        server.route(
            "GET",
            "/v2/top-headlines",
            StubResponse::json(
                200,
                json!({
                    "status": "ok",
                    "totalResults": 2,
                    "articles": [
                        {"source": {"id": null, "name": "[Removed]"}, "title": "[Removed]", "url": "https://removed.com", "description": "[Removed]"},
                        {"source": {"id": "bbc-news", "name": "BBC News"}, "title": "Floods hit coast", "url": "https://www.bbc.co.uk/news/x", "description": null}
                    ]
                }),
            ),
        );

        let article = source(&server).fetch().await.unwrap();
        assert_eq!(article.title, "Floods hit coast");
        assert_eq!(article.summary, "Floods hit coast");

        let requests = server.requests();
        assert_eq!(requests[0].header("x-api-key"), Some("news-key"));
        assert_eq!(requests[0].query.as_deref(), Some("sources=bbc-news"));
    }

    #[tokio::test]
    async fn test_fetch_error_status_returns_none() {
        let server = StubServer::start().await;
        server.route(
            "GET",
            "/v2/top-headlines",
            StubResponse::json(
                401,
                json!({"status": "error", "code": "apiKeyInvalid", "message": "Your API key is invalid."}),
            ),
        );
        assert!(source(&server).fetch().await.is_none());
    }

    #[tokio::test]
    async fn test_fetch_empty_articles_returns_none() {
        let server = StubServer::start().await;
        server.route(
            "GET",
            "/v2/top-headlines",
            StubResponse::json(200, json!({"status": "ok", "totalResults": 0, "articles": []})),
        );
        assert!(source(&server).fetch().await.is_none());
    }

    #[tokio::test]
    async fn test_fetch_malformed_json_returns_none() {
        let server = StubServer::start().await;
        server.route(
            "GET",
            "/v2/top-headlines",
            StubResponse::text(200, "application/json", r#"{"status": "ok", "articles": [{"title": "#),
        );
        assert!(source(&server).fetch().await.is_none());
    }
}
