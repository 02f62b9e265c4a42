//! RSS 2.0 feed source.
//!
//! Downloads a single feed document (by default the BBC News top stories
//! feed) and walks `rss/channel/item` in document order. Only `title`,
//! `link` and `description` are read; every other element is ignored.

use super::{Candidate, NewsSource, select_first};
use crate::models::Article;
use serde::Deserialize;
use std::error::Error;
use tracing::{error, info, instrument, warn};

/// Default feed when none is configured.
pub const DEFAULT_FEED_URL: &str = "https://feeds.bbci.co.uk/news/rss.xml";

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

/// `item`s may be interleaved with other channel elements; collecting them
/// into one `Vec` relies on quick-xml's `overlapped-lists` feature.
#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    description: Option<String>,
}

impl From<Item> for Candidate {
    fn from(item: Item) -> Self {
        Candidate {
            title: item.title,
            link: item.link,
            description: item.description,
        }
    }
}

/// Parse an RSS 2.0 document into candidates, preserving feed order.
pub fn parse_feed(xml: &str) -> Result<Vec<Candidate>, quick_xml::DeError> {
    let rss: Rss = quick_xml::de::from_str(xml)?;
    Ok(rss.channel.items.into_iter().map(Candidate::from).collect())
}

/// News source backed by an RSS feed.
#[derive(Debug)]
pub struct RssSource {
    feed_url: String,
    http: reqwest::Client,
}

impl RssSource {
    pub fn new(feed_url: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            feed_url: feed_url.into(),
            http,
        }
    }

    async fn try_fetch(&self) -> Result<Option<Article>, Box<dyn Error>> {
        let response = self.http.get(&self.feed_url).send().await?;
        let response = response.error_for_status()?;
        let body = response.text().await?;

        let items = parse_feed(&body)?;
        info!(count = items.len(), "Parsed feed items");
        Ok(select_first(items))
    }
}

impl NewsSource for RssSource {
    #[instrument(level = "info", skip_all, fields(feed_url = %self.feed_url))]
    async fn fetch(&self) -> Option<Article> {
        match self.try_fetch().await {
            Ok(Some(article)) => {
                info!(title = %article.title, url = %article.url, "Selected feed item");
                Some(article)
            }
            Ok(None) => {
                warn!("Feed contained no item with a title and a usable link");
                None
            }
            Err(e) => {
                error!(error = %e, "Feed fetch failed");
                None
            }
        }
    }
}
