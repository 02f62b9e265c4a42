//! News sources that supply the article for a run.
//!
//! Every source implements [`NewsSource`] and follows the same contract:
//! one network call, then the first item in the source's natural order that
//! has a non-empty title and a resolvable link is returned. Transport errors,
//! HTTP error statuses and unparseable bodies all yield `None`.
//!
//! # Supported Sources
//!
//! | Source | Module | Method | Notes |
//! |--------|--------|--------|-------|
//! | RSS 2.0 feed | [`rss`] | XML feed parse | Defaults to the BBC News top stories feed |
//! | NewsAPI | [`newsapi`] | Top headlines API | Requires `NEWSAPI_API_KEY` |

pub mod newsapi;
pub mod rss;

use crate::models::Article;
use crate::utils::strip_html;
use tracing::debug;
use url::Url;

pub use newsapi::NewsApiSource;
pub use rss::RssSource;

/// Produces at most one article per call.
pub trait NewsSource {
    /// Fetch the first usable article, or `None` when nothing qualifies.
    ///
    /// Implementations never return an error: every failure is logged and
    /// reported as `None`.
    async fn fetch(&self) -> Option<Article>;
}

/// A feed entry before validation.
#[derive(Debug, Default, Clone)]
pub struct Candidate {
    pub title: Option<String>,
    pub link: Option<String>,
    pub description: Option<String>,
}

/// Pick the first candidate with a non-empty title and a resolvable link.
///
/// Candidates failing the check are skipped. The summary is the flattened
/// description, or the title when the description is missing or blank.
pub fn select_first<I>(candidates: I) -> Option<Article>
where
    I: IntoIterator<Item = Candidate>,
{
    candidates.into_iter().enumerate().find_map(|(index, candidate)| {
        let article = to_article(candidate);
        if article.is_none() {
            debug!(index, "Skipping feed item without title or usable link");
        }
        article
    })
}

fn to_article(candidate: Candidate) -> Option<Article> {
    let title = candidate
        .title
        .map(|t| strip_html(&t))
        .filter(|t| !t.is_empty())?;
    let url = candidate
        .link
        .map(|l| l.trim().to_string())
        .filter(|l| is_resolvable(l))?;
    let summary = candidate
        .description
        .map(|d| strip_html(&d))
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| title.clone());

    Some(Article {
        title,
        url,
        summary,
    })
}

/// Absolute `http`/`https` URL with a host.
fn is_resolvable(link: &str) -> bool {
    match Url::parse(link) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host_str().is_some(),
        Err(_) => false,
    }
}

/// The news source selected by configuration.
#[derive(Debug)]
pub enum Source {
    Rss(RssSource),
    NewsApi(NewsApiSource),
}

impl NewsSource for Source {
    async fn fetch(&self) -> Option<Article> {
        match self {
            Source::Rss(source) => source.fetch().await,
            Source::NewsApi(source) => source.fetch().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(title: Option<&str>, link: Option<&str>, description: Option<&str>) -> Candidate {
        Candidate {
            title: title.map(str::to_string),
            link: link.map(str::to_string),
            description: description.map(str::to_string),
        }
    }

    #[test]
    fn test_select_first_returns_first_valid_item() {
        let article = select_first(vec![
            candidate(Some("First"), Some("https://bbc.co.uk/1"), Some("One")),
            candidate(Some("Second"), Some("https://bbc.co.uk/2"), Some("Two")),
        ])
        .unwrap();
        assert_eq!(article.title, "First");
        assert_eq!(article.url, "https://bbc.co.uk/1");
        assert_eq!(article.summary, "One");
    }

    #[test]
    fn test_select_first_skips_invalid_items() {
        let article = select_first(vec![
            candidate(None, Some("https://bbc.co.uk/1"), None),
            candidate(Some("   "), Some("https://bbc.co.uk/2"), None),
            candidate(Some("No link"), None, None),
            candidate(Some("Relative"), Some("/news/3"), None),
            candidate(Some("Placeholder link"), Some("#"), None),
            candidate(Some("Wrong scheme"), Some("ftp://bbc.co.uk/4"), None),
            candidate(Some("Good"), Some(" https://bbc.co.uk/5 "), None),
        ])
        .unwrap();
        assert_eq!(article.title, "Good");
        assert_eq!(article.url, "https://bbc.co.uk/5");
    }

    #[test]
    fn test_select_first_summary_falls_back_to_title() {
        let article = select_first(vec![candidate(
            Some("Headline"),
            Some("https://bbc.co.uk/1"),
            Some("  "),
        )])
        .unwrap();
        assert_eq!(article.summary, "Headline");

        let article =
            select_first(vec![candidate(Some("Headline"), Some("https://bbc.co.uk/1"), None)])
                .unwrap();
        assert_eq!(article.summary, "Headline");
    }

    #[test]
    fn test_select_first_flattens_html_description() {
        let article = select_first(vec![candidate(
            Some("Headline"),
            Some("https://bbc.co.uk/1"),
            Some("<p>Talks <em>resume</em> today</p>"),
        )])
        .unwrap();
        assert_eq!(article.summary, "Talks resume today");
    }

    #[test]
    fn test_select_first_none_when_nothing_qualifies() {
        assert!(select_first(Vec::new()).is_none());
        assert!(select_first(vec![candidate(Some("t"), Some("not a url"), None)]).is_none());
    }
}
