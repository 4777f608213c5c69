//! Encyclopedia article fetching for the voice assistant

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use scraper::{Html, Selector};

use crate::config::ArticleConfig;
use crate::{Error, Result};

/// Returned verbatim when an article cannot be retrieved or has no text
pub const ARTICLE_APOLOGY: &str =
    "Sorry, I couldn't retrieve meaningful content from the Wikipedia article.";

/// Produces article text for a spoken topic
#[async_trait]
pub trait ArticleSource: Send + Sync {
    /// Fetch the article for `topic`
    ///
    /// Returns [`ARTICLE_APOLOGY`] when the page is missing or empty.
    ///
    /// # Errors
    ///
    /// Returns error if the request cannot be sent
    async fn fetch(&self, topic: &str) -> Result<String>;
}

/// Fetches article pages over HTTP and keeps their paragraph text
pub struct ArticleFetcher {
    client: Client,
    base_url: String,
}

impl ArticleFetcher {
    /// Create a fetcher for the configured encyclopedia
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn new(config: &ArticleConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .user_agent(concat!("SummarizerX/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(Error::Http)?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }
}

#[async_trait]
impl ArticleSource for ArticleFetcher {
    async fn fetch(&self, topic: &str) -> Result<String> {
        let url = article_url(&self.base_url, topic);
        tracing::info!(%url, "fetching article");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Extraction(format!("article request failed: {e}")))?;

        if response.status() != StatusCode::OK {
            tracing::warn!(status = %response.status(), %url, "article not available");
            return Ok(ARTICLE_APOLOGY.to_string());
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::Extraction(format!("failed to read article body: {e}")))?;

        let text = paragraph_text(&body);
        if text.is_empty() {
            return Ok(ARTICLE_APOLOGY.to_string());
        }
        Ok(text)
    }
}

/// Build the article URL, replacing spaces in the topic with underscores
#[must_use]
pub fn article_url(base_url: &str, topic: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), topic.replace(' ', "_"))
}

/// Join the trimmed text of every non-empty `<p>` with single spaces
#[must_use]
pub fn paragraph_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("p") else {
        return String::new();
    };

    document
        .select(&selector)
        .map(|p| p.text().collect::<String>().trim().to_string())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
