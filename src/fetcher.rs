use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::config::ScraperConfig;
use crate::document::{HtmlDocument, QueryableDocument};
use crate::utils::error::{AppError, Result};

/// Retrieves a page and hands back something the extractor can query.
///
/// Parsed HTML trees are not `Send`, so implementations run on the polling
/// task itself.
#[async_trait(?Send)]
pub trait PageFetcher {
    async fn fetch(&self, url: &str) -> Result<Box<dyn QueryableDocument>>;
}

/// Plain HTTP GET followed by an HTML parse.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.request_timeout))
            .build()?;

        Ok(Self { client })
    }

    pub async fn fetch_html(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::fetch(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::fetch(url, format!("unexpected status {}", status)));
        }

        response.text().await.map_err(|e| AppError::fetch(url, e))
    }
}

#[async_trait(?Send)]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Box<dyn QueryableDocument>> {
        let body = self.fetch_html(url).await?;
        tracing::debug!("Fetched {} ({} bytes)", url, body.len());
        Ok(Box::new(HtmlDocument::parse(&body)))
    }
}
