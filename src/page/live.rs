//! Live host page.
//!
//! Fetches the quote page over HTTP. The host is a client-routed
//! application, so the effective address is taken from the final response
//! URL (redirects may normalize the symbol).

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::{HostPage, PageSnapshot};

pub struct LivePage {
    http: Client,
    url: String,
}

impl LivePage {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .user_agent("Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36")
            .build()
            .context("Failed to build page HTTP client")?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }
}

#[async_trait]
impl HostPage for LivePage {
    async fn fetch(&self) -> Result<PageSnapshot> {
        let response = self
            .http
            .get(&self.url)
            .send()
            .await
            .context("Page request failed")?;

        let path = response.url().path().to_string();
        let html = response.text().await.context("Page body unreadable")?;
        debug!(path = %path, bytes = html.len(), "Fetched page snapshot");

        Ok(PageSnapshot { path, html })
    }

    fn name(&self) -> &str {
        "live"
    }
}
