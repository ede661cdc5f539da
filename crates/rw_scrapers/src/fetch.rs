use async_trait::async_trait;
use reqwest::Client;
use rw_core::{Error, Result};
use std::time::Duration;

const USER_AGENT: &str = concat!("rw/", env!("CARGO_PKG_VERSION"));

#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Returns the body of `url` as text
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// Plain GET with a per-request timeout. No retries.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::upstream(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::UpstreamUnavailable(format!("{} returned {}", url, status)));
        }

        response.text().await.map_err(|e| Error::upstream(url, e))
    }
}
