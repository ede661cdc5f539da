use async_trait::async_trait;
use reqwest::Client;
use rw_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

const SERPER_URL: &str = "https://google.serper.dev/search";

/// One organic hit, in the order the search API ranked it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub title: String,
    pub link: Option<String>,
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str, num: usize) -> Result<Vec<SearchResult>>;
}

/// Quoted title, excluding the source site so the article does not find itself.
pub fn reference_query(title: &str, excluded_domain: &str) -> String {
    format!("\"{}\" -site:{}", title, excluded_domain)
}

#[derive(Serialize)]
struct SerperRequest<'a> {
    q: &'a str,
    num: usize,
}

#[derive(Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<SearchResult>,
}

/// Google results through serper.dev.
pub struct SerperSearch {
    client: Arc<Client>,
    api_key: String,
    endpoint: String,
}

impl SerperSearch {
    pub fn new(api_key: &str) -> Self {
        Self {
            client: Arc::new(Client::new()),
            api_key: api_key.to_string(),
            endpoint: SERPER_URL.to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }
}

impl fmt::Debug for SerperSearch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerperSearch")
            .field("api_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

#[async_trait]
impl SearchProvider for SerperSearch {
    async fn search(&self, query: &str, num: usize) -> Result<Vec<SearchResult>> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("X-API-KEY", self.api_key.as_str())
            .json(&SerperRequest { q: query, num })
            .send()
            .await
            .map_err(|e| Error::upstream("Search request failed", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::UpstreamUnavailable(format!("Search API returned {}: {}", status, body)));
        }

        let response = response
            .json::<SerperResponse>()
            .await
            .map_err(|e| Error::upstream("Invalid search response", e))?;
        Ok(response.organic)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Returns the same results for every query and records what was asked.
    pub struct CannedSearch {
        results: Vec<SearchResult>,
        pub queries: Mutex<Vec<(String, usize)>>,
    }

    impl CannedSearch {
        pub fn new(results: Vec<SearchResult>) -> Self {
            Self {
                results,
                queries: Mutex::new(Vec::new()),
            }
        }
    }

    pub fn hit(title: &str, link: &str) -> SearchResult {
        SearchResult {
            title: title.to_string(),
            link: Some(link.to_string()),
        }
    }

    #[async_trait]
    impl SearchProvider for CannedSearch {
        async fn search(&self, query: &str, num: usize) -> Result<Vec<SearchResult>> {
            self.queries.lock().unwrap().push((query.to_string(), num));
            Ok(self.results.clone())
        }
    }
}
