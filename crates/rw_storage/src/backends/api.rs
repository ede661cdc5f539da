use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use rw_core::{Article, ArticleFields, ArticleStorage, Error, Result};
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;

/// Talks to a running Article API instead of a local database.
///
/// The batch jobs use this backend so that every read and write goes
/// through the same HTTP surface external clients see. HTTP status codes
/// from the API are mapped back onto the store's error taxonomy.
#[derive(Clone)]
pub struct ApiStorage {
    client: Arc<Client>,
    endpoint: String,
}

impl ApiStorage {
    pub fn new(base_url: &str) -> Result<Self> {
        let base = url::Url::parse(base_url)
            .map_err(|e| Error::Config(format!("Invalid API base URL {}: {}", base_url, e)))?;
        let endpoint = format!("{}/api/articles", base.as_str().trim_end_matches('/'));
        Ok(Self {
            client: Arc::new(Client::new()),
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn article_url(&self, id: i64) -> String {
        format!("{}/{}", self.endpoint, id)
    }

    async fn send(&self, request: reqwest::RequestBuilder, id: Option<i64>) -> Result<Response> {
        let response = request
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| Error::upstream(&self.endpoint, e))?;
        check_status(response, id).await
    }

    async fn json<T: DeserializeOwned>(&self, response: Response) -> Result<T> {
        response
            .json::<T>()
            .await
            .map_err(|e| Error::upstream("Invalid Article API response", e))
    }
}

async fn check_status(response: Response, id: Option<i64>) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    // Keep whatever the server said; it ends up in the job logs
    let body = response.text().await.unwrap_or_default();
    Err(match status {
        StatusCode::NOT_FOUND => Error::NotFound(id.unwrap_or_default()),
        StatusCode::CONFLICT => Error::Conflict(body),
        StatusCode::UNPROCESSABLE_ENTITY | StatusCode::BAD_REQUEST => Error::Validation(body),
        other => Error::UpstreamUnavailable(format!("Article API returned {}: {}", other, body)),
    })
}

impl fmt::Debug for ApiStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiStorage")
            .field("client", &"<reqwest::Client>")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

#[async_trait]
impl ArticleStorage for ApiStorage {
    async fn list(&self) -> Result<Vec<Article>> {
        let response = self.send(self.client.get(&self.endpoint), None).await?;
        self.json(response).await
    }

    async fn create(&self, fields: ArticleFields) -> Result<Article> {
        let response = self
            .send(self.client.post(&self.endpoint).json(&fields), None)
            .await?;
        self.json(response).await
    }

    async fn get(&self, id: i64) -> Result<Article> {
        let response = self.send(self.client.get(self.article_url(id)), Some(id)).await?;
        self.json(response).await
    }

    async fn update(&self, id: i64, fields: ArticleFields) -> Result<Article> {
        let response = self
            .send(self.client.put(self.article_url(id)).json(&fields), Some(id))
            .await?;
        self.json(response).await
    }

    async fn delete(&self, id: i64) -> Result<()> {
        self.send(self.client.delete(self.article_url(id)), Some(id)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_from_base_url() {
        let storage = ApiStorage::new("http://127.0.0.1:8000").unwrap();
        assert_eq!(storage.endpoint(), "http://127.0.0.1:8000/api/articles");

        let storage = ApiStorage::new("http://api.internal:9000/").unwrap();
        assert_eq!(storage.endpoint(), "http://api.internal:9000/api/articles");
        assert_eq!(storage.article_url(7), "http://api.internal:9000/api/articles/7");
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(ApiStorage::new("not a url"), Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_unreachable_api_is_upstream_error() {
        // Port 9 (discard) on localhost is not expected to run an HTTP server
        let storage = ApiStorage::new("http://127.0.0.1:9").unwrap();
        assert!(matches!(storage.list().await, Err(Error::UpstreamUnavailable(_))));
    }
}
