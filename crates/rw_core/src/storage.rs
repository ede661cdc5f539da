use async_trait::async_trait;
use crate::types::{Article, ArticleFields};
use crate::Result;

#[async_trait]
pub trait ArticleStorage: Send + Sync {
    /// All articles, newest first
    async fn list(&self) -> Result<Vec<Article>>;

    /// Store a new article; fails with `Conflict` on a duplicate `source_url`
    async fn create(&self, fields: ArticleFields) -> Result<Article>;

    /// Fetch a single article
    async fn get(&self, id: i64) -> Result<Article>;

    /// Overwrite the supplied fields of an article
    async fn update(&self, id: i64, fields: ArticleFields) -> Result<Article>;

    /// Remove an article, clearing `rewritten_from_id` on anything pointing at it
    async fn delete(&self, id: i64) -> Result<()>;
}
