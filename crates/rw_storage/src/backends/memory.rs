use async_trait::async_trait;
use chrono::Utc;
use rw_core::{Article, ArticleFields, ArticleStorage, Error, Result};
use std::sync::Arc;
use tokio::sync::RwLock;

pub struct MemoryStore {
    articles: Vec<Article>,
    next_id: i64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            articles: Vec::new(),
            next_id: 1,
        }
    }

    fn position(&self, id: i64) -> Result<usize> {
        self.articles
            .iter()
            .position(|a| a.id == id)
            .ok_or(Error::NotFound(id))
    }

    fn check_unique_url(&self, url: &str, except: Option<i64>) -> Result<()> {
        if self
            .articles
            .iter()
            .any(|a| a.source_url == url && Some(a.id) != except)
        {
            return Err(Error::Conflict(format!("source_url already exists: {}", url)));
        }
        Ok(())
    }

    fn check_back_reference(&self, fields: &ArticleFields) -> Result<()> {
        if let Some(Some(target)) = fields.rewritten_from_id {
            if !self.articles.iter().any(|a| a.id == target) {
                return Err(Error::Validation(format!(
                    "rewritten_from_id {} does not reference an existing article",
                    target
                )));
            }
        }
        Ok(())
    }

    pub fn list(&self) -> Vec<Article> {
        let mut articles = self.articles.clone();
        articles.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        articles
    }

    pub fn create(&mut self, fields: ArticleFields) -> Result<Article> {
        fields.validate_for_create()?;
        if let Some(url) = fields.source_url.as_deref() {
            self.check_unique_url(url, None)?;
        }
        self.check_back_reference(&fields)?;

        let article = fields.into_article(self.next_id, Utc::now());
        self.next_id += 1;
        self.articles.push(article.clone());
        Ok(article)
    }

    pub fn get(&self, id: i64) -> Result<Article> {
        let index = self.position(id)?;
        Ok(self.articles[index].clone())
    }

    pub fn update(&mut self, id: i64, fields: ArticleFields) -> Result<Article> {
        let index = self.position(id)?;
        if let Some(url) = fields.source_url.as_deref() {
            self.check_unique_url(url, Some(id))?;
        }
        self.check_back_reference(&fields)?;

        let article = &mut self.articles[index];
        fields.apply_to(article, Utc::now());
        Ok(article.clone())
    }

    pub fn delete(&mut self, id: i64) -> Result<()> {
        let index = self.position(id)?;
        self.articles.remove(index);
        for article in self.articles.iter_mut() {
            if article.rewritten_from_id == Some(id) {
                article.rewritten_from_id = None;
            }
        }
        Ok(())
    }
}

/// Process-local store; contents are lost when it is dropped.
#[derive(Clone, Default)]
pub struct InMemoryStorage {
    store: Arc<RwLock<MemoryStore>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(MemoryStore::new())),
        }
    }
}

#[async_trait]
impl ArticleStorage for InMemoryStorage {
    async fn list(&self) -> Result<Vec<Article>> {
        let store = self.store.read().await;
        Ok(store.list())
    }

    async fn create(&self, fields: ArticleFields) -> Result<Article> {
        let mut store = self.store.write().await;
        store.create(fields)
    }

    async fn get(&self, id: i64) -> Result<Article> {
        let store = self.store.read().await;
        store.get(id)
    }

    async fn update(&self, id: i64, fields: ArticleFields) -> Result<Article> {
        let mut store = self.store.write().await;
        store.update(id, fields)
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let mut store = self.store.write().await;
        store.delete(id)
    }
}
