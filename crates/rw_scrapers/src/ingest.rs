use rw_core::{Article, ArticleFields, ArticleStorage, Config, Error, Result};
use std::sync::Arc;
use tracing::{info, warn};
use url::Url;

use crate::extract::{listing_links, main_content_html, Candidate};
use crate::fetch::{HttpFetcher, PageFetcher};

#[derive(Debug, Default)]
pub struct IngestReport {
    /// Candidate links found on the listing page
    pub found: usize,
    pub stored: Vec<Article>,
    pub failed: Vec<(String, Error)>,
}

/// Scrapes a listing page and stores each linked article as an original.
pub struct IngestJob {
    storage: Arc<dyn ArticleStorage>,
    fetcher: Arc<dyn PageFetcher>,
    listing_url: String,
    max_links: usize,
    source_name: String,
}

impl IngestJob {
    pub fn new(storage: Arc<dyn ArticleStorage>, fetcher: Arc<dyn PageFetcher>, listing_url: &str) -> Self {
        let defaults = Config::default();
        Self {
            storage,
            fetcher,
            listing_url: listing_url.to_string(),
            max_links: defaults.max_links,
            source_name: defaults.source_name,
        }
    }

    pub fn from_config(config: &Config, storage: Arc<dyn ArticleStorage>) -> Result<Self> {
        let fetcher = Arc::new(HttpFetcher::new(config.fetch_timeout)?);
        Ok(Self::new(storage, fetcher, &config.listing_url)
            .with_max_links(config.max_links)
            .with_source_name(&config.source_name))
    }

    pub fn with_max_links(mut self, max_links: usize) -> Self {
        self.max_links = max_links;
        self
    }

    pub fn with_source_name(mut self, source_name: &str) -> Self {
        self.source_name = source_name.to_string();
        self
    }

    /// Fails only if the listing page itself cannot be fetched; per-article
    /// failures are recorded in the report.
    pub async fn run(&self) -> Result<IngestReport> {
        let base = Url::parse(&self.listing_url)
            .map_err(|e| Error::Config(format!("Invalid listing URL {}: {}", self.listing_url, e)))?;

        info!("📥 Fetching listing page {}", self.listing_url);
        let html = self.fetcher.fetch(&self.listing_url).await?;
        let candidates = listing_links(&html, &base, self.max_links);
        info!("🔎 Found {} articles", candidates.len());

        let mut report = IngestReport {
            found: candidates.len(),
            ..Default::default()
        };

        for candidate in candidates {
            match self.ingest_one(&candidate).await {
                Ok(article) => {
                    info!("✅ Stored: {} (ID: {})", article.title, article.id);
                    report.stored.push(article);
                }
                Err(e) => {
                    warn!("❌ Failed {}: {}", candidate.url, e);
                    report.failed.push((candidate.url, e));
                }
            }
        }

        info!(
            "🎉 Ingest complete: {} stored, {} failed",
            report.stored.len(),
            report.failed.len()
        );
        Ok(report)
    }

    async fn ingest_one(&self, candidate: &Candidate) -> Result<Article> {
        let html = self.fetcher.fetch(&candidate.url).await?;
        let content = main_content_html(&html);
        let fields = ArticleFields::original(&self.source_name, &candidate.url, &candidate.title, &content);
        self.storage.create(fields).await
    }
}
