use chrono::Utc;
use rw_core::{Article, ArticleFields, ArticleStatus, ArticleStorage, Config, Error, InferenceModel, Result};
use rw_inference::ModelKind;
use std::fmt;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::fetch::{HttpFetcher, PageFetcher};
use crate::lock::{FileLock, JobLock, MemoryLock, REWRITE_LOCK_KEY};
use crate::prompt::{build_rewrite_prompt, references_html};
use crate::references::{collect_references, CollectOptions};
use crate::search::{reference_query, SearchProvider, SerperSearch};

/// How the job picks the article to rewrite from the newest-first listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum SelectionPolicy {
    /// First `original` in list order, i.e. the most recently created one
    #[default]
    FirstListed,
    /// The `original` with the earliest `created_at`
    OldestOriginal,
}

impl SelectionPolicy {
    /// Falls back to the first listed article when there are no originals.
    pub fn select<'a>(&self, articles: &'a [Article]) -> Option<&'a Article> {
        let mut originals = articles.iter().filter(|a| a.is_original());
        let picked = match self {
            SelectionPolicy::FirstListed => originals.next(),
            SelectionPolicy::OldestOriginal => originals.min_by_key(|a| (a.created_at, a.id)),
        };
        picked.or_else(|| articles.first())
    }
}

#[derive(Debug)]
pub enum RewriteOutcome {
    Published(Article),
    NoArticles,
    NoReferences,
    /// Another run holds the rewrite lease
    AlreadyRunning,
    PublishFailed(Error),
}

impl fmt::Display for RewriteOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RewriteOutcome::Published(article) => write!(f, "published article {}", article.id),
            RewriteOutcome::NoArticles => f.write_str("no articles to rewrite"),
            RewriteOutcome::NoReferences => f.write_str("no suitable reference articles"),
            RewriteOutcome::AlreadyRunning => f.write_str("another rewrite is in progress"),
            RewriteOutcome::PublishFailed(e) => write!(f, "publish failed: {}", e),
        }
    }
}

/// Rewrites one stored article in the style of pages found by searching its title.
pub struct RewriteJob {
    storage: Arc<dyn ArticleStorage>,
    search: Arc<dyn SearchProvider>,
    fetcher: Arc<dyn PageFetcher>,
    model: Arc<dyn InferenceModel>,
    lock: Arc<dyn JobLock>,
    policy: SelectionPolicy,
    options: CollectOptions,
    search_results: usize,
}

impl RewriteJob {
    pub fn new(
        storage: Arc<dyn ArticleStorage>,
        search: Arc<dyn SearchProvider>,
        fetcher: Arc<dyn PageFetcher>,
        model: Arc<dyn InferenceModel>,
    ) -> Self {
        Self {
            storage,
            search,
            fetcher,
            model,
            lock: Arc::new(MemoryLock::new()),
            policy: SelectionPolicy::default(),
            options: CollectOptions::default(),
            search_results: Config::default().search_results,
        }
    }

    /// Production wiring: Serper search, HTTP fetches, a file lease in `lock_dir`.
    ///
    /// The search key and the chosen provider's key are checked before
    /// anything else is built.
    pub fn from_config(config: &Config, storage: Arc<dyn ArticleStorage>, model: ModelKind) -> Result<Self> {
        let search_key = config.search_key()?;
        match model {
            ModelKind::Deepseek => config.deepseek_key()?,
            ModelKind::Openai | ModelKind::Dummy => config.llm_key()?,
        };

        let model = rw_inference::create_model(model, rw_inference::Config::from_app_config(config, model))?;
        let search = Arc::new(SerperSearch::new(search_key));
        let fetcher = Arc::new(HttpFetcher::new(config.fetch_timeout)?);

        Ok(Self::new(storage, search, fetcher, model)
            .with_lock(Arc::new(FileLock::new(config.lock_dir.clone())))
            .with_options(CollectOptions::from_config(config))
            .with_search_results(config.search_results))
    }

    pub fn with_policy(mut self, policy: SelectionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_lock(mut self, lock: Arc<dyn JobLock>) -> Self {
        self.lock = lock;
        self
    }

    pub fn with_options(mut self, options: CollectOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_search_results(mut self, search_results: usize) -> Self {
        self.search_results = search_results;
        self
    }

    pub async fn run(&self) -> Result<RewriteOutcome> {
        let _lease = match self.lock.try_acquire(REWRITE_LOCK_KEY)? {
            Some(lease) => lease,
            None => {
                warn!("⏳ Another rewrite is already in progress, exiting");
                return Ok(RewriteOutcome::AlreadyRunning);
            }
        };

        info!("🚀 Rewrite: search + LLM rewrite");

        let articles = self.storage.list().await?;
        let original = match self.policy.select(&articles) {
            Some(article) => article,
            None => {
                warn!("❌ No articles found. Run the ingest job first.");
                return Ok(RewriteOutcome::NoArticles);
            }
        };
        info!("📄 Selected article: {} (ID: {})", original.title, original.id);

        let query = reference_query(&original.title, &self.options.excluded_domain);
        info!("🔍 Searching for: {}", query);
        let results = self.search.search(&query, self.search_results).await?;

        let collection = collect_references(&results, self.fetcher.as_ref(), &self.options).await;
        if collection.references.is_empty() {
            warn!(
                "❌ No suitable reference articles found after examining {} results",
                collection.examined
            );
            return Ok(RewriteOutcome::NoReferences);
        }
        info!("🔗 Total references used: {}", collection.references.len());

        let prompt = build_rewrite_prompt(original.content_html.as_deref().unwrap_or(""), &collection.references);
        info!("🧠 Calling {} to rewrite article...", self.model.name());
        let output = self.model.complete(&prompt).await?;

        let references: Vec<_> = collection.references.iter().map(|r| r.reference()).collect();
        let fields = rewritten_fields(original, &output, references);

        info!("📤 Publishing rewritten article...");
        match self.storage.create(fields).await {
            Ok(article) => {
                info!("✅ Rewritten article created: ID {}", article.id);
                Ok(RewriteOutcome::Published(article))
            }
            Err(e) => {
                error!("❌ Error saving rewritten article: {}", e);
                Ok(RewriteOutcome::PublishFailed(e))
            }
        }
    }
}

const REWRITTEN_SOURCE_SUFFIX: &str = "-rewritten";
const REWRITTEN_URL_MARKER: &str = "#rewritten-";
const REWRITTEN_TITLE_SUFFIX: &str = " (LLM Rewritten)";

/// Labels derive from the root article, so rewriting a rewrite does not stack suffixes.
fn rewritten_fields(original: &Article, llm_output: &str, references: Vec<rw_core::Reference>) -> ArticleFields {
    let content_html = format!("{}\n\n{}", llm_output, references_html(&references));
    let source = original
        .source
        .strip_suffix(REWRITTEN_SOURCE_SUFFIX)
        .unwrap_or(&original.source);
    let source_url = original
        .source_url
        .split(REWRITTEN_URL_MARKER)
        .next()
        .unwrap_or(&original.source_url);
    let title = original
        .title
        .strip_suffix(REWRITTEN_TITLE_SUFFIX)
        .unwrap_or(&original.title);

    ArticleFields {
        source: Some(format!("{}{}", source, REWRITTEN_SOURCE_SUFFIX)),
        source_url: Some(format!(
            "{}{}{}",
            source_url,
            REWRITTEN_URL_MARKER,
            Utc::now().timestamp_millis()
        )),
        title: Some(format!("{}{}", title, REWRITTEN_TITLE_SUFFIX)),
        content_html: Some(Some(content_html)),
        status: Some(ArticleStatus::Rewritten),
        rewritten_from_id: Some(Some(original.id)),
        references: Some(references),
    }
}
