use clap::{Args, Subcommand};
use rw_core::{ArticleStorage, Config, Result};
use rw_inference::ModelKind;
use std::sync::Arc;
use tracing::info;

use crate::ingest::IngestJob;
use crate::rewrite::{RewriteJob, RewriteOutcome, SelectionPolicy};

#[derive(Args, Debug, Clone)]
pub struct JobArgs {
    #[command(subcommand)]
    pub command: JobCommands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum JobCommands {
    /// Scrape the blog listing and store each article as an original
    Ingest {
        /// Listing page to start from (defaults to LISTING_URL)
        #[arg(long)]
        listing: Option<String>,
        /// Maximum number of articles to take from the listing
        #[arg(long)]
        max: Option<usize>,
    },
    /// Rewrite one stored article using search results as references
    Rewrite {
        #[arg(long, value_enum, default_value_t = SelectionPolicy::FirstListed)]
        policy: SelectionPolicy,
        /// LLM provider (defaults to LLM_MODEL)
        #[arg(long, value_enum)]
        model: Option<ModelKind>,
    },
}

pub async fn handle_command(args: JobArgs, config: &Config, storage: Arc<dyn ArticleStorage>) -> Result<()> {
    match args.command {
        JobCommands::Ingest { listing, max } => {
            let mut config = config.clone();
            if let Some(listing) = listing {
                config.listing_url = listing;
            }
            if let Some(max) = max {
                config.max_links = max;
            }
            let report = IngestJob::from_config(&config, storage)?.run().await?;
            info!(
                "📊 {} found, {} stored, {} failed",
                report.found,
                report.stored.len(),
                report.failed.len()
            );
        }
        JobCommands::Rewrite { policy, model } => {
            let model = model_kind(model, config)?;
            let job = RewriteJob::from_config(config, storage, model)?.with_policy(policy);
            match job.run().await? {
                RewriteOutcome::Published(article) => {
                    info!("🎉 Done! Rewritten article: {} (ID: {})", article.title, article.id)
                }
                outcome => info!("🛑 Nothing published: {}", outcome),
            }
        }
    }
    Ok(())
}

/// The `--model` flag wins over `LLM_MODEL`.
pub fn model_kind(flag: Option<ModelKind>, config: &Config) -> Result<ModelKind> {
    match flag {
        Some(kind) => Ok(kind),
        None => config.llm_model.parse(),
    }
}
