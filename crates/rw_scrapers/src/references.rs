use rw_core::{Config, Reference};
use tracing::{info, warn};

use crate::extract::{reference_text, truncate_chars};
use crate::fetch::PageFetcher;
use crate::search::SearchResult;

/// A scraped reference page, ready to go into the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceArticle {
    pub title: String,
    pub url: String,
    pub content: String,
}

impl ReferenceArticle {
    pub fn reference(&self) -> Reference {
        Reference {
            title: self.title.clone(),
            url: self.url.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CollectOptions {
    pub max_references: usize,
    pub max_candidates: usize,
    pub content_limit: usize,
    pub excluded_domain: String,
}

impl CollectOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_references: config.max_references,
            max_candidates: config.max_candidates,
            content_limit: config.content_limit,
            excluded_domain: config.excluded_domain.clone(),
        }
    }
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

#[derive(Debug, Default)]
pub struct Collection {
    pub references: Vec<ReferenceArticle>,
    /// Search results looked at, including the ones skipped
    pub examined: usize,
}

/// Walks `results` in rank order and scrapes usable reference pages.
///
/// Stops after `max_references` accepted pages or `max_candidates`
/// examined results, whichever comes first. Results on the excluded
/// domain, without a link, unreachable, or without readable text are
/// skipped.
pub async fn collect_references(
    results: &[SearchResult],
    fetcher: &dyn PageFetcher,
    options: &CollectOptions,
) -> Collection {
    let mut collection = Collection::default();

    for result in results.iter().take(options.max_candidates) {
        if collection.references.len() >= options.max_references {
            break;
        }
        collection.examined += 1;

        let link = match result.link.as_deref() {
            Some(link) if !link.contains(&options.excluded_domain) => link,
            _ => continue,
        };

        info!("🌐 Scraping reference: {}", link);
        let html = match fetcher.fetch(link).await {
            Ok(html) => html,
            Err(e) => {
                warn!("⚠️ Failed scraping, skipping {}: {}", link, e);
                continue;
            }
        };

        let content = match reference_text(&html) {
            Ok(text) => truncate_chars(&text, options.content_limit),
            Err(_) => {
                warn!("⚠️ No readable content, skipping: {}", link);
                continue;
            }
        };

        let title = if result.title.trim().is_empty() {
            link.to_string()
        } else {
            result.title.clone()
        };
        info!("✅ Reference {}: {}", collection.references.len() + 1, title);
        collection.references.push(ReferenceArticle {
            title,
            url: link.to_string(),
            content,
        });
    }

    collection
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::testing::StaticFetcher;
    use crate::search::testing::hit;

    fn page(text: &str) -> String {
        format!("<html><body><article>{}</article></body></html>", text)
    }

    #[tokio::test]
    async fn test_stops_at_two_references() {
        let results = vec![
            hit("A", "https://a.example/1"),
            hit("B", "https://b.example/2"),
            hit("C", "https://c.example/3"),
        ];
        let fetcher = StaticFetcher::new()
            .with_page("https://a.example/1", &page("alpha"))
            .with_page("https://b.example/2", &page("beta"))
            .with_page("https://c.example/3", &page("gamma"));

        let collection = collect_references(&results, &fetcher, &CollectOptions::default()).await;

        let titles: Vec<&str> = collection.references.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "B"]);
        assert_eq!(collection.examined, 2);
        assert_eq!(fetcher.requested(), vec!["https://a.example/1", "https://b.example/2"]);
    }

    #[tokio::test]
    async fn test_examines_at_most_six_candidates() {
        let results: Vec<SearchResult> = (0..10)
            .map(|i| hit(&format!("R{}", i), &format!("https://r{}.example/", i)))
            .collect();
        // Only the seventh page is scrapeable, which is past the candidate budget
        let fetcher = StaticFetcher::new().with_page("https://r6.example/", &page("late"));

        let collection = collect_references(&results, &fetcher, &CollectOptions::default()).await;

        assert!(collection.references.is_empty());
        assert_eq!(collection.examined, 6);
        assert_eq!(fetcher.requested().len(), 6);
    }

    #[tokio::test]
    async fn test_skips_excluded_domain_and_missing_links() {
        let results = vec![
            hit("Self", "https://beyondchats.com/blogs/x/"),
            SearchResult { title: "No link".to_string(), link: None },
            hit("Empty", "https://empty.example/"),
            hit("Good", "https://good.example/"),
        ];
        let fetcher = StaticFetcher::new()
            .with_page("https://beyondchats.com/blogs/x/", &page("self"))
            .with_page("https://empty.example/", "<html><body><img></body></html>")
            .with_page("https://good.example/", &page("good"));

        let collection = collect_references(&results, &fetcher, &CollectOptions::default()).await;

        assert_eq!(collection.references.len(), 1);
        assert_eq!(collection.references[0].url, "https://good.example/");
        assert_eq!(collection.examined, 4);
        assert!(!fetcher.requested().iter().any(|u| u.contains("beyondchats.com")));
    }

    #[tokio::test]
    async fn test_truncates_content() {
        let results = vec![hit("Long", "https://long.example/")];
        let fetcher = StaticFetcher::new().with_page("https://long.example/", &page(&"x".repeat(9000)));

        let collection = collect_references(&results, &fetcher, &CollectOptions::default()).await;

        assert_eq!(collection.references[0].content.chars().count(), 4000);
    }

    #[tokio::test]
    async fn test_blank_title_falls_back_to_url() {
        let results = vec![hit("  ", "https://untitled.example/")];
        let fetcher = StaticFetcher::new().with_page("https://untitled.example/", &page("body"));

        let collection = collect_references(&results, &fetcher, &CollectOptions::default()).await;

        assert_eq!(collection.references[0].title, "https://untitled.example/");
        assert_eq!(
            collection.references[0].reference(),
            Reference { title: "https://untitled.example/".to_string(), url: "https://untitled.example/".to_string() }
        );
    }
}
