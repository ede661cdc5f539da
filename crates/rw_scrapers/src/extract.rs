//! Best-effort content extraction.
//!
//! Each policy is an ordered list of pure strategies over a parsed
//! document. The first strategy to produce non-empty output wins, so the
//! chains can be exercised in isolation against synthetic HTML.

use lazy_static::lazy_static;
use rw_core::{Error, Result};
use scraper::{ElementRef, Html, Selector};
use url::Url;

pub const CONTENT_PLACEHOLDER: &str = "Content not found";

lazy_static! {
    static ref LISTING_LINKS: Selector =
        Selector::parse(".blog-post, .post-item, article a, h2 a, .entry-title a").expect("valid selector");
    static ref ARTICLE_BODY: Selector =
        Selector::parse("article, .post-content, .entry-content").expect("valid selector");
    static ref GENERIC_BODY: Selector = Selector::parse(".content, main").expect("valid selector");
    static ref REFERENCE_BODY: Selector =
        Selector::parse("article, .post-content, .entry-content, main, .content").expect("valid selector");
    static ref REFERENCE_LOOSE: Selector =
        Selector::parse(r#"[class*="article"], [class*="post"]"#).expect("valid selector");
    static ref PARAGRAPHS: Selector = Selector::parse("p").expect("valid selector");
}

pub type Strategy = fn(&Html) -> Option<String>;

/// Runs `strategies` in order and returns the first non-empty result.
pub fn first_match(document: &Html, strategies: &[Strategy]) -> Option<String> {
    strategies.iter().find_map(|strategy| strategy(document))
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn element_text(element: ElementRef) -> String {
    element.text().collect::<String>()
}

fn first_inner_html(document: &Html, selector: &Selector) -> Option<String> {
    document.select(selector).next().and_then(|el| non_empty(el.inner_html()))
}

fn first_text(document: &Html, selector: &Selector) -> Option<String> {
    document.select(selector).next().and_then(|el| non_empty(element_text(el)))
}

fn article_body_html(document: &Html) -> Option<String> {
    first_inner_html(document, &ARTICLE_BODY)
}

fn generic_body_html(document: &Html) -> Option<String> {
    first_inner_html(document, &GENERIC_BODY)
}

fn reference_body_text(document: &Html) -> Option<String> {
    first_text(document, &REFERENCE_BODY)
}

fn reference_loose_text(document: &Html) -> Option<String> {
    first_text(document, &REFERENCE_LOOSE)
}

fn leading_paragraphs_text(document: &Html) -> Option<String> {
    let paragraphs: Vec<String> = document
        .select(&PARAGRAPHS)
        .take(10)
        .map(|p| element_text(p).trim().to_string())
        .filter(|text| !text.is_empty())
        .collect();
    non_empty(paragraphs.join("\n"))
}

pub const MAIN_CONTENT_CHAIN: &[Strategy] = &[article_body_html, generic_body_html];

pub const REFERENCE_TEXT_CHAIN: &[Strategy] =
    &[reference_body_text, reference_loose_text, leading_paragraphs_text];

/// A link found on the listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub url: String,
    pub title: String,
}

/// Up to `max` `(link, title)` pairs from a listing page, in document order.
///
/// Relative links are resolved against `base`. Elements missing either an
/// `href` or visible text are passed over, as are repeats of a link already
/// taken.
pub fn listing_links(html: &str, base: &Url, max: usize) -> Vec<Candidate> {
    let document = Html::parse_document(html);
    let mut candidates: Vec<Candidate> = Vec::new();

    for element in document.select(&LISTING_LINKS) {
        if candidates.len() >= max {
            break;
        }
        let href = match element.value().attr("href").map(str::trim) {
            Some(href) if !href.is_empty() => href,
            _ => continue,
        };
        let title = element_text(element).trim().to_string();
        if title.is_empty() {
            continue;
        }
        let url = match base.join(href) {
            Ok(url) => url.to_string(),
            Err(e) => {
                tracing::debug!("Skipping unparsable link {}: {}", href, e);
                continue;
            }
        };
        if candidates.iter().any(|c| c.url == url) {
            continue;
        }
        candidates.push(Candidate { url, title });
    }

    candidates
}

/// Main body markup of an article page, or the placeholder text.
pub fn main_content_html(html: &str) -> String {
    let document = Html::parse_document(html);
    first_match(&document, MAIN_CONTENT_CHAIN).unwrap_or_else(|| CONTENT_PLACEHOLDER.to_string())
}

/// Readable plain text of a reference page.
pub fn reference_text(html: &str) -> Result<String> {
    let document = Html::parse_document(html);
    first_match(&document, REFERENCE_TEXT_CHAIN)
        .ok_or_else(|| Error::NoUsableContent("no readable content".to_string()))
}

/// Cuts `text` to at most `limit` characters.
pub fn truncate_chars(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((end, _)) => text[..end].to_string(),
        None => text.to_string(),
    }
}
