use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_SOURCE: &str = "beyondchats";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArticleStatus {
    #[default]
    Original,
    Rewritten,
}

impl ArticleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArticleStatus::Original => "original",
            ArticleStatus::Rewritten => "rewritten",
        }
    }
}

impl fmt::Display for ArticleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArticleStatus {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s {
            "original" => Ok(ArticleStatus::Original),
            "rewritten" => Ok(ArticleStatus::Rewritten),
            other => Err(crate::Error::Validation(format!("Unknown status: {}", other))),
        }
    }
}

/// An external page used as a style reference for a rewrite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    pub source: String,
    pub source_url: String,
    pub title: String,
    pub content_html: Option<String>,
    #[serde(default)]
    pub status: ArticleStatus,
    pub rewritten_from_id: Option<i64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub references: Vec<Reference>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Article {
    pub fn is_original(&self) -> bool {
        self.status == ArticleStatus::Original
    }
}

/// Write payload for `create` and `update`.
///
/// Every field is optional. For the nullable columns the outer `Option`
/// says whether the field was supplied and the inner one carries an
/// explicit `null`, so an update can clear `content_html` or
/// `rewritten_from_id` without touching anything else.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArticleFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub content_html: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ArticleStatus>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub rewritten_from_id: Option<Option<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub references: Option<Vec<Reference>>,
}

impl ArticleFields {
    pub fn original(source: &str, source_url: &str, title: &str, content_html: &str) -> Self {
        Self {
            source: Some(source.to_string()),
            source_url: Some(source_url.to_string()),
            title: Some(title.to_string()),
            content_html: Some(Some(content_html.to_string())),
            status: Some(ArticleStatus::Original),
            ..Default::default()
        }
    }

    /// Checks the fields `create` cannot default.
    pub fn validate_for_create(&self) -> crate::Result<()> {
        match self.source_url.as_deref() {
            Some(url) if !url.trim().is_empty() => {}
            _ => return Err(crate::Error::Validation("source_url is required".to_string())),
        }
        match self.title.as_deref() {
            Some(title) if !title.trim().is_empty() => Ok(()),
            _ => Err(crate::Error::Validation("title is required".to_string())),
        }
    }

    /// Builds the article `create` would store, applying defaults.
    pub fn into_article(self, id: i64, now: DateTime<Utc>) -> Article {
        Article {
            id,
            source: self.source.unwrap_or_else(|| DEFAULT_SOURCE.to_string()),
            source_url: self.source_url.unwrap_or_default(),
            title: self.title.unwrap_or_default(),
            content_html: self.content_html.flatten(),
            status: self.status.unwrap_or_default(),
            rewritten_from_id: self.rewritten_from_id.flatten(),
            references: self.references.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrites the supplied fields of `article` in place.
    pub fn apply_to(self, article: &mut Article, now: DateTime<Utc>) {
        if let Some(source) = self.source {
            article.source = source;
        }
        if let Some(source_url) = self.source_url {
            article.source_url = source_url;
        }
        if let Some(title) = self.title {
            article.title = title;
        }
        if let Some(content_html) = self.content_html {
            article.content_html = content_html;
        }
        if let Some(status) = self.status {
            article.status = status;
        }
        if let Some(rewritten_from_id) = self.rewritten_from_id {
            article.rewritten_from_id = rewritten_from_id;
        }
        if let Some(references) = self.references {
            article.references = references;
        }
        article.updated_at = now;
    }
}

fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&ArticleStatus::Rewritten).unwrap(), "\"rewritten\"");
        assert_eq!("original".parse::<ArticleStatus>().unwrap(), ArticleStatus::Original);
        assert!("draft".parse::<ArticleStatus>().is_err());
    }

    #[test]
    fn test_fields_distinguish_absent_and_null() {
        let fields: ArticleFields = serde_json::from_str(r#"{"title": "T"}"#).unwrap();
        assert_eq!(fields.content_html, None);
        assert_eq!(fields.rewritten_from_id, None);

        let fields: ArticleFields =
            serde_json::from_str(r#"{"content_html": null, "rewritten_from_id": 4}"#).unwrap();
        assert_eq!(fields.content_html, Some(None));
        assert_eq!(fields.rewritten_from_id, Some(Some(4)));
    }

    #[test]
    fn test_create_defaults() {
        let fields = ArticleFields {
            source_url: Some("https://example.com/a".to_string()),
            title: Some("A".to_string()),
            ..Default::default()
        };
        assert!(fields.validate_for_create().is_ok());
        let article = fields.into_article(1, Utc::now());
        assert_eq!(article.source, DEFAULT_SOURCE);
        assert_eq!(article.status, ArticleStatus::Original);
        assert!(article.references.is_empty());
        assert!(article.content_html.is_none());
    }

    #[test]
    fn test_create_requires_url_and_title() {
        let fields = ArticleFields {
            title: Some("A".to_string()),
            ..Default::default()
        };
        assert!(fields.validate_for_create().is_err());

        let fields = ArticleFields {
            source_url: Some("https://example.com/a".to_string()),
            title: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(fields.validate_for_create().is_err());
    }

    #[test]
    fn test_apply_only_overwrites_supplied_fields() {
        let now = Utc::now();
        let mut article = ArticleFields::original("site", "https://example.com/a", "A", "<p>a</p>")
            .into_article(1, now);
        ArticleFields {
            title: Some("B".to_string()),
            content_html: Some(None),
            ..Default::default()
        }
        .apply_to(&mut article, now);
        assert_eq!(article.title, "B");
        assert_eq!(article.content_html, None);
        assert_eq!(article.source_url, "https://example.com/a");
        assert_eq!(article.source, "site");
    }

    #[test]
    fn test_article_accepts_null_references() {
        let json = r#"{
            "id": 3, "source": "beyondchats", "source_url": "u", "title": "t",
            "content_html": null, "status": "original", "rewritten_from_id": null,
            "references": null,
            "created_at": "2025-12-22T04:27:37Z", "updated_at": "2025-12-22T04:27:37Z"
        }"#;
        let article: Article = serde_json::from_str(json).unwrap();
        assert!(article.references.is_empty());
        assert!(article.is_original());
    }
}
