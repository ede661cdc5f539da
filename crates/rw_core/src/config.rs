use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::{Error, Result};

/// Settings shared by the API server and both batch jobs.
///
/// Built once from the environment (and an optional `.env` file) and then
/// passed by value into whatever needs it. CLI flags override individual
/// fields after loading.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub search_api_key: Option<String>,
    pub llm_api_key: Option<String>,
    pub deepseek_api_key: Option<String>,
    pub llm_model: String,
    pub listing_url: String,
    pub source_name: String,
    pub excluded_domain: String,
    pub fetch_timeout: Duration,
    pub max_links: usize,
    pub max_references: usize,
    pub max_candidates: usize,
    pub content_limit: usize,
    pub search_results: usize,
    pub database_path: PathBuf,
    pub bind_addr: String,
    pub lock_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8000".to_string(),
            search_api_key: None,
            llm_api_key: None,
            deepseek_api_key: None,
            llm_model: "openai".to_string(),
            listing_url: "https://beyondchats.com/blogs-2/page/8/".to_string(),
            source_name: crate::types::DEFAULT_SOURCE.to_string(),
            excluded_domain: "beyondchats.com".to_string(),
            fetch_timeout: Duration::from_secs(10),
            max_links: 5,
            max_references: 2,
            max_candidates: 6,
            content_limit: 4000,
            search_results: 10,
            database_path: PathBuf::from("articles.db"),
            bind_addr: "127.0.0.1:8000".to_string(),
            lock_dir: std::env::temp_dir(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        let config = Self::from_lookup(|key| std::env::var(key).ok())?;
        config.log_keys();
        Ok(config)
    }

    /// Builds a config from an arbitrary key lookup, falling back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Self {
            api_base_url: get("ARTICLE_API_URL").unwrap_or(defaults.api_base_url),
            search_api_key: get("SERPER_API_KEY"),
            llm_api_key: get("OPENAI_API_KEY"),
            deepseek_api_key: get("DEEPSEEK_API_KEY"),
            llm_model: get("LLM_MODEL").unwrap_or(defaults.llm_model),
            listing_url: get("LISTING_URL").unwrap_or(defaults.listing_url),
            source_name: get("SOURCE_NAME").unwrap_or(defaults.source_name),
            excluded_domain: get("EXCLUDED_DOMAIN").unwrap_or(defaults.excluded_domain),
            fetch_timeout: match get("FETCH_TIMEOUT_SECS") {
                Some(v) => Duration::from_secs(parse_var("FETCH_TIMEOUT_SECS", &v)?),
                None => defaults.fetch_timeout,
            },
            max_links: parse_or("MAX_LINKS", get("MAX_LINKS"), defaults.max_links)?,
            max_references: parse_or("MAX_REFERENCES", get("MAX_REFERENCES"), defaults.max_references)?,
            max_candidates: parse_or("MAX_CANDIDATES", get("MAX_CANDIDATES"), defaults.max_candidates)?,
            content_limit: parse_or("CONTENT_LIMIT", get("CONTENT_LIMIT"), defaults.content_limit)?,
            search_results: parse_or("SEARCH_RESULTS", get("SEARCH_RESULTS"), defaults.search_results)?,
            database_path: get("DATABASE_PATH").map(PathBuf::from).unwrap_or(defaults.database_path),
            bind_addr: get("BIND_ADDR").unwrap_or(defaults.bind_addr),
            lock_dir: get("LOCK_DIR").map(PathBuf::from).unwrap_or(defaults.lock_dir),
        })
    }

    pub fn search_key(&self) -> Result<&str> {
        self.search_api_key
            .as_deref()
            .ok_or(Error::MissingCredential("SERPER_API_KEY"))
    }

    pub fn llm_key(&self) -> Result<&str> {
        self.llm_api_key
            .as_deref()
            .ok_or(Error::MissingCredential("OPENAI_API_KEY"))
    }

    pub fn deepseek_key(&self) -> Result<&str> {
        self.deepseek_api_key
            .as_deref()
            .ok_or(Error::MissingCredential("DEEPSEEK_API_KEY"))
    }

    fn log_keys(&self) {
        fn preview(val: &Option<String>) -> String {
            match val {
                Some(v) => {
                    let head: String = v.chars().take(5).collect();
                    format!("{}...({} chars)", head, v.chars().count())
                }
                None => "<not set>".to_string(),
            }
        }

        tracing::debug!("Config loaded:");
        tracing::debug!("  ARTICLE_API_URL: {}", self.api_base_url);
        tracing::debug!("  SERPER_API_KEY: {}", preview(&self.search_api_key));
        tracing::debug!("  OPENAI_API_KEY: {}", preview(&self.llm_api_key));
        tracing::debug!("  DEEPSEEK_API_KEY: {}", preview(&self.deepseek_api_key));
        tracing::debug!("  LLM_MODEL: {}", self.llm_model);
    }
}

fn parse_var<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{} has an invalid value: {}", key, value)))
}

fn parse_or<T: FromStr>(key: &str, value: Option<String>, default: T) -> Result<T> {
    match value {
        Some(v) => parse_var(key, &v),
        None => Ok(default),
    }
}
