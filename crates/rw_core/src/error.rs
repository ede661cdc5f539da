use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Article not found: {0}")]
    NotFound(i64),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("No usable content: {0}")]
    NoUsableContent(String),

    #[error("Missing credential: {0}")]
    MissingCredential(&'static str),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("External error: {0}")]
    External(#[from] anyhow::Error),
}

impl Error {
    /// Network, timeout and non-success HTTP failures all surface as
    /// `UpstreamUnavailable` so callers can skip the item that caused them.
    pub fn upstream(context: impl std::fmt::Display, err: impl std::fmt::Display) -> Self {
        Self::UpstreamUnavailable(format!("{}: {}", context, err))
    }

    /// Errors the batch jobs log and move past instead of aborting on.
    pub fn is_soft(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_)
                | Self::Conflict(_)
                | Self::Validation(_)
                | Self::UpstreamUnavailable(_)
                | Self::NoUsableContent(_)
                | Self::Http(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
