pub mod config;
pub mod error;
pub mod models;
pub mod storage;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use models::InferenceModel;
pub use storage::ArticleStorage;
pub use types::{Article, ArticleFields, ArticleStatus, Reference};
