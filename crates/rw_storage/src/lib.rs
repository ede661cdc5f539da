use rw_core::{ArticleStorage, Config, Error, Result};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

pub mod backends;

pub use backends::*;

/// Which Article Store backend to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum StorageKind {
    Memory,
    Sqlite,
    /// A running Article API, reached over HTTP
    Api,
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StorageKind::Memory => "memory",
            StorageKind::Sqlite => "sqlite",
            StorageKind::Api => "api",
        };
        f.write_str(name)
    }
}

impl FromStr for StorageKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(StorageKind::Memory),
            "sqlite" => Ok(StorageKind::Sqlite),
            "api" => Ok(StorageKind::Api),
            other => Err(Error::Config(format!("Unknown storage backend: {}", other))),
        }
    }
}

pub async fn create_storage(kind: StorageKind, config: &Config) -> Result<Arc<dyn ArticleStorage>> {
    let storage: Arc<dyn ArticleStorage> = match kind {
        StorageKind::Memory => Arc::new(InMemoryStorage::new()),
        #[cfg(feature = "sqlite")]
        StorageKind::Sqlite => Arc::new(SQLiteStorage::new_with_path(&config.database_path).await?),
        #[cfg(not(feature = "sqlite"))]
        StorageKind::Sqlite => {
            return Err(Error::Config("rw_storage was built without the sqlite feature".to_string()))
        }
        StorageKind::Api => Arc::new(ApiStorage::new(&config.api_base_url)?),
    };
    tracing::debug!("Opened {} storage", kind);
    Ok(storage)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_kind_from_str() {
        assert_eq!("memory".parse::<StorageKind>().unwrap(), StorageKind::Memory);
        assert_eq!("SQLite".parse::<StorageKind>().unwrap(), StorageKind::Sqlite);
        assert_eq!("api".parse::<StorageKind>().unwrap(), StorageKind::Api);
        assert!("qdrant".parse::<StorageKind>().is_err());
    }

    #[tokio::test]
    async fn test_create_memory_storage() {
        let storage = create_storage(StorageKind::Memory, &Config::default()).await.unwrap();
        assert!(storage.list().await.unwrap().is_empty());
    }
}
