pub mod api;
pub mod memory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use api::ApiStorage;
pub use memory::InMemoryStorage;

#[cfg(feature = "sqlite")]
pub use sqlite::SQLiteStorage;
