pub mod cli;
pub mod extract;
pub mod fetch;
pub mod ingest;
pub mod lock;
mod logging;
pub mod prompt;
pub mod references;
pub mod rewrite;
pub mod search;

pub use cli::{handle_command, JobArgs, JobCommands};
pub use fetch::{HttpFetcher, PageFetcher};
pub use ingest::{IngestJob, IngestReport};
pub use lock::{FileLock, JobLock, MemoryLock};
pub use logging::init_logging;
pub use rewrite::{RewriteJob, RewriteOutcome, SelectionPolicy};
pub use search::{SearchProvider, SerperSearch};
