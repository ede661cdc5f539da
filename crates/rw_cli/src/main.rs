use clap::Parser;
use rw_core::{ArticleStorage, Config, Error, Result};
use rw_scrapers::{init_logging, JobArgs, JobCommands};
use rw_storage::StorageKind;
use rw_web::AppState;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Article ingest, rewrite and API server", long_about = None)]
struct Cli {
    /// Article store backend. Defaults to sqlite for `serve` and `list`, api for the jobs
    #[arg(long, value_enum, global = true)]
    storage: Option<StorageKind>,
    /// SQLite database file (overrides DATABASE_PATH)
    #[arg(long, global = true)]
    database: Option<PathBuf>,
    /// Base URL of a running Article API (overrides ARTICLE_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Serve the Article API over HTTP
    Serve {
        /// Address to listen on (overrides BIND_ADDR)
        #[arg(long)]
        bind: Option<String>,
    },
    #[command(flatten)]
    Job(JobCommands),
    /// Print the stored articles, newest first
    List,
}

impl Commands {
    fn default_storage(&self) -> StorageKind {
        match self {
            Commands::Serve { .. } | Commands::List => StorageKind::Sqlite,
            Commands::Job(_) => StorageKind::Api,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if let Some(database) = cli.database {
        config.database_path = database;
    }
    if let Some(api_url) = cli.api_url {
        config.api_base_url = api_url;
    }

    let kind = cli.storage.unwrap_or_else(|| cli.command.default_storage());
    let storage = rw_storage::create_storage(kind, &config).await?;
    info!("💾 Storage initialized (using {})", kind);

    match cli.command {
        Commands::Serve { bind } => {
            if kind == StorageKind::Api {
                return Err(Error::Config("serve needs a local store (memory or sqlite)".to_string()));
            }
            let addr = bind.unwrap_or_else(|| config.bind_addr.clone());
            rw_web::serve(AppState::new(storage), &addr).await?;
        }
        Commands::Job(command) => {
            rw_scrapers::handle_command(JobArgs { command }, &config, storage).await?;
        }
        Commands::List => {
            let articles = storage.list().await?;
            info!("📚 {} articles", articles.len());
            for article in articles {
                println!("{:>5}  {:<9}  {}", article.id, article.status.as_str(), article.title);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_default_storage_per_command() {
        let cli = Cli::try_parse_from(["rw", "serve"]).unwrap();
        assert_eq!(cli.command.default_storage(), StorageKind::Sqlite);

        let cli = Cli::try_parse_from(["rw", "ingest"]).unwrap();
        assert_eq!(cli.command.default_storage(), StorageKind::Api);

        let cli = Cli::try_parse_from(["rw", "--storage", "memory", "rewrite", "--model", "dummy"]).unwrap();
        assert_eq!(cli.storage, Some(StorageKind::Memory));
        assert!(matches!(cli.command, Commands::Job(JobCommands::Rewrite { .. })));
    }
}
