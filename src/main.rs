mod app;
mod event;
mod ui;

use clap::Parser;
use color_eyre::Result;
use scour::config::{CacheBackend, Config, SourceKind};
use scour::logging;
use scour::store::{KvStore, MemoryStore, SqliteStore};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "scour")]
#[command(about = "Search Google Scholar and Docker Hub from the terminal")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/scour/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Source to open first
  #[arg(short, long, value_enum)]
  source: Option<SourceKind>,

  /// Search to run on startup
  #[arg(short, long)]
  query: Option<String>,

  /// Keep the cache and bookmarks in memory for this run only
  #[arg(long)]
  memory_cache: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration
  let config = Config::load(args.config.as_deref())?;

  let _log_guard = logging::init(&logging::default_log_dir()?)?;

  let backend = if args.memory_cache {
    CacheBackend::Memory
  } else {
    config.cache.backend
  };
  let store: Arc<dyn KvStore> = match (backend, &config.cache.path) {
    (CacheBackend::Memory, _) => Arc::new(MemoryStore::new()),
    (CacheBackend::Sqlite, Some(path)) => Arc::new(SqliteStore::open_at(path)?),
    (CacheBackend::Sqlite, None) => Arc::new(SqliteStore::open()?),
  };

  let source = args.source.unwrap_or(config.ui.default_source);
  info!(?source, ?backend, "starting");

  // Initialize and run the app
  let mut app = app::App::new(&config, store, source, args.query.as_deref())?;
  app.run().await?;

  Ok(())
}
