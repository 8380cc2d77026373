//! Flatrest - a schema-less REST API over a single JSON file.
//!
//! This is the main entry point for the flatrest CLI.

use clap::{Parser, Subcommand};
use flatrest_core::{CollectionService, Config};
use flatrest_storage::{DocumentStore, JsonFileStore};
use flatrest_util::log::{self, LogConfig, LogLevel};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "flatrest")]
#[command(author, version, about = "Schema-less REST API over a single JSON file", long_about = None)]
struct Cli {
    /// Config file (defaults to flatrest.json in the working directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Subcommand
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server (default)
    Serve(ServeArgs),
    /// List the collections in the store
    Entities {
        /// Store file to read
        #[arg(short, long)]
        store: Option<PathBuf>,
    },
    /// Show the resolved configuration
    Config,
    /// Print version information
    Version,
}

#[derive(clap::Args, Default)]
struct ServeArgs {
    /// Address to bind to
    #[arg(short, long)]
    address: Option<SocketAddr>,

    /// Store file holding every collection
    #[arg(short, long)]
    store: Option<PathBuf>,

    /// Mount the entity routes under this prefix, e.g. /api
    #[arg(long)]
    prefix: Option<String>,

    /// Write the store as indented JSON
    #[arg(long)]
    pretty: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cwd = std::env::current_dir()?;

    let (mut config, sources) = Config::load(&cwd, cli.config.as_deref()).await?;
    if cli.verbose {
        config.log_level = LogLevel::Debug;
    }

    match cli.command {
        None => serve(config, ServeArgs::default(), &cwd).await,
        Some(Commands::Serve(args)) => serve(config, args, &cwd).await,
        Some(Commands::Entities { store }) => {
            if let Some(store) = store {
                config.store_path = store;
            }
            list_entities(&config, &cwd).await
        }
        Some(Commands::Config) => show_config(&config, &sources),
        Some(Commands::Version) => {
            print_version();
            Ok(())
        }
    }
}

/// Build the store described by the configuration.
fn open_store(config: &Config, cwd: &Path) -> JsonFileStore {
    JsonFileStore::new(config.resolve_store_path(cwd)).with_pretty(config.pretty)
}

/// Run the HTTP server.
async fn serve(mut config: Config, args: ServeArgs, cwd: &Path) -> anyhow::Result<()> {
    if let Some(address) = args.address {
        config.address = address;
    }
    if let Some(store) = args.store {
        config.store_path = store;
    }
    if let Some(prefix) = args.prefix {
        config.api_prefix = prefix;
    }
    config.pretty |= args.pretty;

    log::init(LogConfig {
        level: config.log_level,
        ..LogConfig::default()
    });

    let store = open_store(&config, cwd);
    info!(path = %store.path().display(), "Using store");

    // Create the store file up front so a bad path fails at startup.
    store.load().await?;

    let state = flatrest_server::AppState::new(Arc::new(store));
    let prefix = config.normalized_prefix();
    let app = flatrest_server::create_router(state, &prefix);

    let listener = tokio::net::TcpListener::bind(config.address).await?;
    info!("Server started on http://{}{}", config.address, prefix);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Print the collection names and record counts.
async fn list_entities(config: &Config, cwd: &Path) -> anyhow::Result<()> {
    let service = CollectionService::new(Arc::new(open_store(config, cwd)));

    let entities = service.entities().await?;
    if entities.is_empty() {
        println!("No collections in {}", config.resolve_store_path(cwd).display());
        return Ok(());
    }

    for entity in entities {
        println!("{:<24} {:>6} records", entity.name, entity.records);
    }

    Ok(())
}

/// Show the resolved configuration.
fn show_config(config: &Config, sources: &[PathBuf]) -> anyhow::Result<()> {
    println!("Configuration sources:");
    if sources.is_empty() {
        println!("  (none)");
    } else {
        for source in sources {
            println!("  {}", source.display());
        }
    }
    println!();

    println!("Current configuration:");
    println!("{}", serde_json::to_string_pretty(config)?);

    Ok(())
}

/// Print version information.
fn print_version() {
    println!("flatrest {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("A schema-less REST API over a single JSON file.");
}
