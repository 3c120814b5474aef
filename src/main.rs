//! Logbook CLI - serve, query and summarize structured logs

use clap::{Parser, Subcommand};
use logbook::config::{self, LogbookConfig};
use logbook::service::{ListParams, LogService};
use logbook::storage::LogStore;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "logbook")]
#[command(version)]
#[command(about = "Minimal log ingestion and query service backed by SQLite")]
#[command(long_about = r#"
Logbook accepts structured log records over HTTP, stores them in SQLite and
serves paginated, filterable reads plus per-level statistics.

Example usage:
  logbook serve --port 8080 --database logs.db
  logbook query --level ERROR --service api --limit 20
  logbook stats --json
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP service
    Serve {
        /// Address to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,
    },

    /// List stored entries, newest first
    Query {
        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,

        /// Only entries with this level
        #[arg(short, long)]
        level: Option<String>,

        /// Only entries from this service
        #[arg(short, long)]
        service: Option<String>,

        /// Page number (1-based)
        #[arg(long)]
        page: Option<String>,

        /// Entries per page
        #[arg(long)]
        limit: Option<String>,

        /// Print the raw JSON response
        #[arg(long)]
        json: bool,
    },

    /// Show per-level statistics
    Stats {
        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Write a default config file
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let mut config = config::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { host, port, database } => {
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(database) = database {
                config.database = database;
            }
            logbook::server::start_server(&config).await?;
        }

        Commands::Query { database, level, service, page, limit, json } => {
            let service_layer = open_service(database, &config)?;
            let response = service_layer.list(&ListParams { page, limit, level, service })?;

            if json {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else if response.logs.is_empty() {
                println!("No log entries found (page {}).", response.page);
            } else {
                for entry in &response.logs {
                    let origin = match (&entry.service, &entry.component) {
                        (Some(s), Some(c)) => format!("{}/{}", s, c),
                        (Some(s), None) => s.clone(),
                        (None, Some(c)) => format!("-/{}", c),
                        (None, None) => "-".to_string(),
                    };
                    println!(
                        "{} {:<8} {:<20} {}  [{}]",
                        entry.timestamp, entry.level, origin, entry.message, entry.id
                    );
                }
                println!("-- page {} (limit {})", response.page, response.limit);
            }
        }

        Commands::Stats { database, json } => {
            let service_layer = open_service(database, &config)?;
            let report = service_layer.statistics()?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", report);
            }
        }

        Commands::Init { force } => {
            let path = cli.config.unwrap_or_else(config::default_config_path);
            config::write_config(&path, &LogbookConfig::default(), force)?;
            println!("Wrote default config to {}", path.display());
        }
    }

    Ok(())
}

fn open_service(database: Option<PathBuf>, config: &LogbookConfig) -> anyhow::Result<LogService> {
    let database = database.unwrap_or_else(|| config.database.clone());
    tracing::debug!("Opening {:?}", database);
    let store = Arc::new(LogStore::open(&database)?);
    Ok(LogService::from_config(store, config))
}
