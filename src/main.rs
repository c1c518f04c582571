use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use search_index_rs::es::poller::{await_doc_exists, doc_exists};
use search_index_rs::{AppConfig, DocumentIndexer, IndexManager, create_client};

#[derive(Debug, Parser)]
#[command(name = "search-index-rs", about = "Manage schema-governed Elasticsearch indices")]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create the index or add new fields from a mapping file
    Ensure {
        #[arg(long)]
        index: String,
        #[arg(long)]
        mapping: PathBuf,
    },
    /// Index a single JSON document
    Index {
        #[arg(long)]
        index: String,
        #[arg(long)]
        id: String,
        #[arg(long)]
        doc: PathBuf,
    },
    /// Bulk index a JSON object of id -> document
    Bulk {
        #[arg(long)]
        index: String,
        #[arg(long)]
        docs: PathBuf,
    },
    /// Check whether a document exists
    Exists {
        #[arg(long)]
        index: String,
        #[arg(long)]
        id: String,
    },
    /// Wait until a document becomes visible
    Await {
        #[arg(long)]
        index: String,
        #[arg(long)]
        id: String,
        #[arg(long, default_value_t = 5000)]
        timeout_ms: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var("RUST_LOG").ok().as_deref()))
        .init();

    let cli = Cli::parse();

    // Load configuration (env vars override TOML)
    let config = AppConfig::load_from(&cli.config)?;
    tracing::info!("Elasticsearch URL: {}", config.elasticsearch.url());

    let engine = create_client(&config.elasticsearch)?;

    match cli.command {
        Command::Ensure { index, mapping } => {
            let mapping = std::fs::read_to_string(&mapping)
                .with_context(|| format!("Failed to read {}", mapping.display()))?;
            IndexManager::new(engine, &config.elasticsearch)
                .build_index_with_explicit_mapping(&index, &mapping)
                .await?;
            tracing::info!("Index '{index}' is up to date");
        }
        Command::Index { index, id, doc } => {
            let doc: Value = read_json(&doc)?;
            DocumentIndexer::new(engine).index(&index, &id, &doc).await?;
            tracing::info!("Indexed '{id}' into '{index}'");
        }
        Command::Bulk { index, docs } => {
            let docs: HashMap<String, Value> = read_json(&docs)?;
            let outcome = DocumentIndexer::new(engine)
                .bulk_index_async(&index, &docs)
                .await??;
            tracing::info!(
                "Bulk indexed {} documents into '{index}', {} rejected",
                outcome.indexed,
                outcome.failed.len()
            );
        }
        Command::Exists { index, id } => {
            let exists = doc_exists(engine.as_ref(), &index, &id).await?;
            println!("{exists}");
        }
        Command::Await {
            index,
            id,
            timeout_ms,
        } => {
            await_doc_exists(engine, &index, &id, Duration::from_millis(timeout_ms)).await??;
            tracing::info!("Document '{id}' is visible in '{index}'");
        }
    }

    Ok(())
}

/// `RUST_LOG` as given, or info for this crate when unset or unparsable.
fn log_filter(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new("search_index_rs=info"))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", path.display()))
}
