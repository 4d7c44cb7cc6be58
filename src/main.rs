//! # Folio Search CLI (`folio`)
//!
//! The `folio` binary drives the content indexing and search worker for a
//! markdown-driven site. It can run the HTTP API, or exercise the pipeline
//! directly from the command line.
//!
//! ## Usage
//!
//! ```bash
//! folio --config ./config/folio.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `folio serve` | Start the JSON HTTP API |
//! | `folio index` | Rebuild the content index and store it in the cache |
//! | `folio search "<query>"` | Search the index from the terminal |
//! | `folio stats` | Print cache statistics |
//! | `folio clear` | Drop the cached index generation |
//!
//! ## Examples
//!
//! ```bash
//! # Serve the search API
//! folio serve --config ./config/folio.toml
//!
//! # Force a full reindex
//! folio index --config ./config/folio.toml
//!
//! # Ad-hoc query from the terminal
//! folio search "devops automation" --limit 5
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use folio_search::models::SearchRequest;
use folio_search::{config, server};

/// Folio Search — content indexing and search worker for a markdown site.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/folio.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "folio",
    about = "Folio Search — content indexing and search worker for a markdown-driven site",
    version,
    long_about = "Folio Search indexes markdown documents from a blob-store content API \
    (frontmatter, headings, derived keywords), caches the index in a TTL-stamped KV store, \
    and serves weighted keyword search and related-content recommendations over a JSON HTTP API."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/folio.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Start the JSON HTTP API.
    ///
    /// Binds to the address configured in `[server].bind` and serves the
    /// search, recommendation, and cache-administration endpoints. Kicks
    /// off a background index prewarm on startup.
    Serve,

    /// Rebuild the content index and store it in the cache.
    ///
    /// Lists all indexable markdown files from the content store, parses
    /// them in batches, and replaces the cached generation.
    Index,

    /// Search the index from the terminal.
    ///
    /// Builds (or reuses) the index and prints matching items with their
    /// urls, one per line.
    Search {
        /// The search query string (minimum 2 characters).
        query: String,

        /// Restrict to one content type: `blog`, `portfolio`, `project`,
        /// `page`, or `all`.
        #[arg(long)]
        content_type: Option<String>,

        /// Maximum number of results to return.
        #[arg(long)]
        limit: Option<usize>,

        /// Filter to items whose tags overlap these (comma-separated).
        #[arg(long, value_delimiter = ',')]
        tags: Option<Vec<String>>,
    },

    /// Print cache statistics.
    Stats,

    /// Drop the cached index generation.
    Clear,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "folio_search=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Index => {
            let service = server::build_service(&cfg).map_err(anyhow::Error::msg)?;
            let items = service.refresh().await?;
            println!("Indexed {} items.", items.len());
        }
        Commands::Search {
            query,
            content_type,
            limit,
            tags,
        } => {
            let service = server::build_service(&cfg).map_err(anyhow::Error::msg)?;
            let request = SearchRequest {
                query,
                content_type,
                max_results: limit,
                exclude_url: None,
                tags,
            };
            let hits = service.search(&request).await?;
            if hits.is_empty() {
                println!("No results.");
            } else {
                for hit in &hits {
                    println!("{}  {}  [{}]", hit.url, hit.title, hit.content_type.as_str());
                }
                println!("{} result(s).", hits.len());
            }
        }
        Commands::Stats => {
            let service = server::build_service(&cfg).map_err(anyhow::Error::msg)?;
            let stats = service.stats().await?;
            println!("Items:       {}", stats.size);
            match stats.last_update {
                Some(ts) => println!("Last update: {} (epoch ms)", ts),
                None => println!("Last update: never"),
            }
            println!("TTL:         {}s", stats.ttl_secs);
        }
        Commands::Clear => {
            let service = server::build_service(&cfg).map_err(anyhow::Error::msg)?;
            service.invalidate().await?;
            println!("Cache cleared.");
        }
    }

    Ok(())
}
