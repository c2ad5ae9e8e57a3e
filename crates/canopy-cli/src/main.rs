//! `canopy`: operator tool for climate risk scores and action rankings.
//!
//! # Usage
//!
//! ```text
//! canopy score --input indicators.json --table
//! canopy resilience --input answers.json
//! canopy ranking seed --city "Porto Alegre" --type mitigation --input actions.json
//! canopy ranking move --city "Porto Alegre" --type mitigation --from 0 --to 2
//! ```
//!
//! Ranking commands read `canopy.toml` (or the path given with `--config`)
//! to find the object store and city registry.

mod commands;
mod settings;

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use canopy_ranking::RankingRepository;
use canopy_store_http::HttpObjectStore;
use canopy_store_sqlite::SqliteObjectStore;
use clap::{Parser, Subcommand};
use commands::RankingCommand;
use settings::StoreConfig;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "canopy", author, version, about = "Climate risk scoring and action ranking")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "canopy.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Score hazard indicator rows (JSON array) and print the results.
  Score {
    /// Input file; `-` reads stdin.
    #[arg(short, long, value_name = "FILE")]
    input: PathBuf,
    /// Print a plain-text table instead of JSON.
    #[arg(long)]
    table: bool,
  },
  /// Score a resilience questionnaire (JSON object of answers).
  Resilience {
    #[arg(short, long, value_name = "FILE")]
    input: PathBuf,
  },
  /// Inspect or change a stored action ranking.
  #[command(subcommand)]
  Ranking(RankingCommand),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Logs go to stderr; stdout carries command output.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();

  match cli.command {
    Command::Score { input, table } => commands::score(&input, table),
    Command::Resilience { input } => commands::resilience(&input),
    Command::Ranking(command) => {
      let app_cfg = settings::load(&cli.config)?;
      let registry = Arc::new(app_cfg.validate()?);

      match app_cfg.store {
        StoreConfig::Sqlite { path } => {
          let store = SqliteObjectStore::open(&path)
            .await
            .with_context(|| format!("failed to open store at {path:?}"))?;
          tracing::debug!(?path, "using sqlite store");
          commands::run_ranking(RankingRepository::new(store, registry), command)
            .await
        }
        StoreConfig::Http(remote) => {
          tracing::debug!(endpoint = %remote.endpoint, bucket = %remote.bucket, "using remote store");
          let store =
            HttpObjectStore::new(remote).context("failed to build remote store client")?;
          commands::run_ranking(RankingRepository::new(store, registry), command)
            .await
        }
      }
    }
  }
}
