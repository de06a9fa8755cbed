//! `footbase`: load, reconcile, and check the football match store.
//!
//! # Usage
//!
//! ```
//! footbase ingest data/raw
//! footbase merge data/raw/understat_xg_data.csv
//! footbase query --competition "Serie A" --from 2023-08-01 --limit 20
//! footbase --json check
//! ```

mod commands;
mod render;
mod settings;

use std::path::PathBuf;

use anyhow::Context as _;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use footbase_core::report::RunContext;
use footbase_store_sqlite::SqliteStore;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use commands::{Format, QueryArgs};
use settings::{Overrides, Settings};

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "footbase", version, about = "Football match data reconciliation")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, value_name = "FILE", default_value = "footbase.toml")]
  config: PathBuf,

  /// SQLite database path (overrides `db_path`).
  #[arg(long, value_name = "FILE")]
  db: Option<PathBuf>,

  /// Alias table path (overrides `alias_path`).
  #[arg(long, value_name = "FILE")]
  aliases: Option<PathBuf>,

  /// Print reports as JSON instead of text.
  #[arg(long, global = true)]
  json: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Load `<DIR>/<Competition_Dir>/*.csv` as the canonical set.
  Ingest {
    dir: PathBuf,
  },
  /// Attach expected-goals data from a secondary CSV to the canonical set.
  Merge {
    secondary: PathBuf,
  },
  /// Re-run the consistency checks on the stored canonical set.
  Check {
    /// Exit with an error when any goal counts disagree.
    #[arg(long)]
    strict: bool,
  },
  /// List canonical records.
  Query {
    #[arg(long)]
    competition: Option<String>,
    #[arg(long)]
    season:      Option<String>,
    /// Earliest date, inclusive (YYYY-MM-DD).
    #[arg(long)]
    from:        Option<NaiveDate>,
    /// Latest date, inclusive (YYYY-MM-DD).
    #[arg(long)]
    to:          Option<NaiveDate>,
    #[arg(long)]
    limit:       Option<usize>,
  },
  /// List snapshots taken before each replace, newest first.
  Snapshots,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();

  let settings = Settings::load(&cli.config, &Overrides {
    db_path:    cli.db,
    alias_path: cli.aliases,
  })?;

  if let Some(parent) = settings.db_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {}", parent.display()))?;
  }
  let store = SqliteStore::open(&settings.db_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", settings.db_path))?;

  let format = if cli.json { Format::Json } else { Format::Text };

  let out = match cli.command {
    Command::Ingest { dir } => {
      commands::ingest(&store, &settings, &dir, RunContext::new(), format).await?
    }
    Command::Merge { secondary } => {
      commands::merge(&store, &settings, &secondary, RunContext::new(), format).await?
    }
    Command::Check { strict } => commands::check(&store, strict, format).await?,
    Command::Query { competition, season, from, to, limit } => {
      let args = QueryArgs { competition, season, from, to, limit };
      commands::query(&store, args, format).await?
    }
    Command::Snapshots => commands::snapshots(&store, format).await?,
  };
  print!("{out}");

  Ok(())
}
