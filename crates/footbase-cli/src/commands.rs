//! One function per subcommand. Each returns the text to print.

use std::{fs, path::Path};

use anyhow::{Context as _, bail};
use chrono::NaiveDate;
use footbase_core::{
  alias::AliasTable,
  pipeline::{MergeInput, Sources, check_canonical, run_ingest, run_merge},
  report::RunContext,
  store::{MatchQuery, MatchStore},
};
use footbase_feeds::{load_primary_dir, load_secondary_file};
use footbase_store_sqlite::SqliteStore;
use serde::Serialize;
use tracing::{info, warn};

use crate::{render, settings::Settings};

/// Output format chosen by `--json`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
  Text,
  Json,
}

fn emit<T: Serialize>(
  format: Format,
  value: &T,
  text: impl FnOnce(&T) -> Result<String, std::fmt::Error>,
) -> anyhow::Result<String> {
  Ok(match format {
    Format::Json => serde_json::to_string_pretty(value)? + "\n",
    Format::Text => text(value)?,
  })
}

pub fn load_aliases(path: &Path) -> anyhow::Result<AliasTable> {
  let raw = fs::read_to_string(path)
    .with_context(|| format!("reading alias table {}", path.display()))?;
  let table = AliasTable::from_toml(&raw)
    .with_context(|| format!("parsing alias table {}", path.display()))?;
  info!(path = %path.display(), version = table.version(), "alias table loaded");
  if table.is_empty() {
    warn!(path = %path.display(), "alias table has no entries; names pass through unchanged");
  }
  Ok(table)
}

pub async fn ingest(
  store: &SqliteStore,
  settings: &Settings,
  dir: &Path,
  run: RunContext,
  format: Format,
) -> anyhow::Result<String> {
  let aliases = load_aliases(&settings.alias_path)?;
  let load = load_primary_dir(dir)
    .with_context(|| format!("reading primary feed under {}", dir.display()))?;
  info!(
    files = load.files.len(),
    skipped = load.skipped.len(),
    rows = load.rows.len(),
    "primary feed read"
  );

  let source = &settings.primary_source;
  info!(source = %source, aliases = aliases.len(source), "standardizing primary names");
  let names = aliases.standardizer(source);
  let mut report = run_ingest(store, &load.rows, &names, run)
    .await
    .context("ingest failed; canonical set unchanged")?;
  report.skipped_files = load.skipped;
  emit(format, &report, render::ingest_report)
}

pub async fn merge(
  store: &SqliteStore,
  settings: &Settings,
  secondary: &Path,
  run: RunContext,
  format: Format,
) -> anyhow::Result<String> {
  let aliases = load_aliases(&settings.alias_path)?;
  let sources = Sources {
    aliases:   &aliases,
    primary:   &settings.primary_source,
    secondary: &settings.secondary_source,
  };

  let canonical = store
    .load_canonical()
    .await
    .context("loading canonical set")?;
  if canonical.is_empty() {
    bail!("canonical set is empty; run `footbase ingest` first");
  }
  let rows = load_secondary_file(secondary)
    .with_context(|| format!("reading secondary feed {}", secondary.display()))?;

  info!(
    source = %settings.secondary_source,
    aliases = aliases.len(&settings.secondary_source),
    "standardizing secondary names"
  );
  let input = MergeInput::from_canonical(canonical, &rows, &sources);
  let report = run_merge(store, input, run)
    .await
    .context("merge failed; canonical set unchanged")?;
  emit(format, &report, render::run_report)
}

pub async fn check(
  store: &SqliteStore,
  strict: bool,
  format: Format,
) -> anyhow::Result<String> {
  let report = check_canonical(store).await.context("checking canonical set")?;
  let out = emit(format, &report, render::quality_report)?;
  if strict && !report.is_consistent() {
    print!("{out}");
    bail!("{} goal mismatches", report.mismatch_count());
  }
  if report.records == 0 {
    warn!("canonical set is empty");
  }
  Ok(out)
}

#[derive(Debug, Clone, Default)]
pub struct QueryArgs {
  pub competition: Option<String>,
  pub season:      Option<String>,
  pub from:        Option<NaiveDate>,
  pub to:          Option<NaiveDate>,
  pub limit:       Option<usize>,
}

pub async fn query(
  store: &SqliteStore,
  args: QueryArgs,
  format: Format,
) -> anyhow::Result<String> {
  if let (Some(from), Some(to)) = (args.from, args.to)
    && from > to
  {
    bail!("--from {from} is after --to {to}");
  }
  let query = MatchQuery {
    competition: args.competition,
    season:      args.season,
    from:        args.from,
    to:          args.to,
    limit:       args.limit,
  };
  let records = store.query(&query).await.context("querying canonical set")?;
  emit(format, &records, |r| render::matches(r))
}

pub async fn snapshots(store: &SqliteStore, format: Format) -> anyhow::Result<String> {
  let list = store.list_snapshots().await.context("listing snapshots")?;
  emit(format, &list, |l| render::snapshots(l))
}

#[cfg(test)]
mod tests {
  use std::path::PathBuf;

  use chrono::{TimeZone as _, Utc};
  use uuid::Uuid;

  use super::*;

  fn run_at(secs: u32) -> RunContext {
    RunContext {
      run_id:     Uuid::new_v4(),
      started_at: Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, secs).unwrap(),
    }
  }

  const ALIASES: &str = "version = 1\n[sources.football_data]\n\"Man City\" = \"Manchester City\"\n";

  const PRIMARY: &str = "\
Date,HomeTeam,AwayTeam,FTHG,FTAG,FTR
12/08/2023,Man City,Burnley,3,0,H
13/08/2023,Arsenal,Chelsea,1,1,D
";

  const SECONDARY: &str = "\
date,home_team,away_team,home_goals,away_goals,home_xg,away_xg,league,season
2023-08-12,Manchester City,Burnley,3,0,2.10,0.30,EPL,2023
";

  fn fixture(dir: &Path) -> Settings {
    let aliases = dir.join("aliases.toml");
    fs::write(&aliases, ALIASES).unwrap();
    let league = dir.join("feed").join("Premier_League");
    fs::create_dir_all(&league).unwrap();
    fs::write(league.join("Premier_League_2324.csv"), PRIMARY).unwrap();
    fs::write(dir.join("understat.csv"), SECONDARY).unwrap();
    Settings {
      db_path:          dir.join("footbase.db"),
      alias_path:       aliases,
      primary_source:   "football_data".into(),
      secondary_source: "understat".into(),
    }
  }

  #[tokio::test]
  async fn ingest_merge_query_check() {
    let dir = tempfile::tempdir().unwrap();
    let settings = fixture(dir.path());
    let store = SqliteStore::open(&settings.db_path).await.unwrap();

    let out = ingest(&store, &settings, &dir.path().join("feed"), run_at(0), Format::Text)
      .await
      .unwrap();
    assert!(out.contains("Premier League"));
    assert!(out.contains("2023/24"));

    let secondary = dir.path().join("understat.csv");
    let out = merge(&store, &settings, &secondary, run_at(1), Format::Json)
      .await
      .unwrap();
    let report: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(report["join"]["matched"], 1);
    assert_eq!(report["join"]["unmatched"], 1);

    let args = QueryArgs { competition: Some("Premier League".into()), ..QueryArgs::default() };
    let out = query(&store, args, Format::Text).await.unwrap();
    assert!(out.contains("Manchester City"));
    assert!(out.contains("xG 2.10-0.30"));
    assert!(out.ends_with("2 records\n"));

    let out = check(&store, true, Format::Text).await.unwrap();
    assert!(out.contains("0 of 1 compared"));

    let out = snapshots(&store, Format::Text).await.unwrap();
    assert_eq!(out.lines().count(), 2);
  }

  #[tokio::test]
  async fn ingest_lists_skipped_files() {
    let dir = tempfile::tempdir().unwrap();
    let settings = fixture(dir.path());
    let broken = dir.path().join("feed").join("Premier_League").join("Premier_League_0506.csv");
    fs::write(&broken, "date,home_team\n13/08/2005,Arsenal\n").unwrap();
    let store = SqliteStore::open_in_memory().await.unwrap();

    let out = ingest(&store, &settings, &dir.path().join("feed"), run_at(0), Format::Json)
      .await
      .unwrap();
    let report: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(report["rows"], 2);
    let skipped = report["skipped_files"].as_array().unwrap();
    assert_eq!(skipped.len(), 1);
    assert!(skipped[0]["path"].as_str().unwrap().ends_with("Premier_League_0506.csv"));
  }

  #[tokio::test]
  async fn merge_requires_an_ingested_set() {
    let dir = tempfile::tempdir().unwrap();
    let settings = fixture(dir.path());
    let store = SqliteStore::open_in_memory().await.unwrap();
    let secondary = dir.path().join("understat.csv");
    let err = merge(&store, &settings, &secondary, run_at(0), Format::Text)
      .await
      .unwrap_err();
    assert!(err.to_string().contains("run `footbase ingest` first"));
  }

  #[tokio::test]
  async fn inverted_date_range_is_rejected() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let args = QueryArgs {
      from: NaiveDate::from_ymd_opt(2024, 1, 2),
      to: NaiveDate::from_ymd_opt(2024, 1, 1),
      ..QueryArgs::default()
    };
    assert!(query(&store, args, Format::Text).await.is_err());
  }

  #[test]
  fn missing_alias_table_is_an_error() {
    assert!(load_aliases(&PathBuf::from("/nonexistent/aliases.toml")).is_err());
  }
}
