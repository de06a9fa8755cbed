//! The primary results-and-odds feed.
//!
//! On disk the feed is a directory per competition, each holding one CSV per
//! season: `<root>/Premier_League/Premier_League_2324.csv`.

use std::{
  fs,
  io::Read,
  path::{Path, PathBuf},
};

use footbase_core::{feed::PrimaryRow, report::SkippedFile};
use tracing::{debug, info, warn};

use crate::{
  Error, Result,
  header::{Columns, cell, is_blank, reader},
};

const FEED: &str = "primary";

const DATE: &[&str] = &["date"];
const HOME: &[&str] = &["home_team", "hometeam", "home_name", "home"];
const AWAY: &[&str] = &["away_team", "awayteam", "away_name", "away"];
const HOME_GOALS: &[&str] = &["home_goals", "fthg"];
const AWAY_GOALS: &[&str] = &["away_goals", "ftag"];
const RESULT: &[&str] = &["result", "ftr"];
const HOME_SHOTS: &[&str] = &["home_shots", "hs"];
const AWAY_SHOTS: &[&str] = &["away_shots", "as"];
const HOME_SOT: &[&str] = &["home_shots_on_target", "hst"];
const AWAY_SOT: &[&str] = &["away_shots_on_target", "ast"];
const ODDS_HOME: &[&str] = &["odds_home", "b365h"];
const ODDS_DRAW: &[&str] = &["odds_draw", "b365d"];
const ODDS_AWAY: &[&str] = &["odds_away", "b365a"];
const COMPETITION: &[&str] = &["league", "competition"];
const SEASON: &[&str] = &["season"];

// ─── Reading ─────────────────────────────────────────────────────────────────

/// Values used when a file has no column of its own for them.
#[derive(Debug, Clone, Default)]
pub struct FileDefaults {
  pub competition: Option<String>,
  pub season:      Option<String>,
}

/// Read one primary CSV. Date and both team columns are required; any other
/// missing column reads as empty cells.
pub fn read_primary<R: Read>(
  input: R,
  origin: &str,
  defaults: &FileDefaults,
) -> Result<Vec<PrimaryRow>> {
  let mut csv = reader(input);
  let columns = Columns::new(csv.byte_headers().map_err(|e| Error::csv(origin, e))?);

  let date = columns.require(FEED, DATE)?;
  let home = columns.require(FEED, HOME)?;
  let away = columns.require(FEED, AWAY)?;
  let home_goals = columns.find(HOME_GOALS);
  let away_goals = columns.find(AWAY_GOALS);
  let result = columns.find(RESULT);
  let home_shots = columns.find(HOME_SHOTS);
  let away_shots = columns.find(AWAY_SHOTS);
  let home_sot = columns.find(HOME_SOT);
  let away_sot = columns.find(AWAY_SOT);
  let odds_home = columns.find(ODDS_HOME);
  let odds_draw = columns.find(ODDS_DRAW);
  let odds_away = columns.find(ODDS_AWAY);
  let competition = columns.find(COMPETITION);
  let season = columns.find(SEASON);

  let or_default = |value: String, fallback: &Option<String>| {
    if value.is_empty() {
      fallback.clone().unwrap_or_default()
    } else {
      value
    }
  };

  let mut rows = Vec::new();
  let mut blank = 0;
  for record in csv.byte_records() {
    let record = record.map_err(|e| Error::csv(origin, e))?;
    if is_blank(&record) {
      blank += 1;
      continue;
    }
    rows.push(PrimaryRow {
      date:                 cell(&record, Some(date)),
      home_name:            cell(&record, Some(home)),
      away_name:            cell(&record, Some(away)),
      home_goals:           cell(&record, home_goals),
      away_goals:           cell(&record, away_goals),
      result:               cell(&record, result),
      home_shots:           cell(&record, home_shots),
      away_shots:           cell(&record, away_shots),
      home_shots_on_target: cell(&record, home_sot),
      away_shots_on_target: cell(&record, away_sot),
      odds_home:            cell(&record, odds_home),
      odds_draw:            cell(&record, odds_draw),
      odds_away:            cell(&record, odds_away),
      competition:          or_default(cell(&record, competition), &defaults.competition),
      season:               or_default(cell(&record, season), &defaults.season),
    });
  }

  if blank > 0 {
    debug!(origin, blank, "skipped blank lines");
  }
  Ok(rows)
}

// ─── Discovery ───────────────────────────────────────────────────────────────

/// One CSV found under a primary feed root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedFile {
  pub path:        PathBuf,
  /// Directory name with `_` replaced by spaces.
  pub competition: String,
  /// From a trailing `_YYZZ` in the file stem, e.g. `_2324` is `2023/24`.
  pub season:      Option<String>,
}

/// Every `<root>/<Competition_Dir>/*.csv`, ordered by directory then file
/// name.
pub fn discover_primary(root: &Path) -> Result<Vec<FeedFile>> {
  let mut files = Vec::new();
  for dir in sorted_entries(root)? {
    if !dir.is_dir() {
      continue;
    }
    let Some(dir_name) = dir.file_name().and_then(|n| n.to_str()) else {
      continue;
    };
    let competition = dir_name.replace('_', " ");

    for path in sorted_entries(&dir)? {
      let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
      if !is_csv || !path.is_file() {
        continue;
      }
      let season = path
        .file_stem()
        .and_then(|s| s.to_str())
        .and_then(season_from_stem);
      files.push(FeedFile { path, competition: competition.clone(), season });
    }
  }

  if files.is_empty() {
    return Err(Error::NoFeedFiles(root.to_owned()));
  }
  Ok(files)
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
  let mut paths = fs::read_dir(dir)
    .map_err(|e| Error::io(dir, e))?
    .map(|entry| entry.map(|e| e.path()))
    .collect::<std::io::Result<Vec<_>>>()
    .map_err(|e| Error::io(dir, e))?;
  paths.sort();
  Ok(paths)
}

/// `Serie_A_1718` is season `2017/18`.
fn season_from_stem(stem: &str) -> Option<String> {
  let code = stem.rsplit('_').next()?;
  if code.len() != 4 || !code.bytes().all(|b| b.is_ascii_digit()) {
    return None;
  }
  let (start, end) = code.split_at(2);
  Some(format!("20{start}/{end}"))
}

// ─── Loading ─────────────────────────────────────────────────────────────────

/// Rows read from one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSummary {
  pub file: FeedFile,
  pub rows: usize,
}

/// Everything read from a primary feed root, in discovery order.
#[derive(Debug, Clone, Default)]
pub struct PrimaryLoad {
  pub rows:    Vec<PrimaryRow>,
  pub files:   Vec<FileSummary>,
  /// Files that could not be opened or parsed, with the reason.
  pub skipped: Vec<SkippedFile>,
}

/// Discover and read every primary CSV under `root`. A file that cannot be
/// read is skipped and listed in [`PrimaryLoad::skipped`]; the load fails
/// only when no file could be read.
pub fn load_primary_dir(root: &Path) -> Result<PrimaryLoad> {
  let mut load = PrimaryLoad::default();
  for file in discover_primary(root)? {
    let origin = file.path.display().to_string();
    match read_feed_file(&file, &origin) {
      Ok(rows) => {
        info!(file = %origin, rows = rows.len(), "primary feed file read");
        load.files.push(FileSummary { rows: rows.len(), file });
        load.rows.extend(rows);
      }
      Err(e) => {
        warn!(file = %origin, error = %e, "skipping unreadable primary feed file");
        load.skipped.push(SkippedFile { path: origin, reason: e.to_string() });
      }
    }
  }

  if load.files.is_empty() {
    return Err(Error::NoReadableFiles {
      root:    root.to_owned(),
      skipped: load.skipped.len(),
    });
  }
  Ok(load)
}

fn read_feed_file(file: &FeedFile, origin: &str) -> Result<Vec<PrimaryRow>> {
  let handle = fs::File::open(&file.path).map_err(|e| Error::io(&file.path, e))?;
  let defaults = FileDefaults {
    competition: Some(file.competition.clone()),
    season:      file.season.clone(),
  };
  read_primary(handle, origin, &defaults)
}
