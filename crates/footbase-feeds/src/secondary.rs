//! The secondary expected-goals feed: one CSV, either the cleaned flat form
//! or the raw understat export whose team, goals and xG columns hold dict
//! literals.

use std::{fs, io::Read, path::Path};

use footbase_core::feed::SecondaryRow;
use tracing::{debug, info, warn};

use crate::{
  Error, Result,
  header::{Columns, cell, is_blank, reader},
  pydict::parse_flat_dict,
};

const FEED: &str = "secondary";

const DATE: &[&str] = &["date", "datetime"];
const HOME: &[&str] = &["home_team", "home_name", "home"];
const AWAY: &[&str] = &["away_team", "away_name", "away"];
const HOME_GOALS: &[&str] = &["home_goals"];
const AWAY_GOALS: &[&str] = &["away_goals"];
const HOME_XG: &[&str] = &["home_xg", "xg_home"];
const AWAY_XG: &[&str] = &["away_xg", "xg_away"];
const COMPETITION: &[&str] = &["league", "competition"];
const SEASON: &[&str] = &["season"];

const RAW_HOME: &[&str] = &["h"];
const RAW_AWAY: &[&str] = &["a"];
const RAW_GOALS: &[&str] = &["goals"];
const RAW_XG: &[&str] = &["xg"];

/// Read the secondary CSV. Date, teams, and both xg columns are required.
pub fn read_secondary<R: Read>(input: R, origin: &str) -> Result<Vec<SecondaryRow>> {
  let mut csv = reader(input);
  let columns = Columns::new(csv.byte_headers().map_err(|e| Error::csv(origin, e))?);

  if columns.find(HOME_XG).is_none() && columns.find(RAW_XG).is_some() {
    return read_raw_export(&mut csv, &columns, origin);
  }

  let date = Some(columns.require(FEED, DATE)?);
  let home = Some(columns.require(FEED, HOME)?);
  let away = Some(columns.require(FEED, AWAY)?);
  let home_xg = Some(columns.require(FEED, HOME_XG)?);
  let away_xg = Some(columns.require(FEED, AWAY_XG)?);
  let home_goals = columns.find(HOME_GOALS);
  let away_goals = columns.find(AWAY_GOALS);
  let competition = columns.find(COMPETITION);
  let season = columns.find(SEASON);

  let mut rows = Vec::new();
  for record in csv.byte_records() {
    let record = record.map_err(|e| Error::csv(origin, e))?;
    if is_blank(&record) {
      continue;
    }
    rows.push(SecondaryRow {
      date:        cell(&record, date),
      home_name:   cell(&record, home),
      away_name:   cell(&record, away),
      home_goals:  cell(&record, home_goals),
      away_goals:  cell(&record, away_goals),
      home_xg:     cell(&record, home_xg),
      away_xg:     cell(&record, away_xg),
      competition: cell(&record, competition),
      season:      cell(&record, season),
    });
  }
  debug!(origin, rows = rows.len(), "secondary rows read");
  Ok(rows)
}

/// The understat export as scraped: `h` and `a` hold team dicts, `goals` and
/// `xG` hold `{'h': .., 'a': ..}` pairs. A cell that is not such a dict leaves
/// its field for normalization to reject and count.
fn read_raw_export<R: Read>(
  csv: &mut csv::Reader<R>,
  columns: &Columns,
  origin: &str,
) -> Result<Vec<SecondaryRow>> {
  let date = Some(columns.require(FEED, DATE)?);
  let home = Some(columns.require(FEED, RAW_HOME)?);
  let away = Some(columns.require(FEED, RAW_AWAY)?);
  let xg = Some(columns.require(FEED, RAW_XG)?);
  let goals = columns.find(RAW_GOALS);
  let competition = columns.find(COMPETITION);
  let season = columns.find(SEASON);

  let mut rows = Vec::new();
  let mut malformed = 0;
  for record in csv.byte_records() {
    let record = record.map_err(|e| Error::csv(origin, e))?;
    if is_blank(&record) {
      continue;
    }
    let mut title = |i: Option<usize>| {
      dict_value(&cell(&record, i), "title", &mut malformed).unwrap_or_default()
    };
    let home_name = title(home);
    let away_name = title(away);

    let goals = cell(&record, goals);
    let xg = cell(&record, xg);
    let mut side = |raw: &str, key: &str| {
      dict_value(raw, key, &mut malformed).unwrap_or_else(|| raw.to_owned())
    };

    rows.push(SecondaryRow {
      date:        cell(&record, date),
      home_name,
      away_name,
      home_goals:  side(&goals, "h"),
      away_goals:  side(&goals, "a"),
      home_xg:     side(&xg, "h"),
      away_xg:     side(&xg, "a"),
      competition: cell(&record, competition),
      season:      cell(&record, season),
    });
  }

  if malformed > 0 {
    warn!(origin, malformed, "unparseable dict cells in secondary export");
  }
  debug!(origin, rows = rows.len(), "raw secondary rows read");
  Ok(rows)
}

/// `key` from the dict literal in `raw`. Empty cells are simply missing; any
/// other cell without the key is counted as malformed.
fn dict_value(raw: &str, key: &str, malformed: &mut usize) -> Option<String> {
  if raw.is_empty() {
    return None;
  }
  let value = parse_flat_dict(raw).and_then(|mut map| map.remove(key));
  if value.is_none() {
    *malformed += 1;
  }
  value
}

pub fn load_secondary_file(path: &Path) -> Result<Vec<SecondaryRow>> {
  let handle = fs::File::open(path).map_err(|e| Error::io(path, e))?;
  let origin = path.display().to_string();
  let rows = read_secondary(handle, &origin)?;
  info!(file = %origin, rows = rows.len(), "secondary feed file read");
  Ok(rows)
}

#[cfg(test)]
mod tests {
  use footbase_core::{alias::NameStandardizer, feed::normalize_secondary_feed};

  use super::*;

  const CLEAN: &str = "\
date,home_team,away_team,home_goals,away_goals,home_xg,away_xg,league,season
2023-08-11,Burnley,Manchester City,0,3,0.32,2.04,EPL,2023
2023-08-12 12:30:00,Arsenal,Nottingham Forest,2,1,0.8,1.2,EPL,2023
";

  #[test]
  fn reads_cleaned_export() {
    let rows = read_secondary(CLEAN.as_bytes(), "clean").unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].away_name, "Manchester City");
    assert_eq!(rows[0].away_xg, "2.04");
    assert_eq!(rows[1].date, "2023-08-12 12:30:00");
    assert_eq!(rows[1].competition, "EPL");
    assert_eq!(rows[1].season, "2023");
  }

  #[test]
  fn xg_columns_are_required() {
    let input = "date,home_team,away_team,home_goals,away_goals\n2023-08-11,A,B,0,0\n";
    let err = read_secondary(input.as_bytes(), "no-xg").unwrap_err();
    assert!(matches!(err, Error::MissingColumn { column: "home_xg", .. }));
  }

  const RAW_EXPORT: &str = r#"id,isResult,h,a,goals,xG,datetime,forecast,league,season
22275,True,"{'id': '92', 'title': 'Burnley', 'short_title': 'BUR'}","{'id': '88', 'title': 'Manchester City', 'short_title': 'MCI'}","{'h': '0', 'a': '3'}","{'h': '0.311032', 'a': '1.98374'}",2023-08-11 19:00:00,"{'w': '0.0273', 'd': '0.1016', 'l': '0.8711'}",EPL,2023
22276,True,"{'id': '83', 'title': 'Arsenal', 'short_title': 'ARS'}","{'id': '249', 'title': ""Nott'm Forest"", 'short_title': 'NFO'}","{'h': '2', 'a': '1'}",n/a,2023-08-12 12:30:00,,EPL,2023
22277,True,not a dict,"{'id': '71', 'title': 'Aston Villa'}","{'h': '1', 'a': '5'}","{'h': '1.1', 'a': '2.6'}",2023-08-12 17:30:00,,EPL,2023
"#;

  #[test]
  fn reads_raw_export_dict_columns() {
    let rows = read_secondary(RAW_EXPORT.as_bytes(), "raw").unwrap();
    assert_eq!(rows.len(), 3);

    let first = &rows[0];
    assert_eq!(first.date, "2023-08-11 19:00:00");
    assert_eq!(first.home_name, "Burnley");
    assert_eq!(first.away_name, "Manchester City");
    assert_eq!(first.home_goals, "0");
    assert_eq!(first.away_goals, "3");
    assert_eq!(first.home_xg, "0.311032");
    assert_eq!(first.away_xg, "1.98374");
    assert_eq!(first.competition, "EPL");
    assert_eq!(first.season, "2023");

    assert_eq!(rows[1].away_name, "Nott'm Forest");
    assert_eq!(rows[1].home_xg, "n/a");
    assert_eq!(rows[2].home_name, "");
    assert_eq!(rows[2].away_name, "Aston Villa");
  }

  #[test]
  fn malformed_raw_cells_become_counted_defects() {
    let rows = read_secondary(RAW_EXPORT.as_bytes(), "raw").unwrap();
    let (records, defects) = normalize_secondary_feed(&rows, &NameStandardizer::identity());
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].away_xg, 1.98374);
    assert_eq!(records[0].away_goals, Some(3));
    assert_eq!(defects.rejected_rows, 2);
    assert_eq!(defects.invalid_numbers, 2);
  }

  #[test]
  fn loads_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("understat.csv");
    fs::write(&path, CLEAN).unwrap();
    assert_eq!(load_secondary_file(&path).unwrap().len(), 2);

    let missing = dir.path().join("absent.csv");
    assert!(matches!(load_secondary_file(&missing), Err(Error::Io { .. })));
  }
}
