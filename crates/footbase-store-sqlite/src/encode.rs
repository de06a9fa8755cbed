//! Encoding and decoding helpers between domain records and the plain
//! column values stored in SQLite.
//!
//! Match dates are stored as `YYYY-MM-DD` text, or NULL when the feed's date
//! could not be parsed. Snapshot timestamps are RFC 3339 strings. UUIDs are
//! stored as hyphenated lowercase strings.

use chrono::{DateTime, NaiveDate, Utc};
use footbase_core::{
  record::{
    AdvancedStats, MatchDate, MatchOutcome, MatchRecord, MergedRecord, Odds,
    ShotStats,
  },
  store::SnapshotInfo,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── MatchDate ───────────────────────────────────────────────────────────────

const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn encode_date(date: MatchDate) -> Option<String> {
  date.known().map(|d| d.format(DATE_FORMAT).to_string())
}

pub fn decode_date(s: Option<&str>) -> Result<MatchDate> {
  match s {
    None => Ok(MatchDate::Invalid),
    Some(s) => NaiveDate::parse_from_str(s, DATE_FORMAT)
      .map(MatchDate::Known)
      .map_err(|e| Error::DateParse(format!("{s:?}: {e}"))),
  }
}

/// Bound for a date filter, in the same text form as the `date` column.
pub fn encode_bound(date: Option<NaiveDate>) -> Option<String> {
  date.map(|d| d.format(DATE_FORMAT).to_string())
}

/// Name of the snapshot table taken at `taken_at`.
pub fn snapshot_name(taken_at: DateTime<Utc>) -> String {
  format!("matches_backup_{}", taken_at.format("%Y%m%d_%H%M%S"))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list shared by every `SELECT` against `matches`; the order matches
/// [`RawMatch::from_row`].
pub const MATCH_COLUMNS: &str = "
  date, home_team, away_team, home_goals, away_goals, result,
  home_shots, away_shots, home_shots_on_target, away_shots_on_target,
  odds_home, odds_draw, odds_away, competition, season,
  home_xg, away_xg, source_home_goals, source_away_goals, has_advanced_stats";

/// Column values read directly from a `matches` row.
pub struct RawMatch {
  pub date:                 Option<String>,
  pub home_team:            String,
  pub away_team:            String,
  pub home_goals:           Option<u32>,
  pub away_goals:           Option<u32>,
  pub result:               Option<String>,
  pub home_shots:           Option<u32>,
  pub away_shots:           Option<u32>,
  pub home_shots_on_target: Option<u32>,
  pub away_shots_on_target: Option<u32>,
  pub odds_home:            Option<f64>,
  pub odds_draw:            Option<f64>,
  pub odds_away:            Option<f64>,
  pub competition:          String,
  pub season:               String,
  pub home_xg:              Option<f64>,
  pub away_xg:              Option<f64>,
  pub source_home_goals:    Option<u32>,
  pub source_away_goals:    Option<u32>,
  pub has_advanced_stats:   bool,
}

impl RawMatch {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      date:                 row.get(0)?,
      home_team:            row.get(1)?,
      away_team:            row.get(2)?,
      home_goals:           row.get(3)?,
      away_goals:           row.get(4)?,
      result:               row.get(5)?,
      home_shots:           row.get(6)?,
      away_shots:           row.get(7)?,
      home_shots_on_target: row.get(8)?,
      away_shots_on_target: row.get(9)?,
      odds_home:            row.get(10)?,
      odds_draw:            row.get(11)?,
      odds_away:            row.get(12)?,
      competition:          row.get(13)?,
      season:               row.get(14)?,
      home_xg:              row.get(15)?,
      away_xg:              row.get(16)?,
      source_home_goals:    row.get(17)?,
      source_away_goals:    row.get(18)?,
      has_advanced_stats:   row.get(19)?,
    })
  }

  /// Build a row from a merged record, ready to be bound to an `INSERT`.
  pub fn from_merged(merged: &MergedRecord) -> Self {
    let r = &merged.record;
    let advanced = merged.advanced.as_ref();
    Self {
      date:                 encode_date(r.date),
      home_team:            r.home_team.clone(),
      away_team:            r.away_team.clone(),
      home_goals:           r.home_goals,
      away_goals:           r.away_goals,
      result:               r.result.map(|o| o.code().to_owned()),
      home_shots:           r.home_shots.shots,
      away_shots:           r.away_shots.shots,
      home_shots_on_target: r.home_shots.shots_on_target,
      away_shots_on_target: r.away_shots.shots_on_target,
      odds_home:            r.odds.home,
      odds_draw:            r.odds.draw,
      odds_away:            r.odds.away,
      competition:          r.competition.clone(),
      season:               r.season.clone(),
      home_xg:              advanced.map(|a| a.home_xg),
      away_xg:              advanced.map(|a| a.away_xg),
      source_home_goals:    advanced.and_then(|a| a.home_goals),
      source_away_goals:    advanced.and_then(|a| a.away_goals),
      has_advanced_stats:   advanced.is_some(),
    }
  }

  pub fn into_merged(self) -> Result<MergedRecord> {
    let result = self
      .result
      .as_deref()
      .map(|code| {
        MatchOutcome::from_code(code)
          .ok_or_else(|| Error::Corrupt(format!("unknown result code {code:?}")))
      })
      .transpose()?;

    let advanced = if self.has_advanced_stats {
      let (Some(home_xg), Some(away_xg)) = (self.home_xg, self.away_xg) else {
        return Err(Error::Corrupt(format!(
          "{} v {} is flagged with advanced stats but has no xg",
          self.home_team, self.away_team
        )));
      };
      Some(AdvancedStats {
        home_xg,
        away_xg,
        home_goals: self.source_home_goals,
        away_goals: self.source_away_goals,
      })
    } else {
      None
    };

    let record = MatchRecord {
      date: decode_date(self.date.as_deref())?,
      home_team: self.home_team,
      away_team: self.away_team,
      home_goals: self.home_goals,
      away_goals: self.away_goals,
      result,
      home_shots: ShotStats {
        shots:           self.home_shots,
        shots_on_target: self.home_shots_on_target,
      },
      away_shots: ShotStats {
        shots:           self.away_shots,
        shots_on_target: self.away_shots_on_target,
      },
      odds: Odds {
        home: self.odds_home,
        draw: self.odds_draw,
        away: self.odds_away,
      },
      competition: self.competition,
      season: self.season,
    };

    Ok(MergedRecord { record, advanced })
  }
}

/// Raw strings read directly from a `snapshots` row.
pub struct RawSnapshot {
  pub name:      String,
  pub run_id:    String,
  pub taken_at:  String,
  pub row_count: i64,
}

impl RawSnapshot {
  pub fn into_snapshot(self) -> Result<SnapshotInfo> {
    let row_count = usize::try_from(self.row_count).map_err(|_| {
      Error::Corrupt(format!("snapshot {} has row count {}", self.name, self.row_count))
    })?;
    Ok(SnapshotInfo {
      run_id: decode_uuid(&self.run_id)?,
      taken_at: decode_dt(&self.taken_at)?,
      name: self.name,
      row_count,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone as _;

  use super::*;

  #[test]
  fn snapshot_names_are_second_resolution() {
    let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
    assert_eq!(snapshot_name(at), "matches_backup_20240102_030405");
  }

  #[test]
  fn invalid_date_is_null() {
    assert_eq!(encode_date(MatchDate::Invalid), None);
    assert_eq!(decode_date(None).unwrap(), MatchDate::Invalid);
    let d = NaiveDate::from_ymd_opt(2023, 8, 12).unwrap();
    assert_eq!(encode_date(MatchDate::Known(d)).as_deref(), Some("2023-08-12"));
    assert_eq!(decode_date(Some("2023-08-12")).unwrap(), MatchDate::Known(d));
    assert!(decode_date(Some("12/08/2023")).is_err());
  }
}
