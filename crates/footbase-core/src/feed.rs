//! Raw feed rows and their normalization into records.
//!
//! Loaders hand over rows exactly as the sources wrote them: every field is
//! text. Normalization parses each field independently; a field that fails to
//! parse becomes absent and is counted in [`ParseDefects`], so one bad cell
//! never costs the whole record and never turns into a wrong value.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
  alias::NameStandardizer,
  date::{DateFormat, normalize_date},
  record::{AdvancedStatRecord, MatchOutcome, MatchRecord, Odds, ShotStats},
};

// ─── Raw rows ────────────────────────────────────────────────────────────────

/// One row of the primary results-and-odds feed, unparsed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryRow {
  pub date:                 String,
  pub home_name:            String,
  pub away_name:            String,
  pub home_goals:           String,
  pub away_goals:           String,
  pub result:               String,
  pub home_shots:           String,
  pub away_shots:           String,
  pub home_shots_on_target: String,
  pub away_shots_on_target: String,
  pub odds_home:            String,
  pub odds_draw:            String,
  pub odds_away:            String,
  pub competition:          String,
  pub season:               String,
}

/// One row of the secondary expected-goals feed, unparsed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecondaryRow {
  pub date:        String,
  pub home_name:   String,
  pub away_name:   String,
  pub home_goals:  String,
  pub away_goals:  String,
  pub home_xg:     String,
  pub away_xg:     String,
  pub competition: String,
  pub season:      String,
}

// ─── Defect tally ────────────────────────────────────────────────────────────

/// Per-run counters for fields that could not be parsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseDefects {
  /// Rows whose date was empty or malformed; kept with an invalid date.
  pub invalid_dates:   usize,
  /// Non-empty numeric cells that did not parse (or were negative).
  pub invalid_numbers: usize,
  /// Non-empty result codes other than `H`, `D`, `A`.
  pub invalid_results: usize,
  /// Secondary rows dropped because they carried no usable xg pair.
  pub rejected_rows:   usize,
}

impl ParseDefects {
  pub fn total(&self) -> usize {
    self.invalid_dates + self.invalid_numbers + self.invalid_results + self.rejected_rows
  }

  pub fn merge(&mut self, other: ParseDefects) {
    self.invalid_dates += other.invalid_dates;
    self.invalid_numbers += other.invalid_numbers;
    self.invalid_results += other.invalid_results;
    self.rejected_rows += other.rejected_rows;
  }
}

// ─── Normalization ───────────────────────────────────────────────────────────

/// Normalize one primary row: day-first date, canonical names, typed numbers.
pub fn normalize_primary(
  row: &PrimaryRow,
  names: &NameStandardizer<'_>,
  defects: &mut ParseDefects,
) -> MatchRecord {
  let date = normalize_date(&row.date, DateFormat::DayFirst);
  if !date.is_valid() {
    defects.invalid_dates += 1;
    debug!(raw = %row.date, home = %row.home_name, "unparseable primary date");
  }

  let result = match row.result.trim() {
    "" => None,
    code => {
      let parsed = MatchOutcome::from_code(code);
      if parsed.is_none() {
        defects.invalid_results += 1;
        debug!(raw = %code, "unknown result code");
      }
      parsed
    }
  };

  let mut count = |raw: &str| parse_count(raw, defects);
  let home_goals = count(&row.home_goals);
  let away_goals = count(&row.away_goals);
  let home_shots = ShotStats {
    shots:           count(&row.home_shots),
    shots_on_target: count(&row.home_shots_on_target),
  };
  let away_shots = ShotStats {
    shots:           count(&row.away_shots),
    shots_on_target: count(&row.away_shots_on_target),
  };

  let mut price = |raw: &str| parse_odds(raw, defects);
  let odds = Odds {
    home: price(&row.odds_home),
    draw: price(&row.odds_draw),
    away: price(&row.odds_away),
  };

  MatchRecord {
    date,
    home_team: names.standardize(&row.home_name),
    away_team: names.standardize(&row.away_name),
    home_goals,
    away_goals,
    result,
    home_shots,
    away_shots,
    odds,
    competition: row.competition.trim().to_owned(),
    season: row.season.trim().to_owned(),
  }
}

/// Normalize one secondary row. Returns `None` (and counts a rejected row)
/// when either xg value is missing or invalid, or a team name is empty: such
/// a row has nothing to contribute to a merge.
pub fn normalize_secondary(
  row: &SecondaryRow,
  names: &NameStandardizer<'_>,
  defects: &mut ParseDefects,
) -> Option<AdvancedStatRecord> {
  let (Some(home_xg), Some(away_xg)) =
    (parse_xg(&row.home_xg, defects), parse_xg(&row.away_xg, defects))
  else {
    defects.rejected_rows += 1;
    debug!(home = %row.home_name, away = %row.away_name, "secondary row without xg");
    return None;
  };

  if row.home_name.trim().is_empty() || row.away_name.trim().is_empty() {
    defects.rejected_rows += 1;
    debug!(date = %row.date, "secondary row without both team names");
    return None;
  }

  let date = normalize_date(&row.date, DateFormat::Iso);
  if !date.is_valid() {
    defects.invalid_dates += 1;
    debug!(raw = %row.date, home = %row.home_name, "unparseable secondary date");
  }

  Some(AdvancedStatRecord {
    date,
    home_team: names.standardize(&row.home_name),
    away_team: names.standardize(&row.away_name),
    home_goals: parse_count(&row.home_goals, defects),
    away_goals: parse_count(&row.away_goals, defects),
    home_xg,
    away_xg,
    competition: row.competition.trim().to_owned(),
    season: row.season.trim().to_owned(),
  })
}

/// Normalize a whole primary feed, preserving order.
pub fn normalize_primary_feed(
  rows: &[PrimaryRow],
  names: &NameStandardizer<'_>,
) -> (Vec<MatchRecord>, ParseDefects) {
  let mut defects = ParseDefects::default();
  let records = rows
    .iter()
    .map(|r| normalize_primary(r, names, &mut defects))
    .collect();
  (records, defects)
}

/// Normalize a whole secondary feed, preserving order of the kept rows.
pub fn normalize_secondary_feed(
  rows: &[SecondaryRow],
  names: &NameStandardizer<'_>,
) -> (Vec<AdvancedStatRecord>, ParseDefects) {
  let mut defects = ParseDefects::default();
  let records = rows
    .iter()
    .filter_map(|r| normalize_secondary(r, names, &mut defects))
    .collect();
  (records, defects)
}

// ─── Field parsers ───────────────────────────────────────────────────────────

/// Spreadsheet exports write missing cells as empty strings or `NaN`.
fn is_missing(raw: &str) -> bool {
  raw.is_empty() || raw.eq_ignore_ascii_case("nan") || raw.eq_ignore_ascii_case("na")
}

/// Non-negative integer count. Accepts `3` and the float spelling `3.0`
/// that dataframe exports produce for nullable integer columns.
fn parse_count(raw: &str, defects: &mut ParseDefects) -> Option<u32> {
  let raw = raw.trim();
  if is_missing(raw) {
    return None;
  }
  let parsed = raw.parse::<u32>().ok().or_else(|| {
    raw
      .parse::<f64>()
      .ok()
      .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0 && *f <= u32::MAX as f64)
      .map(|f| f as u32)
  });
  if parsed.is_none() {
    defects.invalid_numbers += 1;
    debug!(raw = %raw, "unparseable count");
  }
  parsed
}

/// Decimal odds; must be finite and positive.
fn parse_odds(raw: &str, defects: &mut ParseDefects) -> Option<f64> {
  parse_real(raw, defects, |f| f > 0.0)
}

/// Expected goals; must be finite and non-negative.
fn parse_xg(raw: &str, defects: &mut ParseDefects) -> Option<f64> {
  parse_real(raw, defects, |f| f >= 0.0)
}

fn parse_real(
  raw: &str,
  defects: &mut ParseDefects,
  accept: impl Fn(f64) -> bool,
) -> Option<f64> {
  let raw = raw.trim();
  if is_missing(raw) {
    return None;
  }
  let parsed = raw.parse::<f64>().ok().filter(|f| f.is_finite() && accept(*f));
  if parsed.is_none() {
    defects.invalid_numbers += 1;
    debug!(raw = %raw, "unparseable real");
  }
  parsed
}
