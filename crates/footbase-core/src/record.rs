//! Match records: the rows flowing through a reconciliation run.
//!
//! A [`MatchRecord`] comes from the primary results-and-odds feed, an
//! [`AdvancedStatRecord`] from the secondary expected-goals feed. The
//! reconciler joins the two into [`MergedRecord`]s, which are what the store
//! persists. None of these types is mutated after construction.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ─── Dates ───────────────────────────────────────────────────────────────────

/// A calendar date, or an explicit marker that the source text could not be
/// parsed. A malformed string never survives normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum MatchDate {
  Known(NaiveDate),
  Invalid,
}

impl MatchDate {
  pub fn known(&self) -> Option<NaiveDate> {
    match self {
      Self::Known(d) => Some(*d),
      Self::Invalid => None,
    }
  }

  pub fn is_valid(&self) -> bool { matches!(self, Self::Known(_)) }
}

impl From<Option<NaiveDate>> for MatchDate {
  fn from(d: Option<NaiveDate>) -> Self {
    d.map_or(Self::Invalid, Self::Known)
  }
}

// ─── Join key ────────────────────────────────────────────────────────────────

/// The `(date, home, away)` tuple identifying one match across both feeds.
/// Equality is structural; names must already be canonical.
#[derive(
  Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct MatchKey {
  pub date: NaiveDate,
  pub home: String,
  pub away: String,
}

impl fmt::Display for MatchKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} {} v {}", self.date, self.home, self.away)
  }
}

// ─── Result code ─────────────────────────────────────────────────────────────

/// Full-time result as coded by the primary feed (`H`, `D`, `A`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchOutcome {
  Home,
  Draw,
  Away,
}

impl MatchOutcome {
  pub fn from_code(code: &str) -> Option<Self> {
    match code.trim() {
      "H" | "h" => Some(Self::Home),
      "D" | "d" => Some(Self::Draw),
      "A" | "a" => Some(Self::Away),
      _ => None,
    }
  }

  pub fn code(&self) -> &'static str {
    match self {
      Self::Home => "H",
      Self::Draw => "D",
      Self::Away => "A",
    }
  }
}

// ─── Primary feed ────────────────────────────────────────────────────────────

/// Shot counts for one side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ShotStats {
  pub shots:           Option<u32>,
  pub shots_on_target: Option<u32>,
}

/// Fixed-odds triple quoted before kick-off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Odds {
  pub home: Option<f64>,
  pub draw: Option<f64>,
  pub away: Option<f64>,
}

/// One match as reported by the primary results-and-odds feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
  pub date:        MatchDate,
  pub home_team:   String,
  pub away_team:   String,
  pub home_goals:  Option<u32>,
  pub away_goals:  Option<u32>,
  pub result:      Option<MatchOutcome>,
  pub home_shots:  ShotStats,
  pub away_shots:  ShotStats,
  pub odds:        Odds,
  /// Competition label, e.g. "Premier League".
  pub competition: String,
  pub season:      String,
}

impl MatchRecord {
  /// The join key, or `None` when the date is invalid.
  pub fn key(&self) -> Option<MatchKey> {
    self.date.known().map(|date| MatchKey {
      date,
      home: self.home_team.clone(),
      away: self.away_team.clone(),
    })
  }
}

// ─── Secondary feed ──────────────────────────────────────────────────────────

/// One match as reported by the secondary expected-goals feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvancedStatRecord {
  pub date:        MatchDate,
  pub home_team:   String,
  pub away_team:   String,
  pub home_goals:  Option<u32>,
  pub away_goals:  Option<u32>,
  pub home_xg:     f64,
  pub away_xg:     f64,
  pub competition: String,
  pub season:      String,
}

impl AdvancedStatRecord {
  pub fn key(&self) -> Option<MatchKey> {
    self.date.known().map(|date| MatchKey {
      date,
      home: self.home_team.clone(),
      away: self.away_team.clone(),
    })
  }
}

// ─── Merged ──────────────────────────────────────────────────────────────────

/// The advanced-statistics block attached to a matched record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdvancedStats {
  pub home_xg:    f64,
  pub away_xg:    f64,
  /// Goals as reported by the secondary feed; kept for consistency checks.
  pub home_goals: Option<u32>,
  pub away_goals: Option<u32>,
}

impl From<&AdvancedStatRecord> for AdvancedStats {
  fn from(r: &AdvancedStatRecord) -> Self {
    Self {
      home_xg:    r.home_xg,
      away_xg:    r.away_xg,
      home_goals: r.home_goals,
      away_goals: r.away_goals,
    }
  }
}

/// A primary record with the secondary feed's statistics attached when the
/// join found a partner. `advanced` is the single source of truth for
/// provenance: no advanced block means no xg, never a zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedRecord {
  pub record:   MatchRecord,
  pub advanced: Option<AdvancedStats>,
}

impl MergedRecord {
  pub fn unmatched(record: MatchRecord) -> Self {
    Self { record, advanced: None }
  }

  pub fn matched(record: MatchRecord, stats: AdvancedStats) -> Self {
    Self { record, advanced: Some(stats) }
  }

  pub fn has_advanced_stats(&self) -> bool { self.advanced.is_some() }

  pub fn home_xg(&self) -> Option<f64> { self.advanced.map(|a| a.home_xg) }

  pub fn away_xg(&self) -> Option<f64> { self.advanced.map(|a| a.away_xg) }

  pub fn key(&self) -> Option<MatchKey> { self.record.key() }

  /// Drop the advanced block, recovering the primary record. Used when a
  /// stored canonical set is fed back into a fresh run.
  pub fn into_primary(self) -> MatchRecord { self.record }
}
