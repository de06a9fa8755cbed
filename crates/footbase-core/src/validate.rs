//! Consistency checks over a merged record set.
//!
//! Advisory only: nothing here mutates a record or fails a run. Goal counts
//! that disagree between the feeds are reported with both observations and
//! left as they are; neither feed is treated as authoritative.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{
  reconcile::percentage,
  record::{MatchKey, MergedRecord},
};

/// Home and away goals as one feed reported them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
  pub home: Option<u32>,
  pub away: Option<u32>,
}

/// A matched record whose two feeds disagree on the score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalMismatch {
  pub key:       MatchKey,
  pub primary:   Score,
  pub secondary: Score,
}

/// Advanced-stats coverage for one competition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitionCoverage {
  pub competition: String,
  pub matched:     usize,
  pub total:       usize,
  pub percentage:  f64,
}

/// Output of [`validate`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
  pub records:                 usize,
  /// Records carrying advanced stats, i.e. the ones whose scores were compared.
  pub checked:                 usize,
  pub mismatches:              Vec<GoalMismatch>,
  /// Sorted by competition label.
  pub coverage:                Vec<CompetitionCoverage>,
  pub invalid_dates:           usize,
  pub invalid_date_percentage: f64,
}

impl QualityReport {
  pub fn mismatch_count(&self) -> usize { self.mismatches.len() }

  pub fn is_consistent(&self) -> bool { self.mismatches.is_empty() }
}

/// Compare goal counts on every matched record and compute per-competition
/// coverage and invalid-date totals over the whole set.
pub fn validate(records: &[MergedRecord]) -> QualityReport {
  let mut mismatches = Vec::new();
  let mut checked = 0;
  let mut invalid_dates = 0;
  let mut by_competition: BTreeMap<&str, (usize, usize)> = BTreeMap::new();

  for merged in records {
    let record = &merged.record;
    let entry = by_competition.entry(record.competition.as_str()).or_default();
    entry.1 += 1;

    if !record.date.is_valid() {
      invalid_dates += 1;
    }

    let Some(advanced) = &merged.advanced else {
      continue;
    };
    entry.0 += 1;
    checked += 1;

    let primary = Score { home: record.home_goals, away: record.away_goals };
    let secondary = Score { home: advanced.home_goals, away: advanced.away_goals };
    if primary != secondary {
      // A matched record always has a key: matching requires a valid date.
      if let Some(key) = merged.key() {
        mismatches.push(GoalMismatch { key, primary, secondary });
      }
    }
  }

  let coverage = by_competition
    .into_iter()
    .map(|(competition, (matched, total))| CompetitionCoverage {
      competition: competition.to_owned(),
      matched,
      total,
      percentage: percentage(matched, total),
    })
    .collect();

  if !mismatches.is_empty() {
    warn!(
      mismatches = mismatches.len(),
      checked,
      "goal counts disagree between feeds; check date and name matching"
    );
  }
  if invalid_dates > 0 {
    warn!(invalid_dates, records = records.len(), "records with invalid dates");
  }

  QualityReport {
    records: records.len(),
    checked,
    mismatches,
    coverage,
    invalid_dates,
    invalid_date_percentage: percentage(invalid_dates, records.len()),
  }
}
