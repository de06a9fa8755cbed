//! Run reports: the structured summary handed to the operator.
//!
//! Formatting is left to the caller; everything here serializes with serde.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  feed::ParseDefects,
  reconcile::{DuplicateKey, JoinStats},
  record::MergedRecord,
  store::ReplaceOutcome,
  validate::QualityReport,
};

/// Identity of one pipeline invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunContext {
  pub run_id:     Uuid,
  pub started_at: DateTime<Utc>,
}

impl RunContext {
  pub fn new() -> Self {
    Self { run_id: Uuid::new_v4(), started_at: Utc::now() }
  }
}

impl Default for RunContext {
  fn default() -> Self { Self::new() }
}

/// Summary of a merge run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
  pub run:               RunContext,
  pub primary_defects:   ParseDefects,
  pub secondary_defects: ParseDefects,
  /// Secondary records that survived normalization.
  pub secondary_records: usize,
  pub join:              JoinStats,
  pub duplicates:        Vec<DuplicateKey>,
  pub quality:           QualityReport,
  pub persisted:         ReplaceOutcome,
}

/// A feed file left out of a run because it could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedFile {
  pub path:   String,
  pub reason: String,
}

/// Summary of loading the primary feed into canonical storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestReport {
  pub run:            RunContext,
  pub rows:           usize,
  pub defects:        ParseDefects,
  pub by_competition: BTreeMap<String, usize>,
  pub by_season:      BTreeMap<String, usize>,
  /// Earliest and latest valid dates, if any record has one.
  pub date_range:     Option<(NaiveDate, NaiveDate)>,
  pub quality:        QualityReport,
  pub persisted:      ReplaceOutcome,
  /// Files the loader skipped; filled in by the caller that read the feed.
  #[serde(default)]
  pub skipped_files:  Vec<SkippedFile>,
}

/// Record counts per competition and per season, and the valid date range.
pub(crate) fn tally(
  records: &[MergedRecord],
) -> (BTreeMap<String, usize>, BTreeMap<String, usize>, Option<(NaiveDate, NaiveDate)>) {
  let mut by_competition = BTreeMap::new();
  let mut by_season = BTreeMap::new();
  let mut range: Option<(NaiveDate, NaiveDate)> = None;

  for merged in records {
    let r = &merged.record;
    *by_competition.entry(r.competition.clone()).or_insert(0) += 1;
    *by_season.entry(r.season.clone()).or_insert(0) += 1;
    if let Some(d) = r.date.known() {
      range = Some(match range {
        None => (d, d),
        Some((lo, hi)) => (lo.min(d), hi.max(d)),
      });
    }
  }

  (by_competition, by_season, range)
}
