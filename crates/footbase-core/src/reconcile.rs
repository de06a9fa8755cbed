//! Left outer join of the primary feed against the secondary feed.
//!
//! The secondary side is indexed once by [`MatchKey`]; each primary record
//! then probes the index exactly once. Every primary record yields exactly
//! one [`MergedRecord`], in input order. A secondary record attaches to at
//! most one primary record, and the first occurrence wins wherever a key is
//! duplicated on either side.

use std::collections::{HashMap, HashSet, hash_map::Entry};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::record::{AdvancedStatRecord, AdvancedStats, MatchKey, MatchRecord, MergedRecord};

// ─── Output ──────────────────────────────────────────────────────────────────

/// Counters describing one join.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinStats {
  /// Primary records in, merged records out.
  pub total:                   usize,
  pub matched:                 usize,
  pub unmatched:               usize,
  /// Primary records that could not be probed because their date is invalid.
  /// Included in `unmatched`.
  pub primary_invalid_dates:   usize,
  /// Secondary records skipped because their date is invalid.
  pub secondary_invalid_dates: usize,
  /// Secondary records (with a valid key) that no primary record claimed,
  /// counting each duplicate occurrence.
  pub secondary_unused:        usize,
}

impl JoinStats {
  pub fn match_rate(&self) -> f64 { percentage(self.matched, self.total) }
}

/// Which side of the join carried the repeated key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
  Primary,
  Secondary,
}

/// A key that appeared more than once on one side of the join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateKey {
  pub side:        Side,
  pub key:         MatchKey,
  /// Total occurrences of the key on that side (always ≥ 2).
  pub occurrences: usize,
}

/// Result of [`reconcile`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reconciliation {
  pub records:    Vec<MergedRecord>,
  pub stats:      JoinStats,
  /// Duplicate keys, secondary side first, each side in first-seen order.
  pub duplicates: Vec<DuplicateKey>,
}

// ─── Join ────────────────────────────────────────────────────────────────────

/// Join `primary` against `secondary` on `(date, home, away)`.
///
/// Both inputs must already be normalized: canonical names and parsed dates.
pub fn reconcile(
  primary: &[MatchRecord],
  secondary: &[AdvancedStatRecord],
) -> Reconciliation {
  let mut stats = JoinStats { total: primary.len(), ..JoinStats::default() };

  let index = SecondaryIndex::build(secondary, &mut stats);

  let mut claimed: HashSet<&MatchKey> = HashSet::new();
  let mut primary_seen: HashMap<MatchKey, usize> = HashMap::new();
  let mut primary_dupes: Vec<MatchKey> = Vec::new();
  let mut records = Vec::with_capacity(primary.len());

  for record in primary {
    let Some(key) = record.key() else {
      stats.primary_invalid_dates += 1;
      stats.unmatched += 1;
      records.push(MergedRecord::unmatched(record.clone()));
      continue;
    };

    let seen = primary_seen.entry(key.clone()).or_insert(0);
    *seen += 1;
    if *seen == 2 {
      primary_dupes.push(key.clone());
    }
    let first = *seen == 1;

    match index.get(&key) {
      Some((stored_key, partner)) if first => {
        claimed.insert(stored_key);
        stats.matched += 1;
        records.push(MergedRecord::matched(record.clone(), AdvancedStats::from(partner)));
      }
      _ => {
        stats.unmatched += 1;
        records.push(MergedRecord::unmatched(record.clone()));
      }
    }
  }

  let claimed_secondary: usize = claimed
    .iter()
    .map(|k| index.occurrences(k))
    .sum();
  stats.secondary_unused = index.valid_records - claimed_secondary;

  let mut duplicates = index.duplicates();
  duplicates.extend(primary_dupes.into_iter().map(|key| {
    let occurrences = primary_seen.get(&key).copied().unwrap_or(0);
    DuplicateKey { side: Side::Primary, key, occurrences }
  }));

  info!(
    total = stats.total,
    matched = stats.matched,
    unmatched = stats.unmatched,
    match_rate = %format!("{:.1}%", stats.match_rate()),
    "reconciled feeds"
  );
  for dup in &duplicates {
    warn!(
      side = ?dup.side,
      key = %dup.key,
      occurrences = dup.occurrences,
      "duplicate join key"
    );
  }

  Reconciliation { records, stats, duplicates }
}

// ─── Secondary index ─────────────────────────────────────────────────────────

struct SecondaryIndex<'a> {
  /// Key → (first record with that key, occurrence count).
  by_key:        HashMap<MatchKey, (&'a AdvancedStatRecord, usize)>,
  /// Keys seen more than once, in the order their second occurrence appeared.
  repeated:      Vec<MatchKey>,
  valid_records: usize,
}

impl<'a> SecondaryIndex<'a> {
  fn build(secondary: &'a [AdvancedStatRecord], stats: &mut JoinStats) -> Self {
    let mut by_key = HashMap::with_capacity(secondary.len());
    let mut repeated = Vec::new();
    let mut valid_records = 0;

    for record in secondary {
      let Some(key) = record.key() else {
        stats.secondary_invalid_dates += 1;
        continue;
      };
      valid_records += 1;
      match by_key.entry(key) {
        Entry::Vacant(slot) => {
          slot.insert((record, 1));
        }
        Entry::Occupied(mut slot) => {
          let (_, count) = slot.get_mut();
          *count += 1;
          if *count == 2 {
            repeated.push(slot.key().clone());
          }
        }
      }
    }

    Self { by_key, repeated, valid_records }
  }

  fn get(&self, key: &MatchKey) -> Option<(&MatchKey, &'a AdvancedStatRecord)> {
    self
      .by_key
      .get_key_value(key)
      .map(|(k, (record, _))| (k, *record))
  }

  fn occurrences(&self, key: &MatchKey) -> usize {
    self.by_key.get(key).map_or(0, |(_, n)| *n)
  }

  fn duplicates(&self) -> Vec<DuplicateKey> {
    self
      .repeated
      .iter()
      .map(|key| DuplicateKey {
        side:        Side::Secondary,
        key:         key.clone(),
        occurrences: self.occurrences(key),
      })
      .collect()
  }
}

pub(crate) fn percentage(part: usize, whole: usize) -> f64 {
  if whole == 0 { 0.0 } else { 100.0 * part as f64 / whole as f64 }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    alias::AliasTable,
    record::{MatchDate, fixtures::*},
  };

  #[test]
  fn standardized_names_join() {
    let table = AliasTable::from_toml(
      r#"
version = 1
[sources.football_data]
"Man City"  = "Manchester City"
"Newcastle" = "Newcastle United"
"#,
    )
    .unwrap();
    let names = table.standardizer("football_data");
    let on = date(2023, 8, 12);

    let mut p = primary(on, "Man City", "Newcastle", (3, 0));
    p.home_team = names.standardize(&p.home_team);
    p.away_team = names.standardize(&p.away_team);
    let s = secondary(on, "Manchester City", "Newcastle United", (3, 0), (2.1, 0.4));

    let out = reconcile(&[p], &[s]);
    assert_eq!(out.records.len(), 1);
    let merged = &out.records[0];
    assert!(merged.has_advanced_stats());
    assert_eq!(merged.home_xg(), Some(2.1));
    assert_eq!(merged.away_xg(), Some(0.4));
    assert_eq!(out.stats.matched, 1);
    assert_eq!(out.stats.unmatched, 0);
  }

  #[test]
  fn unmatched_record_has_no_xg() {
    let p = primary(date(2023, 8, 12), "Arsenal", "Chelsea", (1, 1));
    let s = secondary(date(2023, 8, 13), "Arsenal", "Chelsea", (1, 1), (1.0, 1.0));
    let out = reconcile(&[p], &[s]);
    assert!(!out.records[0].has_advanced_stats());
    assert_eq!(out.records[0].home_xg(), None);
    assert_eq!(out.records[0].away_xg(), None);
    assert_eq!(out.stats.unmatched, 1);
    assert_eq!(out.stats.secondary_unused, 1);
  }

  #[test]
  fn no_nearest_date_matching() {
    let p = primary(date(2023, 8, 12), "Arsenal", "Chelsea", (1, 1));
    let swapped = secondary(date(2023, 8, 12), "Chelsea", "Arsenal", (1, 1), (1.0, 1.0));
    let out = reconcile(&[p], &[swapped]);
    assert_eq!(out.stats.matched, 0);
  }

  #[test]
  fn cardinality_and_order_follow_primary() {
    let on = date(2024, 1, 1);
    let mut primary_set = Vec::new();
    let mut secondary_set = Vec::new();
    for i in 0..50 {
      let home = format!("Home {i}");
      let away = format!("Away {i}");
      primary_set.push(primary(on, &home, &away, (i % 4, i % 3)));
      if i % 3 == 0 {
        secondary_set.push(secondary(on, &home, &away, (i % 4, i % 3), (1.5, 0.5)));
      }
    }
    let mut invalid = primary(on, "X", "Y", (0, 0));
    invalid.date = MatchDate::Invalid;
    primary_set.push(invalid);

    let out = reconcile(&primary_set, &secondary_set);
    assert_eq!(out.records.len(), primary_set.len());
    for (merged, original) in out.records.iter().zip(&primary_set) {
      assert_eq!(&merged.record, original);
    }
    assert_eq!(out.stats.matched, 17);
    assert_eq!(out.stats.unmatched, 34);
    assert_eq!(out.stats.primary_invalid_dates, 1);
    assert_eq!(out.stats.matched + out.stats.unmatched, out.stats.total);
  }

  #[test]
  fn rerun_is_byte_identical() {
    let on = date(2024, 3, 2);
    let primary_set = vec![
      primary(on, "A", "B", (1, 0)),
      primary(on, "C", "D", (2, 2)),
      primary(on, "A", "B", (1, 0)),
    ];
    let secondary_set = vec![
      secondary(on, "C", "D", (2, 2), (1.25, 2.5)),
      secondary(on, "A", "B", (1, 0), (0.75, 0.1)),
      secondary(on, "A", "B", (9, 9), (3.0, 3.0)),
    ];
    let first = serde_json::to_vec(&reconcile(&primary_set, &secondary_set)).unwrap();
    let second = serde_json::to_vec(&reconcile(&primary_set, &secondary_set)).unwrap();
    assert_eq!(first, second);
  }

  #[test]
  fn duplicate_primary_key_attaches_to_first_only() {
    let on = date(2023, 8, 12);
    let first = primary(on, "Manchester City", "Newcastle United", (3, 0));
    let second = primary(on, "Manchester City", "Newcastle United", (2, 1));
    let s = secondary(on, "Manchester City", "Newcastle United", (3, 0), (2.1, 0.4));

    let out = reconcile(&[first, second], &[s]);
    assert!(out.records[0].has_advanced_stats());
    assert!(!out.records[1].has_advanced_stats());
    assert_eq!(out.stats.matched, 1);
    assert_eq!(out.stats.unmatched, 1);
    assert_eq!(out.duplicates.len(), 1);
    let dup = &out.duplicates[0];
    assert_eq!(dup.side, Side::Primary);
    assert_eq!(dup.occurrences, 2);
    assert_eq!(dup.key.home, "Manchester City");
  }

  #[test]
  fn duplicate_primary_key_is_reported_without_a_partner() {
    let on = date(2023, 8, 12);
    let out = reconcile(
      &[
        primary(on, "A", "B", (1, 0)),
        primary(on, "C", "D", (0, 0)),
        primary(on, "A", "B", (2, 0)),
        primary(on, "A", "B", (3, 0)),
      ],
      &[],
    );
    assert_eq!(out.stats.matched, 0);
    assert_eq!(out.stats.unmatched, 4);
    assert_eq!(
      out.duplicates,
      vec![DuplicateKey {
        side:        Side::Primary,
        key:         out.records[0].key().unwrap(),
        occurrences: 3,
      }]
    );
  }

  #[test]
  fn duplicate_secondary_key_uses_first_occurrence() {
    let on = date(2023, 8, 12);
    let p = primary(on, "A", "B", (1, 0));
    let out = reconcile(
      &[p],
      &[
        secondary(on, "A", "B", (1, 0), (0.9, 0.2)),
        secondary(on, "A", "B", (1, 0), (5.0, 5.0)),
        secondary(on, "A", "B", (1, 0), (6.0, 6.0)),
      ],
    );
    assert_eq!(out.records[0].home_xg(), Some(0.9));
    assert_eq!(
      out.duplicates,
      vec![DuplicateKey {
        side:        Side::Secondary,
        key:         out.records[0].key().unwrap(),
        occurrences: 3,
      }]
    );
    assert_eq!(out.stats.secondary_unused, 0);
  }

  #[test]
  fn invalid_secondary_dates_are_skipped() {
    let on = date(2023, 8, 12);
    let mut s = secondary(on, "A", "B", (1, 0), (0.9, 0.2));
    s.date = MatchDate::Invalid;
    let out = reconcile(&[primary(on, "A", "B", (1, 0))], &[s]);
    assert_eq!(out.stats.secondary_invalid_dates, 1);
    assert_eq!(out.stats.matched, 0);
    assert_eq!(out.stats.secondary_unused, 0);
  }

  #[test]
  fn empty_inputs() {
    let out = reconcile(&[], &[]);
    assert!(out.records.is_empty());
    assert_eq!(out.stats, JoinStats::default());
    assert_eq!(out.stats.match_rate(), 0.0);
  }
}
