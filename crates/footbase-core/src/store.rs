//! The `MatchStore` trait and supporting query types.
//!
//! Implemented by storage backends (e.g. `footbase-store-sqlite`). The
//! pipeline and the CLI depend on this abstraction, not on a concrete backend.

use std::future::Future;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::record::MergedRecord;

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`MatchStore::query`]. Every filter is optional; records
/// with an invalid date never satisfy a date bound.
#[derive(Debug, Clone, Default)]
pub struct MatchQuery {
  pub competition: Option<String>,
  pub season:      Option<String>,
  /// Inclusive lower bound.
  pub from:        Option<NaiveDate>,
  /// Inclusive upper bound.
  pub to:          Option<NaiveDate>,
  pub limit:       Option<usize>,
}

// ─── Snapshots ───────────────────────────────────────────────────────────────

/// A registered copy of the canonical set, taken just before it was replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotInfo {
  /// Name of the relation holding the copy, e.g. `matches_backup_20240101_120000`.
  pub name:      String,
  /// The run that replaced the canonical set after taking this snapshot.
  pub run_id:    Uuid,
  pub taken_at:  DateTime<Utc>,
  pub row_count: usize,
}

/// What a successful [`MatchStore::replace_canonical`] did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplaceOutcome {
  pub snapshot:     SnapshotInfo,
  pub rows_written: usize,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over durable storage for the canonical merged set.
///
/// The canonical set is only ever replaced wholesale. Implementations must
/// snapshot the current set first and must not let readers observe a
/// partially written or missing canonical set; if the snapshot cannot be
/// taken, the canonical set is left exactly as it was.
///
/// A store assumes exclusive write access for the duration of a run;
/// callers serialize runs.
pub trait MatchStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Every canonical record, in persisted order.
  fn load_canonical(
    &self,
  ) -> impl Future<Output = Result<Vec<MergedRecord>, Self::Error>> + Send + '_;

  /// Number of canonical records.
  fn count_canonical(
    &self,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// Snapshot the current canonical set, then replace it with `records`, as
  /// one all-or-nothing operation. `taken_at` names the snapshot.
  fn replace_canonical(
    &self,
    run_id: Uuid,
    records: Vec<MergedRecord>,
    taken_at: DateTime<Utc>,
  ) -> impl Future<Output = Result<ReplaceOutcome, Self::Error>> + Send + '_;

  /// Canonical records matching `query`, in persisted order.
  fn query<'a>(
    &'a self,
    query: &'a MatchQuery,
  ) -> impl Future<Output = Result<Vec<MergedRecord>, Self::Error>> + Send + 'a;

  /// Registered snapshots, newest first.
  fn list_snapshots(
    &self,
  ) -> impl Future<Output = Result<Vec<SnapshotInfo>, Self::Error>> + Send + '_;
}
