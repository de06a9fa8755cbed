//! [`SqliteStore`] is the SQLite implementation of [`MatchStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;
use tracing::debug;
use uuid::Uuid;

use footbase_core::{
  record::MergedRecord,
  store::{MatchQuery, MatchStore, ReplaceOutcome, SnapshotInfo},
};

use crate::{
  Error, Result,
  encode::{
    MATCH_COLUMNS, RawMatch, RawSnapshot, encode_bound, encode_dt, encode_uuid,
    snapshot_name,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A footbase match store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn select_matches(
    &self,
    filter: QueryParams,
  ) -> Result<Vec<MergedRecord>> {
    let raws: Vec<RawMatch> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {MATCH_COLUMNS}
           FROM matches
           WHERE (?1 IS NULL OR competition = ?1)
             AND (?2 IS NULL OR season = ?2)
             AND (?3 IS NULL OR (date IS NOT NULL AND date >= ?3))
             AND (?4 IS NULL OR (date IS NOT NULL AND date <= ?4))
           ORDER BY row_order
           LIMIT ?5"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(
            rusqlite::params![
              filter.competition,
              filter.season,
              filter.from,
              filter.to,
              filter.limit,
            ],
            RawMatch::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawMatch::into_merged).collect()
  }
}

/// Owned, SQL-ready form of a [`MatchQuery`]; moved into the connection
/// thread.
#[derive(Default)]
struct QueryParams {
  competition: Option<String>,
  season:      Option<String>,
  from:        Option<String>,
  to:          Option<String>,
  /// SQLite treats a negative limit as "no limit".
  limit:       i64,
}

impl From<&MatchQuery> for QueryParams {
  fn from(q: &MatchQuery) -> Self {
    Self {
      competition: q.competition.clone(),
      season:      q.season.clone(),
      from:        encode_bound(q.from),
      to:          encode_bound(q.to),
      limit:       q
        .limit
        .map_or(-1, |n| i64::try_from(n).unwrap_or(i64::MAX)),
    }
  }
}

// ─── MatchStore impl ─────────────────────────────────────────────────────────

impl MatchStore for SqliteStore {
  type Error = Error;

  async fn load_canonical(&self) -> Result<Vec<MergedRecord>> {
    self
      .select_matches(QueryParams { limit: -1, ..QueryParams::default() })
      .await
  }

  async fn count_canonical(&self) -> Result<usize> {
    let count: i64 = self
      .conn
      .call(|conn| {
        Ok(conn.query_row("SELECT COUNT(*) FROM matches", [], |r| r.get(0))?)
      })
      .await?;
    usize::try_from(count)
      .map_err(|_| Error::Corrupt(format!("negative row count {count}")))
  }

  async fn replace_canonical(
    &self,
    run_id:   Uuid,
    records:  Vec<MergedRecord>,
    taken_at: DateTime<Utc>,
  ) -> Result<ReplaceOutcome> {
    let name = snapshot_name(taken_at);
    let rows: Vec<RawMatch> = records.iter().map(RawMatch::from_merged).collect();
    let rows_written = rows.len();

    let snapshot_table = name.clone();
    let run_id_str = encode_uuid(run_id);
    let taken_at_str = encode_dt(taken_at);

    // Snapshot, registration, and replace commit together or not at all.
    let previous: Option<i64> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let taken: bool = tx
          .query_row(
            "SELECT 1 FROM sqlite_master WHERE name = ?1
             UNION ALL
             SELECT 1 FROM snapshots WHERE name = ?1",
            rusqlite::params![snapshot_table],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if taken {
          return Ok(None);
        }

        tx.execute_batch(&format!(
          "CREATE TABLE \"{snapshot_table}\" AS SELECT * FROM matches"
        ))?;
        let previous: i64 = tx.query_row(
          &format!("SELECT COUNT(*) FROM \"{snapshot_table}\""),
          [],
          |r| r.get(0),
        )?;
        tx.execute(
          "INSERT INTO snapshots (name, run_id, taken_at, row_count)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![snapshot_table, run_id_str, taken_at_str, previous],
        )?;

        tx.execute("DELETE FROM matches", [])?;
        {
          let mut stmt = tx.prepare(
            "INSERT INTO matches (
               row_order, date, home_team, away_team, home_goals, away_goals,
               result, home_shots, away_shots, home_shots_on_target,
               away_shots_on_target, odds_home, odds_draw, odds_away,
               competition, season, home_xg, away_xg, source_home_goals,
               source_away_goals, has_advanced_stats
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13,
                       ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21)",
          )?;
          for (order, row) in (0_i64..).zip(&rows) {
            stmt.execute(rusqlite::params![
              order,
              row.date,
              row.home_team,
              row.away_team,
              row.home_goals,
              row.away_goals,
              row.result,
              row.home_shots,
              row.away_shots,
              row.home_shots_on_target,
              row.away_shots_on_target,
              row.odds_home,
              row.odds_draw,
              row.odds_away,
              row.competition,
              row.season,
              row.home_xg,
              row.away_xg,
              row.source_home_goals,
              row.source_away_goals,
              row.has_advanced_stats,
            ])?;
          }
        }

        tx.commit()?;
        Ok(Some(previous))
      })
      .await?;

    let Some(previous) = previous else {
      return Err(Error::SnapshotExists(name));
    };
    let row_count = usize::try_from(previous)
      .map_err(|_| Error::Corrupt(format!("negative row count {previous}")))?;

    debug!(snapshot = %name, row_count, rows_written, "snapshot taken and canonical set replaced");

    Ok(ReplaceOutcome {
      snapshot: SnapshotInfo { name, run_id, taken_at, row_count },
      rows_written,
    })
  }

  async fn query<'a>(&'a self, query: &'a MatchQuery) -> Result<Vec<MergedRecord>> {
    self.select_matches(QueryParams::from(query)).await
  }

  async fn list_snapshots(&self) -> Result<Vec<SnapshotInfo>> {
    let raws: Vec<RawSnapshot> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT name, run_id, taken_at, row_count
           FROM snapshots
           ORDER BY taken_at DESC, name DESC",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawSnapshot {
              name:      row.get(0)?,
              run_id:    row.get(1)?,
              taken_at:  row.get(2)?,
              row_count: row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSnapshot::into_snapshot).collect()
  }
}
