//! Pipeline orchestration: normalize → reconcile → validate → persist.
//!
//! Everything before [`MatchStore::replace_canonical`] is pure and in memory,
//! so a run that fails or is abandoned before that call leaves storage
//! untouched. The store handle is passed in explicitly; the pipeline never
//! opens or caches a connection of its own.

use tracing::{info, info_span, Instrument as _};

use crate::{
  Error, Result,
  alias::{AliasTable, NameStandardizer},
  feed::{
    ParseDefects, PrimaryRow, SecondaryRow, normalize_primary_feed,
    normalize_secondary_feed,
  },
  reconcile::reconcile,
  record::{AdvancedStatRecord, MatchRecord, MergedRecord},
  report::{IngestReport, RunContext, RunReport, tally},
  store::MatchStore,
  validate::{QualityReport, validate},
};

// ─── Sources ─────────────────────────────────────────────────────────────────

/// Which alias mappings apply to which feed.
#[derive(Debug, Clone, Copy)]
pub struct Sources<'a> {
  pub aliases:   &'a AliasTable,
  pub primary:   &'a str,
  pub secondary: &'a str,
}

impl<'a> Sources<'a> {
  pub fn primary_names(&self) -> NameStandardizer<'a> {
    self.aliases.standardizer(self.primary)
  }

  pub fn secondary_names(&self) -> NameStandardizer<'a> {
    self.aliases.standardizer(self.secondary)
  }
}

// ─── Merge input ─────────────────────────────────────────────────────────────

/// Both feeds, normalized and ready to join.
#[derive(Debug, Clone, Default)]
pub struct MergeInput {
  pub primary:           Vec<MatchRecord>,
  pub secondary:         Vec<AdvancedStatRecord>,
  pub primary_defects:   ParseDefects,
  pub secondary_defects: ParseDefects,
}

impl MergeInput {
  /// Normalize both feeds from raw rows.
  pub fn from_rows(
    primary: &[PrimaryRow],
    secondary: &[SecondaryRow],
    sources: &Sources<'_>,
  ) -> Self {
    let (primary, primary_defects) =
      normalize_primary_feed(primary, &sources.primary_names());
    let (secondary, secondary_defects) =
      normalize_secondary_feed(secondary, &sources.secondary_names());
    Self { primary, secondary, primary_defects, secondary_defects }
  }

  /// Use a previously persisted canonical set as the primary feed. Stored
  /// advanced stats are discarded and names are standardized again, so an
  /// alias added since the last run takes effect.
  pub fn from_canonical(
    canonical: Vec<MergedRecord>,
    secondary: &[SecondaryRow],
    sources: &Sources<'_>,
  ) -> Self {
    let names = sources.primary_names();
    let primary = canonical
      .into_iter()
      .map(|merged| {
        let mut record = merged.into_primary();
        record.home_team = names.standardize(&record.home_team);
        record.away_team = names.standardize(&record.away_team);
        record
      })
      .collect();
    let (secondary, secondary_defects) =
      normalize_secondary_feed(secondary, &sources.secondary_names());
    Self {
      primary,
      secondary,
      primary_defects: ParseDefects::default(),
      secondary_defects,
    }
  }
}

// ─── Runs ────────────────────────────────────────────────────────────────────

/// Join, validate, and persist. Validation findings are reported, never
/// fatal; only a store failure aborts, and then nothing has been replaced.
pub async fn run_merge<S: MatchStore>(
  store: &S,
  input: MergeInput,
  run: RunContext,
) -> Result<RunReport> {
  let span = info_span!("merge", run_id = %run.run_id);
  async move {
    let secondary_records = input.secondary.len();
    let joined = reconcile(&input.primary, &input.secondary);
    let quality = validate(&joined.records);

    let persisted = store
      .replace_canonical(run.run_id, joined.records, run.started_at)
      .await
      .map_err(Error::store)?;
    info!(
      snapshot = %persisted.snapshot.name,
      rows = persisted.rows_written,
      "canonical set replaced"
    );

    Ok(RunReport {
      run,
      primary_defects: input.primary_defects,
      secondary_defects: input.secondary_defects,
      secondary_records,
      join: joined.stats,
      duplicates: joined.duplicates,
      quality,
      persisted,
    })
  }
  .instrument(span)
  .await
}

/// Load the primary feed into canonical storage without advanced stats.
pub async fn run_ingest<S: MatchStore>(
  store: &S,
  rows: &[PrimaryRow],
  names: &NameStandardizer<'_>,
  run: RunContext,
) -> Result<IngestReport> {
  let span = info_span!("ingest", run_id = %run.run_id);
  async move {
    let (primary, defects) = normalize_primary_feed(rows, names);
    let records: Vec<MergedRecord> =
      primary.into_iter().map(MergedRecord::unmatched).collect();

    let quality = validate(&records);
    let (by_competition, by_season, date_range) = tally(&records);

    let persisted = store
      .replace_canonical(run.run_id, records, run.started_at)
      .await
      .map_err(Error::store)?;
    info!(
      snapshot = %persisted.snapshot.name,
      rows = persisted.rows_written,
      "canonical set loaded"
    );

    Ok(IngestReport {
      run,
      rows: rows.len(),
      defects,
      by_competition,
      by_season,
      date_range,
      quality,
      persisted,
      skipped_files: Vec::new(),
    })
  }
  .instrument(span)
  .await
}

/// Re-run the consistency checks against what is currently stored.
pub async fn check_canonical<S: MatchStore>(store: &S) -> Result<QualityReport> {
  let records = store.load_canonical().await.map_err(Error::store)?;
  Ok(validate(&records))
}
