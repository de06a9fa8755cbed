//! Plain-text rendering of run reports and query results.
//!
//! `--json` bypasses this module entirely and prints the serde form.

use std::fmt::{self, Write as _};

use footbase_core::{
  feed::ParseDefects,
  reconcile::{DuplicateKey, Side},
  record::MergedRecord,
  report::{IngestReport, RunReport, SkippedFile},
  store::{ReplaceOutcome, SnapshotInfo},
  validate::{QualityReport, Score},
};

type Out = Result<String, fmt::Error>;

fn goals(n: Option<u32>) -> String { n.map_or_else(|| "?".into(), |n| n.to_string()) }

fn score(s: &Score) -> String { format!("{}-{}", goals(s.home), goals(s.away)) }

fn defects_line(out: &mut String, label: &str, d: &ParseDefects) -> fmt::Result {
  writeln!(
    out,
    "{label:<12}{} invalid dates, {} invalid numbers, {} invalid results, {} rejected rows",
    d.invalid_dates, d.invalid_numbers, d.invalid_results, d.rejected_rows
  )
}

fn persisted(out: &mut String, p: &ReplaceOutcome) -> fmt::Result {
  writeln!(
    out,
    "{:<12}{} ({} previous rows)",
    "snapshot", p.snapshot.name, p.snapshot.row_count
  )?;
  writeln!(out, "{:<12}{} rows", "written", p.rows_written)
}

fn duplicate_line(out: &mut String, d: &DuplicateKey) -> fmt::Result {
  let side = match d.side {
    Side::Primary => "primary",
    Side::Secondary => "secondary",
  };
  writeln!(out, "  {side:<10}{} ×{}", d.key, d.occurrences)
}

fn quality_body(out: &mut String, q: &QualityReport) -> fmt::Result {
  writeln!(out, "{:<12}{} of {} compared", "mismatches", q.mismatch_count(), q.checked)?;
  for m in &q.mismatches {
    writeln!(
      out,
      "  {}: primary {}, secondary {}",
      m.key,
      score(&m.primary),
      score(&m.secondary)
    )?;
  }
  if !q.coverage.is_empty() {
    writeln!(out, "coverage")?;
    for c in &q.coverage {
      writeln!(
        out,
        "  {:<20}{:>5} / {:<5} ({:>5.1}%)",
        c.competition, c.matched, c.total, c.percentage
      )?;
    }
  }
  writeln!(
    out,
    "{:<12}{} ({:.1}%)",
    "bad dates", q.invalid_dates, q.invalid_date_percentage
  )
}

/// Full summary of a merge run.
pub fn run_report(r: &RunReport) -> Out {
  let mut out = String::new();
  writeln!(out, "{:<12}{}", "run", r.run.run_id)?;
  writeln!(out, "{:<12}{} records", "primary", r.join.total)?;
  defects_line(&mut out, "", &r.primary_defects)?;
  writeln!(out, "{:<12}{} records", "secondary", r.secondary_records)?;
  defects_line(&mut out, "", &r.secondary_defects)?;
  writeln!(
    out,
    "{:<12}{} / {} ({:.1}%), {} unmatched",
    "matched",
    r.join.matched,
    r.join.total,
    r.join.match_rate(),
    r.join.unmatched
  )?;
  writeln!(out, "{:<12}{}", "unused", r.join.secondary_unused)?;
  if !r.duplicates.is_empty() {
    writeln!(out, "duplicates")?;
    for d in &r.duplicates {
      duplicate_line(&mut out, d)?;
    }
  }
  quality_body(&mut out, &r.quality)?;
  persisted(&mut out, &r.persisted)?;
  Ok(out)
}

/// Summary of loading the primary feed.
pub fn ingest_report(r: &IngestReport) -> Out {
  let mut out = String::new();
  writeln!(out, "{:<12}{}", "run", r.run.run_id)?;
  writeln!(out, "{:<12}{}", "rows", r.rows)?;
  defects_line(&mut out, "defects", &r.defects)?;
  writeln!(out, "competitions")?;
  for (competition, n) in &r.by_competition {
    writeln!(out, "  {competition:<20}{n:>6}")?;
  }
  writeln!(out, "seasons")?;
  for (season, n) in &r.by_season {
    writeln!(out, "  {season:<20}{n:>6}")?;
  }
  if let Some((lo, hi)) = r.date_range {
    writeln!(out, "{:<12}{lo} to {hi}", "dates")?;
  }
  writeln!(
    out,
    "{:<12}{} ({:.1}%)",
    "bad dates", r.quality.invalid_dates, r.quality.invalid_date_percentage
  )?;
  persisted(&mut out, &r.persisted)?;
  skipped_files(&mut out, &r.skipped_files)?;
  Ok(out)
}

fn skipped_files(out: &mut String, files: &[SkippedFile]) -> fmt::Result {
  if files.is_empty() {
    return Ok(());
  }
  writeln!(out, "{:<12}{} files", "skipped", files.len())?;
  for f in files {
    writeln!(out, "  {}: {}", f.path, f.reason)?;
  }
  Ok(())
}

/// Consistency checks over the stored canonical set.
pub fn quality_report(q: &QualityReport) -> Out {
  let mut out = String::new();
  writeln!(out, "{:<12}{}", "records", q.records)?;
  quality_body(&mut out, q)?;
  Ok(out)
}

/// One line per record.
pub fn matches(records: &[MergedRecord]) -> Out {
  let mut out = String::new();
  for m in records {
    let r = &m.record;
    let date = r.date.known().map_or_else(|| "????-??-??".into(), |d| d.to_string());
    write!(
      out,
      "{date}  {:<24} {}-{} {:<24}",
      r.home_team,
      goals(r.home_goals),
      goals(r.away_goals),
      r.away_team
    )?;
    if let Some(a) = &m.advanced {
      write!(out, "  xG {:.2}-{:.2}", a.home_xg, a.away_xg)?;
    }
    writeln!(out, "  [{} {}]", r.competition, r.season)?;
  }
  writeln!(out, "{} records", records.len())?;
  Ok(out)
}

pub fn snapshots(list: &[SnapshotInfo]) -> Out {
  let mut out = String::new();
  if list.is_empty() {
    writeln!(out, "no snapshots")?;
  }
  for s in list {
    writeln!(
      out,
      "{}  {}  {:>6} rows  run {}",
      s.name,
      s.taken_at.to_rfc3339(),
      s.row_count,
      s.run_id
    )?;
  }
  Ok(out)
}

#[cfg(test)]
mod tests {
  use chrono::{NaiveDate, TimeZone as _, Utc};
  use footbase_core::{
    record::{AdvancedStats, MatchDate, MatchKey, MatchRecord, Odds, ShotStats},
    validate::{CompetitionCoverage, GoalMismatch},
  };
  use uuid::Uuid;

  use super::*;

  fn day() -> NaiveDate { NaiveDate::from_ymd_opt(2023, 8, 12).unwrap() }

  #[test]
  fn mismatches_show_both_scores() {
    let report = QualityReport {
      records: 2,
      checked: 1,
      mismatches: vec![GoalMismatch {
        key:       MatchKey { date: day(), home: "A".into(), away: "B".into() },
        primary:   Score { home: Some(1), away: Some(1) },
        secondary: Score { home: Some(1), away: None },
      }],
      coverage: vec![CompetitionCoverage {
        competition: "Serie A".into(),
        matched:     1,
        total:       2,
        percentage:  50.0,
      }],
      invalid_dates: 0,
      invalid_date_percentage: 0.0,
    };
    let text = quality_report(&report).unwrap();
    assert!(text.contains("2023-08-12 A v B: primary 1-1, secondary 1-?"));
    assert!(text.contains("Serie A"));
    assert!(text.contains("( 50.0%)"));
  }

  #[test]
  fn match_lines_include_xg_when_present() {
    let record = MatchRecord {
      date:        MatchDate::Known(day()),
      home_team:   "Manchester City".into(),
      away_team:   "Newcastle United".into(),
      home_goals:  Some(3),
      away_goals:  Some(0),
      result:      None,
      home_shots:  ShotStats::default(),
      away_shots:  ShotStats::default(),
      odds:        Odds::default(),
      competition: "Premier League".into(),
      season:      "2023/24".into(),
    };
    let mut invalid = MergedRecord::unmatched(record.clone());
    invalid.record.date = MatchDate::Invalid;
    let rows = vec![
      MergedRecord::matched(record, AdvancedStats {
        home_xg:    2.1,
        away_xg:    0.4,
        home_goals: Some(3),
        away_goals: Some(0),
      }),
      invalid,
    ];

    let text = matches(&rows).unwrap();
    let lines: Vec<_> = text.lines().collect();
    assert!(lines[0].starts_with("2023-08-12"));
    assert!(lines[0].contains("xG 2.10-0.40"));
    assert!(lines[1].starts_with("????-??-??"));
    assert!(!lines[1].contains("xG"));
    assert_eq!(lines[2], "2 records");
  }

  #[test]
  fn skipped_files_are_listed_with_reasons() {
    let mut out = String::new();
    skipped_files(&mut out, &[]).unwrap();
    assert!(out.is_empty());

    skipped_files(&mut out, &[SkippedFile {
      path:   "feed/Serie_A/Serie_A_0506.csv".into(),
      reason: "primary feed has no away_team column".into(),
    }])
    .unwrap();
    assert_eq!(
      out,
      "skipped     1 files\n  feed/Serie_A/Serie_A_0506.csv: primary feed has no away_team column\n"
    );
  }

  #[test]
  fn snapshot_listing() {
    assert_eq!(snapshots(&[]).unwrap(), "no snapshots\n");
    let at = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
    let text = snapshots(&[SnapshotInfo {
      name: "matches_backup_20240101_120000".into(),
      run_id: Uuid::nil(),
      taken_at: at,
      row_count: 1826,
    }])
    .unwrap();
    assert!(text.starts_with("matches_backup_20240101_120000  2024-01-01T12:00:00+00:00"));
    assert!(text.contains("1826 rows"));
  }
}
