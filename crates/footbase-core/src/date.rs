//! Date normalization for both feeds.
//!
//! The primary feed writes dates day-first (`12/08/2023`, sometimes with a
//! two-digit year); the secondary feed writes ISO dates, often with a time
//! component attached. Both are reduced to a [`MatchDate`].

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::record::MatchDate;

/// Two-digit years below this resolve to the 2000s, the rest to the 1900s.
pub const CENTURY_PIVOT: u32 = 50;

/// The textual layout a source uses for its dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateFormat {
  /// `DD/MM/YYYY` or `DD/MM/YY`; `-` and `.` are accepted as separators.
  DayFirst,
  /// `YYYY-MM-DD`, optionally followed by ` HH:MM:SS` or `THH:MM:SS`.
  Iso,
}

/// Parse `raw` according to `format`. Empty or malformed input yields
/// [`MatchDate::Invalid`]; a date is never guessed.
pub fn normalize_date(raw: &str, format: DateFormat) -> MatchDate {
  let raw = raw.trim();
  if raw.is_empty() {
    return MatchDate::Invalid;
  }
  let parsed = match format {
    DateFormat::DayFirst => parse_day_first(raw),
    DateFormat::Iso => parse_iso(raw),
  };
  parsed.into()
}

fn parse_day_first(raw: &str) -> Option<NaiveDate> {
  let parts: Vec<&str> = raw.split(['/', '-', '.']).collect();
  let [day, month, year] = parts.as_slice() else {
    return None;
  };

  let day: u32 = parse_digits(day, 1..=2)?;
  let month: u32 = parse_digits(month, 1..=2)?;
  let year: i32 = match year.len() {
    2 => {
      let yy: u32 = parse_digits(year, 2..=2)?;
      let century = if yy < CENTURY_PIVOT { 2000 } else { 1900 };
      century + yy as i32
    }
    4 => parse_digits::<u32>(year, 4..=4)? as i32,
    _ => return None,
  };

  NaiveDate::from_ymd_opt(year, month, day)
}

fn parse_iso(raw: &str) -> Option<NaiveDate> {
  if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
    return Some(d);
  }
  ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"]
    .iter()
    .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
    .map(|dt| dt.date())
}

/// Accept only ASCII digits within the given length range; rejects signs and
/// whitespace that `str::parse` would otherwise let through.
fn parse_digits<T: std::str::FromStr>(
  s: &str,
  len: std::ops::RangeInclusive<usize>,
) -> Option<T> {
  if !len.contains(&s.len()) || !s.bytes().all(|b| b.is_ascii_digit()) {
    return None;
  }
  s.parse().ok()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn ymd(y: i32, m: u32, d: u32) -> MatchDate {
    MatchDate::Known(NaiveDate::from_ymd_opt(y, m, d).unwrap())
  }

  #[test]
  fn day_first_takes_precedence() {
    assert_eq!(normalize_date("03/04/2021", DateFormat::DayFirst), ymd(2021, 4, 3));
    assert_eq!(normalize_date("12/08/2023", DateFormat::DayFirst), ymd(2023, 8, 12));
  }

  #[test]
  fn separators_are_interchangeable() {
    let mut day = NaiveDate::from_ymd_opt(1990, 1, 1).unwrap();
    let end = NaiveDate::from_ymd_opt(2030, 12, 31).unwrap();
    while day <= end {
      let expected = MatchDate::Known(day);
      for sep in ["/", "-", "."] {
        let text = day.format(&format!("%d{sep}%m{sep}%Y")).to_string();
        assert_eq!(normalize_date(&text, DateFormat::DayFirst), expected, "{text}");
      }
      day = day.succ_opt().unwrap();
    }
  }

  #[test]
  fn two_digit_years_pivot_at_fifty() {
    assert_eq!(normalize_date("12/08/23", DateFormat::DayFirst), ymd(2023, 8, 12));
    assert_eq!(normalize_date("01/01/49", DateFormat::DayFirst), ymd(2049, 1, 1));
    assert_eq!(normalize_date("01/01/50", DateFormat::DayFirst), ymd(1950, 1, 1));
    assert_eq!(normalize_date("31/12/99", DateFormat::DayFirst), ymd(1999, 12, 31));
  }

  #[test]
  fn single_digit_components() {
    assert_eq!(normalize_date("5/9/2020", DateFormat::DayFirst), ymd(2020, 9, 5));
  }

  #[test]
  fn malformed_day_first_is_invalid() {
    for raw in [
      "",
      "   ",
      "NaT",
      "2023-08-12",
      "32/01/2023",
      "29/02/2023",
      "12/13/2023",
      "12/08/023",
      "12/08",
      "12/08/2023/1",
      "+1/08/2023",
      "aa/bb/cccc",
    ] {
      assert_eq!(normalize_date(raw, DateFormat::DayFirst), MatchDate::Invalid, "{raw:?}");
    }
  }

  #[test]
  fn leap_day_is_accepted() {
    assert_eq!(normalize_date("29/02/2024", DateFormat::DayFirst), ymd(2024, 2, 29));
  }

  #[test]
  fn iso_with_and_without_time() {
    assert_eq!(normalize_date("2023-08-12", DateFormat::Iso), ymd(2023, 8, 12));
    assert_eq!(normalize_date("2023-08-12 19:30:00", DateFormat::Iso), ymd(2023, 8, 12));
    assert_eq!(normalize_date("2023-08-12T19:30:00", DateFormat::Iso), ymd(2023, 8, 12));
    assert_eq!(normalize_date("2023-08-12 19:30", DateFormat::Iso), ymd(2023, 8, 12));
  }

  #[test]
  fn malformed_iso_is_invalid() {
    for raw in ["", "12/08/2023", "2023-02-30", "2023-8", "yesterday"] {
      assert_eq!(normalize_date(raw, DateFormat::Iso), MatchDate::Invalid, "{raw:?}");
    }
  }
}
