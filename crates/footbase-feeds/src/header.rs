//! Header resolution shared by both feed readers.

use std::{borrow::Cow, collections::HashMap};

use crate::{Error, Result};

/// Position of each header cell, keyed by its trimmed, lowercased text.
/// The first occurrence of a repeated header wins.
pub(crate) struct Columns {
  index: HashMap<String, usize>,
}

impl Columns {
  pub fn new(headers: &csv::ByteRecord) -> Self {
    let mut index = HashMap::new();
    for (i, cell) in headers.iter().enumerate() {
      let name = decode(cell)
        .trim_start_matches('\u{feff}')
        .trim()
        .to_lowercase();
      index.entry(name).or_insert(i);
    }
    Self { index }
  }

  /// First of `names` present in the header.
  pub fn find(&self, names: &[&str]) -> Option<usize> {
    names.iter().find_map(|name| self.index.get(*name).copied())
  }

  pub fn require(
    &self,
    feed: &'static str,
    names: &'static [&'static str],
  ) -> Result<usize> {
    self
      .find(names)
      .ok_or(Error::MissingColumn { feed, column: names[0] })
  }
}

/// Text of cell `i`, or empty when the column is absent or the row is short.
pub(crate) fn cell(record: &csv::ByteRecord, i: Option<usize>) -> String {
  i.and_then(|i| record.get(i))
    .map(|bytes| decode(bytes).trim().to_owned())
    .unwrap_or_default()
}

/// UTF-8 when the bytes are valid UTF-8, otherwise Latin-1, which older
/// football-data files use. Every byte maps to a distinct `char`, so two
/// different names never decode to the same text.
fn decode(bytes: &[u8]) -> Cow<'_, str> {
  match std::str::from_utf8(bytes) {
    Ok(text) => Cow::Borrowed(text),
    Err(_) => Cow::Owned(bytes.iter().map(|&b| char::from(b)).collect()),
  }
}

/// Trailing `,,,,` lines are common in football-data exports.
pub(crate) fn is_blank(record: &csv::ByteRecord) -> bool {
  record.iter().all(|c| c.iter().all(u8::is_ascii_whitespace))
}

pub(crate) fn reader<R: std::io::Read>(input: R) -> csv::Reader<R> {
  csv::ReaderBuilder::new()
    .has_headers(true)
    .flexible(true)
    .from_reader(input)
}
