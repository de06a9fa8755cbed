//! Error type for `footbase-feeds`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("csv error in {path}: {source}")]
  Csv { path: String, source: csv::Error },

  #[error("i/o error on {path}: {source}")]
  Io { path: PathBuf, source: std::io::Error },

  /// A column every row of the feed needs is absent from the header.
  #[error("{feed} feed has no {column} column")]
  MissingColumn { feed: &'static str, column: &'static str },

  #[error("no feed files found under {0}")]
  NoFeedFiles(PathBuf),

  #[error("none of the feed files under {root} could be read ({skipped} skipped)")]
  NoReadableFiles { root: PathBuf, skipped: usize },
}

impl Error {
  pub(crate) fn csv(path: &str, source: csv::Error) -> Self {
    Self::Csv { path: path.to_owned(), source }
  }

  pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
    Self::Io { path: path.into(), source }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
