//! Error type for `footbase-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored row could not be turned back into a record.
  #[error("corrupt match row: {0}")]
  Corrupt(String),

  /// A relation with the snapshot's name already exists, so no snapshot was
  /// taken and the canonical set was not replaced.
  #[error("snapshot {0} already exists")]
  SnapshotExists(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
