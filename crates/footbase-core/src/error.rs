//! Error types for `footbase-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("alias table parse error: {0}")]
  AliasParse(String),

  #[error("unsupported alias table version {0}")]
  AliasVersion(u32),

  #[error("invalid alias table for source {source_id:?}: {reason}")]
  AliasInvalid { source_id: String, reason: String },

  /// The store failed; canonical storage is unchanged.
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
