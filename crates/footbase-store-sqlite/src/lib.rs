//! SQLite backend for the footbase match store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. The canonical set lives in `matches`;
//! each replace first copies it into a `matches_backup_<timestamp>` table.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
