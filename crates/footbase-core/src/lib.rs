//! Core types and pipeline for the footbase match store.
//!
//! Date and name normalization, the primary/secondary join, consistency
//! checks, and the `MatchStore` trait live here. This crate is free of
//! database and file-format dependencies; feed readers and storage backends
//! are separate crates that depend on it.

pub mod alias;
pub mod date;
pub mod error;
pub mod feed;
pub mod pipeline;
pub mod reconcile;
pub mod record;
pub mod report;
pub mod store;
pub mod validate;

pub use error::{Error, Result};
