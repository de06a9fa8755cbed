//! CSV readers for the two match feeds.
//!
//! Readers produce the raw, unparsed rows defined in `footbase-core`; all
//! date, number and name handling happens there. Column headers are matched
//! case-insensitively against a short list of accepted spellings, so both
//! renamed exports and the raw football-data.co.uk files load unchanged.

mod header;
mod pydict;

pub mod error;
pub mod primary;
pub mod secondary;

pub use error::{Error, Result};
pub use primary::{FeedFile, PrimaryLoad, discover_primary, load_primary_dir, read_primary};
pub use secondary::{load_secondary_file, read_secondary};
