//! Team-name standardization.
//!
//! Each feed spells teams its own way ("Man City" vs "Manchester City").
//! Join keys only line up if both sides use one spelling, so every
//! source-specific spelling is mapped through a fixed, externally edited
//! alias table before the join. There is no fuzzy matching: a name the table
//! misses is assumed canonical, and adding an alias is the only fix.

use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;

use crate::{Error, Result};

/// Alias-table document versions this build understands.
pub const SUPPORTED_VERSION: u32 = 1;

// ─── Document ────────────────────────────────────────────────────────────────

/// On-disk shape of the alias table.
///
/// ```toml
/// version = 1
///
/// [sources.football_data]
/// "Man City" = "Manchester City"
/// ```
#[derive(Debug, Deserialize)]
struct AliasDocument {
  version: u32,
  #[serde(default)]
  sources: BTreeMap<String, BTreeMap<String, String>>,
}

// ─── Table ───────────────────────────────────────────────────────────────────

/// Validated alias mappings for every configured source.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
  version: u32,
  sources: HashMap<String, HashMap<String, String>>,
}

impl AliasTable {
  /// Parse and validate a TOML alias document.
  pub fn from_toml(input: &str) -> Result<Self> {
    let doc: AliasDocument =
      toml::from_str(input).map_err(|e| Error::AliasParse(e.to_string()))?;

    if doc.version != SUPPORTED_VERSION {
      return Err(Error::AliasVersion(doc.version));
    }

    let mut sources = HashMap::with_capacity(doc.sources.len());
    for (source, entries) in doc.sources {
      validate_source(&source, &entries)?;
      let entries = entries
        .into_iter()
        .map(|(k, v)| (k.trim().to_owned(), v.trim().to_owned()))
        .collect();
      sources.insert(source, entries);
    }

    Ok(Self { version: doc.version, sources })
  }

  pub fn version(&self) -> u32 { self.version }

  /// Number of aliases configured for `source`.
  pub fn len(&self, source: &str) -> usize {
    self.sources.get(source).map_or(0, HashMap::len)
  }

  pub fn is_empty(&self) -> bool { self.sources.values().all(HashMap::is_empty) }

  /// Borrow the standardizer for one source. Sources without a table get an
  /// identity standardizer.
  pub fn standardizer(&self, source: &str) -> NameStandardizer<'_> {
    NameStandardizer { aliases: self.sources.get(source) }
  }
}

/// Reject empty names and alias chains. A chain (`a → b`, `b → c`) would make
/// standardization depend on how many times it is applied, and a cycle would
/// make it undefined.
fn validate_source(
  source: &str,
  entries: &BTreeMap<String, String>,
) -> Result<()> {
  let trimmed: BTreeMap<&str, &str> = entries
    .iter()
    .map(|(k, v)| (k.trim(), v.trim()))
    .collect();

  for (alias, canonical) in &trimmed {
    if alias.is_empty() || canonical.is_empty() {
      return Err(Error::AliasInvalid {
        source_id: source.to_owned(),
        reason: format!("empty name in {alias:?} = {canonical:?}"),
      });
    }
    if let Some(next) = trimmed.get(canonical)
      && next != canonical
    {
      return Err(Error::AliasInvalid {
        source_id: source.to_owned(),
        reason: format!(
          "{alias:?} maps to {canonical:?}, which is itself an alias of {next:?}"
        ),
      });
    }
  }
  Ok(())
}

// ─── Standardizer ────────────────────────────────────────────────────────────

/// Maps one source's spellings onto canonical names.
#[derive(Debug, Clone, Copy)]
pub struct NameStandardizer<'a> {
  aliases: Option<&'a HashMap<String, String>>,
}

impl<'a> NameStandardizer<'a> {
  /// A standardizer that returns every name unchanged.
  pub fn identity() -> Self { Self { aliases: None } }

  /// Canonical name for `raw`, or `raw` (trimmed) when no alias exists.
  pub fn standardize(&self, raw: &str) -> String {
    let name = raw.trim();
    self
      .aliases
      .and_then(|m| m.get(name))
      .map_or_else(|| name.to_owned(), Clone::clone)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const TABLE: &str = r#"
version = 1

[sources.football_data]
"Man City"  = "Manchester City"
"Newcastle" = "Newcastle United"
"Wolves"    = "Wolverhampton Wanderers"

[sources.understat]
"Parma Calcio 1913" = "Parma Calcio 1913"
"#;

  #[test]
  fn maps_known_aliases() {
    let table = AliasTable::from_toml(TABLE).unwrap();
    let fd = table.standardizer("football_data");
    assert_eq!(fd.standardize("Man City"), "Manchester City");
    assert_eq!(fd.standardize("Newcastle"), "Newcastle United");
    assert_eq!(table.len("football_data"), 3);
    assert_eq!(table.len("unknown"), 0);
    assert!(!table.is_empty());
  }

  #[test]
  fn table_without_entries_is_empty() {
    let table = AliasTable::from_toml("version = 1\n[sources.understat]\n").unwrap();
    assert!(table.is_empty());
  }

  #[test]
  fn unmapped_names_pass_through_trimmed() {
    let table = AliasTable::from_toml(TABLE).unwrap();
    let fd = table.standardizer("football_data");
    assert_eq!(fd.standardize("Arsenal"), "Arsenal");
    assert_eq!(fd.standardize("  Man City "), "Manchester City");
  }

  #[test]
  fn canonical_names_are_fixed_points() {
    let table = AliasTable::from_toml(TABLE).unwrap();
    for source in ["football_data", "understat", "unknown"] {
      let s = table.standardizer(source);
      for name in ["Manchester City", "Newcastle United", "Arsenal", "Man City"] {
        let once = s.standardize(name);
        assert_eq!(s.standardize(&once), once, "{source}: {name}");
      }
    }
  }

  #[test]
  fn unknown_source_is_identity() {
    let table = AliasTable::from_toml(TABLE).unwrap();
    assert_eq!(table.standardizer("fbref").standardize("Man City"), "Man City");
    assert_eq!(NameStandardizer::identity().standardize("Wolves"), "Wolves");
  }

  #[test]
  fn rejects_alias_chains() {
    let input = r#"
version = 1
[sources.football_data]
"Man City"        = "Manchester City"
"Manchester City" = "Man. City"
"#;
    let err = AliasTable::from_toml(input).unwrap_err();
    assert!(matches!(err, Error::AliasInvalid { .. }), "{err}");
  }

  #[test]
  fn rejects_cycles() {
    let input = r#"
version = 1
[sources.s]
"A" = "B"
"B" = "A"
"#;
    assert!(AliasTable::from_toml(input).is_err());
  }

  #[test]
  fn rejects_empty_names() {
    let input = r#"
version = 1
[sources.s]
"A" = "  "
"#;
    assert!(AliasTable::from_toml(input).is_err());
  }

  #[test]
  fn rejects_unsupported_version() {
    let err = AliasTable::from_toml("version = 2").unwrap_err();
    assert!(matches!(err, Error::AliasVersion(2)));
  }

  #[test]
  fn rejects_malformed_toml() {
    let err = AliasTable::from_toml("version = ").unwrap_err();
    assert!(matches!(err, Error::AliasParse(_)));
  }

  #[test]
  fn shipped_table_is_valid() {
    let shipped = include_str!("../../../config/aliases.toml");
    let table = AliasTable::from_toml(shipped).unwrap();
    let fd = table.standardizer("football_data");
    assert_eq!(fd.standardize("Man City"), "Manchester City");
    assert_eq!(fd.standardize("Nott'm Forest"), "Nottingham Forest");
    assert_eq!(fd.standardize("Paris SG"), "Paris Saint Germain");
  }
}
