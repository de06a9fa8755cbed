//! Layered configuration: built-in defaults, then the optional TOML file,
//! then `FOOTBASE_*` environment variables, then command-line flags.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
  /// SQLite database holding the canonical set and its snapshots.
  pub db_path:          PathBuf,
  /// Versioned TOML alias table.
  pub alias_path:       PathBuf,
  /// Alias-table source id applied to the primary feed.
  pub primary_source:   String,
  /// Alias-table source id applied to the secondary feed.
  pub secondary_source: String,
}

/// Values given on the command line; `None` leaves lower layers in place.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
  pub db_path:    Option<PathBuf>,
  pub alias_path: Option<PathBuf>,
}

impl Settings {
  pub fn load(file: &Path, overrides: &Overrides) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .set_default("db_path", "db/footbase_big5.db")?
      .set_default("alias_path", "config/aliases.toml")?
      .set_default("primary_source", "football_data")?
      .set_default("secondary_source", "understat")?
      .add_source(config::File::from(file).required(false))
      .add_source(config::Environment::with_prefix("FOOTBASE"))
      .set_override_option("db_path", path_value(&overrides.db_path))?
      .set_override_option("alias_path", path_value(&overrides.alias_path))?
      .build()
      .context("failed to read config file")?;

    let mut settings: Settings = settings
      .try_deserialize()
      .context("failed to deserialise settings")?;
    settings.db_path = expand_tilde(&settings.db_path);
    settings.alias_path = expand_tilde(&settings.alias_path);
    Ok(settings)
  }
}

fn path_value(path: &Option<PathBuf>) -> Option<String> {
  path.as_ref().map(|p| p.to_string_lossy().into_owned())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_apply_without_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let settings =
      Settings::load(&dir.path().join("absent.toml"), &Overrides::default()).unwrap();
    assert_eq!(settings.alias_path, PathBuf::from("config/aliases.toml"));
    assert_eq!(settings.primary_source, "football_data");
    assert_eq!(settings.secondary_source, "understat");
  }

  #[test]
  fn file_then_flags() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("footbase.toml");
    std::fs::write(
      &file,
      "db_path = \"from-file.db\"\nalias_path = \"from-file.toml\"\nsecondary_source = \"fbref\"\n",
    )
    .unwrap();

    let overrides = Overrides {
      db_path:    Some(PathBuf::from("from-flag.db")),
      alias_path: None,
    };
    let settings = Settings::load(&file, &overrides).unwrap();
    assert_eq!(settings.db_path, PathBuf::from("from-flag.db"));
    assert_eq!(settings.alias_path, PathBuf::from("from-file.toml"));
    assert_eq!(settings.secondary_source, "fbref");
  }
}
