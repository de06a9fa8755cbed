//! SQL schema for the footbase SQLite store.
//!
//! Executed once at connection startup. Snapshot tables are created on demand
//! with `CREATE TABLE .. AS SELECT * FROM matches` and so share its columns.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- The canonical merged set. Replaced wholesale, never upserted.
CREATE TABLE IF NOT EXISTS matches (
    row_order            INTEGER PRIMARY KEY,  -- position in the merged output
    date                 TEXT,                 -- YYYY-MM-DD; NULL when invalid
    home_team            TEXT NOT NULL,
    away_team            TEXT NOT NULL,
    home_goals           INTEGER,
    away_goals           INTEGER,
    result               TEXT,                 -- 'H' | 'D' | 'A'
    home_shots           INTEGER,
    away_shots           INTEGER,
    home_shots_on_target INTEGER,
    away_shots_on_target INTEGER,
    odds_home            REAL,
    odds_draw            REAL,
    odds_away            REAL,
    competition          TEXT NOT NULL,
    season               TEXT NOT NULL,
    home_xg              REAL,
    away_xg              REAL,
    source_home_goals    INTEGER,              -- goals as the secondary feed saw them
    source_away_goals    INTEGER,
    has_advanced_stats   INTEGER NOT NULL DEFAULT 0
);

-- One row per snapshot table ever taken.
CREATE TABLE IF NOT EXISTS snapshots (
    name      TEXT PRIMARY KEY,
    run_id    TEXT NOT NULL,
    taken_at  TEXT NOT NULL,   -- RFC 3339 UTC
    row_count INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS matches_competition_idx ON matches(competition);
CREATE INDEX IF NOT EXISTS matches_season_idx      ON matches(season);
CREATE INDEX IF NOT EXISTS matches_date_idx        ON matches(date);

PRAGMA user_version = 1;
";
