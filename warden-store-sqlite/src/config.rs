// warden-store-sqlite/src/config.rs
// ============================================================================
// Module: Store Configuration
// Description: Tunables for one SQLite store instance.
// Purpose: Keep journal mode, sync mode, and busy timeout in one place.
// Dependencies: std::path
// ============================================================================

use std::path::PathBuf;

/// Default busy timeout applied to every connection.
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// `SQLite` journal mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SqliteJournalMode {
    /// WAL journal mode (recommended for concurrent readers).
    #[default]
    Wal,
    /// Delete journal mode (legacy, single-writer).
    Delete,
}

impl SqliteJournalMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` synchronous mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest, slowest).
    #[default]
    Full,
    /// Normal synchronous mode, safe under WAL.
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for one `SQLite`-backed store file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    pub busy_timeout_ms: u64,
    /// Journal mode.
    pub journal_mode: SqliteJournalMode,
    /// Synchronous mode.
    pub sync_mode: SqliteSyncMode,
}

impl SqliteStoreConfig {
    /// Builds a config for `path` with Warden's default pragmas (WAL, full sync).
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS, journal_mode: SqliteJournalMode::Wal, sync_mode: SqliteSyncMode::Full }
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions are permitted."
)]
mod tests {
    use super::*;

    #[test]
    fn new_defaults_to_wal_and_full_sync() {
        let config = SqliteStoreConfig::new("/tmp/warden.db");
        assert_eq!(config.journal_mode, SqliteJournalMode::Wal);
        assert_eq!(config.sync_mode, SqliteSyncMode::Full);
        assert_eq!(config.busy_timeout_ms, DEFAULT_BUSY_TIMEOUT_MS);
    }
}
