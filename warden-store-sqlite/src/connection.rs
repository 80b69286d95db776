// warden-store-sqlite/src/connection.rs
// ============================================================================
// Module: Connection and Schema Management
// Description: Opens a pragma-configured connection and brings the schema to
//              the current version.
// Purpose: Every store shares one connection-opening and migration path so
//          pragmas and schema versioning cannot drift between them.
// Dependencies: rusqlite
// ============================================================================

//! ## Overview
//! `SQLite` access is serialized through a single mutex-guarded connection
//! per store file; Warden's write volume does not justify the teacher's
//! separate writer-queue runtime. `store_meta` records the schema version so
//! a future migration has something to branch on.

use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::params;

use crate::config::SqliteStoreConfig;
use crate::error::StoreError;

/// Current schema version. Bump and add a migration arm in
/// [`initialize_schema`] when the table shapes below change.
const SCHEMA_VERSION: i64 = 1;

/// Opens a pragma-configured connection and brings its schema current.
///
/// # Errors
///
/// Returns [`StoreError`] if the file cannot be opened or pragmas/schema
/// statements fail.
pub fn open(config: &SqliteStoreConfig) -> Result<Connection, StoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let mut connection = Connection::open_with_flags(&config.path, flags).map_err(|err| StoreError::Io(err.to_string()))?;
    apply_pragmas(&connection, config)?;
    initialize_schema(&mut connection)?;
    Ok(connection)
}

fn apply_pragmas(connection: &Connection, config: &SqliteStoreConfig) -> Result<(), StoreError> {
    connection.execute_batch("PRAGMA foreign_keys = ON;").map_err(|err| StoreError::Db(err.to_string()))?;
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(|err| StoreError::Db(err.to_string()))?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(|err| StoreError::Db(err.to_string()))?;
    connection.busy_timeout(std::time::Duration::from_millis(config.busy_timeout_ms)).map_err(|err| StoreError::Db(err.to_string()))?;
    Ok(())
}

fn initialize_schema(connection: &mut Connection) -> Result<(), StoreError> {
    let tx = connection.transaction().map_err(|err| StoreError::Db(err.to_string()))?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);").map_err(|err| StoreError::Db(err.to_string()))?;
    let version: Option<i64> =
        tx.query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0)).optional().map_err(|err| StoreError::Db(err.to_string()))?;
    if version.is_none() {
        tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION]).map_err(|err| StoreError::Db(err.to_string()))?;
        tx.execute_batch(
            "CREATE TABLE IF NOT EXISTS investigations (
                investigation_id TEXT NOT NULL PRIMARY KEY,
                alert_id TEXT NOT NULL,
                tenant_id TEXT NOT NULL,
                state TEXT NOT NULL,
                full_state_blob BLOB NOT NULL,
                decision_chain BLOB NOT NULL,
                state_hash TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_investigations_tenant_state
                ON investigations (tenant_id, state);
            CREATE UNIQUE INDEX IF NOT EXISTS idx_investigations_tenant_alert
                ON investigations (tenant_id, alert_id);
            CREATE TABLE IF NOT EXISTS fp_patterns (
                pattern_id TEXT NOT NULL PRIMARY KEY,
                status TEXT NOT NULL,
                pattern_blob BLOB NOT NULL,
                pattern_hash TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_fp_patterns_status ON fp_patterns (status);
            CREATE TABLE IF NOT EXISTS kill_switches (
                kill_switch_id INTEGER PRIMARY KEY AUTOINCREMENT,
                switch_blob BLOB NOT NULL,
                is_active INTEGER NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_kill_switches_active ON kill_switches (is_active);",
        )
        .map_err(|err| StoreError::Db(err.to_string()))?;
    }
    tx.commit().map_err(|err| StoreError::Db(err.to_string()))
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions are permitted."
)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn open_creates_schema_and_is_idempotent() {
        let dir = tempdir().expect("tempdir");
        let config = SqliteStoreConfig::new(dir.path().join("warden.db"));
        let connection = open(&config).expect("open once");
        drop(connection);
        let connection = open(&config).expect("open again");
        let version: i64 = connection.query_row("SELECT version FROM store_meta", params![], |row| row.get(0)).expect("version");
        assert_eq!(version, SCHEMA_VERSION);
    }
}
