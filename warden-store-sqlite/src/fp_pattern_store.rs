// warden-store-sqlite/src/fp_pattern_store.rs
// ============================================================================
// Module: FP Pattern Store
// Description: SQLite-backed durable persistence for governed FP patterns.
// Purpose: Back the hot-cache the FP short-circuit matcher reads from with
//          a durable, queryable-by-status table.
// Dependencies: rusqlite, warden-core
// ============================================================================

use std::sync::Mutex;

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::params;
use warden_core::FpPattern;
use warden_core::FpPatternStatus;
use warden_core::PatternId;
use warden_core::Timestamp;

use crate::config::SqliteStoreConfig;
use crate::connection;
use crate::error::StoreError;
use crate::hashing::hex_digest;

/// SQLite-backed store for governed FP patterns, keyed by pattern id.
pub struct FpPatternStore {
    connection: Mutex<Connection>,
}

impl FpPatternStore {
    /// Opens (or creates) the FP pattern store at `config.path`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the database cannot be opened or migrated.
    pub fn open(config: &SqliteStoreConfig) -> Result<Self, StoreError> {
        Ok(Self { connection: Mutex::new(connection::open(config)?) })
    }

    /// Persists `pattern`, upserting on its `pattern_id`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Invalid`] if `pattern` cannot be serialized, or
    /// [`StoreError::Db`] on a `SQLite` failure.
    pub fn save(&self, pattern: &FpPattern, now: Timestamp) -> Result<(), StoreError> {
        let blob = serde_json::to_vec(pattern).map_err(|err| StoreError::Invalid(err.to_string()))?;
        let hash = hex_digest(&blob);
        let guard = self.connection.lock().map_err(|_| StoreError::Db("fp pattern store mutex poisoned".to_string()))?;
        guard
            .execute(
                "INSERT INTO fp_patterns (pattern_id, status, pattern_blob, pattern_hash, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(pattern_id) DO UPDATE SET
                    status = excluded.status,
                    pattern_blob = excluded.pattern_blob,
                    pattern_hash = excluded.pattern_hash,
                    updated_at = excluded.updated_at",
                params![pattern.pattern_id.as_str(), status_label(pattern.status), blob, hash, now.to_rfc3339_millis()],
            )
            .map_err(|err| StoreError::Db(err.to_string()))?;
        Ok(())
    }

    /// Loads the pattern stored under `pattern_id`, verifying its content hash.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Corrupt`] on a hash mismatch, or
    /// [`StoreError::Invalid`] if the stored blob cannot be deserialized.
    pub fn load(&self, pattern_id: &PatternId) -> Result<Option<FpPattern>, StoreError> {
        let guard = self.connection.lock().map_err(|_| StoreError::Db("fp pattern store mutex poisoned".to_string()))?;
        let row: Option<(Vec<u8>, String)> = guard
            .query_row("SELECT pattern_blob, pattern_hash FROM fp_patterns WHERE pattern_id = ?1", params![pattern_id.as_str()], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .optional()
            .map_err(|err| StoreError::Db(err.to_string()))?;
        let Some((blob, expected_hash)) = row else {
            return Ok(None);
        };
        if hex_digest(&blob) != expected_hash {
            return Err(StoreError::Corrupt(format!("hash mismatch for fp pattern {}", pattern_id.as_str())));
        }
        serde_json::from_slice(&blob).map(Some).map_err(|err| StoreError::Invalid(err.to_string()))
    }

    /// Loads every pattern currently `Approved`, the set the FP short-circuit
    /// matcher's hot cache is refreshed from.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on a `SQLite` failure or a corrupt row.
    pub fn load_approved(&self) -> Result<Vec<FpPattern>, StoreError> {
        let blobs: Vec<(Vec<u8>, String)> = {
            let guard = self.connection.lock().map_err(|_| StoreError::Db("fp pattern store mutex poisoned".to_string()))?;
            let mut stmt = guard
                .prepare("SELECT pattern_blob, pattern_hash FROM fp_patterns WHERE status = 'approved'")
                .map_err(|err| StoreError::Db(err.to_string()))?;
            let rows = stmt.query_map(params![], |row| Ok((row.get(0)?, row.get(1)?))).map_err(|err| StoreError::Db(err.to_string()))?;
            let mut out = Vec::new();
            for row in rows {
                out.push(row.map_err(|err| StoreError::Db(err.to_string()))?);
            }
            out
        };
        let mut patterns = Vec::with_capacity(blobs.len());
        for (blob, expected_hash) in blobs {
            if hex_digest(&blob) != expected_hash {
                return Err(StoreError::Corrupt("hash mismatch while loading approved fp patterns".to_string()));
            }
            patterns.push(serde_json::from_slice(&blob).map_err(|err| StoreError::Invalid(err.to_string()))?);
        }
        Ok(patterns)
    }
}

fn status_label(status: FpPatternStatus) -> &'static str {
    match status {
        FpPatternStatus::Draft => "draft",
        FpPatternStatus::PendingReview => "pending_review",
        FpPatternStatus::Approved => "approved",
        FpPatternStatus::Expired => "expired",
        FpPatternStatus::Revoked => "revoked",
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions are permitted."
)]
mod tests {
    use tempfile::tempdir;
    use warden_core::Scope;

    use super::*;

    fn ts(s: &str) -> Timestamp {
        Timestamp::parse(s).expect("parse")
    }

    fn store() -> (tempfile::TempDir, FpPatternStore) {
        let dir = tempdir().expect("tempdir");
        let config = SqliteStoreConfig::new(dir.path().join("patterns.db"));
        let store = FpPatternStore::open(&config).expect("open");
        (dir, store)
    }

    fn pattern(id: &str, status: FpPatternStatus) -> FpPattern {
        FpPattern {
            pattern_id: PatternId::new(id),
            name: "scanner".to_string(),
            scope: Scope::default(),
            requirements: vec![],
            status,
            approver_1: None,
            approver_2: None,
            approval_date: None,
            expiry_date: None,
            reaffirmed_date: None,
            reaffirmed_by: None,
        }
    }

    #[test]
    fn save_then_load_round_trips() {
        let (_dir, store) = store();
        let pattern = pattern("p1", FpPatternStatus::Draft);
        store.save(&pattern, ts("2026-01-01T00:00:00Z")).expect("save");
        let loaded = store.load(&PatternId::new("p1")).expect("load").expect("present");
        assert_eq!(loaded, pattern);
    }

    #[test]
    fn load_approved_filters_by_status() {
        let (_dir, store) = store();
        store.save(&pattern("p1", FpPatternStatus::Approved), ts("2026-01-01T00:00:00Z")).expect("save");
        store.save(&pattern("p2", FpPatternStatus::Draft), ts("2026-01-01T00:00:00Z")).expect("save");
        let approved = store.load_approved().expect("load approved");
        assert_eq!(approved.len(), 1);
        assert_eq!(approved[0].pattern_id, PatternId::new("p1"));
    }
}
