// warden-store-sqlite/src/kill_switch_store.rs
// ============================================================================
// Module: Kill Switch Store
// Description: SQLite-backed durable persistence for kill switches.
// Purpose: Back `is_killed` checks with a durable record of every kill
//          switch ever pulled, active or not.
// Dependencies: rusqlite, warden-core
// ============================================================================

//! ## Overview
//! Kill switches are append-mostly: activating one inserts a new row,
//! deactivating updates `is_active` on the existing row rather than
//! deleting it, so the history of what was ever killed (and by whom)
//! survives. [`is_killed`](warden_core::is_killed) only needs the active
//! set, which [`KillSwitchStore::load_active`] returns.

use std::sync::Mutex;

use rusqlite::Connection;
use rusqlite::params;
use warden_core::KillSwitch;

use crate::config::SqliteStoreConfig;
use crate::connection;
use crate::error::StoreError;

/// SQLite-backed store for kill switches.
pub struct KillSwitchStore {
    connection: Mutex<Connection>,
}

impl KillSwitchStore {
    /// Opens (or creates) the kill switch store at `config.path`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the database cannot be opened or migrated.
    pub fn open(config: &SqliteStoreConfig) -> Result<Self, StoreError> {
        Ok(Self { connection: Mutex::new(connection::open(config)?) })
    }

    /// Inserts a new row for `switch`. Kill switches are never updated by
    /// identity (there is no natural key besides the row itself); pulling
    /// the same dimension twice simply records two activations.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if `switch` cannot be serialized or the
    /// insert fails.
    pub fn insert(&self, switch: &KillSwitch) -> Result<(), StoreError> {
        let blob = serde_json::to_vec(switch).map_err(|err| StoreError::Invalid(err.to_string()))?;
        let guard = self.connection.lock().map_err(|_| StoreError::Db("kill switch store mutex poisoned".to_string()))?;
        guard
            .execute(
                "INSERT INTO kill_switches (switch_blob, is_active, updated_at) VALUES (?1, ?2, ?3)",
                params![blob, i64::from(switch.is_active()), switch.activated_at.to_rfc3339_millis()],
            )
            .map_err(|err| StoreError::Db(err.to_string()))?;
        Ok(())
    }

    /// Updates the stored row matching `switch`'s `activated_at`/`activated_by`
    /// to reflect its current (now presumably deactivated) state.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if `switch` cannot be serialized or no
    /// matching row is found.
    pub fn update(&self, switch: &KillSwitch) -> Result<(), StoreError> {
        let blob = serde_json::to_vec(switch).map_err(|err| StoreError::Invalid(err.to_string()))?;
        let guard = self.connection.lock().map_err(|_| StoreError::Db("kill switch store mutex poisoned".to_string()))?;
        let updated = guard
            .execute(
                "UPDATE kill_switches SET switch_blob = ?1, is_active = ?2, updated_at = ?3
                 WHERE json_extract(switch_blob, '$.activated_at') = ?4
                   AND json_extract(switch_blob, '$.activated_by') = ?5",
                params![
                    blob,
                    i64::from(switch.is_active()),
                    switch.activated_at.to_rfc3339_millis(),
                    switch.activated_at.to_rfc3339_millis(),
                    switch.activated_by,
                ],
            )
            .map_err(|err| StoreError::Db(err.to_string()))?;
        if updated == 0 {
            return Err(StoreError::Invalid("no kill switch row matched for update".to_string()));
        }
        Ok(())
    }

    /// Loads every kill switch currently marked active, the set
    /// [`warden_core::is_killed`] is evaluated against.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on a `SQLite` failure or a corrupt row.
    pub fn load_active(&self) -> Result<Vec<KillSwitch>, StoreError> {
        let guard = self.connection.lock().map_err(|_| StoreError::Db("kill switch store mutex poisoned".to_string()))?;
        let mut stmt = guard.prepare("SELECT switch_blob FROM kill_switches WHERE is_active = 1").map_err(|err| StoreError::Db(err.to_string()))?;
        let rows = stmt.query_map(params![], |row| row.get::<_, Vec<u8>>(0)).map_err(|err| StoreError::Db(err.to_string()))?;
        let mut switches = Vec::new();
        for row in rows {
            let blob = row.map_err(|err| StoreError::Db(err.to_string()))?;
            switches.push(serde_json::from_slice(&blob).map_err(|err| StoreError::Invalid(err.to_string()))?);
        }
        Ok(switches)
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
    use warden_core::KillSwitchDimension;
    use warden_core::Timestamp;

    use super::*;

    fn ts(s: &str) -> Timestamp {
        Timestamp::parse(s).expect("parse")
    }

    fn store() -> (tempfile::TempDir, KillSwitchStore) {
        let dir = tempdir().expect("tempdir");
        let config = SqliteStoreConfig::new(dir.path().join("kill_switches.db"));
        let store = KillSwitchStore::open(&config).expect("open");
        (dir, store)
    }

    #[test]
    fn insert_then_load_active_round_trips() {
        let (_dir, store) = store();
        let switch = KillSwitch {
            dimension: KillSwitchDimension::default(),
            activated_by: "oncall".to_string(),
            reason: "bad pattern".to_string(),
            activated_at: ts("2026-01-01T00:00:00Z"),
            deactivated_at: None,
        };
        store.insert(&switch).expect("insert");
        let active = store.load_active().expect("load active");
        assert_eq!(active, vec![switch]);
    }

    #[test]
    fn update_after_deactivation_removes_it_from_active_set() {
        let (_dir, store) = store();
        let mut switch = KillSwitch {
            dimension: KillSwitchDimension::default(),
            activated_by: "oncall".to_string(),
            reason: "bad pattern".to_string(),
            activated_at: ts("2026-01-01T00:00:00Z"),
            deactivated_at: None,
        };
        store.insert(&switch).expect("insert");
        switch.deactivate(ts("2026-01-02T00:00:00Z"));
        store.update(&switch).expect("update");
        assert!(store.load_active().expect("load active").is_empty());
    }
}
