// warden-store-sqlite/src/investigation_store.rs
// ============================================================================
// Module: Investigation Store
// Description: SQLite-backed durable persistence for investigation snapshots.
// Purpose: One atomic upsert per state transition, keyed by investigation
//          id, so a crash never leaves a non-terminal investigation
//          unresumable.
// Dependencies: rusqlite, warden-core
// ============================================================================

//! ## Overview
//! Every call to [`InvestigationStore::save`] persists the full investigation
//! snapshot (`full_state_blob`), a denormalised copy of its decision chain
//! for inspection without deserializing the whole blob, and a content hash
//! checked on every [`InvestigationStore::load`]. `(tenant_id, alert_id)` is
//! uniquely indexed so re-running `Run` for an alert already seen resolves
//! to the same row instead of creating a duplicate investigation.

use std::sync::Mutex;

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::params;
use warden_core::AlertId;
use warden_core::Investigation;
use warden_core::InvestigationId;
use warden_core::InvestigationState;
use warden_core::TenantId;
use warden_core::Timestamp;

use crate::config::SqliteStoreConfig;
use crate::connection;
use crate::error::StoreError;
use crate::hashing::hex_digest;

/// SQLite-backed store for durable investigation snapshots.
pub struct InvestigationStore {
    connection: Mutex<Connection>,
}

impl InvestigationStore {
    /// Opens (or creates) the investigation store at `config.path`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the database cannot be opened or migrated.
    pub fn open(config: &SqliteStoreConfig) -> Result<Self, StoreError> {
        Ok(Self { connection: Mutex::new(connection::open(config)?) })
    }

    /// Persists `investigation` as of `now`, creating the row on first save
    /// and updating it (state, blob, decision chain, hash, `updated_at`) on
    /// every subsequent call. `created_at` is stamped only on insert.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Invalid`] if `investigation` cannot be
    /// serialized, or [`StoreError::Db`] on a `SQLite` failure.
    pub fn save(&self, investigation: &Investigation, now: Timestamp) -> Result<(), StoreError> {
        let full_state_blob = serde_json::to_vec(investigation).map_err(|err| StoreError::Invalid(err.to_string()))?;
        let decision_chain = serde_json::to_vec(&investigation.decision_chain).map_err(|err| StoreError::Invalid(err.to_string()))?;
        let state_hash = hex_digest(&full_state_blob);
        let now_str = now.to_rfc3339_millis();

        let guard = self.connection.lock().map_err(|_| StoreError::Db("investigation store mutex poisoned".to_string()))?;
        guard
            .execute(
                "INSERT INTO investigations
                    (investigation_id, alert_id, tenant_id, state, full_state_blob, decision_chain, state_hash, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
                 ON CONFLICT(investigation_id) DO UPDATE SET
                    state = excluded.state,
                    full_state_blob = excluded.full_state_blob,
                    decision_chain = excluded.decision_chain,
                    state_hash = excluded.state_hash,
                    updated_at = excluded.updated_at",
                params![
                    investigation.investigation_id.as_str(),
                    investigation.alert_id.as_str(),
                    investigation.tenant_id.as_str(),
                    state_label(investigation.state),
                    full_state_blob,
                    decision_chain,
                    state_hash,
                    now_str,
                ],
            )
            .map_err(|err| StoreError::Db(err.to_string()))?;
        Ok(())
    }

    /// Loads the investigation stored under `investigation_id`, verifying its
    /// content hash first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Corrupt`] on a hash mismatch, or
    /// [`StoreError::Invalid`] if the stored blob cannot be deserialized.
    pub fn load(&self, investigation_id: &InvestigationId) -> Result<Option<Investigation>, StoreError> {
        let guard = self.connection.lock().map_err(|_| StoreError::Db("investigation store mutex poisoned".to_string()))?;
        let row: Option<(Vec<u8>, String)> = guard
            .query_row(
                "SELECT full_state_blob, state_hash FROM investigations WHERE investigation_id = ?1",
                params![investigation_id.as_str()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(|err| StoreError::Db(err.to_string()))?;
        let Some((blob, expected_hash)) = row else {
            return Ok(None);
        };
        if hex_digest(&blob) != expected_hash {
            return Err(StoreError::Corrupt(format!("hash mismatch for investigation {}", investigation_id.as_str())));
        }
        let investigation = serde_json::from_slice(&blob).map_err(|err| StoreError::Invalid(err.to_string()))?;
        Ok(Some(investigation))
    }

    /// Looks up the investigation already opened for `(tenant_id, alert_id)`,
    /// the idempotency key `Run` is keyed on.
    ///
    /// # Errors
    ///
    /// Propagates the same errors as [`Self::load`].
    pub fn find_by_alert(&self, tenant_id: &TenantId, alert_id: &AlertId) -> Result<Option<Investigation>, StoreError> {
        let investigation_id = {
            let guard = self.connection.lock().map_err(|_| StoreError::Db("investigation store mutex poisoned".to_string()))?;
            guard
                .query_row(
                    "SELECT investigation_id FROM investigations WHERE tenant_id = ?1 AND alert_id = ?2",
                    params![tenant_id.as_str(), alert_id.as_str()],
                    |row| row.get::<_, String>(0),
                )
                .optional()
                .map_err(|err| StoreError::Db(err.to_string()))?
        };
        match investigation_id {
            Some(id) => self.load(&InvestigationId::new(id)),
            None => Ok(None),
        }
    }

    /// Lists the ids of every investigation not yet in a terminal state,
    /// the candidate set a crash-recovery sweep resumes.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Db`] on a `SQLite` failure.
    pub fn list_resumable(&self) -> Result<Vec<InvestigationId>, StoreError> {
        let guard = self.connection.lock().map_err(|_| StoreError::Db("investigation store mutex poisoned".to_string()))?;
        let mut stmt = guard
            .prepare("SELECT investigation_id FROM investigations WHERE state NOT IN ('closed', 'failed')")
            .map_err(|err| StoreError::Db(err.to_string()))?;
        let rows = stmt
            .query_map(params![], |row| row.get::<_, String>(0))
            .map_err(|err| StoreError::Db(err.to_string()))?;
        let mut ids = Vec::new();
        for row in rows {
            ids.push(InvestigationId::new(row.map_err(|err| StoreError::Db(err.to_string()))?));
        }
        Ok(ids)
    }
}

fn state_label(state: InvestigationState) -> &'static str {
    match state {
        InvestigationState::Received => "received",
        InvestigationState::Parsing => "parsing",
        InvestigationState::Enriching => "enriching",
        InvestigationState::Reasoning => "reasoning",
        InvestigationState::AwaitingHuman => "awaiting_human",
        InvestigationState::Responding => "responding",
        InvestigationState::Closed => "closed",
        InvestigationState::Failed => "failed",
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
    use warden_core::EntityBundle;

    use super::*;

    fn ts(s: &str) -> Timestamp {
        Timestamp::parse(s).expect("parse")
    }

    fn store() -> (tempfile::TempDir, InvestigationStore) {
        let dir = tempdir().expect("tempdir");
        let config = SqliteStoreConfig::new(dir.path().join("investigations.db"));
        let store = InvestigationStore::open(&config).expect("open");
        (dir, store)
    }

    #[test]
    fn save_then_load_round_trips() {
        let (_dir, store) = store();
        let investigation = Investigation::new(InvestigationId::new("inv-1"), AlertId::new("a1"), TenantId::new("t1"), EntityBundle::default());
        store.save(&investigation, ts("2026-01-01T00:00:00Z")).expect("save");
        let loaded = store.load(&InvestigationId::new("inv-1")).expect("load").expect("present");
        assert_eq!(loaded, investigation);
    }

    #[test]
    fn save_upserts_on_repeated_investigation_id() {
        let (_dir, store) = store();
        let mut investigation = Investigation::new(InvestigationId::new("inv-1"), AlertId::new("a1"), TenantId::new("t1"), EntityBundle::default());
        store.save(&investigation, ts("2026-01-01T00:00:00Z")).expect("save");
        investigation.state = InvestigationState::Closed;
        store.save(&investigation, ts("2026-01-02T00:00:00Z")).expect("save again");
        let loaded = store.load(&InvestigationId::new("inv-1")).expect("load").expect("present");
        assert_eq!(loaded.state, InvestigationState::Closed);
    }

    #[test]
    fn find_by_alert_resolves_the_idempotency_key() {
        let (_dir, store) = store();
        let investigation = Investigation::new(InvestigationId::new("inv-1"), AlertId::new("a1"), TenantId::new("t1"), EntityBundle::default());
        store.save(&investigation, ts("2026-01-01T00:00:00Z")).expect("save");
        let found = store.find_by_alert(&TenantId::new("t1"), &AlertId::new("a1")).expect("find").expect("present");
        assert_eq!(found.investigation_id, investigation.investigation_id);
        assert!(store.find_by_alert(&TenantId::new("t1"), &AlertId::new("missing")).expect("find").is_none());
    }

    #[test]
    fn list_resumable_excludes_terminal_states() {
        let (_dir, store) = store();
        let mut closed = Investigation::new(InvestigationId::new("inv-closed"), AlertId::new("a1"), TenantId::new("t1"), EntityBundle::default());
        closed.state = InvestigationState::Closed;
        store.save(&closed, ts("2026-01-01T00:00:00Z")).expect("save");
        let open = Investigation::new(InvestigationId::new("inv-open"), AlertId::new("a2"), TenantId::new("t1"), EntityBundle::default());
        store.save(&open, ts("2026-01-01T00:00:00Z")).expect("save");
        let resumable = store.list_resumable().expect("list");
        assert_eq!(resumable, vec![InvestigationId::new("inv-open")]);
    }
}
