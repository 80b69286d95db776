// warden-store-sqlite/src/lib.rs
// ============================================================================
// Module: Warden SQLite Store Library
// Description: Public API surface for durable SQLite-backed persistence.
// Purpose: The orchestrator's only path to durable investigation, FP
//          pattern, and kill switch state; everything else in this
//          workspace treats these stores as the source of truth across a
//          restart.
// Dependencies: crate::{config, connection, error, hashing,
//               investigation_store, fp_pattern_store, kill_switch_store}
// ============================================================================

//! ## Overview
//! Three stores, one schema, one connection-opening path. Each store owns a
//! single table and a private [`std::sync::Mutex`]-guarded connection;
//! [`connection::open`] applies the shared pragmas and brings the schema to
//! [`SqliteStoreConfig`]'s configured file current before any store is
//! usable.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod connection;
pub mod error;
pub mod fp_pattern_store;
pub mod hashing;
pub mod investigation_store;
pub mod kill_switch_store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::SqliteJournalMode;
pub use config::SqliteStoreConfig;
pub use config::SqliteSyncMode;
pub use error::StoreError;
pub use fp_pattern_store::FpPatternStore;
pub use hashing::hex_digest;
pub use investigation_store::InvestigationStore;
pub use kill_switch_store::KillSwitchStore;
