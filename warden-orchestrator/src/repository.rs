// warden-orchestrator/src/repository.rs
// ============================================================================
// Module: Orchestrator Collaborator Traits
// Description: The durable-storage and governance-cache seams the
//              orchestrator is constructed over.
// Purpose: Keep persistence and the FP/kill-switch hot cache as explicit
//          constructor collaborators rather than ambient global state.
// Dependencies: warden-core
// ============================================================================

//! ## Overview
//! The orchestrator never owns a `SQLite` connection or a global pattern
//! cache directly; it is generic over these two narrow traits. Production
//! wiring supplies `warden-store-sqlite`'s stores and a governance-crate
//! cache refresher; tests supply in-memory doubles. This mirrors the
//! source's global spend counter and pattern cache, re-expressed as
//! explicit collaborators passed through the constructor instead of reached
//! for as ambient state.

use warden_core::AlertId;
use warden_core::FpPattern;
use warden_core::Investigation;
use warden_core::InvestigationId;
use warden_core::KillSwitch;
use warden_core::TenantId;
use warden_core::Timestamp;

/// Durable investigation persistence, the seam `warden-store-sqlite`'s
/// `InvestigationStore` fills in production.
pub trait InvestigationRepository: Send + Sync {
    /// The error type this repository surfaces.
    type Error: std::fmt::Display + Send + Sync + 'static;

    /// Persists `investigation` as of `now`, upserting by investigation id.
    ///
    /// # Errors
    ///
    /// Returns `Self::Error` on a storage failure.
    fn save(&self, investigation: &Investigation, now: Timestamp) -> Result<(), Self::Error>;

    /// Loads the investigation stored under `investigation_id`.
    ///
    /// # Errors
    ///
    /// Returns `Self::Error` on a storage failure.
    fn load(&self, investigation_id: &InvestigationId) -> Result<Option<Investigation>, Self::Error>;

    /// Looks up the investigation already opened for `(tenant_id, alert_id)`,
    /// the idempotency key `Run` is keyed on.
    ///
    /// # Errors
    ///
    /// Returns `Self::Error` on a storage failure.
    fn find_by_alert(&self, tenant_id: &TenantId, alert_id: &AlertId) -> Result<Option<Investigation>, Self::Error>;
}

/// A read-only view over the currently-live FP patterns and kill switches,
/// the hot cache the short-circuit matcher is evaluated against.
pub trait GovernanceView: Send + Sync {
    /// Returns every currently-approved FP pattern.
    fn approved_patterns(&self) -> Vec<FpPattern>;

    /// Returns every currently-active kill switch.
    fn active_kill_switches(&self) -> Vec<KillSwitch>;
}
