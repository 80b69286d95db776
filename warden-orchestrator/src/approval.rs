// warden-orchestrator/src/approval.rs
// ============================================================================
// Module: Approval Gate
// Description: The record and deadline math behind a paused investigation.
// Purpose: Give the external scheduled-sweep process (not the orchestrator
//          itself) a pure function to decide which paused investigations
//          have timed out.
// Dependencies: warden-core
// ============================================================================

//! ## Overview
//! An [`ApprovalGate`] is created the moment an investigation enters
//! `AWAITING_HUMAN`. Expiration is never a blocking wait inside the
//! orchestrator: a separate scheduled process calls [`sweep_expired`]
//! against whatever gates it has loaded and resumes each expired one
//! through `ResumeFromApproval(id, approved = false)`.

use warden_core::InvestigationId;
use warden_core::TenantConfig;
use warden_core::Timestamp;

/// A pending human-approval request for one investigation.
#[derive(Debug, Clone, PartialEq)]
pub struct ApprovalGate {
    /// The investigation awaiting approval.
    pub investigation_id: InvestigationId,
    /// When the gate was opened.
    pub requested_at: Timestamp,
    /// When the gate expires absent an explicit decision.
    pub deadline: Timestamp,
}

impl ApprovalGate {
    /// Opens a gate for `investigation_id` at `now`, with a deadline derived
    /// from `tenant_config`'s override for `tier` (or the engine default).
    #[must_use]
    pub fn open(investigation_id: InvestigationId, tenant_config: &TenantConfig, tier: u8, now: Timestamp) -> Self {
        let deadline = now.plus_hours(tenant_config.approval_timeout_hours(tier));
        Self { investigation_id, requested_at: now, deadline }
    }

    /// Returns true if this gate's deadline has passed as of `now`.
    #[must_use]
    pub fn is_expired(&self, now: &Timestamp) -> bool {
        self.deadline.is_before(now)
    }
}

/// Returns the ids of every gate in `gates` whose deadline has passed as of
/// `now`. Called by an external scheduled sweep, never by the orchestrator
/// itself on a blocking timer.
#[must_use]
pub fn sweep_expired(gates: &[ApprovalGate], now: &Timestamp) -> Vec<InvestigationId> {
    gates.iter().filter(|gate| gate.is_expired(now)).map(|gate| gate.investigation_id.clone()).collect()
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions are permitted."
)]
mod tests {
    use warden_core::TenantId;

    use super::*;

    fn ts(s: &str) -> Timestamp {
        Timestamp::parse(s).expect("parse")
    }

    #[test]
    fn gate_uses_the_tenant_override_when_present() {
        let mut config = TenantConfig::new(TenantId::new("t1"));
        config.approval_timeout_overrides.insert(2, 1);
        let gate = ApprovalGate::open(InvestigationId::new("inv-1"), &config, 2, ts("2026-01-01T00:00:00Z"));
        assert_eq!(gate.deadline, ts("2026-01-01T01:00:00Z"));
    }

    #[test]
    fn sweep_expired_only_returns_gates_past_their_deadline() {
        let config = TenantConfig::new(TenantId::new("t1"));
        let expired = ApprovalGate::open(InvestigationId::new("inv-expired"), &config, 2, ts("2026-01-01T00:00:00Z"));
        let fresh = ApprovalGate::open(InvestigationId::new("inv-fresh"), &config, 2, ts("2026-01-01T23:00:00Z"));
        let swept = sweep_expired(&[expired, fresh], &ts("2026-01-01T05:00:00Z"));
        assert_eq!(swept, vec![InvestigationId::new("inv-expired")]);
    }
}
