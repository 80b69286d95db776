// warden-governance/src/kill_switch_manager.rs
// ============================================================================
// Module: Kill Switch Manager
// Description: Activation/deactivation of emergency FP-matching kill
//              switches, paired with the audit events documenting them.
// Purpose: Give operators one call to pull in an emergency, always leaving
//          a trail of who pulled it and why.
// Dependencies: warden-audit, warden-core
// ============================================================================

//! ## Overview
//! A kill switch disables FP-pattern matching along one or more of
//! `(tenant, pattern, technique, data_source)`. Reading kill-switch state
//! must fail open (see [`warden_core::is_killed`]); this manager only
//! concerns itself with recording activation/deactivation honestly.

use warden_audit::ActorType;
use warden_audit::AuditContext;
use warden_audit::AuditDecision;
use warden_audit::AuditOutcome;
use warden_audit::AuditProducer;
use warden_audit::AuditSeverity;
use warden_audit::AuditSink;
use warden_audit::EmitRequest;
use warden_audit::EventTaxonomy;
use warden_core::KillSwitch;
use warden_core::KillSwitchDimension;
use warden_core::TenantId;
use warden_core::Timestamp;

/// Activates and deactivates kill switches, auditing each transition.
pub struct KillSwitchManager<S: AuditSink> {
    audit: AuditProducer<S>,
}

impl<S: AuditSink> KillSwitchManager<S> {
    /// Builds a manager backed by `audit`.
    pub const fn new(audit: AuditProducer<S>) -> Self {
        Self { audit }
    }

    /// Activates a new kill switch over `dimension` and emits
    /// [`EventTaxonomy::KillSwitchActivated`].
    pub fn activate(
        &self,
        dimension: KillSwitchDimension,
        activated_by: &str,
        reason: &str,
        tenant_id: &TenantId,
        now: Timestamp,
    ) -> KillSwitch {
        let switch = KillSwitch { dimension, activated_by: activated_by.to_string(), reason: reason.to_string(), activated_at: now, deactivated_at: None };

        self.audit.emit(
            EmitRequest {
                tenant_id: tenant_id.clone(),
                event_type: Some(EventTaxonomy::KillSwitchActivated),
                severity: AuditSeverity::Critical,
                actor_type: Some(ActorType::Human),
                actor_id: activated_by.to_string(),
                context: AuditContext::default(),
                decision: AuditDecision::default(),
                outcome: AuditOutcome { outcome_status: "activated".to_string(), action_taken: reason.to_string(), ..AuditOutcome::default() },
                ..EmitRequest::default()
            },
            now,
        );

        switch
    }

    /// Deactivates `switch` and emits [`EventTaxonomy::KillSwitchDeactivated`].
    /// No-op (including no audit event) if `switch` was already inactive.
    pub fn deactivate(&self, switch: &mut KillSwitch, deactivated_by: &str, tenant_id: &TenantId, now: Timestamp) {
        if !switch.is_active() {
            return;
        }
        switch.deactivate(now);

        self.audit.emit(
            EmitRequest {
                tenant_id: tenant_id.clone(),
                event_type: Some(EventTaxonomy::KillSwitchDeactivated),
                severity: AuditSeverity::Info,
                actor_type: Some(ActorType::Human),
                actor_id: deactivated_by.to_string(),
                context: AuditContext::default(),
                decision: AuditDecision::default(),
                outcome: AuditOutcome { outcome_status: "deactivated".to_string(), ..AuditOutcome::default() },
                ..EmitRequest::default()
            },
            now,
        );
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions are permitted."
)]
mod tests {
    use std::sync::Arc;
    use std::sync::Mutex;

    use warden_audit::AuditRecord;
    use warden_audit::SinkError;

    use super::*;

    #[derive(Default, Clone)]
    struct CapturingSink {
        captured: Arc<Mutex<Vec<AuditRecord>>>,
    }

    impl AuditSink for CapturingSink {
        fn deliver(&self, record: &AuditRecord) -> Result<(), SinkError> {
            self.captured.lock().expect("lock").push(record.clone());
            Ok(())
        }
    }

    fn ts(s: &str) -> Timestamp {
        Timestamp::parse(s).expect("parse")
    }

    #[test]
    fn activate_then_deactivate_emits_both_events() {
        let sink = CapturingSink::default();
        let captured = sink.captured.clone();
        let manager = KillSwitchManager::new(AuditProducer::new(sink));
        let tenant = TenantId::new("t1");

        let mut switch = manager.activate(KillSwitchDimension::default(), "oncall", "suspected bad pattern", &tenant, ts("2026-01-01T00:00:00Z"));
        assert!(switch.is_active());

        manager.deactivate(&mut switch, "oncall", &tenant, ts("2026-01-02T00:00:00Z"));
        assert!(!switch.is_active());

        let captured = captured.lock().expect("lock");
        assert_eq!(captured.len(), 2);
        assert_eq!(captured[0].event_type, EventTaxonomy::KillSwitchActivated);
        assert_eq!(captured[1].event_type, EventTaxonomy::KillSwitchDeactivated);
    }

    #[test]
    fn deactivating_an_already_inactive_switch_is_a_no_op() {
        let sink = CapturingSink::default();
        let captured = sink.captured.clone();
        let manager = KillSwitchManager::new(AuditProducer::new(sink));
        let tenant = TenantId::new("t1");

        let mut switch = manager.activate(KillSwitchDimension::default(), "oncall", "reason", &tenant, ts("2026-01-01T00:00:00Z"));
        manager.deactivate(&mut switch, "oncall", &tenant, ts("2026-01-02T00:00:00Z"));
        manager.deactivate(&mut switch, "oncall", &tenant, ts("2026-01-03T00:00:00Z"));

        let captured = captured.lock().expect("lock");
        assert_eq!(captured.len(), 2);
    }
}
