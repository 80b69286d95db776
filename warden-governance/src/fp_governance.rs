// warden-governance/src/fp_governance.rs
// ============================================================================
// Module: False-Positive Governance Manager
// Description: Two-person approval, expiry, reaffirmation, and revocation
//              lifecycle for governed FP patterns, with rollback of
//              investigations the pattern auto-closed.
// Purpose: The only place pattern lifecycle mutations happen, so every
//          transition is paired with the audit event that explains it.
// Dependencies: warden-audit, warden-core
// ============================================================================

//! ## Overview
//! [`FpGovernanceManager`] wraps the lifecycle methods already owned by
//! [`warden_core::FpPattern`] (`record_approval`, `reaffirm`, `revoke`) with
//! the audit emission and investigation-rollback side effects those
//! transitions require. A pattern's own methods stay pure; this manager is
//! where the side effects live.

// ============================================================================
// SECTION: Imports
// ============================================================================

use warden_audit::ActorType;
use warden_audit::AuditContext;
use warden_audit::AuditDecision;
use warden_audit::AuditOutcome;
use warden_audit::AuditProducer;
use warden_audit::AuditSeverity;
use warden_audit::AuditSink;
use warden_audit::EmitRequest;
use warden_audit::EventTaxonomy;
use warden_core::DecisionEntry;
use warden_core::FpApprovalError;
use warden_core::FpPattern;
use warden_core::FpPatternStatus;
use warden_core::Investigation;
use warden_core::InvestigationState;
use warden_core::Timestamp;

const AUTO_CLOSE_FP_ACTION: &str = "auto_close_fp";
const ROLLBACK_FP_ACTION: &str = "rollback_fp";

/// Lifecycle manager for governed FP patterns.
pub struct FpGovernanceManager<S: AuditSink> {
    audit: AuditProducer<S>,
}

impl<S: AuditSink> FpGovernanceManager<S> {
    /// Builds a manager backed by `audit`.
    pub const fn new(audit: AuditProducer<S>) -> Self {
        Self { audit }
    }

    /// Records an approval from `approver`. Emits
    /// [`EventTaxonomy::FpPatternApproved`] only on the transition that
    /// finalises approval (the second, distinct approver).
    ///
    /// # Errors
    ///
    /// Propagates [`FpApprovalError`] from [`FpPattern::record_approval`].
    pub fn approve(
        &self,
        pattern: &mut FpPattern,
        approver: &str,
        tenant_id: &warden_core::TenantId,
        now: Timestamp,
    ) -> Result<(), FpApprovalError> {
        let was_pending = pattern.status == FpPatternStatus::PendingReview;
        pattern.record_approval(approver, now)?;
        if was_pending && pattern.status == FpPatternStatus::Approved {
            self.audit.emit(
                EmitRequest {
                    tenant_id: tenant_id.clone(),
                    event_type: Some(EventTaxonomy::FpPatternApproved),
                    severity: AuditSeverity::Info,
                    actor_type: Some(ActorType::Human),
                    actor_id: approver.to_string(),
                    context: AuditContext { fp_pattern_matched: pattern.pattern_id.to_string(), ..AuditContext::default() },
                    decision: AuditDecision::default(),
                    outcome: AuditOutcome { outcome_status: "approved".to_string(), ..AuditOutcome::default() },
                    ..EmitRequest::default()
                },
                now,
            );
        }
        Ok(())
    }

    /// Marks every pattern in `patterns` past its expiry date as `Expired`,
    /// returning the ids that transitioned this call.
    pub fn check_expiry(&self, patterns: &mut [FpPattern], now: &Timestamp) -> Vec<String> {
        let mut expired = Vec::new();
        for pattern in patterns {
            let was_approved = pattern.status == FpPatternStatus::Approved;
            pattern.expire_if_due(now);
            if was_approved && pattern.status == FpPatternStatus::Expired {
                expired.push(pattern.pattern_id.to_string());
            }
        }
        expired
    }

    /// Reaffirms `pattern`, resetting its expiry window.
    ///
    /// # Errors
    ///
    /// Propagates [`FpApprovalError`] from [`FpPattern::reaffirm`].
    pub fn reaffirm(&self, pattern: &mut FpPattern, approver: &str, now: Timestamp) -> Result<(), FpApprovalError> {
        pattern.reaffirm(approver, now)
    }

    /// Revokes `pattern` and rolls back every investigation in `investigations`
    /// whose decision chain recorded an `auto_close_fp` against it, reopening
    /// each at `Parsing`. Returns the ids of the investigations reopened.
    ///
    /// Emits [`EventTaxonomy::FpPatternRevoked`] once, plus one
    /// [`EventTaxonomy::InvestigationStateChanged`] per reopened investigation.
    pub fn revoke_and_rollback(
        &self,
        pattern: &mut FpPattern,
        approver: &str,
        tenant_id: &warden_core::TenantId,
        investigations: &mut [Investigation],
        now: Timestamp,
    ) -> Vec<String> {
        pattern.revoke();
        let pattern_id = pattern.pattern_id.to_string();

        self.audit.emit(
            EmitRequest {
                tenant_id: tenant_id.clone(),
                event_type: Some(EventTaxonomy::FpPatternRevoked),
                severity: AuditSeverity::Warning,
                actor_type: Some(ActorType::Human),
                actor_id: approver.to_string(),
                context: AuditContext { fp_pattern_matched: pattern_id.clone(), ..AuditContext::default() },
                decision: AuditDecision::default(),
                outcome: AuditOutcome { outcome_status: "revoked".to_string(), ..AuditOutcome::default() },
                ..EmitRequest::default()
            },
            now,
        );

        let mut reopened = Vec::new();
        for investigation in investigations {
            if investigation.decision_chain_contains_action_detail(AUTO_CLOSE_FP_ACTION, "pattern_id", &pattern_id)
                && !investigation.decision_chain_contains_action_detail(ROLLBACK_FP_ACTION, "pattern_id", &pattern_id)
            {
                let entry = DecisionEntry::new("fp_governance", ROLLBACK_FP_ACTION, now)
                    .with_details(serde_json::json!({ "pattern_id": pattern_id }));
                investigation.transition(InvestigationState::Parsing, entry);
                reopened.push(investigation.investigation_id.to_string());

                self.audit.emit(
                    EmitRequest {
                        tenant_id: investigation.tenant_id.clone(),
                        event_type: Some(EventTaxonomy::InvestigationStateChanged),
                        severity: AuditSeverity::Warning,
                        actor_type: Some(ActorType::System),
                        actor_id: "fp_governance".to_string(),
                        investigation_id: Some(investigation.investigation_id.clone()),
                        context: AuditContext { fp_pattern_matched: pattern_id.clone(), ..AuditContext::default() },
                        decision: AuditDecision::default(),
                        outcome: AuditOutcome {
                            outcome_status: "reopened".to_string(),
                            state_before: "closed".to_string(),
                            state_after: "parsing".to_string(),
                            ..AuditOutcome::default()
                        },
                        ..EmitRequest::default()
                    },
                    now,
                );
            }
        }
        reopened
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
    use warden_core::AlertId;
    use warden_core::EntityBundle;
    use warden_core::InvestigationId;
    use warden_core::PatternId;
    use warden_core::Scope;
    use warden_core::TenantId;

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

    fn draft_pattern() -> FpPattern {
        FpPattern {
            pattern_id: PatternId::new("p1"),
            name: "scanner".to_string(),
            scope: Scope::default(),
            requirements: vec![],
            status: FpPatternStatus::Draft,
            approver_1: None,
            approver_2: None,
            approval_date: None,
            expiry_date: None,
            reaffirmed_date: None,
            reaffirmed_by: None,
        }
    }

    #[test]
    fn approve_emits_event_only_on_second_approval() {
        let sink = CapturingSink::default();
        let captured = sink.captured.clone();
        let manager = FpGovernanceManager::new(AuditProducer::new(sink));
        let tenant = TenantId::new("t1");
        let mut pattern = draft_pattern();
        manager.approve(&mut pattern, "alice", &tenant, ts("2026-01-01T00:00:00Z")).expect("first approval");
        manager.approve(&mut pattern, "bob", &tenant, ts("2026-01-01T00:00:00Z")).expect("second approval");
        let captured = captured.lock().expect("lock");
        assert_eq!(captured.len(), 1);
        assert_eq!(captured[0].event_type, EventTaxonomy::FpPatternApproved);
    }

    #[test]
    fn revoke_reopens_investigations_that_were_auto_closed_by_pattern() {
        let manager = FpGovernanceManager::new(AuditProducer::new(CapturingSink::default()));
        let tenant = TenantId::new("t1");
        let mut pattern = draft_pattern();
        manager.approve(&mut pattern, "alice", &tenant, ts("2026-01-01T00:00:00Z")).expect("approve");
        manager.approve(&mut pattern, "bob", &tenant, ts("2026-01-01T00:00:00Z")).expect("approve");

        let mut investigation = Investigation::new(InvestigationId::new("inv-1"), AlertId::new("a1"), tenant.clone(), EntityBundle::default());
        let entry = DecisionEntry::new("fp_short_circuit", AUTO_CLOSE_FP_ACTION, ts("2026-01-02T00:00:00Z"))
            .with_details(serde_json::json!({ "pattern_id": "p1" }));
        investigation.transition(InvestigationState::Closed, entry);

        let mut investigations = vec![investigation];
        let reopened = manager.revoke_and_rollback(&mut pattern, "carol", &tenant, &mut investigations, ts("2026-01-03T00:00:00Z"));

        assert_eq!(reopened, vec!["inv-1".to_string()]);
        assert_eq!(investigations[0].state, InvestigationState::Parsing);
        assert_eq!(pattern.status, FpPatternStatus::Revoked);
    }

    #[test]
    fn revoke_does_not_touch_investigations_closed_by_a_different_pattern() {
        let manager = FpGovernanceManager::new(AuditProducer::new(CapturingSink::default()));
        let tenant = TenantId::new("t1");
        let mut pattern = draft_pattern();
        manager.approve(&mut pattern, "alice", &tenant, ts("2026-01-01T00:00:00Z")).expect("approve");
        manager.approve(&mut pattern, "bob", &tenant, ts("2026-01-01T00:00:00Z")).expect("approve");

        let mut investigation = Investigation::new(InvestigationId::new("inv-1"), AlertId::new("a1"), tenant.clone(), EntityBundle::default());
        let entry = DecisionEntry::new("fp_short_circuit", AUTO_CLOSE_FP_ACTION, ts("2026-01-02T00:00:00Z"))
            .with_details(serde_json::json!({ "pattern_id": "some-other-pattern" }));
        investigation.transition(InvestigationState::Closed, entry);

        let mut investigations = vec![investigation];
        let reopened = manager.revoke_and_rollback(&mut pattern, "carol", &tenant, &mut investigations, ts("2026-01-03T00:00:00Z"));
        assert!(reopened.is_empty());
        assert_eq!(investigations[0].state, InvestigationState::Closed);
    }

    #[test]
    fn check_expiry_returns_only_newly_expired_ids() {
        let manager = FpGovernanceManager::new(AuditProducer::new(CapturingSink::default()));
        let tenant = TenantId::new("t1");
        let mut pattern = draft_pattern();
        manager.approve(&mut pattern, "alice", &tenant, ts("2026-01-01T00:00:00Z")).expect("approve");
        manager.approve(&mut pattern, "bob", &tenant, ts("2026-01-01T00:00:00Z")).expect("approve");
        let mut patterns = vec![pattern];
        let expired = manager.check_expiry(&mut patterns, &ts("2026-06-01T00:00:00Z"));
        assert_eq!(expired, vec!["p1".to_string()]);
        let expired_again = manager.check_expiry(&mut patterns, &ts("2026-06-02T00:00:00Z"));
        assert!(expired_again.is_empty());
    }
}
