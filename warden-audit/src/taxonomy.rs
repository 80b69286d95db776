// warden-audit/src/taxonomy.rs
// ============================================================================
// Module: Event Taxonomy
// Description: Closed vocabulary of audit event types and their categories.
// Purpose: Reject unknown event types at construction time rather than at
//          the point they are read back out of the audit trail.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Every auditable action in Warden maps to exactly one [`EventTaxonomy`]
//! member, and every member maps to exactly one [`EventCategory`]. The
//! mapping is fixed in code (see [`EventTaxonomy::category`]) so a record's
//! category can never drift from its event type.

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Event Category
// ============================================================================

/// Top-level audit event categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    /// A classification or routing decision was made.
    Decision,
    /// A concrete action was taken against an entity or system.
    Action,
    /// A human approval was requested, granted, denied, or escalated.
    Approval,
    /// A security-relevant event: injection, quarantine, threshold breach.
    Security,
    /// An operational/system-level event.
    System,
}

// ============================================================================
// SECTION: Event Taxonomy
// ============================================================================

/// The closed vocabulary of audit event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventTaxonomy {
    // --- Decision events ---
    /// An alert received a final classification.
    AlertClassified,
    /// An alert was auto-closed as a false positive.
    AlertAutoClosed,
    /// An alert was escalated to a deeper reasoning pass.
    AlertEscalated,
    /// An alert was short-circuited by a governed FP pattern.
    AlertShortCircuited,
    /// An investigation's lifecycle state changed.
    InvestigationStateChanged,
    /// An investigation received enrichment results.
    InvestigationEnriched,
    /// A response playbook was selected.
    PlaybookSelected,
    /// A response playbook was generated on the fly.
    PlaybookGenerated,
    /// A continuous-exposure score was computed.
    CtemExposureScored,
    /// An adversarial-ML (ATLAS) detection fired.
    AtlasDetectionFired,
    /// A reasoning tier (model class) was selected for a call.
    RoutingTierSelected,
    /// A provider failover occurred mid-routing.
    RoutingProviderFailover,
    /// A shadow-mode tenant reached a decision that would have dispatched
    /// an action, had shadow mode not suppressed dispatch.
    ShadowDecisionRecorded,

    // --- Action events ---
    /// A response action was prepared but not yet dispatched.
    ResponsePrepared,
    /// A response action was dispatched.
    ResponseExecuted,
    /// A previously executed response action was rolled back.
    ResponseRolledBack,
    /// An indicator of compromise was enriched.
    IocEnriched,
    /// A new FP pattern was proposed.
    FpPatternCreated,
    /// An FP pattern entered its active (approved) state.
    FpPatternActivated,
    /// A remediation task was assigned against a CTEM exposure.
    CtemRemediationAssigned,
    /// A remediation task was verified as complete.
    CtemRemediationVerified,
    /// A document or record was indexed into the knowledge store.
    KnowledgeIndexed,
    /// Embeddings were recomputed for existing knowledge.
    EmbeddingReindexed,
    /// A response narrative or playbook text was generated by an LLM.
    ResponseGenerated,

    // --- Approval events ---
    /// Human approval was requested for a tier-2 action.
    ApprovalRequested,
    /// Human approval was granted.
    ApprovalGranted,
    /// Human approval was denied.
    ApprovalDenied,
    /// Human approval request timed out.
    ApprovalTimedOut,
    /// An approval request was escalated to another approver.
    ApprovalEscalated,
    /// An FP pattern received its second, finalising approval.
    FpPatternApproved,
    /// An FP pattern was revoked.
    FpPatternRevoked,
    /// A shadow-mode feature was approved to go live.
    ShadowGoLiveApproved,

    // --- Security events ---
    /// A prompt-injection attempt was detected.
    InjectionDetected,
    /// Content was quarantined due to a detected injection.
    InjectionQuarantined,
    /// A reported technique id was quarantined as untrusted/unvalidated.
    TechniqueQuarantined,
    /// An accumulation-risk threshold was breached.
    AccumulationThresholdBreached,
    /// Tenant spend crossed the soft-alert threshold.
    SpendSoftLimit,
    /// Tenant spend crossed the hard cap.
    SpendHardLimit,

    // --- System events ---
    /// The system entered a degraded mode.
    DegradationEntered,
    /// The system exited a degraded mode.
    DegradationExited,
    /// A kill switch was activated.
    KillSwitchActivated,
    /// A kill switch was deactivated.
    KillSwitchDeactivated,
    /// A configuration value changed.
    ConfigChanged,
    /// A circuit breaker opened.
    CircuitBreakerOpened,
    /// A circuit breaker closed.
    CircuitBreakerClosed,
    /// The very first audit record for a tenant was written.
    SystemGenesis,
}

impl EventTaxonomy {
    /// Returns the fixed category for this event type.
    #[must_use]
    pub const fn category(self) -> EventCategory {
        match self {
            Self::AlertClassified
            | Self::AlertAutoClosed
            | Self::AlertEscalated
            | Self::AlertShortCircuited
            | Self::InvestigationStateChanged
            | Self::InvestigationEnriched
            | Self::PlaybookSelected
            | Self::PlaybookGenerated
            | Self::CtemExposureScored
            | Self::AtlasDetectionFired
            | Self::RoutingTierSelected
            | Self::RoutingProviderFailover
            | Self::ShadowDecisionRecorded => EventCategory::Decision,

            Self::ResponsePrepared
            | Self::ResponseExecuted
            | Self::ResponseRolledBack
            | Self::IocEnriched
            | Self::FpPatternCreated
            | Self::FpPatternActivated
            | Self::CtemRemediationAssigned
            | Self::CtemRemediationVerified
            | Self::KnowledgeIndexed
            | Self::EmbeddingReindexed
            | Self::ResponseGenerated => EventCategory::Action,

            Self::ApprovalRequested
            | Self::ApprovalGranted
            | Self::ApprovalDenied
            | Self::ApprovalTimedOut
            | Self::ApprovalEscalated
            | Self::FpPatternApproved
            | Self::FpPatternRevoked
            | Self::ShadowGoLiveApproved => EventCategory::Approval,

            Self::InjectionDetected
            | Self::InjectionQuarantined
            | Self::TechniqueQuarantined
            | Self::AccumulationThresholdBreached
            | Self::SpendSoftLimit
            | Self::SpendHardLimit => EventCategory::Security,

            Self::DegradationEntered
            | Self::DegradationExited
            | Self::KillSwitchActivated
            | Self::KillSwitchDeactivated
            | Self::ConfigChanged
            | Self::CircuitBreakerOpened
            | Self::CircuitBreakerClosed
            | Self::SystemGenesis => EventCategory::System,
        }
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
    fn decision_events_map_to_decision_category() {
        assert_eq!(EventTaxonomy::AlertClassified.category(), EventCategory::Decision);
        assert_eq!(EventTaxonomy::RoutingProviderFailover.category(), EventCategory::Decision);
    }

    #[test]
    fn security_events_map_to_security_category() {
        assert_eq!(EventTaxonomy::SpendHardLimit.category(), EventCategory::Security);
        assert_eq!(EventTaxonomy::InjectionDetected.category(), EventCategory::Security);
    }

    #[test]
    fn system_genesis_maps_to_system_category() {
        assert_eq!(EventTaxonomy::SystemGenesis.category(), EventCategory::System);
    }

    #[test]
    fn unknown_event_types_are_rejected_by_deserialization() {
        let result: Result<EventTaxonomy, _> = serde_json::from_str("\"not_a_real_event\"");
        assert!(result.is_err());
    }

    #[test]
    fn known_event_type_round_trips() {
        let json = serde_json::to_string(&EventTaxonomy::KillSwitchActivated).expect("serialize");
        assert_eq!(json, "\"kill_switch_activated\"");
        let parsed: EventTaxonomy = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed, EventTaxonomy::KillSwitchActivated);
    }
}
