// warden-core/src/core/investigation.rs
// ============================================================================
// Module: Investigation State
// Description: The durable investigation record and its lifecycle states.
// Purpose: Give the orchestrator and stores one shared, versionable shape.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! An [`Investigation`] is the durable, single-writer, append-only-by-
//! convention unit of work this engine produces per alert. Its `state`
//! field only ever advances along the graph topology described in the
//! orchestrator design; `CLOSED` and `FAILED` are absorbing.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::alert::Severity;
use crate::core::entity::EntityBundle;
use crate::core::identifiers::AlertId;
use crate::core::identifiers::InvestigationId;
use crate::core::identifiers::TenantId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Lifecycle State
// ============================================================================

/// Investigation lifecycle states. Ordering in this enum mirrors the graph
/// topology but is not itself a total order: branches exist (see the
/// orchestrator design for the full topology diagram).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvestigationState {
    /// The alert has been accepted but no stage has run yet.
    Received,
    /// IOC extraction and FP short-circuit are in progress.
    Parsing,
    /// Parallel enrichment agents are running.
    Enriching,
    /// The reasoning agent (and optional escalation) is running.
    Reasoning,
    /// Paused, waiting on a human approval decision.
    AwaitingHuman,
    /// The response agent is dispatching actions.
    Responding,
    /// Terminal: the investigation is closed.
    Closed,
    /// Terminal: the investigation failed unrecoverably.
    Failed,
}

impl InvestigationState {
    /// Returns true for the two absorbing terminal states.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Closed | Self::Failed)
    }
}

// ============================================================================
// SECTION: Risk State
// ============================================================================

/// Explicit risk states. `NoBaseline` means data is absent, never "safe".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskState {
    /// No behavioural baseline exists for this entity yet.
    NoBaseline,
    /// A baseline exists but risk cannot currently be determined.
    Unknown,
    /// Low risk.
    Low,
    /// Medium risk.
    Medium,
    /// High risk.
    High,
}

impl Default for RiskState {
    fn default() -> Self {
        Self::Unknown
    }
}

// ============================================================================
// SECTION: Agent Role
// ============================================================================

/// Named roles within the investigation graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    /// Extracts indicators of compromise via a Tier-0 Gateway call.
    IocExtractor,
    /// Looks up threat-intel and behavioural context.
    ContextEnricher,
    /// Correlates exposure data from the continuous threat exposure store.
    CtemCorrelator,
    /// Maps adversarial-ML (ATLAS) techniques.
    AtlasMapper,
    /// Produces the final classification via a Tier-1 Gateway call.
    ReasoningAgent,
    /// Selects a playbook and dispatches actions.
    ResponseAgent,
}

// ============================================================================
// SECTION: Decision Entry
// ============================================================================

/// Telemetry trust level recorded on adversarial-ML detections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TelemetryTrustLevel {
    /// Telemetry is attested and trusted.
    Trusted,
    /// Telemetry failed attestation or carries no attestation at all.
    Untrusted,
}

/// An immutable entry in an investigation's append-only decision chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionEntry {
    /// The agent (or system component) that produced this entry.
    pub agent: String,
    /// A short machine-readable action label (e.g. `"auto_close_fp"`).
    pub action: String,
    /// When this entry was recorded.
    pub timestamp: Timestamp,
    /// Optional confidence associated with this decision.
    #[serde(default)]
    pub confidence: Option<f64>,
    /// Optional free-form structured detail.
    #[serde(default)]
    pub details: Option<Value>,
    /// Optional adversarial-ML trust/attestation tag.
    #[serde(default)]
    pub trust_tag: Option<TelemetryTrustLevel>,
}

impl DecisionEntry {
    /// Builds a decision entry with no confidence, details, or trust tag.
    #[must_use]
    pub fn new(agent: impl Into<String>, action: impl Into<String>, at: Timestamp) -> Self {
        Self {
            agent: agent.into(),
            action: action.into(),
            timestamp: at,
            confidence: None,
            details: None,
            trust_tag: None,
        }
    }

    /// Builder-style setter for `confidence`.
    #[must_use]
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    /// Builder-style setter for `details`.
    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

// ============================================================================
// SECTION: Recommended Action
// ============================================================================

/// A single response action recommended by the reasoning agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendedAction {
    /// The action label (e.g. `"isolate_endpoint"`).
    pub action: String,
    /// The target of the action (host, account, ...).
    pub target: String,
    /// Automation tier; tier 2 always requires human approval.
    pub tier: u8,
    /// Why this action was recommended.
    #[serde(default)]
    pub rationale: String,
}

impl RecommendedAction {
    /// Returns true when this action requires human approval before dispatch.
    #[must_use]
    pub const fn requires_approval(&self) -> bool {
        self.tier >= 2
    }
}

// ============================================================================
// SECTION: Adversarial-ML Detection
// ============================================================================

/// A single adversarial-ML (ATLAS) technique detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtlasDetection {
    /// The ATLAS technique id (e.g. `AML.T0043`).
    pub technique_id: String,
    /// Confidence in `[0, 1]`.
    pub confidence: f64,
    /// Telemetry trust level backing this detection.
    pub telemetry_trust_level: TelemetryTrustLevel,
    /// Human-readable attestation status.
    #[serde(default)]
    pub attestation_status: String,
}

// ============================================================================
// SECTION: Investigation
// ============================================================================

/// The durable, per-alert investigation record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Investigation {
    /// Unique investigation identifier.
    pub investigation_id: InvestigationId,
    /// The alert this investigation was opened for.
    pub alert_id: AlertId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Current lifecycle state.
    pub state: InvestigationState,
    /// Parsed entity bundle.
    #[serde(default)]
    pub entities: EntityBundle,
    /// IOC-enrichment results.
    #[serde(default)]
    pub ioc_matches: Vec<Value>,
    /// Behavioural/UEBA context results.
    #[serde(default)]
    pub ueba_context: Vec<Value>,
    /// CTEM exposure-correlation results.
    #[serde(default)]
    pub ctem_exposures: Vec<Value>,
    /// Adversarial-ML technique detections.
    #[serde(default)]
    pub atlas_techniques: Vec<AtlasDetection>,
    /// Similar-incident matches from vector search.
    #[serde(default)]
    pub similar_incidents: Vec<Value>,
    /// Playbook matches selected by the response agent.
    #[serde(default)]
    pub playbook_matches: Vec<Value>,
    /// Append-only decision chain.
    #[serde(default)]
    pub decision_chain: Vec<DecisionEntry>,
    /// Final or working classification (e.g. `"true_positive"`).
    #[serde(default)]
    pub classification: String,
    /// Confidence in `[0, 1]`.
    #[serde(default)]
    pub confidence: f64,
    /// Severity assigned to this investigation.
    #[serde(default)]
    pub severity: Option<Severity>,
    /// Recommended response actions.
    #[serde(default)]
    pub recommended_actions: Vec<RecommendedAction>,
    /// Whether this investigation is paused on human approval.
    #[serde(default)]
    pub requires_human_approval: bool,
    /// Aggregate risk state across enrichment agents.
    #[serde(default)]
    pub risk_state: RiskState,
    /// Number of Gateway LLM calls made so far.
    #[serde(default)]
    pub llm_calls: u32,
    /// Cumulative Gateway spend in USD.
    #[serde(default)]
    pub total_cost_usd: f64,
    /// Number of enrichment/lookup queries executed so far.
    #[serde(default)]
    pub queries_executed: u32,
}

impl Investigation {
    /// Creates a freshly received investigation for the given alert.
    #[must_use]
    pub fn new(
        investigation_id: InvestigationId,
        alert_id: AlertId,
        tenant_id: TenantId,
        entities: EntityBundle,
    ) -> Self {
        Self {
            investigation_id,
            alert_id,
            tenant_id,
            state: InvestigationState::Received,
            entities,
            ioc_matches: Vec::new(),
            ueba_context: Vec::new(),
            ctem_exposures: Vec::new(),
            atlas_techniques: Vec::new(),
            similar_incidents: Vec::new(),
            playbook_matches: Vec::new(),
            decision_chain: Vec::new(),
            classification: String::new(),
            confidence: 0.0,
            severity: None,
            recommended_actions: Vec::new(),
            requires_human_approval: false,
            risk_state: RiskState::default(),
            llm_calls: 0,
            total_cost_usd: 0.0,
            queries_executed: 0,
        }
    }

    /// Appends a decision entry and advances the lifecycle state in one step,
    /// matching the persistence contract: state and decision chain are never
    /// observed out of sync by a reader.
    pub fn transition(&mut self, new_state: InvestigationState, entry: DecisionEntry) {
        self.decision_chain.push(entry);
        self.state = new_state;
    }

    /// Returns true if every entry in the adversarial-ML list is untrusted,
    /// which forces a human-review gate regardless of confidence. An empty
    /// list is not "all untrusted" — there is nothing to distrust.
    #[must_use]
    pub fn all_atlas_detections_untrusted(&self) -> bool {
        !self.atlas_techniques.is_empty()
            && self
                .atlas_techniques
                .iter()
                .all(|d| d.telemetry_trust_level == TelemetryTrustLevel::Untrusted)
    }

    /// Returns true if any recommended action requires human approval.
    #[must_use]
    pub fn has_tier_two_action(&self) -> bool {
        self.recommended_actions.iter().any(RecommendedAction::requires_approval)
    }

    /// Returns true if a prior decision entry already recorded the given
    /// `(action, pattern_id)` pair, used to de-duplicate at-most-once side
    /// effects on resume.
    #[must_use]
    pub fn decision_chain_contains_action_detail(&self, action: &str, key: &str, value: &str) -> bool {
        self.decision_chain.iter().any(|entry| {
            entry.action == action
                && entry
                    .details
                    .as_ref()
                    .and_then(|d| d.get(key))
                    .and_then(Value::as_str)
                    == Some(value)
        })
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

    fn investigation() -> Investigation {
        Investigation::new(
            InvestigationId::new("inv-1"),
            AlertId::new("a1"),
            TenantId::new("t1"),
            EntityBundle::default(),
        )
    }

    #[test]
    fn empty_atlas_list_is_not_all_untrusted() {
        let inv = investigation();
        assert!(!inv.all_atlas_detections_untrusted());
    }

    #[test]
    fn all_untrusted_detections_force_review() {
        let mut inv = investigation();
        inv.atlas_techniques.push(AtlasDetection {
            technique_id: "AML.T0043".to_string(),
            confidence: 0.9,
            telemetry_trust_level: TelemetryTrustLevel::Untrusted,
            attestation_status: "failed".to_string(),
        });
        assert!(inv.all_atlas_detections_untrusted());
    }

    #[test]
    fn mixed_trust_does_not_force_review() {
        let mut inv = investigation();
        inv.atlas_techniques.push(AtlasDetection {
            technique_id: "AML.T0043".to_string(),
            confidence: 0.9,
            telemetry_trust_level: TelemetryTrustLevel::Trusted,
            attestation_status: "ok".to_string(),
        });
        inv.atlas_techniques.push(AtlasDetection {
            technique_id: "AML.T0044".to_string(),
            confidence: 0.5,
            telemetry_trust_level: TelemetryTrustLevel::Untrusted,
            attestation_status: "failed".to_string(),
        });
        assert!(!inv.all_atlas_detections_untrusted());
    }

    #[test]
    fn tier_two_action_requires_approval() {
        let action = RecommendedAction {
            action: "isolate_endpoint".to_string(),
            target: "web-01".to_string(),
            tier: 2,
            rationale: String::new(),
        };
        assert!(action.requires_approval());
    }

    #[test]
    fn terminal_states_are_closed_and_failed_only() {
        assert!(InvestigationState::Closed.is_terminal());
        assert!(InvestigationState::Failed.is_terminal());
        assert!(!InvestigationState::Reasoning.is_terminal());
    }

    #[test]
    fn decision_chain_detail_lookup_finds_recorded_pattern() {
        let mut inv = investigation();
        let entry = DecisionEntry::new("fp_short_circuit", "auto_close_fp", Timestamp::parse("2026-01-01T00:00:00Z").expect("parse"))
            .with_details(serde_json::json!({"pattern_id": "p1"}));
        inv.transition(InvestigationState::Closed, entry);
        assert!(inv.decision_chain_contains_action_detail("auto_close_fp", "pattern_id", "p1"));
        assert!(!inv.decision_chain_contains_action_detail("auto_close_fp", "pattern_id", "p2"));
    }
}
