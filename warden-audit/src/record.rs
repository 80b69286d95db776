// warden-audit/src/record.rs
// ============================================================================
// Module: Audit Record
// Description: The immutable audit trail record and its nested contexts.
// Purpose: Give every Warden crate one shape to populate when it emits an
//          auditable event.
// Dependencies: serde, serde_json, warden-core
// ============================================================================

//! ## Overview
//! Every auditable event produces exactly one [`AuditRecord`]. Callers
//! populate only the nested context/decision/outcome fields relevant to
//! their event; everything else defaults to its zero value. Records are
//! chained by [`AuditRecord::record_hash`] over the previous record's hash,
//! so tampering with an earlier record is detectable from any later one.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use warden_core::AlertId;
use warden_core::AuditId;
use warden_core::InvestigationId;
use warden_core::TenantId;
use warden_core::Timestamp;

use crate::taxonomy::EventCategory;
use crate::taxonomy::EventTaxonomy;

// ============================================================================
// SECTION: Severity
// ============================================================================

/// Severity of an individual audit record, distinct from alert severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditSeverity {
    /// Routine record.
    Info,
    /// Noteworthy but not actionable on its own.
    Warning,
    /// Requires attention.
    Critical,
}

impl Default for AuditSeverity {
    fn default() -> Self {
        Self::Info
    }
}

// ============================================================================
// SECTION: Actor
// ============================================================================

/// The kind of actor that produced an audit record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorType {
    /// An autonomous agent acting without human input.
    Agent,
    /// A human analyst.
    Human,
    /// The system itself (scheduler, background job, ...).
    System,
}

// ============================================================================
// SECTION: Audit Context
// ============================================================================

/// Contextual information captured alongside an audit event. Callers
/// populate only the fields relevant to their event type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditContext {
    /// LLM provider name, opaque to this crate.
    #[serde(default)]
    pub llm_provider: String,
    /// LLM model identifier.
    #[serde(default)]
    pub llm_model_id: String,
    /// LLM model tier (e.g. `"tier0"`, `"tier1"`).
    #[serde(default)]
    pub llm_model_tier: String,
    /// Input token count for this call.
    #[serde(default)]
    pub llm_input_tokens: u64,
    /// Output token count for this call.
    #[serde(default)]
    pub llm_output_tokens: u64,
    /// Computed cost of this call in USD.
    #[serde(default)]
    pub llm_cost_usd: f64,
    /// Call latency in milliseconds.
    #[serde(default)]
    pub llm_latency_ms: u64,
    /// Hash of the system prompt used, for reproducibility without storing
    /// the prompt itself.
    #[serde(default)]
    pub llm_system_prompt_hash: String,
    /// Hash of the raw model response.
    #[serde(default)]
    pub llm_raw_response_hash: String,
    /// Knowledge stores queried during retrieval.
    #[serde(default)]
    pub retrieval_stores_queried: Vec<String>,
    /// Number of retrieval results returned.
    #[serde(default)]
    pub retrieval_results_count: u32,
    /// Number of retrieval results actually used in the prompt.
    #[serde(default)]
    pub retrieval_results_used: u32,
    /// ATT&CK techniques identified by this event.
    #[serde(default)]
    pub techniques_identified: Vec<String>,
    /// ATT&CK/ATLAS techniques quarantined as untrusted.
    #[serde(default)]
    pub techniques_quarantined: Vec<String>,
    /// Risk state recorded at the time of this event.
    #[serde(default)]
    pub risk_state: String,
    /// Number of CTEM exposures matched.
    #[serde(default)]
    pub ctem_exposures_matched: u32,
    /// Number of similar incidents found.
    #[serde(default)]
    pub similar_incidents_found: u32,
    /// Number of FP patterns checked against this alert.
    #[serde(default)]
    pub fp_patterns_checked: u32,
    /// Pattern id matched, if any.
    #[serde(default)]
    pub fp_pattern_matched: String,
    /// Current degradation level (`"full"` when healthy).
    #[serde(default = "default_degradation_level")]
    pub degradation_level: String,
    /// Opaque evidence references backing the decision.
    #[serde(default)]
    pub evidence_refs: Vec<String>,
}

fn default_degradation_level() -> String {
    "full".to_string()
}

// ============================================================================
// SECTION: Audit Decision
// ============================================================================

/// Captures the decision made during an audit event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditDecision {
    /// Short machine-readable decision type.
    #[serde(default)]
    pub decision_type: String,
    /// Final classification label, if any.
    #[serde(default)]
    pub classification: String,
    /// Confidence in `[0, 1]`.
    #[serde(default)]
    pub confidence: f64,
    /// Human-readable basis for the confidence value.
    #[serde(default)]
    pub confidence_basis: String,
    /// Severity assigned as part of this decision.
    #[serde(default)]
    pub severity_assigned: String,
    /// Actions recommended as part of this decision.
    #[serde(default)]
    pub recommended_actions: Vec<String>,
    /// Short rationale summary.
    #[serde(default)]
    pub reasoning_summary: String,
    /// Constraints applied while making this decision.
    #[serde(default)]
    pub constraints_applied: Vec<String>,
}

// ============================================================================
// SECTION: Audit Outcome
// ============================================================================

/// Captures the outcome/result of an audit event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditOutcome {
    /// Short machine-readable outcome status.
    #[serde(default)]
    pub outcome_status: String,
    /// Action that was actually taken, if any.
    #[serde(default)]
    pub action_taken: String,
    /// Target of the action taken.
    #[serde(default)]
    pub action_target: String,
    /// Error details, if the outcome was a failure.
    #[serde(default)]
    pub error_details: String,
    /// Duration of the underlying operation in milliseconds.
    #[serde(default)]
    pub duration_ms: u64,
    /// State before the transition this event records.
    #[serde(default)]
    pub state_before: String,
    /// State after the transition this event records.
    #[serde(default)]
    pub state_after: String,
    /// Who an approval was requested from.
    #[serde(default)]
    pub approval_requested_from: String,
    /// Who an approval was received from.
    #[serde(default)]
    pub approval_received_from: String,
    /// Latency between request and receipt of an approval, in milliseconds.
    #[serde(default)]
    pub approval_latency_ms: u64,
}

// ============================================================================
// SECTION: Audit Record
// ============================================================================

/// The immutable, hash-chained unit of the audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Unique identifier for this record.
    pub audit_id: AuditId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Monotonic per-tenant sequence number.
    pub sequence_number: u64,
    /// Hash of the immediately preceding record in this tenant's chain, or
    /// empty for the tenant's genesis record.
    #[serde(default)]
    pub previous_hash: String,
    /// When this record was produced.
    pub timestamp: Timestamp,
    /// The event type this record reports.
    pub event_type: EventTaxonomy,
    /// Category derived from `event_type`.
    pub event_category: EventCategory,
    /// Severity of this record.
    #[serde(default)]
    pub severity: AuditSeverity,
    /// Kind of actor that produced this record.
    pub actor_type: ActorType,
    /// Identifier of the actor (agent name, analyst id, ...).
    pub actor_id: String,
    /// Investigation this record relates to, if any.
    #[serde(default)]
    pub investigation_id: Option<InvestigationId>,
    /// Alert this record relates to, if any.
    #[serde(default)]
    pub alert_id: Option<AlertId>,
    /// Context data for this event.
    #[serde(default)]
    pub context: AuditContext,
    /// Decision data for this event.
    #[serde(default)]
    pub decision: AuditDecision,
    /// Outcome data for this event.
    #[serde(default)]
    pub outcome: AuditOutcome,
    /// Hex-encoded SHA-256 hash of this record's canonical content plus
    /// `previous_hash`, computed by [`AuditRecord::sealed`].
    #[serde(default)]
    pub record_hash: String,
}

impl AuditRecord {
    /// Computes `record_hash` over this record's canonical JSON (with
    /// `record_hash` itself cleared) chained onto `previous_hash`, and
    /// returns the sealed record. Call this exactly once, after every other
    /// field has been populated.
    #[must_use]
    pub fn sealed(mut self) -> Self {
        self.record_hash = String::new();
        let canonical = serde_json::to_vec(&self).unwrap_or_default();
        let mut hasher = sha2::Sha256::default();
        sha2::Digest::update(&mut hasher, self.previous_hash.as_bytes());
        sha2::Digest::update(&mut hasher, &canonical);
        self.record_hash = format!("{:x}", sha2::Digest::finalize(hasher));
        self
    }

    /// Returns true if `self.previous_hash` matches `previous.record_hash`,
    /// i.e. `self` correctly extends the chain from `previous`.
    #[must_use]
    pub fn extends(&self, previous: &Self) -> bool {
        self.previous_hash == previous.record_hash
    }
}

/// An opaque JSON value an agent may attach to [`AuditContext::evidence_refs`]
/// resolution; kept for forwards compatibility with richer evidence shapes.
pub type EvidenceValue = Value;

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions are permitted."
)]
mod tests {
    use super::*;

    fn record(seq: u64, previous_hash: &str) -> AuditRecord {
        AuditRecord {
            audit_id: AuditId::new("a1"),
            tenant_id: TenantId::new("t1"),
            sequence_number: seq,
            previous_hash: previous_hash.to_string(),
            timestamp: Timestamp::parse("2026-01-01T00:00:00Z").expect("parse"),
            event_type: EventTaxonomy::AlertClassified,
            event_category: EventTaxonomy::AlertClassified.category(),
            severity: AuditSeverity::Info,
            actor_type: ActorType::Agent,
            actor_id: "reasoning_agent".to_string(),
            investigation_id: None,
            alert_id: None,
            context: AuditContext::default(),
            decision: AuditDecision::default(),
            outcome: AuditOutcome::default(),
            record_hash: String::new(),
        }
    }

    #[test]
    fn sealed_record_has_nonempty_hash() {
        let sealed = record(0, "").sealed();
        assert!(!sealed.record_hash.is_empty());
    }

    #[test]
    fn chained_record_extends_its_predecessor() {
        let genesis = record(0, "").sealed();
        let mut next = record(1, &genesis.record_hash);
        next = next.sealed();
        assert!(next.extends(&genesis));
    }

    #[test]
    fn tampered_previous_hash_breaks_the_chain() {
        let genesis = record(0, "").sealed();
        let mut next = record(1, "not-the-real-hash");
        next = next.sealed();
        assert!(!next.extends(&genesis));
    }
}
