// warden-orchestrator/src/agents.rs
// ============================================================================
// Module: Per-Role Agent Traits
// Description: One narrow async trait per graph stage, each returning a
//              typed delta or a typed error.
// Purpose: Give every stage a seam an implementation (LLM-backed or a
//          test double) can fill in without seeing or mutating the
//          decision chain — only the orchestrator appends to it.
// Dependencies: async-trait, warden-core
// ============================================================================

//! ## Overview
//! Each trait here corresponds to one [`warden_core::AgentRole`] variant.
//! Agents accept an immutable investigation snapshot and hand back a delta;
//! the orchestrator is the only thing that merges deltas into the durable
//! investigation record and appends decision entries. This is the
//! Rust-native stand-in for duck-typed agent references in the source this
//! engine was modelled on: a narrow trait per role instead of one untyped
//! `Any` reference threaded through every stage.

use async_trait::async_trait;
use serde_json::Value;
use warden_core::AtlasDetection;
use warden_core::Investigation;
use warden_core::RecommendedAction;
use warden_core::RiskState;
use warden_core::Severity;
use warden_core::Timestamp;

use crate::error::AgentError;

// ============================================================================
// SECTION: Deltas
// ============================================================================

/// Delta produced by IOC extraction.
#[derive(Debug, Clone, Default)]
pub struct IocExtractionDelta {
    /// Indicator-of-compromise enrichment results.
    pub ioc_matches: Vec<Value>,
    /// Gateway calls consumed producing this delta.
    pub llm_calls: u32,
    /// Gateway cost (USD) consumed producing this delta.
    pub cost_usd: f64,
}

/// Delta produced by the context enricher (behavioural baseline lookup plus
/// vector-similarity search against prior incidents).
#[derive(Debug, Clone, Default)]
pub struct ContextEnrichmentDelta {
    /// Behavioural/UEBA context results.
    pub ueba_context: Vec<Value>,
    /// Similar-incident matches from vector search.
    pub similar_incidents: Vec<Value>,
    /// Aggregate risk state this agent observed, if any.
    pub risk_state: Option<RiskState>,
    /// Lookup queries executed producing this delta.
    pub queries_executed: u32,
}

/// Delta produced by the CTEM (continuous threat exposure) correlator.
#[derive(Debug, Clone, Default)]
pub struct CtemCorrelationDelta {
    /// Exposure-correlation results.
    pub ctem_exposures: Vec<Value>,
    /// Lookup queries executed producing this delta.
    pub queries_executed: u32,
}

/// Delta produced by the adversarial-ML (ATLAS) mapper.
#[derive(Debug, Clone, Default)]
pub struct AtlasMappingDelta {
    /// Adversarial-ML technique detections.
    pub atlas_techniques: Vec<AtlasDetection>,
    /// Lookup queries executed producing this delta.
    pub queries_executed: u32,
}

/// Outcome produced by the reasoning agent (and, if escalated, its second pass).
#[derive(Debug, Clone)]
pub struct ReasoningOutcome {
    /// Final or working classification (e.g. `"true_positive"`).
    pub classification: String,
    /// Confidence in `[0, 1]`.
    pub confidence: f64,
    /// Severity assigned by the reasoning pass, if any.
    pub severity: Option<Severity>,
    /// Recommended response actions.
    pub recommended_actions: Vec<RecommendedAction>,
    /// Free-text rationale, retained for the decision chain.
    pub reasoning: String,
    /// Gateway calls consumed producing this outcome (1, or 2 if escalated).
    pub llm_calls: u32,
    /// Gateway cost (USD) consumed producing this outcome.
    pub cost_usd: f64,
}

/// Outcome produced by the response agent's playbook selection and dispatch.
#[derive(Debug, Clone, Default)]
pub struct ResponseOutcome {
    /// Selected playbook matches.
    pub playbook_matches: Vec<Value>,
    /// Action labels actually dispatched (tier 0/1 actions executed now;
    /// tier 2 actions dispatched only after approval).
    pub dispatched_actions: Vec<String>,
}

// ============================================================================
// SECTION: Agent Traits
// ============================================================================

/// Extracts indicators of compromise via a Tier-0 Gateway call.
#[async_trait]
pub trait IocExtractorAgent: Send + Sync {
    /// Produces an IOC-extraction delta for `investigation` as of `now`.
    async fn extract(&self, investigation: &Investigation, now: Timestamp) -> Result<IocExtractionDelta, AgentError>;
}

/// Looks up threat-intel and behavioural context, plus similar prior incidents.
#[async_trait]
pub trait ContextEnricherAgent: Send + Sync {
    /// Produces a context-enrichment delta for `investigation` as of `now`.
    async fn enrich(&self, investigation: &Investigation, now: Timestamp) -> Result<ContextEnrichmentDelta, AgentError>;
}

/// Correlates exposure data from the continuous threat exposure store.
#[async_trait]
pub trait CtemCorrelatorAgent: Send + Sync {
    /// Produces a CTEM-correlation delta for `investigation` as of `now`.
    async fn correlate(&self, investigation: &Investigation, now: Timestamp) -> Result<CtemCorrelationDelta, AgentError>;
}

/// Maps adversarial-ML (ATLAS) technique detections.
#[async_trait]
pub trait AtlasMapperAgent: Send + Sync {
    /// Produces an ATLAS-mapping delta for `investigation` as of `now`.
    async fn map(&self, investigation: &Investigation, now: Timestamp) -> Result<AtlasMappingDelta, AgentError>;
}

/// Produces the final classification via a Tier-1 Gateway call, with
/// optional escalation to a higher-capability model.
#[async_trait]
pub trait ReasoningAgent: Send + Sync {
    /// Runs the first reasoning pass over `investigation` as of `now`.
    async fn reason(&self, investigation: &Investigation, now: Timestamp) -> Result<ReasoningOutcome, AgentError>;

    /// Runs the escalated (higher-capability) reasoning pass.
    async fn reason_escalated(&self, investigation: &Investigation, now: Timestamp) -> Result<ReasoningOutcome, AgentError>;
}

/// Selects a playbook and dispatches actions.
#[async_trait]
pub trait ResponseAgent: Send + Sync {
    /// Selects a playbook for `investigation` and dispatches `actions`. The
    /// orchestrator has already filtered `actions` down to those not yet
    /// recorded in the decision chain, so every call this trait receives is
    /// safe to execute without the agent re-deriving idempotency itself.
    async fn respond(&self, investigation: &Investigation, actions: &[RecommendedAction], now: Timestamp) -> Result<ResponseOutcome, AgentError>;
}
