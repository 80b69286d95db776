// warden-orchestrator/src/error.rs
// ============================================================================
// Module: Orchestrator Errors
// Description: The orchestrator's boundary error taxonomy.
// Purpose: One enum composing every collaborator's error so the graph
//          boundary can decide fail-soft vs. fail-terminal with one match.
// Dependencies: thiserror, warden-audit, warden-core, warden-gateway,
//               warden-governance
// ============================================================================

use thiserror::Error;
use warden_core::InvestigationId;
use warden_gateway::GatewayError;

/// An agent-level error, returned by any per-role agent trait.
#[derive(Debug, Clone, Error)]
pub enum AgentError {
    /// The underlying Gateway call failed (spend cap, LLM failure, ...).
    #[error("gateway call failed: {0}")]
    Gateway(#[from] GatewayError),
    /// A downstream lookup (cache, store, correlation engine) failed.
    #[error("lookup failed: {0}")]
    Lookup(String),
}

/// Top-level orchestrator error.
#[derive(Debug, Clone, Error)]
pub enum OrchestratorError {
    /// The reasoning stage failed; the investigation cannot proceed.
    #[error("reasoning stage failed for investigation {investigation_id}: {source}")]
    ReasoningFailed {
        /// The investigation whose reasoning stage failed.
        investigation_id: InvestigationId,
        /// The underlying agent error.
        source: AgentError,
    },
    /// The IOC extraction stage failed; the investigation cannot proceed.
    #[error("ioc extraction failed for investigation {investigation_id}: {source}")]
    IocExtractionFailed {
        /// The investigation whose IOC extraction failed.
        investigation_id: InvestigationId,
        /// The underlying agent error.
        source: AgentError,
    },
    /// The response stage failed after approval; the investigation cannot close cleanly.
    #[error("response stage failed for investigation {investigation_id}: {source}")]
    ResponseFailed {
        /// The investigation whose response stage failed.
        investigation_id: InvestigationId,
        /// The underlying agent error.
        source: AgentError,
    },
    /// A call to the durable investigation repository failed.
    #[error("investigation repository error: {0}")]
    Repository(String),
    /// `ResumeFromApproval` was called on an investigation not awaiting one.
    #[error("investigation {0} is not awaiting human approval")]
    NotAwaitingApproval(InvestigationId),
    /// `Run` or `ResumeFromApproval` was called for an investigation id not found.
    #[error("investigation {0} not found")]
    NotFound(InvestigationId),
}
