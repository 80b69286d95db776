// warden-orchestrator/src/lib.rs
// ============================================================================
// Module: Warden Orchestrator Library
// Description: Public API surface for the investigation orchestrator.
// Purpose: The single place that drives an alert through the investigation
//          graph and the only thing that appends to an investigation's
//          decision chain.
// Dependencies: crate::{agents, approval, config, engine, error, merge,
//               repository}
// ============================================================================

//! ## Overview
//! Warden Orchestrator ties together the per-role agent traits in
//! [`agents`], the explicit storage/governance collaborators in
//! [`repository`], and the approval-gate deadline math in [`approval`]
//! behind [`engine::InvestigationOrchestrator`], the engine that runs
//! `Run` and `ResumeFromApproval`.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod agents;
pub mod approval;
pub mod config;
pub mod engine;
pub mod error;
pub mod merge;
pub mod repository;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use agents::AtlasMapperAgent;
pub use agents::AtlasMappingDelta;
pub use agents::ContextEnricherAgent;
pub use agents::ContextEnrichmentDelta;
pub use agents::CtemCorrelationDelta;
pub use agents::CtemCorrelatorAgent;
pub use agents::IocExtractionDelta;
pub use agents::IocExtractorAgent;
pub use agents::ReasoningAgent;
pub use agents::ReasoningOutcome;
pub use agents::ResponseAgent;
pub use agents::ResponseOutcome;
pub use approval::ApprovalGate;
pub use approval::sweep_expired;
pub use config::OrchestratorConfig;
pub use engine::InvestigationOrchestrator;
pub use error::AgentError;
pub use error::OrchestratorError;
pub use merge::merge_atlas;
pub use merge::merge_context;
pub use merge::merge_ctem;
pub use repository::GovernanceView;
pub use repository::InvestigationRepository;
