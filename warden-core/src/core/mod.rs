// warden-core/src/core/mod.rs
// ============================================================================
// Module: Warden Core Types
// Description: Canonical Warden data model shared across all crates.
// Purpose: Provide stable, serializable types for alerts, investigations,
//          governance, and audit.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! Warden core types define the alert and investigation schema, the
//! entity bundle, the governed false-positive pattern and kill switch
//! shapes, tenant configuration, spend accounting, and incident scoring.
//! These types are the canonical source of truth consumed by every other
//! crate in the workspace.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod alert;
pub mod entity;
pub mod fp_pattern;
pub mod identifiers;
pub mod investigation;
pub mod kill_switch;
pub mod redaction;
pub mod scoring;
pub mod spend;
pub mod tenant_config;
pub mod time;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use alert::CanonicalAlert;
pub use alert::Severity;
pub use entity::EntityBundle;
pub use entity::EntityType;
pub use entity::NormalizedEntity;
pub use fp_pattern::EXPIRY_DAYS;
pub use fp_pattern::EntityPattern;
pub use fp_pattern::FP_CONFIDENCE_THRESHOLD;
pub use fp_pattern::FpApprovalError;
pub use fp_pattern::FpPattern;
pub use fp_pattern::FpPatternStatus;
pub use fp_pattern::Scope;
pub use identifiers::AlertId;
pub use identifiers::AuditId;
pub use identifiers::CorrelationId;
pub use identifiers::EntityId;
pub use identifiers::InvestigationId;
pub use identifiers::PatternId;
pub use identifiers::TenantId;
pub use investigation::AgentRole;
pub use investigation::AtlasDetection;
pub use investigation::DecisionEntry;
pub use investigation::Investigation;
pub use investigation::InvestigationState;
pub use investigation::RecommendedAction;
pub use investigation::RiskState;
pub use investigation::TelemetryTrustLevel;
pub use kill_switch::KillSwitch;
pub use kill_switch::KillSwitchDimension;
pub use kill_switch::is_killed;
pub use redaction::RedactionMap;
pub use scoring::ALPHA_VECTOR_SIMILARITY;
pub use scoring::BETA_RECENCY;
pub use scoring::DELTA_TECHNIQUE_OVERLAP;
pub use scoring::GAMMA_TENANT_MATCH;
pub use scoring::IncidentScore;
pub use scoring::LAMBDA_RECENCY_DECAY;
pub use scoring::score_incident;
pub use spend::BudgetStatus;
pub use spend::DEFAULT_MONTHLY_HARD_CAP;
pub use spend::DEFAULT_MONTHLY_SOFT_ALERT;
pub use spend::SpendRecord;
pub use spend::classify_budget;
pub use tenant_config::ShadowModeStillRequired;
pub use tenant_config::TenantConfig;
pub use time::Timestamp;
