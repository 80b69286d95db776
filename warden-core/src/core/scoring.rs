// warden-core/src/core/scoring.rs
// ============================================================================
// Module: Incident Similarity Scoring
// Description: Composite score combining vector similarity, recency,
//              tenant match, and technique overlap.
// Purpose: Rank similar-incident candidates for the context enricher and
//          the reasoning agent.
// Dependencies: none (pure arithmetic over f64)
// ============================================================================

//! ## Overview
//! `composite = α·vector_similarity + β·recency_decay + γ·tenant_match +
//! δ·technique_overlap`, with weights fixed at the values below and
//! `recency_decay = exp(-λ·age_days)`. These constants are a contract: any
//! change to them changes which prior incidents outrank others, so they are
//! named, not inlined.

use serde::Deserialize;
use serde::Serialize;

/// Weight applied to vector (embedding) similarity.
pub const ALPHA_VECTOR_SIMILARITY: f64 = 0.4;
/// Weight applied to recency decay.
pub const BETA_RECENCY: f64 = 0.3;
/// Weight applied to tenant match.
pub const GAMMA_TENANT_MATCH: f64 = 0.15;
/// Weight applied to technique overlap.
pub const DELTA_TECHNIQUE_OVERLAP: f64 = 0.15;
/// Recency decay rate.
pub const LAMBDA_RECENCY_DECAY: f64 = 0.023;

// ============================================================================
// SECTION: Incident Score
// ============================================================================

/// The components and composite of a single incident's similarity score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IncidentScore {
    /// Cosine similarity between the candidate and query embeddings, in `[0, 1]`.
    pub vector_similarity: f64,
    /// Age of the candidate incident in days.
    pub age_days: f64,
    /// Whether the candidate incident belongs to the same tenant.
    pub tenant_match: bool,
    /// Fraction of MITRE techniques shared between candidate and query, in `[0, 1]`.
    pub technique_overlap: f64,
    /// The computed composite score.
    pub composite: f64,
}

/// Computes the composite similarity score for a single candidate incident.
#[must_use]
pub fn score_incident(vector_similarity: f64, age_days: f64, tenant_match: bool, technique_overlap: f64) -> IncidentScore {
    let recency_decay = (-LAMBDA_RECENCY_DECAY * age_days).exp();
    let tenant_term = if tenant_match { 1.0 } else { 0.0 };
    let composite = ALPHA_VECTOR_SIMILARITY * vector_similarity
        + BETA_RECENCY * recency_decay
        + GAMMA_TENANT_MATCH * tenant_term
        + DELTA_TECHNIQUE_OVERLAP * technique_overlap;
    IncidentScore { vector_similarity, age_days, tenant_match, technique_overlap, composite }
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
    fn perfect_match_at_zero_age_scores_one() {
        let score = score_incident(1.0, 0.0, true, 1.0);
        assert!((score.composite - 1.0).abs() < 1e-9);
    }

    #[test]
    fn recency_decays_monotonically_with_age() {
        let fresh = score_incident(0.5, 0.0, false, 0.0);
        let stale = score_incident(0.5, 365.0, false, 0.0);
        assert!(fresh.composite > stale.composite);
    }

    #[test]
    fn tenant_mismatch_strictly_lowers_score() {
        let matched = score_incident(0.5, 10.0, true, 0.5);
        let unmatched = score_incident(0.5, 10.0, false, 0.5);
        assert!(matched.composite > unmatched.composite);
        assert!((matched.composite - unmatched.composite - GAMMA_TENANT_MATCH).abs() < 1e-9);
    }
}
