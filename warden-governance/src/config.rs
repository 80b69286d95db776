// warden-governance/src/config.rs
// ============================================================================
// Module: Governance Configuration
// Description: Tunables shared by the FP matcher, canary, and shadow-mode
//              managers.
// Purpose: Keep every threshold in one place instead of scattered literals.
// Dependencies: crate::canary, crate::shadow_mode
// ============================================================================

use crate::canary::DEFAULT_MAX_DISAGREEMENT_RATE;
use crate::canary::DEFAULT_PROMOTION_THRESHOLD;
use crate::shadow_mode::GoLiveCriteria;
use warden_core::FP_CONFIDENCE_THRESHOLD;

/// Configuration for one governance-crate deployment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GovernanceConfig {
    /// Minimum blended confidence required to short-circuit an alert as a
    /// known false positive.
    pub fp_confidence_threshold: f64,
    /// Minimum number of shadow decisions before a canarying pattern is
    /// considered for promotion.
    pub canary_promotion_threshold: u32,
    /// Maximum disagreement rate tolerated for canary promotion.
    pub canary_max_disagreement_rate: f64,
    /// Criteria a tenant's shadow-mode history must clear before go-live.
    pub go_live_criteria: GoLiveCriteria,
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            fp_confidence_threshold: FP_CONFIDENCE_THRESHOLD,
            canary_promotion_threshold: DEFAULT_PROMOTION_THRESHOLD,
            canary_max_disagreement_rate: DEFAULT_MAX_DISAGREEMENT_RATE,
            go_live_criteria: GoLiveCriteria::default(),
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
    fn default_matches_documented_thresholds() {
        let config = GovernanceConfig::default();
        assert!((config.fp_confidence_threshold - 0.90).abs() < f64::EPSILON);
        assert_eq!(config.canary_promotion_threshold, 50);
        assert!((config.canary_max_disagreement_rate - 0.05).abs() < f64::EPSILON);
        assert!((config.go_live_criteria.min_agreement_rate - 0.95).abs() < f64::EPSILON);
    }
}
