// warden-gateway/src/config.rs
// ============================================================================
// Module: Gateway Configuration
// Description: Tunables for one ContextGateway instance.
// Purpose: Keep every knob (spend limits, default model/provider, taxonomy
//          version stamped onto audit events) in one place.
// Dependencies: warden-core
// ============================================================================

use std::collections::BTreeMap;

use warden_core::DEFAULT_MONTHLY_HARD_CAP;
use warden_core::DEFAULT_MONTHLY_SOFT_ALERT;

use crate::prompt_adapter::LlmProvider;

/// Default max-context budget, in tokens, for a tier-0 Gateway call.
pub const DEFAULT_CONTEXT_BUDGET_TIER_0: u32 = 4096;
/// Default max-context budget, in tokens, for a tier-1 Gateway call.
pub const DEFAULT_CONTEXT_BUDGET_TIER_1: u32 = 8192;
/// Default max-context budget, in tokens, for a tier-1+/tier-2 Gateway call.
pub const DEFAULT_CONTEXT_BUDGET_TIER_2: u32 = 16384;

/// Configuration for one [`crate::gateway::ContextGateway`] instance.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Provider this Gateway instance dispatches to.
    pub provider: LlmProvider,
    /// Default model identifier used when a request does not pin one.
    pub default_model: String,
    /// Model tier label stamped onto routing audit events (e.g. `"tier0"`).
    pub model_tier: String,
    /// Monthly hard spend cap in USD.
    pub monthly_hard_cap_usd: f64,
    /// Monthly soft-alert spend threshold in USD.
    pub monthly_soft_alert_usd: f64,
    /// Event-taxonomy version stamped onto emitted audit events.
    pub taxonomy_version: String,
    /// Max-context budget, in tokens, keyed by call tier. A tier above the
    /// highest configured key falls back to that key's budget (tier 2 is
    /// the ceiling: tier 1+ escalated calls share its budget).
    pub context_budget_by_tier: BTreeMap<u8, u32>,
}

impl GatewayConfig {
    /// Builds a config for `provider` with Warden's default spend limits.
    #[must_use]
    pub fn new(provider: LlmProvider, default_model: impl Into<String>) -> Self {
        Self {
            provider,
            default_model: default_model.into(),
            model_tier: "tier0".to_string(),
            monthly_hard_cap_usd: DEFAULT_MONTHLY_HARD_CAP,
            monthly_soft_alert_usd: DEFAULT_MONTHLY_SOFT_ALERT,
            taxonomy_version: String::new(),
            context_budget_by_tier: default_context_budget_by_tier(),
        }
    }

    /// Returns the max-context budget, in tokens, for `tier`. Tiers above 2
    /// share tier 2's budget.
    #[must_use]
    pub fn context_budget_for_tier(&self, tier: u8) -> u32 {
        let clamped = tier.min(2);
        self.context_budget_by_tier.get(&clamped).copied().unwrap_or(DEFAULT_CONTEXT_BUDGET_TIER_0)
    }
}

fn default_context_budget_by_tier() -> BTreeMap<u8, u32> {
    BTreeMap::from([(0, DEFAULT_CONTEXT_BUDGET_TIER_0), (1, DEFAULT_CONTEXT_BUDGET_TIER_1), (2, DEFAULT_CONTEXT_BUDGET_TIER_2)])
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
    fn context_budget_matches_tier_and_clamps_above_tier_two() {
        let config = GatewayConfig::new(LlmProvider::Anthropic, "claude-sonnet-4-5-20250929");
        assert_eq!(config.context_budget_for_tier(0), DEFAULT_CONTEXT_BUDGET_TIER_0);
        assert_eq!(config.context_budget_for_tier(1), DEFAULT_CONTEXT_BUDGET_TIER_1);
        assert_eq!(config.context_budget_for_tier(2), DEFAULT_CONTEXT_BUDGET_TIER_2);
        assert_eq!(config.context_budget_for_tier(9), DEFAULT_CONTEXT_BUDGET_TIER_2);
    }

    #[test]
    fn new_applies_default_spend_limits() {
        let config = GatewayConfig::new(LlmProvider::Anthropic, "claude-sonnet-4-5-20250929");
        assert_eq!(config.monthly_hard_cap_usd, DEFAULT_MONTHLY_HARD_CAP);
        assert_eq!(config.monthly_soft_alert_usd, DEFAULT_MONTHLY_SOFT_ALERT);
    }
}
