// warden-core/src/core/spend.rs
// ============================================================================
// Module: Spend Tracking
// Description: Per-tenant LLM spend records and budget constants.
// Purpose: Shared shape used by the Gateway's budget guard and metrics.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Every Gateway LLM call is metered and recorded as a [`SpendRecord`]. The
//! budget guard checks cumulative monthly spend strictly before dispatch;
//! an in-flight call is always allowed to complete even if it pushes spend
//! past the hard cap.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::TenantId;
use crate::core::time::Timestamp;

/// Default monthly hard cap in USD, above which new calls are blocked.
pub const DEFAULT_MONTHLY_HARD_CAP: f64 = 1000.0;

/// Default monthly soft-alert threshold in USD.
pub const DEFAULT_MONTHLY_SOFT_ALERT: f64 = 500.0;

// ============================================================================
// SECTION: Spend Record
// ============================================================================

/// A single metered LLM call's cost accounting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpendRecord {
    /// Tenant the call was made on behalf of.
    pub tenant_id: TenantId,
    /// Provider/model identifier (e.g. `"claude-3-5-sonnet"`), opaque to this crate.
    pub model: String,
    /// Input token count.
    pub input_tokens: u64,
    /// Output token count.
    pub output_tokens: u64,
    /// Computed cost of this call in USD.
    pub cost_usd: f64,
    /// When the call completed.
    pub timestamp: Timestamp,
}

/// Budget posture for a tenant at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetStatus {
    /// Spend is below the soft-alert threshold.
    Normal,
    /// Spend is at or above the soft-alert threshold but below the hard cap.
    SoftAlert,
    /// Spend is at or above the hard cap; new calls must be refused.
    HardCapped,
}

/// Classifies `spend_to_date` against the given thresholds.
#[must_use]
pub fn classify_budget(spend_to_date: f64, hard_cap: f64, soft_alert: f64) -> BudgetStatus {
    if spend_to_date >= hard_cap {
        BudgetStatus::HardCapped
    } else if spend_to_date >= soft_alert {
        BudgetStatus::SoftAlert
    } else {
        BudgetStatus::Normal
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
    fn below_soft_alert_is_normal() {
        assert_eq!(
            classify_budget(100.0, DEFAULT_MONTHLY_HARD_CAP, DEFAULT_MONTHLY_SOFT_ALERT),
            BudgetStatus::Normal
        );
    }

    #[test]
    fn at_soft_alert_is_soft_alert() {
        assert_eq!(
            classify_budget(500.0, DEFAULT_MONTHLY_HARD_CAP, DEFAULT_MONTHLY_SOFT_ALERT),
            BudgetStatus::SoftAlert
        );
    }

    #[test]
    fn at_hard_cap_is_hard_capped() {
        assert_eq!(
            classify_budget(1000.0, DEFAULT_MONTHLY_HARD_CAP, DEFAULT_MONTHLY_SOFT_ALERT),
            BudgetStatus::HardCapped
        );
    }
}
