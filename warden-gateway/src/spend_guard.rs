// warden-gateway/src/spend_guard.rs
// ============================================================================
// Module: Spend Guard
// Description: Enforces monthly cost limits and aggregates per-call costs
//              by model, task type, and tenant.
// Purpose: Block a dispatch before it happens once the hard cap is hit;
//          warn once when the soft-alert threshold is crossed.
// Dependencies: warden-core::spend, thiserror
// ============================================================================

//! ## Overview
//! [`SpendGuard`] accumulates [`SpendRecord`]s and answers budget questions
//! against an explicit `now`, never an internal clock, so tests are
//! deterministic. The hard cap is enforced on the way *in*
//! ([`SpendGuard::check_budget`]) — an in-flight call is always allowed to
//! finish and be recorded even if it pushes spend past the cap. The soft
//! alert fires exactly once per guard lifetime via
//! [`SpendGuard::record`].

use std::collections::HashMap;

use thiserror::Error;
use warden_core::BudgetStatus;
use warden_core::SpendRecord;
use warden_core::TenantId;
use warden_core::Timestamp;
use warden_core::classify_budget;

/// Error returned when a call would be placed while the hard cap is reached.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("monthly spend ${monthly_total:.2} exceeds hard cap ${hard_cap:.2}")]
pub struct SpendLimitExceeded {
    /// Spend recorded so far this month.
    pub monthly_total: f64,
    /// The configured hard cap.
    pub hard_cap: f64,
}

/// Tracks spend for one tenant-scoped Gateway instance and enforces limits.
#[derive(Debug, Clone)]
pub struct SpendGuard {
    monthly_hard_cap: f64,
    monthly_soft_alert: f64,
    records: Vec<SpendRecord>,
    soft_alert_fired: bool,
}

impl SpendGuard {
    /// Builds a guard with the given monthly hard cap and soft-alert threshold.
    #[must_use]
    pub const fn new(monthly_hard_cap: f64, monthly_soft_alert: f64) -> Self {
        Self { monthly_hard_cap, monthly_soft_alert, records: Vec::new(), soft_alert_fired: false }
    }

    /// Records a completed API call and checks the soft-alert threshold.
    /// Returns `true` the first time this call's recording crosses the
    /// soft-alert threshold, `false` otherwise (including every call after
    /// the first crossing).
    pub fn record(&mut self, record: SpendRecord, now: &Timestamp) -> bool {
        self.records.push(record);
        if !self.soft_alert_fired && self.monthly_total(now) >= self.monthly_soft_alert {
            self.soft_alert_fired = true;
            return true;
        }
        false
    }

    /// Returns an error if the hard cap has already been reached as of `now`.
    ///
    /// # Errors
    ///
    /// Returns [`SpendLimitExceeded`] if monthly spend is at or above the hard cap.
    pub fn check_budget(&self, now: &Timestamp) -> Result<(), SpendLimitExceeded> {
        let total = self.monthly_total(now);
        if classify_budget(total, self.monthly_hard_cap, self.monthly_soft_alert) == BudgetStatus::HardCapped {
            return Err(SpendLimitExceeded { monthly_total: total, hard_cap: self.monthly_hard_cap });
        }
        Ok(())
    }

    /// Total spend recorded within the same calendar month (UTC) as `now`.
    #[must_use]
    pub fn monthly_total(&self, now: &Timestamp) -> f64 {
        let now = now.as_offset_date_time();
        self.records
            .iter()
            .filter(|r| {
                let at = r.timestamp.as_offset_date_time();
                at.year() == now.year() && at.month() == now.month()
            })
            .map(|r| r.cost_usd)
            .sum()
    }

    /// Aggregate spend per model.
    #[must_use]
    pub fn total_by_model(&self) -> HashMap<String, f64> {
        let mut totals = HashMap::new();
        for record in &self.records {
            *totals.entry(record.model.clone()).or_insert(0.0) += record.cost_usd;
        }
        totals
    }

    /// Aggregate spend per tenant.
    #[must_use]
    pub fn total_by_tenant(&self) -> HashMap<TenantId, f64> {
        let mut totals = HashMap::new();
        for record in &self.records {
            *totals.entry(record.tenant_id.clone()).or_insert(0.0) += record.cost_usd;
        }
        totals
    }

    /// Number of calls recorded so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.records.len()
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions are permitted."
)]
mod tests {
    use time::macros::datetime;

    use super::*;

    fn record(tenant: &str, model: &str, cost_usd: f64, at: Timestamp) -> SpendRecord {
        SpendRecord { tenant_id: TenantId::new(tenant), model: model.to_string(), input_tokens: 100, output_tokens: 50, cost_usd, timestamp: at }
    }

    #[test]
    fn check_budget_passes_below_hard_cap() {
        let guard = SpendGuard::new(1000.0, 500.0);
        let now = Timestamp::new(datetime!(2026 - 07 - 28 00:00:00 UTC));
        assert!(guard.check_budget(&now).is_ok());
    }

    #[test]
    fn check_budget_fails_at_hard_cap() {
        let mut guard = SpendGuard::new(100.0, 50.0);
        let now = Timestamp::new(datetime!(2026 - 07 - 28 00:00:00 UTC));
        guard.record(record("t1", "claude", 150.0, now), &now);
        assert!(guard.check_budget(&now).is_err());
    }

    #[test]
    fn soft_alert_fires_exactly_once() {
        let mut guard = SpendGuard::new(1000.0, 100.0);
        let now = Timestamp::new(datetime!(2026 - 07 - 28 00:00:00 UTC));
        assert!(guard.record(record("t1", "claude", 60.0, now), &now));
        assert!(!guard.record(record("t1", "claude", 60.0, now), &now));
    }

    #[test]
    fn spend_outside_current_month_is_excluded() {
        let mut guard = SpendGuard::new(1000.0, 500.0);
        let last_month = Timestamp::new(datetime!(2026 - 06 - 28 00:00:00 UTC));
        let now = Timestamp::new(datetime!(2026 - 07 - 28 00:00:00 UTC));
        guard.record(record("t1", "claude", 900.0, last_month), &now);
        assert_eq!(guard.monthly_total(&now), 0.0);
    }

    #[test]
    fn totals_aggregate_by_model_and_tenant() {
        let mut guard = SpendGuard::new(1000.0, 500.0);
        let now = Timestamp::new(datetime!(2026 - 07 - 28 00:00:00 UTC));
        guard.record(record("t1", "claude", 10.0, now), &now);
        guard.record(record("t2", "gpt", 20.0, now), &now);
        assert_eq!(guard.total_by_model().get("claude"), Some(&10.0));
        assert_eq!(guard.total_by_tenant().get(&TenantId::new("t2")), Some(&20.0));
        assert_eq!(guard.call_count(), 2);
    }
}
