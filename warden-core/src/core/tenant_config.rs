// warden-core/src/core/tenant_config.rs
// ============================================================================
// Module: Tenant Configuration
// Description: Per-tenant runtime configuration for the investigation graph.
// Purpose: Centralise the knobs a tenant can tune without code changes.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Loading a [`TenantConfig`] from disk or a config service is out of
//! scope for this crate (see the supplemented Non-goals); this module only
//! defines the in-process shape every crate agrees on.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::TenantId;
use crate::core::spend::DEFAULT_MONTHLY_HARD_CAP;
use crate::core::spend::DEFAULT_MONTHLY_SOFT_ALERT;

/// Default approval-gate deadline, in hours, absent a tenant override.
pub const DEFAULT_APPROVAL_TIMEOUT_HOURS: i64 = 4;

// ============================================================================
// SECTION: Tenant Config
// ============================================================================

/// Per-tenant configuration for budget, shadow mode, and escalation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenantConfig {
    /// Tenant this configuration applies to.
    pub tenant_id: TenantId,
    /// Monthly hard cap in USD above which Gateway calls are refused.
    #[serde(default = "default_hard_cap")]
    pub monthly_hard_cap_usd: f64,
    /// Monthly soft-alert threshold in USD.
    #[serde(default = "default_soft_alert")]
    pub monthly_soft_alert_usd: f64,
    /// Whether FP governance is operating in shadow mode for this tenant.
    /// Shadow mode and kill-switch enforcement are mutually exclusive: a
    /// tenant in shadow mode never has live kill switches enforced, because
    /// nothing it decides is enforced yet. New tenants default to shadow
    /// mode; [`Self::disable_shadow_mode`] is the only way out.
    #[serde(default = "default_shadow_mode")]
    pub shadow_mode: bool,
    /// Confidence threshold below which escalation to a second reasoning
    /// pass is triggered for `critical`/`high` severity alerts.
    #[serde(default = "default_escalation_confidence")]
    pub escalation_confidence_threshold: f64,
    /// Whether an operator has recorded sign-off on this tenant's shadow-mode
    /// go-live criteria. `shadow_mode` cannot be cleared until this is set.
    #[serde(default)]
    pub go_live_signed_off: bool,
    /// Approval-gate deadline overrides in hours, keyed by action tier.
    /// A tier absent from this map uses [`DEFAULT_APPROVAL_TIMEOUT_HOURS`].
    #[serde(default)]
    pub approval_timeout_overrides: BTreeMap<u8, i64>,
}

fn default_hard_cap() -> f64 {
    DEFAULT_MONTHLY_HARD_CAP
}

fn default_soft_alert() -> f64 {
    DEFAULT_MONTHLY_SOFT_ALERT
}

fn default_escalation_confidence() -> f64 {
    0.6
}

fn default_shadow_mode() -> bool {
    true
}

impl TenantConfig {
    /// Builds a tenant config with every default applied.
    #[must_use]
    pub fn new(tenant_id: TenantId) -> Self {
        Self {
            tenant_id,
            monthly_hard_cap_usd: default_hard_cap(),
            monthly_soft_alert_usd: default_soft_alert(),
            shadow_mode: default_shadow_mode(),
            escalation_confidence_threshold: default_escalation_confidence(),
            go_live_signed_off: false,
            approval_timeout_overrides: BTreeMap::new(),
        }
    }

    /// Returns the approval-gate deadline, in hours, for `tier`: the
    /// tenant's override if one is configured, else
    /// [`DEFAULT_APPROVAL_TIMEOUT_HOURS`].
    #[must_use]
    pub fn approval_timeout_hours(&self, tier: u8) -> i64 {
        self.approval_timeout_overrides.get(&tier).copied().unwrap_or(DEFAULT_APPROVAL_TIMEOUT_HOURS)
    }

    /// Returns true if an alert with the given confidence and severity
    /// eligibility should be escalated to a second reasoning pass.
    #[must_use]
    pub fn should_escalate(&self, confidence: f64, severity_escalation_eligible: bool) -> bool {
        severity_escalation_eligible && confidence < self.escalation_confidence_threshold
    }

    /// Returns true if kill switches should be enforced for this tenant.
    /// Shadow-mode tenants never enforce kill switches; nothing is live yet.
    #[must_use]
    pub const fn enforces_kill_switches(&self) -> bool {
        !self.shadow_mode
    }

    /// Attempts to take this tenant out of shadow mode. Refused unless
    /// [`Self::go_live_signed_off`] is already `true`: clearing shadow mode
    /// is a one-way door a config loader must not be able to flip on a whim.
    ///
    /// # Errors
    ///
    /// Returns [`ShadowModeStillRequired`] if sign-off has not been recorded.
    pub fn disable_shadow_mode(&mut self) -> Result<(), ShadowModeStillRequired> {
        if !self.go_live_signed_off {
            return Err(ShadowModeStillRequired);
        }
        self.shadow_mode = false;
        Ok(())
    }
}

/// Returned when a caller tries to clear shadow mode before go-live sign-off
/// has been recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("shadow mode cannot be disabled before go-live sign-off is recorded")]
pub struct ShadowModeStillRequired;

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions are permitted."
)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_budget_constants() {
        let config = TenantConfig::new(TenantId::new("t1"));
        assert_eq!(config.monthly_hard_cap_usd, DEFAULT_MONTHLY_HARD_CAP);
        assert_eq!(config.monthly_soft_alert_usd, DEFAULT_MONTHLY_SOFT_ALERT);
    }

    #[test]
    fn low_confidence_high_severity_escalates() {
        let config = TenantConfig::new(TenantId::new("t1"));
        assert!(config.should_escalate(0.5, true));
        assert!(!config.should_escalate(0.7, true));
        assert!(!config.should_escalate(0.5, false));
    }

    #[test]
    fn approval_timeout_falls_back_to_default_absent_an_override() {
        let mut config = TenantConfig::new(TenantId::new("t1"));
        assert_eq!(config.approval_timeout_hours(2), DEFAULT_APPROVAL_TIMEOUT_HOURS);
        config.approval_timeout_overrides.insert(2, 12);
        assert_eq!(config.approval_timeout_hours(2), 12);
        assert_eq!(config.approval_timeout_hours(1), DEFAULT_APPROVAL_TIMEOUT_HOURS);
    }

    #[test]
    fn new_tenants_default_to_shadow_mode() {
        let config = TenantConfig::new(TenantId::new("t1"));
        assert!(config.shadow_mode);
    }

    #[test]
    fn shadow_mode_tenants_never_enforce_kill_switches() {
        let mut config = TenantConfig::new(TenantId::new("t1"));
        config.shadow_mode = true;
        assert!(!config.enforces_kill_switches());
    }

    #[test]
    fn disable_shadow_mode_refused_without_sign_off() {
        let mut config = TenantConfig::new(TenantId::new("t1"));
        config.shadow_mode = true;
        assert_eq!(config.disable_shadow_mode(), Err(ShadowModeStillRequired));
        assert!(config.shadow_mode);
    }

    #[test]
    fn disable_shadow_mode_succeeds_after_sign_off() {
        let mut config = TenantConfig::new(TenantId::new("t1"));
        config.shadow_mode = true;
        config.go_live_signed_off = true;
        assert!(config.disable_shadow_mode().is_ok());
        assert!(!config.shadow_mode);
    }
}
