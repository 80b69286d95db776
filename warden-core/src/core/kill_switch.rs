// warden-core/src/core/kill_switch.rs
// ============================================================================
// Module: Kill Switch
// Description: Emergency disable for a governed FP pattern scope.
// Purpose: Shared shape used by the governance kill-switch manager and store.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`KillSwitch`] disables matching on a `(tenant, pattern, technique,
//! data_source)` coordinate. Reading kill-switch state must fail open: if
//! the read itself fails, callers treat the switch as *not* killed rather
//! than blocking triage on a storage outage.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::PatternId;
use crate::core::identifiers::TenantId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Dimension
// ============================================================================

/// The four coordinates a kill switch can be scoped along. Any field may be
/// `None`, meaning "any value on this dimension".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KillSwitchDimension {
    /// Tenant this kill switch applies to.
    #[serde(default)]
    pub tenant_id: Option<TenantId>,
    /// Pattern this kill switch applies to.
    #[serde(default)]
    pub pattern_id: Option<PatternId>,
    /// MITRE technique id this kill switch applies to.
    #[serde(default)]
    pub technique_id: Option<String>,
    /// Data source this kill switch applies to.
    #[serde(default)]
    pub data_source: Option<String>,
}

impl KillSwitchDimension {
    /// Returns true if `self` (as a filter, with `None` meaning wildcard)
    /// covers the concrete coordinate described by the arguments.
    #[must_use]
    pub fn covers(
        &self,
        tenant_id: &TenantId,
        pattern_id: &PatternId,
        technique_id: &str,
        data_source: &str,
    ) -> bool {
        self.tenant_id.as_ref().is_none_or(|t| t == tenant_id)
            && self.pattern_id.as_ref().is_none_or(|p| p == pattern_id)
            && self.technique_id.as_deref().is_none_or(|t| t == technique_id)
            && self.data_source.as_deref().is_none_or(|s| s == data_source)
    }
}

// ============================================================================
// SECTION: Kill Switch
// ============================================================================

/// A single active (or historical) kill switch activation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KillSwitch {
    /// The coordinate this kill switch disables.
    pub dimension: KillSwitchDimension,
    /// Who activated it.
    pub activated_by: String,
    /// Why it was activated.
    pub reason: String,
    /// When it was activated.
    pub activated_at: Timestamp,
    /// When it was deactivated, if it has been.
    #[serde(default)]
    pub deactivated_at: Option<Timestamp>,
}

impl KillSwitch {
    /// Returns true if this kill switch is currently active.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.deactivated_at.is_none()
    }

    /// Deactivates this kill switch as of `now`. No-op if already inactive.
    pub fn deactivate(&mut self, now: Timestamp) {
        if self.deactivated_at.is_none() {
            self.deactivated_at = Some(now);
        }
    }
}

/// Evaluates whether a concrete coordinate is covered by any active switch
/// in `switches`. Fails open (returns `false`) on an empty list.
#[must_use]
pub fn is_killed(
    switches: &[KillSwitch],
    tenant_id: &TenantId,
    pattern_id: &PatternId,
    technique_id: &str,
    data_source: &str,
) -> bool {
    switches
        .iter()
        .filter(|s| s.is_active())
        .any(|s| s.dimension.covers(tenant_id, pattern_id, technique_id, data_source))
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions are permitted."
)]
mod tests {
    use super::*;

    fn switch(dimension: KillSwitchDimension) -> KillSwitch {
        KillSwitch {
            dimension,
            activated_by: "alice".to_string(),
            reason: "false positive spike".to_string(),
            activated_at: Timestamp::parse("2026-01-01T00:00:00Z").expect("parse"),
            deactivated_at: None,
        }
    }

    #[test]
    fn empty_switch_list_fails_open() {
        assert!(!is_killed(&[], &TenantId::new("t1"), &PatternId::new("p1"), "T1059", "edr"));
    }

    #[test]
    fn wildcard_tenant_covers_any_tenant() {
        let dimension = KillSwitchDimension {
            tenant_id: None,
            pattern_id: Some(PatternId::new("p1")),
            technique_id: None,
            data_source: None,
        };
        let switches = vec![switch(dimension)];
        assert!(is_killed(&switches, &TenantId::new("t1"), &PatternId::new("p1"), "T1059", "edr"));
        assert!(!is_killed(&switches, &TenantId::new("t1"), &PatternId::new("p2"), "T1059", "edr"));
    }

    #[test]
    fn deactivated_switch_no_longer_kills() {
        let dimension = KillSwitchDimension { pattern_id: Some(PatternId::new("p1")), ..KillSwitchDimension::default() };
        let mut s = switch(dimension);
        s.deactivate(Timestamp::parse("2026-01-02T00:00:00Z").expect("parse"));
        assert!(!is_killed(&[s], &TenantId::new("t1"), &PatternId::new("p1"), "T1059", "edr"));
    }
}
