// warden-governance/src/shadow_mode.rs
// ============================================================================
// Module: Tenant Shadow Mode
// Description: Tracks a tenant's shadow-mode agreement history and decides
//              go-live eligibility.
// Purpose: Let a tenant run FP governance in observe-only mode until its
//          own track record proves it is safe to enforce.
// Dependencies: warden-core
// ============================================================================

//! ## Overview
//! While a tenant is in shadow mode (`TenantConfig::shadow_mode == true`),
//! governance decisions are recorded but never enforced
//! ([`warden_core::TenantConfig::enforces_kill_switches`]). This module
//! tracks the agreement history that [`GoLiveCriteria`] is judged against,
//! and [`warden_core::TenantConfig::disable_shadow_mode`] is the only way
//! to actually flip shadow mode off once criteria are met.

use warden_core::TenantConfig;

/// One tenant-level shadow-mode decision comparison.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowAgreement {
    /// Whether the system's shadow decision and the analyst's decision agreed.
    pub agreed: bool,
    /// Whether this was a missed critical true positive (system said FP,
    /// analyst confirmed a real, critical incident).
    pub missed_critical_true_positive: bool,
    /// Whether the system's decision was itself a false-positive call.
    pub system_called_false_positive: bool,
    /// Whether that false-positive call was confirmed correct by an analyst.
    pub false_positive_call_confirmed: bool,
}

/// The criteria a tenant's shadow-mode history must clear before shadow
/// mode may be disabled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GoLiveCriteria {
    /// Minimum fraction of decisions where system and analyst agreed.
    pub min_agreement_rate: f64,
    /// Minimum number of days of history required before go-live is considered.
    pub min_window_days: i64,
    /// Maximum tolerated count of missed critical true positives (should be zero).
    pub max_missed_critical_true_positives: u32,
    /// Minimum precision required on the system's false-positive calls.
    pub min_fp_precision: f64,
}

impl Default for GoLiveCriteria {
    fn default() -> Self {
        Self { min_agreement_rate: 0.95, min_window_days: 14, max_missed_critical_true_positives: 0, min_fp_precision: 0.98 }
    }
}

/// Aggregate shadow-mode statistics accumulated for one tenant.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ShadowStats {
    /// Total decisions observed.
    pub total: u32,
    /// Decisions where system and analyst agreed.
    pub agreements: u32,
    /// Missed critical true positives observed.
    pub missed_critical_true_positives: u32,
    /// System false-positive calls observed.
    pub fp_calls: u32,
    /// System false-positive calls later confirmed correct.
    pub fp_calls_confirmed: u32,
}

impl ShadowStats {
    /// Records one more [`ShadowAgreement`] into this tally.
    pub fn record(&mut self, agreement: ShadowAgreement) {
        self.total += 1;
        if agreement.agreed {
            self.agreements += 1;
        }
        if agreement.missed_critical_true_positive {
            self.missed_critical_true_positives += 1;
        }
        if agreement.system_called_false_positive {
            self.fp_calls += 1;
            if agreement.false_positive_call_confirmed {
                self.fp_calls_confirmed += 1;
            }
        }
    }

    /// Fraction of decisions where system and analyst agreed.
    #[must_use]
    pub fn agreement_rate(self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            f64::from(self.agreements) / f64::from(self.total)
        }
    }

    /// Fraction of the system's false-positive calls later confirmed correct.
    /// `1.0` (vacuously precise) when the system has made no FP calls yet.
    #[must_use]
    pub fn fp_precision(self) -> f64 {
        if self.fp_calls == 0 {
            1.0
        } else {
            f64::from(self.fp_calls_confirmed) / f64::from(self.fp_calls)
        }
    }

    /// Returns true if this tally clears `criteria`. The minimum-window
    /// requirement is the caller's responsibility (it depends on wall-clock
    /// history this in-memory tally does not track) and is not checked here.
    #[must_use]
    pub fn meets(self, criteria: GoLiveCriteria) -> bool {
        self.agreement_rate() >= criteria.min_agreement_rate
            && self.missed_critical_true_positives <= criteria.max_missed_critical_true_positives
            && self.fp_precision() >= criteria.min_fp_precision
    }
}

/// Attempts to take `config` out of shadow mode, refusing unless `stats`
/// clears `criteria` over at least `criteria.min_window_days` of history
/// and, having cleared it, records that sign-off on `config` itself.
///
/// # Errors
///
/// Returns [`GoLiveError::CriteriaNotMet`] if `stats`/`window_days` do not
/// clear `criteria`, or propagates
/// [`warden_core::ShadowModeStillRequired`] from the underlying
/// `disable_shadow_mode` call (unreachable once sign-off has just been set,
/// kept only so the error type stays honest about every failure mode).
pub fn attempt_go_live(config: &mut TenantConfig, stats: ShadowStats, window_days: i64, criteria: GoLiveCriteria) -> Result<(), GoLiveError> {
    if window_days < criteria.min_window_days || !stats.meets(criteria) {
        return Err(GoLiveError::CriteriaNotMet);
    }
    config.go_live_signed_off = true;
    config.disable_shadow_mode().map_err(GoLiveError::StillShadowed)
}

/// Errors produced while attempting to take a tenant out of shadow mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GoLiveError {
    /// The tenant's shadow-mode history does not yet clear the criteria.
    #[error("shadow-mode go-live criteria not yet met")]
    CriteriaNotMet,
    /// Sign-off was recorded but the underlying config mutation was refused.
    #[error(transparent)]
    StillShadowed(#[from] warden_core::ShadowModeStillRequired),
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions are permitted."
)]
mod tests {
    use warden_core::TenantId;

    use super::*;

    fn agree() -> ShadowAgreement {
        ShadowAgreement { agreed: true, missed_critical_true_positive: false, system_called_false_positive: true, false_positive_call_confirmed: true }
    }

    #[test]
    fn all_agreeing_decisions_meet_default_criteria() {
        let mut stats = ShadowStats::default();
        for _ in 0..100 {
            stats.record(agree());
        }
        assert!(stats.meets(GoLiveCriteria::default()));
    }

    #[test]
    fn a_single_missed_critical_true_positive_blocks_go_live() {
        let mut stats = ShadowStats::default();
        for _ in 0..100 {
            stats.record(agree());
        }
        stats.record(ShadowAgreement { agreed: false, missed_critical_true_positive: true, system_called_false_positive: false, false_positive_call_confirmed: false });
        assert!(!stats.meets(GoLiveCriteria::default()));
    }

    #[test]
    fn attempt_go_live_refused_before_min_window() {
        let mut config = TenantConfig::new(TenantId::new("t1"));
        config.shadow_mode = true;
        let mut stats = ShadowStats::default();
        for _ in 0..100 {
            stats.record(agree());
        }
        let err = attempt_go_live(&mut config, stats, 3, GoLiveCriteria::default()).unwrap_err();
        assert_eq!(err, GoLiveError::CriteriaNotMet);
        assert!(config.shadow_mode);
    }

    #[test]
    fn attempt_go_live_succeeds_once_criteria_and_window_clear() {
        let mut config = TenantConfig::new(TenantId::new("t1"));
        config.shadow_mode = true;
        let mut stats = ShadowStats::default();
        for _ in 0..100 {
            stats.record(agree());
        }
        attempt_go_live(&mut config, stats, 14, GoLiveCriteria::default()).expect("go live");
        assert!(!config.shadow_mode);
        assert!(config.go_live_signed_off);
    }
}
