// warden-core/src/core/fp_pattern.rs
// ============================================================================
// Module: False-Positive Pattern
// Description: A governed, analyst-approved pattern short-circuiting triage.
// Purpose: Shared shape used by the short-circuit matcher, the governance
//          manager, the canary manager, and the SQLite store.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! A [`FpPattern`] only takes effect once two *distinct* analysts have
//! approved it (see [`FpPattern::record_approval`]) and only while it has
//! not expired. Everything about "is this pattern live" lives on the
//! pattern itself so the matcher, the governance engine, and the store
//! agree on one definition.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::PatternId;
use crate::core::identifiers::TenantId;
use crate::core::time::Timestamp;

/// Number of days an approved pattern remains valid before requiring reaffirmation.
pub const EXPIRY_DAYS: i64 = 90;

/// Minimum aggregate confidence a pattern match must clear to be eligible
/// for auto-close consideration at all.
pub const FP_CONFIDENCE_THRESHOLD: f64 = 0.90;

// ============================================================================
// SECTION: Lifecycle Status
// ============================================================================

/// Lifecycle status of a governed false-positive pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FpPatternStatus {
    /// Proposed, awaiting a first approval.
    Draft,
    /// One approver has signed off; awaiting a second, distinct approver.
    PendingReview,
    /// Fully approved and live, pending expiry.
    Approved,
    /// Approved but past its expiry date; no longer eligible for matching.
    Expired,
    /// Manually revoked by an analyst or by an automatic rollback.
    Revoked,
}

// ============================================================================
// SECTION: Scope
// ============================================================================

/// Scope a pattern is restricted to. An empty field is a wildcard on that
/// dimension, matching [`Scope::matches`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
    /// Tenant this pattern applies to, or empty for all tenants.
    #[serde(default)]
    pub tenant_id: Option<TenantId>,
    /// MITRE technique id this pattern applies to, or empty for all.
    #[serde(default)]
    pub technique_id: Option<String>,
    /// Data source this pattern applies to, or empty for all.
    #[serde(default)]
    pub data_source: Option<String>,
}

impl Scope {
    /// Returns true if `self` matches the given concrete coordinates. An
    /// empty field on `self` is a wildcard and always matches.
    #[must_use]
    pub fn matches(&self, tenant_id: &TenantId, technique_id: &str, data_source: &str) -> bool {
        let tenant_ok = self.tenant_id.as_ref().is_none_or(|t| t == tenant_id);
        let technique_ok = self.technique_id.as_deref().is_none_or(|t| t == technique_id);
        let source_ok = self.data_source.as_deref().is_none_or(|s| s == data_source);
        tenant_ok && technique_ok && source_ok
    }
}

// ============================================================================
// SECTION: Entity Pattern
// ============================================================================

/// A single matcher clause within a pattern's requirement set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntityPattern {
    /// Exact-match an entity's primary value.
    Exact {
        /// Field to match against.
        field: String,
        /// Expected value.
        value: String,
    },
    /// Match an entity whose value falls within a CIDR block.
    Cidr {
        /// Field to match against.
        field: String,
        /// CIDR block, e.g. `10.0.0.0/8`.
        cidr: String,
    },
    /// Match an entity's value against a regular expression.
    Regex {
        /// Field to match against.
        field: String,
        /// Regex pattern.
        pattern: String,
    },
}

// ============================================================================
// SECTION: Fp Pattern
// ============================================================================

/// A governed false-positive pattern requiring two-person approval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FpPattern {
    /// Unique pattern identifier.
    pub pattern_id: PatternId,
    /// Human-readable name.
    pub name: String,
    /// Scope this pattern is restricted to.
    pub scope: Scope,
    /// The set of clauses that must all match for this pattern to fire.
    pub requirements: Vec<EntityPattern>,
    /// Lifecycle status.
    pub status: FpPatternStatus,
    /// First approver's identifier, if any.
    #[serde(default)]
    pub approver_1: Option<String>,
    /// Second, distinct approver's identifier, if any.
    #[serde(default)]
    pub approver_2: Option<String>,
    /// Timestamp of final (second) approval.
    #[serde(default)]
    pub approval_date: Option<Timestamp>,
    /// Expiry timestamp, `approval_date + EXPIRY_DAYS`.
    #[serde(default)]
    pub expiry_date: Option<Timestamp>,
    /// Timestamp of the most recent reaffirmation, if any.
    #[serde(default)]
    pub reaffirmed_date: Option<Timestamp>,
    /// Analyst who most recently reaffirmed this pattern, if any.
    #[serde(default)]
    pub reaffirmed_by: Option<String>,
}

/// Error produced while recording an approval against a pattern.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FpApprovalError {
    /// The same analyst attempted to approve a pattern twice.
    #[error("approver {0:?} already recorded the first approval for this pattern")]
    SameApproverTwice(String),
    /// An approval was attempted on a pattern that is not awaiting one.
    #[error("pattern is in status {0:?}, which does not accept approvals")]
    NotAwaitingApproval(FpPatternStatus),
}

impl FpPattern {
    /// Records an approval from `approver`. The first call transitions
    /// `Draft -> PendingReview`; the second, distinct call transitions
    /// `PendingReview -> Approved`, stamping `approval_date` and
    /// `expiry_date = approval_date + 90 days`.
    ///
    /// # Errors
    ///
    /// Returns [`FpApprovalError::SameApproverTwice`] if `approver` matches
    /// `approver_1` on the second call, and
    /// [`FpApprovalError::NotAwaitingApproval`] if the pattern is not in
    /// `Draft` or `PendingReview`.
    pub fn record_approval(&mut self, approver: &str, now: Timestamp) -> Result<(), FpApprovalError> {
        match self.status {
            FpPatternStatus::Draft => {
                self.approver_1 = Some(approver.to_string());
                self.status = FpPatternStatus::PendingReview;
                Ok(())
            }
            FpPatternStatus::PendingReview => {
                if self.approver_1.as_deref() == Some(approver) {
                    return Err(FpApprovalError::SameApproverTwice(approver.to_string()));
                }
                self.approver_2 = Some(approver.to_string());
                self.approval_date = Some(now);
                self.expiry_date = Some(now.plus_days(EXPIRY_DAYS));
                self.status = FpPatternStatus::Approved;
                Ok(())
            }
            other => Err(FpApprovalError::NotAwaitingApproval(other)),
        }
    }

    /// Returns true if this pattern is `Approved` and not past its expiry
    /// date as of `now`.
    #[must_use]
    pub fn is_live(&self, now: &Timestamp) -> bool {
        self.status == FpPatternStatus::Approved
            && self.expiry_date.as_ref().is_some_and(|expiry| now.is_before(expiry) || *expiry == *now)
    }

    /// Marks an expired-but-still-`Approved` pattern as `Expired`. No-op if
    /// the pattern is not live or not yet past its expiry date.
    pub fn expire_if_due(&mut self, now: &Timestamp) {
        if self.status == FpPatternStatus::Approved {
            if let Some(expiry) = &self.expiry_date {
                if !now.is_before(expiry) && expiry != now {
                    self.status = FpPatternStatus::Expired;
                }
            }
        }
    }

    /// Revokes this pattern immediately, regardless of current status.
    pub fn revoke(&mut self) {
        self.status = FpPatternStatus::Revoked;
    }

    /// Reaffirms a pattern that is `Approved` or `Expired`, stamping
    /// `reaffirmed_date`/`reaffirmed_by` and resetting `expiry_date` to
    /// `now + EXPIRY_DAYS`. A reaffirmed `Expired` pattern returns to
    /// `Approved`.
    ///
    /// # Errors
    ///
    /// Returns [`FpApprovalError::NotAwaitingApproval`] if the pattern is
    /// `Draft`, `PendingReview`, or `Revoked`.
    pub fn reaffirm(&mut self, approver: &str, now: Timestamp) -> Result<(), FpApprovalError> {
        match self.status {
            FpPatternStatus::Approved | FpPatternStatus::Expired => {
                self.reaffirmed_by = Some(approver.to_string());
                self.reaffirmed_date = Some(now);
                self.expiry_date = Some(now.plus_days(EXPIRY_DAYS));
                self.status = FpPatternStatus::Approved;
                Ok(())
            }
            other => Err(FpApprovalError::NotAwaitingApproval(other)),
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

    fn draft_pattern() -> FpPattern {
        FpPattern {
            pattern_id: PatternId::new("p1"),
            name: "known scanner".to_string(),
            scope: Scope::default(),
            requirements: vec![],
            status: FpPatternStatus::Draft,
            approver_1: None,
            approver_2: None,
            approval_date: None,
            expiry_date: None,
            reaffirmed_date: None,
            reaffirmed_by: None,
        }
    }

    fn ts(s: &str) -> Timestamp {
        Timestamp::parse(s).expect("parse")
    }

    #[test]
    fn first_approval_moves_to_pending_review() {
        let mut pattern = draft_pattern();
        pattern.record_approval("alice", ts("2026-01-01T00:00:00Z")).expect("approve");
        assert_eq!(pattern.status, FpPatternStatus::PendingReview);
        assert_eq!(pattern.approver_1.as_deref(), Some("alice"));
    }

    #[test]
    fn second_distinct_approval_approves_with_ninety_day_expiry() {
        let mut pattern = draft_pattern();
        let first = ts("2026-01-01T00:00:00Z");
        pattern.record_approval("alice", first).expect("approve");
        pattern.record_approval("bob", first).expect("approve");
        assert_eq!(pattern.status, FpPatternStatus::Approved);
        let expiry = pattern.expiry_date.expect("expiry set");
        assert!((expiry.days_since(&first) - 90.0).abs() < 0.001);
    }

    #[test]
    fn same_approver_twice_is_rejected() {
        let mut pattern = draft_pattern();
        let first = ts("2026-01-01T00:00:00Z");
        pattern.record_approval("alice", first).expect("approve");
        let err = pattern.record_approval("alice", first).unwrap_err();
        assert_eq!(err, FpApprovalError::SameApproverTwice("alice".to_string()));
    }

    #[test]
    fn is_live_false_after_expiry() {
        let mut pattern = draft_pattern();
        let first = ts("2026-01-01T00:00:00Z");
        pattern.record_approval("alice", first).expect("approve");
        pattern.record_approval("bob", first).expect("approve");
        let past_expiry = ts("2026-05-01T00:00:00Z");
        assert!(!pattern.is_live(&past_expiry));
    }

    #[test]
    fn reaffirm_resets_expiry_and_revives_expired_pattern() {
        let mut pattern = draft_pattern();
        let first = ts("2026-01-01T00:00:00Z");
        pattern.record_approval("alice", first).expect("approve");
        pattern.record_approval("bob", first).expect("approve");
        pattern.status = FpPatternStatus::Expired;
        let reaffirmed_at = ts("2026-06-01T00:00:00Z");
        pattern.reaffirm("carol", reaffirmed_at).expect("reaffirm");
        assert_eq!(pattern.status, FpPatternStatus::Approved);
        assert_eq!(pattern.reaffirmed_by.as_deref(), Some("carol"));
        let expiry = pattern.expiry_date.expect("expiry set");
        assert!((expiry.days_since(&reaffirmed_at) - 90.0).abs() < 0.001);
    }

    #[test]
    fn reaffirm_rejected_on_draft_pattern() {
        let mut pattern = draft_pattern();
        let err = pattern.reaffirm("alice", ts("2026-01-01T00:00:00Z")).unwrap_err();
        assert_eq!(err, FpApprovalError::NotAwaitingApproval(FpPatternStatus::Draft));
    }

    #[test]
    fn scope_wildcard_matches_any_tenant() {
        let scope = Scope { tenant_id: None, technique_id: Some("T1059".to_string()), data_source: None };
        assert!(scope.matches(&TenantId::new("t1"), "T1059", "edr"));
        assert!(!scope.matches(&TenantId::new("t1"), "T1566", "edr"));
    }
}
