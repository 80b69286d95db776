// warden-core/src/core/alert.rs
// ============================================================================
// Module: Canonical Alert
// Description: The normalised alert schema produced by ingest adapters.
// Purpose: Single source of truth for an alert once it has left an adapter.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Every ingest adapter (Sentinel, Elastic, Splunk, ...) maps its
//! vendor-specific payload into this schema before the orchestrator ever
//! sees it. The core never looks back across that boundary: adapters are
//! an explicit Non-goal of this crate.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::identifiers::AlertId;
use crate::core::identifiers::TenantId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Severity
// ============================================================================

/// Closed severity enum shared by alerts and investigations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Informational only; no action implied.
    Informational,
    /// Low severity.
    Low,
    /// Medium severity.
    Medium,
    /// High severity.
    High,
    /// Critical severity.
    Critical,
}

impl Severity {
    /// Returns true for the severities that can trigger confidence-based escalation.
    #[must_use]
    pub const fn is_escalation_eligible(self) -> bool {
        matches!(self, Self::Critical | Self::High)
    }
}

// ============================================================================
// SECTION: Canonical Alert
// ============================================================================

/// The canonical, immutable alert record consumed exactly once by the
/// orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalAlert {
    /// Stable alert identifier minted by the ingest adapter.
    pub alert_id: AlertId,
    /// Name of the originating vendor/source (e.g. "sentinel").
    pub source: String,
    /// Detection timestamp as reported by the source.
    pub timestamp: Timestamp,
    /// Short human-readable title.
    pub title: String,
    /// Longer free-text description.
    pub description: String,
    /// Closed severity enum.
    pub severity: Severity,
    /// MITRE ATT&CK tactic ids associated with the detection, if known.
    #[serde(default)]
    pub tactics: Vec<String>,
    /// MITRE ATT&CK technique ids associated with the detection, if known.
    #[serde(default)]
    pub techniques: Vec<String>,
    /// Opaque, vendor-specific raw entity payload. Narrowed into a typed
    /// [`crate::core::entity::EntityBundle`] by the entity parser, which is
    /// out of scope for this crate.
    #[serde(default)]
    pub entities_raw: Value,
    /// Product name within the source vendor's suite, if applicable.
    #[serde(default)]
    pub product: String,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Full untouched vendor payload, preserved for forensic replay.
    #[serde(default)]
    pub raw_payload: Value,
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions are permitted."
)]
mod tests {
    use super::Severity;

    #[test]
    fn only_critical_and_high_are_escalation_eligible() {
        assert!(Severity::Critical.is_escalation_eligible());
        assert!(Severity::High.is_escalation_eligible());
        assert!(!Severity::Medium.is_escalation_eligible());
        assert!(!Severity::Low.is_escalation_eligible());
        assert!(!Severity::Informational.is_escalation_eligible());
    }

    #[test]
    fn severity_serializes_snake_case() {
        let json = serde_json::to_string(&Severity::Informational).expect("serialize");
        assert_eq!(json, "\"informational\"");
    }
}
