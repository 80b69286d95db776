// warden-orchestrator/src/merge.rs
// ============================================================================
// Module: Enrichment Merge
// Description: Deterministic, per-field merge of the three parallel
//              enrichment deltas into an investigation.
// Purpose: Keep merge order-independent so a re-run after a crash produces
//          the same investigation regardless of which sibling finished
//          first.
// Dependencies: warden-core
// ============================================================================

//! ## Overview
//! The three enrichment agents run concurrently against an immutable
//! snapshot and each returns its own delta; none of them ever see each
//! other's output. Merging happens here, after every sibling has settled
//! (or failed-soft to an empty delta), one field at a time so the merge
//! itself has no ordering dependency.

use warden_core::Investigation;

use crate::agents::AtlasMappingDelta;
use crate::agents::ContextEnrichmentDelta;
use crate::agents::CtemCorrelationDelta;

/// Merges a context-enrichment delta into `investigation`.
pub fn merge_context(investigation: &mut Investigation, delta: ContextEnrichmentDelta) {
    investigation.ueba_context.extend(delta.ueba_context);
    investigation.similar_incidents.extend(delta.similar_incidents);
    if let Some(risk_state) = delta.risk_state {
        investigation.risk_state = risk_state;
    }
    investigation.queries_executed += delta.queries_executed;
}

/// Merges a CTEM-correlation delta into `investigation`.
pub fn merge_ctem(investigation: &mut Investigation, delta: CtemCorrelationDelta) {
    investigation.ctem_exposures.extend(delta.ctem_exposures);
    investigation.queries_executed += delta.queries_executed;
}

/// Merges an ATLAS-mapping delta into `investigation`.
pub fn merge_atlas(investigation: &mut Investigation, delta: AtlasMappingDelta) {
    investigation.atlas_techniques.extend(delta.atlas_techniques);
    investigation.queries_executed += delta.queries_executed;
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions are permitted."
)]
mod tests {
    use warden_core::AlertId;
    use warden_core::EntityBundle;
    use warden_core::InvestigationId;
    use warden_core::RiskState;
    use warden_core::TenantId;

    use super::*;

    fn investigation() -> Investigation {
        Investigation::new(InvestigationId::new("inv-1"), AlertId::new("a1"), TenantId::new("t1"), EntityBundle::default())
    }

    #[test]
    fn merges_are_order_independent() {
        let mut a = investigation();
        let mut b = investigation();

        let context = ContextEnrichmentDelta {
            ueba_context: vec![serde_json::json!({"baseline": "normal"})],
            similar_incidents: vec![serde_json::json!({"id": "inc-1"})],
            risk_state: Some(RiskState::Medium),
            queries_executed: 2,
        };
        let ctem = CtemCorrelationDelta { ctem_exposures: vec![serde_json::json!({"cve": "CVE-1"})], queries_executed: 1 };
        let atlas = AtlasMappingDelta::default();

        merge_context(&mut a, context.clone());
        merge_ctem(&mut a, ctem.clone());
        merge_atlas(&mut a, atlas.clone());

        merge_ctem(&mut b, ctem);
        merge_atlas(&mut b, atlas);
        merge_context(&mut b, context);

        assert_eq!(a.ueba_context, b.ueba_context);
        assert_eq!(a.ctem_exposures, b.ctem_exposures);
        assert_eq!(a.risk_state, b.risk_state);
        assert_eq!(a.queries_executed, b.queries_executed);
        assert_eq!(a.queries_executed, 3);
    }

    #[test]
    fn absent_risk_state_leaves_existing_value_untouched() {
        let mut inv = investigation();
        inv.risk_state = RiskState::High;
        merge_context(&mut inv, ContextEnrichmentDelta::default());
        assert_eq!(inv.risk_state, RiskState::High);
    }
}
