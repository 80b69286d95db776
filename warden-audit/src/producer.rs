// warden-audit/src/producer.rs
// ============================================================================
// Module: Audit Producer
// Description: Fire-and-forget audit-event producer with per-tenant hash chaining.
// Purpose: Give every service a single call to emit a fully formed, sealed
//          audit record without re-deriving chaining or timestamp logic.
// Dependencies: std::sync, warden-core
// ============================================================================

//! ## Overview
//! [`AuditProducer`] tracks the last sealed record's hash and sequence
//! number per tenant in memory, seals each new record against it, and
//! hands the sealed record to its [`AuditSink`]. A sink failure is logged
//! via `tracing` and swallowed: emitting an audit record must never fail
//! the operation it describes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::Mutex;

use tracing::warn;
use uuid::Uuid;
use warden_core::AlertId;
use warden_core::AuditId;
use warden_core::InvestigationId;
use warden_core::TenantId;
use warden_core::Timestamp;

use crate::record::ActorType;
use crate::record::AuditContext;
use crate::record::AuditDecision;
use crate::record::AuditOutcome;
use crate::record::AuditRecord;
use crate::record::AuditSeverity;
use crate::sink::AuditSink;
use crate::taxonomy::EventTaxonomy;

// ============================================================================
// SECTION: Emit Request
// ============================================================================

/// The fields a caller supplies to emit one audit record; everything else
/// is derived or defaulted by [`AuditProducer::emit`].
#[derive(Debug, Clone, Default)]
pub struct EmitRequest {
    /// Tenant this record belongs to.
    pub tenant_id: TenantId,
    /// Event type, validated by the closed [`EventTaxonomy`] enum itself.
    pub event_type: Option<EventTaxonomy>,
    /// Severity of this record.
    pub severity: AuditSeverity,
    /// Kind of actor producing this record.
    pub actor_type: Option<ActorType>,
    /// Identifier of the actor producing this record.
    pub actor_id: String,
    /// Investigation this record relates to, if any.
    pub investigation_id: Option<InvestigationId>,
    /// Alert this record relates to, if any.
    pub alert_id: Option<AlertId>,
    /// Context payload.
    pub context: AuditContext,
    /// Decision payload.
    pub decision: AuditDecision,
    /// Outcome payload.
    pub outcome: AuditOutcome,
}

// ============================================================================
// SECTION: Producer
// ============================================================================

#[derive(Default)]
struct ChainState {
    sequence_number: u64,
    last_hash: String,
}

/// Fire-and-forget audit producer, one instance per service/process.
pub struct AuditProducer<S: AuditSink> {
    sink: S,
    chains: Mutex<HashMap<TenantId, ChainState>>,
}

impl<S: AuditSink> AuditProducer<S> {
    /// Creates a producer backed by the given sink.
    pub fn new(sink: S) -> Self {
        Self { sink, chains: Mutex::new(HashMap::new()) }
    }

    /// Builds, seals, and delivers an audit record derived from `request`
    /// at time `now`, returning the generated [`AuditId`].
    ///
    /// # Panics
    ///
    /// Panics if the internal chain-state mutex is poisoned by a prior
    /// panicking holder, which would indicate a bug elsewhere in the process.
    pub fn emit(&self, request: EmitRequest, now: Timestamp) -> AuditId {
        let audit_id = AuditId::new(Uuid::new_v4().to_string());
        let event_type = request.event_type.unwrap_or(EventTaxonomy::SystemGenesis);
        let actor_type = request.actor_type.unwrap_or(ActorType::System);

        #[allow(clippy::expect_used, reason = "A poisoned mutex indicates a prior panic elsewhere; we cannot recover.")]
        let mut chains = self.chains.lock().expect("audit chain-state mutex poisoned");
        let state = chains.entry(request.tenant_id.clone()).or_default();
        let sequence_number = state.sequence_number;
        let previous_hash = state.last_hash.clone();

        let record = AuditRecord {
            audit_id: audit_id.clone(),
            tenant_id: request.tenant_id,
            sequence_number,
            previous_hash,
            timestamp: now,
            event_type,
            event_category: event_type.category(),
            severity: request.severity,
            actor_type,
            actor_id: request.actor_id,
            investigation_id: request.investigation_id,
            alert_id: request.alert_id,
            context: request.context,
            decision: request.decision,
            outcome: request.outcome,
            record_hash: String::new(),
        }
        .sealed();

        state.sequence_number += 1;
        state.last_hash = record.record_hash.clone();
        drop(chains);

        if let Err(err) = self.sink.deliver(&record) {
            warn!(audit_id = %audit_id, error = %err, "audit record delivery failed (fire-and-forget)");
        }

        audit_id
    }
}

/// Builds an [`AuditContext`] populated with the fields relevant to an LLM
/// call, leaving every other field at its default.
#[must_use]
pub fn build_llm_context(
    provider: &str,
    model_id: &str,
    tier: &str,
    input_tokens: u64,
    output_tokens: u64,
    cost_usd: f64,
    latency_ms: u64,
) -> AuditContext {
    AuditContext {
        llm_provider: provider.to_string(),
        llm_model_id: model_id.to_string(),
        llm_model_tier: tier.to_string(),
        llm_input_tokens: input_tokens,
        llm_output_tokens: output_tokens,
        llm_cost_usd: cost_usd,
        llm_latency_ms: latency_ms,
        ..AuditContext::default()
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions are permitted."
)]
mod tests {
    use std::sync::Mutex as StdMutex;

    use super::*;
    use crate::sink::SinkError;

    #[derive(Default)]
    struct CapturingSink {
        captured: StdMutex<Vec<AuditRecord>>,
    }

    impl AuditSink for CapturingSink {
        fn deliver(&self, record: &AuditRecord) -> Result<(), SinkError> {
            self.captured.lock().expect("lock").push(record.clone());
            Ok(())
        }
    }

    fn now() -> Timestamp {
        Timestamp::parse("2026-01-01T00:00:00Z").expect("parse")
    }

    #[test]
    fn sequence_numbers_increment_per_tenant() {
        let producer = AuditProducer::new(CapturingSink::default());
        let tenant = TenantId::new("t1");
        let first = producer.emit(EmitRequest { tenant_id: tenant.clone(), actor_id: "a".to_string(), ..EmitRequest::default() }, now());
        let second = producer.emit(EmitRequest { tenant_id: tenant, actor_id: "a".to_string(), ..EmitRequest::default() }, now());
        assert_ne!(first, second);
        let captured = producer.sink.captured.lock().expect("lock");
        assert_eq!(captured[0].sequence_number, 0);
        assert_eq!(captured[1].sequence_number, 1);
        assert!(captured[1].extends(&captured[0]));
    }

    #[test]
    fn distinct_tenants_have_independent_chains() {
        let producer = AuditProducer::new(CapturingSink::default());
        producer.emit(EmitRequest { tenant_id: TenantId::new("t1"), actor_id: "a".to_string(), ..EmitRequest::default() }, now());
        producer.emit(EmitRequest { tenant_id: TenantId::new("t2"), actor_id: "a".to_string(), ..EmitRequest::default() }, now());
        let captured = producer.sink.captured.lock().expect("lock");
        assert_eq!(captured[0].sequence_number, 0);
        assert_eq!(captured[1].sequence_number, 0);
    }
}
