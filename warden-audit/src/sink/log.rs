// warden-audit/src/sink/log.rs
// ============================================================================
// Module: Log Sink
// Description: Structured-logging-only sink for sealed audit records.
// Purpose: Give every deployment a zero-configuration audit destination.
// Dependencies: tracing
// ============================================================================

//! ## Overview
//! `LogSink` emits one structured `tracing` event per record and never
//! fails: it is the sink every other sink composes with as a fallback, and
//! the one used in tests.

use tracing::info;

use crate::record::AuditRecord;
use crate::sink::AuditSink;
use crate::sink::SinkError;

/// Sink that emits each record as a structured `tracing` event at `info`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl LogSink {
    /// Creates a new log sink.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl AuditSink for LogSink {
    fn deliver(&self, record: &AuditRecord) -> Result<(), SinkError> {
        info!(
            audit_id = %record.audit_id,
            tenant_id = %record.tenant_id,
            sequence_number = record.sequence_number,
            event_type = ?record.event_type,
            record_hash = %record.record_hash,
            "audit record sealed"
        );
        Ok(())
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions are permitted."
)]
mod tests {
    use warden_core::AuditId;
    use warden_core::TenantId;
    use warden_core::Timestamp;

    use super::*;
    use crate::record::ActorType;
    use crate::record::AuditContext;
    use crate::record::AuditDecision;
    use crate::record::AuditOutcome;
    use crate::record::AuditSeverity;
    use crate::taxonomy::EventTaxonomy;

    #[test]
    fn log_sink_never_fails() {
        let record = AuditRecord {
            audit_id: AuditId::new("a1"),
            tenant_id: TenantId::new("t1"),
            sequence_number: 0,
            previous_hash: String::new(),
            timestamp: Timestamp::parse("2026-01-01T00:00:00Z").expect("parse"),
            event_type: EventTaxonomy::SystemGenesis,
            event_category: EventTaxonomy::SystemGenesis.category(),
            severity: AuditSeverity::Info,
            actor_type: ActorType::System,
            actor_id: "bootstrap".to_string(),
            investigation_id: None,
            alert_id: None,
            context: AuditContext::default(),
            decision: AuditDecision::default(),
            outcome: AuditOutcome::default(),
            record_hash: String::new(),
        }
        .sealed();
        assert!(LogSink::new().deliver(&record).is_ok());
    }
}
