// warden-audit/src/sink/mod.rs
// ============================================================================
// Module: Audit Sinks
// Description: Delivery targets for sealed audit records.
// Purpose: Decouple audit-record construction from where records end up.
// Dependencies: warden-core
// ============================================================================

//! ## Overview
//! An [`AuditSink`] delivers a single sealed [`crate::AuditRecord`]. The
//! producer that owns a sink is fire-and-forget: a sink failure is logged,
//! never propagated back into the caller's control flow, matching the
//! audit trail's own non-blocking design.

pub mod log;

pub use self::log::LogSink;

use crate::record::AuditRecord;

/// Error produced while delivering an audit record to a sink.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SinkError {
    /// The sink's underlying transport failed.
    #[error("audit sink delivery failed: {0}")]
    DeliveryFailed(String),
}

/// A delivery target for sealed audit records.
pub trait AuditSink: Send + Sync {
    /// Delivers a single sealed record.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] if delivery fails. Callers are expected to log
    /// and continue rather than fail the operation the record described.
    fn deliver(&self, record: &AuditRecord) -> Result<(), SinkError>;
}
