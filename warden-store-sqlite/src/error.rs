// warden-store-sqlite/src/error.rs
// ============================================================================
// Module: Store Errors
// Description: The SQLite store's error taxonomy.
// Purpose: Give callers one error type to match on regardless of which store
//          or operation failed.
// Dependencies: thiserror
// ============================================================================

use thiserror::Error;

/// Errors the SQLite-backed stores can surface to a caller.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Filesystem I/O error opening or preparing the database file.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// A stored row's hash did not match its recomputed digest.
    #[error("sqlite store corruption: {0}")]
    Corrupt(String),
    /// A stored row could not be deserialized or referenced an invalid id.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
}
