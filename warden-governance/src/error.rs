// warden-governance/src/error.rs
// ============================================================================
// Module: Governance Errors
// Description: The governance crate's error taxonomy, composed from its
//              sub-modules.
// Purpose: Give callers one error type to match on regardless of which
//          governance operation failed.
// Dependencies: thiserror, warden-core
// ============================================================================

use thiserror::Error;
use warden_core::FpApprovalError;
use warden_core::ShadowModeStillRequired;

use crate::shadow_mode::GoLiveError;

/// Errors the governance crate can surface to a caller.
#[derive(Debug, Clone, Error)]
pub enum GovernanceError {
    /// A pattern-approval state transition was attempted out of order.
    #[error("fp pattern approval failed: {0}")]
    FpApproval(#[from] FpApprovalError),
    /// Shadow mode was cleared before go-live sign-off was recorded.
    #[error("shadow mode still required: {0}")]
    ShadowModeStillRequired(#[from] ShadowModeStillRequired),
    /// A tenant's shadow-mode go-live attempt did not clear the criteria.
    #[error("go-live attempt failed: {0}")]
    GoLive(#[from] GoLiveError),
}
