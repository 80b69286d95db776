// warden-gateway/src/error.rs
// ============================================================================
// Module: Gateway Errors
// Description: The Gateway's error taxonomy, composed from its sub-modules.
// Purpose: Give callers one error type to match on regardless of which
//          pipeline stage failed.
// Dependencies: thiserror
// ============================================================================

use thiserror::Error;

use crate::llm_client::LlmCallError;
use crate::spend_guard::SpendLimitExceeded;

/// Errors the Gateway pipeline can surface to a caller.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// The monthly spend cap was already reached before dispatch.
    #[error("spend limit exceeded: {0}")]
    SpendLimitExceeded(#[from] SpendLimitExceeded),
    /// The underlying LLM call failed after retries were exhausted.
    #[error("llm call failed: {0}")]
    LlmCallFailed(#[from] LlmCallError),
}
