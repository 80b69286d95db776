// warden-gateway/src/llm_client.rs
// ============================================================================
// Module: LLM Client
// Description: Provider-agnostic completion client with retry, metrics,
//              and cost accounting.
// Purpose: One seam between the Gateway pipeline and whatever LLM vendor
//          is actually dispatched to; retry/backoff and pricing live here
//          once, not once per vendor.
// Dependencies: async-trait, tokio, thiserror, serde_json
// ============================================================================

//! ## Overview
//! [`LlmClient`] is deliberately thin: one `complete` call, no retry logic
//! of its own. [`RetryingLlmClient`] wraps any [`LlmClient`] with
//! exponential backoff, retrying only rate limits and server errors —
//! never 4xx, which by definition won't succeed on a second attempt.
//! [`compute_cost`] turns raw token counts into a USD figure from a
//! per-model pricing table so every provider is metered the same way.

use std::collections::HashMap;
use std::sync::LazyLock;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::prompt_adapter::LlmProvider;

/// Retries are attempted at most this many times before surfacing the error.
pub const MAX_RETRIES: u32 = 3;
/// Base delay for exponential backoff: `BASE_DELAY_SECONDS * 2^attempt`.
pub const BASE_DELAY_SECONDS: f64 = 1.0;

/// Per-token USD pricing for a single model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelPricing {
    /// USD per input token.
    pub input: f64,
    /// USD per output token.
    pub output: f64,
    /// USD per cache-read token.
    pub cache_read: f64,
    /// USD per cache-write token.
    pub cache_write: f64,
}

/// Default per-model pricing table. Callers may supply their own via
/// [`compute_cost`]'s `pricing` parameter to override or extend this.
pub static DEFAULT_PRICING: LazyLock<HashMap<&'static str, ModelPricing>> = LazyLock::new(|| {
    HashMap::from([
        (
            "claude-sonnet-4-5-20250929",
            ModelPricing {
                input: 3.0 / 1_000_000.0,
                output: 15.0 / 1_000_000.0,
                cache_read: 0.30 / 1_000_000.0,
                cache_write: 3.75 / 1_000_000.0,
            },
        ),
        (
            "claude-haiku-4-5-20251001",
            ModelPricing {
                input: 0.80 / 1_000_000.0,
                output: 4.0 / 1_000_000.0,
                cache_read: 0.08 / 1_000_000.0,
                cache_write: 1.0 / 1_000_000.0,
            },
        ),
    ])
});

/// Metrics captured for a single completion call.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ApiCallMetrics {
    /// Input (prompt) token count.
    pub input_tokens: u64,
    /// Output (completion) token count.
    pub output_tokens: u64,
    /// Tokens served from a provider-side prompt cache.
    pub cache_read_tokens: u64,
    /// Tokens written into a provider-side prompt cache.
    pub cache_write_tokens: u64,
    /// Computed cost of this call in USD.
    pub cost_usd: f64,
    /// Wall-clock latency of the call, in milliseconds.
    pub latency_ms: f64,
}

/// Calculates USD cost from token counts and a pricing table, rounded to
/// the nearest one-millionth of a dollar. Unknown models price as free —
/// callers should treat a zero cost on a known-paid model as a bug in the
/// pricing table, not a free call.
#[must_use]
pub fn compute_cost(metrics: &ApiCallMetrics, pricing: Option<&ModelPricing>) -> f64 {
    let Some(pricing) = pricing else { return 0.0 };
    #[allow(clippy::cast_precision_loss, reason = "Token counts are far below f64's exact-integer range in practice.")]
    let cost = metrics.input_tokens as f64 * pricing.input
        + metrics.output_tokens as f64 * pricing.output
        + metrics.cache_read_tokens as f64 * pricing.cache_read
        + metrics.cache_write_tokens as f64 * pricing.cache_write;
    (cost * 1_000_000.0).round() / 1_000_000.0
}

/// Errors a raw [`LlmClient::complete`] call can return.
#[derive(Debug, Clone, Error)]
pub enum LlmCallError {
    /// HTTP 429: caller should back off and retry.
    #[error("rate limited")]
    RateLimited,
    /// HTTP 5xx: transient, safe to retry.
    #[error("server error (status {status})")]
    ServerError {
        /// The HTTP status code returned.
        status: u16,
    },
    /// HTTP 4xx other than 429: retrying will not help.
    #[error("client error (status {status})")]
    ClientError {
        /// The HTTP status code returned.
        status: u16,
    },
    /// Any other failure (network, decode, provider-specific).
    #[error("{0}")]
    Other(String),
}

/// A request to a completion endpoint, already adapted to a provider's
/// wire shape by a [`crate::prompt_adapter::PromptAdapter`].
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Provider-specific `system` parameter.
    pub system: Vec<Value>,
    /// Provider-specific `messages` parameter.
    pub messages: Vec<Value>,
    /// Model identifier; `None` defers to the client's configured default.
    pub model: Option<String>,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
}

/// Provider-agnostic completion client.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Which provider this client dispatches to.
    fn provider(&self) -> LlmProvider;

    /// Sends a single completion request with no retry of its own.
    ///
    /// # Errors
    ///
    /// Returns [`LlmCallError`] on any provider or transport failure.
    async fn complete(&self, request: CompletionRequest) -> Result<(String, ApiCallMetrics), LlmCallError>;
}

/// Wraps any [`LlmClient`] with exponential-backoff retry on rate limits
/// and server errors. Client errors (4xx other than 429) are never retried.
pub struct RetryingLlmClient<C> {
    inner: C,
    max_retries: u32,
    base_delay_seconds: f64,
}

impl<C: LlmClient> RetryingLlmClient<C> {
    /// Wraps `inner` with the default retry policy.
    pub const fn new(inner: C) -> Self {
        Self { inner, max_retries: MAX_RETRIES, base_delay_seconds: BASE_DELAY_SECONDS }
    }

    /// Wraps `inner` with an explicit retry policy, for tests that cannot
    /// afford real backoff delays.
    pub const fn with_policy(inner: C, max_retries: u32, base_delay_seconds: f64) -> Self {
        Self { inner, max_retries, base_delay_seconds }
    }

    /// Sends `request`, retrying rate limits and server errors with
    /// exponential backoff (`base_delay * 2^attempt`) up to `max_retries`
    /// attempts total.
    ///
    /// # Errors
    ///
    /// Returns the last [`LlmCallError`] once retries are exhausted, or
    /// immediately on a client error.
    pub async fn complete(&self, request: CompletionRequest) -> Result<(String, ApiCallMetrics), LlmCallError> {
        let mut attempt = 0u32;
        loop {
            match self.inner.complete(request.clone()).await {
                Ok(result) => return Ok(result),
                Err(err @ (LlmCallError::RateLimited | LlmCallError::ServerError { .. })) => {
                    if attempt + 1 >= self.max_retries {
                        return Err(err);
                    }
                    let delay = self.base_delay_seconds * 2f64.powi(i32::try_from(attempt).unwrap_or(i32::MAX));
                    tokio::time::sleep(std::time::Duration::from_secs_f64(delay)).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
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
    use std::sync::Arc;
    use std::sync::atomic::AtomicU32;
    use std::sync::atomic::Ordering;

    use super::*;

    #[test]
    fn compute_cost_uses_known_model_pricing() {
        let metrics = ApiCallMetrics { input_tokens: 1_000_000, output_tokens: 1_000_000, ..Default::default() };
        let pricing = DEFAULT_PRICING.get("claude-sonnet-4-5-20250929").copied();
        assert_eq!(compute_cost(&metrics, pricing.as_ref()), 18.0);
    }

    #[test]
    fn compute_cost_is_zero_for_unknown_model() {
        let metrics = ApiCallMetrics { input_tokens: 1_000, ..Default::default() };
        assert_eq!(compute_cost(&metrics, None), 0.0);
    }

    struct FlakyClient {
        remaining_failures: AtomicU32,
        failure: LlmCallError,
    }

    #[async_trait]
    impl LlmClient for FlakyClient {
        fn provider(&self) -> LlmProvider {
            LlmProvider::Anthropic
        }

        async fn complete(&self, _request: CompletionRequest) -> Result<(String, ApiCallMetrics), LlmCallError> {
            if self.remaining_failures.fetch_sub(1, Ordering::SeqCst) > 0 {
                return Err(self.failure.clone());
            }
            Ok(("ok".to_string(), ApiCallMetrics::default()))
        }
    }

    fn request() -> CompletionRequest {
        CompletionRequest { system: vec![], messages: vec![], model: None, max_tokens: 256 }
    }

    #[tokio::test]
    async fn retries_rate_limit_until_success() {
        let client = RetryingLlmClient::with_policy(
            FlakyClient { remaining_failures: AtomicU32::new(2), failure: LlmCallError::RateLimited },
            MAX_RETRIES,
            0.0,
        );
        let result = client.complete(request()).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn does_not_retry_client_errors() {
        let attempts = Arc::new(AtomicU32::new(0));
        struct CountingClient(Arc<AtomicU32>);

        #[async_trait]
        impl LlmClient for CountingClient {
            fn provider(&self) -> LlmProvider {
                LlmProvider::OpenAi
            }

            async fn complete(&self, _request: CompletionRequest) -> Result<(String, ApiCallMetrics), LlmCallError> {
                self.0.fetch_add(1, Ordering::SeqCst);
                Err(LlmCallError::ClientError { status: 400 })
            }
        }

        let client = RetryingLlmClient::with_policy(CountingClient(attempts.clone()), MAX_RETRIES, 0.0);
        let result = client.complete(request()).await;
        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exhausts_retries_and_returns_last_error() {
        let client = RetryingLlmClient::with_policy(
            FlakyClient { remaining_failures: AtomicU32::new(10), failure: LlmCallError::ServerError { status: 503 } },
            3,
            0.0,
        );
        let result = client.complete(request()).await;
        assert!(matches!(result, Err(LlmCallError::ServerError { status: 503 })));
    }
}
