// warden-gateway/src/gateway.rs
// ============================================================================
// Module: Context Gateway
// Description: Orchestrates the full LLM-mediation pipeline.
// Purpose: One call in, one call out: sanitise -> redact -> prompt ->
//          call LLM -> validate -> strip -> audit -> deanonymise -> meter.
// Dependencies: regex, warden-audit, warden-core, crate::{injection_detector,
//               pii_redactor, prompt_builder, output_validator, llm_client,
//               spend_guard, error, config}
// ============================================================================

//! ## Overview
//! [`ContextGateway::complete`] is the single entry point every agent goes
//! through to reach an LLM. The pipeline order is load-bearing:
//! 1. Check spend budget — refuse before any cost is incurred.
//! 2. Sanitise untrusted input for injection attempts.
//! 3. Redact PII into stable placeholders.
//! 4. Truncate oversized context to the request tier's character budget,
//!    then build the cached system prompt.
//! 5. Call the LLM (through the retrying client), capped to the tier's
//!    token budget.
//! 6. Validate the response; preserve the raw text *before* stripping.
//! 7. Strip quarantined technique IDs (deny-by-default) and audit them.
//! 8. Deanonymise the response.
//! 9. Record the call's cost.

use std::collections::HashSet;
use std::sync::Mutex;

use regex::Regex;
use serde_json::Value;
use warden_audit::ActorType;
use warden_audit::AuditContext;
use warden_audit::AuditProducer;
use warden_audit::AuditSink;
use warden_audit::EmitRequest;
use warden_audit::EventTaxonomy;
use warden_audit::build_llm_context;
use warden_core::SpendRecord;
use warden_core::TenantId;
use warden_core::Timestamp;

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::injection_detector::sanitise_input;
use crate::llm_client::ApiCallMetrics;
use crate::llm_client::CompletionRequest;
use crate::llm_client::LlmClient;
use crate::llm_client::RetryingLlmClient;
use crate::output_validator::validate_output;
use crate::pii_redactor::PiiRedactor;
use crate::prompt_adapter::PromptAdapter;
use crate::prompt_adapter::get_adapter;
use crate::spend_guard::SpendGuard;

/// Incoming request to the Context Gateway.
#[derive(Debug, Clone)]
pub struct GatewayRequest {
    /// Identifier of the agent making this call.
    pub agent_id: String,
    /// Task type this call supports (used for spend aggregation and audit context).
    pub task_type: String,
    /// Task-specific system prompt, before the safety prefix is applied.
    pub system_prompt: String,
    /// Untrusted user content (alert fields, entity bundle, ...).
    pub user_content: String,
    /// Optional JSON schema the response is expected to satisfy.
    pub output_schema: Option<Value>,
    /// Tenant this call is made on behalf of.
    pub tenant_id: TenantId,
    /// Call tier, used to look up the context token/character budget.
    pub tier: u8,
}

/// Response returned by the Context Gateway.
#[derive(Debug, Clone)]
pub struct GatewayResponse {
    /// Final, deanonymised, quarantine-stripped response text.
    pub content: String,
    /// Model identifier that produced this response.
    pub model_id: String,
    /// Total tokens used (input + output).
    pub tokens_used: u64,
    /// Whether the response passed output validation.
    pub valid: bool,
    /// The unmodified LLM response, preserved before stripping.
    pub raw_output: String,
    /// Validation failures, if any.
    pub validation_errors: Vec<String>,
    /// Technique IDs quarantined as unknown/hallucinated.
    pub quarantined_ids: Vec<String>,
    /// Metrics for the underlying LLM call.
    pub metrics: ApiCallMetrics,
    /// Injection patterns detected and redacted from the input.
    pub injection_detections: Vec<String>,
}

/// Rough characters-per-token ratio used to cap retrieval context by
/// character count ahead of the token-based `max_tokens` cap the client
/// itself enforces.
const CHARS_PER_TOKEN_BUDGET: usize = 4;

/// Truncates `content` to at most `budget_tokens * CHARS_PER_TOKEN_BUDGET`
/// characters, on a character boundary.
fn truncate_to_context_budget(content: &str, budget_tokens: u32) -> String {
    let max_chars = budget_tokens as usize * CHARS_PER_TOKEN_BUDGET;
    if content.chars().count() <= max_chars {
        content.to_string()
    } else {
        content.chars().take(max_chars).collect()
    }
}

/// Removes quarantined technique IDs from `text` on word boundaries,
/// deny-by-default, so a hallucinated ID cannot drive playbook selection,
/// severity escalation, or FP matching downstream.
fn strip_quarantined_ids(text: &str, quarantined: &[String]) -> String {
    if quarantined.is_empty() {
        return text.to_string();
    }
    let mut current = text.to_string();
    for tid in quarantined {
        #[allow(clippy::expect_used, reason = "regex::escape output is always a valid pattern.")]
        let pattern = Regex::new(&format!(r"\b{}\b", regex::escape(tid))).expect("escaped technique id is a valid regex");
        current = pattern.replace_all(&current, "").into_owned();
    }
    current
}

/// Centralised LLM sanitisation and output-validation service.
pub struct ContextGateway<C, S: AuditSink> {
    client: RetryingLlmClient<C>,
    adapter: Box<dyn PromptAdapter>,
    spend_guard: Mutex<SpendGuard>,
    known_technique_ids: Option<HashSet<String>>,
    audit_producer: Option<AuditProducer<S>>,
    config: GatewayConfig,
}

impl<C: LlmClient, S: AuditSink> ContextGateway<C, S> {
    /// Builds a Context Gateway over `client`, configured per `config`.
    #[must_use]
    pub fn new(client: C, config: GatewayConfig, known_technique_ids: Option<HashSet<String>>, audit_producer: Option<AuditProducer<S>>) -> Self {
        let adapter = get_adapter(config.provider);
        Self {
            client: RetryingLlmClient::new(client),
            adapter,
            spend_guard: Mutex::new(SpendGuard::new(config.monthly_hard_cap_usd, config.monthly_soft_alert_usd)),
            known_technique_ids,
            audit_producer,
            config,
        }
    }

    /// Runs the full Gateway pipeline for `request` at time `now`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::SpendLimitExceeded`] if the monthly hard cap
    /// has already been reached, or [`GatewayError::LlmCallFailed`] if the
    /// underlying LLM call fails after retries are exhausted.
    ///
    /// # Panics
    ///
    /// Panics if the internal spend-guard mutex is poisoned by a prior
    /// panicking holder.
    pub async fn complete(&self, request: GatewayRequest, now: Timestamp) -> Result<GatewayResponse, GatewayError> {
        #[allow(clippy::expect_used, reason = "A poisoned mutex indicates a prior panic elsewhere; we cannot recover.")]
        {
            self.spend_guard.lock().expect("spend guard mutex poisoned").check_budget(&now)?;
        }

        let (sanitised_content, detections) = sanitise_input(&request.user_content);

        let mut redactor = PiiRedactor::new();
        let redacted_content = redactor.redact(&sanitised_content, &[]);

        let context_budget = self.config.context_budget_for_tier(request.tier);
        let bounded_content = truncate_to_context_budget(&redacted_content, context_budget);

        let system_blocks = self.adapter.adapt_system(&request.system_prompt);
        let messages = self.adapter.adapt_messages(&bounded_content);

        let completion_request =
            CompletionRequest { system: system_blocks, messages, model: Some(self.config.default_model.clone()), max_tokens: context_budget };
        let (response_text, metrics) = self.client.complete(completion_request).await?;

        let outcome = validate_output(&response_text, self.known_technique_ids.as_ref(), request.output_schema.as_ref());

        let raw_output = response_text.clone();
        let stripped_text = strip_quarantined_ids(&response_text, &outcome.quarantined_ids);

        if !outcome.quarantined_ids.is_empty() {
            self.emit_technique_quarantined(&outcome.quarantined_ids, &request, now);
        }
        self.emit_routing_tier_selected(&request, &metrics, now);

        let final_text = redactor.deanonymise(&stripped_text);

        {
            #[allow(clippy::expect_used, reason = "A poisoned mutex indicates a prior panic elsewhere; we cannot recover.")]
            let mut guard = self.spend_guard.lock().expect("spend guard mutex poisoned");
            guard.record(
                SpendRecord {
                    tenant_id: request.tenant_id.clone(),
                    model: self.config.default_model.clone(),
                    input_tokens: metrics.input_tokens,
                    output_tokens: metrics.output_tokens,
                    cost_usd: metrics.cost_usd,
                    timestamp: now,
                },
                &now,
            );
        }

        Ok(GatewayResponse {
            content: final_text,
            model_id: self.config.default_model.clone(),
            tokens_used: metrics.input_tokens + metrics.output_tokens,
            valid: outcome.valid,
            raw_output,
            validation_errors: outcome.errors,
            quarantined_ids: outcome.quarantined_ids,
            metrics,
            injection_detections: detections,
        })
    }

    fn emit_technique_quarantined(&self, quarantined: &[String], request: &GatewayRequest, now: Timestamp) {
        let Some(producer) = &self.audit_producer else { return };
        for tid in quarantined {
            producer.emit(
                EmitRequest {
                    tenant_id: request.tenant_id.clone(),
                    event_type: Some(EventTaxonomy::TechniqueQuarantined),
                    actor_type: Some(ActorType::Agent),
                    actor_id: request.agent_id.clone(),
                    context: AuditContext { techniques_quarantined: vec![tid.clone()], ..Default::default() },
                    ..EmitRequest::default()
                },
                now,
            );
        }
    }

    fn emit_routing_tier_selected(&self, request: &GatewayRequest, metrics: &ApiCallMetrics, now: Timestamp) {
        let Some(producer) = &self.audit_producer else { return };
        #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation, reason = "Latency is always non-negative and far below u64::MAX milliseconds.")]
        let latency_ms = metrics.latency_ms as u64;
        let context = build_llm_context(
            provider_label(self.config.provider),
            &self.config.default_model,
            &self.config.model_tier,
            metrics.input_tokens,
            metrics.output_tokens,
            metrics.cost_usd,
            latency_ms,
        );
        producer.emit(
            EmitRequest {
                tenant_id: request.tenant_id.clone(),
                event_type: Some(EventTaxonomy::RoutingTierSelected),
                actor_type: Some(ActorType::Agent),
                actor_id: request.agent_id.clone(),
                context,
                ..EmitRequest::default()
            },
            now,
        );
    }
}

fn provider_label(provider: crate::prompt_adapter::LlmProvider) -> &'static str {
    match provider {
        crate::prompt_adapter::LlmProvider::Anthropic => "anthropic",
        crate::prompt_adapter::LlmProvider::OpenAi => "openai",
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

    use async_trait::async_trait;
    use warden_audit::LogSink;
    use warden_core::TenantId;

    use super::*;
    use crate::config::DEFAULT_CONTEXT_BUDGET_TIER_2;
    use crate::llm_client::LlmCallError;
    use crate::prompt_adapter::LlmProvider;

    struct StubClient;

    #[async_trait]
    impl LlmClient for StubClient {
        fn provider(&self) -> LlmProvider {
            LlmProvider::Anthropic
        }

        async fn complete(&self, _request: CompletionRequest) -> Result<(String, ApiCallMetrics), LlmCallError> {
            Ok(("classification: T1059 seen, also T9999".to_string(), ApiCallMetrics { input_tokens: 10, output_tokens: 5, ..Default::default() }))
        }
    }

    #[derive(Clone, Default)]
    struct Captured {
        max_tokens: Arc<Mutex<Option<u32>>>,
        content_len: Arc<Mutex<Option<usize>>>,
    }

    struct CapturingClient {
        captured: Captured,
    }

    #[async_trait]
    impl LlmClient for CapturingClient {
        fn provider(&self) -> LlmProvider {
            LlmProvider::Anthropic
        }

        async fn complete(&self, request: CompletionRequest) -> Result<(String, ApiCallMetrics), LlmCallError> {
            *self.captured.max_tokens.lock().expect("lock") = Some(request.max_tokens);
            *self.captured.content_len.lock().expect("lock") = Some(request.messages.iter().map(|message| message.to_string().len()).sum());
            Ok(("classification: benign".to_string(), ApiCallMetrics::default()))
        }
    }

    fn now() -> Timestamp {
        Timestamp::parse("2026-07-28T00:00:00Z").expect("parse")
    }

    #[tokio::test]
    async fn full_pipeline_strips_unknown_technique_and_restores_pii() {
        let known: HashSet<String> = ["T1059".to_string()].into_iter().collect();
        let gateway = ContextGateway::new(
            StubClient,
            GatewayConfig::new(LlmProvider::Anthropic, "claude-sonnet-4-5-20250929"),
            Some(known),
            Some(AuditProducer::new(LogSink::new())),
        );

        let request = GatewayRequest {
            agent_id: "agent-1".to_string(),
            task_type: "triage".to_string(),
            system_prompt: "Classify the alert.".to_string(),
            user_content: "host 10.0.0.5 connected outbound".to_string(),
            output_schema: None,
            tenant_id: TenantId::new("t1"),
            tier: 0,
        };

        let response = gateway.complete(request, now()).await.expect("pipeline succeeds");
        assert!(!response.valid);
        assert_eq!(response.quarantined_ids, vec!["T9999".to_string()]);
        assert!(!response.content.contains("T9999"));
        assert!(response.content.contains("T1059"));
        assert!(response.raw_output.contains("T9999"));
    }

    #[tokio::test]
    async fn tier_two_call_gets_the_largest_context_budget_and_is_truncated_to_it() {
        let captured = Captured::default();
        let gateway: ContextGateway<CapturingClient, LogSink> = ContextGateway::new(
            CapturingClient { captured: captured.clone() },
            GatewayConfig::new(LlmProvider::Anthropic, "claude-sonnet-4-5-20250929"),
            None,
            None,
        );

        let oversized = "a".repeat(200_000);
        let request = GatewayRequest {
            agent_id: "agent-1".to_string(),
            task_type: "triage".to_string(),
            system_prompt: "Classify.".to_string(),
            user_content: oversized,
            output_schema: None,
            tenant_id: TenantId::new("t1"),
            tier: 2,
        };

        gateway.complete(request, now()).await.expect("pipeline succeeds");
        assert_eq!(captured.max_tokens.lock().expect("lock").expect("captured"), DEFAULT_CONTEXT_BUDGET_TIER_2);
        let captured_len = captured.content_len.lock().expect("lock").expect("captured");
        assert!(captured_len <= (DEFAULT_CONTEXT_BUDGET_TIER_2 as usize * CHARS_PER_TOKEN_BUDGET) + 64);
    }

    #[test]
    fn truncate_to_context_budget_caps_at_four_chars_per_token() {
        let content = "a".repeat(100);
        let truncated = truncate_to_context_budget(&content, 10);
        assert_eq!(truncated.chars().count(), 40);
    }

    #[test]
    fn truncate_to_context_budget_leaves_short_content_untouched() {
        let content = "short";
        assert_eq!(truncate_to_context_budget(content, 10), content);
    }

    #[tokio::test]
    async fn hard_cap_blocks_dispatch_before_any_llm_call() {
        let mut config = GatewayConfig::new(LlmProvider::Anthropic, "claude-sonnet-4-5-20250929");
        config.monthly_hard_cap_usd = 0.0;
        config.monthly_soft_alert_usd = 0.0;
        let gateway: ContextGateway<StubClient, LogSink> = ContextGateway::new(StubClient, config, None, None);

        let request = GatewayRequest {
            agent_id: "agent-1".to_string(),
            task_type: "triage".to_string(),
            system_prompt: "Classify.".to_string(),
            user_content: "benign".to_string(),
            output_schema: None,
            tenant_id: TenantId::new("t1"),
            tier: 0,
        };

        let result = gateway.complete(request, now()).await;
        assert!(matches!(result, Err(GatewayError::SpendLimitExceeded(_))));
    }
}
