// warden-gateway/src/prompt_adapter.rs
// ============================================================================
// Module: Prompt Adapter
// Description: Translates an internal prompt into provider-specific
//              message structures.
// Purpose: Keep the rest of the Gateway pipeline provider-agnostic; only
//          this seam knows the wire shape a given LLM provider expects.
// Dependencies: crate::prompt_builder
// ============================================================================

//! ## Overview
//! [`PromptAdapter`] is the one place provider wire formats are known.
//! Adding a new provider means adding a new impl, never touching the
//! gateway pipeline itself.

use serde_json::Value;
use serde_json::json;

use crate::prompt_builder::build_cached_system_blocks;
use crate::prompt_builder::build_system_prompt;

/// An LLM provider a [`PromptAdapter`] can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LlmProvider {
    /// Anthropic Messages API.
    Anthropic,
    /// OpenAI Chat Completions API.
    OpenAi,
}

/// Translates an internal prompt and output schema into the message shape
/// a specific provider's API expects.
pub trait PromptAdapter: Send + Sync {
    /// Which provider this adapter targets.
    fn provider(&self) -> LlmProvider;

    /// Builds the `system` parameter for this provider.
    fn adapt_system(&self, task_prompt: &str) -> Vec<Value>;

    /// Builds the `messages` parameter for this provider.
    fn adapt_messages(&self, user_content: &str) -> Vec<Value>;

    /// Translates an output schema into whatever response-shaping
    /// parameter this provider supports, if any.
    fn adapt_output_schema(&self, schema: Option<&Value>) -> Option<Value>;
}

/// Anthropic Messages API format with `cache_control` blocks.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnthropicPromptAdapter;

impl PromptAdapter for AnthropicPromptAdapter {
    fn provider(&self) -> LlmProvider {
        LlmProvider::Anthropic
    }

    fn adapt_system(&self, task_prompt: &str) -> Vec<Value> {
        build_cached_system_blocks(task_prompt)
    }

    fn adapt_messages(&self, user_content: &str) -> Vec<Value> {
        vec![json!({"role": "user", "content": user_content})]
    }

    fn adapt_output_schema(&self, schema: Option<&Value>) -> Option<Value> {
        schema.cloned()
    }
}

/// OpenAI Chat Completions API format.
#[derive(Debug, Default, Clone, Copy)]
pub struct OpenAiPromptAdapter;

impl PromptAdapter for OpenAiPromptAdapter {
    fn provider(&self) -> LlmProvider {
        LlmProvider::OpenAi
    }

    fn adapt_system(&self, task_prompt: &str) -> Vec<Value> {
        let full_prompt = build_system_prompt(task_prompt);
        vec![json!({"role": "system", "content": full_prompt})]
    }

    fn adapt_messages(&self, user_content: &str) -> Vec<Value> {
        vec![json!({"role": "user", "content": user_content})]
    }

    fn adapt_output_schema(&self, schema: Option<&Value>) -> Option<Value> {
        schema.map(|_| json!({"response_format": {"type": "json_object"}}))
    }
}

/// Returns the prompt adapter for `provider`.
#[must_use]
pub fn get_adapter(provider: LlmProvider) -> Box<dyn PromptAdapter> {
    match provider {
        LlmProvider::Anthropic => Box::new(AnthropicPromptAdapter),
        LlmProvider::OpenAi => Box::new(OpenAiPromptAdapter),
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions are permitted."
)]
mod tests {
    use super::*;

    #[test]
    fn anthropic_adapter_produces_cached_system_blocks() {
        let adapter = get_adapter(LlmProvider::Anthropic);
        let blocks = adapter.adapt_system("task");
        assert_eq!(blocks[0]["cache_control"]["type"], "ephemeral");
    }

    #[test]
    fn openai_adapter_produces_plain_system_message() {
        let adapter = get_adapter(LlmProvider::OpenAi);
        let blocks = adapter.adapt_system("task");
        assert_eq!(blocks[0]["role"], "system");
        assert!(blocks[0]["cache_control"].is_null());
    }

    #[test]
    fn openai_adapter_maps_any_schema_to_json_object_mode() {
        let adapter = get_adapter(LlmProvider::OpenAi);
        let adapted = adapter.adapt_output_schema(Some(&json!({"type": "object"})));
        assert_eq!(adapted, Some(json!({"response_format": {"type": "json_object"}})));
        assert_eq!(adapter.adapt_output_schema(None), None);
    }
}
