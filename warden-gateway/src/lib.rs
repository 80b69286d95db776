// warden-gateway/src/lib.rs
// ============================================================================
// Module: Warden Gateway Library
// Description: Public API surface for the Context Gateway.
// Purpose: The sole path any agent takes to reach an LLM: sanitise, redact,
//          prompt, call, validate, strip, audit, deanonymise, meter.
// Dependencies: crate::{injection_detector, injection_classifier,
//               pii_redactor, evidence_builder, output_validator,
//               summarizer, spend_guard, prompt_builder, prompt_adapter,
//               llm_client, gateway, error, config}
// ============================================================================

//! ## Overview
//! Warden Gateway is the only seam between an agent and an LLM provider.
//! Every module here exists to make that seam hard to bypass and safe to
//! reason about: untrusted alert content is sanitised and redacted before
//! it leaves the process, responses are validated and quarantined before
//! they can drive automation, and every call is metered against a
//! per-tenant budget.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod error;
pub mod evidence_builder;
pub mod gateway;
pub mod injection_classifier;
pub mod injection_detector;
pub mod llm_client;
pub mod output_validator;
pub mod pii_redactor;
pub mod prompt_adapter;
pub mod prompt_builder;
pub mod spend_guard;
pub mod summarizer;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::GatewayConfig;
pub use error::GatewayError;
pub use evidence_builder::EvidenceBlock;
pub use evidence_builder::escape_xml_tags;
pub use gateway::ContextGateway;
pub use gateway::GatewayRequest;
pub use gateway::GatewayResponse;
pub use injection_classifier::CombinedInjectionClassifier;
pub use injection_classifier::InjectionAction;
pub use injection_classifier::InjectionClassification;
pub use injection_classifier::InjectionOpinion;
pub use injection_classifier::InjectionRisk;
pub use injection_classifier::RegexInjectionClassifier;
pub use injection_detector::sanitise_input;
pub use llm_client::ApiCallMetrics;
pub use llm_client::CompletionRequest;
pub use llm_client::LlmCallError;
pub use llm_client::LlmClient;
pub use llm_client::ModelPricing;
pub use llm_client::RetryingLlmClient;
pub use llm_client::compute_cost;
pub use output_validator::ValidationOutcome;
pub use output_validator::validate_output;
pub use pii_redactor::PiiRedactor;
pub use prompt_adapter::AnthropicPromptAdapter;
pub use prompt_adapter::LlmProvider;
pub use prompt_adapter::OpenAiPromptAdapter;
pub use prompt_adapter::PromptAdapter;
pub use prompt_adapter::get_adapter;
pub use prompt_builder::SYSTEM_PREFIX;
pub use prompt_builder::build_cached_system_blocks;
pub use prompt_builder::build_system_prompt;
pub use spend_guard::SpendGuard;
pub use spend_guard::SpendLimitExceeded;
pub use summarizer::extract_entities;
pub use summarizer::extract_facts;
pub use summarizer::remove_instructions;
pub use summarizer::summarize;
pub use summarizer::transform_content;
