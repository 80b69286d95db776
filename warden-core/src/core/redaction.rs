// warden-core/src/core/redaction.rs
// ============================================================================
// Module: Redaction Map
// Description: Bidirectional token map for PII removed before an LLM call.
// Purpose: Let the Gateway redact on the way out and restore on the way in.
// Dependencies: serde, std::collections
// ============================================================================

//! ## Overview
//! The Gateway replaces PII substrings with stable placeholder tokens
//! before handing text to an LLM, then reverses the substitution on the
//! model's response. A [`RedactionMap`] is the record of that substitution,
//! scoped to a single Gateway call so tokens never leak across tenants or
//! investigations.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Redaction Map
// ============================================================================

/// A bidirectional map between placeholder tokens (e.g. `[IP_1]`) and the
/// original PII substrings they stand in for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedactionMap {
    token_to_original: HashMap<String, String>,
}

impl RedactionMap {
    /// Creates an empty redaction map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a new `token -> original` mapping. Overwrites any existing
    /// mapping for the same token.
    pub fn insert(&mut self, token: impl Into<String>, original: impl Into<String>) {
        self.token_to_original.insert(token.into(), original.into());
    }

    /// Looks up the original value for a placeholder token.
    #[must_use]
    pub fn original_for(&self, token: &str) -> Option<&str> {
        self.token_to_original.get(token).map(String::as_str)
    }

    /// Number of distinct tokens recorded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.token_to_original.len()
    }

    /// Returns true if no tokens have been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.token_to_original.is_empty()
    }

    /// Replaces every occurrence of a recorded token in `text` with its
    /// original value. Tokens not present in `text` are left untouched;
    /// text with no recorded tokens is returned unchanged.
    ///
    /// Tokens are replaced longest-first so that one token which happens to
    /// be a prefix of another (`[IP_1]` vs `[IP_10]`) never shadows it.
    #[must_use]
    pub fn restore(&self, text: &str) -> String {
        let mut tokens: Vec<&str> = self.token_to_original.keys().map(String::as_str).collect();
        tokens.sort_unstable_by_key(|token| std::cmp::Reverse(token.len()));

        let mut restored = text.to_string();
        for token in tokens {
            #[allow(clippy::indexing_slicing, reason = "token was just drawn from token_to_original's own keys.")]
            let original = self.token_to_original[token].as_str();
            restored = restored.replace(token, original);
        }
        restored
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions are permitted."
)]
mod tests {
    use super::RedactionMap;

    #[test]
    fn restore_reverses_a_single_substitution() {
        let mut map = RedactionMap::new();
        map.insert("[IP_1]", "10.0.0.5");
        let redacted = "connection from [IP_1] observed";
        assert_eq!(map.restore(redacted), "connection from 10.0.0.5 observed");
    }

    #[test]
    fn restore_is_idempotent_on_text_with_no_tokens() {
        let map = RedactionMap::new();
        assert_eq!(map.restore("no tokens here"), "no tokens here");
    }

    #[test]
    fn restore_handles_multiple_distinct_tokens() {
        let mut map = RedactionMap::new();
        map.insert("[IP_1]", "10.0.0.5");
        map.insert("[EMAIL_1]", "a@example.com");
        let redacted = "[IP_1] contacted by [EMAIL_1]";
        assert_eq!(map.restore(redacted), "10.0.0.5 contacted by a@example.com");
    }

    #[test]
    fn restore_handles_prefix_shadowing_tokens_longest_first() {
        let mut map = RedactionMap::new();
        map.insert("IP_SRC_1", "10.0.0.5");
        map.insert("IP_SRC_10", "10.0.0.50");
        let redacted = "seen from IP_SRC_10 and IP_SRC_1";
        assert_eq!(map.restore(redacted), "seen from 10.0.0.50 and 10.0.0.5");
    }
}
