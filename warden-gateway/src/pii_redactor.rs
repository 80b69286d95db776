// warden-gateway/src/pii_redactor.rs
// ============================================================================
// Module: PII Redaction
// Description: Reversible placeholder substitution for PII in free text.
// Purpose: Replace real entity values with stable placeholders before an
//          LLM call, and restore them once a response comes back.
// Dependencies: regex, warden-core::RedactionMap
// ============================================================================

//! ## Overview
//! [`PiiRedactor`] wraps a [`warden_core::RedactionMap`] with the counters
//! needed to mint stable, incrementing placeholders (`IP_SRC_001`,
//! `USER_001`, ...). Explicit values (already-parsed entities) are redacted
//! before the regex fallback so an explicit field always wins a collision
//! against a coincidental regex match over the same substring. Restoration
//! is delegated to [`warden_core::RedactionMap::restore`], which replaces
//! longest placeholders first to avoid partial-token collisions.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use warden_core::RedactionMap;

static IP_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used, reason = "Pattern is a fixed string literal verified by tests.")]
    Regex::new(r"\b(?:\d{1,3}\.){3}\d{1,3}\b").expect("ip pattern is valid regex")
});

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used, reason = "Pattern is a fixed string literal verified by tests.")]
    Regex::new(r"\b[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}\b").expect("email pattern is valid regex")
});

/// Redacts PII into stable placeholders, reusing one [`RedactionMap`] and
/// per-prefix counters across every call made within an investigation so
/// the same real value always maps to the same placeholder.
#[derive(Debug, Default, Clone)]
pub struct PiiRedactor {
    map: RedactionMap,
    forward: HashMap<String, String>,
    counters: HashMap<String, u32>,
}

impl PiiRedactor {
    /// Creates an empty redactor.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the existing placeholder for `real_value`, or mints a new
    /// one under `prefix` (`{prefix}_{counter:03}`).
    fn get_or_create(&mut self, real_value: &str, prefix: &str) -> String {
        if let Some(existing) = self.forward.get(real_value) {
            return existing.clone();
        }
        let counter = self.counters.entry(prefix.to_string()).or_insert(0);
        *counter += 1;
        let placeholder = format!("{prefix}_{:03}", *counter);
        self.forward.insert(real_value.to_string(), placeholder.clone());
        self.map.insert(placeholder.clone(), real_value.to_string());
        placeholder
    }

    /// Redacts `text` in place: explicit `(real_value, prefix)` pairs first,
    /// then IP addresses, then email-shaped strings. Returns the redacted
    /// text; the redactor's internal map accumulates across calls.
    #[must_use]
    pub fn redact(&mut self, text: &str, extra_values: &[(&str, &str)]) -> String {
        let mut current = text.to_string();

        for &(value, prefix) in extra_values {
            if value.is_empty() {
                continue;
            }
            let placeholder = self.get_or_create(value, prefix);
            current = current.replace(value, &placeholder);
        }

        let ip_matches: Vec<String> = IP_RE.find_iter(&current).map(|m| m.as_str().to_string()).collect();
        for value in ip_matches {
            let placeholder = self.get_or_create(&value, "IP_SRC");
            current = current.replace(&value, &placeholder);
        }

        let email_matches: Vec<String> = EMAIL_RE.find_iter(&current).map(|m| m.as_str().to_string()).collect();
        for value in email_matches {
            let placeholder = self.get_or_create(&value, "USER");
            current = current.replace(&value, &placeholder);
        }

        current
    }

    /// Restores every placeholder recorded so far in `text` to its original
    /// value, longest placeholder first.
    #[must_use]
    pub fn deanonymise(&self, text: &str) -> String {
        self.map.restore(text)
    }

    /// Borrows the accumulated redaction map, e.g. to persist alongside an
    /// investigation so a later call can continue reusing placeholders.
    #[must_use]
    pub const fn map(&self) -> &RedactionMap {
        &self.map
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
    fn ip_address_is_redacted_and_restorable() {
        let mut redactor = PiiRedactor::new();
        let redacted = redactor.redact("connection from 10.0.0.5 observed", &[]);
        assert!(redacted.contains("IP_SRC_001"));
        assert_eq!(redactor.deanonymise(&redacted), "connection from 10.0.0.5 observed");
    }

    #[test]
    fn repeated_value_reuses_the_same_placeholder() {
        let mut redactor = PiiRedactor::new();
        let redacted = redactor.redact("10.0.0.5 talked to 10.0.0.5 again", &[]);
        assert_eq!(redacted, "IP_SRC_001 talked to IP_SRC_001 again");
    }

    #[test]
    fn explicit_values_take_priority_over_regex_fallback() {
        let mut redactor = PiiRedactor::new();
        let redacted = redactor.redact("user a@example.com logged in", &[("a@example.com", "USER")]);
        assert!(redacted.contains("USER_001"));
        assert!(!redacted.contains('@'));
    }

    #[test]
    fn many_distinct_ips_get_distinct_counters() {
        let mut redactor = PiiRedactor::new();
        let redacted = redactor.redact("10.0.0.1 then 10.0.0.2 then 10.0.0.1", &[]);
        assert!(redacted.contains("IP_SRC_001"));
        assert!(redacted.contains("IP_SRC_002"));
        assert_eq!(redactor.deanonymise(&redacted), "10.0.0.1 then 10.0.0.2 then 10.0.0.1");
    }
}
