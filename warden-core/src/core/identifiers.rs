// warden-core/src/core/identifiers.rs
// ============================================================================
// Module: Warden Identifiers
// Description: Canonical opaque identifiers shared across Warden crates.
// Purpose: Provide strongly typed, serializable IDs with stable string forms.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Opaque string-based identifiers used throughout Warden. Identifiers
//! serialize as plain strings; validation (format, uniqueness) is the
//! responsibility of the boundary that mints them, not of these wrappers.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Macro
// ============================================================================

macro_rules! newtype_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self::new(value)
            }
        }
    };
}

newtype_id!(
    /// Tenant identifier scoped to all Warden operations.
    TenantId
);
newtype_id!(
    /// Stable identifier of a normalised alert.
    AlertId
);
newtype_id!(
    /// Identifier of a durable investigation.
    InvestigationId
);
newtype_id!(
    /// Identifier of a governed false-positive pattern.
    PatternId
);
newtype_id!(
    /// Identifier of an audit record.
    AuditId
);
newtype_id!(
    /// Correlation identifier threaded across an alert's agents, decisions and dispatches.
    CorrelationId
);
newtype_id!(
    /// Identifier of a single entity within an alert's entity bundle.
    EntityId
);

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions are permitted."
)]
mod tests {
    use super::TenantId;

    #[test]
    fn round_trips_through_display_and_as_str() {
        let id = TenantId::new("t1");
        assert_eq!(id.as_str(), "t1");
        assert_eq!(id.to_string(), "t1");
    }

    #[test]
    fn serializes_as_a_bare_string() {
        let id = TenantId::new("t1");
        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, "\"t1\"");
    }
}
