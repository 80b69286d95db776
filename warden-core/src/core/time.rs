// warden-core/src/core/time.rs
// ============================================================================
// Module: Warden Timestamps
// Description: UTC, millisecond-precision timestamps for audit-grade records.
// Purpose: Provide one canonical timestamp type for decision entries, audit
//          records, and governance dates.
// Dependencies: time
// ============================================================================

//! ## Overview
//! All durable Warden records carry timestamps in ISO-8601 / RFC 3339 form,
//! UTC, millisecond precision, with a trailing `Z`. This module centralizes
//! that formatting so every crate in the workspace produces identical
//! timestamp strings.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

// ============================================================================
// SECTION: Timestamp
// ============================================================================

/// A UTC timestamp serialized as millisecond-precision RFC 3339.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(OffsetDateTime);

impl Timestamp {
    /// Builds a timestamp from an existing `OffsetDateTime`, normalised to UTC.
    #[must_use]
    pub fn new(at: OffsetDateTime) -> Self {
        Self(at.to_offset(time::UtcOffset::UTC))
    }

    /// Returns the underlying `OffsetDateTime`.
    #[must_use]
    pub const fn as_offset_date_time(&self) -> OffsetDateTime {
        self.0
    }

    /// Returns this timestamp plus the given number of whole days.
    #[must_use]
    pub fn plus_days(&self, days: i64) -> Self {
        Self(self.0 + time::Duration::days(days))
    }

    /// Returns this timestamp plus the given number of whole hours, used for
    /// approval-gate deadlines.
    #[must_use]
    pub fn plus_hours(&self, hours: i64) -> Self {
        Self(self.0 + time::Duration::hours(hours))
    }

    /// Returns whether `self` is strictly before `other`.
    #[must_use]
    pub fn is_before(&self, other: &Self) -> bool {
        self.0 < other.0
    }

    /// Returns the whole number of days between `self` and an earlier timestamp.
    #[must_use]
    pub fn days_since(&self, earlier: &Self) -> f64 {
        (self.0 - earlier.0).as_seconds_f64() / 86_400.0
    }

    /// Formats this timestamp as millisecond-precision RFC 3339 with a
    /// trailing `Z`, matching the audit-record wire format.
    #[must_use]
    pub fn to_rfc3339_millis(&self) -> String {
        let formatted = self.0.format(&Rfc3339).unwrap_or_default();
        // `Rfc3339` already yields a `Z`-suffixed UTC string; truncate the
        // fractional-second component down to milliseconds to match the
        // audit wire format exactly.
        truncate_to_millis(&formatted)
    }

    /// Parses an RFC 3339 string into a `Timestamp`.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` is not valid RFC 3339.
    pub fn parse(value: &str) -> Result<Self, time::error::Parse> {
        OffsetDateTime::parse(value, &Rfc3339).map(Self::new)
    }
}

fn truncate_to_millis(formatted: &str) -> String {
    let Some(dot) = formatted.find('.') else {
        return formatted.to_string();
    };
    let Some(z_offset) = formatted[dot..].find('Z') else {
        return formatted.to_string();
    };
    let z_pos = dot + z_offset;
    let frac_len = (z_pos - dot - 1).min(3);
    format!("{}{}Z", &formatted[..dot], &formatted[dot..=dot + frac_len])
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_rfc3339_millis())
    }
}

impl Serialize for Timestamp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_rfc3339_millis())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions are permitted."
)]
mod tests {
    use super::Timestamp;
    use time::macros::datetime;

    #[test]
    fn formats_with_millisecond_precision_and_trailing_z() {
        let ts = Timestamp::new(datetime!(2026 - 07 - 28 10:15:30.123456 UTC));
        assert_eq!(ts.to_rfc3339_millis(), "2026-07-28T10:15:30.123Z");
    }

    #[test]
    fn parse_round_trips() {
        let ts = Timestamp::new(datetime!(2026 - 01 - 01 00:00:00 UTC));
        let text = ts.to_rfc3339_millis();
        let parsed = Timestamp::parse(&text).expect("parse");
        assert_eq!(parsed.to_rfc3339_millis(), text);
    }

    #[test]
    fn plus_days_advances_expiry_by_ninety_days() {
        let approved = Timestamp::new(datetime!(2026 - 01 - 01 00:00:00 UTC));
        let expiry = approved.plus_days(90);
        assert!((expiry.days_since(&approved) - 90.0).abs() < 0.001);
    }

    #[test]
    fn plus_hours_advances_the_approval_deadline() {
        let requested = Timestamp::new(datetime!(2026 - 01 - 01 00:00:00 UTC));
        let deadline = requested.plus_hours(4);
        assert!(requested.is_before(&deadline));
        assert!((deadline.days_since(&requested) - 4.0 / 24.0).abs() < 0.001);
    }
}
