// warden-core/src/core/entity.rs
// ============================================================================
// Module: Typed Entity Bundle
// Description: Normalised entities extracted from an alert, grouped by type.
// Purpose: Give agents a typed surface over otherwise untyped vendor fields.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! The entity parser (out of scope) narrows a vendor payload into this
//! bundle. Everything past that boundary is typed; only
//! [`NormalizedEntity::properties`] remains an untyped map, matching the
//! source's own dynamic-typing remnant (see design notes).

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

// ============================================================================
// SECTION: Entity Type
// ============================================================================

/// All entity types that may appear in an alert's entity bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityType {
    /// A user or service account.
    Account,
    /// A host or endpoint.
    Host,
    /// An IP address.
    Ip,
    /// A file path or artifact.
    File,
    /// A running or historical process.
    Process,
    /// A URL.
    Url,
    /// A DNS record.
    Dns,
    /// A file hash (MD5/SHA1/SHA256).
    Filehash,
    /// A mailbox.
    Mailbox,
    /// A mail message.
    Mailmessage,
    /// A registry key.
    RegistryKey,
    /// A registry value.
    RegistryValue,
    /// A security group.
    SecurityGroup,
    /// A cloud application.
    CloudApplication,
    /// A malware family or sample identifier.
    Malware,
}

// ============================================================================
// SECTION: Normalized Entity
// ============================================================================

/// A single normalised entity extracted from an alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedEntity {
    /// The entity's type.
    pub entity_type: EntityType,
    /// The entity's primary string value (e.g. an IP literal, an account name).
    pub primary_value: String,
    /// Untyped, vendor-specific properties. Never propagated past the agent
    /// that reads it; narrow on access.
    #[serde(default)]
    pub properties: BTreeMap<String, Value>,
    /// Extraction confidence in `[0, 1]`.
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    /// Optional identifier linking this entity back to the raw payload.
    #[serde(default)]
    pub source_id: Option<String>,
}

fn default_confidence() -> f64 {
    1.0
}

// ============================================================================
// SECTION: Entity Bundle
// ============================================================================

/// Typed container for every entity parsed from a single alert.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityBundle {
    /// Account entities.
    #[serde(default)]
    pub accounts: Vec<NormalizedEntity>,
    /// Host entities.
    #[serde(default)]
    pub hosts: Vec<NormalizedEntity>,
    /// IP entities.
    #[serde(default)]
    pub ips: Vec<NormalizedEntity>,
    /// File entities.
    #[serde(default)]
    pub files: Vec<NormalizedEntity>,
    /// Process entities.
    #[serde(default)]
    pub processes: Vec<NormalizedEntity>,
    /// URL entities.
    #[serde(default)]
    pub urls: Vec<NormalizedEntity>,
    /// DNS entities.
    #[serde(default)]
    pub dns_records: Vec<NormalizedEntity>,
    /// File-hash entities.
    #[serde(default)]
    pub file_hashes: Vec<NormalizedEntity>,
    /// Mailbox entities.
    #[serde(default)]
    pub mailboxes: Vec<NormalizedEntity>,
    /// Entities that did not fit another named bucket.
    #[serde(default)]
    pub other: Vec<NormalizedEntity>,
    /// Raw indicator-of-compromise strings that could not be typed.
    #[serde(default)]
    pub raw_iocs: Vec<String>,
    /// Parse errors encountered while building this bundle.
    #[serde(default)]
    pub parse_errors: Vec<String>,
}

impl EntityBundle {
    /// Returns the entity list for a given type, using the same plural
    /// bucket names the FP matcher and enrichment agents rely on.
    #[must_use]
    pub fn entities_of(&self, entity_type: EntityType) -> &[NormalizedEntity] {
        match entity_type {
            EntityType::Account => &self.accounts,
            EntityType::Host => &self.hosts,
            EntityType::Ip => &self.ips,
            EntityType::File => &self.files,
            EntityType::Process => &self.processes,
            EntityType::Url => &self.urls,
            EntityType::Dns => &self.dns_records,
            EntityType::Filehash => &self.file_hashes,
            EntityType::Mailbox => &self.mailboxes,
            EntityType::Mailmessage
            | EntityType::RegistryKey
            | EntityType::RegistryValue
            | EntityType::SecurityGroup
            | EntityType::CloudApplication
            | EntityType::Malware => &self.other,
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
    use super::EntityBundle;
    use super::EntityType;
    use super::NormalizedEntity;

    fn entity(value: &str) -> NormalizedEntity {
        NormalizedEntity {
            entity_type: EntityType::Account,
            primary_value: value.to_string(),
            properties: std::collections::BTreeMap::new(),
            confidence: 1.0,
            source_id: None,
        }
    }

    #[test]
    fn entities_of_selects_the_matching_bucket() {
        let mut bundle = EntityBundle::default();
        bundle.accounts.push(entity("service-account-01"));
        let found = bundle.entities_of(EntityType::Account);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].primary_value, "service-account-01");
    }

    #[test]
    fn unmapped_types_fall_back_to_other() {
        let bundle = EntityBundle::default();
        assert!(bundle.entities_of(EntityType::Malware).is_empty());
    }
}
