// warden-governance/src/fp_matcher.rs
// ============================================================================
// Module: False-Positive Short-Circuit Matcher
// Description: Pre-LLM matching of an alert against governed FP patterns.
// Purpose: Resolve the common case cheaply, before any Gateway spend, while
//          staying provably conservative: kill switches and scope always
//          win over a high confidence score.
// Dependencies: regex, std::net, warden-core
// ============================================================================

//! ## Overview
//! [`FpShortCircuitMatcher::evaluate`] walks the hot-cache pattern set in
//! scope order, checks kill switches last (they are rare but absolute), and
//! declares a match only once `confidence = (alert_name_score +
//! entity_score) / 2` clears [`warden_core::FP_CONFIDENCE_THRESHOLD`].
//! When more than one pattern clears the bar, the highest-confidence match
//! wins; ties break on pattern id for determinism.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::IpAddr;

use regex::RegexBuilder;
use warden_core::CanonicalAlert;
use warden_core::EntityBundle;
use warden_core::EntityPattern;
use warden_core::EntityType;
use warden_core::FP_CONFIDENCE_THRESHOLD;
use warden_core::FpPattern;
use warden_core::FpPatternStatus;
use warden_core::KillSwitch;
use warden_core::NormalizedEntity;
use warden_core::Timestamp;
use warden_core::is_killed;

// ============================================================================
// SECTION: Match Result
// ============================================================================

/// A single pattern's match evaluation against one alert.
#[derive(Debug, Clone, PartialEq)]
pub struct FpMatchResult {
    /// The pattern that matched.
    pub pattern_id: String,
    /// Overall confidence, `(alert_name_score + entity_score) / 2`.
    pub confidence: f64,
    /// Whether the pattern's name regex matched the alert title.
    pub alert_name_score: f64,
    /// Fraction of entity requirements satisfied.
    pub entity_score: f64,
}

// ============================================================================
// SECTION: Matcher
// ============================================================================

/// Stateless evaluator for the FP short-circuit matching path.
#[derive(Debug, Clone, Copy, Default)]
pub struct FpShortCircuitMatcher;

impl FpShortCircuitMatcher {
    /// Evaluates every pattern in `patterns` against `alert`/`entities`,
    /// returning the highest-confidence match that clears
    /// [`warden_core::FP_CONFIDENCE_THRESHOLD`] and is not blocked by an
    /// active kill switch, or `None` if no pattern qualifies.
    ///
    /// Patterns are pre-filtered to `status == Approved`, live as of `now`,
    /// and in scope for `alert`'s `(tenant_id, technique, data_source)`
    /// coordinates before confidence is even computed.
    #[must_use]
    pub fn evaluate(
        &self,
        alert: &CanonicalAlert,
        entities: &EntityBundle,
        patterns: &[FpPattern],
        kill_switches: &[KillSwitch],
        now: &Timestamp,
    ) -> Option<FpMatchResult> {
        let techniques = technique_candidates(alert);

        patterns
            .iter()
            .filter(|p| p.status == FpPatternStatus::Approved && p.is_live(now))
            .filter(|p| techniques.iter().any(|t| p.scope.matches(&alert.tenant_id, t, &alert.source)))
            .filter(|p| {
                !techniques.iter().any(|t| is_killed(kill_switches, &alert.tenant_id, &p.pattern_id, t, &alert.source))
            })
            .filter_map(|p| {
                let alert_name_score = alert_name_score(&p.name, &alert.title);
                let entity_score = entity_score(&p.requirements, entities);
                let confidence = (alert_name_score + entity_score) / 2.0;
                (confidence >= FP_CONFIDENCE_THRESHOLD).then_some(FpMatchResult {
                    pattern_id: p.pattern_id.to_string(),
                    confidence,
                    alert_name_score,
                    entity_score,
                })
            })
            .max_by(|a, b| a.confidence.partial_cmp(&b.confidence).unwrap_or(std::cmp::Ordering::Equal))
    }
}

/// Returns the techniques to check scope/kill-switch coordinates against.
/// An alert with no recorded techniques still needs one empty-string
/// candidate so technique-agnostic (wildcard) patterns can still match.
fn technique_candidates(alert: &CanonicalAlert) -> Vec<&str> {
    if alert.techniques.is_empty() {
        vec![""]
    } else {
        alert.techniques.iter().map(String::as_str).collect()
    }
}

/// `1.0` if `pattern_name`, compiled as a case-insensitive regex, matches
/// `alert_title`; `0.0` on a non-match or an invalid pattern (an
/// unparsable regex can never raise confidence).
fn alert_name_score(pattern_name: &str, alert_title: &str) -> f64 {
    let matched = RegexBuilder::new(pattern_name).case_insensitive(true).build().is_ok_and(|re| re.is_match(alert_title));
    if matched { 1.0 } else { 0.0 }
}

/// Fraction of `requirements` satisfied by some entity in `entities`. An
/// empty requirement set is vacuously satisfied: a pattern with no entity
/// constraints relies on its alert-name match alone.
fn entity_score(requirements: &[EntityPattern], entities: &EntityBundle) -> f64 {
    if requirements.is_empty() {
        return 1.0;
    }
    #[allow(clippy::cast_precision_loss, reason = "Requirement counts are small, well within f64's exact range.")]
    let satisfied = requirements.iter().filter(|req| requirement_satisfied(req, entities)).count() as f64;
    #[allow(clippy::cast_precision_loss, reason = "Requirement counts are small, well within f64's exact range.")]
    let total = requirements.len() as f64;
    satisfied / total
}

fn requirement_satisfied(requirement: &EntityPattern, entities: &EntityBundle) -> bool {
    match requirement {
        EntityPattern::Exact { field, value } => {
            candidates(entities, field).iter().any(|e| &e.primary_value == value)
        }
        EntityPattern::Cidr { field, cidr } => {
            candidates(entities, field).iter().any(|e| cidr_contains(cidr, &e.primary_value))
        }
        EntityPattern::Regex { field, pattern } => RegexBuilder::new(pattern).build().is_ok_and(|re| {
            candidates(entities, field).iter().any(|e| re.is_match(&e.primary_value))
        }),
    }
}

/// Entities to test a requirement's `field` against. Known field names map
/// to their typed bucket; anything else falls back to `other`, matching how
/// the entity parser buckets vendor-specific types it cannot otherwise type.
fn candidates<'a>(entities: &'a EntityBundle, field: &str) -> &'a [NormalizedEntity] {
    match entity_type_for_field(field) {
        Some(entity_type) => entities.entities_of(entity_type),
        None => &entities.other,
    }
}

fn entity_type_for_field(field: &str) -> Option<EntityType> {
    match field.to_ascii_lowercase().as_str() {
        "account" => Some(EntityType::Account),
        "host" => Some(EntityType::Host),
        "ip" => Some(EntityType::Ip),
        "file" => Some(EntityType::File),
        "process" => Some(EntityType::Process),
        "url" => Some(EntityType::Url),
        "dns" => Some(EntityType::Dns),
        "filehash" => Some(EntityType::Filehash),
        "mailbox" => Some(EntityType::Mailbox),
        _ => None,
    }
}

/// Returns true if `value` parses as an IP address contained within `cidr`
/// (`a.b.c.d/prefix`). No dependency on an external CIDR crate: this is a
/// handful of bit operations over `std::net`.
fn cidr_contains(cidr: &str, value: &str) -> bool {
    let Some((network_part, prefix_part)) = cidr.split_once('/') else { return false };
    let Ok(network) = network_part.parse::<IpAddr>() else { return false };
    let Ok(value_addr) = value.parse::<IpAddr>() else { return false };
    let Ok(prefix) = prefix_part.parse::<u32>() else { return false };

    match (network, value_addr) {
        (IpAddr::V4(net), IpAddr::V4(val)) => {
            if prefix > 32 {
                return false;
            }
            let mask = mask_for_32(prefix);
            u32::from(net) & mask == u32::from(val) & mask
        }
        (IpAddr::V6(net), IpAddr::V6(val)) => {
            if prefix > 128 {
                return false;
            }
            let mask = mask_for_128(prefix);
            u128::from(net) & mask == u128::from(val) & mask
        }
        _ => false,
    }
}

fn mask_for_32(prefix: u32) -> u32 {
    if prefix == 0 {
        0
    } else {
        u32::MAX << (32 - prefix)
    }
}

fn mask_for_128(prefix: u32) -> u128 {
    if prefix == 0 {
        0
    } else {
        u128::MAX << (128 - prefix)
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions are permitted."
)]
mod tests {
    use std::collections::BTreeMap;

    use warden_core::KillSwitchDimension;
    use warden_core::PatternId;
    use warden_core::Scope;
    use warden_core::Severity;
    use warden_core::TenantId;

    use super::*;

    fn alert() -> CanonicalAlert {
        CanonicalAlert {
            alert_id: warden_core::AlertId::new("a1"),
            source: "sentinel".to_string(),
            timestamp: ts("2026-01-01T00:00:00Z"),
            title: "Known vulnerability scanner detected".to_string(),
            description: String::new(),
            severity: Severity::Low,
            tactics: vec![],
            techniques: vec!["T1595".to_string()],
            entities_raw: serde_json::Value::Null,
            product: String::new(),
            tenant_id: TenantId::new("t1"),
            raw_payload: serde_json::Value::Null,
        }
    }

    fn entity(entity_type: EntityType, value: &str) -> NormalizedEntity {
        NormalizedEntity { entity_type, primary_value: value.to_string(), properties: BTreeMap::new(), confidence: 1.0, source_id: None }
    }

    fn ts(s: &str) -> Timestamp {
        Timestamp::parse(s).expect("parse")
    }

    fn approved_pattern(name: &str, requirements: Vec<EntityPattern>) -> FpPattern {
        let mut pattern = FpPattern {
            pattern_id: PatternId::new("p1"),
            name: name.to_string(),
            scope: Scope::default(),
            requirements,
            status: FpPatternStatus::Draft,
            approver_1: None,
            approver_2: None,
            approval_date: None,
            expiry_date: None,
            reaffirmed_date: None,
            reaffirmed_by: None,
        };
        pattern.record_approval("alice", ts("2026-01-01T00:00:00Z")).expect("approve");
        pattern.record_approval("bob", ts("2026-01-01T00:00:00Z")).expect("approve");
        pattern
    }

    #[test]
    fn name_and_entity_match_clears_threshold() {
        let mut bundle = EntityBundle::default();
        bundle.ips.push(entity(EntityType::Ip, "10.0.0.5"));
        let pattern = approved_pattern(
            "(?i)known vulnerability scanner",
            vec![EntityPattern::Cidr { field: "ip".to_string(), cidr: "10.0.0.0/24".to_string() }],
        );
        let matcher = FpShortCircuitMatcher;
        let result = matcher.evaluate(&alert(), &bundle, &[pattern], &[], &ts("2026-02-01T00:00:00Z"));
        let result = result.expect("should match");
        assert!((result.confidence - 1.0).abs() < 0.001);
    }

    #[test]
    fn entity_mismatch_drops_below_threshold() {
        let mut bundle = EntityBundle::default();
        bundle.ips.push(entity(EntityType::Ip, "192.168.1.1"));
        let pattern = approved_pattern(
            "known vulnerability scanner",
            vec![EntityPattern::Cidr { field: "ip".to_string(), cidr: "10.0.0.0/24".to_string() }],
        );
        let matcher = FpShortCircuitMatcher;
        let result = matcher.evaluate(&alert(), &bundle, &[pattern], &[], &ts("2026-02-01T00:00:00Z"));
        assert!(result.is_none());
    }

    #[test]
    fn active_kill_switch_blocks_an_otherwise_qualifying_pattern() {
        let pattern = approved_pattern("known vulnerability scanner", vec![]);
        let kill_switch = KillSwitch {
            dimension: KillSwitchDimension { pattern_id: Some(pattern.pattern_id.clone()), ..KillSwitchDimension::default() },
            activated_by: "oncall".to_string(),
            reason: "bad pattern".to_string(),
            activated_at: ts("2026-01-15T00:00:00Z"),
            deactivated_at: None,
        };
        let matcher = FpShortCircuitMatcher;
        let result = matcher.evaluate(&alert(), &EntityBundle::default(), &[pattern], &[kill_switch], &ts("2026-02-01T00:00:00Z"));
        assert!(result.is_none());
    }

    #[test]
    fn expired_pattern_never_matches() {
        let pattern = approved_pattern("known vulnerability scanner", vec![]);
        let matcher = FpShortCircuitMatcher;
        let result = matcher.evaluate(&alert(), &EntityBundle::default(), &[pattern], &[], &ts("2027-01-01T00:00:00Z"));
        assert!(result.is_none());
    }

    #[test]
    fn highest_confidence_pattern_wins_when_several_qualify() {
        let mut bundle = EntityBundle::default();
        bundle.ips.push(entity(EntityType::Ip, "10.0.0.5"));
        let matched = EntityPattern::Exact { field: "ip".to_string(), value: "10.0.0.5".to_string() };
        let unmatched = EntityPattern::Exact { field: "ip".to_string(), value: "10.0.0.9".to_string() };
        // 10 requirements, 9 satisfied: entity_score = 0.9, confidence = 0.95.
        let mut weak_requirements = vec![matched.clone(); 9];
        weak_requirements.push(unmatched);
        let weak = approved_pattern("known vulnerability scanner", weak_requirements);
        // All 10 satisfied: entity_score = 1.0, confidence = 1.0.
        let mut strong = approved_pattern("known vulnerability scanner", vec![matched; 10]);
        strong.pattern_id = PatternId::new("p2");
        let matcher = FpShortCircuitMatcher;
        let result = matcher.evaluate(&alert(), &bundle, &[weak, strong], &[], &ts("2026-02-01T00:00:00Z")).expect("match");
        assert_eq!(result.pattern_id, "p2");
        assert!((result.confidence - 1.0).abs() < 0.001);
    }
}
