// warden-orchestrator/src/engine.rs
// ============================================================================
// Module: Investigation Orchestrator
// Description: Drives one alert through the full investigation graph:
//              IOC extraction, FP short-circuit, parallel enrichment,
//              reasoning (with optional escalation), the approval gate,
//              and response dispatch.
// Purpose: The single place that advances `Investigation.state` and
//          appends to its decision chain; every collaborator below it is
//          an explicit, narrow trait so the graph itself stays testable
//          without a live Gateway or database.
// Dependencies: tokio, warden-audit, warden-core, warden-gateway,
//               warden-governance
// ============================================================================

//! ## Overview
//! [`InvestigationOrchestrator`] is generic over the six per-role agent
//! traits plus [`InvestigationRepository`] and [`GovernanceView`], mirroring
//! how the control plane this engine was modelled on is generic over its
//! evidence provider, dispatcher, run-state store, and policy decider.
//! Nothing here reaches for ambient state: every collaborator arrives
//! through [`InvestigationOrchestrator::new`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use tracing::warn;
use warden_audit::ActorType;
use warden_audit::AuditContext;
use warden_audit::AuditDecision;
use warden_audit::AuditOutcome;
use warden_audit::AuditProducer;
use warden_audit::AuditSeverity;
use warden_audit::AuditSink;
use warden_audit::EmitRequest;
use warden_audit::EventTaxonomy;
use warden_core::CanonicalAlert;
use warden_core::DecisionEntry;
use warden_core::EntityBundle;
use warden_core::Investigation;
use warden_core::InvestigationId;
use warden_core::InvestigationState;
use warden_core::RecommendedAction;
use warden_core::Severity;
use warden_core::TenantConfig;
use warden_core::Timestamp;
use warden_governance::FpShortCircuitMatcher;

use crate::agents::AtlasMapperAgent;
use crate::agents::ContextEnricherAgent;
use crate::agents::CtemCorrelatorAgent;
use crate::agents::IocExtractorAgent;
use crate::agents::ReasoningAgent;
use crate::agents::ResponseAgent;
use crate::config::OrchestratorConfig;
use crate::error::OrchestratorError;
use crate::merge::merge_atlas;
use crate::merge::merge_context;
use crate::merge::merge_ctem;
use crate::repository::GovernanceView;
use crate::repository::InvestigationRepository;

// ============================================================================
// SECTION: Orchestrator
// ============================================================================

/// Confidence below which a `critical`/`high` severity classification opens
/// the approval gate even when every recommended action is low-tier.
const LOW_CONFIDENCE_APPROVAL_THRESHOLD: f64 = 0.6;

/// Drives investigations through the full graph topology.
///
/// Generic over every collaborator it needs: the six per-role agents, the
/// investigation repository, and the governance view. Production wiring
/// supplies Gateway-backed agents and `warden-store-sqlite`'s stores; tests
/// supply in-memory doubles for all of them.
#[allow(clippy::struct_field_names, reason = "Fields mirror the six agent-role names by design; renaming would obscure which role each field fills.")]
pub struct InvestigationOrchestrator<Ioc, Ctx, Ctem, Atlas, Reason, Resp, Repo, Gov, S>
where
    Ioc: IocExtractorAgent,
    Ctx: ContextEnricherAgent,
    Ctem: CtemCorrelatorAgent,
    Atlas: AtlasMapperAgent,
    Reason: ReasoningAgent,
    Resp: ResponseAgent,
    Repo: InvestigationRepository,
    Gov: GovernanceView,
    S: AuditSink,
{
    ioc_extractor: Ioc,
    context_enricher: Ctx,
    ctem_correlator: Ctem,
    atlas_mapper: Atlas,
    reasoning_agent: Reason,
    response_agent: Resp,
    repository: Repo,
    governance: Gov,
    audit: AuditProducer<S>,
    config: OrchestratorConfig,
    matcher: FpShortCircuitMatcher,
}

impl<Ioc, Ctx, Ctem, Atlas, Reason, Resp, Repo, Gov, S> InvestigationOrchestrator<Ioc, Ctx, Ctem, Atlas, Reason, Resp, Repo, Gov, S>
where
    Ioc: IocExtractorAgent,
    Ctx: ContextEnricherAgent,
    Ctem: CtemCorrelatorAgent,
    Atlas: AtlasMapperAgent,
    Reason: ReasoningAgent,
    Resp: ResponseAgent,
    Repo: InvestigationRepository,
    Gov: GovernanceView,
    S: AuditSink,
{
    /// Builds an orchestrator from its explicit collaborators.
    #[allow(clippy::too_many_arguments, reason = "One argument per collaborator; a builder would only hide the same nine dependencies.")]
    pub fn new(
        ioc_extractor: Ioc,
        context_enricher: Ctx,
        ctem_correlator: Ctem,
        atlas_mapper: Atlas,
        reasoning_agent: Reason,
        response_agent: Resp,
        repository: Repo,
        governance: Gov,
        audit: AuditProducer<S>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            ioc_extractor,
            context_enricher,
            ctem_correlator,
            atlas_mapper,
            reasoning_agent,
            response_agent,
            repository,
            governance,
            audit,
            config,
            matcher: FpShortCircuitMatcher,
        }
    }

    /// Runs `alert` through the investigation graph, starting a new
    /// investigation or returning the one already opened for this alert.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError`] if a required stage fails or the
    /// repository cannot be read or written.
    pub async fn run(
        &self,
        alert: CanonicalAlert,
        entities: EntityBundle,
        tenant_config: &TenantConfig,
        now: Timestamp,
    ) -> Result<Investigation, OrchestratorError> {
        if let Some(existing) = self.repository.find_by_alert(&alert.tenant_id, &alert.alert_id)? {
            return Ok(existing);
        }

        let investigation_id = InvestigationId::new(uuid::Uuid::new_v4().to_string());
        let mut investigation = Investigation::new(investigation_id, alert.alert_id.clone(), alert.tenant_id.clone(), entities);
        self.save(&investigation, now)?;

        if let Err(err) = self.extract_iocs(&mut investigation, &alert, now).await {
            return self.fail(investigation, "ioc_extractor", &err, now);
        }

        if let Some(closed) = self.try_short_circuit(investigation.clone(), &alert, now) {
            return Ok(closed);
        }

        self.enrich(&mut investigation, now).await;
        self.save(&investigation, now)?;

        if let Err(err) = self.reason(&mut investigation, tenant_config, now).await {
            return self.fail(investigation, "reasoning_agent", &err, now);
        }

        self.advance_past_reasoning(investigation, tenant_config, now).await
    }

    /// Resumes a paused investigation following an explicit analyst
    /// decision. `approved = false` is the explicit-reject path, which
    /// closes with classification `"rejected"`; a timed-out gate is never
    /// resumed through here (see [`Self::expire_approval`]).
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::NotFound`] if no such investigation
    /// exists, [`OrchestratorError::NotAwaitingApproval`] if it is not
    /// paused, or a repository error.
    pub async fn resume_from_approval(
        &self,
        investigation_id: &InvestigationId,
        approved: bool,
        now: Timestamp,
    ) -> Result<Investigation, OrchestratorError> {
        let mut investigation = self
            .repository
            .load(investigation_id)?
            .ok_or_else(|| OrchestratorError::NotFound(investigation_id.clone()))?;

        if investigation.state != InvestigationState::AwaitingHuman {
            return Err(OrchestratorError::NotAwaitingApproval(investigation_id.clone()));
        }

        if !approved {
            investigation.transition(
                InvestigationState::Closed,
                DecisionEntry::new("orchestrator", "approval_denied", now),
            );
            investigation.classification = "rejected".to_string();
            self.save(&investigation, now)?;
            self.emit_approval_event(EventTaxonomy::ApprovalDenied, &investigation, now);
            return Ok(investigation);
        }

        self.emit_approval_event(EventTaxonomy::ApprovalGranted, &investigation, now);
        if let Err(err) = self.dispatch_response(&mut investigation, now).await {
            return self.fail(investigation, "response_agent", &err, now);
        }
        self.close(investigation, now)
    }

    /// Resumes a paused investigation whose approval gate expired with no
    /// analyst decision. Closes with classification left unchanged, unlike
    /// an explicit reject.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::NotFound`] if no such investigation
    /// exists, [`OrchestratorError::NotAwaitingApproval`] if it is not
    /// paused, or a repository error.
    pub fn expire_approval(&self, investigation_id: &InvestigationId, now: Timestamp) -> Result<Investigation, OrchestratorError> {
        let mut investigation = self
            .repository
            .load(investigation_id)?
            .ok_or_else(|| OrchestratorError::NotFound(investigation_id.clone()))?;

        if investigation.state != InvestigationState::AwaitingHuman {
            return Err(OrchestratorError::NotAwaitingApproval(investigation_id.clone()));
        }

        investigation.transition(
            InvestigationState::Closed,
            DecisionEntry::new("orchestrator", "approval_timed_out", now),
        );
        self.save(&investigation, now)?;
        self.emit_approval_event(EventTaxonomy::ApprovalTimedOut, &investigation, now);
        Ok(investigation)
    }

    // ------------------------------------------------------------------
    // Stages
    // ------------------------------------------------------------------

    async fn extract_iocs(&self, investigation: &mut Investigation, alert: &CanonicalAlert, now: Timestamp) -> Result<(), crate::error::AgentError> {
        let delta = self.ioc_extractor.extract(investigation, now).await?;
        investigation.ioc_matches.extend(delta.ioc_matches);
        investigation.llm_calls += delta.llm_calls;
        investigation.total_cost_usd += delta.cost_usd;
        investigation.transition(
            InvestigationState::Parsing,
            DecisionEntry::new("ioc_extractor", "ioc_extraction_completed", now).with_details(serde_json::json!({"alert_id": alert.alert_id.as_str()})),
        );
        Ok(())
    }

    fn try_short_circuit(&self, mut investigation: Investigation, alert: &CanonicalAlert, now: Timestamp) -> Option<Investigation> {
        let patterns = self.governance.approved_patterns();
        let kill_switches = self.governance.active_kill_switches();
        let result = self.matcher.evaluate(alert, &investigation.entities, &patterns, &kill_switches, &now)?;

        investigation.classification = "false_positive".to_string();
        investigation.confidence = result.confidence;
        investigation.transition(
            InvestigationState::Closed,
            DecisionEntry::new("orchestrator", "auto_close_fp", now)
                .with_confidence(result.confidence)
                .with_details(serde_json::json!({"pattern_id": result.pattern_id})),
        );
        if self.save(&investigation, now).is_err() {
            warn!(investigation_id = %investigation.investigation_id, "failed to persist auto-closed investigation");
        }
        self.emit(EventTaxonomy::AlertShortCircuited, &investigation, now, &AuditOutcome { outcome_status: "auto_closed".to_string(), ..AuditOutcome::default() });
        Some(investigation)
    }

    async fn enrich(&self, investigation: &mut Investigation, now: Timestamp) {
        investigation.state = InvestigationState::Enriching;

        let (context, ctem, atlas) = tokio::join!(
            self.context_enricher.enrich(investigation, now),
            self.ctem_correlator.correlate(investigation, now),
            self.atlas_mapper.map(investigation, now),
        );

        match context {
            Ok(delta) => merge_context(investigation, delta),
            Err(err) => self.record_enrichment_failure(investigation, "context_enricher", &err, now),
        }
        match ctem {
            Ok(delta) => merge_ctem(investigation, delta),
            Err(err) => self.record_enrichment_failure(investigation, "ctem_correlator", &err, now),
        }
        match atlas {
            Ok(delta) => merge_atlas(investigation, delta),
            Err(err) => self.record_enrichment_failure(investigation, "atlas_mapper", &err, now),
        }

        investigation.transition(InvestigationState::Reasoning, DecisionEntry::new("orchestrator", "enrichment_completed", now));
    }

    fn record_enrichment_failure(&self, investigation: &mut Investigation, agent: &str, err: &crate::error::AgentError, now: Timestamp) {
        warn!(agent, error = %err, "enrichment sibling failed soft, continuing with its sibling deltas");
        investigation.decision_chain.push(
            DecisionEntry::new(agent, "enrichment_failed_soft", now).with_details(serde_json::json!({"error": err.to_string()})),
        );
    }

    async fn reason(&self, investigation: &mut Investigation, tenant_config: &TenantConfig, now: Timestamp) -> Result<(), crate::error::AgentError> {
        let outcome = self.reasoning_agent.reason(investigation, now).await?;

        let severity_eligible = outcome.severity.or(investigation.severity).is_some_and(|s| s.is_escalation_eligible());
        let outcome = if tenant_config.should_escalate(outcome.confidence, severity_eligible) {
            let escalated = self.reasoning_agent.reason_escalated(investigation, now).await?;
            if escalated.confidence > outcome.confidence { escalated } else { outcome }
        } else {
            outcome
        };

        investigation.classification = outcome.classification;
        investigation.confidence = outcome.confidence;
        if let Some(severity) = outcome.severity {
            investigation.severity = Some(severity);
        }
        investigation.recommended_actions = outcome.recommended_actions;
        investigation.llm_calls += outcome.llm_calls;
        investigation.total_cost_usd += outcome.cost_usd;
        investigation.transition(
            InvestigationState::Reasoning,
            DecisionEntry::new("reasoning_agent", "classification_assigned", now)
                .with_confidence(investigation.confidence)
                .with_details(serde_json::json!({"reasoning": outcome.reasoning, "classification": investigation.classification})),
        );
        Ok(())
    }

    async fn advance_past_reasoning(&self, mut investigation: Investigation, tenant_config: &TenantConfig, now: Timestamp) -> Result<Investigation, OrchestratorError> {
        let low_confidence_on_high_severity =
            investigation.confidence < LOW_CONFIDENCE_APPROVAL_THRESHOLD && investigation.severity.is_some_and(Severity::is_escalation_eligible);
        let requires_approval = investigation.all_atlas_detections_untrusted()
            || investigation.recommended_actions.iter().any(|a| a.tier >= self.config.destructive_action_tier_threshold)
            || low_confidence_on_high_severity;

        if tenant_config.shadow_mode {
            return self.record_shadow_decision(investigation, requires_approval, now);
        }

        if requires_approval {
            return self.open_approval_gate(investigation, tenant_config, now);
        }

        if let Err(err) = self.dispatch_response(&mut investigation, now).await {
            return self.fail(investigation, "response_agent", &err, now);
        }
        self.close(investigation, now)
    }

    /// Closes a shadow-mode tenant's investigation without ever dispatching
    /// an action, recording the decision the engine would have made had
    /// shadow mode not suppressed dispatch.
    fn record_shadow_decision(&self, mut investigation: Investigation, would_require_approval: bool, now: Timestamp) -> Result<Investigation, OrchestratorError> {
        let would_dispatch: Vec<String> = investigation.recommended_actions.iter().map(action_key).collect();
        investigation.transition(
            InvestigationState::Closed,
            DecisionEntry::new("orchestrator", "shadow_decision_recorded", now)
                .with_confidence(investigation.confidence)
                .with_details(serde_json::json!({
                    "would_require_approval": would_require_approval,
                    "would_dispatch_actions": would_dispatch,
                })),
        );
        self.save(&investigation, now)?;
        self.emit(
            EventTaxonomy::ShadowDecisionRecorded,
            &investigation,
            now,
            &AuditOutcome { outcome_status: "shadow_only".to_string(), ..AuditOutcome::default() },
        );
        Ok(investigation)
    }

    fn open_approval_gate(&self, mut investigation: Investigation, tenant_config: &TenantConfig, now: Timestamp) -> Result<Investigation, OrchestratorError> {
        let tier = investigation.recommended_actions.iter().map(|a| a.tier).max().unwrap_or(self.config.destructive_action_tier_threshold);
        let deadline = now.plus_hours(tenant_config.approval_timeout_hours(tier));
        investigation.requires_human_approval = true;
        investigation.transition(
            InvestigationState::AwaitingHuman,
            DecisionEntry::new("orchestrator", "approval_requested", now).with_details(serde_json::json!({"tier": tier, "deadline": deadline.to_rfc3339_millis()})),
        );
        self.save(&investigation, now)?;
        self.emit_approval_event(EventTaxonomy::ApprovalRequested, &investigation, now);
        Ok(investigation)
    }

    async fn dispatch_response(&self, investigation: &mut Investigation, now: Timestamp) -> Result<(), crate::error::AgentError> {
        let pending: Vec<RecommendedAction> = investigation
            .recommended_actions
            .iter()
            .filter(|action| !investigation.decision_chain_contains_action_detail("action_dispatched", "action_key", &action_key(action)))
            .cloned()
            .collect();

        if pending.is_empty() {
            return Ok(());
        }

        let outcome = self.response_agent.respond(investigation, &pending, now).await?;
        investigation.playbook_matches.extend(outcome.playbook_matches);
        for action in &pending {
            investigation.decision_chain.push(
                DecisionEntry::new("response_agent", "action_dispatched", now).with_details(serde_json::json!({"action_key": action_key(action)})),
            );
        }
        investigation.state = InvestigationState::Responding;
        Ok(())
    }

    fn close(&self, mut investigation: Investigation, now: Timestamp) -> Result<Investigation, OrchestratorError> {
        investigation.transition(InvestigationState::Closed, DecisionEntry::new("orchestrator", "investigation_closed", now));
        self.save(&investigation, now)?;
        self.emit(
            EventTaxonomy::InvestigationStateChanged,
            &investigation,
            now,
            &AuditOutcome { outcome_status: "closed".to_string(), state_after: "closed".to_string(), ..AuditOutcome::default() },
        );
        Ok(investigation)
    }

    fn fail(&self, mut investigation: Investigation, agent: &str, err: &crate::error::AgentError, now: Timestamp) -> Result<Investigation, OrchestratorError> {
        investigation.transition(
            InvestigationState::Failed,
            DecisionEntry::new(agent, "stage_failed", now).with_details(serde_json::json!({"error": err.to_string()})),
        );
        if self.save(&investigation, now).is_err() {
            warn!(investigation_id = %investigation.investigation_id, "failed to persist failed investigation");
        }
        Err(match agent {
            "ioc_extractor" => OrchestratorError::IocExtractionFailed { investigation_id: investigation.investigation_id, source: err.clone() },
            "response_agent" => OrchestratorError::ResponseFailed { investigation_id: investigation.investigation_id, source: err.clone() },
            _ => OrchestratorError::ReasoningFailed { investigation_id: investigation.investigation_id, source: err.clone() },
        })
    }

    fn save(&self, investigation: &Investigation, now: Timestamp) -> Result<(), OrchestratorError> {
        self.repository.save(investigation, now).map_err(|err| OrchestratorError::Repository(err.to_string()))
    }

    fn emit(&self, event_type: EventTaxonomy, investigation: &Investigation, now: Timestamp, outcome: &AuditOutcome) {
        self.audit.emit(
            EmitRequest {
                tenant_id: investigation.tenant_id.clone(),
                event_type: Some(event_type),
                severity: AuditSeverity::Info,
                actor_type: Some(ActorType::System),
                actor_id: "warden-orchestrator".to_string(),
                investigation_id: Some(investigation.investigation_id.clone()),
                alert_id: Some(investigation.alert_id.clone()),
                context: AuditContext::default(),
                decision: AuditDecision {
                    classification: investigation.classification.clone(),
                    confidence: investigation.confidence,
                    ..AuditDecision::default()
                },
                outcome: outcome.clone(),
            },
            now,
        );
    }

    fn emit_approval_event(&self, event_type: EventTaxonomy, investigation: &Investigation, now: Timestamp) {
        self.emit(event_type, investigation, now, &AuditOutcome::default());
    }
}

fn action_key(action: &RecommendedAction) -> String {
    format!("{}:{}", action.action, action.target)
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions are permitted."
)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use warden_audit::LogSink;
    use warden_core::AlertId;
    use warden_core::AtlasDetection;
    use warden_core::FpPattern;
    use warden_core::KillSwitch;
    use warden_core::Severity;
    use warden_core::TelemetryTrustLevel;
    use warden_core::TenantId;

    use super::*;
    use crate::agents::AtlasMappingDelta;
    use crate::agents::ContextEnrichmentDelta;
    use crate::agents::CtemCorrelationDelta;
    use crate::agents::IocExtractionDelta;
    use crate::agents::ReasoningOutcome;
    use crate::agents::ResponseOutcome;
    use crate::error::AgentError;

    fn ts(s: &str) -> Timestamp {
        Timestamp::parse(s).expect("parse")
    }

    /// A tenant out of shadow mode, for tests that assert on real dispatch.
    fn live_tenant_config() -> TenantConfig {
        let mut config = TenantConfig::new(TenantId::new("t1"));
        config.shadow_mode = false;
        config
    }

    fn alert() -> CanonicalAlert {
        CanonicalAlert {
            alert_id: AlertId::new("a1"),
            source: "sentinel".to_string(),
            timestamp: ts("2026-01-01T00:00:00Z"),
            title: "Suspicious login".to_string(),
            description: String::new(),
            severity: Severity::High,
            tactics: vec![],
            techniques: vec![],
            entities_raw: serde_json::Value::Null,
            product: String::new(),
            tenant_id: TenantId::new("t1"),
            raw_payload: serde_json::Value::Null,
        }
    }

    struct StubIoc;
    #[async_trait]
    impl IocExtractorAgent for StubIoc {
        async fn extract(&self, _investigation: &Investigation, _now: Timestamp) -> Result<IocExtractionDelta, AgentError> {
            Ok(IocExtractionDelta::default())
        }
    }

    struct StubContext;
    #[async_trait]
    impl ContextEnricherAgent for StubContext {
        async fn enrich(&self, _investigation: &Investigation, _now: Timestamp) -> Result<ContextEnrichmentDelta, AgentError> {
            Ok(ContextEnrichmentDelta::default())
        }
    }

    struct StubCtem;
    #[async_trait]
    impl CtemCorrelatorAgent for StubCtem {
        async fn correlate(&self, _investigation: &Investigation, _now: Timestamp) -> Result<CtemCorrelationDelta, AgentError> {
            Ok(CtemCorrelationDelta::default())
        }
    }

    struct StubAtlas {
        untrusted: bool,
    }
    #[async_trait]
    impl AtlasMapperAgent for StubAtlas {
        async fn map(&self, _investigation: &Investigation, _now: Timestamp) -> Result<AtlasMappingDelta, AgentError> {
            if self.untrusted {
                Ok(AtlasMappingDelta {
                    atlas_techniques: vec![AtlasDetection {
                        technique_id: "AML.T0043".to_string(),
                        confidence: 0.9,
                        telemetry_trust_level: TelemetryTrustLevel::Untrusted,
                        attestation_status: "failed".to_string(),
                    }],
                    queries_executed: 1,
                })
            } else {
                Ok(AtlasMappingDelta::default())
            }
        }
    }

    struct StubReasoning {
        tier: u8,
        confidence: f64,
    }
    #[async_trait]
    impl ReasoningAgent for StubReasoning {
        async fn reason(&self, _investigation: &Investigation, _now: Timestamp) -> Result<ReasoningOutcome, AgentError> {
            Ok(ReasoningOutcome {
                classification: "true_positive".to_string(),
                confidence: self.confidence,
                severity: Some(Severity::High),
                recommended_actions: vec![RecommendedAction {
                    action: "isolate_endpoint".to_string(),
                    target: "host-1".to_string(),
                    tier: self.tier,
                    rationale: "lateral movement suspected".to_string(),
                }],
                reasoning: "clear indicators of compromise".to_string(),
                llm_calls: 1,
                cost_usd: 0.02,
            })
        }

        async fn reason_escalated(&self, investigation: &Investigation, now: Timestamp) -> Result<ReasoningOutcome, AgentError> {
            self.reason(investigation, now).await
        }
    }

    struct StubResponse {
        dispatched: Mutex<Vec<String>>,
    }
    #[async_trait]
    impl ResponseAgent for StubResponse {
        async fn respond(&self, _investigation: &Investigation, actions: &[RecommendedAction], _now: Timestamp) -> Result<ResponseOutcome, AgentError> {
            self.dispatched.lock().expect("lock").extend(actions.iter().map(|a| a.action.clone()));
            Ok(ResponseOutcome { playbook_matches: vec![serde_json::json!({"playbook": "isolate"})], dispatched_actions: actions.iter().map(|a| a.action.clone()).collect() })
        }
    }

    #[derive(Default)]
    struct InMemoryRepository {
        by_id: Mutex<HashMap<InvestigationId, Investigation>>,
    }
    impl InvestigationRepository for InMemoryRepository {
        type Error = std::convert::Infallible;

        fn save(&self, investigation: &Investigation, _now: Timestamp) -> Result<(), Self::Error> {
            self.by_id.lock().expect("lock").insert(investigation.investigation_id.clone(), investigation.clone());
            Ok(())
        }

        fn load(&self, investigation_id: &InvestigationId) -> Result<Option<Investigation>, Self::Error> {
            Ok(self.by_id.lock().expect("lock").get(investigation_id).cloned())
        }

        fn find_by_alert(&self, tenant_id: &TenantId, alert_id: &AlertId) -> Result<Option<Investigation>, Self::Error> {
            Ok(self
                .by_id
                .lock()
                .expect("lock")
                .values()
                .find(|inv| &inv.tenant_id == tenant_id && &inv.alert_id == alert_id)
                .cloned())
        }
    }

    struct NoGovernance;
    impl GovernanceView for NoGovernance {
        fn approved_patterns(&self) -> Vec<FpPattern> {
            Vec::new()
        }
        fn active_kill_switches(&self) -> Vec<KillSwitch> {
            Vec::new()
        }
    }

    type TestOrchestrator = InvestigationOrchestrator<StubIoc, StubContext, StubCtem, StubAtlas, StubReasoning, StubResponse, InMemoryRepository, NoGovernance, LogSink>;

    fn build(tier: u8, untrusted_atlas: bool) -> TestOrchestrator {
        build_with_confidence(tier, untrusted_atlas, 0.95)
    }

    fn build_with_confidence(tier: u8, untrusted_atlas: bool, confidence: f64) -> TestOrchestrator {
        InvestigationOrchestrator::new(
            StubIoc,
            StubContext,
            StubCtem,
            StubAtlas { untrusted: untrusted_atlas },
            StubReasoning { tier, confidence },
            StubResponse { dispatched: Mutex::new(Vec::new()) },
            InMemoryRepository::default(),
            NoGovernance,
            AuditProducer::new(LogSink),
            OrchestratorConfig::default(),
        )
    }

    #[tokio::test]
    async fn low_tier_action_closes_without_approval() {
        let orchestrator = build(0, false);
        let investigation = orchestrator.run(alert(), EntityBundle::default(), &live_tenant_config(), ts("2026-01-01T00:00:00Z")).await.expect("run");
        assert_eq!(investigation.state, InvestigationState::Closed);
        assert!(!investigation.requires_human_approval);
    }

    #[tokio::test]
    async fn tier_two_action_pauses_for_approval() {
        let orchestrator = build(2, false);
        let investigation = orchestrator.run(alert(), EntityBundle::default(), &live_tenant_config(), ts("2026-01-01T00:00:00Z")).await.expect("run");
        assert_eq!(investigation.state, InvestigationState::AwaitingHuman);
        assert!(investigation.requires_human_approval);
    }

    #[tokio::test]
    async fn all_untrusted_atlas_detections_force_approval_regardless_of_tier() {
        let orchestrator = build(0, true);
        let investigation = orchestrator.run(alert(), EntityBundle::default(), &live_tenant_config(), ts("2026-01-01T00:00:00Z")).await.expect("run");
        assert_eq!(investigation.state, InvestigationState::AwaitingHuman);
    }

    #[tokio::test]
    async fn low_confidence_high_severity_forces_approval_even_at_tier_zero() {
        let orchestrator = build_with_confidence(0, false, 0.5);
        let investigation = orchestrator.run(alert(), EntityBundle::default(), &live_tenant_config(), ts("2026-01-01T00:00:00Z")).await.expect("run");
        assert_eq!(investigation.state, InvestigationState::AwaitingHuman);
        assert!(investigation.requires_human_approval);
    }

    #[tokio::test]
    async fn shadow_mode_tenant_never_dispatches_and_closes_via_shadow_log() {
        let orchestrator = build(2, false);
        let investigation = orchestrator.run(alert(), EntityBundle::default(), &TenantConfig::new(TenantId::new("t1")), ts("2026-01-01T00:00:00Z")).await.expect("run");
        assert_eq!(investigation.state, InvestigationState::Closed);
        assert!(!investigation.requires_human_approval);
        assert!(orchestrator.response_agent.dispatched.lock().expect("lock").is_empty());
        assert!(
            investigation
                .decision_chain
                .iter()
                .any(|entry| entry.action == "shadow_decision_recorded")
        );
    }

    #[tokio::test]
    async fn approving_a_paused_investigation_dispatches_and_closes() {
        let orchestrator = build(2, false);
        let now = ts("2026-01-01T00:00:00Z");
        let paused = orchestrator.run(alert(), EntityBundle::default(), &live_tenant_config(), now).await.expect("run");
        let closed = orchestrator.resume_from_approval(&paused.investigation_id, true, now).await.expect("resume");
        assert_eq!(closed.state, InvestigationState::Closed);
        assert_eq!(orchestrator.response_agent.dispatched.lock().expect("lock").len(), 1);
    }

    #[tokio::test]
    async fn rejecting_a_paused_investigation_closes_as_rejected() {
        let orchestrator = build(2, false);
        let now = ts("2026-01-01T00:00:00Z");
        let paused = orchestrator.run(alert(), EntityBundle::default(), &live_tenant_config(), now).await.expect("run");
        let closed = orchestrator.resume_from_approval(&paused.investigation_id, false, now).await.expect("resume");
        assert_eq!(closed.state, InvestigationState::Closed);
        assert_eq!(closed.classification, "rejected");
    }

    #[tokio::test]
    async fn resuming_a_non_paused_investigation_is_refused() {
        let orchestrator = build(0, false);
        let now = ts("2026-01-01T00:00:00Z");
        let closed = orchestrator.run(alert(), EntityBundle::default(), &live_tenant_config(), now).await.expect("run");
        let err = orchestrator.resume_from_approval(&closed.investigation_id, true, now).await.unwrap_err();
        assert!(matches!(err, OrchestratorError::NotAwaitingApproval(_)));
    }

    #[tokio::test]
    async fn rerunning_the_same_alert_returns_the_existing_investigation() {
        let orchestrator = build(0, false);
        let now = ts("2026-01-01T00:00:00Z");
        let first = orchestrator.run(alert(), EntityBundle::default(), &live_tenant_config(), now).await.expect("run");
        let second = orchestrator.run(alert(), EntityBundle::default(), &live_tenant_config(), now).await.expect("run");
        assert_eq!(first.investigation_id, second.investigation_id);
    }

    #[test]
    fn expiring_a_paused_investigation_leaves_classification_unchanged() {
        let orchestrator = build(2, false);
        let now = ts("2026-01-01T00:00:00Z");
        let mut investigation = Investigation::new(InvestigationId::new("inv-1"), AlertId::new("a1"), TenantId::new("t1"), EntityBundle::default());
        investigation.classification = "pending_review".to_string();
        investigation.transition(InvestigationState::AwaitingHuman, DecisionEntry::new("orchestrator", "approval_requested", now));
        orchestrator.repository.save(&investigation, now).expect("save");

        let expired = orchestrator.expire_approval(&investigation.investigation_id, now).expect("expire");
        assert_eq!(expired.state, InvestigationState::Closed);
        assert_eq!(expired.classification, "pending_review");
    }
}
