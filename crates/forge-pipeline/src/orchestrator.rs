//! The pipeline orchestrator

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::summary::{RunState, RunSummary};
use forge_domain::traits::EntityStore;
use forge_domain::{Entity, EntityId, Genre, Relationship};
use forge_extractor::{
    codec, Chunk, ChunkExtraction, Chunker, ExtractionPrompts, Extractor, ExtractorError,
    PromptLibrary, SchemaHints,
};
use forge_hil::{HilAction, HilContext, HilManager, HilResponse};
use forge_llm::{LlmClient, LlmError};
use forge_sentinel::{ReconcileOutcome, Sentinel};
use forge_validator::{Severity, ValidationReport, Validator};
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Sequences one extraction run end to end
///
/// The orchestrator owns the run's working set exclusively; concurrent runs
/// each construct their own instance and share nothing mutable.
pub struct Orchestrator<C, S>
where
    C: LlmClient + 'static,
    S: EntityStore,
{
    client: Arc<C>,
    store: S,
    prompts: PromptLibrary,
    config: PipelineConfig,
}

/// What the extraction stage produced for one chunk
enum ChunkOutcome {
    Extracted(ChunkExtraction),
    Failed(ExtractorError),
    NotAttempted,
}

impl<C, S> Orchestrator<C, S>
where
    C: LlmClient + 'static,
    S: EntityStore,
    S::Error: std::fmt::Display,
{
    /// Create an orchestrator with the built-in prompt library
    pub fn new(client: C, store: S, config: PipelineConfig) -> Self {
        Self {
            client: Arc::new(client),
            store,
            prompts: PromptLibrary::builtin(),
            config,
        }
    }

    /// Replace the prompt library, builder-style
    pub fn with_prompts(mut self, prompts: PromptLibrary) -> Self {
        self.prompts = prompts;
        self
    }

    /// Give the store back once the orchestrator is done with it
    pub fn into_store(self) -> S {
        self.store
    }

    /// Execute one extraction run
    ///
    /// Returns `Err` only for setup problems (bad configuration, missing
    /// prompt templates). Everything that happens *during* the run -
    /// per-chunk failures, review aborts, store errors - lands in the
    /// returned summary with the appropriate terminal status.
    pub async fn run(
        &mut self,
        source_text: &str,
        genre: Genre,
        schema: Option<&SchemaHints>,
        hil: &mut HilManager,
    ) -> Result<RunSummary, PipelineError> {
        self.config.validate().map_err(PipelineError::Config)?;

        let mut summary = RunSummary::new();

        // Chunking
        self.transition(&mut summary, RunState::Chunking);
        let chunker = Chunker::new(self.config.chunker)?;
        let chunks = chunker.chunk(source_text);
        summary.chunks_total = chunks.len();

        if chunks.is_empty() {
            summary.warnings.push("source produced no chunks".to_string());
            self.transition(&mut summary, RunState::Completed);
            return Ok(summary);
        }

        let extractor = Arc::new(Extractor::new(
            self.client.clone(),
            self.prompts.clone(),
            self.config.extractor.clone(),
        ));
        let mut prompts = extractor.build_prompts(genre, schema)?;

        // Pre-execution checkpoint: prompts may be reviewed or edited
        // before any LLM call is issued
        let context = HilContext::pre_execution("extraction", "extractor")
            .with_prompts(prompts.system.clone(), prompts.user_template.clone())
            .with_metadata("genre", genre.as_str())
            .with_metadata("chunks", chunks.len().to_string());
        let response = hil.pause(context).await;
        match response.action {
            HilAction::Abort => {
                summary
                    .phase_errors
                    .push(abort_note("extraction", &response));
                self.transition(&mut summary, RunState::Aborted);
                return Ok(summary);
            }
            HilAction::Skip => {
                summary
                    .warnings
                    .push("extraction skipped at pre-execution checkpoint".to_string());
                self.transition(&mut summary, RunState::Completed);
                return Ok(summary);
            }
            HilAction::Edit => {
                if let Some(system) = response.edited_system_prompt {
                    prompts.system = system;
                }
                if let Some(user_template) = response.edited_user_prompt {
                    prompts.user_template = user_template;
                }
            }
            _ => {}
        }

        // Extraction, concurrent up to the configured cap
        self.transition(&mut summary, RunState::Extracting);
        let outcomes = self.extract_all(chunks, Arc::new(prompts), extractor).await;

        let mut candidates: Vec<Entity> = Vec::new();
        let mut raw_relationships: Vec<Relationship> = Vec::new();
        let mut fatal: Option<String> = None;

        for (index, outcome) in outcomes {
            match outcome {
                ChunkOutcome::Extracted(extraction) => {
                    summary.chunks_succeeded += 1;
                    for note in extraction.errors {
                        summary.warnings.push(format!("chunk {}: {}", index, note));
                    }
                    candidates.extend(extraction.entities);
                    raw_relationships.extend(extraction.relationships);
                }
                ChunkOutcome::Failed(e) => {
                    summary.chunks_failed += 1;
                    summary.phase_errors.push(format!("chunk {}: {}", index, e));
                    if e.is_fatal() {
                        fatal = Some(e.to_string());
                    }
                }
                ChunkOutcome::NotAttempted => {
                    summary.chunks_failed += 1;
                    summary
                        .phase_errors
                        .push(format!("chunk {}: not attempted, run was failing", index));
                }
            }
        }

        if let Some(cause) = fatal {
            summary
                .phase_errors
                .push(format!("run failed: {}", cause));
            self.transition(&mut summary, RunState::Failed);
            return Ok(summary);
        }

        if summary.chunks_succeeded == 0 {
            summary
                .phase_errors
                .push("every chunk failed extraction".to_string());
            self.transition(&mut summary, RunState::Failed);
            return Ok(summary);
        }

        // Reconciliation and validation, then the two review checkpoints.
        // RETRY at a checkpoint re-runs exactly this part, never extraction.
        self.transition(&mut summary, RunState::Reconciling);
        let sentinel = Sentinel::new(self.config.sentinel)?;
        let validator = Validator::new(self.config.validator);

        let mut review_retries = 0u32;
        let (final_entities, commit_entities, outcome) = loop {
            let outcome = sentinel.reconcile(candidates.clone());
            self.transition(&mut summary, RunState::Validating);
            let report = validator.validate_entities(&outcome.entities);

            self.transition(&mut summary, RunState::AwaitingReview);
            let context = entity_checkpoint_context(&outcome, &report);
            let response = hil.pause(context).await;

            match response.action {
                HilAction::Approve => break (outcome.entities.clone(), true, outcome),
                HilAction::Edit => {
                    match parse_edited_entities(response.edited_results.as_ref()) {
                        Ok(edited) => break (edited, true, outcome),
                        Err(e) => {
                            summary
                                .phase_errors
                                .push(format!("entity edit rejected: {}", e));
                            self.transition(&mut summary, RunState::Aborted);
                            return Ok(summary);
                        }
                    }
                }
                HilAction::Retry => {
                    review_retries += 1;
                    if review_retries > self.config.max_review_retries {
                        summary
                            .phase_errors
                            .push("entity review retried past the configured cap".to_string());
                        self.transition(&mut summary, RunState::Aborted);
                        return Ok(summary);
                    }
                    info!(review_retries, "Re-running reconciliation at reviewer request");
                    self.transition(&mut summary, RunState::Reconciling);
                    continue;
                }
                HilAction::Skip => {
                    summary
                        .warnings
                        .push("entities skipped at review checkpoint".to_string());
                    break (outcome.entities.clone(), false, outcome);
                }
                HilAction::Abort => {
                    summary.phase_errors.push(abort_note("entities", &response));
                    self.transition(&mut summary, RunState::Aborted);
                    return Ok(summary);
                }
            }
        };

        record_report(&mut summary, &validator.validate_entities(&final_entities));

        // Relationship endpoints move from absorbed candidates onto their
        // canonical entities, then duplicates collapse
        let relationships = remap_relationships(raw_relationships, &outcome.id_map);
        let known_ids: BTreeSet<EntityId> = final_entities.iter().map(|e| e.id).collect();

        let mut review_retries = 0u32;
        let (final_relationships, commit_relationships) = loop {
            let (accepted, report, dropped) =
                partition_relationships(&validator, &relationships, &known_ids);

            self.transition(&mut summary, RunState::AwaitingReview);
            let context = relationship_checkpoint_context(&accepted, &report, &dropped);
            let response = hil.pause(context).await;

            match response.action {
                HilAction::Approve => {
                    record_report(&mut summary, &report);
                    summary.warnings.extend(dropped);
                    break (accepted, true);
                }
                HilAction::Edit => {
                    match parse_edited_relationships(response.edited_results.as_ref()) {
                        Ok(edited) => {
                            let (accepted, report, dropped) =
                                partition_relationships(&validator, &edited, &known_ids);
                            record_report(&mut summary, &report);
                            summary.warnings.extend(dropped);
                            break (accepted, true);
                        }
                        Err(e) => {
                            summary
                                .phase_errors
                                .push(format!("relationship edit rejected: {}", e));
                            self.transition(&mut summary, RunState::Aborted);
                            return Ok(summary);
                        }
                    }
                }
                HilAction::Retry => {
                    review_retries += 1;
                    if review_retries > self.config.max_review_retries {
                        summary.phase_errors.push(
                            "relationship review retried past the configured cap".to_string(),
                        );
                        self.transition(&mut summary, RunState::Aborted);
                        return Ok(summary);
                    }
                    info!(review_retries, "Re-validating relationships at reviewer request");
                    continue;
                }
                HilAction::Skip => {
                    summary
                        .warnings
                        .push("relationships skipped at review checkpoint".to_string());
                    break (Vec::new(), false);
                }
                HilAction::Abort => {
                    summary
                        .phase_errors
                        .push(abort_note("relationships", &response));
                    self.transition(&mut summary, RunState::Aborted);
                    return Ok(summary);
                }
            }
        };

        // Commit
        self.transition(&mut summary, RunState::Committing);

        if commit_entities {
            if let Err(e) = self.store.save_entities(&final_entities) {
                summary
                    .phase_errors
                    .push(format!("failed to store entities: {}", e));
                self.transition(&mut summary, RunState::Failed);
                return Ok(summary);
            }
            summary.entity_count = final_entities.len();
        }

        if commit_relationships {
            if let Err(e) = self.store.save_relationships(&final_relationships) {
                summary
                    .phase_errors
                    .push(format!("failed to store relationships: {}", e));
                self.transition(&mut summary, RunState::Failed);
                return Ok(summary);
            }
            summary.relationship_count = final_relationships.len();
        }

        self.transition(&mut summary, RunState::Completed);
        Ok(summary)
    }

    /// Fan chunk extraction out over a bounded task set
    ///
    /// Results come back tagged with their chunk index and are returned in
    /// chunk order, so downstream passes never see completion order. A
    /// fatal failure raises the abort flag: tasks that have not started
    /// their call yet return without issuing one (in-flight calls finish
    /// and their results are simply discarded by the failed run).
    async fn extract_all(
        &self,
        chunks: Vec<Chunk>,
        prompts: Arc<ExtractionPrompts>,
        extractor: Arc<Extractor<C>>,
    ) -> Vec<(usize, ChunkOutcome)> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_extractions));
        let abort = Arc::new(AtomicBool::new(false));
        let max_retries = self.config.max_chunk_retries;

        let mut tasks: JoinSet<(usize, ChunkOutcome)> = JoinSet::new();

        for chunk in chunks {
            let semaphore = semaphore.clone();
            let abort = abort.clone();
            let prompts = prompts.clone();
            let extractor = extractor.clone();

            tasks.spawn(async move {
                let index = chunk.index;
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return (index, ChunkOutcome::NotAttempted),
                };

                let mut attempt = 0u32;
                loop {
                    if abort.load(Ordering::Relaxed) {
                        return (index, ChunkOutcome::NotAttempted);
                    }

                    match extractor.extract(&chunk, &prompts).await {
                        Ok(extraction) => return (index, ChunkOutcome::Extracted(extraction)),
                        Err(e) if e.is_fatal() => {
                            abort.store(true, Ordering::Relaxed);
                            return (index, ChunkOutcome::Failed(e));
                        }
                        Err(e) => {
                            if retryable(&e) && attempt < max_retries {
                                let delay = backoff_delay(&e, attempt);
                                warn!(
                                    chunk_index = index,
                                    attempt,
                                    "Chunk extraction failed ({}), retrying in {:?}",
                                    e,
                                    delay
                                );
                                tokio::time::sleep(delay).await;
                                attempt += 1;
                                continue;
                            }
                            return (index, ChunkOutcome::Failed(e));
                        }
                    }
                }
            });
        }

        let mut outcomes = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => warn!("Extraction task panicked: {}", e),
            }
        }

        outcomes.sort_by_key(|(index, _)| *index);
        outcomes
    }

    fn transition(&self, summary: &mut RunSummary, state: RunState) {
        debug!(from = %summary.status, to = %state, "Run state transition");
        summary.status = state;
    }
}

/// Whether a chunk failure is worth retrying
fn retryable(error: &ExtractorError) -> bool {
    match error {
        ExtractorError::Timeout { .. } => true,
        ExtractorError::LlmCall { source, .. } => source.is_retryable(),
        _ => false,
    }
}

/// Exponential backoff, honoring a provider-suggested wait when present
fn backoff_delay(error: &ExtractorError, attempt: u32) -> Duration {
    if let ExtractorError::LlmCall {
        source: LlmError::RateLimited {
            retry_after: Some(delay),
        },
        ..
    } = error
    {
        return *delay;
    }
    Duration::from_secs(1u64 << attempt.min(6))
}

fn abort_note(checkpoint: &str, response: &HilResponse) -> String {
    match &response.message {
        Some(message) => format!("aborted at {} checkpoint: {}", checkpoint, message),
        None => format!("aborted at {} checkpoint", checkpoint),
    }
}

fn validation_to_json(report: &ValidationReport) -> serde_json::Value {
    json!({
        "is_valid": report.is_valid(),
        "issues": report
            .issues
            .iter()
            .map(|issue| json!({
                "field": issue.field,
                "message": issue.message,
                "severity": issue.severity.to_string(),
            }))
            .collect::<Vec<_>>(),
    })
}

fn entity_checkpoint_context(
    outcome: &ReconcileOutcome,
    report: &ValidationReport,
) -> HilContext {
    let payload = json!({
        "entities": outcome.entities.iter().map(codec::entity_to_json).collect::<Vec<_>>(),
        "review": outcome
            .review
            .iter()
            .map(|candidate| json!({
                "entity_a": candidate.entity_a.to_string(),
                "entity_b": candidate.entity_b.to_string(),
                "similarity": candidate.similarity,
                "rationale": candidate.rationale,
            }))
            .collect::<Vec<_>>(),
        "validation": validation_to_json(report),
    });

    HilContext::post_execution("entities", "sentinel")
        .with_results(payload)
        .with_metadata("total_in", outcome.stats.total_in.to_string())
        .with_metadata("total_out", outcome.stats.total_out.to_string())
        .with_metadata("auto_merged", outcome.stats.auto_merged.to_string())
        .with_metadata("flagged", outcome.stats.flagged.to_string())
}

fn relationship_checkpoint_context(
    relationships: &[Relationship],
    report: &ValidationReport,
    dropped: &[String],
) -> HilContext {
    let payload = json!({
        "relationships": relationships
            .iter()
            .map(codec::relationship_to_json)
            .collect::<Vec<_>>(),
        "dropped": dropped,
        "validation": validation_to_json(report),
    });

    HilContext::post_execution("relationships", "sentinel")
        .with_results(payload)
        .with_metadata("count", relationships.len().to_string())
        .with_metadata("dropped", dropped.len().to_string())
}

/// Point endpoints of merged-away candidates at their canonical entity and
/// collapse the duplicates that merging exposes
fn remap_relationships(
    relationships: Vec<Relationship>,
    id_map: &BTreeMap<EntityId, EntityId>,
) -> Vec<Relationship> {
    let mut seen: BTreeSet<(EntityId, EntityId, String)> = BTreeSet::new();
    let mut remapped = Vec::new();

    for mut relationship in relationships {
        if let Some(canonical) = id_map.get(&relationship.source_id) {
            relationship.source_id = *canonical;
        }
        if let Some(canonical) = id_map.get(&relationship.target_id) {
            relationship.target_id = *canonical;
        }

        let key = (
            relationship.source_id,
            relationship.target_id,
            relationship.kind.as_str().to_string(),
        );
        if seen.insert(key) {
            remapped.push(relationship);
        } else {
            debug!(
                "Dropping duplicate relationship {} -> {}",
                relationship.source_id, relationship.target_id
            );
        }
    }

    remapped
}

/// Validate relationships, keeping the clean ones
///
/// Records with ERROR-severity issues (bad strength, unresolved endpoints)
/// are excluded from the commit set; the notes say why.
fn partition_relationships(
    validator: &Validator,
    relationships: &[Relationship],
    known_ids: &BTreeSet<EntityId>,
) -> (Vec<Relationship>, ValidationReport, Vec<String>) {
    let mut accepted = Vec::new();
    let mut combined = ValidationReport::clean();
    let mut dropped = Vec::new();

    for relationship in relationships {
        let report = validator.validate_relationship(relationship, known_ids);
        if report.is_valid() {
            accepted.push(relationship.clone());
        } else {
            for issue in report
                .issues
                .iter()
                .filter(|issue| issue.severity == Severity::Error)
            {
                dropped.push(format!("dropped: {}", issue.message));
            }
        }
        combined.merge(report);
    }

    (accepted, combined, dropped)
}

fn parse_edited_entities(results: Option<&serde_json::Value>) -> Result<Vec<Entity>, String> {
    let results = results.ok_or_else(|| "edit response carried no results".to_string())?;
    let entries = results
        .get("entities")
        .and_then(|v| v.as_array())
        .ok_or_else(|| "edited results must contain an 'entities' array".to_string())?;

    entries.iter().map(codec::entity_from_json).collect()
}

fn parse_edited_relationships(
    results: Option<&serde_json::Value>,
) -> Result<Vec<Relationship>, String> {
    let results = results.ok_or_else(|| "edit response carried no results".to_string())?;
    let entries = results
        .get("relationships")
        .and_then(|v| v.as_array())
        .ok_or_else(|| "edited results must contain a 'relationships' array".to_string())?;

    entries.iter().map(codec::relationship_from_json).collect()
}

fn record_report(summary: &mut RunSummary, report: &ValidationReport) {
    for issue in &report.issues {
        let note = format!("{}: {}", issue.severity, issue.message);
        match issue.severity {
            Severity::Error => summary.phase_errors.push(note),
            _ => summary.warnings.push(note),
        }
    }
}
