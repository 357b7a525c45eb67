//! Reconciliation of candidate entities into a canonical set

use crate::config::SentinelConfig;
use crate::similarity::{NameOverlapScorer, SimilarityScorer};
use crate::SentinelError;
use forge_domain::{Entity, EntityId};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// A pair of candidates the Sentinel could not decide on its own
///
/// Produced for pairs inside the review band and for high-similarity pairs
/// with conflicting specific kinds; consumed by the review layer. Not
/// persisted beyond the reconciliation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeCandidate {
    /// Id of the earlier (canonical-side) candidate
    pub entity_a: EntityId,

    /// Id of the later candidate
    pub entity_b: EntityId,

    /// Similarity score in [0.0, 1.0]
    pub similarity: f64,

    /// Human-readable explanation of why the pair was raised
    pub rationale: String,
}

/// What to do with a merge candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeAction {
    /// Merge the pair into one entity
    Merge,

    /// Keep both entities distinct
    KeepSeparate,

    /// Leave the pair for human review
    Deferred,
}

/// A resolved (or deferred) merge candidate
#[derive(Debug, Clone, PartialEq)]
pub struct MergeDecision {
    /// The pair in question
    pub candidate: MergeCandidate,

    /// The action taken
    pub action: MergeAction,

    /// The merged entity, populated only when `action` is `Merge`
    pub merged: Option<Entity>,
}

/// Counters describing one reconciliation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SentinelStats {
    /// Candidates in
    pub total_in: usize,

    /// Canonical entities out
    pub total_out: usize,

    /// Pairs merged automatically
    pub auto_merged: usize,

    /// Pairs deferred to review
    pub flagged: usize,
}

/// Result of one reconciliation pass
#[derive(Debug, Clone, Default)]
pub struct ReconcileOutcome {
    /// The deduplicated canonical set, in (chunk index, arrival) order
    pub entities: Vec<Entity>,

    /// Pairs awaiting a human decision
    pub review: Vec<MergeCandidate>,

    /// Audit trail of what the pass did
    pub decisions: Vec<MergeDecision>,

    /// Counters for the run summary
    pub stats: SentinelStats,

    /// Absorbed id → canonical id, for remapping relationship endpoints
    pub id_map: BTreeMap<EntityId, EntityId>,
}

/// The reconciliation pass
///
/// Pure with respect to shared state: operates on the passed-in candidates
/// and returns new structures.
pub struct Sentinel<S: SimilarityScorer = NameOverlapScorer> {
    scorer: S,
    config: SentinelConfig,
}

impl Sentinel<NameOverlapScorer> {
    /// Create a Sentinel with the default scorer
    pub fn new(config: SentinelConfig) -> Result<Self, SentinelError> {
        Self::with_scorer(config, NameOverlapScorer)
    }
}

impl<S: SimilarityScorer> Sentinel<S> {
    /// Create a Sentinel with a custom scorer
    pub fn with_scorer(config: SentinelConfig, scorer: S) -> Result<Self, SentinelError> {
        config.validate().map_err(SentinelError::Config)?;
        Ok(Self { scorer, config })
    }

    /// Reconcile candidates into a canonical set
    ///
    /// Candidates are processed in (chunk index, arrival order) order; each
    /// is scored against the canonical set built so far and either absorbed,
    /// deferred to review, or admitted as a new canonical entity.
    pub fn reconcile(&self, mut candidates: Vec<Entity>) -> ReconcileOutcome {
        let total_in = candidates.len();
        candidates.sort_by_key(|entity| entity.provenance.chunk_index);

        let mut outcome = ReconcileOutcome::default();

        for candidate in candidates {
            self.place(candidate, &mut outcome);
        }

        outcome.stats.total_in = total_in;
        outcome.stats.total_out = outcome.entities.len();

        info!(
            total_in = outcome.stats.total_in,
            total_out = outcome.stats.total_out,
            auto_merged = outcome.stats.auto_merged,
            flagged = outcome.stats.flagged,
            "Reconciliation complete"
        );

        outcome
    }

    /// Apply review-layer decisions to a reconciled set
    ///
    /// `Merge` decisions absorb `entity_b` into `entity_a` (or replace the
    /// pair with the supplied merged entity); `KeepSeparate` and `Deferred`
    /// leave the set unchanged. Returns the updated set plus the additional
    /// id remappings the merges introduced.
    pub fn apply_decisions(
        &self,
        mut entities: Vec<Entity>,
        decisions: &[MergeDecision],
    ) -> (Vec<Entity>, BTreeMap<EntityId, EntityId>) {
        let mut id_map = BTreeMap::new();

        for decision in decisions {
            if decision.action != MergeAction::Merge {
                continue;
            }

            let a_pos = entities.iter().position(|e| e.id == decision.candidate.entity_a);
            let b_pos = entities.iter().position(|e| e.id == decision.candidate.entity_b);
            let (Some(a_pos), Some(b_pos)) = (a_pos, b_pos) else {
                debug!(
                    "Skipping merge decision for unknown pair {} / {}",
                    decision.candidate.entity_a, decision.candidate.entity_b
                );
                continue;
            };

            let absorbed = entities.remove(b_pos);
            let a_pos = if b_pos < a_pos { a_pos - 1 } else { a_pos };

            match &decision.merged {
                Some(merged) => {
                    id_map.insert(absorbed.id, merged.id);
                    if entities[a_pos].id != merged.id {
                        id_map.insert(entities[a_pos].id, merged.id);
                    }
                    entities[a_pos] = merged.clone();
                }
                None => {
                    id_map.insert(absorbed.id, entities[a_pos].id);
                    merge_into(&mut entities[a_pos], absorbed);
                }
            }
        }

        (entities, id_map)
    }

    /// Score a candidate against the canonical set and place it
    fn place(&self, candidate: Entity, outcome: &mut ReconcileOutcome) {
        // Earliest canonical entity wins ties, so iteration order matters
        let mut best: Option<(usize, f64)> = None;
        for (idx, canonical) in outcome.entities.iter().enumerate() {
            let score = self.scorer.score(canonical, &candidate);
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((idx, score));
            }
        }

        let Some((idx, score)) = best else {
            outcome.entities.push(candidate);
            return;
        };

        if score >= self.config.auto_merge_threshold {
            let canonical = &outcome.entities[idx];

            if kinds_conflict(canonical, &candidate) {
                // Never silently merge across conflicting specific kinds
                let pair = MergeCandidate {
                    entity_a: canonical.id,
                    entity_b: candidate.id,
                    similarity: score,
                    rationale: format!(
                        "'{}' ({}) and '{}' ({}) look alike but declare different kinds",
                        canonical.name, canonical.kind, candidate.name, candidate.kind
                    ),
                };
                outcome.decisions.push(MergeDecision {
                    candidate: pair.clone(),
                    action: MergeAction::Deferred,
                    merged: None,
                });
                outcome.review.push(pair);
                outcome.stats.flagged += 1;
                outcome.entities.push(candidate);
                return;
            }

            debug!(
                canonical = %canonical.name,
                absorbed = %candidate.name,
                score,
                "Auto-merging candidates"
            );

            let pair = MergeCandidate {
                entity_a: canonical.id,
                entity_b: candidate.id,
                similarity: score,
                rationale: format!(
                    "'{}' and '{}' share a surface form or near-identical names",
                    canonical.name, candidate.name
                ),
            };

            outcome.id_map.insert(candidate.id, canonical.id);
            merge_into(&mut outcome.entities[idx], candidate);
            outcome.decisions.push(MergeDecision {
                candidate: pair,
                action: MergeAction::Merge,
                merged: Some(outcome.entities[idx].clone()),
            });
            outcome.stats.auto_merged += 1;
        } else if score >= self.config.review_threshold {
            let canonical = &outcome.entities[idx];
            let pair = MergeCandidate {
                entity_a: canonical.id,
                entity_b: candidate.id,
                similarity: score,
                rationale: format!(
                    "'{}' and '{}' are similar (score {:.2}) but below the auto-merge bar",
                    canonical.name, candidate.name, score
                ),
            };
            outcome.decisions.push(MergeDecision {
                candidate: pair.clone(),
                action: MergeAction::Deferred,
                merged: None,
            });
            outcome.review.push(pair);
            outcome.stats.flagged += 1;
            outcome.entities.push(candidate);
        } else {
            outcome.entities.push(candidate);
        }
    }
}

/// Whether two entities declare different specific kinds
fn kinds_conflict(a: &Entity, b: &Entity) -> bool {
    a.kind.is_specific() && b.kind.is_specific() && a.kind != b.kind
}

/// Merge `absorbed` into `canonical`
///
/// The earlier chunk's record stays canonical: its name and attributes win
/// on conflict, and its description wins when non-empty. The absorbed
/// record contributes its surface forms, its attributes for keys the
/// canonical record lacks, and a more specific kind when the canonical one
/// is Abstract or Unknown.
fn merge_into(canonical: &mut Entity, absorbed: Entity) {
    if absorbed.name != canonical.name {
        canonical.aliases.insert(absorbed.name);
    }
    for alias in absorbed.aliases {
        if alias != canonical.name {
            canonical.aliases.insert(alias);
        }
    }

    if canonical.description.is_empty() && !absorbed.description.is_empty() {
        canonical.description = absorbed.description;
    }

    for (key, value) in absorbed.attributes {
        canonical.attributes.entry(key).or_insert(value);
    }

    if !canonical.kind.is_specific() && absorbed.kind.is_specific() {
        canonical.kind = absorbed.kind;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forge_domain::{AttributeValue, EntityKind, Provenance};

    fn candidate(name: &str, kind: EntityKind, chunk: usize) -> Entity {
        Entity::new(EntityId::new(), name, kind, Provenance::new(chunk, (0, 0)))
    }

    fn sentinel() -> Sentinel {
        Sentinel::new(SentinelConfig::default()).unwrap()
    }

    #[test]
    fn test_identical_candidates_always_merge() {
        let outcome = sentinel().reconcile(vec![
            candidate("Elena Rossi", EntityKind::Actor, 0),
            candidate("Elena Rossi", EntityKind::Actor, 1),
        ]);

        assert_eq!(outcome.entities.len(), 1);
        assert_eq!(outcome.stats.auto_merged, 1);
        assert_eq!(outcome.stats.flagged, 0);
        assert!(outcome.review.is_empty());
    }

    #[test]
    fn test_alias_overlap_merges_and_unions_surface_forms() {
        let a = candidate("Elena Rossi", EntityKind::Actor, 0);
        let b = candidate("E. Rossi", EntityKind::Actor, 1).with_alias("Elena Rossi");

        let outcome = sentinel().reconcile(vec![a, b]);

        assert_eq!(outcome.entities.len(), 1);
        let merged = &outcome.entities[0];
        assert_eq!(merged.name, "Elena Rossi");

        let forms: Vec<&str> = merged.surface_forms().collect();
        assert!(forms.contains(&"Elena Rossi"));
        assert!(forms.contains(&"E. Rossi"));
    }

    #[test]
    fn test_unrelated_candidates_stay_distinct() {
        let outcome = sentinel().reconcile(vec![
            candidate("Elena Rossi", EntityKind::Actor, 0),
            candidate("Grand Duchy of Kiev", EntityKind::Polity, 0),
        ]);

        assert_eq!(outcome.entities.len(), 2);
        assert_eq!(outcome.stats.auto_merged, 0);
        assert!(outcome.id_map.is_empty());
    }

    #[test]
    fn test_kind_conflict_is_flagged_not_merged() {
        let outcome = sentinel().reconcile(vec![
            candidate("Venice", EntityKind::Location, 0),
            candidate("Venice", EntityKind::Polity, 1),
        ]);

        assert_eq!(outcome.entities.len(), 2, "conflicting kinds must not merge");
        assert_eq!(outcome.review.len(), 1);
        assert_eq!(outcome.stats.flagged, 1);
        assert!(outcome.review[0].rationale.contains("different kinds"));
    }

    #[test]
    fn test_abstract_kind_upgrades_on_merge() {
        let outcome = sentinel().reconcile(vec![
            candidate("The Accord", EntityKind::Abstract, 0),
            candidate("The Accord", EntityKind::Event, 1),
        ]);

        assert_eq!(outcome.entities.len(), 1);
        assert_eq!(outcome.entities[0].kind, EntityKind::Event);
    }

    #[test]
    fn test_earlier_chunk_wins_description_and_attributes() {
        let mut a = candidate("Venice", EntityKind::Location, 0)
            .with_description("A maritime capital.");
        a.attributes
            .insert("ruler".to_string(), AttributeValue::Text("the Doge".to_string()));

        let mut b = candidate("Venice", EntityKind::Location, 1)
            .with_description("A city of canals.");
        b.attributes
            .insert("ruler".to_string(), AttributeValue::Text("unknown".to_string()));
        b.attributes
            .insert("region".to_string(), AttributeValue::Text("Adriatic".to_string()));

        let outcome = sentinel().reconcile(vec![a, b]);
        let merged = &outcome.entities[0];

        assert_eq!(merged.description, "A maritime capital.");
        assert_eq!(
            merged.attributes.get("ruler"),
            Some(&AttributeValue::Text("the Doge".to_string()))
        );
        assert_eq!(
            merged.attributes.get("region"),
            Some(&AttributeValue::Text("Adriatic".to_string()))
        );
    }

    #[test]
    fn test_empty_description_filled_from_absorbed() {
        let a = candidate("Venice", EntityKind::Location, 0);
        let b = candidate("Venice", EntityKind::Location, 1).with_description("A city of canals.");

        let outcome = sentinel().reconcile(vec![a, b]);
        assert_eq!(outcome.entities[0].description, "A city of canals.");
    }

    #[test]
    fn test_id_map_points_absorbed_to_canonical() {
        let a = candidate("Venice", EntityKind::Location, 0);
        let b = candidate("Venice", EntityKind::Location, 1);
        let (a_id, b_id) = (a.id, b.id);

        let outcome = sentinel().reconcile(vec![a, b]);

        assert_eq!(outcome.id_map.get(&b_id), Some(&a_id));
        assert_eq!(outcome.entities[0].id, a_id);
    }

    #[test]
    fn test_insensitive_to_arrival_order() {
        let a = candidate("Venice", EntityKind::Location, 0).with_description("First mention.");
        let b = candidate("Venice", EntityKind::Location, 1).with_description("Second mention.");

        // Completion order reversed: chunk 1's result arrived first
        let outcome = sentinel().reconcile(vec![b.clone(), a.clone()]);

        // Chunk order, not arrival order, decides the canonical record
        assert_eq!(outcome.entities.len(), 1);
        assert_eq!(outcome.entities[0].id, a.id);
        assert_eq!(outcome.entities[0].description, "First mention.");
    }

    #[test]
    fn test_determinism_across_calls() {
        let candidates = vec![
            candidate("Elena Rossi", EntityKind::Actor, 0).with_description("A spymaster."),
            candidate("E. Rossi", EntityKind::Actor, 1).with_alias("Elena Rossi"),
            candidate("Republic of Venice", EntityKind::Polity, 1),
            candidate("Venetian Republic", EntityKind::Polity, 2).with_alias("Republic of Venice"),
            candidate("Kiev", EntityKind::Location, 2),
        ];

        let sentinel = sentinel();
        let first = sentinel.reconcile(candidates.clone());
        let second = sentinel.reconcile(candidates);

        assert_eq!(first.entities, second.entities);
        assert_eq!(first.review, second.review);
        assert_eq!(first.stats, second.stats);
        assert_eq!(first.id_map, second.id_map);
    }

    #[test]
    fn test_review_band_produces_candidates_and_keeps_both() {
        let config = SentinelConfig {
            auto_merge_threshold: 0.95,
            review_threshold: 0.30,
        };
        let sentinel = Sentinel::new(config).unwrap();

        let a = candidate("Republic of Venice", EntityKind::Polity, 0);
        let b = candidate("Venice Republic", EntityKind::Polity, 1);

        let outcome = sentinel.reconcile(vec![a, b]);

        assert_eq!(outcome.entities.len(), 2);
        assert_eq!(outcome.review.len(), 1);
        assert!(outcome.review[0].similarity < 0.95);
        assert!(outcome.review[0].similarity >= 0.30);
    }

    #[test]
    fn test_apply_merge_decision() {
        let config = SentinelConfig {
            auto_merge_threshold: 0.95,
            review_threshold: 0.30,
        };
        let sentinel = Sentinel::new(config).unwrap();

        let a = candidate("Republic of Venice", EntityKind::Polity, 0);
        let b = candidate("Venice Republic", EntityKind::Polity, 1);
        let a_id = a.id;
        let b_id = b.id;

        let outcome = sentinel.reconcile(vec![a, b]);
        assert_eq!(outcome.review.len(), 1);

        let decision = MergeDecision {
            candidate: outcome.review[0].clone(),
            action: MergeAction::Merge,
            merged: None,
        };

        let (entities, id_map) = sentinel.apply_decisions(outcome.entities, &[decision]);
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].id, a_id);
        assert!(entities[0].aliases.contains("Venice Republic"));
        assert_eq!(id_map.get(&b_id), Some(&a_id));
    }

    #[test]
    fn test_apply_keep_separate_is_noop() {
        let sentinel = sentinel();
        let a = candidate("Venice", EntityKind::Location, 0);
        let b = candidate("Kiev", EntityKind::Location, 1);

        let decision = MergeDecision {
            candidate: MergeCandidate {
                entity_a: a.id,
                entity_b: b.id,
                similarity: 0.5,
                rationale: String::new(),
            },
            action: MergeAction::KeepSeparate,
            merged: None,
        };

        let (entities, id_map) = sentinel.apply_decisions(vec![a, b], &[decision]);
        assert_eq!(entities.len(), 2);
        assert!(id_map.is_empty());
    }

    #[test]
    fn test_stats_counts() {
        let outcome = sentinel().reconcile(vec![
            candidate("Venice", EntityKind::Location, 0),
            candidate("Venice", EntityKind::Location, 1),
            candidate("Venice", EntityKind::Polity, 2),
            candidate("Kiev", EntityKind::Location, 3),
        ]);

        assert_eq!(outcome.stats.total_in, 4);
        assert_eq!(outcome.stats.total_out, 3);
        assert_eq!(outcome.stats.auto_merged, 1);
        assert_eq!(outcome.stats.flagged, 1);
    }
}
