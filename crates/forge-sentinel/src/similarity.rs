//! Similarity scoring between candidate entities

use forge_domain::Entity;
use std::collections::BTreeSet;

/// Pluggable similarity metric over candidate entities
///
/// Scores are in [0.0, 1.0]. Implementations must be deterministic, and
/// must score two candidates with identical name and kind at or above any
/// auto-merge threshold in use - the default scorer returns exactly 1.0 for
/// them.
pub trait SimilarityScorer: Send + Sync {
    /// Score the similarity of two candidates
    fn score(&self, a: &Entity, b: &Entity) -> f64;
}

/// Default scorer: surface-form overlap with a description component
///
/// Any shared normalized surface form (name or alias) short-circuits to
/// 1.0. Otherwise the score is a weighted blend of token Jaccard over
/// surface forms (0.8) and over descriptions (0.2).
#[derive(Debug, Clone, Copy, Default)]
pub struct NameOverlapScorer;

impl NameOverlapScorer {
    const NAME_WEIGHT: f64 = 0.8;
    const DESCRIPTION_WEIGHT: f64 = 0.2;

    fn surface_set(entity: &Entity) -> BTreeSet<String> {
        entity.surface_forms().map(normalize).collect()
    }

    fn token_set(forms: &BTreeSet<String>) -> BTreeSet<String> {
        forms
            .iter()
            .flat_map(|form| form.split_whitespace())
            .map(|token| token.to_string())
            .collect()
    }

    fn description_tokens(entity: &Entity) -> BTreeSet<String> {
        normalize(&entity.description)
            .split_whitespace()
            .map(|token| token.to_string())
            .collect()
    }

    fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
        if a.is_empty() && b.is_empty() {
            return 0.0;
        }
        let intersection = a.intersection(b).count();
        let union = a.union(b).count();
        intersection as f64 / union as f64
    }
}

impl SimilarityScorer for NameOverlapScorer {
    fn score(&self, a: &Entity, b: &Entity) -> f64 {
        let forms_a = Self::surface_set(a);
        let forms_b = Self::surface_set(b);

        // A shared surface form is as strong as evidence gets here
        if forms_a.intersection(&forms_b).next().is_some() {
            return 1.0;
        }

        let name_score = Self::jaccard(&Self::token_set(&forms_a), &Self::token_set(&forms_b));
        let description_score =
            Self::jaccard(&Self::description_tokens(a), &Self::description_tokens(b));

        Self::NAME_WEIGHT * name_score + Self::DESCRIPTION_WEIGHT * description_score
    }
}

/// Lowercased, punctuation-stripped comparison key
fn normalize(text: &str) -> String {
    text.chars()
        .map(|c| {
            if c.is_alphanumeric() || c.is_whitespace() {
                c.to_ascii_lowercase()
            } else {
                ' '
            }
        })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
