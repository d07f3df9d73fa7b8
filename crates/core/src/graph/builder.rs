use std::cmp::Ordering;
use std::collections::HashMap;

use rand::Rng;

use super::scoring::SimilarityScorer;
use super::{
    CANDIDATE_SCORE_THRESHOLD, MAX_EDGES_PER_SOURCE, MIN_PRIMARY_EDGES,
    MIN_VARIATION_SHARED_TAGS, STYLE_VARIATION_RATIONALE,
};
use crate::config::GraphConfig;
use crate::domain::item::{Item, ItemId};
use crate::domain::navigation::{NavigationEdge, NavigationPath};
use crate::errors::DomainError;

/// Working edge candidate before it is frozen into a `NavigationEdge`.
#[derive(Clone, Debug)]
struct Candidate {
    target: ItemId,
    score: f64,
    rationale: Vec<String>,
    variation: bool,
}

/// Builds one `NavigationPath` per catalog item from the similarity rules.
///
/// The builder is a pure function of (catalog snapshot, config, RNG): the
/// same snapshot and seed always produce the same graph, and sources with no
/// qualifying candidate simply produce no path.
#[derive(Clone, Debug)]
pub struct GraphBuilder {
    scorer: SimilarityScorer,
    variation_probability: f64,
}

impl GraphBuilder {
    pub fn new(config: &GraphConfig) -> Self {
        Self {
            scorer: SimilarityScorer::new(config),
            variation_probability: config.variation_probability,
        }
    }

    pub fn scorer(&self) -> &SimilarityScorer {
        &self.scorer
    }

    /// Builds paths for every source item, ordered by source id.
    pub fn build(
        &self,
        items: &[Item],
        rng: &mut impl Rng,
    ) -> Result<Vec<NavigationPath>, DomainError> {
        let mut catalog: Vec<&Item> = items.iter().collect();
        catalog.sort_by(|a, b| a.id.cmp(&b.id));
        let by_id: HashMap<&ItemId, &Item> =
            catalog.iter().map(|item| (&item.id, *item)).collect();

        let mut paths = Vec::with_capacity(catalog.len());
        for source in &catalog {
            if let Some(path) = self.build_for_source(source, &catalog, &by_id, rng)? {
                paths.push(path);
            }
        }
        Ok(paths)
    }

    fn build_for_source(
        &self,
        source: &Item,
        catalog: &[&Item],
        by_id: &HashMap<&ItemId, &Item>,
        rng: &mut impl Rng,
    ) -> Result<Option<NavigationPath>, DomainError> {
        let mut candidates: Vec<Candidate> = catalog
            .iter()
            .filter(|candidate| candidate.id != source.id)
            .filter_map(|candidate| {
                let (score, rationale) = self.scorer.score(source, candidate);
                (score > CANDIDATE_SCORE_THRESHOLD).then(|| Candidate {
                    target: candidate.id.clone(),
                    score,
                    rationale,
                    variation: false,
                })
            })
            .collect();

        sort_candidates(&mut candidates);
        let mut selected: Vec<Candidate> =
            candidates.into_iter().take(MAX_EDGES_PER_SOURCE).collect();

        if selected.len() < MIN_PRIMARY_EDGES || rng.gen_bool(self.variation_probability) {
            self.inject_style_variations(source, catalog, &mut selected);
        }

        sort_candidates(&mut selected);
        selected.truncate(MAX_EDGES_PER_SOURCE);

        if selected.is_empty() {
            return Ok(None);
        }

        let reason = self.path_reason(source, &selected[0], by_id);
        let edges = selected
            .into_iter()
            .map(|candidate| {
                NavigationEdge::new(
                    source.id.clone(),
                    candidate.target,
                    candidate.score,
                    candidate.rationale.join("; "),
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(NavigationPath::new(source.id.clone(), edges, reason)?))
    }

    /// Scans for cross-gender items sharing at least two style tags and works
    /// them into the edge set: appended while capacity remains, otherwise
    /// replacing the lowest-scoring edge when strictly beaten.
    fn inject_style_variations(
        &self,
        source: &Item,
        catalog: &[&Item],
        selected: &mut Vec<Candidate>,
    ) {
        for candidate in catalog {
            if candidate.id == source.id
                || selected.iter().any(|existing| existing.target == candidate.id)
            {
                continue;
            }
            if candidate.gender == source.gender {
                continue;
            }

            let shared = source.shared_style_tags(candidate);
            if shared.len() < MIN_VARIATION_SHARED_TAGS {
                continue;
            }

            let variation_score = (0.1 + 0.1 * shared.len() as f64).min(1.0);
            let variation = Candidate {
                target: candidate.id.clone(),
                score: variation_score,
                rationale: vec![
                    format!("Shared style tags: {}", shared.join(", ")),
                    STYLE_VARIATION_RATIONALE.to_owned(),
                ],
                variation: true,
            };

            if selected.len() < MAX_EDGES_PER_SOURCE {
                selected.push(variation);
            } else if let Some(lowest) = lowest_score_index(selected) {
                if variation_score > selected[lowest].score {
                    selected[lowest] = variation;
                }
            }
        }
    }

    /// One overall rationale describing the strongest edge, recomputed from
    /// the contributing rules so the path reason stays in sync with scoring.
    fn path_reason(
        &self,
        source: &Item,
        top: &Candidate,
        by_id: &HashMap<&ItemId, &Item>,
    ) -> String {
        let mut reasons = by_id
            .get(&top.target)
            .map(|target| self.scorer.score(source, target).1)
            .unwrap_or_default();
        if top.variation {
            reasons.push(STYLE_VARIATION_RATIONALE.to_owned());
        }

        if reasons.is_empty() {
            "Path generated based on shared styles, garment types, and accessory complementarity."
                .to_owned()
        } else {
            format!(
                "Primary link: {} to {} - Reasons: {}. Other suggestions follow similar logic.",
                source.id,
                top.target,
                reasons.join("; ")
            )
        }
    }
}

/// Descending by score, ascending by target id on ties.
fn sort_candidates(candidates: &mut [Candidate]) {
    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.target.cmp(&b.target))
    });
}

fn lowest_score_index(candidates: &[Candidate]) -> Option<usize> {
    candidates
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.score.partial_cmp(&b.score).unwrap_or(Ordering::Equal))
        .map(|(index, _)| index)
}

/// Convenience entry point over [`GraphBuilder`].
pub fn build_navigation_graph(
    items: &[Item],
    config: &GraphConfig,
    rng: &mut impl Rng,
) -> Result<Vec<NavigationPath>, DomainError> {
    GraphBuilder::new(config).build(items, rng)
}
