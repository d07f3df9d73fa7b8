use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap, HashSet};

use super::history::HistoryProfile;
use super::{
    COLOR_BOOST, GARMENT_VARIETY_BOOST, GENERIC_REASON, MAX_RECOMMENDATIONS, STYLE_TAG_BOOST,
};
use crate::domain::item::{Item, ItemId};
use crate::domain::navigation::NavigationEdge;
use crate::domain::recommendation::RecommendedItem;
use crate::errors::DomainError;

/// One (user, source item) evaluation over a fixed snapshot.
///
/// `source` is `None` when the source item's metadata could not be resolved;
/// the engine reports that as [`DomainError::MissingSourceMetadata`] and the
/// caller skips the pair without failing the batch.
#[derive(Debug)]
pub struct RecommendationRequest<'a> {
    pub user_id: &'a str,
    pub source_item_id: &'a ItemId,
    pub source: Option<&'a Item>,
    /// The source item's navigation edges (base candidates).
    pub edges: &'a [NavigationEdge],
    /// Time-ordered clicked item ids; repeats count toward boosts.
    pub clicked_history: &'a [ItemId],
    /// Resolved metadata for the clicked history (unresolved entries absent).
    pub liked_items: &'a [Item],
    /// Resolved metadata for candidate targets (unresolved entries absent;
    /// such candidates keep their base score but receive no boost).
    pub candidates: &'a HashMap<ItemId, Item>,
}

#[derive(Clone, Debug)]
struct ScoredCandidate {
    item_id: ItemId,
    score: f64,
    reasons: Vec<String>,
}

/// Re-ranks a source item's graph neighbors with history boosts.
#[derive(Clone, Debug)]
pub struct RecommendationEngine {
    max_results: usize,
}

impl Default for RecommendationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RecommendationEngine {
    pub fn new() -> Self {
        Self { max_results: MAX_RECOMMENDATIONS }
    }

    /// Produces up to three (item, reason) pairs for the request, or an empty
    /// list when no candidate survives filtering. Identical inputs always
    /// yield identical ranked output and reason text.
    pub fn recommend(
        &self,
        request: &RecommendationRequest<'_>,
    ) -> Result<Vec<RecommendedItem>, DomainError> {
        let source = request.source.ok_or_else(|| DomainError::MissingSourceMetadata {
            item_id: request.source_item_id.0.clone(),
        })?;

        let seen: HashSet<&ItemId> = request.clicked_history.iter().collect();
        let mut candidates: Vec<ScoredCandidate> = request
            .edges
            .iter()
            .filter(|edge| edge.target != source.id && !seen.contains(&edge.target))
            .map(|edge| ScoredCandidate {
                item_id: edge.target.clone(),
                score: edge.score,
                reasons: vec![GENERIC_REASON.to_owned()],
            })
            .collect();

        let profile = HistoryProfile::from_items(request.liked_items);
        if !profile.is_empty() {
            for candidate in &mut candidates {
                if let Some(meta) = request.candidates.get(&candidate.item_id) {
                    boost_candidate(candidate, meta, source, &profile);
                }
            }
        }

        candidates.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.item_id.cmp(&b.item_id))
        });

        Ok(candidates
            .into_iter()
            .take(self.max_results)
            .map(|candidate| RecommendedItem {
                item_id: candidate.item_id,
                reason: candidate.reasons.join(". "),
            })
            .collect())
    }
}

fn boost_candidate(
    candidate: &mut ScoredCandidate,
    meta: &Item,
    source: &Item,
    profile: &HistoryProfile,
) {
    let mut boost_reasons = Vec::new();

    for tag in &meta.style_tags {
        let count = profile.style_tag_count(tag);
        if count > 0 {
            candidate.score += STYLE_TAG_BOOST * f64::from(count);
            boost_reasons.push(format!("You previously liked items with similar '{tag}' style."));
        }
    }

    for color in &meta.dominant_colors {
        let count = profile.color_count(color);
        if count > 0 {
            candidate.score += COLOR_BOOST * f64::from(count);
            boost_reasons
                .push(format!("You previously liked items with similar '{color}' color."));
        }
    }

    if profile.liked_garment_type(&meta.garment_type) && meta.garment_type != source.garment_type {
        candidate.score += GARMENT_VARIETY_BOOST;
        boost_reasons.push(format!("You previously liked '{}' type items.", meta.garment_type));
    }

    if boost_reasons.is_empty() {
        return;
    }

    // Specific boost reasons fully replace the generic placeholder; anything
    // else gets appended. Dedup and sort for deterministic reason text.
    if candidate.reasons == [GENERIC_REASON] {
        candidate.reasons = boost_reasons;
    } else {
        candidate.reasons.extend(boost_reasons);
    }
    let unique: BTreeSet<String> = candidate.reasons.drain(..).collect();
    candidate.reasons = unique.into_iter().collect();
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::{RecommendationEngine, RecommendationRequest, GENERIC_REASON};
    use crate::domain::item::{Item, ItemId};
    use crate::domain::navigation::NavigationEdge;
    use crate::errors::DomainError;

    fn item(id: &str, tags: &[&str], colors: &[&str], garment: &str) -> Item {
        Item::new(
            id,
            tags.iter().map(|t| (*t).to_owned()),
            colors.iter().map(|c| (*c).to_owned()),
            garment,
            "female",
        )
        .expect("item")
    }

    fn edge(source: &str, target: &str, score: f64) -> NavigationEdge {
        NavigationEdge::new(ItemId::from(source), ItemId::from(target), score, "shared tags")
            .expect("edge")
    }

    fn candidate_map(items: &[Item]) -> HashMap<ItemId, Item> {
        items.iter().map(|item| (item.id.clone(), item.clone())).collect()
    }

    #[test]
    fn missing_source_metadata_is_reported() {
        let engine = RecommendationEngine::new();
        let source_id = ItemId::from("img_404");
        let request = RecommendationRequest {
            user_id: "user001",
            source_item_id: &source_id,
            source: None,
            edges: &[],
            clicked_history: &[],
            liked_items: &[],
            candidates: &HashMap::new(),
        };

        let result = engine.recommend(&request);
        assert_eq!(
            result,
            Err(DomainError::MissingSourceMetadata { item_id: "img_404".to_owned() })
        );
    }

    #[test]
    fn output_excludes_source_and_history() {
        let engine = RecommendationEngine::new();
        let source = item("img_001", &["casual"], &[], "dress");
        // A self-loop cannot be built through the constructor; model a corrupt
        // stored row directly to prove the engine filters it out anyway.
        let self_edge = NavigationEdge {
            source: ItemId::from("img_001"),
            target: ItemId::from("img_001"),
            score: 0.9,
            rationale: String::new(),
        };
        let edges = vec![
            self_edge,
            edge("img_001", "img_002", 0.5),
            edge("img_001", "img_003", 0.4),
        ];
        let history = vec![ItemId::from("img_002")];
        let source_id = source.id.clone();
        let request = RecommendationRequest {
            user_id: "user001",
            source_item_id: &source_id,
            source: Some(&source),
            edges: &edges,
            clicked_history: &history,
            liked_items: &[],
            candidates: &HashMap::new(),
        };

        let items = engine.recommend(&request).expect("recommendations");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].item_id, ItemId::from("img_003"));
        assert_eq!(items[0].reason, GENERIC_REASON);
    }

    #[test]
    fn three_casual_likes_boost_a_casual_candidate_by_0_3() {
        let engine = RecommendationEngine::new();
        let source = item("img_001", &["formal"], &[], "dress");
        let candidate = item("img_010", &["casual"], &[], "dress");
        let liked = vec![
            item("img_101", &["casual"], &[], "dress"),
            item("img_102", &["casual"], &[], "dress"),
            item("img_103", &["casual"], &[], "dress"),
        ];
        let history: Vec<ItemId> = liked.iter().map(|item| item.id.clone()).collect();
        let edges = vec![edge("img_001", "img_010", 0.4)];
        let candidates = candidate_map(&[candidate]);
        let source_id = source.id.clone();
        let request = RecommendationRequest {
            user_id: "user001",
            source_item_id: &source_id,
            source: Some(&source),
            edges: &edges,
            clicked_history: &history,
            liked_items: &liked,
            candidates: &candidates,
        };

        let items = engine.recommend(&request).expect("recommendations");
        assert_eq!(items.len(), 1);
        assert!(items[0].reason.contains("'casual' style"));
        // Base 0.4 + 0.1 x 3 = 0.7; garment variety boost does not fire
        // because source and candidate are both dresses. Verified through
        // ranking below.
    }

    #[test]
    fn boosted_candidate_outranks_higher_base_edge() {
        let engine = RecommendationEngine::new();
        let source = item("img_001", &["formal"], &[], "dress");
        let boosted = item("img_010", &["casual"], &[], "hat");
        let plain = item("img_011", &["formal"], &[], "dress");
        let liked = vec![
            item("img_101", &["casual"], &[], "hat"),
            item("img_102", &["casual"], &[], "hat"),
            item("img_103", &["casual"], &[], "hat"),
        ];
        let history: Vec<ItemId> = liked.iter().map(|item| item.id.clone()).collect();
        // plain starts higher (0.6 vs 0.3) but boosted gains
        // 0.1 x 3 (casual) + 0.2 (hat variety) = 0.5.
        let edges = vec![edge("img_001", "img_010", 0.3), edge("img_001", "img_011", 0.6)];
        let candidates = candidate_map(&[boosted, plain]);
        let source_id = source.id.clone();
        let request = RecommendationRequest {
            user_id: "user001",
            source_item_id: &source_id,
            source: Some(&source),
            edges: &edges,
            clicked_history: &history,
            liked_items: &liked,
            candidates: &candidates,
        };

        let items = engine.recommend(&request).expect("recommendations");
        assert_eq!(items[0].item_id, ItemId::from("img_010"));
        assert!(items[0].reason.contains("'hat' type items"));
        assert!(!items[0].reason.contains(GENERIC_REASON));
    }

    #[test]
    fn output_is_deterministic_and_capped_at_three() {
        let engine = RecommendationEngine::new();
        let source = item("img_001", &["casual"], &["(1,2,3)"], "dress");
        let liked = vec![item("img_101", &["casual"], &["(1,2,3)"], "skirt")];
        let history: Vec<ItemId> = liked.iter().map(|item| item.id.clone()).collect();
        let pool: Vec<Item> = (2..=6)
            .map(|index| item(&format!("img_00{index}"), &["casual"], &["(1,2,3)"], "skirt"))
            .collect();
        let edges: Vec<NavigationEdge> =
            pool.iter().map(|target| edge("img_001", target.id.as_str(), 0.4)).collect();
        let candidates = candidate_map(&pool);
        let source_id = source.id.clone();
        let request = RecommendationRequest {
            user_id: "user001",
            source_item_id: &source_id,
            source: Some(&source),
            edges: &edges,
            clicked_history: &history,
            liked_items: &liked,
            candidates: &candidates,
        };

        let first = engine.recommend(&request).expect("first run");
        let second = engine.recommend(&request).expect("second run");
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
        // Equal scores resolve by ascending item id.
        assert_eq!(first[0].item_id, ItemId::from("img_002"));
        assert_eq!(first[1].item_id, ItemId::from("img_003"));
    }
}
