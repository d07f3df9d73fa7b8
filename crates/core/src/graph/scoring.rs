use std::collections::BTreeSet;

use crate::config::GraphConfig;
use crate::domain::item::Item;

/// Pairwise similarity scoring over the configured garment vocabularies.
///
/// Every rule is symmetric, so `score(a, b) == score(b, a)` holds by
/// construction and both directions produce identical rationale text.
#[derive(Clone, Debug)]
pub struct SimilarityScorer {
    primary_garment_types: BTreeSet<String>,
    accessory_garment_types: BTreeSet<String>,
}

impl SimilarityScorer {
    pub fn new(config: &GraphConfig) -> Self {
        Self {
            primary_garment_types: config.primary_garment_types.iter().cloned().collect(),
            accessory_garment_types: config.accessory_garment_types.iter().cloned().collect(),
        }
    }

    /// Scores a pair of items, clipped to [0, 1], together with one rationale
    /// string per contributing rule.
    pub fn score(&self, a: &Item, b: &Item) -> (f64, Vec<String>) {
        let mut score = 0.0;
        let mut rationale = Vec::new();

        let shared = a.shared_style_tags(b);
        if !shared.is_empty() {
            score += 0.1 * shared.len() as f64;
            rationale.push(format!("Shared style tags: {}", shared.join(", ")));
        }

        if a.garment_type == b.garment_type {
            score += 0.2;
            rationale.push(format!("Same garment type: {}", a.garment_type));
        } else {
            let mut echoed = BTreeSet::new();
            if a.style_tags.contains(&b.garment_type) {
                echoed.insert(b.garment_type.as_str());
            }
            if b.style_tags.contains(&a.garment_type) {
                echoed.insert(a.garment_type.as_str());
            }
            if !echoed.is_empty() {
                score += 0.1;
                rationale.push(format!(
                    "Garment type echoed in style tags: {}",
                    echoed.into_iter().collect::<Vec<_>>().join(", ")
                ));
            }
        }

        if let Some((primary, accessory)) = self.complement_pair(a, b) {
            score += 0.25;
            rationale.push(format!("Accessory complement: {primary} pairs with {accessory}"));
        }

        (score.min(1.0), rationale)
    }

    /// Returns the (primary, accessory) garment types when exactly one side
    /// of the pair is a primary garment and the other an accessory,
    /// regardless of argument order.
    fn complement_pair<'a>(&self, a: &'a Item, b: &'a Item) -> Option<(&'a str, &'a str)> {
        if self.primary_garment_types.contains(&a.garment_type)
            && self.accessory_garment_types.contains(&b.garment_type)
        {
            return Some((a.garment_type.as_str(), b.garment_type.as_str()));
        }
        if self.primary_garment_types.contains(&b.garment_type)
            && self.accessory_garment_types.contains(&a.garment_type)
        {
            return Some((b.garment_type.as_str(), a.garment_type.as_str()));
        }
        None
    }
}
