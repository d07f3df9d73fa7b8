use serde::{Deserialize, Serialize};

use crate::domain::item::ItemId;
use crate::errors::DomainError;

/// Maximum out-degree of any source item in the navigation graph.
pub const MAX_EDGES_PER_SOURCE: usize = 5;

/// A scored directed link from a source item to a candidate neighbor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NavigationEdge {
    pub source: ItemId,
    pub target: ItemId,
    pub score: f64,
    pub rationale: String,
}

impl NavigationEdge {
    pub fn new(
        source: ItemId,
        target: ItemId,
        score: f64,
        rationale: impl Into<String>,
    ) -> Result<Self, DomainError> {
        if source == target {
            return Err(DomainError::InvariantViolation(format!(
                "navigation edge must not be a self-loop (source `{source}`)"
            )));
        }
        if !(0.0..=1.0).contains(&score) {
            return Err(DomainError::InvariantViolation(format!(
                "navigation edge score {score} for `{source}` -> `{target}` is outside [0, 1]"
            )));
        }
        Ok(Self { source, target, score, rationale: rationale.into() })
    }
}

/// A source item's ordered neighbor set plus one overall rationale describing
/// the strongest edge. Keyed uniquely by source id and re-derivable from the
/// catalog snapshot at any time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NavigationPath {
    pub source: ItemId,
    pub edges: Vec<NavigationEdge>,
    pub reason: String,
}

impl NavigationPath {
    pub fn new(
        source: ItemId,
        edges: Vec<NavigationEdge>,
        reason: impl Into<String>,
    ) -> Result<Self, DomainError> {
        if edges.is_empty() {
            return Err(DomainError::InvariantViolation(format!(
                "navigation path for `{source}` must carry at least one edge"
            )));
        }
        if edges.len() > MAX_EDGES_PER_SOURCE {
            return Err(DomainError::InvariantViolation(format!(
                "navigation path for `{source}` has {} edges (max {MAX_EDGES_PER_SOURCE})",
                edges.len()
            )));
        }
        if let Some(stray) = edges.iter().find(|edge| edge.source != source) {
            return Err(DomainError::InvariantViolation(format!(
                "navigation path for `{source}` contains an edge rooted at `{}`",
                stray.source
            )));
        }
        let ordered = edges.windows(2).all(|pair| {
            pair[0].score > pair[1].score
                || (pair[0].score == pair[1].score && pair[0].target < pair[1].target)
        });
        if !ordered {
            return Err(DomainError::InvariantViolation(format!(
                "navigation path edges for `{source}` must be sorted by descending score \
                 with ascending-id tie-break"
            )));
        }

        Ok(Self { source, edges, reason: reason.into() })
    }

    pub fn targets(&self) -> Vec<ItemId> {
        self.edges.iter().map(|edge| edge.target.clone()).collect()
    }

    pub fn scores(&self) -> Vec<f64> {
        self.edges.iter().map(|edge| edge.score).collect()
    }
}
