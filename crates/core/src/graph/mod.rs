//! Navigation graph builder.
//!
//! Derives a bounded-out-degree similarity graph over the catalog from
//! heuristic scoring rules, with a stochastic style-variation detour to keep
//! neighborhoods from collapsing into a single gender/style cluster.

mod builder;
mod scoring;

pub use builder::{build_navigation_graph, GraphBuilder};
pub use scoring::SimilarityScorer;

pub use crate::domain::navigation::MAX_EDGES_PER_SOURCE;

/// Candidates must score strictly above this to enter the primary edge set.
pub const CANDIDATE_SCORE_THRESHOLD: f64 = 0.1;

/// Below this many primary edges the style-variation scan always runs.
pub const MIN_PRIMARY_EDGES: usize = 3;

/// A style-variation candidate must share at least this many tags.
pub const MIN_VARIATION_SHARED_TAGS: usize = 2;

/// Tag appended to the rationale of edges injected by the variation scan.
pub const STYLE_VARIATION_RATIONALE: &str = "Style variation (different gender, similar tags)";
