//! Personalized re-ranking of navigation-graph neighbors.
//!
//! The engine takes a user's aggregated click history and boosts the base
//! edge scores of the source item's neighbors, producing up to three
//! recommendations with human-readable reasons. Deterministic for a fixed
//! (graph, history, metadata) snapshot.

mod engine;
mod history;

pub use engine::{RecommendationEngine, RecommendationRequest};
pub use history::HistoryProfile;

pub use crate::domain::recommendation::MAX_RECOMMENDATIONS;

/// Base reason attached to every graph neighbor before history boosts.
pub const GENERIC_REASON: &str = "This item complements your current selection.";

/// Boost per liked item sharing a style tag with the candidate.
pub const STYLE_TAG_BOOST: f64 = 0.1;

/// Boost per liked item sharing a dominant color with the candidate.
pub const COLOR_BOOST: f64 = 0.05;

/// Flat boost when the candidate's garment type was liked before and differs
/// from the source item's (variety over pure repetition).
pub const GARMENT_VARIETY_BOOST: f64 = 0.2;
