pub mod config;
pub mod domain;
pub mod errors;
pub mod graph;
pub mod recommend;
pub mod simulate;

pub use domain::interaction::InteractionEvent;
pub use domain::item::{Item, ItemId};
pub use domain::navigation::{NavigationEdge, NavigationPath};
pub use domain::recommendation::{RecommendationResult, RecommendedItem};
pub use errors::{ApplicationError, DomainError};
pub use graph::{build_navigation_graph, GraphBuilder, SimilarityScorer};
pub use recommend::{HistoryProfile, RecommendationEngine, RecommendationRequest};
pub use simulate::SessionSimulator;
