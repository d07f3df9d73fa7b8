use async_trait::async_trait;
use thiserror::Error;

use stylegraph_core::domain::interaction::InteractionEvent;
use stylegraph_core::domain::item::{Item, ItemId};
use stylegraph_core::domain::navigation::NavigationPath;
use stylegraph_core::domain::recommendation::RecommendationResult;
use stylegraph_core::simulate::GraphTargets;

pub mod interaction;
pub mod item_metadata;
pub mod memory;
pub mod navigation_path;
pub mod recommendation;

pub use interaction::SqlInteractionRepository;
pub use item_metadata::SqlItemMetadataRepository;
pub use memory::{
    InMemoryInteractionRepository, InMemoryItemMetadataRepository,
    InMemoryNavigationPathRepository, InMemoryRecommendationRepository,
};
pub use navigation_path::SqlNavigationPathRepository;
pub use recommendation::SqlRecommendationRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

/// Read access to the catalog snapshot. `save` exists for fixtures and
/// tests; catalog ingestion proper happens upstream.
#[async_trait]
pub trait ItemMetadataRepository: Send + Sync {
    async fn find_by_id(&self, id: &ItemId) -> Result<Option<Item>, RepositoryError>;
    async fn find_batch(&self, ids: &[ItemId]) -> Result<Vec<Item>, RepositoryError>;
    async fn list_ids(&self) -> Result<Vec<ItemId>, RepositoryError>;
    async fn list_all(&self) -> Result<Vec<Item>, RepositoryError>;
    async fn save(&self, item: &Item) -> Result<(), RepositoryError>;
}

/// Navigation graph persistence, upsert keyed by source item id.
#[async_trait]
pub trait NavigationPathRepository: Send + Sync {
    async fn upsert(&self, path: &NavigationPath) -> Result<(), RepositoryError>;
    async fn find_by_source(
        &self,
        source: &ItemId,
    ) -> Result<Option<NavigationPath>, RepositoryError>;
    /// Per-source edge targets for every path with at least one edge.
    async fn list_targets(&self) -> Result<GraphTargets, RepositoryError>;
}

/// Append-only interaction log plus its history queries.
#[async_trait]
pub trait InteractionRepository: Send + Sync {
    /// Commits one user's session as a single transactional unit. All events
    /// must belong to the same user; a failure rolls back the whole batch.
    async fn append_session(&self, events: &[InteractionEvent]) -> Result<(), RepositoryError>;
    /// Clicked item ids in timestamp order; repeat clicks repeat here.
    async fn clicked_history(&self, user_id: &str) -> Result<Vec<ItemId>, RepositoryError>;
    async fn last_clicked(&self, user_id: &str) -> Result<Option<ItemId>, RepositoryError>;
}

/// Append-only log of engine outputs.
#[async_trait]
pub trait RecommendationRepository: Send + Sync {
    async fn append(&self, result: &RecommendationResult) -> Result<(), RepositoryError>;
}

pub(crate) fn ensure_single_user(events: &[InteractionEvent]) -> Result<(), RepositoryError> {
    if let Some(first) = events.first() {
        if events.iter().any(|event| event.user_id != first.user_id) {
            return Err(RepositoryError::Decode(
                "session events must all belong to one user".to_owned(),
            ));
        }
    }
    Ok(())
}

pub(crate) fn decode_string_array(raw: &str, column: &str) -> Result<Vec<String>, RepositoryError> {
    serde_json::from_str(raw)
        .map_err(|error| RepositoryError::Decode(format!("column `{column}`: {error}")))
}

pub(crate) fn decode_score_array(raw: &str, column: &str) -> Result<Vec<f64>, RepositoryError> {
    serde_json::from_str(raw)
        .map_err(|error| RepositoryError::Decode(format!("column `{column}`: {error}")))
}

pub(crate) fn encode_json<T: serde::Serialize>(
    value: &T,
    column: &str,
) -> Result<String, RepositoryError> {
    serde_json::to_string(value)
        .map_err(|error| RepositoryError::Decode(format!("column `{column}`: {error}")))
}
