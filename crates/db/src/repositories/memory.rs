use std::collections::HashMap;

use tokio::sync::RwLock;

use stylegraph_core::domain::interaction::InteractionEvent;
use stylegraph_core::domain::item::{Item, ItemId};
use stylegraph_core::domain::navigation::NavigationPath;
use stylegraph_core::domain::recommendation::RecommendationResult;
use stylegraph_core::simulate::GraphTargets;

use super::{
    ensure_single_user, InteractionRepository, ItemMetadataRepository, NavigationPathRepository,
    RecommendationRepository, RepositoryError,
};

#[derive(Default)]
pub struct InMemoryItemMetadataRepository {
    items: RwLock<HashMap<ItemId, Item>>,
}

#[async_trait::async_trait]
impl ItemMetadataRepository for InMemoryItemMetadataRepository {
    async fn find_by_id(&self, id: &ItemId) -> Result<Option<Item>, RepositoryError> {
        let items = self.items.read().await;
        Ok(items.get(id).cloned())
    }

    async fn find_batch(&self, ids: &[ItemId]) -> Result<Vec<Item>, RepositoryError> {
        let items = self.items.read().await;
        Ok(ids.iter().filter_map(|id| items.get(id).cloned()).collect())
    }

    async fn list_ids(&self) -> Result<Vec<ItemId>, RepositoryError> {
        let items = self.items.read().await;
        let mut ids: Vec<ItemId> = items.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    async fn list_all(&self) -> Result<Vec<Item>, RepositoryError> {
        let items = self.items.read().await;
        let mut all: Vec<Item> = items.values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(all)
    }

    async fn save(&self, item: &Item) -> Result<(), RepositoryError> {
        let mut items = self.items.write().await;
        items.insert(item.id.clone(), item.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryNavigationPathRepository {
    paths: RwLock<HashMap<ItemId, NavigationPath>>,
}

#[async_trait::async_trait]
impl NavigationPathRepository for InMemoryNavigationPathRepository {
    async fn upsert(&self, path: &NavigationPath) -> Result<(), RepositoryError> {
        let mut paths = self.paths.write().await;
        paths.insert(path.source.clone(), path.clone());
        Ok(())
    }

    async fn find_by_source(
        &self,
        source: &ItemId,
    ) -> Result<Option<NavigationPath>, RepositoryError> {
        let paths = self.paths.read().await;
        Ok(paths.get(source).cloned())
    }

    async fn list_targets(&self) -> Result<GraphTargets, RepositoryError> {
        let paths = self.paths.read().await;
        Ok(paths
            .values()
            .filter(|path| !path.edges.is_empty())
            .map(|path| (path.source.clone(), path.targets()))
            .collect())
    }
}

#[derive(Default)]
pub struct InMemoryInteractionRepository {
    events: RwLock<Vec<InteractionEvent>>,
}

#[async_trait::async_trait]
impl InteractionRepository for InMemoryInteractionRepository {
    async fn append_session(&self, events: &[InteractionEvent]) -> Result<(), RepositoryError> {
        ensure_single_user(events)?;
        let mut log = self.events.write().await;
        log.extend_from_slice(events);
        Ok(())
    }

    async fn clicked_history(&self, user_id: &str) -> Result<Vec<ItemId>, RepositoryError> {
        let log = self.events.read().await;
        let mut clicked: Vec<&InteractionEvent> = log
            .iter()
            .filter(|event| event.user_id == user_id && event.clicked)
            .collect();
        clicked.sort_by_key(|event| event.timestamp);
        Ok(clicked.into_iter().map(|event| event.item_id.clone()).collect())
    }

    async fn last_clicked(&self, user_id: &str) -> Result<Option<ItemId>, RepositoryError> {
        Ok(self.clicked_history(user_id).await?.pop())
    }
}

#[derive(Default)]
pub struct InMemoryRecommendationRepository {
    results: RwLock<Vec<RecommendationResult>>,
}

impl InMemoryRecommendationRepository {
    pub async fn all(&self) -> Vec<RecommendationResult> {
        self.results.read().await.clone()
    }
}

#[async_trait::async_trait]
impl RecommendationRepository for InMemoryRecommendationRepository {
    async fn append(&self, result: &RecommendationResult) -> Result<(), RepositoryError> {
        let mut results = self.results.write().await;
        results.push(result.clone());
        Ok(())
    }
}
