use std::collections::HashMap;

use tokio::sync::RwLock;

use stylegraph_core::domain::item::{Item, ItemId};

use crate::repositories::{ItemMetadataRepository, RepositoryError};

/// Read-through cache over item metadata for one engine or simulator run.
///
/// Each key is populated at most once; a miss in the backing store is cached
/// as `None` so repeated lookups of an unknown id stay cheap. Catalog
/// snapshots are immutable for the duration of a run, so there is no
/// eviction or refresh.
#[derive(Default)]
pub struct MetadataCache {
    entries: RwLock<HashMap<ItemId, Option<Item>>>,
}

impl MetadataCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached metadata for `id`, fetching from `repo` on the
    /// first lookup.
    pub async fn get_or_fetch(
        &self,
        repo: &dyn ItemMetadataRepository,
        id: &ItemId,
    ) -> Result<Option<Item>, RepositoryError> {
        {
            let entries = self.entries.read().await;
            if let Some(cached) = entries.get(id) {
                return Ok(cached.clone());
            }
        }

        let fetched = repo.find_by_id(id).await?;
        let mut entries = self.entries.write().await;
        // A concurrent fetch may have landed first; keep the existing entry.
        Ok(entries.entry(id.clone()).or_insert(fetched).clone())
    }

    /// Batch-loads the ids not yet cached. Ids absent from the store are
    /// cached as misses.
    pub async fn prime(
        &self,
        repo: &dyn ItemMetadataRepository,
        ids: &[ItemId],
    ) -> Result<(), RepositoryError> {
        let missing: Vec<ItemId> = {
            let entries = self.entries.read().await;
            ids.iter().filter(|id| !entries.contains_key(*id)).cloned().collect()
        };
        if missing.is_empty() {
            return Ok(());
        }

        let fetched = repo.find_batch(&missing).await?;
        let mut entries = self.entries.write().await;
        for item in fetched {
            entries.insert(item.id.clone(), Some(item));
        }
        for id in missing {
            entries.entry(id).or_insert(None);
        }
        Ok(())
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use stylegraph_core::domain::item::{Item, ItemId};

    use super::MetadataCache;
    use crate::repositories::{
        InMemoryItemMetadataRepository, ItemMetadataRepository, RepositoryError,
    };

    /// Counts store hits so tests can assert populate-once behavior.
    #[derive(Default)]
    struct CountingRepository {
        inner: InMemoryItemMetadataRepository,
        fetches: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl ItemMetadataRepository for CountingRepository {
        async fn find_by_id(&self, id: &ItemId) -> Result<Option<Item>, RepositoryError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.inner.find_by_id(id).await
        }

        async fn find_batch(&self, ids: &[ItemId]) -> Result<Vec<Item>, RepositoryError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.inner.find_batch(ids).await
        }

        async fn list_ids(&self) -> Result<Vec<ItemId>, RepositoryError> {
            self.inner.list_ids().await
        }

        async fn list_all(&self) -> Result<Vec<Item>, RepositoryError> {
            self.inner.list_all().await
        }

        async fn save(&self, item: &Item) -> Result<(), RepositoryError> {
            self.inner.save(item).await
        }
    }

    fn item(id: &str) -> Item {
        Item::new(id, vec!["casual".to_owned()], Vec::new(), "dress", "female").expect("item")
    }

    #[tokio::test]
    async fn second_lookup_is_served_from_cache() {
        let repo = CountingRepository::default();
        repo.save(&item("img_001")).await.expect("save");
        let cache = MetadataCache::new();

        let first = cache.get_or_fetch(&repo, &ItemId::from("img_001")).await.expect("fetch");
        let second = cache.get_or_fetch(&repo, &ItemId::from("img_001")).await.expect("fetch");

        assert_eq!(first, Some(item("img_001")));
        assert_eq!(second, Some(item("img_001")));
        assert_eq!(repo.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn absence_is_cached() {
        let repo = CountingRepository::default();
        let cache = MetadataCache::new();

        for _ in 0..3 {
            let found =
                cache.get_or_fetch(&repo, &ItemId::from("img_404")).await.expect("fetch");
            assert_eq!(found, None);
        }
        assert_eq!(repo.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn prime_batches_only_uncached_ids() {
        let repo = CountingRepository::default();
        repo.save(&item("img_001")).await.expect("save");
        repo.save(&item("img_002")).await.expect("save");
        let cache = MetadataCache::new();

        cache.get_or_fetch(&repo, &ItemId::from("img_001")).await.expect("fetch");
        cache
            .prime(&repo, &[ItemId::from("img_001"), ItemId::from("img_002"), ItemId::from("img_404")])
            .await
            .expect("prime");

        // One single fetch plus one batch for the two uncached ids.
        assert_eq!(repo.fetches.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len().await, 3);

        let cached = cache.get_or_fetch(&repo, &ItemId::from("img_002")).await.expect("fetch");
        assert_eq!(cached, Some(item("img_002")));
        let missing = cache.get_or_fetch(&repo, &ItemId::from("img_404")).await.expect("fetch");
        assert_eq!(missing, None);
        assert_eq!(repo.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn prime_with_fully_cached_ids_skips_the_store() {
        let repo = CountingRepository::default();
        repo.save(&item("img_001")).await.expect("save");
        let cache = MetadataCache::new();

        cache.prime(&repo, &[ItemId::from("img_001")]).await.expect("prime");
        cache.prime(&repo, &[ItemId::from("img_001")]).await.expect("prime");

        assert_eq!(repo.fetches.load(Ordering::SeqCst), 1);
    }
}
