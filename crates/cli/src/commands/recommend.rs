use std::collections::HashMap;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::json;
use tracing::warn;

use crate::commands::CommandResult;
use stylegraph_core::config::{AppConfig, LoadOptions};
use stylegraph_core::domain::item::{Item, ItemId};
use stylegraph_core::domain::recommendation::RecommendationResult;
use stylegraph_core::errors::DomainError;
use stylegraph_core::recommend::{RecommendationEngine, RecommendationRequest};
use stylegraph_db::connect_with_settings;
use stylegraph_db::repositories::{
    InteractionRepository, ItemMetadataRepository, NavigationPathRepository,
    RecommendationRepository, SqlInteractionRepository, SqlItemMetadataRepository,
    SqlNavigationPathRepository, SqlRecommendationRepository,
};
use stylegraph_db::MetadataCache;

pub fn run(user: Option<&str>, source: Option<&str>, seed: Option<u64>) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "recommend",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "recommend",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let users: Vec<String> = match user {
        Some(user) => vec![user.to_owned()],
        None => config.engine.target_users.clone(),
    };
    let explicit_source = source.map(ItemId::from);

    let result = runtime.block_on(async {
        let pool = connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
        .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;

        let item_repo = SqlItemMetadataRepository::new(pool.clone());
        let nav_repo = SqlNavigationPathRepository::new(pool.clone());
        let interactions = SqlInteractionRepository::new(pool.clone());
        let rec_repo = SqlRecommendationRepository::new(pool.clone());

        let catalog = item_repo
            .list_ids()
            .await
            .map_err(|error| ("persistence", error.to_string(), 5u8))?;
        if catalog.is_empty() {
            pool.close().await;
            return Err((
                "empty_catalog",
                "catalog snapshot is empty; run `stylegraph seed` first".to_string(),
                6u8,
            ));
        }

        let mut rng = match seed.or(config.engine.seed) {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let cache = MetadataCache::new();
        let engine = RecommendationEngine::new();

        let mut outputs = Vec::with_capacity(users.len());
        let mut skipped = 0usize;
        let mut failed = 0usize;

        // Each (user, source) pair is one unit of work: persistence failures
        // and missing source metadata skip the pair without aborting the run.
        for user_id in &users {
            let history = match interactions.clicked_history(user_id).await {
                Ok(history) => history,
                Err(error) => {
                    failed += 1;
                    warn!(user_id, %error, "failed to load click history");
                    continue;
                }
            };

            let source_id = match resolve_source(
                &explicit_source,
                &interactions,
                user_id,
                &catalog,
                &mut rng,
            )
            .await
            {
                Ok(source_id) => source_id,
                Err(error) => {
                    failed += 1;
                    warn!(user_id, %error, "failed to resolve source item");
                    continue;
                }
            };

            let edges = match nav_repo.find_by_source(&source_id).await {
                Ok(path) => path.map(|path| path.edges).unwrap_or_default(),
                Err(error) => {
                    failed += 1;
                    warn!(user_id, source = %source_id, %error, "failed to load navigation path");
                    continue;
                }
            };

            let unit = build_and_persist(
                &engine,
                &cache,
                &item_repo,
                &rec_repo,
                user_id,
                &source_id,
                &edges,
                &history,
            )
            .await;
            match unit {
                Ok(result) => {
                    outputs.push(json!({
                        "user_id": result.user_id,
                        "source_item_id": result.source_item_id,
                        "recommendations": result.items,
                    }));
                }
                Err(UnitError::Skip) => skipped += 1,
                Err(UnitError::Failed) => failed += 1,
            }
        }

        pool.close().await;
        Ok::<(Vec<serde_json::Value>, usize, usize), (&'static str, String, u8)>((
            outputs, skipped, failed,
        ))
    });

    match result {
        Ok((outputs, skipped, failed)) => CommandResult::success_with_details(
            "recommend",
            format!(
                "generated recommendations for {} users ({skipped} skipped, {failed} failed)",
                outputs.len()
            ),
            json!({ "results": outputs, "skipped": skipped, "failed_units": failed }),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("recommend", error_class, message, exit_code)
        }
    }
}

enum UnitError {
    /// Source metadata missing; the pair is skipped by design.
    Skip,
    /// The unit failed and was rolled back; the run continues.
    Failed,
}

/// Explicit source wins, then the user's most recent click, then a random
/// catalog item for cold-start users.
async fn resolve_source(
    explicit: &Option<ItemId>,
    interactions: &SqlInteractionRepository,
    user_id: &str,
    catalog: &[ItemId],
    rng: &mut StdRng,
) -> Result<ItemId, stylegraph_db::repositories::RepositoryError> {
    if let Some(source) = explicit {
        return Ok(source.clone());
    }
    if let Some(last) = interactions.last_clicked(user_id).await? {
        return Ok(last);
    }
    Ok(catalog[rng.gen_range(0..catalog.len())].clone())
}

#[allow(clippy::too_many_arguments)]
async fn build_and_persist(
    engine: &RecommendationEngine,
    cache: &MetadataCache,
    item_repo: &SqlItemMetadataRepository,
    rec_repo: &SqlRecommendationRepository,
    user_id: &str,
    source_id: &ItemId,
    edges: &[stylegraph_core::domain::navigation::NavigationEdge],
    history: &[ItemId],
) -> Result<RecommendationResult, UnitError> {
    let targets: Vec<ItemId> = edges.iter().map(|edge| edge.target.clone()).collect();
    if let Err(error) = cache.prime(item_repo, history).await {
        warn!(user_id, %error, "failed to prime metadata cache");
        return Err(UnitError::Failed);
    }
    if let Err(error) = cache.prime(item_repo, &targets).await {
        warn!(user_id, %error, "failed to prime metadata cache");
        return Err(UnitError::Failed);
    }

    let source = match cache.get_or_fetch(item_repo, source_id).await {
        Ok(source) => source,
        Err(error) => {
            warn!(user_id, source = %source_id, %error, "failed to load source metadata");
            return Err(UnitError::Failed);
        }
    };

    // History duplicates repeat here so repeated clicks weigh more.
    let mut liked_items = Vec::with_capacity(history.len());
    for item_id in history {
        match cache.get_or_fetch(item_repo, item_id).await {
            Ok(Some(item)) => liked_items.push(item),
            Ok(None) => {}
            Err(error) => {
                warn!(user_id, item = %item_id, %error, "failed to load history metadata");
                return Err(UnitError::Failed);
            }
        }
    }

    let mut candidates: HashMap<ItemId, Item> = HashMap::new();
    for target in &targets {
        match cache.get_or_fetch(item_repo, target).await {
            Ok(Some(item)) => {
                candidates.insert(target.clone(), item);
            }
            Ok(None) => {}
            Err(error) => {
                warn!(user_id, item = %target, %error, "failed to load candidate metadata");
                return Err(UnitError::Failed);
            }
        }
    }

    let request = RecommendationRequest {
        user_id,
        source_item_id: source_id,
        source: source.as_ref(),
        edges,
        clicked_history: history,
        liked_items: &liked_items,
        candidates: &candidates,
    };
    let items = match engine.recommend(&request) {
        Ok(items) => items,
        Err(DomainError::MissingSourceMetadata { item_id }) => {
            warn!(user_id, item_id, "source metadata missing; skipping pair");
            return Err(UnitError::Skip);
        }
        Err(error) => {
            warn!(user_id, %error, "recommendation failed");
            return Err(UnitError::Failed);
        }
    };

    let result = match RecommendationResult::new(user_id, source_id.clone(), items, Utc::now()) {
        Ok(result) => result,
        Err(error) => {
            warn!(user_id, %error, "invalid recommendation result");
            return Err(UnitError::Failed);
        }
    };
    if let Err(error) = rec_repo.append(&result).await {
        warn!(user_id, %error, "failed to persist recommendations; rolled back");
        return Err(UnitError::Failed);
    }

    Ok(result)
}
