use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::json;
use tracing::warn;

use crate::commands::CommandResult;
use stylegraph_core::config::{AppConfig, LoadOptions};
use stylegraph_core::graph::build_navigation_graph;
use stylegraph_db::connect_with_settings;
use stylegraph_db::repositories::{
    ItemMetadataRepository, NavigationPathRepository, SqlItemMetadataRepository,
    SqlNavigationPathRepository,
};

pub fn run(seed: Option<u64>) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "build-graph",
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
                "build-graph",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let result = runtime.block_on(async {
        let pool = connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
        .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;

        let items = SqlItemMetadataRepository::new(pool.clone())
            .list_all()
            .await
            .map_err(|error| ("persistence", error.to_string(), 5u8))?;
        if items.is_empty() {
            pool.close().await;
            return Err((
                "empty_catalog",
                "catalog snapshot is empty; run `stylegraph seed` first".to_string(),
                6u8,
            ));
        }

        let mut rng = match seed.or(config.graph.seed) {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let paths = build_navigation_graph(&items, &config.graph, &mut rng)
            .map_err(|error| ("graph_build", error.to_string(), 6u8))?;

        // Each path is its own unit of work: a failed upsert is logged and
        // skipped while the rest of the graph still lands.
        let nav_repo = SqlNavigationPathRepository::new(pool.clone());
        let mut written = 0usize;
        let mut failed = 0usize;
        for path in &paths {
            match nav_repo.upsert(path).await {
                Ok(()) => written += 1,
                Err(error) => {
                    failed += 1;
                    warn!(source = %path.source, %error, "failed to persist navigation path");
                }
            }
        }

        pool.close().await;
        Ok::<(usize, usize, usize), (&'static str, String, u8)>((items.len(), written, failed))
    });

    match result {
        Ok((sources, written, failed)) => CommandResult::success_with_details(
            "build-graph",
            format!("built navigation graph for {sources} items ({written} paths written)"),
            json!({ "sources": sources, "paths_written": written, "failed_units": failed }),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("build-graph", error_class, message, exit_code)
        }
    }
}
