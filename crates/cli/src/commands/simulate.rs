use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::json;
use tracing::warn;

use crate::commands::CommandResult;
use stylegraph_core::config::{AppConfig, LoadOptions};
use stylegraph_core::simulate::SessionSimulator;
use stylegraph_db::connect_with_settings;
use stylegraph_db::repositories::{
    InteractionRepository, ItemMetadataRepository, NavigationPathRepository,
    SqlInteractionRepository, SqlItemMetadataRepository, SqlNavigationPathRepository,
};

pub fn run(seed: Option<u64>) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "simulate",
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
                "simulate",
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

        let catalog = SqlItemMetadataRepository::new(pool.clone())
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

        let graph = SqlNavigationPathRepository::new(pool.clone())
            .list_targets()
            .await
            .map_err(|error| ("persistence", error.to_string(), 5u8))?;

        let mut rng = match seed.or(config.simulator.seed) {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let simulator = SessionSimulator::new(config.simulator.clone());
        let interactions = SqlInteractionRepository::new(pool.clone());
        let started_at = Utc::now();

        // One transactional session per user; a failed commit rolls back that
        // user's events and the run moves on.
        let mut sessions_written = 0usize;
        let mut events_written = 0usize;
        let mut failed_sessions = 0usize;
        for user_id in config.simulator.user_ids() {
            let events = simulator
                .simulate_session(&user_id, &catalog, &graph, started_at, &mut rng)
                .map_err(|error| ("simulation", error.to_string(), 6u8))?;

            match interactions.append_session(&events).await {
                Ok(()) => {
                    sessions_written += 1;
                    events_written += events.len();
                }
                Err(error) => {
                    failed_sessions += 1;
                    warn!(user_id, %error, "failed to persist session; rolled back");
                }
            }
        }

        pool.close().await;
        Ok::<(usize, usize, usize), (&'static str, String, u8)>((
            sessions_written,
            events_written,
            failed_sessions,
        ))
    });

    match result {
        Ok((sessions, events, failed)) => CommandResult::success_with_details(
            "simulate",
            format!("simulated {sessions} sessions ({events} interaction events)"),
            json!({
                "sessions_written": sessions,
                "events_written": events,
                "failed_sessions": failed,
            }),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("simulate", error_class, message, exit_code)
        }
    }
}
