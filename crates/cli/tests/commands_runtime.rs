use std::env;
use std::path::Path;
use std::sync::{Mutex, OnceLock};

use serde_json::Value;
use tempfile::TempDir;

use stylegraph_cli::commands::{build_graph, migrate, recommend, seed, simulate};

#[test]
fn migrate_returns_success_against_fresh_database() {
    let dir = temp_db();
    with_env(&[("STYLEGRAPH_DATABASE_URL", &db_url(dir.path()))], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 0, "expected successful migrate run: {}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "ok");
    });
}

#[test]
fn migrate_returns_config_failure_for_non_sqlite_url() {
    with_env(&[("STYLEGRAPH_DATABASE_URL", "postgres://localhost/fashion")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn seed_is_idempotent_across_runs() {
    let dir = temp_db();
    with_env(&[("STYLEGRAPH_DATABASE_URL", &db_url(dir.path()))], || {
        let first = seed::run();
        assert_eq!(first.exit_code, 0, "expected first seed success: {}", first.output);
        let first_payload = parse_payload(&first.output);
        assert_eq!(first_payload["status"], "ok");

        let second = seed::run();
        assert_eq!(second.exit_code, 0, "expected second seed success: {}", second.output);
        let second_payload = parse_payload(&second.output);
        assert_eq!(second_payload["status"], "ok");

        assert_eq!(first_payload["message"], second_payload["message"]);
    });
}

#[test]
fn build_graph_requires_a_seeded_catalog() {
    let dir = temp_db();
    with_env(&[("STYLEGRAPH_DATABASE_URL", &db_url(dir.path()))], || {
        let migrated = migrate::run();
        assert_eq!(migrated.exit_code, 0, "migrate failed: {}", migrated.output);

        let result = build_graph::run(Some(7));
        assert_eq!(result.exit_code, 6, "expected empty-catalog failure: {}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "empty_catalog");
    });
}

#[test]
fn full_pipeline_runs_end_to_end() {
    let dir = temp_db();
    with_env(
        &[
            ("STYLEGRAPH_DATABASE_URL", &db_url(dir.path())),
            ("STYLEGRAPH_SIMULATOR_USER_COUNT", "5"),
            ("STYLEGRAPH_ENGINE_TARGET_USERS", "user001,user002"),
        ],
        || {
            let seeded = seed::run();
            assert_eq!(seeded.exit_code, 0, "seed failed: {}", seeded.output);

            let built = build_graph::run(Some(7));
            assert_eq!(built.exit_code, 0, "build-graph failed: {}", built.output);
            let built_payload = parse_payload(&built.output);
            assert_eq!(built_payload["status"], "ok");
            assert!(
                built_payload["details"]["paths_written"].as_u64().unwrap_or(0) > 0,
                "expected at least one navigation path: {}",
                built.output
            );

            let simulated = simulate::run(Some(11));
            assert_eq!(simulated.exit_code, 0, "simulate failed: {}", simulated.output);
            let simulated_payload = parse_payload(&simulated.output);
            assert_eq!(simulated_payload["details"]["sessions_written"], 5);
            assert_eq!(simulated_payload["details"]["failed_sessions"], 0);

            let recommended = recommend::run(None, None, Some(3));
            assert_eq!(recommended.exit_code, 0, "recommend failed: {}", recommended.output);
            let recommended_payload = parse_payload(&recommended.output);
            assert_eq!(recommended_payload["status"], "ok");

            let results = recommended_payload["details"]["results"]
                .as_array()
                .expect("results array")
                .clone();
            assert_eq!(results.len(), 2);
            for result in &results {
                let recommendations =
                    result["recommendations"].as_array().expect("recommendations array");
                assert!(recommendations.len() <= 3);
                for recommendation in recommendations {
                    assert!(recommendation["item_id"].is_string());
                    assert!(!recommendation["reason"]
                        .as_str()
                        .unwrap_or_default()
                        .is_empty());
                }
            }
        },
    );
}

#[test]
fn repeated_runs_with_same_seeds_produce_identical_graphs() {
    let dir = temp_db();
    with_env(&[("STYLEGRAPH_DATABASE_URL", &db_url(dir.path()))], || {
        let seeded = seed::run();
        assert_eq!(seeded.exit_code, 0, "seed failed: {}", seeded.output);

        let first = build_graph::run(Some(42));
        let second = build_graph::run(Some(42));
        assert_eq!(first.exit_code, 0);
        assert_eq!(second.exit_code, 0);

        let first_payload = parse_payload(&first.output);
        let second_payload = parse_payload(&second.output);
        assert_eq!(first_payload["details"], second_payload["details"]);
    });
}

#[test]
fn recommend_with_explicit_user_and_source_targets_that_pair() {
    let dir = temp_db();
    with_env(&[("STYLEGRAPH_DATABASE_URL", &db_url(dir.path()))], || {
        let seeded = seed::run();
        assert_eq!(seeded.exit_code, 0, "seed failed: {}", seeded.output);
        let built = build_graph::run(Some(7));
        assert_eq!(built.exit_code, 0, "build-graph failed: {}", built.output);

        let result = recommend::run(Some("user001"), Some("img_001"), Some(1));
        assert_eq!(result.exit_code, 0, "recommend failed: {}", result.output);

        let payload = parse_payload(&result.output);
        let results = payload["details"]["results"].as_array().expect("results array");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0]["user_id"], "user001");
        assert_eq!(results[0]["source_item_id"], "img_001");
    });
}

fn temp_db() -> TempDir {
    TempDir::new().expect("temp dir")
}

fn db_url(dir: &Path) -> String {
    format!("sqlite://{}/stylegraph.db?mode=rwc", dir.display())
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "STYLEGRAPH_DATABASE_URL",
        "STYLEGRAPH_DATABASE_MAX_CONNECTIONS",
        "STYLEGRAPH_DATABASE_TIMEOUT_SECS",
        "STYLEGRAPH_GRAPH_VARIATION_PROBABILITY",
        "STYLEGRAPH_GRAPH_SEED",
        "STYLEGRAPH_ENGINE_TARGET_USERS",
        "STYLEGRAPH_ENGINE_SEED",
        "STYLEGRAPH_SIMULATOR_USER_COUNT",
        "STYLEGRAPH_SIMULATOR_SEED",
        "STYLEGRAPH_LOGGING_LEVEL",
        "STYLEGRAPH_LOGGING_FORMAT",
        "STYLEGRAPH_LOG_LEVEL",
        "STYLEGRAPH_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
