use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use stylegraph_core::config::{AppConfig, LoadOptions};
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    let mut push = |key: &str, value: String, env_key: Option<&str>| {
        lines.push(render_line(
            key,
            &value,
            field_source(key, env_key, config_file_doc.as_ref(), config_file_path.as_deref()),
        ));
    };

    push("database.url", config.database.url.clone(), Some("STYLEGRAPH_DATABASE_URL"));
    push(
        "database.max_connections",
        config.database.max_connections.to_string(),
        Some("STYLEGRAPH_DATABASE_MAX_CONNECTIONS"),
    );
    push(
        "database.timeout_secs",
        config.database.timeout_secs.to_string(),
        Some("STYLEGRAPH_DATABASE_TIMEOUT_SECS"),
    );

    push("graph.primary_garment_types", config.graph.primary_garment_types.join(", "), None);
    push("graph.accessory_garment_types", config.graph.accessory_garment_types.join(", "), None);
    push(
        "graph.variation_probability",
        config.graph.variation_probability.to_string(),
        Some("STYLEGRAPH_GRAPH_VARIATION_PROBABILITY"),
    );
    push("graph.seed", render_seed(config.graph.seed), Some("STYLEGRAPH_GRAPH_SEED"));

    push(
        "engine.target_users",
        config.engine.target_users.join(", "),
        Some("STYLEGRAPH_ENGINE_TARGET_USERS"),
    );
    push("engine.seed", render_seed(config.engine.seed), Some("STYLEGRAPH_ENGINE_SEED"));

    push(
        "simulator.user_count",
        config.simulator.user_count.to_string(),
        Some("STYLEGRAPH_SIMULATOR_USER_COUNT"),
    );
    push(
        "simulator.min_session_steps",
        config.simulator.min_session_steps.to_string(),
        None,
    );
    push(
        "simulator.max_session_steps",
        config.simulator.max_session_steps.to_string(),
        None,
    );
    push(
        "simulator.follow_path_probability",
        config.simulator.follow_path_probability.to_string(),
        None,
    );
    push(
        "simulator.follow_click_probability",
        config.simulator.follow_click_probability.to_string(),
        None,
    );
    push(
        "simulator.random_click_probability",
        config.simulator.random_click_probability.to_string(),
        None,
    );
    push("simulator.seed", render_seed(config.simulator.seed), Some("STYLEGRAPH_SIMULATOR_SEED"));

    push("logging.level", config.logging.level.clone(), Some("STYLEGRAPH_LOGGING_LEVEL"));
    push(
        "logging.format",
        format!("{:?}", config.logging.format),
        Some("STYLEGRAPH_LOGGING_FORMAT"),
    );

    lines.join("\n")
}

fn render_seed(seed: Option<u64>) -> String {
    seed.map(|seed| seed.to_string()).unwrap_or_else(|| "<entropy>".to_string())
}

fn detect_config_path() -> Option<PathBuf> {
    let root = PathBuf::from("stylegraph.toml");
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config/stylegraph.toml");
    if nested.exists() {
        return Some(nested);
    }

    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_key: Option<&str>,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_key {
        if env::var_os(env_key).is_some() {
            return format!("env ({env_key})");
        }
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
