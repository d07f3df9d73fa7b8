use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub graph: GraphConfig,
    pub engine: EngineConfig,
    pub simulator: SimulatorConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

/// Navigation graph builder settings. Vocabularies are injected here instead
/// of living as module-level globals so alternate catalogs can re-tune them.
#[derive(Clone, Debug)]
pub struct GraphConfig {
    pub primary_garment_types: Vec<String>,
    pub accessory_garment_types: Vec<String>,
    pub variation_probability: f64,
    pub seed: Option<u64>,
}

#[derive(Clone, Debug)]
pub struct EngineConfig {
    pub target_users: Vec<String>,
    pub seed: Option<u64>,
}

#[derive(Clone, Debug)]
pub struct SimulatorConfig {
    pub user_count: u32,
    pub min_session_steps: u32,
    pub max_session_steps: u32,
    pub follow_path_probability: f64,
    pub follow_click_probability: f64,
    pub random_click_probability: f64,
    pub seed: Option<u64>,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub graph_seed: Option<u64>,
    pub simulator_seed: Option<u64>,
    pub engine_seed: Option<u64>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://stylegraph.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            graph: GraphConfig::default(),
            engine: EngineConfig::default(),
            simulator: SimulatorConfig::default(),
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            primary_garment_types: ["t-shirt", "shorts", "dress", "skirt", "swimsuit"]
                .map(str::to_owned)
                .to_vec(),
            accessory_garment_types: ["sunglasses", "hat", "belt", "bag", "watch", "sandals"]
                .map(str::to_owned)
                .to_vec(),
            variation_probability: 0.2,
            seed: None,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            target_users: ["user001", "user005", "user010"].map(str::to_owned).to_vec(),
            seed: None,
        }
    }
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            user_count: 15,
            min_session_steps: 3,
            max_session_steps: 7,
            follow_path_probability: 0.85,
            follow_click_probability: 0.70,
            random_click_probability: 0.50,
            seed: None,
        }
    }
}

impl SimulatorConfig {
    /// Synthetic user ids `user001..userNNN` derived from `user_count`.
    pub fn user_ids(&self) -> Vec<String> {
        (1..=self.user_count).map(|index| format!("user{index:03}")).collect()
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    graph: Option<GraphPatch>,
    engine: Option<EnginePatch>,
    simulator: Option<SimulatorPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct GraphPatch {
    primary_garment_types: Option<Vec<String>>,
    accessory_garment_types: Option<Vec<String>>,
    variation_probability: Option<f64>,
    seed: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct EnginePatch {
    target_users: Option<Vec<String>>,
    seed: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct SimulatorPatch {
    user_count: Option<u32>,
    min_session_steps: Option<u32>,
    max_session_steps: Option<u32>,
    follow_path_probability: Option<f64>,
    follow_click_probability: Option<f64>,
    random_click_probability: Option<f64>,
    seed: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("stylegraph.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(graph) = patch.graph {
            if let Some(primary) = graph.primary_garment_types {
                self.graph.primary_garment_types = primary;
            }
            if let Some(accessory) = graph.accessory_garment_types {
                self.graph.accessory_garment_types = accessory;
            }
            if let Some(probability) = graph.variation_probability {
                self.graph.variation_probability = probability;
            }
            if let Some(seed) = graph.seed {
                self.graph.seed = Some(seed);
            }
        }

        if let Some(engine) = patch.engine {
            if let Some(target_users) = engine.target_users {
                self.engine.target_users = target_users;
            }
            if let Some(seed) = engine.seed {
                self.engine.seed = Some(seed);
            }
        }

        if let Some(simulator) = patch.simulator {
            if let Some(user_count) = simulator.user_count {
                self.simulator.user_count = user_count;
            }
            if let Some(min_session_steps) = simulator.min_session_steps {
                self.simulator.min_session_steps = min_session_steps;
            }
            if let Some(max_session_steps) = simulator.max_session_steps {
                self.simulator.max_session_steps = max_session_steps;
            }
            if let Some(probability) = simulator.follow_path_probability {
                self.simulator.follow_path_probability = probability;
            }
            if let Some(probability) = simulator.follow_click_probability {
                self.simulator.follow_click_probability = probability;
            }
            if let Some(probability) = simulator.random_click_probability {
                self.simulator.random_click_probability = probability;
            }
            if let Some(seed) = simulator.seed {
                self.simulator.seed = Some(seed);
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("STYLEGRAPH_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("STYLEGRAPH_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections =
                parse_u32("STYLEGRAPH_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("STYLEGRAPH_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("STYLEGRAPH_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("STYLEGRAPH_GRAPH_VARIATION_PROBABILITY") {
            self.graph.variation_probability =
                parse_f64("STYLEGRAPH_GRAPH_VARIATION_PROBABILITY", &value)?;
        }
        if let Some(value) = read_env("STYLEGRAPH_GRAPH_SEED") {
            self.graph.seed = Some(parse_u64("STYLEGRAPH_GRAPH_SEED", &value)?);
        }

        if let Some(value) = read_env("STYLEGRAPH_ENGINE_TARGET_USERS") {
            self.engine.target_users =
                value.split(',').map(str::trim).filter(|v| !v.is_empty()).map(str::to_owned).collect();
        }
        if let Some(value) = read_env("STYLEGRAPH_ENGINE_SEED") {
            self.engine.seed = Some(parse_u64("STYLEGRAPH_ENGINE_SEED", &value)?);
        }

        if let Some(value) = read_env("STYLEGRAPH_SIMULATOR_USER_COUNT") {
            self.simulator.user_count = parse_u32("STYLEGRAPH_SIMULATOR_USER_COUNT", &value)?;
        }
        if let Some(value) = read_env("STYLEGRAPH_SIMULATOR_SEED") {
            self.simulator.seed = Some(parse_u64("STYLEGRAPH_SIMULATOR_SEED", &value)?);
        }

        let log_level =
            read_env("STYLEGRAPH_LOGGING_LEVEL").or_else(|| read_env("STYLEGRAPH_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("STYLEGRAPH_LOGGING_FORMAT").or_else(|| read_env("STYLEGRAPH_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(seed) = overrides.graph_seed {
            self.graph.seed = Some(seed);
        }
        if let Some(seed) = overrides.simulator_seed {
            self.simulator.seed = Some(seed);
        }
        if let Some(seed) = overrides.engine_seed {
            self.engine.seed = Some(seed);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_graph(&self.graph)?;
        validate_engine(&self.engine)?;
        validate_simulator(&self.simulator)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("stylegraph.toml"), PathBuf::from("config/stylegraph.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_graph(graph: &GraphConfig) -> Result<(), ConfigError> {
    if graph.primary_garment_types.is_empty() {
        return Err(ConfigError::Validation(
            "graph.primary_garment_types must not be empty".to_string(),
        ));
    }
    if graph.accessory_garment_types.is_empty() {
        return Err(ConfigError::Validation(
            "graph.accessory_garment_types must not be empty".to_string(),
        ));
    }
    validate_probability("graph.variation_probability", graph.variation_probability)?;
    Ok(())
}

fn validate_engine(engine: &EngineConfig) -> Result<(), ConfigError> {
    if engine.target_users.iter().any(|user| user.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "engine.target_users must not contain empty user ids".to_string(),
        ));
    }
    Ok(())
}

fn validate_simulator(simulator: &SimulatorConfig) -> Result<(), ConfigError> {
    if simulator.min_session_steps == 0 {
        return Err(ConfigError::Validation(
            "simulator.min_session_steps must be at least 1".to_string(),
        ));
    }
    if simulator.min_session_steps > simulator.max_session_steps {
        return Err(ConfigError::Validation(
            "simulator.min_session_steps must not exceed simulator.max_session_steps".to_string(),
        ));
    }
    validate_probability("simulator.follow_path_probability", simulator.follow_path_probability)?;
    validate_probability(
        "simulator.follow_click_probability",
        simulator.follow_click_probability,
    )?;
    validate_probability(
        "simulator.random_click_probability",
        simulator.random_click_probability,
    )?;
    Ok(())
}

fn validate_probability(key: &str, value: f64) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::Validation(format!("{key} must be within [0, 1], got {value}")));
    }
    Ok(())
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().map(|value| value.trim().to_owned()).filter(|value| !value.is_empty())
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::InvalidEnvOverride { key: key.to_owned(), value: value.to_owned() })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::InvalidEnvOverride { key: key.to_owned(), value: value.to_owned() })
}

fn parse_f64(key: &str, value: &str) -> Result<f64, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::InvalidEnvOverride { key: key.to_owned(), value: value.to_owned() })
}
