//! Server configuration.
//!
//! Settings are read from `config.yaml` in the directory named by
//! `TASK_API_CONFIG` (default `/config/`), then overridden by environment
//! variables such as `TASK_API_SERVER__PORT=9000`.

use std::{
    collections::HashMap,
    env,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use config::{Environment, File, FileFormat};
use serde::Deserialize;
use task_store::{ConnectorsConfig, DaoOptions};

/// Environment variable naming the configuration directory.
pub const CONFIG_DIR_ENV: &str = "TASK_API_CONFIG";
/// Directory searched when `TASK_API_CONFIG` is unset.
pub const DEFAULT_CONFIG_DIR: &str = "/config/";
/// Name of the configuration file.
pub const CONFIG_FILE: &str = "config.yaml";

const ENV_PREFIX: &str = "TASK_API";

/// Server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub logger: LoggerConfig,
    pub server: ServerConfig,
    pub connectors: ConnectorsConfig,
    pub controllers: ControllersConfig,
}

/// Log output settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Default filter, overridden by `RUST_LOG`.
    pub level: String,
    /// Emit JSON lines instead of human readable output.
    pub json: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address to bind.
    pub addr: String,
    /// Port to bind.
    pub port: u16,
    /// Seconds granted to in-flight requests once shutdown starts.
    pub shutdown_timeout: u64,
    /// Allowed CORS origins, any origin when empty.
    pub cors_allowed_origins: Vec<String>,
    /// Service name shown on the home route.
    pub service: String,
    /// Copyright notice shown on the home route.
    pub copyright: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0".to_string(),
            port: 8080,
            shutdown_timeout: 10,
            cors_allowed_origins: Vec::new(),
            service: "task-api".to_string(),
            copyright: "default".to_string(),
        }
    }
}

impl ServerConfig {
    /// Returns the address to listen on.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.addr, self.port)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout)
    }
}

/// Per-controller settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ControllersConfig {
    pub task_controller: TaskControllerConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TaskControllerConfig {
    /// DAO backing the task controller.
    pub task_dao: DaoOptions,
}

impl Config {
    /// Loads configuration from the directory named by `TASK_API_CONFIG`.
    pub fn load() -> anyhow::Result<Self> {
        let dir = env::var(CONFIG_DIR_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_DIR.to_string());
        Self::load_from(Path::new(&dir))
    }

    /// Loads `config.yaml` from `dir`, overridden by the process environment.
    pub fn load_from(dir: &Path) -> anyhow::Result<Self> {
        Self::build(dir.join(CONFIG_FILE), None)
    }

    /// Loads from `path` with `env_vars` standing in for the process
    /// environment when given.
    fn build(path: PathBuf, env_vars: Option<HashMap<String, String>>) -> anyhow::Result<Self> {
        let environment = Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("server.cors_allowed_origins")
            .try_parsing(true)
            .source(env_vars);

        let settings = config::Config::builder()
            .add_source(
                File::from(path.clone())
                    .format(FileFormat::Yaml)
                    .required(false),
            )
            .add_source(environment)
            .build()
            .with_context(|| format!("fail to load config from {}", path.display()))?;

        settings
            .try_deserialize()
            .context("fail to parse config")
    }
}
