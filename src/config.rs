//! Service configuration.
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! `CHART_EXPORT_*` environment variables (nested keys separated by `__`,
//! e.g. `CHART_EXPORT_FETCH__TIMEOUT_SECS=20`). A bare `PORT` variable
//! overrides the port of the bind address.

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::headers::DEFAULT_USER_AGENT;
use crate::retry::RetryConfig;
use crate::Result;

pub const ENV_PREFIX: &str = "CHART_EXPORT";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Address the HTTP server listens on
    pub bind_addr: String,
    /// Root directory of CSV exports
    pub downloads_root: PathBuf,
    /// Directory of static files served at `/`, if any
    pub public_dir: Option<PathBuf>,
    pub fetch: FetchConfig,
    pub fallback: FallbackConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            downloads_root: PathBuf::from("downloads"),
            public_dir: Some(PathBuf::from("public")),
            fetch: FetchConfig::default(),
            fallback: FallbackConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 45,
            max_retries: 2,
            base_delay_ms: 1000,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_retries: self.max_retries,
            base_delay_ms: self.base_delay_ms,
            ..RetryConfig::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackConfig {
    /// Replace failed or empty scrapes with clearly flagged sample data
    pub synthetic: bool,
}

impl AppConfig {
    /// Load configuration from `path` (required when given) or from the
    /// per-user config file (optional), then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let environment = Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true);
        Self::from_sources(path, environment, std::env::var("PORT").ok())
    }

    /// Default location of the config file, `<config dir>/chart-export/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("chart-export").join("config.toml"))
    }

    fn from_sources(
        path: Option<&Path>,
        environment: Environment,
        port: Option<String>,
    ) -> Result<Self> {
        let mut builder = Config::builder();
        match path {
            Some(path) => {
                log::debug!("Loading configuration from {}", path.display());
                builder = builder.add_source(File::from(path).format(FileFormat::Toml));
            }
            None => {
                if let Some(default) = Self::default_path() {
                    builder = builder.add_source(
                        File::from(default)
                            .format(FileFormat::Toml)
                            .required(false),
                    );
                }
            }
        }

        let mut config: AppConfig = builder
            .add_source(environment)
            .build()?
            .try_deserialize()?;

        if let Some(port) = port.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
            config.bind_addr = with_port(&config.bind_addr, port);
        }
        Ok(config)
    }
}

fn with_port(bind_addr: &str, port: &str) -> String {
    let host = bind_addr
        .rsplit_once(':')
        .map(|(host, _)| host)
        .unwrap_or(bind_addr);
    format!("{host}:{port}")
}
