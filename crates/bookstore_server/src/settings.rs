//! Layered process configuration.
//!
//! Sources, later ones winning: `.env`, `config/base.toml`,
//! `config/{environment}.toml`, then `BOOKSTORE__*` environment variables
//! (`BOOKSTORE__SERVER__PORT=9000`).

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context};
use bookstore_core::db::PoolOptions;
use serde::Deserialize;

const DEFAULT_ENV: &str = "local";
const ENV_VAR_NAME: &str = "BOOKSTORE_ENV";
const CONFIG_DIR_ENV: &str = "BOOKSTORE_CONFIG_DIR";

#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Local,
    Production,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl Settings {
    /// Load configuration by layering `.env`, base file, and environment overlay.
    pub fn load() -> anyhow::Result<Self> {
        // Missing `.env` is fine.
        let _ = dotenvy::dotenv();

        let environment = std::env::var(ENV_VAR_NAME).unwrap_or_else(|_| DEFAULT_ENV.to_string());
        let config_dir = match std::env::var(CONFIG_DIR_ENV) {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => std::env::current_dir()
                .context("unable to resolve current directory")?
                .join("config"),
        };

        let cfg = config::Config::builder()
            .add_source(config::File::from(config_dir.join("base.toml")).required(false))
            .add_source(
                config::File::from(config_dir.join(format!("{environment}.toml")))
                    .required(false),
            )
            .add_source(config::Environment::with_prefix("BOOKSTORE").separator("__"))
            .build()
            .context("failed to build configuration")?;

        let mut settings: Settings = cfg
            .try_deserialize()
            .context("failed to deserialize configuration")?;

        settings.environment = match environment.as_str() {
            "local" => Environment::Local,
            "production" => Environment::Production,
            other => {
                return Err(anyhow!(
                    "unsupported environment '{other}'; expected local/production"
                ));
            }
        };

        Ok(settings)
    }

    /// Explicit `logging.level`, else `info` in production and `debug` locally.
    pub fn log_level(&self) -> &str {
        match (&self.logging.level, &self.environment) {
            (Some(level), _) => level.as_str(),
            (None, Environment::Production) => "info",
            (None, Environment::Local) => "debug",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "ServerSettings::default_host")]
    pub host: String,
    #[serde(default = "ServerSettings::default_port")]
    pub port: u16,
}

impl ServerSettings {
    fn default_host() -> String {
        "0.0.0.0".to_string()
    }

    fn default_port() -> u16 {
        8081
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default = "DatabaseSettings::default_path")]
    pub path: PathBuf,
    #[serde(default = "DatabaseSettings::default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "DatabaseSettings::default_connection_timeout_ms")]
    pub connection_timeout_ms: u64,
}

impl DatabaseSettings {
    fn default_path() -> PathBuf {
        PathBuf::from("book.db")
    }

    fn default_max_connections() -> u32 {
        16
    }

    fn default_connection_timeout_ms() -> u64 {
        5000
    }

    pub fn pool_options(&self) -> PoolOptions {
        PoolOptions {
            max_connections: self.max_connections,
            connection_timeout: Duration::from_millis(self.connection_timeout_ms),
            ..PoolOptions::default()
        }
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: Self::default_path(),
            max_connections: Self::default_max_connections(),
            connection_timeout_ms: Self::default_connection_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoggingSettings {
    /// One of `trace|debug|info|warn|error`.
    #[serde(default)]
    pub level: Option<String>,
    /// Absolute directory for rotated log files; stderr when unset.
    #[serde(default)]
    pub dir: Option<String>,
}
