//! Layered configuration.
//!
//! Precedence, lowest first: built-in defaults, the TOML config file,
//! `BKWEB_*` environment variables (nested keys split on `__`, e.g.
//! `BKWEB_CONSOLE__BINARY`), then command-line flags.

use anyhow::{Context, Result};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::db::CatalogClock;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/bkweb/config.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// SQLite catalog database
    pub catalog_path: PathBuf,
    /// Create missing catalog tables on startup (development catalogs only)
    pub init_schema: bool,
    /// Zone the director writes job times in: `local`, `utc` or `+HH:MM`
    pub catalog_timezone: String,
    pub http_bind: SocketAddr,
    pub rpc_bind: SocketAddr,
    pub query_timeout_secs: u64,
    pub verbose: bool,
    pub json_logs: bool,
    pub console: ConsoleConfig,
}

/// How to reach the backup director's console program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsoleConfig {
    pub binary: PathBuf,
    pub config_file: PathBuf,
    pub timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            catalog_path: PathBuf::from("/var/lib/bacula/bacula.db"),
            init_schema: false,
            catalog_timezone: "local".to_string(),
            http_bind: SocketAddr::from(([127, 0, 0, 1], 8080)),
            rpc_bind: SocketAddr::from(([127, 0, 0, 1], 9101)),
            query_timeout_secs: 30,
            verbose: false,
            json_logs: false,
            console: ConsoleConfig::default(),
        }
    }
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("/usr/sbin/bconsole"),
            config_file: PathBuf::from("/etc/bacula/bconsole.conf"),
            timeout_secs: 15,
        }
    }
}

impl AppConfig {
    /// Load from the default config file, environment and CLI overrides.
    pub fn new<T: Serialize>(cli: Option<&T>) -> Result<Self> {
        Self::load(DEFAULT_CONFIG_PATH, cli)
    }

    /// Load using an explicit config file. A missing file is not an error.
    pub fn load<T: Serialize>(path: impl AsRef<Path>, cli: Option<&T>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("BKWEB_").split("__"));

        if let Some(overrides) = cli {
            figment = figment.merge(Serialized::defaults(overrides));
        }

        figment
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.as_ref().display()))
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }

    pub fn catalog_clock(&self) -> Result<CatalogClock> {
        self.catalog_timezone
            .parse()
            .context("Invalid catalog_timezone")
    }
}

impl ConsoleConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
