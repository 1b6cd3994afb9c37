//! Application settings. Configuration is read from an optional
//! `settings.toml` (or the file named by `EXPENSE_TRACKER_CONFIG`) and then
//! overridden by `EXPENSE_TRACKER_*` environment variables, using `__` to
//! separate sections, e.g. `EXPENSE_TRACKER_SERVER__PORT=8080`.
use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::columns::DescriptionMode;
use crate::ingest::ImportOptions;

pub const CONFIG_ENV: &str = "EXPENSE_TRACKER_CONFIG";
const ENV_PREFIX: &str = "EXPENSE_TRACKER";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub path: PathBuf,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: PathBuf::from("data/expense-tracker.db"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub bind: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        ServerSettings {
            bind: "127.0.0.1".to_string(),
            port: 3001,
        }
    }
}

impl ServerSettings {
    pub fn address(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ImportSettings {
    pub description_mode: DescriptionMode,
    /// 0 disables the deadline
    pub timeout_secs: u64,
    pub max_upload_bytes: usize,
}

impl Default for ImportSettings {
    fn default() -> Self {
        ImportSettings {
            description_mode: DescriptionMode::Composed,
            timeout_secs: 30,
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

impl ImportSettings {
    pub fn options(&self) -> ImportOptions {
        ImportOptions {
            mode: self.description_mode,
            timeout: (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub level: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        LogSettings {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub server: ServerSettings,
    pub import: ImportSettings,
    pub log: LogSettings,
}

impl Settings {
    /// Load from `settings.toml` (or `$EXPENSE_TRACKER_CONFIG`) plus the
    /// process environment. A missing file is not an error.
    pub fn new() -> Result<Self, ConfigError> {
        let file = std::env::var(CONFIG_ENV).ok().map(PathBuf::from);
        Self::load(file.as_deref(), Environment::with_prefix(ENV_PREFIX))
    }

    pub fn load(file: Option<&Path>, env: Environment) -> Result<Self, ConfigError> {
        let file_source = match file {
            Some(path) => File::from(path).required(true),
            None => File::with_name("settings").required(false),
        };

        Config::builder()
            .add_source(file_source)
            .add_source(env.prefix_separator("_").separator("__").try_parsing(true))
            .build()?
            .try_deserialize()
    }
}
