/***************************************/
/*        3rd party libraries          */
/***************************************/
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/***************************************/
/*       Public data structures        */
/***************************************/
#[derive(Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,
    pub mover: MoverConfig,
    pub world: WorldConfig,
    pub logging: LoggingConfig,
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct StoreConfig {
    pub path: PathBuf,
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct MoverConfig {
    /// Period between two mover invocations.
    pub tick_interval_ms: u64,
    /// Mover invocations the doors stay open at a stop.
    pub dwell_ticks: u32,
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct WorldConfig {
    pub id: String,
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug)]
pub enum ConfigError {
    Io(String),
    Parse(String),
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            path: PathBuf::from("elevators.json"),
        }
    }
}

impl Default for MoverConfig {
    fn default() -> Self {
        // 10 game ticks of 50 ms, doors open for 5 seconds
        MoverConfig {
            tick_interval_ms: 500,
            dwell_ticks: 10,
        }
    }
}

impl MoverConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        WorldConfig {
            id: "overworld".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(message) => write!(f, "Failed to read configuration file: {message}"),
            Self::Parse(message) => write!(f, "Failed to parse configuration file: {message}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/***************************************/
/*             Public API              */
/***************************************/
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let config_str = fs::read_to_string(path)
        .map_err(|e| ConfigError::Io(format!("{}: {e}", path.display())))?;
    parse_config(&config_str)
}

pub fn parse_config(config_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(config_str).map_err(|e| ConfigError::Parse(e.to_string()))
}
