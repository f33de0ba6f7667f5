use std::env;

use dm_types::Locale;
use serde::{Deserialize, Serialize};

use self::data::DataConfig;
use self::log::LogConfig;
use self::network::NetworkConfig;

pub mod data;
pub mod log;
pub mod network;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data: DataConfig,
    pub network: NetworkConfig,
    pub log: LogConfig,

    /// Locale active at startup
    pub locale: Locale,
    /// Upper bound for one whole assembly, 0 disables it
    pub assembly_timeout_ms: u64,
    /// Capacity of the controller's inbound command channel
    pub command_queue: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data: DataConfig::default(),
            network: NetworkConfig::default(),
            log: LogConfig::default(),
            locale: Locale::default(),
            assembly_timeout_ms: 0,
            command_queue: 64,
        }
    }
}

impl Config {
    /// Defaults with environment overrides applied
    pub fn new() -> Self {
        Self::default().with_env()
    }

    /// Apply `DM_*` environment variables on top of `self`
    pub fn with_env(mut self) -> Self {
        self.data.apply_env();
        self.network.apply_env();
        self.log.apply_env();

        if let Some(locale) = env_parse::<Locale>("DM_LOCALE") {
            self.locale = locale;
        }

        self.assembly_timeout_ms =
            env_parse("DM_ASSEMBLY_TIMEOUT_MS").unwrap_or(self.assembly_timeout_ms);

        self
    }

    /// Reject settings that would make every load come back empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.data.validate()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// Read and parse an environment variable, ignoring unset or invalid values
pub(crate) fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}
