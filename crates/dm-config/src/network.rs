use serde::{Deserialize, Serialize};

use crate::env_parse;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,
    /// Extra attempts for transient failures, 0 means a single attempt
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
    pub retry_max_delay_ms: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            max_retries: 0,
            retry_base_delay_ms: 1_000,
            retry_max_delay_ms: 10_000,
        }
    }
}

impl NetworkConfig {
    pub(crate) fn apply_env(&mut self) {
        self.timeout_ms = env_parse("DM_FETCH_TIMEOUT_MS").unwrap_or(self.timeout_ms);
        self.max_retries = env_parse("DM_FETCH_RETRIES").unwrap_or(self.max_retries);
    }
}
