use std::sync::Arc;
use std::time::Duration;

use dm_config::Config;
use dm_core::ContentAssembler;
use dm_fetch::{Fetcher, RetryPolicy};
use tokio::sync::RwLock;

pub struct AppState {
    pub config: Arc<RwLock<Config>>,
    pub assembler: Arc<ContentAssembler>,
}

impl AppState {
    /// Open the configured content store
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let network = &config.network;
        let retry = RetryPolicy::new(
            network.max_retries,
            Duration::from_millis(network.retry_base_delay_ms),
            Duration::from_millis(network.retry_max_delay_ms),
        );
        let store = dm_fetch::open_store(
            &config.data.base,
            Duration::from_millis(network.timeout_ms),
            retry,
        )?;

        Ok(Self::with_store(config, store))
    }

    pub fn with_store(config: Config, store: Arc<dyn Fetcher>) -> Self {
        let assembler = ContentAssembler::new(store, config.data.clone())
            .with_timeout(Some(Duration::from_millis(config.assembly_timeout_ms)));

        Self {
            config: Arc::new(RwLock::new(config)),
            assembler: Arc::new(assembler),
        }
    }
}
