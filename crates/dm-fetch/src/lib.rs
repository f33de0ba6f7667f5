use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

pub mod fs;
pub mod http;
pub mod memory;
pub mod retry;

pub use fs::FsFetcher;
pub use http::HttpFetcher;
pub use memory::MemoryFetcher;
pub use retry::{RetryPolicy, RetryingFetcher};

/// Source of JSON documents addressed by paths relative to a store root
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch and parse the document at `path`
    async fn fetch(&self, path: &str) -> Result<Value, FetchError>;

    /// Store metadata
    fn metadata(&self) -> StoreMetadata;
}

#[async_trait::async_trait]
impl<F: Fetcher + ?Sized> Fetcher for Arc<F> {
    async fn fetch(&self, path: &str) -> Result<Value, FetchError> {
        (**self).fetch(path).await
    }

    fn metadata(&self) -> StoreMetadata {
        (**self).metadata()
    }
}

#[derive(Debug, Clone)]
pub struct StoreMetadata {
    pub kind: &'static str,
    pub root: String,
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("HTTP {status} for {path}")]
    Status { path: String, status: u16 },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Timed out fetching {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed JSON in {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid resource path: {0}")]
    InvalidPath(String),
}

impl FetchError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            FetchError::NotFound(_) | FetchError::Status { status: 404, .. }
        )
    }

    /// Worth another attempt: connection trouble or an overloaded server
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Network(_) | FetchError::Timeout(_) => true,
            FetchError::Status { status, .. } => matches!(status, 429 | 502 | 503 | 504),
            _ => false,
        }
    }
}

/// Open the store at `base`: `http(s)://` roots go over the network,
/// anything else is read as a local directory.
pub fn open_store(
    base: &str,
    timeout: Duration,
    retry: RetryPolicy,
) -> Result<Arc<dyn Fetcher>, FetchError> {
    let store: Arc<dyn Fetcher> = if base.starts_with("http://") || base.starts_with("https://") {
        let http = HttpFetcher::new(base, timeout)?;
        if retry.max_retries > 0 {
            Arc::new(RetryingFetcher::new(http, retry))
        } else {
            Arc::new(http)
        }
    } else {
        let fs = FsFetcher::new(base);
        if retry.max_retries > 0 {
            Arc::new(RetryingFetcher::new(fs, retry))
        } else {
            Arc::new(fs)
        }
    };

    let meta = store.metadata();
    tracing::info!("Opened {} store at {}", meta.kind, meta.root);
    Ok(store)
}
