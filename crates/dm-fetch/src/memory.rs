use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use serde_json::Value;

use crate::{FetchError, Fetcher, StoreMetadata};

enum Document {
    Json(Value),
    Raw(String),
    Failing(u16),
}

/// In-memory JSON store that records every request.
///
/// Serves embedded content and drives tests of the loading pipeline.
#[derive(Default)]
pub struct MemoryFetcher {
    documents: Mutex<HashMap<String, Document>>,
    requests: Mutex<Vec<String>>,
    latency: Option<Duration>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every response by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn insert(&self, path: impl Into<String>, value: Value) -> &Self {
        self.store(path.into(), Document::Json(value))
    }

    /// Store a body that is parsed on fetch, so it may be malformed
    pub fn insert_raw(&self, path: impl Into<String>, body: impl Into<String>) -> &Self {
        self.store(path.into(), Document::Raw(body.into()))
    }

    /// Answer requests for `path` with HTTP `status`
    pub fn fail(&self, path: impl Into<String>, status: u16) -> &Self {
        self.store(path.into(), Document::Failing(status))
    }

    /// Every requested path, in request order
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    pub fn request_count(&self, path: &str) -> usize {
        self.requests
            .lock()
            .map(|r| r.iter().filter(|p| p.as_str() == path).count())
            .unwrap_or(0)
    }

    pub fn total_requests(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }

    fn store(&self, path: String, document: Document) -> &Self {
        if let Ok(mut documents) = self.documents.lock() {
            documents.insert(path, document);
        }
        self
    }

    fn lookup(&self, path: &str) -> Result<Value, FetchError> {
        let documents = self
            .documents
            .lock()
            .map_err(|_| FetchError::NotFound(path.to_string()))?;

        match documents.get(path) {
            Some(Document::Json(value)) => Ok(value.clone()),
            Some(Document::Raw(body)) => {
                serde_json::from_str(body).map_err(|source| FetchError::Parse {
                    path: path.to_string(),
                    source,
                })
            }
            Some(Document::Failing(404)) | None => Err(FetchError::NotFound(path.to_string())),
            Some(Document::Failing(status)) => Err(FetchError::Status {
                path: path.to_string(),
                status: *status,
            }),
        }
    }
}

#[async_trait::async_trait]
impl Fetcher for MemoryFetcher {
    async fn fetch(&self, path: &str) -> Result<Value, FetchError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(path.to_string());
        }

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        self.lookup(path)
    }

    fn metadata(&self) -> StoreMetadata {
        StoreMetadata {
            kind: "memory",
            root: String::new(),
        }
    }
}
