use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use serde_json::Value;

use crate::{FetchError, Fetcher, StoreMetadata};

/// JSON store backed by a local directory tree
#[derive(Debug, Clone)]
pub struct FsFetcher {
    root: PathBuf,
}

impl FsFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve `path` under the root; rejects absolute paths and `..`
    fn resolve(&self, path: &str) -> Result<PathBuf, FetchError> {
        let relative = Path::new(path.trim_start_matches('/'));
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(FetchError::InvalidPath(path.to_string()));
        }

        Ok(self.root.join(relative))
    }
}

#[async_trait::async_trait]
impl Fetcher for FsFetcher {
    async fn fetch(&self, path: &str) -> Result<Value, FetchError> {
        let file = self.resolve(path)?;
        tracing::debug!("Reading {}", file.display());

        let bytes = match tokio::fs::read(&file).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(FetchError::NotFound(path.to_string()));
            }
            Err(e) => return Err(FetchError::Io(e)),
        };

        serde_json::from_slice(&bytes).map_err(|source| FetchError::Parse {
            path: path.to_string(),
            source,
        })
    }

    fn metadata(&self) -> StoreMetadata {
        StoreMetadata {
            kind: "directory",
            root: self.root.display().to_string(),
        }
    }
}
