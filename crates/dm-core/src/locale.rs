use std::sync::Arc;

use dm_fetch::FetchError;
use dm_types::{Locale, ResourcePath};
use serde_json::Value;

use crate::cache::FetchCache;

/// Maps a resource and locale to a physical document, falling back to the
/// default locale when the localized variant cannot be loaded.
pub struct LocaleResolver {
    cache: Arc<FetchCache>,
    default_locale: Locale,
}

impl LocaleResolver {
    pub fn new(cache: Arc<FetchCache>, default_locale: Locale) -> Self {
        Self {
            cache,
            default_locale,
        }
    }

    pub fn default_locale(&self) -> Locale {
        self.default_locale
    }

    pub fn cache(&self) -> &Arc<FetchCache> {
        &self.cache
    }

    /// First physical path tried for `path` under `locale`
    pub fn physical_path(&self, path: &ResourcePath, locale: Locale) -> String {
        if locale == self.default_locale {
            path.as_str().to_string()
        } else {
            path.localized(locale)
        }
    }

    /// Load `path` for `locale`.
    ///
    /// Any failure of the localized variant (missing, HTTP error, bad JSON)
    /// falls through to the default-locale document. The error returned is
    /// the one from the default-locale attempt.
    pub async fn resolve(
        &self,
        path: &ResourcePath,
        locale: Locale,
    ) -> Result<Arc<Value>, FetchError> {
        if locale != self.default_locale {
            match self.cache.get(&path.localized(locale)).await {
                Ok(value) => return Ok(value),
                Err(e) => tracing::debug!(
                    "{} has no {} variant, using {}: {}",
                    path,
                    locale,
                    self.default_locale,
                    e
                ),
            }
        }

        self.cache.get(path.as_str()).await
    }

    /// Like [`LocaleResolver::resolve`], collapsing failure to `None`
    pub async fn resolve_opt(&self, path: &ResourcePath, locale: Locale) -> Option<Arc<Value>> {
        self.resolve(path, locale).await.ok()
    }
}
