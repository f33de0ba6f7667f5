use std::fmt;

use serde::{Deserialize, Serialize};

use crate::locale::Locale;

/// Locale-independent name of a JSON resource, relative to the data root.
///
/// Holds the full relative file name, e.g. `vocabulary/a1/modules_2.json`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourcePath(String);

impl ResourcePath {
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        Self(path.trim_start_matches('/').to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Physical path of the `locale` variant: `{locale}/{path}`
    pub fn localized(&self, locale: Locale) -> String {
        format!("{}/{}", locale.code(), self.0)
    }
}

impl fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourcePath {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<String> for ResourcePath {
    fn from(path: String) -> Self {
        Self::new(path)
    }
}
