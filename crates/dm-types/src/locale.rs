use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Content language variant
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    It,
    En,
    De,
}

impl Locale {
    /// Tag used as the directory prefix of localized resources
    pub fn code(&self) -> &'static str {
        match self {
            Locale::It => "it",
            Locale::En => "en",
            Locale::De => "de",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} tag: {tag}")]
pub struct ParseTagError {
    pub kind: &'static str,
    pub tag: String,
}

impl FromStr for Locale {
    type Err = ParseTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "it" => Ok(Locale::It),
            "en" => Ok(Locale::En),
            "de" => Ok(Locale::De),
            _ => Err(ParseTagError {
                kind: "locale",
                tag: s.to_string(),
            }),
        }
    }
}
