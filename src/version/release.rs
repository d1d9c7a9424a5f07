//! Release records as published by the hosting API

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// A single published release of a repository
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Release {
    /// Raw tag, e.g. `v1.2.3`
    #[serde(rename = "tag_name")]
    pub tag: String,
    #[serde(rename = "draft", default)]
    pub is_draft: bool,
    #[serde(rename = "prerelease", default)]
    pub is_prerelease: bool,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

impl Release {
    /// Creates a published, non-draft, non-prerelease release with the given tag
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            is_draft: false,
            is_prerelease: false,
            published_at: None,
        }
    }

    pub fn draft(mut self) -> Self {
        self.is_draft = true;
        self
    }

    pub fn prerelease(mut self) -> Self {
        self.is_prerelease = true;
        self
    }
}
