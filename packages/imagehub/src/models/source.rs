use common::SourceType;
use serde::Deserialize;

/// Input for creating a source.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewSource {
    pub title: String,
    #[serde(default)]
    pub source_type: SourceType,
    #[serde(default)]
    pub url: Option<String>,
}

impl NewSource {
    pub fn new(title: impl Into<String>, source_type: SourceType) -> Self {
        Self {
            title: title.into(),
            source_type,
            url: None,
        }
    }
}

/// Partial update of a source.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceChanges {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub source_type: Option<SourceType>,
    /// `Some(None)` clears the url.
    #[serde(default)]
    pub url: Option<Option<String>>,
}

/// Validates a source title. Must be 1-255 characters after trimming.
pub fn validate_source_title(title: &str) -> Result<&str, String> {
    let trimmed = title.trim();
    if trimmed.is_empty() || trimmed.chars().count() > 255 {
        return Err("Title must be 1-255 characters".into());
    }
    Ok(trimmed)
}
