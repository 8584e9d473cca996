use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::{asset, stored_file};

/// License code reported for assets without one.
pub const DEFAULT_LICENSE: &str = "unknown";

const MAX_FIELD_LEN: usize = 255;

/// Partial update of an asset. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AssetPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub license: Option<String>,
    /// Replaces the whole tag set when present.
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

impl AssetPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.author.is_none() && self.license.is_none() && self.tags.is_none()
    }

    /// Trims every field and checks lengths; tags are deduplicated and
    /// blank tags dropped.
    pub fn validate(self) -> Result<Self, String> {
        Ok(Self {
            title: clean_field("title", self.title)?,
            author: clean_field("author", self.author)?,
            license: clean_field("license", self.license)?,
            tags: self.tags.map(clean_tags).transpose()?,
        })
    }
}

fn clean_field(name: &str, value: Option<String>) -> Result<Option<String>, String> {
    let Some(value) = value else {
        return Ok(None);
    };
    let trimmed = value.trim();
    if trimmed.chars().count() > MAX_FIELD_LEN {
        return Err(format!("{name} must be at most {MAX_FIELD_LEN} characters"));
    }
    Ok(Some(trimmed.to_string()))
}

fn clean_tags(tags: Vec<String>) -> Result<Vec<String>, String> {
    let mut seen = BTreeSet::new();
    for tag in tags {
        let tag = tag.trim();
        if tag.is_empty() {
            continue;
        }
        if tag.chars().count() > MAX_FIELD_LEN {
            return Err(format!("tag '{tag}' must be at most {MAX_FIELD_LEN} characters"));
        }
        seen.insert(tag.to_string());
    }
    Ok(seen.into_iter().collect())
}

/// Metadata supplied with a single-file upload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewAssetMetadata {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub license: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl From<NewAssetMetadata> for AssetPatch {
    fn from(meta: NewAssetMetadata) -> Self {
        Self {
            title: meta.title,
            author: meta.author,
            license: meta.license,
            tags: Some(meta.tags),
        }
    }
}

/// A file handed to `add_item`.
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub data: Vec<u8>,
}

impl Upload {
    pub fn new(filename: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            data: data.into(),
        }
    }
}

/// An asset as callers see it: row, file attributes and tags together,
/// with title and license defaults applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetView {
    pub id: i32,
    pub source_id: i32,
    pub file_id: Uuid,
    /// Path inside the source, e.g. `/cats/tabby.png`.
    pub path: String,
    pub filename: String,
    pub title: String,
    pub author: Option<String>,
    pub license: String,
    pub tags: Vec<String>,
    pub content_hash: Option<String>,
    pub size: i64,
    pub content_type: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl AssetView {
    pub fn new(asset: asset::Model, file: stored_file::Model, tags: Vec<String>) -> Self {
        let title = asset
            .title
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| file.filename.clone());
        let license = file
            .license
            .clone()
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| DEFAULT_LICENSE.to_string());

        Self {
            id: asset.id,
            source_id: asset.source_id,
            file_id: file.id,
            path: file.path(),
            filename: file.filename,
            title,
            author: file.author,
            license,
            tags,
            content_hash: file.content_hash,
            size: file.size,
            content_type: file.content_type,
            updated_at: asset.updated_at.max(file.updated_at),
        }
    }

    /// Whether the asset explicitly carries a title rather than the filename fallback.
    pub fn has_custom_title(&self) -> bool {
        self.title != self.filename
    }
}
