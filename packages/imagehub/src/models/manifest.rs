//! Parsing of `metadata.json` manifests.
//!
//! Three top-level shapes are accepted and normalized to a list of entries:
//!
//! ```json
//! [{"filename": "a.png", "title": "Cat"}]
//! {"filename": "a.png", "title": "Cat"}
//! {"a": {"filename": "a.png", "title": "Cat"}}
//! ```
//!
//! In the keyed shape an entry without `filename` uses its key.

use serde::Deserialize;
use serde_json::Value;

use super::asset::AssetPatch;

/// One entry of a manifest, before resolution against stored files.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManifestEntry {
    /// Path relative to the manifest's directory.
    pub filename: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub license: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

impl ManifestEntry {
    pub fn into_parts(self) -> (String, AssetPatch) {
        (
            self.filename,
            AssetPatch {
                title: self.title,
                author: self.author,
                license: self.license,
                tags: self.tags,
            },
        )
    }
}

/// Parses a manifest document.
///
/// The outer `Err` rejects the whole document (bad JSON or an unsupported
/// shape). Each inner result is one entry, so a malformed entry does not
/// hide the valid ones.
pub fn parse_manifest(content: &[u8]) -> Result<Vec<Result<ManifestEntry, String>>, String> {
    let document: Value =
        serde_json::from_slice(content).map_err(|e| format!("invalid JSON: {e}"))?;

    let raw_entries: Vec<Value> = match document {
        Value::Array(items) => items,
        Value::Object(map) if map.contains_key("filename") => vec![Value::Object(map)],
        Value::Object(map) if !map.is_empty() && map.values().all(Value::is_object) => map
            .into_iter()
            .map(|(key, mut value)| {
                if let Value::Object(fields) = &mut value {
                    fields.entry("filename").or_insert(Value::String(key));
                }
                value
            })
            .collect(),
        Value::Object(map) if map.is_empty() => Vec::new(),
        other => {
            return Err(format!(
                "expected an array of entries or an entry object, found {}",
                json_kind(&other)
            ));
        }
    };

    Ok(raw_entries.into_iter().map(parse_entry).collect())
}

fn parse_entry(value: Value) -> Result<ManifestEntry, String> {
    if !value.is_object() {
        return Err(format!("expected an entry object, found {}", json_kind(&value)));
    }
    let entry: ManifestEntry = serde_json::from_value(value).map_err(|e| e.to_string())?;
    if entry.filename.trim().is_empty() {
        return Err("filename must not be empty".into());
    }
    Ok(entry)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
