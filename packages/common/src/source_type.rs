#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How assets arrive in a source.
///
/// When the `sea-orm` feature is enabled, this enum can be used directly in SeaORM entities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    /// Populated one file at a time.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "manual"))]
    Manual,
    /// Populated by bulk archive imports.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "zip"))]
    Zip,
}

impl SourceType {
    pub const ALL: &'static [SourceType] = &[Self::Manual, Self::Zip];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Zip => "zip",
        }
    }

    /// Whether archive imports may target a source of this type.
    pub fn accepts_archives(&self) -> bool {
        matches!(self, Self::Zip)
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for SourceType {
    fn default() -> Self {
        Self::Manual
    }
}

/// Error when parsing an unknown source type string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseSourceTypeError {
    invalid: String,
}

impl fmt::Display for ParseSourceTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid source type '{}'. Valid values: {}",
            self.invalid,
            SourceType::ALL
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

impl std::error::Error for ParseSourceTypeError {}

impl FromStr for SourceType {
    type Err = ParseSourceTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "manual" => Ok(Self::Manual),
            "zip" => Ok(Self::Zip),
            _ => Err(ParseSourceTypeError {
                invalid: s.to_string(),
            }),
        }
    }
}
