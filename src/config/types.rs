//! Raw catalog types. The builtin catalog is declared in code; a JSON file with the same shape may replace it.

use crate::media::{FileNaming, MediaKind};
use serde::{Deserialize, Serialize};

/// Storage type of a content column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// Short text, length-limited on input.
    Text,
    /// Free text (descriptions, messages), no length limit.
    LongText,
    Date,
    Timestamp,
    Integer,
}

impl ColumnKind {
    pub fn pg_type(&self) -> &'static str {
        match self {
            ColumnKind::Text | ColumnKind::LongText => "text",
            ColumnKind::Date => "date",
            ColumnKind::Timestamp => "timestamptz",
            ColumnKind::Integer => "bigint",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ColumnConfig {
    pub name: String,
    pub kind: ColumnKind,
    #[serde(default)]
    pub required: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// File attached to a plain resource row: uploaded to `folder`, URL and media key stored in two columns.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UploadSlotConfig {
    pub kind: MediaKind,
    pub folder: String,
    pub url_column: String,
    pub key_column: String,
    #[serde(default)]
    pub naming: FileNaming,
    /// A file must accompany create.
    #[serde(default)]
    pub required: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResourceConfig {
    pub path_segment: String,
    /// Defaults to the path segment.
    #[serde(default)]
    pub table: Option<String>,
    pub columns: Vec<ColumnConfig>,
    #[serde(default)]
    pub order: SortOrder,
    #[serde(default)]
    pub upload: Option<UploadSlotConfig>,
}

/// One tab → sections → files content family.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FamilyConfig {
    pub key: String,
    pub tab_table: String,
    pub section_table: String,
    pub file_table: String,
    pub folder: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    pub resources: Vec<ResourceConfig>,
    #[serde(default)]
    pub families: Vec<FamilyConfig>,
}
