//! Resolved catalog: config validated and flattened for runtime use.

use crate::config::types::{ColumnKind, SortOrder};
use crate::media::UploadProfile;
use std::collections::HashMap;

/// Longest value accepted for a `Text` column.
pub const TEXT_MAX_LENGTH: usize = 2000;

#[derive(Clone, Debug)]
pub struct ColumnInfo {
    pub name: String,
    pub kind: ColumnKind,
    pub required: bool,
    /// False for the primary key, timestamps, and upload slot columns.
    pub writable: bool,
    pub max_length: Option<usize>,
}

impl ColumnInfo {
    pub fn pg_type(&self) -> &'static str {
        self.kind.pg_type()
    }
}

#[derive(Clone, Debug)]
pub struct ResolvedUpload {
    pub profile: UploadProfile,
    pub url_column: String,
    pub key_column: String,
    pub required: bool,
}

#[derive(Clone, Debug)]
pub struct ResolvedResource {
    pub schema_name: String,
    pub table_name: String,
    pub path_segment: String,
    /// All selectable columns, primary key first.
    pub columns: Vec<ColumnInfo>,
    pub order: SortOrder,
    pub upload: Option<ResolvedUpload>,
}

impl ResolvedResource {
    pub fn pk(&self) -> &str {
        "id"
    }

    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn writable_columns(&self) -> impl Iterator<Item = &ColumnInfo> {
        self.columns.iter().filter(|c| c.writable)
    }
}

/// Three-level tab → section → file family with schema-qualified table names.
#[derive(Clone, Debug)]
pub struct ResolvedFamily {
    pub key: String,
    pub schema_name: String,
    pub tab_table: String,
    pub section_table: String,
    pub file_table: String,
    pub profile: UploadProfile,
}

impl ResolvedFamily {
    pub fn tabs(&self) -> String {
        qualified(&self.schema_name, &self.tab_table)
    }

    pub fn sections(&self) -> String {
        qualified(&self.schema_name, &self.section_table)
    }

    pub fn files(&self) -> String {
        qualified(&self.schema_name, &self.file_table)
    }
}

/// Quote identifier for PostgreSQL (safe: only from validated config).
pub fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

pub fn qualified(schema: &str, table: &str) -> String {
    format!("{}.{}", quoted(schema), quoted(table))
}

#[derive(Clone, Debug, Default)]
pub struct ResolvedCatalog {
    pub resources: Vec<ResolvedResource>,
    pub resource_by_path: HashMap<String, ResolvedResource>,
    pub family_by_key: HashMap<String, ResolvedFamily>,
}

impl ResolvedCatalog {
    pub fn resource_by_path(&self, path: &str) -> Option<&ResolvedResource> {
        self.resource_by_path.get(path)
    }

    pub fn family(&self, key: &str) -> Option<&ResolvedFamily> {
        self.family_by_key.get(key)
    }

    /// Families in a stable order (by key).
    pub fn families(&self) -> Vec<&ResolvedFamily> {
        let mut out: Vec<_> = self.family_by_key.values().collect();
        out.sort_by(|a, b| a.key.cmp(&b.key));
        out
    }
}
