//! Load the catalog from the builtin definition or a JSON file, then resolve it for a schema.

use crate::config::resolved::{ColumnInfo, ResolvedCatalog, ResolvedFamily, ResolvedResource, ResolvedUpload, TEXT_MAX_LENGTH};
use crate::config::types::*;
use crate::config::validate;
use crate::error::ConfigError;
use crate::media::{FileNaming, MediaKind, UploadProfile};
use std::collections::HashMap;
use std::path::Path;

/// Build resolved catalog from config; every table lives in `schema`.
pub fn resolve(config: &CatalogConfig, schema: &str) -> Result<ResolvedCatalog, ConfigError> {
    validate(config)?;

    let mut resources = Vec::with_capacity(config.resources.len());
    let mut resource_by_path = HashMap::new();

    for r in &config.resources {
        let mut columns = vec![system_column("id", ColumnKind::Integer)];
        for c in &r.columns {
            columns.push(ColumnInfo {
                name: c.name.clone(),
                kind: c.kind,
                required: c.required,
                writable: true,
                max_length: match c.kind {
                    ColumnKind::Text => Some(TEXT_MAX_LENGTH),
                    _ => None,
                },
            });
        }
        let upload = r.upload.as_ref().map(|slot| {
            columns.push(system_column(&slot.url_column, ColumnKind::Text));
            columns.push(system_column(&slot.key_column, ColumnKind::Text));
            ResolvedUpload {
                profile: UploadProfile {
                    folder: slot.folder.clone(),
                    kind: slot.kind,
                    naming: slot.naming,
                },
                url_column: slot.url_column.clone(),
                key_column: slot.key_column.clone(),
                required: slot.required,
            }
        });
        columns.push(system_column("created_at", ColumnKind::Timestamp));
        columns.push(system_column("updated_at", ColumnKind::Timestamp));

        let resource = ResolvedResource {
            schema_name: schema.to_string(),
            table_name: r.table.clone().unwrap_or_else(|| r.path_segment.clone()),
            path_segment: r.path_segment.clone(),
            columns,
            order: r.order,
            upload,
        };
        resource_by_path.insert(r.path_segment.clone(), resource.clone());
        resources.push(resource);
    }

    let family_by_key = config
        .families
        .iter()
        .map(|f| {
            (
                f.key.clone(),
                ResolvedFamily {
                    key: f.key.clone(),
                    schema_name: schema.to_string(),
                    tab_table: f.tab_table.clone(),
                    section_table: f.section_table.clone(),
                    file_table: f.file_table.clone(),
                    profile: UploadProfile {
                        folder: f.folder.clone(),
                        kind: MediaKind::Document,
                        naming: FileNaming::Sanitized,
                    },
                },
            )
        })
        .collect();

    Ok(ResolvedCatalog {
        resources,
        resource_by_path,
        family_by_key,
    })
}

fn system_column(name: &str, kind: ColumnKind) -> ColumnInfo {
    ColumnInfo {
        name: name.to_string(),
        kind,
        required: false,
        writable: false,
        max_length: None,
    }
}

/// Read a catalog JSON file (same shape as `CatalogConfig`).
pub async fn load_catalog_from_path(path: &Path) -> Result<CatalogConfig, ConfigError> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    serde_json::from_str(&raw).map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))
}
