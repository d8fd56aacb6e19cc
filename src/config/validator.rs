//! Validate catalog config before resolving: identifiers, path segments, upload slots.

use crate::config::types::CatalogConfig;
use crate::error::ConfigError;
use regex::Regex;
use std::collections::HashSet;

/// Path segments taken by fixed routes under `/api`.
pub const RESERVED_SEGMENTS: &[&str] = &["tabs", "login", "session", "uploads"];

/// Columns every content table carries.
pub const SYSTEM_COLUMNS: &[&str] = &["id", "created_at", "updated_at"];

/// Lowercase PostgreSQL identifier that needs no quoting.
const IDENT_PATTERN: &str = r"^[a-z_][a-z0-9_]{0,62}$";

fn check_ident(re: &Regex, kind: &'static str, name: &str) -> Result<(), ConfigError> {
    if re.is_match(name) {
        Ok(())
    } else {
        Err(ConfigError::Validation(format!("invalid {} name '{}'", kind, name)))
    }
}

pub fn validate(config: &CatalogConfig) -> Result<(), ConfigError> {
    let ident = Regex::new(IDENT_PATTERN).map_err(|e| ConfigError::Validation(e.to_string()))?;
    let mut segments = HashSet::new();
    let mut tables = HashSet::new();

    for r in &config.resources {
        check_ident(&ident, "path segment", &r.path_segment)?;
        if RESERVED_SEGMENTS.contains(&r.path_segment.as_str()) {
            return Err(ConfigError::ReservedPathSegment(r.path_segment.clone()));
        }
        if !segments.insert(r.path_segment.as_str()) {
            return Err(ConfigError::DuplicatePathSegment(r.path_segment.clone()));
        }
        let table = r.table.as_deref().unwrap_or(&r.path_segment);
        check_ident(&ident, "table", table)?;
        if !tables.insert(table.to_string()) {
            return Err(ConfigError::Validation(format!("table '{}' used twice", table)));
        }
        if r.columns.is_empty() {
            return Err(ConfigError::Validation(format!("resource '{}' has no columns", r.path_segment)));
        }

        let mut columns = HashSet::new();
        for c in &r.columns {
            check_ident(&ident, "column", &c.name)?;
            if SYSTEM_COLUMNS.contains(&c.name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "resource '{}': column '{}' is managed by the store",
                    r.path_segment, c.name
                )));
            }
            if !columns.insert(c.name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "resource '{}': duplicate column '{}'",
                    r.path_segment, c.name
                )));
            }
        }

        if let Some(slot) = &r.upload {
            check_ident(&ident, "column", &slot.url_column)?;
            check_ident(&ident, "column", &slot.key_column)?;
            if slot.url_column == slot.key_column {
                return Err(ConfigError::Validation(format!(
                    "resource '{}': upload url and key columns must differ",
                    r.path_segment
                )));
            }
            for name in [&slot.url_column, &slot.key_column] {
                if columns.contains(name.as_str()) || SYSTEM_COLUMNS.contains(&name.as_str()) {
                    return Err(ConfigError::Validation(format!(
                        "resource '{}': upload column '{}' collides with a declared column",
                        r.path_segment, name
                    )));
                }
            }
            if slot.folder.trim().is_empty() {
                return Err(ConfigError::MissingReference {
                    kind: "upload folder",
                    id: r.path_segment.clone(),
                });
            }
        }
    }

    let mut keys = HashSet::new();
    for f in &config.families {
        check_ident(&ident, "family", &f.key)?;
        if !keys.insert(f.key.as_str()) {
            return Err(ConfigError::DuplicatePathSegment(format!("tabs/{}", f.key)));
        }
        for table in [&f.tab_table, &f.section_table, &f.file_table] {
            check_ident(&ident, "table", table)?;
            if !tables.insert(table.clone()) {
                return Err(ConfigError::Validation(format!("table '{}' used twice", table)));
            }
        }
        if f.folder.trim().is_empty() {
            return Err(ConfigError::MissingReference {
                kind: "upload folder",
                id: f.key.clone(),
            });
        }
    }
    Ok(())
}
