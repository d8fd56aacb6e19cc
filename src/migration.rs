//! Apply the catalog to the database: CREATE SCHEMA, one table per resource, and the
//! three-level table set per tab family with cascading foreign keys.

use crate::config::{qualified, quoted, ColumnKind, ResolvedCatalog, ResolvedFamily, ResolvedResource};
use crate::error::AppError;
use sqlx::PgPool;

fn column_ddl(name: &str, kind: ColumnKind, required: bool) -> String {
    let mut def = format!("{} {}", quoted(name), kind.pg_type().to_uppercase());
    if required {
        def.push_str(" NOT NULL");
    }
    def
}

/// CREATE TABLE statement for a plain resource. Idempotent (IF NOT EXISTS).
pub fn resource_table_ddl(resource: &ResolvedResource) -> String {
    let mut col_defs = vec![format!("{} BIGSERIAL PRIMARY KEY", quoted(resource.pk()))];
    for c in resource.writable_columns() {
        col_defs.push(column_ddl(&c.name, c.kind, c.required));
    }
    if let Some(slot) = &resource.upload {
        col_defs.push(column_ddl(&slot.url_column, ColumnKind::Text, false));
        col_defs.push(column_ddl(&slot.key_column, ColumnKind::Text, false));
    }
    col_defs.push(format!("{} TIMESTAMPTZ NOT NULL DEFAULT NOW()", quoted("created_at")));
    col_defs.push(format!("{} TIMESTAMPTZ NOT NULL DEFAULT NOW()", quoted("updated_at")));
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n  {}\n)",
        qualified(&resource.schema_name, &resource.table_name),
        col_defs.join(",\n  ")
    )
}

/// Tab, section and file tables for one family, parents first.
pub fn family_table_ddl(family: &ResolvedFamily) -> Vec<String> {
    vec![
        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n  \"id\" BIGSERIAL PRIMARY KEY,\n  \"title\" TEXT NOT NULL,\n  \"created_at\" TIMESTAMPTZ NOT NULL DEFAULT NOW(),\n  \"updated_at\" TIMESTAMPTZ NOT NULL DEFAULT NOW()\n)",
            family.tabs()
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n  \"id\" BIGSERIAL PRIMARY KEY,\n  \"tab_id\" BIGINT NOT NULL REFERENCES {} (\"id\") ON DELETE CASCADE,\n  \"title\" TEXT NOT NULL\n)",
            family.sections(),
            family.tabs()
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n  \"id\" BIGSERIAL PRIMARY KEY,\n  \"section_id\" BIGINT NOT NULL REFERENCES {} (\"id\") ON DELETE CASCADE,\n  \"name\" TEXT NOT NULL,\n  \"url\" TEXT NOT NULL,\n  \"uploaded_date\" DATE NOT NULL DEFAULT CURRENT_DATE\n)",
            family.files(),
            family.sections()
        ),
        format!(
            "CREATE INDEX IF NOT EXISTS {} ON {} (\"tab_id\")",
            quoted(&format!("{}_tab_id_idx", family.section_table)),
            family.sections()
        ),
        format!(
            "CREATE INDEX IF NOT EXISTS {} ON {} (\"section_id\")",
            quoted(&format!("{}_section_id_idx", family.file_table)),
            family.files()
        ),
    ]
}

/// Create schema and all tables. Safe to run on every start.
pub async fn apply_migrations(pool: &PgPool, catalog: &ResolvedCatalog, schema: &str) -> Result<(), AppError> {
    sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {}", quoted(schema)))
        .execute(pool)
        .await?;

    for resource in &catalog.resources {
        let ddl = resource_table_ddl(resource);
        tracing::debug!(sql = %ddl, "migration");
        sqlx::query(&ddl).execute(pool).await?;
    }

    for family in catalog.families() {
        for ddl in family_table_ddl(family) {
            tracing::debug!(sql = %ddl, "migration");
            sqlx::query(&ddl).execute(pool).await?;
        }
    }
    tracing::info!(
        schema = %schema,
        resources = catalog.resources.len(),
        families = catalog.family_by_key.len(),
        "migrations applied"
    );
    Ok(())
}
