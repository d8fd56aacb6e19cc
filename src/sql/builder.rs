//! Builds parameterized INSERT, SELECT, UPDATE, DELETE from a resolved resource.

use crate::config::{qualified, quoted, ResolvedResource, SYSTEM_COLUMNS};
use serde_json::Value;
use std::collections::HashMap;

pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Value>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: Value) -> u32 {
        let n = self.params.len() as u32 + 1;
        self.params.push(v);
        n
    }
}

fn table(resource: &ResolvedResource) -> String {
    qualified(&resource.schema_name, &resource.table_name)
}

/// SELECT list: every resolved column, in catalog order.
fn select_column_list(resource: &ResolvedResource) -> String {
    resource
        .columns
        .iter()
        .map(|c| quoted(&c.name))
        .collect::<Vec<_>>()
        .join(", ")
}

fn storable(resource: &ResolvedResource, name: &str) -> Option<&'static str> {
    if SYSTEM_COLUMNS.contains(&name) {
        return None;
    }
    resource.column(name).map(|c| c.pg_type())
}

/// SELECT all rows in the resource's fixed order.
pub fn select_list(resource: &ResolvedResource) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.sql = format!(
        "SELECT {} FROM {} ORDER BY {} {}",
        select_column_list(resource),
        table(resource),
        quoted(resource.pk()),
        resource.order.sql()
    );
    q
}

/// SELECT by primary key. Caller adds id as sole param.
pub fn select_by_id(resource: &ResolvedResource) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} = $1",
        select_column_list(resource),
        table(resource),
        quoted(resource.pk())
    );
    q
}

/// INSERT the body's storable columns; the rest take their DB default.
/// Placeholders carry a cast to the column type so text values bind correctly.
pub fn insert(resource: &ResolvedResource, body: &HashMap<String, Value>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut cols = Vec::new();
    let mut placeholders = Vec::new();
    for c in &resource.columns {
        let Some(val) = body.get(&c.name) else { continue };
        let Some(pg_type) = storable(resource, &c.name) else { continue };
        let n = q.push_param(val.clone());
        cols.push(quoted(&c.name));
        placeholders.push(format!("${}::{}", n, pg_type));
    }
    q.sql = if cols.is_empty() {
        format!(
            "INSERT INTO {} DEFAULT VALUES RETURNING {}",
            table(resource),
            select_column_list(resource)
        )
    } else {
        format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
            table(resource),
            cols.join(", "),
            placeholders.join(", "),
            select_column_list(resource)
        )
    };
    q
}

/// UPDATE by id: SET only storable columns present in body. Absent columns keep their value.
pub fn update(resource: &ResolvedResource, id: &Value, body: &HashMap<String, Value>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut sets = Vec::new();
    // Catalog order keeps the statement deterministic.
    for c in &resource.columns {
        let Some(val) = body.get(&c.name) else { continue };
        let Some(pg_type) = storable(resource, &c.name) else { continue };
        let n = q.push_param(val.clone());
        sets.push(format!("{} = ${}::{}", quoted(&c.name), n, pg_type));
    }
    sets.push(format!("{} = NOW()", quoted("updated_at")));
    let id_param = q.push_param(id.clone());
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = ${} RETURNING {}",
        table(resource),
        sets.join(", "),
        quoted(resource.pk()),
        id_param,
        select_column_list(resource)
    );
    q
}

/// DELETE by id, returning the removed row. Caller adds id as sole param.
pub fn delete(resource: &ResolvedResource) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.sql = format!(
        "DELETE FROM {} WHERE {} = $1 RETURNING {}",
        table(resource),
        quoted(resource.pk()),
        select_column_list(resource)
    );
    q
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{builtin_catalog, resolve};
    use serde_json::json;

    fn resource(path: &str) -> ResolvedResource {
        resolve(&builtin_catalog(), "cms").unwrap().resource_by_path(path).unwrap().clone()
    }

    #[test]
    fn list_uses_fixed_order() {
        let links = resource("links");
        let q = select_list(&links);
        assert!(q.sql.starts_with("SELECT \"id\", \"title\", \"url\", \"created_at\", \"updated_at\" FROM \"cms\".\"links\""));
        assert!(q.sql.ends_with("ORDER BY \"id\" DESC"));
        assert!(select_list(&resource("staff")).sql.ends_with("ORDER BY \"id\" ASC"));
    }

    #[test]
    fn insert_casts_and_skips_system_columns() {
        let events = resource("events");
        let body: HashMap<String, Value> = [
            ("title".to_string(), json!("Convocation")),
            ("event_date".to_string(), json!("2025-03-14")),
            ("id".to_string(), json!(99)),
            ("image_url".to_string(), json!("http://cdn/x.png")),
        ]
        .into_iter()
        .collect();
        let q = insert(&events, &body);
        assert!(q.sql.starts_with(
            "INSERT INTO \"cms\".\"events\" (\"title\", \"event_date\", \"image_url\") VALUES ($1::text, $2::date, $3::text)"
        ));
        assert_eq!(q.params, vec![json!("Convocation"), json!("2025-03-14"), json!("http://cdn/x.png")]);
    }

    #[test]
    fn update_sets_only_present_columns() {
        let staff = resource("staff");
        let body: HashMap<String, Value> = [("designation".to_string(), json!("Professor"))].into_iter().collect();
        let q = update(&staff, &json!(7), &body);
        assert_eq!(
            q.sql,
            format!(
                "UPDATE \"cms\".\"staff\" SET \"designation\" = $1::text, \"updated_at\" = NOW() WHERE \"id\" = $2 RETURNING {}",
                select_column_list(&staff)
            )
        );
        assert_eq!(q.params, vec![json!("Professor"), json!(7)]);
        assert!(!q.sql.contains("image_url\" ="));
    }

    #[test]
    fn delete_returns_row() {
        let q = delete(&resource("galleries"));
        assert!(q.sql.starts_with("DELETE FROM \"cms\".\"galleries\" WHERE \"id\" = $1 RETURNING \"id\""));
        assert!(q.params.is_empty());
    }
}
