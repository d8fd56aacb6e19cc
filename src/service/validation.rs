//! Request validation from catalog column rules. Also normalizes values to the column's kind.

use crate::case::to_snake_case;
use crate::config::{ColumnInfo, ColumnKind, ResolvedResource};
use crate::error::AppError;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use std::collections::HashMap;

pub struct RequestValidator;

impl RequestValidator {
    /// Validate a create body. All required columns must be present and non-empty.
    /// Returns the body keyed by column name, restricted to writable columns.
    pub fn validate(
        resource: &ResolvedResource,
        body: HashMap<String, Value>,
    ) -> Result<HashMap<String, Value>, AppError> {
        let out = Self::normalize(resource, body)?;
        for col in resource.writable_columns().filter(|c| c.required) {
            if out.get(&col.name).map(Value::is_null).unwrap_or(true) {
                return Err(AppError::Validation(format!("{} is required", col.name)));
            }
        }
        Ok(out)
    }

    /// Validate only the fields present in body (for update). A required column may not be cleared.
    pub fn validate_partial(
        resource: &ResolvedResource,
        body: HashMap<String, Value>,
    ) -> Result<HashMap<String, Value>, AppError> {
        let out = Self::normalize(resource, body)?;
        for (name, v) in &out {
            let required = resource.column(name).map(|c| c.required).unwrap_or(false);
            if required && v.is_null() {
                return Err(AppError::Validation(format!("{} cannot be empty", name)));
            }
        }
        Ok(out)
    }

    fn normalize(
        resource: &ResolvedResource,
        body: HashMap<String, Value>,
    ) -> Result<HashMap<String, Value>, AppError> {
        let mut out = HashMap::with_capacity(body.len());
        for (key, v) in body {
            let name = to_snake_case(&key);
            // Unknown keys and read-only columns (id, upload slot, timestamps) are ignored.
            let Some(col) = resource.column(&name).filter(|c| c.writable) else { continue };
            let v = normalize_field(col, v)?;
            out.insert(name, v);
        }
        Ok(out)
    }
}

fn normalize_field(col: &ColumnInfo, v: Value) -> Result<Value, AppError> {
    let v = match v {
        Value::String(s) if s.trim().is_empty() => Value::Null,
        Value::String(s) if col.kind != ColumnKind::LongText => Value::String(s.trim().to_string()),
        other => other,
    };
    if v.is_null() {
        return Ok(v);
    }
    match col.kind {
        ColumnKind::Text | ColumnKind::LongText => {
            let s = match v {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => return Err(AppError::Validation(format!("{} must be text", col.name))),
            };
            if let Some(max) = col.max_length {
                if s.chars().count() > max {
                    return Err(AppError::Validation(format!(
                        "{} must be at most {} characters",
                        col.name, max
                    )));
                }
            }
            Ok(Value::String(s))
        }
        ColumnKind::Integer => {
            let n = match &v {
                Value::Number(n) => n.as_i64(),
                Value::String(s) => s.parse::<i64>().ok(),
                _ => None,
            };
            n.map(|n| Value::Number(n.into()))
                .ok_or_else(|| AppError::Validation(format!("{} must be an integer", col.name)))
        }
        ColumnKind::Date => {
            let s = v
                .as_str()
                .ok_or_else(|| AppError::Validation(format!("{} must be a date", col.name)))?;
            parse_date(s)
                .map(|d| Value::String(d.format("%Y-%m-%d").to_string()))
                .ok_or_else(|| AppError::Validation(format!("{} must be a date (YYYY-MM-DD)", col.name)))
        }
        ColumnKind::Timestamp => {
            let s = v
                .as_str()
                .ok_or_else(|| AppError::Validation(format!("{} must be a timestamp", col.name)))?;
            parse_timestamp(s)
                .map(|ts| Value::String(ts.to_rfc3339()))
                .ok_or_else(|| AppError::Validation(format!("{} must be an RFC 3339 timestamp", col.name)))
        }
    }
}

/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp (date part kept).
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
}

/// RFC 3339 with offset, normalized to UTC. A bare date is midnight UTC.
fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|naive| naive.and_utc())
        })
}
