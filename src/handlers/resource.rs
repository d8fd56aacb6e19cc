//! Plain resource handlers: list, read, create, update, delete, bulk delete.

use crate::case::value_keys_to_camel_case;
use crate::config::ResolvedResource;
use crate::error::AppError;
use crate::extractors::FormPayload;
use crate::media::{self, StoredMedia};
use crate::response::{success_many, success_one, success_one_ok};
use crate::service::{row_id, CrudService, RequestValidator};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Multipart field carrying a resource's file.
pub const FILE_FIELD: &str = "file";

fn lookup<'a>(state: &'a AppState, path_segment: &str) -> Result<&'a ResolvedResource, AppError> {
    state
        .catalog
        .resource_by_path(path_segment)
        .ok_or_else(|| AppError::NotFound(format!("resource '{}'", path_segment)))
}

pub(crate) fn parse_id(id_str: &str) -> Result<i64, AppError> {
    id_str
        .trim()
        .parse()
        .map_err(|_| AppError::BadRequest(format!("invalid id '{}'", id_str)))
}

fn present(mut row: Value) -> Value {
    value_keys_to_camel_case(&mut row);
    row
}

fn stored_key(resource: &ResolvedResource, row: &Value) -> Option<String> {
    let slot = resource.upload.as_ref()?;
    row.get(&slot.key_column).and_then(Value::as_str).map(str::to_string)
}

/// Upload the request's file (if any) and record it in the slot columns of `body`.
async fn attach_file(
    state: &AppState,
    resource: &ResolvedResource,
    form: &mut FormPayload,
    body: &mut HashMap<String, Value>,
    creating: bool,
) -> Result<Option<StoredMedia>, AppError> {
    let file = form.take_file(FILE_FIELD);
    let Some(slot) = &resource.upload else {
        if file.is_some() {
            return Err(AppError::BadRequest(format!("{} does not accept files", resource.path_segment)));
        }
        return Ok(None);
    };
    let Some(file) = file else {
        if creating && slot.required {
            return Err(AppError::Validation(format!("{} is required", slot.profile.kind.label())));
        }
        return Ok(None);
    };
    let stored = media::upload(state.media.as_ref(), &slot.profile, &file).await?;
    body.insert(slot.url_column.clone(), Value::String(stored.url.clone()));
    body.insert(slot.key_column.clone(), Value::String(stored.key.clone()));
    Ok(Some(stored))
}

async fn discard(state: &AppState, stored: Option<StoredMedia>) {
    if let Some(s) = stored {
        tracing::info!(key = %s.key, "discarding upload of failed write");
        media::delete_quietly(state.media.as_ref(), &s.key).await;
    }
}

pub async fn list(
    State(state): State<AppState>,
    Path(path_segment): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let resource = lookup(&state, &path_segment)?;
    let rows = CrudService::list(&state.pool, resource).await?;
    Ok(success_many(rows.into_iter().map(present).collect()))
}

pub async fn read(
    State(state): State<AppState>,
    Path((path_segment, id_str)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let resource = lookup(&state, &path_segment)?;
    let id = parse_id(&id_str)?;
    let row = CrudService::read(&state.pool, resource, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{} {}", path_segment, id)))?;
    Ok(success_one_ok(present(row)))
}

pub async fn create(
    State(state): State<AppState>,
    Path(path_segment): Path<String>,
    mut form: FormPayload,
) -> Result<impl IntoResponse, AppError> {
    let resource = lookup(&state, &path_segment)?;
    let fields = std::mem::take(&mut form.fields).into_iter().collect();
    let mut body = RequestValidator::validate(resource, fields)?;
    let stored = attach_file(&state, resource, &mut form, &mut body, true).await?;
    match CrudService::create(&state.pool, resource, &body).await {
        Ok(row) => {
            tracing::info!(resource = %path_segment, id = ?row_id(&row), "created");
            Ok(success_one(present(row)))
        }
        Err(e) => {
            discard(&state, stored).await;
            Err(e)
        }
    }
}

/// PUT and PATCH: columns absent from the body keep their stored value.
pub async fn update(
    State(state): State<AppState>,
    Path((path_segment, id_str)): Path<(String, String)>,
    mut form: FormPayload,
) -> Result<impl IntoResponse, AppError> {
    let resource = lookup(&state, &path_segment)?;
    let id = parse_id(&id_str)?;
    let fields = std::mem::take(&mut form.fields).into_iter().collect();
    let mut body = RequestValidator::validate_partial(resource, fields)?;
    let stored = attach_file(&state, resource, &mut form, &mut body, false).await?;

    let (before, after) = match CrudService::update(&state.pool, resource, id, &body).await {
        Ok(Some(pair)) => pair,
        Ok(None) => {
            discard(&state, stored).await;
            return Err(AppError::NotFound(format!("{} {}", path_segment, id)));
        }
        Err(e) => {
            discard(&state, stored).await;
            return Err(e);
        }
    };

    // Replaced media goes only after the new row is committed.
    if let (Some(new), Some(old)) = (&stored, stored_key(resource, &before)) {
        if old != new.key {
            media::delete_quietly(state.media.as_ref(), &old).await;
        }
    }
    tracing::info!(resource = %path_segment, id, replaced_media = stored.is_some(), "updated");
    Ok(success_one_ok(present(after)))
}

pub async fn delete(
    State(state): State<AppState>,
    Path((path_segment, id_str)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let resource = lookup(&state, &path_segment)?;
    let id = parse_id(&id_str)?;
    let row = CrudService::delete(&state.pool, resource, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{} {}", path_segment, id)))?;
    if let Some(key) = stored_key(resource, &row) {
        media::delete_quietly(state.media.as_ref(), &key).await;
    }
    tracing::info!(resource = %path_segment, id, "deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct BulkDeleteRequest {
    pub ids: Vec<Value>,
}

#[derive(Serialize)]
pub struct BulkFailure {
    pub id: Value,
    pub reason: String,
}

#[derive(Serialize)]
pub struct BulkDeleteResult {
    pub deleted: Vec<i64>,
    pub failed: Vec<BulkFailure>,
}

fn bulk_id(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Delete each id on its own; one failure does not stop the rest.
pub async fn bulk_delete(
    State(state): State<AppState>,
    Path(path_segment): Path<String>,
    Json(req): Json<BulkDeleteRequest>,
) -> Result<impl IntoResponse, AppError> {
    let resource = lookup(&state, &path_segment)?;
    let mut result = BulkDeleteResult {
        deleted: Vec::new(),
        failed: Vec::new(),
    };
    for raw in req.ids {
        let Some(id) = bulk_id(&raw) else {
            result.failed.push(BulkFailure {
                id: raw,
                reason: "invalid id".into(),
            });
            continue;
        };
        match CrudService::delete(&state.pool, resource, id).await {
            Ok(Some(row)) => {
                if let Some(key) = stored_key(resource, &row) {
                    media::delete_quietly(state.media.as_ref(), &key).await;
                }
                result.deleted.push(id);
            }
            Ok(None) => result.failed.push(BulkFailure {
                id: raw,
                reason: "not found".into(),
            }),
            Err(e) => {
                tracing::warn!(resource = %path_segment, id, error = %e, "bulk delete item failed");
                result.failed.push(BulkFailure {
                    id: raw,
                    reason: "delete failed".into(),
                });
            }
        }
    }
    tracing::info!(
        resource = %path_segment,
        deleted = result.deleted.len(),
        failed = result.failed.len(),
        "bulk delete"
    );
    Ok(success_one_ok(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{builtin_catalog, resolve};
    use serde_json::json;

    #[test]
    fn ids_must_be_integers() {
        assert_eq!(parse_id(" 12 ").unwrap(), 12);
        assert!(matches!(parse_id("abc"), Err(AppError::BadRequest(_))));
        assert_eq!(bulk_id(&json!("7")), Some(7));
        assert_eq!(bulk_id(&json!(8)), Some(8));
        assert_eq!(bulk_id(&json!(null)), None);
    }

    #[test]
    fn media_key_read_from_slot_column() {
        let catalog = resolve(&builtin_catalog(), "public").unwrap();
        let galleries = catalog.resource_by_path("galleries").unwrap();
        let row = json!({ "id": 1, "image_url": "u", "image_key": "galleries/abc.png" });
        assert_eq!(stored_key(galleries, &row).as_deref(), Some("galleries/abc.png"));
        assert_eq!(stored_key(galleries, &json!({ "id": 1, "image_key": null })), None);
        let links = catalog.resource_by_path("links").unwrap();
        assert_eq!(stored_key(links, &row), None);
    }

    #[test]
    fn rows_presented_in_camel_case() {
        let row = present(json!({ "id": 1, "event_date": "2025-01-26", "image_url": null }));
        assert_eq!(row, json!({ "id": 1, "eventDate": "2025-01-26", "imageUrl": null }));
    }
}
