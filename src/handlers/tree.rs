//! Tab family handlers. Saving a tab accepts the admin UI's multipart form: a `data` text
//! part with the tab JSON and one file part per new attachment, named by its temporary id.

use crate::config::ResolvedFamily;
use crate::error::AppError;
use crate::extractors::FormPayload;
use crate::handlers::resource::parse_id;
use crate::media::{self, MediaStore, UploadedFile};
use crate::response::{success_flagged, success_many, success_one_ok, Flagged};
use crate::service::{classify, ReceivedAttachment, SyncOutcome, SyncPlan, TabPayload, TabTarget, TreeService};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::Value;
use std::collections::HashMap;

/// Multipart text part holding the tab JSON.
pub const DATA_FIELD: &str = "data";

fn lookup<'a>(state: &'a AppState, key: &str) -> Result<&'a ResolvedFamily, AppError> {
    state
        .catalog
        .family(key)
        .ok_or_else(|| AppError::NotFound(format!("tab family '{}'", key)))
}

fn parse_payload(fields: &mut serde_json::Map<String, Value>) -> Result<TabPayload, AppError> {
    let parsed = match fields.remove(DATA_FIELD) {
        Some(Value::String(raw)) => serde_json::from_str(&raw),
        Some(nested) => serde_json::from_value(nested),
        None => serde_json::from_value(Value::Object(std::mem::take(fields))),
    };
    parsed.map_err(|e| AppError::BadRequest(format!("invalid tab payload: {}", e)))
}

/// Store every file part, keyed by its field name (the file's temporary id). On failure the
/// objects already stored are left behind and logged.
async fn upload_attachments(
    store: &dyn MediaStore,
    family: &ResolvedFamily,
    files: &[UploadedFile],
) -> Result<HashMap<String, ReceivedAttachment>, AppError> {
    let mut attachments: HashMap<String, ReceivedAttachment> = HashMap::with_capacity(files.len());
    let mut superseded = 0usize;
    for file in files {
        let stored = match media::upload(store, &family.profile, file).await {
            Ok(stored) => stored,
            Err(e) => {
                let orphaned = attachments.len() + superseded;
                if orphaned > 0 {
                    tracing::warn!(
                        family = %family.key,
                        orphaned,
                        field = %file.field_name,
                        "attachment upload failed; earlier uploads left in storage"
                    );
                }
                return Err(AppError::from(e).into_save_failure("attachment upload"));
            }
        };
        let received = ReceivedAttachment {
            url: stored.url,
            file_name: file.file_name.clone(),
        };
        if let Some(previous) = attachments.insert(file.field_name.clone(), received) {
            superseded += 1;
            tracing::warn!(
                family = %family.key,
                field = %file.field_name,
                url = %previous.url,
                "duplicate attachment field; earlier upload left in storage"
            );
        }
    }
    Ok(attachments)
}

async fn synchronize(
    state: &AppState,
    family_key: &str,
    path_id: Option<i64>,
    mut form: FormPayload,
) -> Result<(StatusCode, Json<Flagged<SyncOutcome>>), AppError> {
    let family = lookup(state, family_key)?;
    let payload = parse_payload(&mut form.fields)?;
    let target = match path_id {
        Some(id) => TabTarget::Update(id),
        None => classify(payload.id.as_ref(), payload.is_new)?,
    };

    // Uploads are not part of the transaction below.
    let attachments = upload_attachments(state.media.as_ref(), family, &form.files).await?;

    let plan = SyncPlan::build(payload, target, &attachments, chrono::Utc::now().date_naive())?;
    for (field, att) in &attachments {
        if !plan.matched_attachments.contains(field) {
            tracing::warn!(family = %family.key, field = %field, url = %att.url, "attachment not referenced by any file");
        }
    }

    let outcome = TreeService::apply(&state.pool, family, &plan).await.map_err(|e| {
        if !attachments.is_empty() {
            tracing::warn!(
                family = %family.key,
                orphaned = attachments.len(),
                "tab save failed after upload; media left in storage"
            );
        }
        e.into_save_failure("tab sync")
    })?;
    let status = if outcome.created { StatusCode::CREATED } else { StatusCode::OK };
    Ok(success_flagged(status, outcome))
}

pub async fn list(
    State(state): State<AppState>,
    Path(family_key): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let family = lookup(&state, &family_key)?;
    let tabs = TreeService::list(&state.pool, family).await?;
    Ok(success_many(tabs))
}

pub async fn read(
    State(state): State<AppState>,
    Path((family_key, id_str)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let family = lookup(&state, &family_key)?;
    let id = parse_id(&id_str)?;
    let tab = TreeService::read(&state.pool, family, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{} tab {}", family_key, id)))?;
    Ok(success_one_ok(tab))
}

/// POST: create or update, decided by the payload's id.
pub async fn save(
    State(state): State<AppState>,
    Path(family_key): Path<String>,
    form: FormPayload,
) -> Result<impl IntoResponse, AppError> {
    synchronize(&state, &family_key, None, form).await
}

/// PUT: always updates the tab named in the path.
pub async fn replace(
    State(state): State<AppState>,
    Path((family_key, id_str)): Path<(String, String)>,
    form: FormPayload,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id_str)?;
    synchronize(&state, &family_key, Some(id), form).await
}

pub async fn delete(
    State(state): State<AppState>,
    Path((family_key, id_str)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let family = lookup(&state, &family_key)?;
    let id = parse_id(&id_str)?;
    TreeService::delete(&state.pool, family, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
