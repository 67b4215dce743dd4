//! # Auto-Save Endpoints
//!
//! - `GET    /auto-save`                         — List the caller's drafts
//! - `PATCH  /auto-save/:entity_type/:entity_id` — Store/refresh a draft
//! - `DELETE /auto-save/:entity_type/:entity_id` — Discard an entity's drafts
//!
//! GET responses carry cache metadata in a `Cache-Tag` header: one tag per
//! draft's owning object plus the global `pagekit:auto-save` tag, which
//! changes meaning whenever any draft changes.

use std::collections::BTreeMap;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use utoipa::ToSchema;

use pagekit_autosave::DraftRecord;
use pagekit_core::{ObjectRef, PUBLISH_PERMISSION};

use crate::auth::{actor_from_headers, require_csrf};
use crate::error::AppError;
use crate::state::AppState;

/// Global cache-invalidation tag: changes whenever any draft changes.
pub const AUTO_SAVE_CACHE_TAG: &str = "pagekit:auto-save";

/// Owner metadata exposed on a listed draft.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OwnerDto {
    /// Account id or anonymous pseudo-id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Avatar URL, if any.
    pub avatar: Option<String>,
    /// Profile URI, if any.
    pub uri: Option<String>,
}

/// One listed draft.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AutoSaveEntry {
    /// Object type identifier.
    pub entity_type: String,
    /// Object identifier.
    pub entity_id: String,
    /// Language code; `null` for config-like objects.
    pub langcode: Option<String>,
    /// Who last saved the draft.
    pub owner: OwnerDto,
    /// Label at save time.
    pub label: String,
    /// Unix timestamp of the last save.
    pub updated: i64,
    /// Canonical content hash of the draft data.
    pub data_hash: String,
}

impl AutoSaveEntry {
    fn from_record(record: &DraftRecord) -> Self {
        Self {
            entity_type: record.object.entity_type.clone(),
            entity_id: record.object.entity_id.clone(),
            langcode: record.object.langcode.clone(),
            owner: OwnerDto {
                id: record.owner.id.clone(),
                name: record.owner.name.clone(),
                avatar: record.owner.avatar.clone(),
                uri: record.owner.uri.clone(),
            },
            label: record.label.clone(),
            updated: record.updated.timestamp(),
            data_hash: record.data_hash.as_str().to_string(),
        }
    }
}

/// Request body for storing a draft.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SaveDraftRequest {
    /// The candidate normalized snapshot.
    pub data: Value,
    /// Language of the edited variant; omit for config-like objects.
    #[serde(default)]
    pub langcode: Option<String>,
}

/// Build the auto-save router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auto-save", get(list_auto_saves))
        .route(
            "/auto-save/:entity_type/:entity_id",
            axum::routing::patch(save_draft).delete(delete_auto_save),
        )
}

/// GET /auto-save — every draft the caller's session holds.
#[utoipa::path(
    get,
    path = "/auto-save",
    responses(
        (status = 200, description = "Map of draft key to draft metadata"),
        (status = 401, description = "No credentials or session token"),
    ),
    tag = "auto-save"
)]
async fn list_auto_saves(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<(HeaderMap, Json<BTreeMap<String, AutoSaveEntry>>), AppError> {
    let actor = actor_from_headers(&state, &headers)?;
    let drafts = state.sessions.manager_for(&actor).all();

    let mut tags = vec![AUTO_SAVE_CACHE_TAG.to_string()];
    let mut body = BTreeMap::new();
    for (key, record) in &drafts {
        tags.push(format!(
            "{}:{}",
            record.object.entity_type, record.object.entity_id
        ));
        body.insert(key.as_str().to_string(), AutoSaveEntry::from_record(record));
    }
    tags.dedup();

    let mut response_headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(&tags.join(" ")) {
        response_headers.insert(HeaderName::from_static("cache-tag"), value);
    }
    Ok((response_headers, Json(body)))
}

/// PATCH /auto-save/:entity_type/:entity_id — store or refresh a draft.
///
/// Runs the change detector: a snapshot matching the published state removes
/// any existing draft instead of storing one.
#[utoipa::path(
    patch,
    path = "/auto-save/{entity_type}/{entity_id}",
    request_body = SaveDraftRequest,
    responses(
        (status = 200, description = "Draft state reconciled"),
        (status = 403, description = "Missing or invalid anti-forgery token"),
        (status = 404, description = "No published entity at these coordinates"),
    ),
    tag = "auto-save"
)]
async fn save_draft(
    State(state): State<AppState>,
    Path((entity_type, entity_id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(request): Json<SaveDraftRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    require_csrf(&state, &headers)?;
    let actor = actor_from_headers(&state, &headers)?;

    let object = match &request.langcode {
        Some(lang) => ObjectRef::content(&entity_type, &entity_id, lang),
        None => ObjectRef::config(&entity_type, &entity_id),
    };
    let target = state
        .repository
        .save_target(object, request.data)
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "No published entity {entity_type}/{entity_id} to draft against."
            ))
        })?;

    let manager = state.sessions.manager_for(&actor);
    manager
        .save_entity(&target, &actor)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(Json(json!({"message": "Auto-save data processed."})))
}

/// DELETE /auto-save/:entity_type/:entity_id — discard drafts of an entity
/// in every language, with their violation sidecars.
#[utoipa::path(
    delete,
    path = "/auto-save/{entity_type}/{entity_id}",
    responses(
        (status = 204, description = "Auto-save data deleted"),
        (status = 403, description = "Missing permission or anti-forgery token"),
        (status = 404, description = "No auto-save data for this entity"),
    ),
    tag = "auto-save"
)]
async fn delete_auto_save(
    State(state): State<AppState>,
    Path((entity_type, entity_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    require_csrf(&state, &headers)?;
    let actor = actor_from_headers(&state, &headers)?;
    if !actor.has_permission(PUBLISH_PERMISSION) {
        return Err(AppError::Forbidden(format!(
            "The '{PUBLISH_PERMISSION}' permission is required."
        )));
    }

    let manager = state.sessions.manager_for(&actor);
    let removed = manager.delete_record_drafts(&entity_type, &entity_id);
    if removed.is_empty() {
        return Err(AppError::NotFound(
            "No auto-save data found for this entity.".to_string(),
        ));
    }
    Ok((
        StatusCode::NO_CONTENT,
        Json(json!({"message": "Auto-save data deleted successfully."})),
    ))
}
