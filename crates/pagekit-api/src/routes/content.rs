//! # Published-Content Endpoint
//!
//! `DELETE /content/:entity_type/:entity_id` removes a published object and
//! triggers the draft cascade: stale drafts of the deleted object, in every
//! language and in every session, are discarded along with config drafts
//! that declared it as their target.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::delete;
use axum::{Json, Router};
use serde_json::json;

use pagekit_core::PUBLISH_PERMISSION;

use crate::auth::{actor_from_headers, require_csrf};
use crate::error::AppError;
use crate::state::AppState;

/// Build the content router.
pub fn router() -> Router<AppState> {
    Router::new().route("/content/:entity_type/:entity_id", delete(delete_content))
}

/// DELETE /content/:entity_type/:entity_id — delete a published object and
/// cascade the deletion to stale drafts across all sessions.
#[utoipa::path(
    delete,
    path = "/content/{entity_type}/{entity_id}",
    responses(
        (status = 200, description = "Object deleted; stale drafts discarded"),
        (status = 403, description = "Missing permission or anti-forgery token"),
        (status = 404, description = "No published object at these coordinates"),
    ),
    tag = "content"
)]
async fn delete_content(
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

    if !state.repository.remove(&entity_type, &entity_id) {
        return Err(AppError::NotFound(format!(
            "No published entity {entity_type}/{entity_id}."
        )));
    }
    let removed = state
        .sessions
        .cascade_published_deletion(&entity_type, &entity_id);
    tracing::info!(
        entity_type,
        entity_id,
        drafts_removed = removed,
        "published object deleted"
    );
    Ok((
        StatusCode::OK,
        Json(json!({
            "message": "Entity deleted.",
            "auto_saves_removed": removed,
        })),
    ))
}
