//! # Publish Endpoint
//!
//! `POST /publish-all` takes the client's view of its drafts (key → content
//! hash) and publishes all of them atomically from the caller's perspective:
//! every item passes verification and validation before the first commit.

use std::collections::BTreeMap;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;

use pagekit_autosave::{PublishCoordinator, PublishRequest};
use pagekit_core::DraftKey;

use crate::auth::{actor_from_headers, require_csrf};
use crate::error::PublishFailure;
use crate::state::AppState;

/// The client's record of one draft it intends to publish.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PublishItem {
    /// Content hash the client last saw for this draft.
    pub data_hash: String,
}

/// Build the publish router.
pub fn router() -> Router<AppState> {
    Router::new().route("/publish-all", post(publish_all))
}

fn published_message(count: usize) -> String {
    if count == 1 {
        "Successfully published 1 item.".to_string()
    } else {
        format!("Successfully published {count} items.")
    }
}

/// POST /publish-all — publish every draft in the caller's session.
///
/// The request body must list exactly the drafts the session holds, each
/// with the content hash the client last saw. Any mismatch fails the whole
/// request before anything is committed.
#[utoipa::path(
    post,
    path = "/publish-all",
    responses(
        (status = 200, description = "All items published"),
        (status = 403, description = "Missing permission or anti-forgery token"),
        (status = 409, description = "Request out of sync with server drafts"),
        (status = 422, description = "Validation failed for one or more items"),
        (status = 424, description = "A required dependency is not being published"),
    ),
    tag = "publish"
)]
async fn publish_all(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<BTreeMap<String, PublishItem>>,
) -> Response {
    if let Err(err) = require_csrf(&state, &headers) {
        return err.into_response();
    }
    let actor = match actor_from_headers(&state, &headers) {
        Ok(actor) => actor,
        Err(err) => return err.into_response(),
    };

    let request = PublishRequest(
        body.into_iter()
            .map(|(key, item)| (DraftKey::from_wire(key), item.data_hash))
            .collect(),
    );

    let manager = state.sessions.manager_for(&actor);
    let coordinator = PublishCoordinator::new(&manager, state.repository.as_ref());
    match coordinator.publish(&request, &actor) {
        Ok(count) => Json(json!({"message": published_message(count)})).into_response(),
        Err(err) => PublishFailure(err).into_response(),
    }
}
