//! # API Error Types
//!
//! Maps domain errors to HTTP responses with the exact JSON shapes clients
//! depend on:
//!
//! - simple failures: `{"error": "..."}` with 401/403/404/500;
//! - publish failures: `{"errors": [{detail, source: {pointer}, code?, meta?}]}`
//!   with 409 (verification conflict), 422 (aggregated validation), 424
//!   (dependency not included), 403 (access), 500 (storage).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use pagekit_autosave::{ConflictKind, PublishError};

/// Application-level error for the simple (non-publish) failure paths.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (404).
    #[error("{0}")]
    NotFound(String),

    /// Missing or unresolvable credentials (401).
    #[error("{0}")]
    Unauthorized(String),

    /// Actor lacks a required permission, or the anti-forgery token is
    /// missing or invalid (403).
    #[error("{0}")]
    Forbidden(String),

    /// Internal failure (500). The message is logged, never returned.
    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let message = match &self {
            Self::Internal(_) => {
                tracing::error!(error = %self, "internal server error");
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(json!({"error": message}))).into_response()
    }
}

/// Wrapper mapping [`PublishError`] to its wire representation.
#[derive(Debug)]
pub struct PublishFailure(pub PublishError);

impl IntoResponse for PublishFailure {
    fn into_response(self) -> Response {
        match self.0 {
            PublishError::Conflict(conflicts) => {
                let errors: Vec<_> = conflicts
                    .iter()
                    .map(|c| {
                        let detail = match c.kind {
                            ConflictKind::UnexpectedItem => format!(
                                "The request contained an item that does not exist on the server: {}.",
                                c.key
                            ),
                            ConflictKind::UnmatchedItem => format!(
                                "The item {} has changed on the server since it was fetched.",
                                c.key
                            ),
                        };
                        let mut entry = json!({
                            "detail": detail,
                            "source": {"pointer": c.key.as_str()},
                            "code": c.kind.code(),
                        });
                        if let Some(meta) = &c.current {
                            entry["meta"] = json!({
                                "entity_type": meta.entity_type,
                                "entity_id": meta.entity_id,
                                "owner": meta.owner,
                                "label": meta.label,
                            });
                        }
                        entry
                    })
                    .collect();
                (StatusCode::CONFLICT, Json(json!({"errors": errors}))).into_response()
            }
            PublishError::Validation(violations) => {
                let errors: Vec<_> = violations
                    .iter()
                    .map(|v| {
                        json!({
                            "detail": v.detail,
                            "source": {"pointer": v.pointer},
                            "meta": {
                                "entity_type": v.entity_type,
                                "entity_id": v.entity_id,
                                "label": v.label,
                                "auto_save_key": v.auto_save_key.as_str(),
                            },
                        })
                    })
                    .collect();
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(json!({"errors": errors})),
                )
                    .into_response()
            }
            PublishError::DependencyNotIncluded(missing) => {
                let errors: Vec<_> = missing
                    .iter()
                    .map(|m| {
                        json!({
                            "detail": format!(
                                "{} has unpublished changes that {} depends on; include it in the publish request.",
                                m.label.clone().unwrap_or_else(|| m.requires.to_string()),
                                m.dependent
                            ),
                            "source": {"pointer": m.dependent.as_str()},
                            "code": "GlobalAssetNotPublished",
                            "meta": {"missing": m.requires.as_str()},
                        })
                    })
                    .collect();
                (
                    StatusCode::FAILED_DEPENDENCY,
                    Json(json!({"errors": errors})),
                )
                    .into_response()
            }
            PublishError::AccessDenied(message) => {
                (StatusCode::FORBIDDEN, Json(json!({"error": message}))).into_response()
            }
            PublishError::Storage(storage) => {
                tracing::error!(key = %storage.key, error = %storage, "publish commit failed");
                let errors = vec![json!({
                    "detail": "Publishing failed while saving an item; the batch was abandoned.",
                    "source": {"pointer": storage.key.as_str()},
                })];
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"errors": errors})),
                )
                    .into_response()
            }
        }
    }
}
