//! # pagekit-api — HTTP Surface for the Auto-Save Stack
//!
//! Axum service exposing the draft/auto-save subsystem. Route handlers hold
//! no business logic — they delegate to `pagekit-autosave` and map domain
//! errors to structured HTTP responses.
//!
//! ## API Surface
//!
//! | Method | Path                                   | Module               |
//! |--------|----------------------------------------|----------------------|
//! | GET    | `/auto-save`                           | [`routes::autosave`] |
//! | PATCH  | `/auto-save/:entity_type/:entity_id`   | [`routes::autosave`] |
//! | DELETE | `/auto-save/:entity_type/:entity_id`   | [`routes::autosave`] |
//! | POST   | `/publish-all`                         | [`routes::publish`]  |
//! | DELETE | `/content/:entity_type/:entity_id`     | [`routes::content`]  |
//!
//! ## Request preconditions
//!
//! Mutating routes require the `X-CSRF-Token` header. The acting identity is
//! derived per request: `Authorization: Bearer <token>` resolves an account,
//! `X-Session-Token` derives an anonymous pseudo-identity. Draft stores are
//! scoped per acting identity.

pub mod auth;
pub mod error;
pub mod openapi;
pub mod repository;
pub mod routes;
pub mod state;

use axum::Router;
use tower_http::trace::TraceLayer;

pub use error::AppError;
pub use state::AppState;

/// Assemble the application router with all routes and middleware.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::autosave::router())
        .merge(routes::publish::router())
        .merge(routes::content::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
