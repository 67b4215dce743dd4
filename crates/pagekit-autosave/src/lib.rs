//! # pagekit-autosave — Draft Store and Publish Coordination
//!
//! The auto-save subsystem of the Pagekit page builder. Authors continuously
//! mutate in-memory representations of pages, regions, reusable code
//! components, and staged configuration; none of those mutations touch the
//! live, published record until an explicit publish. This crate durably
//! stashes the in-progress edits, detects no-op saves, detects stale clients
//! at publish time, and publishes an arbitrary subset of drafts as a single
//! all-or-nothing operation.
//!
//! ## Layering
//!
//! - [`store`] — session-scoped draft store (trait + in-memory impl).
//! - [`detector`] — pure change detection over canonical hashes.
//! - [`target`] — traits for the external collaborators (object loading,
//!   validation, access control, committing).
//! - [`manager`] — the draft manager composing the above.
//! - [`publish`] — the validate-then-commit publish coordinator.
//!
//! ## Concurrency model
//!
//! Single-request, synchronous. The store is per-session, so two editors
//! never contend; within a session the in-memory store serializes access per
//! operation with last-write-wins semantics.

pub mod detector;
pub mod error;
pub mod manager;
pub mod publish;
pub mod record;
pub mod store;
pub mod target;

pub use detector::{reconcile, DraftAction};
pub use error::AutoSaveError;
pub use manager::{AutoSaveManager, AutoSaveSlot};
pub use publish::{
    ConflictKind, ConflictMeta, MissingDependency, PublishConflict, PublishCoordinator,
    PublishError, PublishRequest, PublishStage, PublishViolation,
};
pub use record::{DraftRecord, FormViolation, OwnerInfo};
pub use store::{DraftStore, InMemoryDraftStore};
pub use target::{ConstraintViolation, DraftTarget, ObjectAssessment, PublishBackend, StorageError};
