//! # Collaborator Interfaces
//!
//! The auto-save subsystem operates only against these traits, never against
//! concrete object kinds. Content entities, configuration-like objects, and
//! reusable code components all present the same small capability set:
//! normalize to a snapshot, load the published snapshot, identify themselves,
//! and (on the publish path) declare dependencies, validate, and commit.

use serde_json::Value;

use pagekit_core::{ActorContext, DraftKey, ObjectRef};

use crate::error::AutoSaveError;
use crate::record::DraftRecord;

/// A live object that can be shadowed by a draft.
pub trait DraftTarget {
    /// The object's coordinates (type, id, optional sub-id, language).
    fn object_ref(&self) -> ObjectRef;

    /// Human-readable label at this point in time.
    fn label(&self) -> String;

    /// Normalize the live object into a plain serializable snapshot.
    fn normalized_snapshot(&self) -> Result<Value, AutoSaveError>;

    /// Load the current authoritative (published) snapshot of the same
    /// logical object.
    fn published_snapshot(&self) -> Result<Value, AutoSaveError>;

    /// For configuration-like objects: the published object this
    /// configuration targets. Deleting the target cascades to the draft.
    fn config_target(&self) -> Option<ObjectRef> {
        None
    }
}

/// One schema or field-level constraint failure found during publish
/// validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintViolation {
    /// Human-readable message.
    pub detail: String,
    /// Machine-readable pointer to the offending field or nested path.
    pub pointer: String,
}

/// The outcome of assessing one draft for publishing: constraint violations
/// and per-field access denials, collected rather than short-circuited.
#[derive(Debug, Clone, Default)]
pub struct ObjectAssessment {
    /// Constraint failures in the draft's stored data.
    pub violations: Vec<ConstraintViolation>,
    /// Fields the actor may not change, where the draft differs from the
    /// published value.
    pub denied_fields: Vec<String>,
}

impl ObjectAssessment {
    /// An assessment with no findings.
    pub fn clean() -> Self {
        Self::default()
    }

    /// Whether the draft may be committed as far as this assessment goes.
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty() && self.denied_fields.is_empty()
    }
}

/// A late, unexpected failure from the underlying storage layer while
/// committing a single object.
#[derive(Debug, Clone, thiserror::Error)]
#[error("storage failure committing {key}: {message}")]
pub struct StorageError {
    /// The draft whose commit raised.
    pub key: DraftKey,
    /// The underlying failure description.
    pub message: String,
}

/// The publish-side collaborator: validation, access control, dependency
/// declaration, and the final write into the authoritative record.
pub trait PublishBackend {
    /// Label of the published object behind a draft key, if it still exists.
    /// Used to echo current labels in conflict metadata.
    fn label_of(&self, key: &DraftKey) -> Option<String>;

    /// Draft keys this draft's object hard-depends on: if any of them has a
    /// pending draft, that draft must be published in the same batch.
    fn publish_dependencies(&self, record: &DraftRecord) -> Vec<DraftKey>;

    /// Validate the draft's stored data and the actor's right to write every
    /// field that differs from the published value. Collects all findings.
    fn assess(&self, record: &DraftRecord, actor: &ActorContext) -> ObjectAssessment;

    /// Persist the draft's data into the authoritative record.
    fn commit(&self, record: &DraftRecord) -> Result<(), StorageError>;
}
