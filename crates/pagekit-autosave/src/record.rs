//! # Draft Records
//!
//! The stored shape of one in-progress edit, plus the form-violation sidecar
//! entries kept per component instance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use pagekit_core::{ActorContext, DraftKey, ObjectRef, SnapshotHash};

/// Display metadata of the identity that last saved a draft.
///
/// For anonymous sessions the `id` is the token-derived pseudo-id; the raw
/// session token never appears here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerInfo {
    /// Account id or anonymous pseudo-id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Optional avatar URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    /// Optional profile URI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
}

impl OwnerInfo {
    /// Capture owner metadata from the acting identity.
    pub fn from_actor(actor: &ActorContext) -> Self {
        Self {
            id: actor.identity.id().to_string(),
            name: actor.name.clone(),
            avatar: actor.avatar.clone(),
            uri: actor.uri.clone(),
        }
    }
}

/// One stored draft: at most one exists per [`DraftKey`] at any time.
///
/// The draft references its logical object by value ([`ObjectRef`]), never by
/// owning pointer; the live object is re-fetched through its loader whenever
/// it is needed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftRecord {
    /// The draft slot this record occupies.
    pub key: DraftKey,
    /// The logical object the draft shadows.
    pub object: ObjectRef,
    /// Human-readable label of the object at save time.
    pub label: String,
    /// The normalized snapshot of the pending edit.
    pub data: Value,
    /// Canonical hash of `data`.
    pub data_hash: SnapshotHash,
    /// When the draft was last written.
    pub updated: DateTime<Utc>,
    /// Who last wrote the draft (latest saver wins).
    pub owner: OwnerInfo,
    /// For configuration-like drafts: the published object this configuration
    /// targets. Deleting that target cascades to this draft.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_target: Option<ObjectRef>,
}

/// A single constraint violation recorded against a nested component
/// instance by an earlier failed save attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormViolation {
    /// Human-readable violation message.
    pub message: String,
    /// Machine-readable pointer to the offending property.
    pub property_path: String,
}
