//! # Draft Manager
//!
//! Orchestrates the draft store, change detector, canonical hasher, and the
//! external normalizer behind [`DraftTarget`]. Holds no state of its own
//! beyond the injected store, so it is safe to construct fresh per request as
//! long as it is bound to the same underlying store.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;

use pagekit_core::{ActorContext, DraftKey, SnapshotHash};

use crate::detector::{reconcile, DraftAction};
use crate::error::AutoSaveError;
use crate::record::{DraftRecord, FormViolation, OwnerInfo};
use crate::store::DraftStore;
use crate::target::DraftTarget;

/// The draft slot for one object: either empty or holding a record.
///
/// Callers chain on [`AutoSaveSlot::is_empty()`] rather than null-checking.
#[derive(Debug, Clone)]
pub enum AutoSaveSlot {
    /// No draft exists for the object.
    Empty,
    /// A draft exists.
    Draft(DraftRecord),
}

impl AutoSaveSlot {
    /// Whether the slot holds no draft.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// The record, if the slot is occupied.
    pub fn record(&self) -> Option<&DraftRecord> {
        match self {
            Self::Empty => None,
            Self::Draft(record) => Some(record),
        }
    }

    /// Consume the slot into its record.
    pub fn into_record(self) -> Option<DraftRecord> {
        match self {
            Self::Empty => None,
            Self::Draft(record) => Some(record),
        }
    }
}

/// Session-bound orchestrator for draft state.
#[derive(Clone)]
pub struct AutoSaveManager {
    store: Arc<dyn DraftStore>,
}

impl AutoSaveManager {
    /// Bind a manager to a session's store.
    pub fn new(store: Arc<dyn DraftStore>) -> Self {
        Self { store }
    }

    /// Save the object's current state as a draft if — and only if — it
    /// diverges from the published snapshot. Re-saving identical content
    /// never creates or churns records, and editing an object back to its
    /// published state removes its draft.
    ///
    /// Returns the action that was applied.
    pub fn save_entity(
        &self,
        target: &dyn DraftTarget,
        actor: &ActorContext,
    ) -> Result<DraftAction, AutoSaveError> {
        let object = target.object_ref();
        let key = object.draft_key();
        let candidate = target.normalized_snapshot()?;
        let published = target.published_snapshot()?;
        let candidate_hash = SnapshotHash::of(&candidate)?;
        let published_hash = SnapshotHash::of(&published)?;
        let existing = self.store.get(&key);

        let action = reconcile(
            &candidate_hash,
            &published_hash,
            existing.as_ref().map(|d| &d.data_hash),
        );
        match action {
            DraftAction::NoOp => {}
            DraftAction::Delete => {
                self.store.delete(&key);
                self.store.clear_violations_for(&key);
                tracing::debug!(key = %key, "draft matches published state again, removed");
            }
            DraftAction::Create | DraftAction::Update => {
                self.store.put(DraftRecord {
                    key: key.clone(),
                    object,
                    label: target.label(),
                    data: candidate,
                    data_hash: candidate_hash,
                    updated: Utc::now(),
                    owner: OwnerInfo::from_actor(actor),
                    config_target: target.config_target(),
                });
                tracing::debug!(key = %key, ?action, "draft written");
            }
        }
        Ok(action)
    }

    /// The draft slot for an object.
    pub fn get_auto_save_entity(&self, target: &dyn DraftTarget) -> AutoSaveSlot {
        self.slot(&target.object_ref().draft_key())
    }

    /// The draft slot for a key.
    pub fn slot(&self, key: &DraftKey) -> AutoSaveSlot {
        match self.store.get(key) {
            Some(record) => AutoSaveSlot::Draft(record),
            None => AutoSaveSlot::Empty,
        }
    }

    /// Discard the object's draft and its violations sidecar. Idempotent.
    pub fn delete(&self, target: &dyn DraftTarget) {
        self.delete_key(&target.object_ref().draft_key());
    }

    /// Discard the draft in the given slot and its violations sidecar.
    /// Idempotent.
    pub fn delete_key(&self, key: &DraftKey) {
        if self.store.delete(key) {
            tracing::debug!(key = %key, "draft discarded");
        }
        self.store.clear_violations_for(key);
    }

    /// Every draft in the session, keyed by slot. Serves both the
    /// list-my-drafts read and the candidate pool for publishing.
    pub fn all(&self) -> BTreeMap<DraftKey, DraftRecord> {
        self.store.list()
    }

    /// Sweep drafts orphaned by the deletion of a published object: drafts
    /// of the object itself (every language and sub-object), and
    /// configuration drafts whose declared target it was. Dependency
    /// relationships do not cascade — only the direct target relationship is
    /// authoritative.
    ///
    /// Returns the number of drafts removed.
    pub fn published_object_deleted(&self, entity_type: &str, entity_id: &str) -> usize {
        let doomed: Vec<DraftKey> = self
            .store
            .list()
            .into_iter()
            .filter(|(_, record)| {
                record.object.same_record(entity_type, entity_id)
                    || record
                        .config_target
                        .as_ref()
                        .is_some_and(|t| t.same_record(entity_type, entity_id))
            })
            .map(|(key, _)| key)
            .collect();
        for key in &doomed {
            self.delete_key(key);
        }
        if !doomed.is_empty() {
            tracing::info!(
                entity_type,
                entity_id,
                removed = doomed.len(),
                "cascaded draft removal after published object deletion"
            );
        }
        doomed.len()
    }

    /// Stored form violations for a nested component instance.
    pub fn component_violations(&self, instance_id: &str) -> Vec<FormViolation> {
        self.store.violations(instance_id)
    }

    /// Record form violations for a nested component instance, owned by the
    /// draft in `owner`. The entry is cleared when that draft is deleted.
    pub fn save_component_violations(
        &self,
        owner: &DraftKey,
        instance_id: &str,
        violations: Vec<FormViolation>,
    ) {
        self.store.put_violations(owner, instance_id, violations);
    }

    /// Remove drafts of the given published record in every language and for
    /// every sub-object. Returns the removed slots.
    pub fn delete_record_drafts(&self, entity_type: &str, entity_id: &str) -> Vec<DraftKey> {
        let doomed: Vec<DraftKey> = self
            .store
            .list()
            .into_iter()
            .filter(|(_, record)| record.object.same_record(entity_type, entity_id))
            .map(|(key, _)| key)
            .collect();
        for key in &doomed {
            self.delete_key(key);
        }
        doomed
    }
}
