//! # Session-Scoped Draft Store
//!
//! One store per editing session (one authenticated account or one anonymous
//! session). The store is handed to the [`crate::AutoSaveManager`] at
//! construction — an explicit dependency, never a module-level global.
//!
//! Writes are immediately visible to subsequent reads within the session;
//! there is no write-behind caching that could reorder with the change
//! detector's read-then-decide logic.

use std::collections::{BTreeMap, HashMap};

use parking_lot::RwLock;

use pagekit_core::DraftKey;

use crate::record::{DraftRecord, FormViolation};

/// The associative store backing one editing session.
pub trait DraftStore: Send + Sync {
    /// Fetch the draft in the given slot, if any.
    fn get(&self, key: &DraftKey) -> Option<DraftRecord>;

    /// Create or replace the draft in its slot.
    fn put(&self, record: DraftRecord);

    /// Remove a draft. Returns whether a draft was present.
    fn delete(&self, key: &DraftKey) -> bool;

    /// All drafts in the session, keyed by slot.
    fn list(&self) -> BTreeMap<DraftKey, DraftRecord>;

    /// Stored form violations for a component instance.
    fn violations(&self, instance_id: &str) -> Vec<FormViolation>;

    /// Record form violations for a component instance, owned by the draft
    /// in `owner`. Replaces any previous entry for the instance.
    fn put_violations(&self, owner: &DraftKey, instance_id: &str, violations: Vec<FormViolation>);

    /// Drop every violations entry owned by the given draft.
    fn clear_violations_for(&self, owner: &DraftKey);
}

struct ViolationsEntry {
    owner: DraftKey,
    violations: Vec<FormViolation>,
}

/// In-memory [`DraftStore`] over `parking_lot` locks.
#[derive(Default)]
pub struct InMemoryDraftStore {
    drafts: RwLock<BTreeMap<DraftKey, DraftRecord>>,
    violations: RwLock<HashMap<String, ViolationsEntry>>,
}

impl InMemoryDraftStore {
    /// An empty session store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl DraftStore for InMemoryDraftStore {
    fn get(&self, key: &DraftKey) -> Option<DraftRecord> {
        self.drafts.read().get(key).cloned()
    }

    fn put(&self, record: DraftRecord) {
        self.drafts.write().insert(record.key.clone(), record);
    }

    fn delete(&self, key: &DraftKey) -> bool {
        self.drafts.write().remove(key).is_some()
    }

    fn list(&self) -> BTreeMap<DraftKey, DraftRecord> {
        self.drafts.read().clone()
    }

    fn violations(&self, instance_id: &str) -> Vec<FormViolation> {
        self.violations
            .read()
            .get(instance_id)
            .map(|entry| entry.violations.clone())
            .unwrap_or_default()
    }

    fn put_violations(&self, owner: &DraftKey, instance_id: &str, violations: Vec<FormViolation>) {
        self.violations.write().insert(
            instance_id.to_string(),
            ViolationsEntry {
                owner: owner.clone(),
                violations,
            },
        );
    }

    fn clear_violations_for(&self, owner: &DraftKey) {
        self.violations.write().retain(|_, entry| entry.owner != *owner);
    }
}
