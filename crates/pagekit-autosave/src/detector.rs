//! # Change Detection
//!
//! Decides, from canonical hashes alone, whether a save needs a draft at all,
//! must update an existing one, or must remove one that has been edited back
//! to its published state. Because the hashes are order-insensitive over map
//! keys, clients that round-trip data through order-varying serialization
//! never trigger false-positive change detection.
//!
//! Published/enabled flags and labels are ordinary snapshot data here: a
//! change to them alone still produces Create/Update.

use pagekit_core::SnapshotHash;

/// The action a save must apply to the draft store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftAction {
    /// Nothing to do: the store already reflects this state.
    NoOp,
    /// The snapshot diverges from published and no draft exists yet.
    Create,
    /// The snapshot diverges from both published and the stored draft.
    Update,
    /// The snapshot matches published again; the stale draft must go.
    Delete,
}

/// Reconcile a candidate snapshot against the published snapshot and any
/// existing draft.
pub fn reconcile(
    candidate: &SnapshotHash,
    published: &SnapshotHash,
    existing_draft: Option<&SnapshotHash>,
) -> DraftAction {
    if candidate == published {
        // Edited back to the published state: a lingering draft is stale.
        if existing_draft.is_some() {
            DraftAction::Delete
        } else {
            DraftAction::NoOp
        }
    } else {
        match existing_draft {
            None => DraftAction::Create,
            // Idempotent re-save of identical content.
            Some(stored) if stored == candidate => DraftAction::NoOp,
            Some(_) => DraftAction::Update,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn hash(value: &serde_json::Value) -> SnapshotHash {
        SnapshotHash::of(value).unwrap()
    }

    #[test]
    fn divergent_snapshot_without_draft_creates() {
        let published = hash(&json!({"title": "X"}));
        let candidate = hash(&json!({"title": "Y"}));
        assert_eq!(reconcile(&candidate, &published, None), DraftAction::Create);
    }

    #[test]
    fn divergent_snapshot_with_stale_draft_updates() {
        let published = hash(&json!({"title": "X"}));
        let candidate = hash(&json!({"title": "Z"}));
        let stored = hash(&json!({"title": "Y"}));
        assert_eq!(
            reconcile(&candidate, &published, Some(&stored)),
            DraftAction::Update
        );
    }

    #[test]
    fn identical_resave_is_a_noop() {
        let published = hash(&json!({"title": "X"}));
        let candidate = hash(&json!({"title": "Y"}));
        assert_eq!(
            reconcile(&candidate, &published, Some(&candidate)),
            DraftAction::NoOp
        );
    }

    #[test]
    fn matching_published_without_draft_is_a_noop() {
        let published = hash(&json!({"title": "X"}));
        assert_eq!(reconcile(&published, &published, None), DraftAction::NoOp);
    }

    #[test]
    fn matching_published_with_draft_deletes_it() {
        let published = hash(&json!({"title": "X"}));
        let stored = hash(&json!({"title": "Y"}));
        assert_eq!(
            reconcile(&published, &published, Some(&stored)),
            DraftAction::Delete
        );
    }

    #[test]
    fn reordered_map_keys_do_not_diverge() {
        let published = hash(&json!({"title": "X", "status": true}));
        let candidate = hash(&json!({"status": true, "title": "X"}));
        assert_eq!(reconcile(&candidate, &published, None), DraftAction::NoOp);
    }

    #[test]
    fn status_flag_change_alone_still_creates() {
        let published = hash(&json!({"title": "X", "status": true}));
        let candidate = hash(&json!({"title": "X", "status": false}));
        assert_eq!(reconcile(&candidate, &published, None), DraftAction::Create);
    }
}
