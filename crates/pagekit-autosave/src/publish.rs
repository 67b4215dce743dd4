//! # Publish Coordinator
//!
//! Publishes a client-chosen subset of drafts as a single all-or-nothing
//! operation. Each attempt moves through the stages
//! `Received → Verified → Validated → Committed`, short-circuiting to a
//! structured rejection at the first failed gate:
//!
//! 1. **Verified** — the request's `{key → expected hash}` set must match
//!    server-side draft state exactly for the targeted subset.
//! 2. **Validated** — every draft is assessed by the [`PublishBackend`];
//!    failures are aggregated across all objects, never truncated.
//! 3. **Dependency gate** — a draft whose object hard-depends on another
//!    object with its own pending draft requires that draft in the batch.
//! 4. **Committed** — every object is persisted and every consumed draft
//!    (with its violations sidecar) removed.
//!
//! Atomicity is validate-then-commit within one process against one store,
//! not a distributed transaction: a late storage failure aborts the batch
//! and names the failing object, but objects committed earlier in the same
//! batch are not rolled back. That residue requires manual reconciliation;
//! validating fully first keeps the window small.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use pagekit_core::{ActorContext, DraftKey, PUBLISH_PERMISSION};

use crate::manager::AutoSaveManager;
use crate::record::OwnerInfo;
use crate::target::PublishBackend;

/// The client's belief about which drafts exist and their exact content
/// fingerprints: `{draft key → expected hash}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PublishRequest(pub BTreeMap<DraftKey, String>);

impl PublishRequest {
    /// Whether the request claims the given key.
    pub fn contains(&self, key: &DraftKey) -> bool {
        self.0.contains_key(key)
    }
}

/// Stages of one publish attempt, for tracing and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishStage {
    /// Request received, nothing checked yet.
    Received,
    /// Exact-match verification against server draft state passed.
    Verified,
    /// Every draft passed validation and access checks.
    Validated,
    /// All objects persisted and drafts consumed.
    Committed,
}

impl std::fmt::Display for PublishStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Received => "RECEIVED",
            Self::Verified => "VERIFIED",
            Self::Validated => "VALIDATED",
            Self::Committed => "COMMITTED",
        };
        f.write_str(s)
    }
}

/// How a request entry failed verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    /// The claimed key has no draft on the server.
    UnexpectedItem,
    /// The key exists but its hash differs from the claim.
    UnmatchedItem,
}

impl ConflictKind {
    /// Wire error code for this conflict.
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnexpectedItem => "UnexpectedItemInPublishRequest",
            Self::UnmatchedItem => "UnmatchedItemInPublishRequest",
        }
    }
}

/// One verification-gate failure.
#[derive(Debug, Clone)]
pub struct PublishConflict {
    /// What went wrong.
    pub kind: ConflictKind,
    /// The offending key.
    pub key: DraftKey,
    /// For unmatched items: what the server currently holds, so the client
    /// can show the author what changed underneath them.
    pub current: Option<ConflictMeta>,
}

/// Server-side identity of an unmatched draft.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictMeta {
    /// Object type of the draft's target.
    pub entity_type: String,
    /// Object id of the draft's target.
    pub entity_id: String,
    /// Current owner of the draft.
    pub owner: OwnerInfo,
    /// Current label of the draft.
    pub label: String,
}

/// One validation failure, carrying enough metadata for a UI to link
/// directly to the offending draft.
#[derive(Debug, Clone)]
pub struct PublishViolation {
    /// Human-readable message.
    pub detail: String,
    /// Field or nested path within the object.
    pub pointer: String,
    /// Object type.
    pub entity_type: String,
    /// Object id.
    pub entity_id: String,
    /// Current label.
    pub label: String,
    /// The draft this violation belongs to.
    pub auto_save_key: DraftKey,
}

/// A cross-object publish-ordering failure: a required dependency has a
/// pending draft that was not included in the batch.
#[derive(Debug, Clone)]
pub struct MissingDependency {
    /// The draft declaring the dependency.
    pub dependent: DraftKey,
    /// The dependency's draft slot that must be included.
    pub requires: DraftKey,
    /// Current label of the missing dependency, if known.
    pub label: Option<String>,
}

/// Why a publish attempt was rejected. Only [`PublishError::Storage`] can
/// leave committed residue; every other variant commits nothing.
#[derive(Error, Debug)]
pub enum PublishError {
    /// Verification-gate failure: stale or unexpected client state.
    /// Recoverable by re-fetching current draft state and retrying.
    #[error("publish request does not match current draft state ({} conflict(s))", .0.len())]
    Conflict(Vec<PublishConflict>),

    /// Aggregated schema/field constraint failures across all objects.
    #[error("{} draft(s) failed validation", .0.len())]
    Validation(Vec<PublishViolation>),

    /// A required dependency's draft exists but was not included.
    #[error("{} required dependency draft(s) not included", .0.len())]
    DependencyNotIncluded(Vec<MissingDependency>),

    /// The actor lacks the publish permission, or may not write a changed
    /// field. The summary names every affected object's current label.
    #[error("{0}")]
    AccessDenied(String),

    /// A late failure while committing. The batch is abandoned; the failing
    /// object is named; earlier commits are not rolled back.
    #[error(transparent)]
    Storage(#[from] crate::target::StorageError),
}

/// Coordinates one publish attempt over a session's drafts.
pub struct PublishCoordinator<'a> {
    manager: &'a AutoSaveManager,
    backend: &'a dyn PublishBackend,
}

impl<'a> PublishCoordinator<'a> {
    /// Bind a coordinator to a session's manager and the publish backend.
    pub fn new(manager: &'a AutoSaveManager, backend: &'a dyn PublishBackend) -> Self {
        Self { manager, backend }
    }

    /// Run the full validate-then-commit sequence. Returns the number of
    /// items published.
    pub fn publish(
        &self,
        request: &PublishRequest,
        actor: &ActorContext,
    ) -> Result<usize, PublishError> {
        let mut stage = PublishStage::Received;
        tracing::debug!(items = request.0.len(), %stage, "publish attempt started");

        if !actor.has_permission(PUBLISH_PERMISSION) {
            return Err(PublishError::AccessDenied(format!(
                "The '{PUBLISH_PERMISSION}' permission is required."
            )));
        }

        let drafts = self.manager.all();

        // Gate 1: exact-match verification. All mismatches are collected so
        // the client sees the full picture, but a single one aborts.
        let mut conflicts = Vec::new();
        for (key, claimed_hash) in &request.0 {
            match drafts.get(key) {
                None => conflicts.push(PublishConflict {
                    kind: ConflictKind::UnexpectedItem,
                    key: key.clone(),
                    current: None,
                }),
                Some(record) if !record.data_hash.matches(claimed_hash) => {
                    conflicts.push(PublishConflict {
                        kind: ConflictKind::UnmatchedItem,
                        key: key.clone(),
                        current: Some(ConflictMeta {
                            entity_type: record.object.entity_type.clone(),
                            entity_id: record.object.entity_id.clone(),
                            owner: record.owner.clone(),
                            label: record.label.clone(),
                        }),
                    });
                }
                Some(_) => {}
            }
        }
        if !conflicts.is_empty() {
            tracing::info!(conflicts = conflicts.len(), "publish rejected at verification");
            return Err(PublishError::Conflict(conflicts));
        }
        stage = PublishStage::Verified;
        tracing::debug!(%stage, "publish verification passed");

        // Gate 2: validate every draft, collecting every failure.
        let mut violations = Vec::new();
        let mut denied = Vec::new();
        for key in request.0.keys() {
            // Presence is guaranteed by the verification gate.
            let Some(record) = drafts.get(key) else {
                continue;
            };
            let assessment = self.backend.assess(record, actor);
            for v in assessment.violations {
                violations.push(PublishViolation {
                    detail: v.detail,
                    pointer: v.pointer,
                    entity_type: record.object.entity_type.clone(),
                    entity_id: record.object.entity_id.clone(),
                    label: record.label.clone(),
                    auto_save_key: key.clone(),
                });
            }
            for field in assessment.denied_fields {
                denied.push(format!(
                    "field '{field}' on '{label}'",
                    label = record.label
                ));
            }
        }
        if !denied.is_empty() {
            return Err(PublishError::AccessDenied(format!(
                "Not allowed to change {}.",
                denied.join(", ")
            )));
        }
        if !violations.is_empty() {
            tracing::info!(violations = violations.len(), "publish rejected at validation");
            return Err(PublishError::Validation(violations));
        }
        stage = PublishStage::Validated;
        tracing::debug!(%stage, "publish validation passed");

        // Gate 3: cross-object publish ordering. A dependency only gates the
        // batch when it has a pending draft of its own.
        let mut missing = Vec::new();
        for key in request.0.keys() {
            let Some(record) = drafts.get(key) else {
                continue;
            };
            for dependency in self.backend.publish_dependencies(record) {
                if drafts.contains_key(&dependency) && !request.contains(&dependency) {
                    missing.push(MissingDependency {
                        dependent: key.clone(),
                        requires: dependency.clone(),
                        label: self.backend.label_of(&dependency),
                    });
                }
            }
        }
        if !missing.is_empty() {
            tracing::info!(missing = missing.len(), "publish rejected: dependency not included");
            return Err(PublishError::DependencyNotIncluded(missing));
        }

        // Commit. Any storage error is fatal to the batch; earlier commits
        // stay (documented limitation), so the error names the failing key.
        let mut published = 0usize;
        for key in request.0.keys() {
            let Some(record) = drafts.get(key) else {
                continue;
            };
            self.backend.commit(record)?;
            self.manager.delete_key(key);
            published += 1;
        }
        stage = PublishStage::Committed;
        tracing::info!(%stage, published, "publish committed");
        Ok(published)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use parking_lot::Mutex;
    use serde_json::{json, Value};

    use pagekit_core::ObjectRef;

    use crate::error::AutoSaveError;
    use crate::record::DraftRecord;
    use crate::store::InMemoryDraftStore;
    use crate::target::{ConstraintViolation, DraftTarget, ObjectAssessment, StorageError};

    struct FakeTarget {
        object: ObjectRef,
        label: String,
        candidate: Value,
        published: Value,
    }

    impl DraftTarget for FakeTarget {
        fn object_ref(&self) -> ObjectRef {
            self.object.clone()
        }

        fn label(&self) -> String {
            self.label.clone()
        }

        fn normalized_snapshot(&self) -> Result<Value, AutoSaveError> {
            Ok(self.candidate.clone())
        }

        fn published_snapshot(&self) -> Result<Value, AutoSaveError> {
            Ok(self.published.clone())
        }
    }

    /// Backend double with scriptable violations, denials, dependencies, and
    /// commit failures.
    #[derive(Default)]
    struct FakeBackend {
        violations_for: Mutex<BTreeMap<DraftKey, Vec<ConstraintViolation>>>,
        denied_for: Mutex<BTreeMap<DraftKey, Vec<String>>>,
        dependencies: Mutex<BTreeMap<DraftKey, Vec<DraftKey>>>,
        fail_commit: Mutex<Option<DraftKey>>,
        committed: Mutex<Vec<DraftKey>>,
    }

    impl PublishBackend for FakeBackend {
        fn label_of(&self, key: &DraftKey) -> Option<String> {
            Some(format!("label of {key}"))
        }

        fn publish_dependencies(&self, record: &DraftRecord) -> Vec<DraftKey> {
            self.dependencies
                .lock()
                .get(&record.key)
                .cloned()
                .unwrap_or_default()
        }

        fn assess(&self, record: &DraftRecord, _actor: &ActorContext) -> ObjectAssessment {
            ObjectAssessment {
                violations: self
                    .violations_for
                    .lock()
                    .get(&record.key)
                    .cloned()
                    .unwrap_or_default(),
                denied_fields: self
                    .denied_for
                    .lock()
                    .get(&record.key)
                    .cloned()
                    .unwrap_or_default(),
            }
        }

        fn commit(&self, record: &DraftRecord) -> Result<(), StorageError> {
            if self.fail_commit.lock().as_ref() == Some(&record.key) {
                return Err(StorageError {
                    key: record.key.clone(),
                    message: "backing store write failed".to_string(),
                });
            }
            self.committed.lock().push(record.key.clone());
            Ok(())
        }
    }

    fn publisher() -> ActorContext {
        ActorContext::authenticated("7", "Ada", vec![PUBLISH_PERMISSION.to_string()])
    }

    fn manager() -> AutoSaveManager {
        AutoSaveManager::new(Arc::new(InMemoryDraftStore::new()))
    }

    fn save_page(m: &AutoSaveManager, id: &str) -> DraftKey {
        let target = FakeTarget {
            object: ObjectRef::content("page", id, "en"),
            label: format!("Page {id}"),
            candidate: json!({"title": format!("Draft {id}")}),
            published: json!({"title": format!("Live {id}")}),
        };
        m.save_entity(&target, &publisher()).unwrap();
        target.object_ref().draft_key()
    }

    fn save_config(m: &AutoSaveManager, entity_type: &str, id: &str) -> DraftKey {
        let target = FakeTarget {
            object: ObjectRef::config(entity_type, id),
            label: id.to_string(),
            candidate: json!({"v": 2}),
            published: json!({"v": 1}),
        };
        m.save_entity(&target, &publisher()).unwrap();
        target.object_ref().draft_key()
    }

    fn request_for(m: &AutoSaveManager, keys: &[&DraftKey]) -> PublishRequest {
        let drafts = m.all();
        PublishRequest(
            keys.iter()
                .map(|k| ((*k).clone(), drafts[*k].data_hash.as_str().to_string()))
                .collect(),
        )
    }

    #[test]
    fn publishing_without_permission_is_denied() {
        let m = manager();
        let key = save_page(&m, "1");
        let backend = FakeBackend::default();
        let coordinator = PublishCoordinator::new(&m, &backend);
        let request = request_for(&m, &[&key]);
        let no_permission = ActorContext::authenticated("9", "Eve", Vec::new());
        let err = coordinator.publish(&request, &no_permission).unwrap_err();
        assert!(matches!(err, PublishError::AccessDenied(_)));
        assert_eq!(m.all().len(), 1);
    }

    #[test]
    fn unknown_key_rejects_the_whole_request() {
        let m = manager();
        let key = save_page(&m, "1");
        let backend = FakeBackend::default();
        let coordinator = PublishCoordinator::new(&m, &backend);

        let mut request = request_for(&m, &[&key]);
        request
            .0
            .insert(DraftKey::from_wire("page:999:en"), "0".repeat(64));

        let err = coordinator.publish(&request, &publisher()).unwrap_err();
        match err {
            PublishError::Conflict(conflicts) => {
                assert_eq!(conflicts.len(), 1);
                assert_eq!(conflicts[0].kind, ConflictKind::UnexpectedItem);
                assert_eq!(conflicts[0].key.as_str(), "page:999:en");
            }
            other => panic!("expected Conflict, got: {other}"),
        }
        // Nothing committed, the valid draft remains.
        assert!(backend.committed.lock().is_empty());
        assert_eq!(m.all().len(), 1);
    }

    #[test]
    fn stale_hash_rejects_with_current_owner_and_label() {
        let m = manager();
        let key = save_page(&m, "1");
        let backend = FakeBackend::default();
        let coordinator = PublishCoordinator::new(&m, &backend);

        let mut request = PublishRequest::default();
        request.0.insert(key.clone(), "f".repeat(64));

        let err = coordinator.publish(&request, &publisher()).unwrap_err();
        match err {
            PublishError::Conflict(conflicts) => {
                assert_eq!(conflicts[0].kind, ConflictKind::UnmatchedItem);
                let meta = conflicts[0].current.as_ref().unwrap();
                assert_eq!(meta.entity_type, "page");
                assert_eq!(meta.entity_id, "1");
                assert_eq!(meta.label, "Page 1");
                assert_eq!(meta.owner.name, "Ada");
            }
            other => panic!("expected Conflict, got: {other}"),
        }
        assert!(backend.committed.lock().is_empty());
    }

    #[test]
    fn validation_is_all_or_nothing_and_aggregated() {
        let m = manager();
        let good = save_page(&m, "1");
        let bad = save_page(&m, "2");
        let backend = FakeBackend::default();
        backend.violations_for.lock().insert(
            bad.clone(),
            vec![
                ConstraintViolation {
                    detail: "Title must not be empty.".to_string(),
                    pointer: "title".to_string(),
                },
                ConstraintViolation {
                    detail: "Unknown component.".to_string(),
                    pointer: "layout.0.component".to_string(),
                },
            ],
        );
        let coordinator = PublishCoordinator::new(&m, &backend);
        let request = request_for(&m, &[&good, &bad]);

        let err = coordinator.publish(&request, &publisher()).unwrap_err();
        match err {
            PublishError::Validation(violations) => {
                assert_eq!(violations.len(), 2);
                assert!(violations.iter().all(|v| v.auto_save_key == bad));
                assert!(violations.iter().any(|v| v.pointer == "title"));
            }
            other => panic!("expected Validation, got: {other}"),
        }
        // Neither the good nor the bad draft was committed or consumed.
        assert!(backend.committed.lock().is_empty());
        assert_eq!(m.all().len(), 2);
    }

    #[test]
    fn field_access_denial_names_the_object() {
        let m = manager();
        let key = save_page(&m, "1");
        let backend = FakeBackend::default();
        backend
            .denied_for
            .lock()
            .insert(key.clone(), vec!["path_alias".to_string()]);
        let coordinator = PublishCoordinator::new(&m, &backend);
        let request = request_for(&m, &[&key]);

        let err = coordinator.publish(&request, &publisher()).unwrap_err();
        match err {
            PublishError::AccessDenied(message) => {
                assert!(message.contains("path_alias"));
                assert!(message.contains("Page 1"));
            }
            other => panic!("expected AccessDenied, got: {other}"),
        }
        assert_eq!(m.all().len(), 1);
    }

    #[test]
    fn excluded_dependency_draft_gates_the_batch() {
        let m = manager();
        let component = save_config(&m, "code_component", "hero");
        let asset = save_config(&m, "global_asset", "fonts");
        let backend = FakeBackend::default();
        backend
            .dependencies
            .lock()
            .insert(component.clone(), vec![asset.clone()]);
        let coordinator = PublishCoordinator::new(&m, &backend);

        let request = request_for(&m, &[&component]);
        let err = coordinator.publish(&request, &publisher()).unwrap_err();
        match err {
            PublishError::DependencyNotIncluded(missing) => {
                assert_eq!(missing.len(), 1);
                assert_eq!(missing[0].dependent, component);
                assert_eq!(missing[0].requires, asset);
            }
            other => panic!("expected DependencyNotIncluded, got: {other}"),
        }
        assert_eq!(m.all().len(), 2);
    }

    #[test]
    fn included_dependency_publishes_both() {
        let m = manager();
        let component = save_config(&m, "code_component", "hero");
        let asset = save_config(&m, "global_asset", "fonts");
        let backend = FakeBackend::default();
        backend
            .dependencies
            .lock()
            .insert(component.clone(), vec![asset.clone()]);
        let coordinator = PublishCoordinator::new(&m, &backend);

        let request = request_for(&m, &[&component, &asset]);
        let published = coordinator.publish(&request, &publisher()).unwrap();
        assert_eq!(published, 2);
        assert!(m.all().is_empty());
    }

    #[test]
    fn dependency_without_pending_draft_does_not_gate() {
        let m = manager();
        let component = save_config(&m, "code_component", "hero");
        let backend = FakeBackend::default();
        backend.dependencies.lock().insert(
            component.clone(),
            vec![ObjectRef::config("global_asset", "fonts").draft_key()],
        );
        let coordinator = PublishCoordinator::new(&m, &backend);

        let request = request_for(&m, &[&component]);
        assert_eq!(coordinator.publish(&request, &publisher()).unwrap(), 1);
    }

    #[test]
    fn subset_publish_leaves_other_drafts_alone() {
        let m = manager();
        let first = save_page(&m, "1");
        let _second = save_page(&m, "2");
        let backend = FakeBackend::default();
        let coordinator = PublishCoordinator::new(&m, &backend);

        let request = request_for(&m, &[&first]);
        assert_eq!(coordinator.publish(&request, &publisher()).unwrap(), 1);
        let remaining = m.all();
        assert_eq!(remaining.len(), 1);
        assert!(remaining.keys().next().unwrap().as_str().starts_with("page:2"));
    }

    #[test]
    fn storage_failure_aborts_and_names_the_object() {
        let m = manager();
        let a = save_page(&m, "1");
        let b = save_page(&m, "2");
        let backend = FakeBackend::default();
        backend.fail_commit.lock().replace(b.clone());
        let coordinator = PublishCoordinator::new(&m, &backend);

        let request = request_for(&m, &[&a, &b]);
        let err = coordinator.publish(&request, &publisher()).unwrap_err();
        match err {
            PublishError::Storage(storage) => assert_eq!(storage.key, b),
            other => panic!("expected Storage, got: {other}"),
        }
        // The failing draft was not consumed; the earlier commit is residue
        // that is not rolled back.
        let remaining = m.all();
        assert!(remaining.contains_key(&b));
        assert!(!remaining.contains_key(&a));
        assert_eq!(backend.committed.lock().as_slice(), &[a]);
    }

    #[test]
    fn publishing_consumes_violation_sidecars() {
        let m = manager();
        let key = save_page(&m, "1");
        m.save_component_violations(
            &key,
            "instance-1",
            vec![crate::record::FormViolation {
                message: "Required.".to_string(),
                property_path: "title".to_string(),
            }],
        );
        let backend = FakeBackend::default();
        let coordinator = PublishCoordinator::new(&m, &backend);
        let request = request_for(&m, &[&key]);
        coordinator.publish(&request, &publisher()).unwrap();
        assert!(m.component_violations("instance-1").is_empty());
    }
}
