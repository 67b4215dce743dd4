//! # Content Repository
//!
//! The authoritative, published side of the system: an in-memory store of
//! content entities, configuration-like objects, and reusable code
//! components. Implements the auto-save subsystem's collaborator traits —
//! object loading for saves, and validation/access/commit for publishing.
//!
//! Published records are shared across all editing sessions; drafts are not.

use std::collections::{BTreeMap, HashSet};

use parking_lot::RwLock;
use serde_json::Value;

use pagekit_autosave::{
    AutoSaveError, ConstraintViolation, DraftRecord, DraftTarget, ObjectAssessment,
    PublishBackend, StorageError,
};
use pagekit_core::{ActorContext, DraftKey, ObjectRef};

/// Permission required to change fields listed as protected on an object.
pub const EDIT_PROTECTED_PERMISSION: &str = "edit protected fields";

/// One published object and its publish-time rules.
#[derive(Debug, Clone, Default)]
pub struct StoredObject {
    /// Current label.
    pub label: String,
    /// Published snapshots: content objects keyed by langcode, config-like
    /// objects under `None`.
    pub variants: BTreeMap<Option<String>, Value>,
    /// For config-like objects: the published object this one targets.
    pub config_target: Option<ObjectRef>,
    /// Objects whose pending drafts must be published together with this one.
    pub depends_on: Vec<ObjectRef>,
    /// Fields that must be present and non-empty in any published snapshot.
    pub required_fields: Vec<String>,
    /// Fields only actors with [`EDIT_PROTECTED_PERMISSION`] may change.
    pub protected_fields: Vec<String>,
}

/// In-memory store of published objects.
#[derive(Default)]
pub struct ContentRepository {
    objects: RwLock<BTreeMap<(String, String), StoredObject>>,
    // Keys whose next commit is forced to fail, for exercising the
    // abandoned-batch path.
    fail_commit: RwLock<HashSet<(String, String)>>,
}

impl ContentRepository {
    /// An empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a published content object in one language.
    pub fn insert_content(
        &self,
        entity_type: &str,
        entity_id: &str,
        langcode: &str,
        label: &str,
        data: Value,
    ) {
        let mut objects = self.objects.write();
        let entry = objects
            .entry((entity_type.to_string(), entity_id.to_string()))
            .or_default();
        entry.label = label.to_string();
        entry.variants.insert(Some(langcode.to_string()), data);
    }

    /// Insert or replace a published config-like object (no language axis).
    pub fn insert_config(&self, entity_type: &str, entity_id: &str, label: &str, data: Value) {
        let mut objects = self.objects.write();
        let entry = objects
            .entry((entity_type.to_string(), entity_id.to_string()))
            .or_default();
        entry.label = label.to_string();
        entry.variants.insert(None, data);
    }

    /// Apply publish-time rules to an object.
    pub fn configure(&self, entity_type: &str, entity_id: &str, f: impl FnOnce(&mut StoredObject)) {
        let mut objects = self.objects.write();
        if let Some(entry) = objects.get_mut(&(entity_type.to_string(), entity_id.to_string())) {
            f(entry);
        }
    }

    /// Force the next commit of the given object to fail.
    pub fn fail_next_commit(&self, entity_type: &str, entity_id: &str) {
        self.fail_commit
            .write()
            .insert((entity_type.to_string(), entity_id.to_string()));
    }

    /// The published snapshot of an object variant, if present.
    pub fn published(
        &self,
        entity_type: &str,
        entity_id: &str,
        langcode: Option<&str>,
    ) -> Option<Value> {
        self.objects
            .read()
            .get(&(entity_type.to_string(), entity_id.to_string()))
            .and_then(|o| o.variants.get(&langcode.map(str::to_string)).cloned())
    }

    /// Whether a published object exists.
    pub fn exists(&self, entity_type: &str, entity_id: &str) -> bool {
        self.objects
            .read()
            .contains_key(&(entity_type.to_string(), entity_id.to_string()))
    }

    /// Delete a published object. Returns whether it existed. The caller is
    /// responsible for sweeping orphaned drafts across sessions.
    pub fn remove(&self, entity_type: &str, entity_id: &str) -> bool {
        self.objects
            .write()
            .remove(&(entity_type.to_string(), entity_id.to_string()))
            .is_some()
    }

    /// Build a save target for a candidate edit of an existing object.
    /// Returns `None` if no published object exists at those coordinates.
    pub fn save_target(&self, object: ObjectRef, candidate: Value) -> Option<RepositoryTarget> {
        let objects = self.objects.read();
        let stored = objects.get(&(object.entity_type.clone(), object.entity_id.clone()))?;
        let published = stored.variants.get(&object.langcode).cloned()?;
        Some(RepositoryTarget {
            object,
            label: stored.label.clone(),
            candidate,
            published,
            config_target: stored.config_target.clone(),
        })
    }
}

/// A live object loaded from the repository together with a candidate edit,
/// presented to the draft manager through [`DraftTarget`].
pub struct RepositoryTarget {
    object: ObjectRef,
    label: String,
    candidate: Value,
    published: Value,
    config_target: Option<ObjectRef>,
}

impl DraftTarget for RepositoryTarget {
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

    fn config_target(&self) -> Option<ObjectRef> {
        self.config_target.clone()
    }
}

/// Whether a field value counts as filled for required-field validation.
fn is_filled(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

impl PublishBackend for ContentRepository {
    fn label_of(&self, key: &DraftKey) -> Option<String> {
        let object = key.object_ref().ok()?;
        self.objects
            .read()
            .get(&(object.entity_type, object.entity_id))
            .map(|o| o.label.clone())
    }

    fn publish_dependencies(&self, record: &DraftRecord) -> Vec<DraftKey> {
        self.objects
            .read()
            .get(&(
                record.object.entity_type.clone(),
                record.object.entity_id.clone(),
            ))
            .map(|o| o.depends_on.iter().map(ObjectRef::draft_key).collect())
            .unwrap_or_default()
    }

    fn assess(&self, record: &DraftRecord, actor: &ActorContext) -> ObjectAssessment {
        let objects = self.objects.read();
        let Some(stored) = objects.get(&(
            record.object.entity_type.clone(),
            record.object.entity_id.clone(),
        )) else {
            return ObjectAssessment {
                violations: vec![ConstraintViolation {
                    detail: "The published object no longer exists.".to_string(),
                    pointer: String::new(),
                }],
                denied_fields: Vec::new(),
            };
        };

        let mut assessment = ObjectAssessment::clean();
        for field in &stored.required_fields {
            if !is_filled(record.data.get(field)) {
                assessment.violations.push(ConstraintViolation {
                    detail: format!("The '{field}' field is required."),
                    pointer: field.clone(),
                });
            }
        }

        if !stored.protected_fields.is_empty() && !actor.has_permission(EDIT_PROTECTED_PERMISSION)
        {
            let published = stored.variants.get(&record.object.langcode);
            for field in &stored.protected_fields {
                let draft_value = record.data.get(field);
                let published_value = published.and_then(|p| p.get(field));
                if draft_value != published_value {
                    assessment.denied_fields.push(field.clone());
                }
            }
        }
        assessment
    }

    fn commit(&self, record: &DraftRecord) -> Result<(), StorageError> {
        let coords = (
            record.object.entity_type.clone(),
            record.object.entity_id.clone(),
        );
        if self.fail_commit.write().remove(&coords) {
            return Err(StorageError {
                key: record.key.clone(),
                message: "forced commit failure".to_string(),
            });
        }
        let mut objects = self.objects.write();
        let Some(stored) = objects.get_mut(&coords) else {
            return Err(StorageError {
                key: record.key.clone(),
                message: "published object vanished before commit".to_string(),
            });
        };
        stored
            .variants
            .insert(record.object.langcode.clone(), record.data.clone());
        // A published label change takes effect immediately.
        if let Some(Value::String(label)) =
            record.data.get("label").or_else(|| record.data.get("title"))
        {
            stored.label = label.clone();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    use pagekit_autosave::OwnerInfo;
    use pagekit_core::SnapshotHash;

    fn draft(object: ObjectRef, data: Value) -> DraftRecord {
        DraftRecord {
            key: object.draft_key(),
            object,
            label: "Draft".to_string(),
            data_hash: SnapshotHash::of(&data).unwrap(),
            data,
            updated: Utc::now(),
            owner: OwnerInfo {
                id: "1".to_string(),
                name: "Ada".to_string(),
                avatar: None,
                uri: None,
            },
            config_target: None,
        }
    }

    fn actor() -> ActorContext {
        ActorContext::authenticated("1", "Ada", Vec::new())
    }

    #[test]
    fn save_target_loads_label_and_published_snapshot() {
        let repo = ContentRepository::new();
        repo.insert_content("page", "1", "en", "Home", json!({"title": "X"}));
        let target = repo
            .save_target(ObjectRef::content("page", "1", "en"), json!({"title": "Y"}))
            .unwrap();
        assert_eq!(target.label(), "Home");
        assert_eq!(target.published_snapshot().unwrap(), json!({"title": "X"}));
        assert_eq!(target.normalized_snapshot().unwrap(), json!({"title": "Y"}));
    }

    #[test]
    fn save_target_misses_unknown_language_variants() {
        let repo = ContentRepository::new();
        repo.insert_content("page", "1", "en", "Home", json!({"title": "X"}));
        assert!(repo
            .save_target(ObjectRef::content("page", "1", "fr"), json!({}))
            .is_none());
    }

    #[test]
    fn required_fields_are_enforced() {
        let repo = ContentRepository::new();
        repo.insert_content("page", "1", "en", "Home", json!({"title": "X"}));
        repo.configure("page", "1", |o| {
            o.required_fields = vec!["title".to_string()];
        });
        let record = draft(ObjectRef::content("page", "1", "en"), json!({"title": ""}));
        let assessment = repo.assess(&record, &actor());
        assert_eq!(assessment.violations.len(), 1);
        assert_eq!(assessment.violations[0].pointer, "title");
    }

    #[test]
    fn protected_field_changes_require_permission() {
        let repo = ContentRepository::new();
        repo.insert_content("page", "1", "en", "Home", json!({"title": "X", "path": "/home"}));
        repo.configure("page", "1", |o| {
            o.protected_fields = vec!["path".to_string()];
        });
        let record = draft(
            ObjectRef::content("page", "1", "en"),
            json!({"title": "Y", "path": "/new"}),
        );

        let assessment = repo.assess(&record, &actor());
        assert_eq!(assessment.denied_fields, vec!["path".to_string()]);

        let privileged =
            ActorContext::authenticated("2", "Root", vec![EDIT_PROTECTED_PERMISSION.to_string()]);
        assert!(repo.assess(&record, &privileged).is_clean());
    }

    #[test]
    fn unchanged_protected_fields_are_not_denied() {
        let repo = ContentRepository::new();
        repo.insert_content("page", "1", "en", "Home", json!({"title": "X", "path": "/home"}));
        repo.configure("page", "1", |o| {
            o.protected_fields = vec!["path".to_string()];
        });
        let record = draft(
            ObjectRef::content("page", "1", "en"),
            json!({"title": "Y", "path": "/home"}),
        );
        assert!(repo.assess(&record, &actor()).is_clean());
    }

    #[test]
    fn commit_replaces_the_published_variant() {
        let repo = ContentRepository::new();
        repo.insert_content("page", "1", "en", "Home", json!({"title": "X"}));
        let record = draft(ObjectRef::content("page", "1", "en"), json!({"title": "Y"}));
        repo.commit(&record).unwrap();
        assert_eq!(
            repo.published("page", "1", Some("en")).unwrap(),
            json!({"title": "Y"})
        );
        assert_eq!(repo.label_of(&record.key).unwrap(), "Y");
    }

    #[test]
    fn forced_commit_failure_is_one_shot() {
        let repo = ContentRepository::new();
        repo.insert_content("page", "1", "en", "Home", json!({"title": "X"}));
        repo.fail_next_commit("page", "1");
        let record = draft(ObjectRef::content("page", "1", "en"), json!({"title": "Y"}));
        assert!(repo.commit(&record).is_err());
        assert!(repo.commit(&record).is_ok());
    }

    #[test]
    fn dependencies_resolve_to_draft_keys() {
        let repo = ContentRepository::new();
        repo.insert_config("code_component", "hero", "Hero", json!({"source": "v1"}));
        repo.insert_config("global_asset", "fonts", "Fonts", json!({"css": "a"}));
        repo.configure("code_component", "hero", |o| {
            o.depends_on = vec![ObjectRef::config("global_asset", "fonts")];
        });
        let record = draft(ObjectRef::config("code_component", "hero"), json!({"source": "v2"}));
        let deps = repo.publish_dependencies(&record);
        assert_eq!(deps, vec![ObjectRef::config("global_asset", "fonts").draft_key()]);
    }
}
