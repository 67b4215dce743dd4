//! # Draft Keys and Object References
//!
//! A [`DraftKey`] identifies "the draft slot for this logical object" within
//! one editing session. Keys are pure functions of the object's coordinates:
//!
//! - content objects: `{entity_type}:{entity_id}[.{sub_id}]:{langcode}`
//! - config-like objects (no language axis): `{entity_type}:{entity_id}`
//!
//! The language segment is omitted entirely for config objects rather than
//! filled with a placeholder, so keys stay stable as language-awareness is
//! added to or removed from an object type over time.
//!
//! An [`ObjectRef`] is the value-typed reference a draft keeps to the live
//! object it shadows. Drafts never hold an owning pointer to the live object;
//! the live object is always re-fetched through its loader when needed.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Value-typed reference to a logical object: type, id, optional sub-id,
/// optional language.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectRef {
    /// Object type identifier (e.g. `page`, `pattern`, `code_component`).
    pub entity_type: String,
    /// Object identifier within its type.
    pub entity_id: String,
    /// Optional sub-object identifier (e.g. a region within a page).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_id: Option<String>,
    /// Language code for translatable content; `None` for config-like objects.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub langcode: Option<String>,
}

impl ObjectRef {
    /// Reference to a translatable content object.
    pub fn content(entity_type: &str, entity_id: &str, langcode: &str) -> Self {
        Self {
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            sub_id: None,
            langcode: Some(langcode.to_string()),
        }
    }

    /// Reference to a sub-object of a translatable content object.
    pub fn content_sub(entity_type: &str, entity_id: &str, sub_id: &str, langcode: &str) -> Self {
        Self {
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            sub_id: Some(sub_id.to_string()),
            langcode: Some(langcode.to_string()),
        }
    }

    /// Reference to a configuration-like object with no language axis.
    pub fn config(entity_type: &str, entity_id: &str) -> Self {
        Self {
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            sub_id: None,
            langcode: None,
        }
    }

    /// Derive the draft key for this object.
    pub fn draft_key(&self) -> DraftKey {
        DraftKey::for_ref(self)
    }

    /// Whether this reference points at the same published record as `other`,
    /// ignoring sub-object and language coordinates. Used by the cascade
    /// sweep: deleting a published object invalidates drafts in every
    /// language and for every sub-object.
    pub fn same_record(&self, entity_type: &str, entity_id: &str) -> bool {
        self.entity_type == entity_type && self.entity_id == entity_id
    }
}

/// Opaque, deterministic identifier for a draft slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DraftKey(String);

impl DraftKey {
    /// Derive the key for an [`ObjectRef`]. Pure and total: no clock, no
    /// randomness, no mutable state.
    pub fn for_ref(object: &ObjectRef) -> Self {
        let mut key = String::with_capacity(
            object.entity_type.len() + object.entity_id.len() + 16,
        );
        key.push_str(&object.entity_type);
        key.push(':');
        key.push_str(&object.entity_id);
        if let Some(sub) = &object.sub_id {
            key.push('.');
            key.push_str(sub);
        }
        if let Some(lang) = &object.langcode {
            key.push(':');
            key.push_str(lang);
        }
        Self(key)
    }

    /// Wrap a wire-format key string without validation. Used for keys
    /// received in publish requests, which are matched verbatim against
    /// server-side keys rather than parsed.
    pub fn from_wire(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The key string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Recover the object coordinates encoded in this key.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MalformedKey`] if the string has no `type:id`
    /// prefix.
    pub fn object_ref(&self) -> Result<ObjectRef, CoreError> {
        let mut segments = self.0.splitn(3, ':');
        let entity_type = segments
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| CoreError::MalformedKey(self.0.clone()))?;
        let id_segment = segments
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| CoreError::MalformedKey(self.0.clone()))?;
        let langcode = segments.next().map(str::to_string);
        let (entity_id, sub_id) = match id_segment.split_once('.') {
            Some((id, sub)) => (id.to_string(), Some(sub.to_string())),
            None => (id_segment.to_string(), None),
        };
        Ok(ObjectRef {
            entity_type: entity_type.to_string(),
            entity_id,
            sub_id,
            langcode,
        })
    }
}

impl std::fmt::Display for DraftKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
