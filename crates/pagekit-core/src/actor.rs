//! # Actor Context
//!
//! The identity performing an operation, passed explicitly through every
//! public operation of the stack. There is no process-wide "current user":
//! tests and concurrent request handling never share hidden state.
//!
//! Anonymous sessions are represented by a pseudo-id derived from the session
//! token with SHA-256. The raw token never appears in any serialized form, so
//! draft ownership metadata can be returned to clients without leaking
//! another visitor's session.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Permission required to publish or discard auto-save data.
pub const PUBLISH_PERMISSION: &str = "publish auto-saves";

/// Who is acting: an authenticated account or an anonymous session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ActorIdentity {
    /// An authenticated account, identified by its account id.
    Authenticated(String),
    /// An anonymous session, identified by a token-derived pseudo-id.
    Anonymous(String),
}

impl ActorIdentity {
    /// Derive an anonymous identity from a session token.
    ///
    /// The pseudo-id is the first 16 hex characters of SHA-256 over the
    /// token, prefixed with `anon:`. The token itself is discarded.
    pub fn anonymous_from_token(token: &str) -> Self {
        let digest = Sha256::digest(token.as_bytes());
        let hex: String = digest.iter().take(8).map(|b| format!("{b:02x}")).collect();
        Self::Anonymous(format!("anon:{hex}"))
    }

    /// The stable identifier string: account id or pseudo-id.
    pub fn id(&self) -> &str {
        match self {
            Self::Authenticated(id) | Self::Anonymous(id) => id,
        }
    }

    /// Whether this is an anonymous session identity.
    pub fn is_anonymous(&self) -> bool {
        matches!(self, Self::Anonymous(_))
    }
}

/// The full context of the acting identity for one operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorContext {
    /// The acting identity.
    pub identity: ActorIdentity,
    /// Display name shown next to drafts this actor owns.
    pub name: String,
    /// Optional avatar URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    /// Optional profile URI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    /// Granted permission strings.
    pub permissions: BTreeSet<String>,
}

impl ActorContext {
    /// An authenticated actor with the given account id, name, and permissions.
    pub fn authenticated<I>(id: &str, name: &str, permissions: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        Self {
            identity: ActorIdentity::Authenticated(id.to_string()),
            name: name.to_string(),
            avatar: None,
            uri: None,
            permissions: permissions.into_iter().collect(),
        }
    }

    /// An anonymous actor derived from a session token, with no permissions.
    pub fn anonymous(token: &str) -> Self {
        Self {
            identity: ActorIdentity::anonymous_from_token(token),
            name: "Anonymous".to_string(),
            avatar: None,
            uri: None,
            permissions: BTreeSet::new(),
        }
    }

    /// Whether the actor holds the given permission.
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_pseudo_id_is_stable_per_token() {
        let a = ActorIdentity::anonymous_from_token("session-token-1");
        let b = ActorIdentity::anonymous_from_token("session-token-1");
        assert_eq!(a, b);
    }

    #[test]
    fn distinct_tokens_get_distinct_pseudo_ids() {
        let a = ActorIdentity::anonymous_from_token("session-token-1");
        let b = ActorIdentity::anonymous_from_token("session-token-2");
        assert_ne!(a, b);
    }

    #[test]
    fn pseudo_id_does_not_contain_the_token() {
        let identity = ActorIdentity::anonymous_from_token("super-secret-token");
        assert!(!identity.id().contains("super-secret-token"));
        assert!(identity.id().starts_with("anon:"));
    }

    #[test]
    fn serialized_actor_never_contains_the_token() {
        let actor = ActorContext::anonymous("super-secret-token");
        let json = serde_json::to_string(&actor).unwrap();
        assert!(!json.contains("super-secret-token"));
    }

    #[test]
    fn permission_check() {
        let actor = ActorContext::authenticated("7", "Ada", vec![PUBLISH_PERMISSION.to_string()]);
        assert!(actor.has_permission(PUBLISH_PERMISSION));
        assert!(!actor.has_permission("administer site"));
    }

    #[test]
    fn anonymous_actor_has_no_permissions() {
        let actor = ActorContext::anonymous("t");
        assert!(!actor.has_permission(PUBLISH_PERMISSION));
        assert!(actor.identity.is_anonymous());
    }
}
