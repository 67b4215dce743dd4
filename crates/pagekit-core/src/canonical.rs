//! # Canonical Snapshot Hashing
//!
//! Produces a stable content fingerprint for an arbitrary nested snapshot.
//! Two snapshots that differ only in the ordering of map keys (at any
//! nesting level) hash identically; reordering list elements, or changing
//! any scalar leaf, changes the hash.
//!
//! Serialization uses RFC 8785 (JSON Canonicalization Scheme): sorted object
//! keys, compact separators, deterministic number rendering. The canonical
//! byte sequence is digested with SHA-256 and rendered as lowercase hex.
//!
//! The encoding is type-stable: `"1"` and `1` produce different bytes, and
//! `null` is distinct from `""`, `[]`, and `{}`.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::CoreError;

/// A canonical content fingerprint of a snapshot.
///
/// The only constructor is [`SnapshotHash::of()`], so every hash in the
/// system is guaranteed to have been produced through the canonicalization
/// pipeline. Client-supplied hashes received over the wire are compared via
/// [`SnapshotHash::matches()`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnapshotHash(String);

impl SnapshotHash {
    /// Compute the canonical hash of any serializable snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Canonicalization`] if the value cannot be
    /// serialized (e.g. a map with non-string keys at the serde level).
    pub fn of(snapshot: &impl Serialize) -> Result<Self, CoreError> {
        let bytes = canonical_bytes(snapshot)?;
        let digest = Sha256::digest(&bytes);
        let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
        Ok(Self(hex))
    }

    /// The hex-encoded digest string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compare against a client-supplied hash string.
    pub fn matches(&self, claimed: &str) -> bool {
        self.0 == claimed
    }
}

impl std::fmt::Display for SnapshotHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Serialize a snapshot in JCS-canonical form (RFC 8785).
///
/// Sorted keys at every nesting level, compact separators, UTF-8 output.
/// List ordering is preserved as given.
fn canonical_bytes(snapshot: &impl Serialize) -> Result<Vec<u8>, CoreError> {
    let s = serde_jcs::to_string(snapshot)?;
    Ok(s.into_bytes())
}
