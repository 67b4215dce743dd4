//! # pagekit-core — Foundational Types for the Auto-Save Stack
//!
//! The leaf crate of the Pagekit auto-save workspace. Defines the pure,
//! dependency-free building blocks every other crate composes:
//!
//! 1. **Canonical snapshot hashing.** All content fingerprints flow through
//!    [`SnapshotHash::of()`], which serializes via RFC 8785 (JCS) so that
//!    map-key ordering never affects the digest while list ordering always
//!    does. No raw `serde_json::to_vec()` for fingerprints, ever.
//!
//! 2. **Draft key derivation.** [`DraftKey`] is an opaque newtype with
//!    deterministic constructors. Content objects carry a language segment;
//!    configuration-like objects omit it entirely rather than using a
//!    placeholder, so keys stay stable if language-awareness changes.
//!
//! 3. **Explicit actor context.** [`ActorContext`] replaces any ambient
//!    "current user" global. Anonymous sessions are represented by a
//!    pseudo-id derived from the session token; the raw token is never
//!    serialized.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `pagekit-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - All public types derive `Debug` and `Clone`.

pub mod actor;
pub mod canonical;
pub mod error;
pub mod key;

pub use actor::{ActorContext, ActorIdentity, PUBLISH_PERMISSION};
pub use canonical::SnapshotHash;
pub use error::CoreError;
pub use key::{DraftKey, ObjectRef};
