//! # Application State
//!
//! Shared state for the API: configuration, the published-content
//! repository, registered accounts, and the per-session draft stores.
//!
//! Draft stores are scoped per acting identity: each authenticated account
//! and each anonymous session gets its own [`InMemoryDraftStore`], created
//! on first use. The registry hands out [`AutoSaveManager`]s bound to those
//! stores; managers are cheap to construct per request.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use pagekit_autosave::{AutoSaveManager, InMemoryDraftStore};
use pagekit_core::ActorContext;

use crate::repository::ContentRepository;

/// A registered account resolvable from a bearer token.
#[derive(Debug, Clone)]
pub struct Account {
    /// Stable account id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Optional avatar URL.
    pub avatar: Option<String>,
    /// Optional profile URI.
    pub uri: Option<String>,
    /// Granted permission strings.
    pub permissions: Vec<String>,
}

/// API configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Expected value of the `X-CSRF-Token` header on mutating requests.
    pub csrf_token: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            csrf_token: std::env::var("PAGEKIT_CSRF_TOKEN")
                .unwrap_or_else(|_| "pagekit-csrf".to_string()),
        }
    }
}

/// Per-identity draft store registry.
#[derive(Default)]
pub struct SessionRegistry {
    stores: RwLock<HashMap<String, Arc<InMemoryDraftStore>>>,
}

impl SessionRegistry {
    /// The manager bound to this actor's session store, creating the store
    /// on first use.
    pub fn manager_for(&self, actor: &ActorContext) -> AutoSaveManager {
        let store = {
            let mut stores = self.stores.write();
            stores
                .entry(actor.identity.id().to_string())
                .or_insert_with(|| Arc::new(InMemoryDraftStore::new()))
                .clone()
        };
        AutoSaveManager::new(store)
    }

    /// Run the published-object-deletion cascade across every session.
    /// Returns the total number of drafts removed.
    pub fn cascade_published_deletion(&self, entity_type: &str, entity_id: &str) -> usize {
        let stores: Vec<Arc<InMemoryDraftStore>> =
            self.stores.read().values().cloned().collect();
        stores
            .into_iter()
            .map(|store| {
                AutoSaveManager::new(store).published_object_deleted(entity_type, entity_id)
            })
            .sum()
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// API configuration.
    pub config: Arc<ApiConfig>,
    /// Published content, shared across sessions.
    pub repository: Arc<ContentRepository>,
    /// Bearer token → account resolution.
    pub accounts: Arc<RwLock<HashMap<String, Account>>>,
    /// Per-identity draft stores.
    pub sessions: Arc<SessionRegistry>,
}

impl AppState {
    /// Fresh state with an empty repository and no accounts.
    pub fn new() -> Self {
        Self {
            config: Arc::new(ApiConfig::default()),
            repository: Arc::new(ContentRepository::new()),
            accounts: Arc::new(RwLock::new(HashMap::new())),
            sessions: Arc::new(SessionRegistry::default()),
        }
    }

    /// Register an account resolvable via `Authorization: Bearer <token>`.
    pub fn register_account(&self, token: &str, account: Account) {
        self.accounts.write().insert(token.to_string(), account);
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
