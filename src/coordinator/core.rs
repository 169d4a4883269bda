//! The coordinator structure and its construction.

use crate::config::ImportConfig;
use crate::coordinator::builder::ImportCoordinatorBuilder;
use crate::events::AdminEventListener;
use crate::storage::StorageProvider;
use crate::strategy::StrategySet;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Runs partial imports against realms held by a [`StorageProvider`].
///
/// Every run validates the whole bundle before the first write and then
/// applies it inside one [`ImportTransaction`](crate::ImportTransaction), so
/// a realm either receives the complete bundle or is left untouched.
///
/// # Examples
///
/// ```rust
/// use realm_import::{ImportCoordinator, PartialImport};
/// use realm_import::resource::ClientRepresentation;
/// use realm_import::storage::InMemoryStorage;
///
/// # async fn example() {
/// let coordinator = ImportCoordinator::new(InMemoryStorage::new());
/// let bundle = PartialImport::new().with_client(ClientRepresentation::new("portal"));
///
/// let outcome = coordinator.import_bundle("acme", bundle).await;
/// assert!(outcome.is_applied());
/// # }
/// ```
pub struct ImportCoordinator<S> {
    pub(super) storage: S,
    pub(super) config: ImportConfig,
    pub(super) strategies: StrategySet,
    pub(super) listeners: Vec<Arc<dyn AdminEventListener>>,
    // realm -> lock held for the duration of a run; dropped once no run
    // holds or awaits it
    pub(super) realm_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl<S: StorageProvider> ImportCoordinator<S> {
    /// Create a coordinator with the default configuration and no listeners.
    pub fn new(storage: S) -> Self {
        Self::from_parts(storage, ImportConfig::default(), Vec::new())
    }

    pub fn builder(storage: S) -> ImportCoordinatorBuilder<S> {
        ImportCoordinatorBuilder::new(storage)
    }

    pub(super) fn from_parts(
        storage: S,
        config: ImportConfig,
        listeners: Vec<Arc<dyn AdminEventListener>>,
    ) -> Self {
        let strategies = StrategySet::new(&config);
        Self {
            storage,
            config,
            strategies,
            listeners,
            realm_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    pub(super) async fn realm_lock(&self, realm: &str) -> Arc<Mutex<()>> {
        let mut locks = self.realm_locks.lock().await;
        locks
            .entry(realm.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Hand back a lock taken with [`realm_lock`](Self::realm_lock) after the
    /// run has released its guard.
    pub(super) async fn release_realm_lock(&self, realm: &str, lock: Arc<Mutex<()>>) {
        let mut locks = self.realm_locks.lock().await;
        let idle = locks
            .get(realm)
            .is_some_and(|entry| Arc::ptr_eq(entry, &lock) && Arc::strong_count(&lock) == 2);
        drop(lock);
        if idle {
            locks.remove(realm);
        }
    }

    #[cfg(test)]
    pub(super) async fn tracked_realms(&self) -> usize {
        self.realm_locks.lock().await.len()
    }
}
