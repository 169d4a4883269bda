//! Builder for configuring [`ImportCoordinator`] instances.

use crate::config::ImportConfig;
use crate::coordinator::ImportCoordinator;
use crate::error::ImportResult;
use crate::events::AdminEventListener;
use crate::storage::StorageProvider;
use std::sync::Arc;

/// Builder for [`ImportCoordinator`].
///
/// ```rust
/// use realm_import::{ImportConfig, ImportCoordinator, LoggingEventListener};
/// use realm_import::storage::InMemoryStorage;
///
/// let coordinator = ImportCoordinator::builder(InMemoryStorage::new())
///     .with_config(ImportConfig::default().with_max_bundle_items(1000))
///     .with_listener(LoggingEventListener)
///     .build()
///     .unwrap();
/// assert_eq!(coordinator.config().max_bundle_items, Some(1000));
/// ```
pub struct ImportCoordinatorBuilder<S> {
    storage: S,
    config: ImportConfig,
    listeners: Vec<Arc<dyn AdminEventListener>>,
}

impl<S: StorageProvider> ImportCoordinatorBuilder<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            config: ImportConfig::default(),
            listeners: Vec::new(),
        }
    }

    pub fn with_config(mut self, config: ImportConfig) -> Self {
        self.config = config;
        self
    }

    /// Register a listener for admin events.
    pub fn with_listener(mut self, listener: impl AdminEventListener + 'static) -> Self {
        self.listeners.push(Arc::new(listener));
        self
    }

    /// Register a listener the caller keeps a handle to.
    pub fn with_shared_listener(mut self, listener: Arc<dyn AdminEventListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    /// Build the coordinator.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::InvalidRequest`](crate::ImportError::InvalidRequest)
    /// if the configuration is invalid.
    pub fn build(self) -> ImportResult<ImportCoordinator<S>> {
        self.config.validate()?;
        Ok(ImportCoordinator::from_parts(
            self.storage,
            self.config,
            self.listeners,
        ))
    }
}
