//! Per-kind import strategies.
//!
//! A [`ResourceStrategy`] knows how to read one kind's items out of a bundle,
//! derive their natural key, test whether they already exist, and create or
//! overwrite them. The coordinator selects the strategy by [`ResourceKind`]
//! through a [`StrategySet`].
//!
//! Reads (`list`, `key`, `exists`) only ever see a [`RealmStore`]; writes
//! (`create`, `overwrite`) are handed the [`ImportTransaction`], which is the
//! only way to mutate the realm.

pub mod client;
pub mod identity_provider;
pub mod user;

pub use client::ClientStrategy;
pub use identity_provider::IdentityProviderStrategy;
pub use user::UserStrategy;

use crate::config::ImportConfig;
use crate::error::ImportResult;
use crate::realm_store::{RealmStore, StoredResource};
use crate::resource::{PartialImport, ResourceKind};
use crate::storage::{StorageError, StorageProvider};
use crate::transaction::ImportTransaction;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;

/// What a successful create or overwrite left in the store.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedResource {
    pub kind: ResourceKind,
    /// Store-internal identifier.
    pub id: String,
    /// Natural key.
    pub key: String,
    /// The document as stored.
    pub representation: Value,
}

/// Import behaviour for one resource kind.
pub trait ResourceStrategy: Send + Sync {
    /// The kind's representation type.
    type Item: Serialize + Send + Sync;

    /// The kind this strategy handles.
    fn kind(&self) -> ResourceKind;

    /// This kind's items in bundle order; empty when the list is absent.
    fn list<'b>(&self, bundle: &'b PartialImport) -> &'b [Self::Item];

    /// Natural key of an item, `None` when the key field is missing or blank.
    fn key(&self, item: &Self::Item) -> Option<String>;

    /// Message reported when the item conflicts with an existing resource.
    fn conflict_message(&self, item: &Self::Item) -> String;

    /// Internal id the item would take in the realm, when it supplies one.
    ///
    /// `overwriting` is true when the item replaces an existing resource;
    /// kinds that keep the stored id on overwrite claim nothing then.
    fn claimed_id(&self, item: &Self::Item, overwriting: bool) -> Option<String>;

    /// The stored resource matching a natural key produced by [`key`](Self::key).
    fn find_existing<S: StorageProvider>(
        &self,
        store: &RealmStore<'_, S>,
        key: &str,
    ) -> impl Future<Output = Result<Option<StoredResource>, StorageError>> + Send {
        let kind = self.kind();
        async move { store.find(kind, key).await }
    }

    /// True if a resource with the item's natural key exists in the realm.
    fn exists<S: StorageProvider>(
        &self,
        store: &RealmStore<'_, S>,
        item: &Self::Item,
    ) -> impl Future<Output = Result<bool, StorageError>> + Send {
        let key = self.key(item);
        async move {
            match key {
                Some(key) => Ok(self.find_existing(store, &key).await?.is_some()),
                None => Ok(false),
            }
        }
    }

    /// Insert a new resource for the item.
    fn create<S: StorageProvider>(
        &self,
        tx: &mut ImportTransaction<'_, S>,
        item: &Self::Item,
    ) -> impl Future<Output = ImportResult<AppliedResource>> + Send;

    /// Replace the existing resource matching the item's natural key.
    fn overwrite<S: StorageProvider>(
        &self,
        tx: &mut ImportTransaction<'_, S>,
        item: &Self::Item,
    ) -> impl Future<Output = ImportResult<AppliedResource>> + Send;
}

/// One strategy instance per [`ResourceKind`].
#[derive(Debug, Clone)]
pub struct StrategySet {
    pub clients: ClientStrategy,
    pub identity_providers: IdentityProviderStrategy,
    pub users: UserStrategy,
}

impl StrategySet {
    pub fn new(config: &ImportConfig) -> Self {
        Self {
            clients: ClientStrategy,
            identity_providers: IdentityProviderStrategy,
            users: UserStrategy::new(config.lowercase_usernames),
        }
    }
}

impl Default for StrategySet {
    fn default() -> Self {
        Self::new(&ImportConfig::default())
    }
}

/// Resolve the internal id for a new resource: the supplied one if present,
/// otherwise a fresh UUID.
pub(crate) fn supplied_or_generated_id(supplied: Option<&str>) -> String {
    crate::resource::representation::non_blank(supplied)
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}
