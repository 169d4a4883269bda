//! Realm-scoped, read-only view over a storage provider.
//!
//! `RealmStore` is the store adapter the import engine validates against:
//! lookups by natural key, existence checks and listing. It deliberately has
//! no mutating operations; every write goes through
//! [`ImportTransaction`](crate::transaction::ImportTransaction) so that it can
//! be undone.

use crate::resource::ResourceKind;
use crate::storage::{StorageError, StorageKey, StorageProvider};
use log::trace;
use serde_json::Value;

/// A document read back from the store for a given kind.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredResource {
    pub kind: ResourceKind,
    pub storage_key: StorageKey,
    pub data: Value,
}

impl StoredResource {
    /// Store-internal identifier.
    pub fn id(&self) -> &str {
        self.storage_key.resource_id()
    }

    /// Natural key as stored.
    pub fn key(&self) -> Option<&str> {
        self.data
            .get(self.kind.key_attribute())
            .and_then(Value::as_str)
    }
}

/// Read-only adapter binding a storage provider to one realm.
pub struct RealmStore<'a, S> {
    storage: &'a S,
    realm: String,
}

impl<'a, S: StorageProvider> RealmStore<'a, S> {
    pub fn new(storage: &'a S, realm: impl Into<String>) -> Self {
        Self {
            storage,
            realm: realm.into(),
        }
    }

    pub fn realm(&self) -> &str {
        &self.realm
    }

    pub(crate) fn storage(&self) -> &'a S {
        self.storage
    }

    /// Storage key for a resource of `kind` with internal id `id`.
    pub fn key_for(&self, kind: ResourceKind, id: &str) -> StorageKey {
        StorageKey::new(self.realm.as_str(), kind.storage_type(), id)
    }

    /// Find the resource of `kind` whose natural key equals `key`.
    pub async fn find(
        &self,
        kind: ResourceKind,
        key: &str,
    ) -> Result<Option<StoredResource>, StorageError> {
        trace!("find {} '{}' in realm '{}'", kind, key, self.realm);

        let mut matches = self
            .find_documents(kind.storage_type(), kind.key_attribute(), key)
            .await?;

        if matches.len() > 1 {
            return Err(self.ambiguous_key(kind, key, matches.len()));
        }

        Ok(matches.pop().map(|(storage_key, data)| StoredResource {
            kind,
            storage_key,
            data,
        }))
    }

    /// Like [`find`](Self::find), but natural keys are compared after
    /// lower-casing both sides.
    pub async fn find_ignore_case(
        &self,
        kind: ResourceKind,
        key: &str,
    ) -> Result<Option<StoredResource>, StorageError> {
        trace!(
            "find {} '{}' ignoring case in realm '{}'",
            kind, key, self.realm
        );

        let wanted = key.to_lowercase();
        let mut matches: Vec<StoredResource> = self
            .list(kind)
            .await?
            .into_iter()
            .filter(|resource| resource.key().is_some_and(|k| k.to_lowercase() == wanted))
            .collect();

        if matches.len() > 1 {
            return Err(self.ambiguous_key(kind, key, matches.len()));
        }

        Ok(matches.pop())
    }

    fn ambiguous_key(&self, kind: ResourceKind, key: &str, holders: usize) -> StorageError {
        StorageError::InvalidData {
            message: format!(
                "{} natural key '{}' is held by {} resources in realm '{}'",
                kind, key, holders, self.realm
            ),
            cause: None,
        }
    }

    /// True if a resource of `kind` with natural key `key` exists.
    pub async fn exists(&self, kind: ResourceKind, key: &str) -> Result<bool, StorageError> {
        Ok(self.find(kind, key).await?.is_some())
    }

    /// Fetch a resource of `kind` by internal id.
    pub async fn get(
        &self,
        kind: ResourceKind,
        id: &str,
    ) -> Result<Option<StoredResource>, StorageError> {
        let storage_key = self.key_for(kind, id);
        let data = self.storage.get(storage_key.clone()).await?;
        Ok(data.map(|data| StoredResource {
            kind,
            storage_key,
            data,
        }))
    }

    /// Every resource of `kind` in the realm, ordered by internal id.
    pub async fn list(&self, kind: ResourceKind) -> Result<Vec<StoredResource>, StorageError> {
        let documents = self.list_documents(kind.storage_type()).await?;
        Ok(documents
            .into_iter()
            .map(|(storage_key, data)| StoredResource {
                kind,
                storage_key,
                data,
            })
            .collect())
    }

    /// Natural keys of every resource of `kind`, sorted.
    pub async fn keys(&self, kind: ResourceKind) -> Result<Vec<String>, StorageError> {
        let mut keys: Vec<String> = self
            .list(kind)
            .await?
            .iter()
            .filter_map(|resource| resource.key().map(str::to_string))
            .collect();
        keys.sort();
        Ok(keys)
    }

    /// Raw documents of any stored type whose attribute equals `value`.
    pub async fn find_documents(
        &self,
        resource_type: &str,
        attribute: &str,
        value: &str,
    ) -> Result<Vec<(StorageKey, Value)>, StorageError> {
        self.storage
            .find_by_attribute(
                StorageKey::prefix(self.realm.as_str(), resource_type),
                attribute,
                value,
            )
            .await
    }

    /// Raw documents of any stored type.
    pub async fn list_documents(
        &self,
        resource_type: &str,
    ) -> Result<Vec<(StorageKey, Value)>, StorageError> {
        self.storage
            .list(
                StorageKey::prefix(self.realm.as_str(), resource_type),
                0,
                usize::MAX,
            )
            .await
    }
}
