//! Storage abstraction layer for realm resources.
//!
//! The `StorageProvider` trait defines pure data storage operations on JSON
//! documents. It knows nothing about natural keys, overwrite policies or
//! conflict detection; those belong to the realm store adapter and the import
//! strategies built on top of it.
//!
//! # Architecture
//!
//! The storage layer is responsible for:
//! - Pure PUT/GET/DELETE operations on JSON data
//! - Realm isolation and data organization
//! - Basic querying by attribute value
//! - Flushing dirty realm state once a batch of writes is final
//!
//! The storage layer is NOT responsible for:
//! - Natural key uniqueness
//! - Import validation or overwrite semantics
//! - Rolling back a batch (see [`crate::transaction`])
//!
//! At the storage level CREATE and UPDATE are the same operation: you are just
//! putting data at a location.
//!
//! # Example Usage
//!
//! ```rust
//! use realm_import::storage::{StorageProvider, StorageKey, InMemoryStorage};
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let storage = InMemoryStorage::new();
//!
//! let key = StorageKey::new("acme", "Client", "0b6f");
//! let client = json!({"id": "0b6f", "clientId": "portal"});
//! storage.put(key.clone(), client).await?;
//!
//! let retrieved = storage.get(key.clone()).await?;
//! assert!(retrieved.is_some());
//!
//! let was_deleted = storage.delete(key).await?;
//! assert!(was_deleted);
//! # Ok(())
//! # }
//! ```

pub mod errors;
pub mod in_memory;

pub use errors::StorageError;
pub use in_memory::{InMemoryStorage, InMemoryStorageStats, RealmSnapshot};

use serde_json::Value;
use std::fmt;
use std::future::Future;

/// A hierarchical key for identifying documents in storage.
///
/// Documents are organized as: `realm` → `resource_type` → `resource_id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageKey {
    realm: String,
    resource_type: String,
    resource_id: String,
}

impl StorageKey {
    /// Create a new storage key.
    pub fn new(
        realm: impl Into<String>,
        resource_type: impl Into<String>,
        resource_id: impl Into<String>,
    ) -> Self {
        Self {
            realm: realm.into(),
            resource_type: resource_type.into(),
            resource_id: resource_id.into(),
        }
    }

    /// Get the realm name.
    pub fn realm(&self) -> &str {
        &self.realm
    }

    /// Get the resource type.
    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    /// Get the resource ID.
    pub fn resource_id(&self) -> &str {
        &self.resource_id
    }

    /// Create a prefix key for listing resources of a type within a realm.
    pub fn prefix(realm: impl Into<String>, resource_type: impl Into<String>) -> StoragePrefix {
        StoragePrefix {
            realm: realm.into(),
            resource_type: resource_type.into(),
        }
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.realm, self.resource_type, self.resource_id
        )
    }
}

/// A prefix for querying resources by realm and type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoragePrefix {
    realm: String,
    resource_type: String,
}

impl StoragePrefix {
    /// Get the realm name.
    pub fn realm(&self) -> &str {
        &self.realm
    }

    /// Get the resource type.
    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }
}

impl fmt::Display for StoragePrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.realm, self.resource_type)
    }
}

/// Core trait for storage providers that handle pure data persistence.
///
/// # Design Principles
///
/// - **PUT/GET/DELETE Model**: simple, fundamental operations
/// - **PUT Returns Data**: the stored document is returned to the caller
/// - **DELETE Returns Boolean**: indicates whether the document existed
/// - **Realm Isolation**: every operation is scoped by the realm in its key
/// - **Dirty Tracking**: writes become durable on [`flush`](Self::flush);
///   a batch that is rolled back is never flushed
pub trait StorageProvider: Send + Sync {
    /// Store data at the specified key and return the stored data.
    ///
    /// If a document with the same key already exists it is completely
    /// replaced. No validation is performed on the data structure.
    fn put(
        &self,
        key: StorageKey,
        data: Value,
    ) -> impl Future<Output = Result<Value, StorageError>> + Send;

    /// Retrieve data by key.
    fn get(
        &self,
        key: StorageKey,
    ) -> impl Future<Output = Result<Option<Value>, StorageError>> + Send;

    /// Delete data by key, returning `true` if the document existed.
    fn delete(&self, key: StorageKey) -> impl Future<Output = Result<bool, StorageError>> + Send;

    /// List documents matching a prefix with pagination.
    ///
    /// Results are ordered by resource ID. An `offset` beyond the total count
    /// or a `limit` of 0 yields an empty vector.
    fn list(
        &self,
        prefix: StoragePrefix,
        offset: usize,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<(StorageKey, Value)>, StorageError>> + Send;

    /// Find documents whose attribute (dot notation, e.g. `config.issuer`)
    /// equals `value` exactly. Results are ordered by resource ID.
    fn find_by_attribute(
        &self,
        prefix: StoragePrefix,
        attribute: &str,
        value: &str,
    ) -> impl Future<Output = Result<Vec<(StorageKey, Value)>, StorageError>> + Send;

    /// Check if a document exists.
    fn exists(&self, key: StorageKey) -> impl Future<Output = Result<bool, StorageError>> + Send;

    /// Count the documents matching a prefix.
    fn count(
        &self,
        prefix: StoragePrefix,
    ) -> impl Future<Output = Result<usize, StorageError>> + Send;

    /// Make every write to `realm` since the last flush durable.
    ///
    /// Failing here means the batch could not be committed; callers are
    /// expected to undo their writes.
    fn flush(&self, realm: &str) -> impl Future<Output = Result<(), StorageError>> + Send;
}
