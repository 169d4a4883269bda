//! In-memory storage implementation for realm resources.
//!
//! Thread-safe implementation of [`StorageProvider`] using nested maps behind a
//! tokio `RwLock`. Intended for tests, development and embedding; nothing is
//! persisted beyond the process, so [`flush`](StorageProvider::flush) only
//! advances the realm's committed revision.
//!
//! # Performance Characteristics
//!
//! * PUT/GET/DELETE: O(1) average case
//! * LIST with pagination: O(n log n) over the documents in the prefix
//! * FIND_BY_ATTRIBUTE: O(n) with JSON traversal
//!
//! # Example Usage
//!
//! ```rust
//! use realm_import::storage::{InMemoryStorage, StorageProvider, StorageKey};
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let storage = InMemoryStorage::new();
//!
//! let key = StorageKey::new("acme", "IdentityProvider", "f00d");
//! storage
//!     .put(key, json!({"internalId": "f00d", "alias": "github", "config": {"clientId": "gh"}}))
//!     .await?;
//!
//! let prefix = StorageKey::prefix("acme", "IdentityProvider");
//! let found = storage.find_by_attribute(prefix, "alias", "github").await?;
//! assert_eq!(found.len(), 1);
//! # Ok(())
//! # }
//! ```

use crate::storage::{StorageError, StorageKey, StoragePrefix, StorageProvider};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Ordered copy of every document in a realm: `resource_type` → `id` → data.
pub type RealmSnapshot = BTreeMap<String, BTreeMap<String, Value>>;

type RealmData = HashMap<String, HashMap<String, Value>>;

/// Thread-safe in-memory storage implementation.
///
/// Layout: `realm` → `resource_type` → `resource_id` → `data`.
#[derive(Clone)]
pub struct InMemoryStorage {
    data: Arc<RwLock<HashMap<String, RealmData>>>,
    // realm -> number of successful flushes
    revisions: Arc<RwLock<HashMap<String, u64>>>,
}

impl InMemoryStorage {
    /// Create a new empty in-memory storage instance.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
            revisions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Get storage statistics for debugging and monitoring.
    pub async fn stats(&self) -> InMemoryStorageStats {
        let data_guard = self.data.read().await;
        let mut realm_count = 0;
        let mut resource_type_count = 0;
        let mut total_resources = 0;

        for (_, realm_data) in data_guard.iter() {
            realm_count += 1;
            for (_, type_data) in realm_data.iter() {
                resource_type_count += 1;
                total_resources += type_data.len();
            }
        }

        let flush_count = self.revisions.read().await.values().sum();

        InMemoryStorageStats {
            realm_count,
            resource_type_count,
            total_resources,
            flush_count,
        }
    }

    /// Number of successful flushes recorded for a realm.
    pub async fn revision(&self, realm: &str) -> u64 {
        self.revisions
            .read()
            .await
            .get(realm)
            .copied()
            .unwrap_or(0)
    }

    /// Take an ordered copy of every document stored for a realm.
    ///
    /// Empty resource types are omitted so that a realm that had documents
    /// added and removed again compares equal to one that never had them.
    pub async fn realm_snapshot(&self, realm: &str) -> RealmSnapshot {
        let data_guard = self.data.read().await;
        let mut snapshot = RealmSnapshot::new();

        if let Some(realm_data) = data_guard.get(realm) {
            for (resource_type, type_data) in realm_data {
                if type_data.is_empty() {
                    continue;
                }
                let documents = type_data
                    .iter()
                    .map(|(id, value)| (id.clone(), value.clone()))
                    .collect();
                snapshot.insert(resource_type.clone(), documents);
            }
        }

        snapshot
    }

    /// Clear all data (useful for testing).
    pub async fn clear(&self) {
        self.data.write().await.clear();
        self.revisions.write().await.clear();
    }

    /// Extract a nested attribute value from JSON data using dot notation.
    fn extract_attribute_value(data: &Value, attribute_path: &str) -> Option<String> {
        let mut current = data;

        for part in attribute_path.split('.') {
            if let Ok(index) = part.parse::<usize>() {
                current = current.get(index)?;
            } else {
                current = current.get(part)?;
            }
        }

        match current {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageProvider for InMemoryStorage {
    async fn put(&self, key: StorageKey, data: Value) -> Result<Value, StorageError> {
        let mut data_guard = self.data.write().await;

        let type_data = data_guard
            .entry(key.realm().to_string())
            .or_default()
            .entry(key.resource_type().to_string())
            .or_default();

        type_data.insert(key.resource_id().to_string(), data.clone());

        Ok(data)
    }

    async fn get(&self, key: StorageKey) -> Result<Option<Value>, StorageError> {
        let data_guard = self.data.read().await;

        let result = data_guard
            .get(key.realm())
            .and_then(|realm_data| realm_data.get(key.resource_type()))
            .and_then(|type_data| type_data.get(key.resource_id()))
            .cloned();

        Ok(result)
    }

    async fn delete(&self, key: StorageKey) -> Result<bool, StorageError> {
        let mut data_guard = self.data.write().await;

        let existed = data_guard
            .get_mut(key.realm())
            .and_then(|realm_data| realm_data.get_mut(key.resource_type()))
            .map(|type_data| type_data.remove(key.resource_id()).is_some())
            .unwrap_or(false);

        Ok(existed)
    }

    async fn list(
        &self,
        prefix: StoragePrefix,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<(StorageKey, Value)>, StorageError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let data_guard = self.data.read().await;

        let type_data = match data_guard
            .get(prefix.realm())
            .and_then(|realm_data| realm_data.get(prefix.resource_type()))
        {
            Some(data) => data,
            None => return Ok(Vec::new()),
        };

        let mut keys: Vec<_> = type_data.keys().collect();
        keys.sort();

        let results = keys
            .into_iter()
            .skip(offset)
            .take(limit)
            .filter_map(|resource_id| {
                type_data.get(resource_id).map(|data| {
                    (
                        StorageKey::new(prefix.realm(), prefix.resource_type(), resource_id),
                        data.clone(),
                    )
                })
            })
            .collect();

        Ok(results)
    }

    async fn find_by_attribute(
        &self,
        prefix: StoragePrefix,
        attribute: &str,
        value: &str,
    ) -> Result<Vec<(StorageKey, Value)>, StorageError> {
        let data_guard = self.data.read().await;

        let type_data = match data_guard
            .get(prefix.realm())
            .and_then(|realm_data| realm_data.get(prefix.resource_type()))
        {
            Some(data) => data,
            None => return Ok(Vec::new()),
        };

        let mut results: Vec<(StorageKey, Value)> = type_data
            .iter()
            .filter(|(_, resource_data)| {
                Self::extract_attribute_value(resource_data, attribute).as_deref() == Some(value)
            })
            .map(|(resource_id, resource_data)| {
                (
                    StorageKey::new(prefix.realm(), prefix.resource_type(), resource_id),
                    resource_data.clone(),
                )
            })
            .collect();

        results.sort_by(|a, b| a.0.resource_id().cmp(b.0.resource_id()));

        Ok(results)
    }

    async fn exists(&self, key: StorageKey) -> Result<bool, StorageError> {
        let data_guard = self.data.read().await;

        let exists = data_guard
            .get(key.realm())
            .and_then(|realm_data| realm_data.get(key.resource_type()))
            .is_some_and(|type_data| type_data.contains_key(key.resource_id()));

        Ok(exists)
    }

    async fn count(&self, prefix: StoragePrefix) -> Result<usize, StorageError> {
        let data_guard = self.data.read().await;

        let count = data_guard
            .get(prefix.realm())
            .and_then(|realm_data| realm_data.get(prefix.resource_type()))
            .map(|type_data| type_data.len())
            .unwrap_or(0);

        Ok(count)
    }

    async fn flush(&self, realm: &str) -> Result<(), StorageError> {
        let mut revisions = self.revisions.write().await;
        *revisions.entry(realm.to_string()).or_insert(0) += 1;
        Ok(())
    }
}

/// Statistics about the current state of in-memory storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InMemoryStorageStats {
    /// Number of realms with data
    pub realm_count: usize,
    /// Number of resource types across all realms
    pub resource_type_count: usize,
    /// Total number of individual documents
    pub total_resources: usize,
    /// Successful flushes across all realms
    pub flush_count: u64,
}
