//! Undoable write batch against one realm.
//!
//! Every mutation made through an [`ImportTransaction`] records the document
//! it replaced (or the fact that there was none) in a journal. `commit`
//! flushes the realm; `rollback` replays the journal in reverse and leaves
//! the realm exactly as it was when the transaction began. A transaction is
//! consumed by either call.

use crate::error::{ImportError, ImportResult};
use crate::realm_store::{RealmStore, StoredResource};
use crate::resource::ResourceKind;
use crate::storage::{StorageKey, StorageProvider};
use log::{debug, error, trace, warn};
use serde_json::Value;

#[derive(Debug)]
struct JournalEntry {
    key: StorageKey,
    previous: Option<Value>,
}

/// Commit failed; the transaction tried to undo its writes.
#[derive(Debug)]
pub struct CommitFailure {
    pub cause: ImportError,
    pub rolled_back: bool,
}

/// Journaled write access to one realm.
pub struct ImportTransaction<'a, S: StorageProvider> {
    store: RealmStore<'a, S>,
    journal: Vec<JournalEntry>,
    finished: bool,
}

impl<'a, S: StorageProvider> ImportTransaction<'a, S> {
    /// Start a transaction over the given realm view.
    pub fn begin(store: RealmStore<'a, S>) -> Self {
        debug!("begin import transaction on realm '{}'", store.realm());
        Self {
            store,
            journal: Vec::new(),
            finished: false,
        }
    }

    /// Read access to the realm, including this transaction's own writes.
    pub fn store(&self) -> &RealmStore<'a, S> {
        &self.store
    }

    /// Number of journaled mutations.
    pub fn mutation_count(&self) -> usize {
        self.journal.len()
    }

    /// Insert a new resource of `kind` under internal id `id`.
    ///
    /// Fails with [`ImportError::DuplicateKey`] if the natural key carried by
    /// `data` is already taken, and with [`ImportError::IdTaken`] if the
    /// internal id is.
    pub async fn insert(
        &mut self,
        kind: ResourceKind,
        id: &str,
        data: Value,
    ) -> ImportResult<StoredResource> {
        let key_value = data
            .get(kind.key_attribute())
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ImportError::invalid_definition(
                    kind,
                    format!("missing '{}'", kind.key_attribute()),
                )
            })?
            .to_string();

        if self.store.find(kind, &key_value).await?.is_some() {
            return Err(ImportError::duplicate_key(kind, key_value));
        }

        let storage_key = self.store.key_for(kind, id);
        if self.store.storage().exists(storage_key.clone()).await? {
            return Err(ImportError::id_taken(kind, id));
        }

        let stored = self.put_document(storage_key.clone(), data).await?;
        Ok(StoredResource {
            kind,
            storage_key,
            data: stored,
        })
    }

    /// Replace the document of an existing resource, keeping its internal id.
    pub async fn replace(
        &mut self,
        existing: &StoredResource,
        data: Value,
    ) -> ImportResult<StoredResource> {
        let stored = self
            .put_document(existing.storage_key.clone(), data)
            .await?;
        Ok(StoredResource {
            kind: existing.kind,
            storage_key: existing.storage_key.clone(),
            data: stored,
        })
    }

    /// Remove an existing resource.
    pub async fn remove(&mut self, existing: &StoredResource) -> ImportResult<bool> {
        self.delete_document(existing.storage_key.clone()).await
    }

    /// Journaled raw write of any document in the realm.
    pub async fn put_document(&mut self, key: StorageKey, data: Value) -> ImportResult<Value> {
        let previous = self.store.storage().get(key.clone()).await?;
        trace!("put {}", key);
        let stored = self.store.storage().put(key.clone(), data).await?;
        self.journal.push(JournalEntry { key, previous });
        Ok(stored)
    }

    /// Journaled raw delete of any document in the realm.
    pub async fn delete_document(&mut self, key: StorageKey) -> ImportResult<bool> {
        let previous = self.store.storage().get(key.clone()).await?;
        if previous.is_none() {
            return Ok(false);
        }
        trace!("delete {}", key);
        let existed = self.store.storage().delete(key.clone()).await?;
        self.journal.push(JournalEntry { key, previous });
        Ok(existed)
    }

    /// Make the transaction's writes durable.
    ///
    /// If the store refuses the flush, the writes are rolled back and the
    /// failure is reported as [`ImportError::StoreUnavailable`].
    pub async fn commit(mut self) -> Result<usize, CommitFailure> {
        let realm = self.store.realm().to_string();
        match self.store.storage().flush(&realm).await {
            Ok(()) => {
                self.finished = true;
                debug!(
                    "committed {} mutations on realm '{}'",
                    self.journal.len(),
                    realm
                );
                Ok(self.journal.len())
            }
            Err(e) => {
                warn!("flush of realm '{}' failed: {}", realm, e);
                let rolled_back = self.undo().await.is_ok();
                Err(CommitFailure {
                    cause: ImportError::store_unavailable(format!(
                        "could not commit realm '{}': {}",
                        realm, e
                    )),
                    rolled_back,
                })
            }
        }
    }

    /// Undo every write made through this transaction.
    pub async fn rollback(mut self) -> ImportResult<usize> {
        self.undo().await
    }

    async fn undo(&mut self) -> ImportResult<usize> {
        self.finished = true;
        let total = self.journal.len();
        let mut first_error = None;

        while let Some(entry) = self.journal.pop() {
            let result = match entry.previous {
                Some(previous) => self
                    .store
                    .storage()
                    .put(entry.key.clone(), previous)
                    .await
                    .map(|_| ()),
                None => self
                    .store
                    .storage()
                    .delete(entry.key.clone())
                    .await
                    .map(|_| ()),
            };

            if let Err(e) = result {
                error!("rollback could not restore {}: {}", entry.key, e);
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }

        match first_error {
            None => {
                debug!(
                    "rolled back {} mutations on realm '{}'",
                    total,
                    self.store.realm()
                );
                Ok(total)
            }
            Some(e) => Err(e.into()),
        }
    }
}

impl<S: StorageProvider> Drop for ImportTransaction<'_, S> {
    fn drop(&mut self) {
        if !self.finished && !self.journal.is_empty() {
            warn!(
                "import transaction on realm '{}' dropped with {} uncommitted mutations",
                self.store.realm(),
                self.journal.len()
            );
        }
    }
}
