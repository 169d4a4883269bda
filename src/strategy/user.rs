//! User import strategy.
//!
//! Usernames are compared case-insensitively when `lowercase_usernames` is
//! enabled: the key is lower-cased, and lookups fold the case of stored
//! usernames too, so a user written as "Alice" by a case-sensitive run still
//! matches "alice". An overwritten user keeps its internal id, and its stored
//! username is rewritten in normalized form.

use crate::error::{ImportError, ImportResult};
use crate::resource::representation::non_blank;
use crate::realm_store::{RealmStore, StoredResource};
use crate::resource::{PartialImport, ResourceKind, UserRepresentation};
use crate::storage::{StorageError, StorageProvider};
use crate::strategy::{AppliedResource, ResourceStrategy, supplied_or_generated_id};
use crate::transaction::ImportTransaction;

#[derive(Debug, Clone, Copy)]
pub struct UserStrategy {
    lowercase_usernames: bool,
}

impl UserStrategy {
    pub fn new(lowercase_usernames: bool) -> Self {
        Self {
            lowercase_usernames,
        }
    }

    fn require_key(&self, item: &UserRepresentation) -> ImportResult<String> {
        self.key(item)
            .ok_or_else(|| ImportError::invalid_definition(ResourceKind::User, "missing username"))
    }

    fn document(
        item: &UserRepresentation,
        username: &str,
        id: &str,
    ) -> ImportResult<serde_json::Value> {
        let mut stored = item.clone();
        stored.username = Some(username.to_string());
        stored.id = Some(id.to_string());
        Ok(serde_json::to_value(&stored)?)
    }
}

impl Default for UserStrategy {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ResourceStrategy for UserStrategy {
    type Item = UserRepresentation;

    fn kind(&self) -> ResourceKind {
        ResourceKind::User
    }

    fn list<'b>(&self, bundle: &'b PartialImport) -> &'b [UserRepresentation] {
        bundle.users.as_deref().unwrap_or_default()
    }

    fn key(&self, item: &UserRepresentation) -> Option<String> {
        non_blank(item.username.as_deref()).map(|username| {
            if self.lowercase_usernames {
                username.to_lowercase()
            } else {
                username.to_string()
            }
        })
    }

    fn claimed_id(&self, item: &UserRepresentation, overwriting: bool) -> Option<String> {
        if overwriting {
            return None;
        }
        non_blank(item.id.as_deref()).map(str::to_string)
    }

    async fn find_existing<S: StorageProvider>(
        &self,
        store: &RealmStore<'_, S>,
        key: &str,
    ) -> Result<Option<StoredResource>, StorageError> {
        if self.lowercase_usernames {
            store.find_ignore_case(ResourceKind::User, key).await
        } else {
            store.find(ResourceKind::User, key).await
        }
    }

    fn conflict_message(&self, item: &UserRepresentation) -> String {
        format!("User '{}' already exists", self.key(item).unwrap_or_default())
    }

    async fn create<S: StorageProvider>(
        &self,
        tx: &mut ImportTransaction<'_, S>,
        item: &UserRepresentation,
    ) -> ImportResult<AppliedResource> {
        let username = self.require_key(item)?;
        if self.find_existing(tx.store(), &username).await?.is_some() {
            return Err(ImportError::duplicate_key(ResourceKind::User, username));
        }
        let id = supplied_or_generated_id(item.id.as_deref());
        let data = Self::document(item, &username, &id)?;

        let resource = tx.insert(ResourceKind::User, &id, data).await?;

        Ok(AppliedResource {
            kind: ResourceKind::User,
            id,
            key: username,
            representation: resource.data,
        })
    }

    async fn overwrite<S: StorageProvider>(
        &self,
        tx: &mut ImportTransaction<'_, S>,
        item: &UserRepresentation,
    ) -> ImportResult<AppliedResource> {
        let username = self.require_key(item)?;
        let existing = self
            .find_existing(tx.store(), &username)
            .await?
            .ok_or_else(|| ImportError::not_found(ResourceKind::User, username.as_str()))?;

        let id = existing.id().to_string();
        let data = Self::document(item, &username, &id)?;
        let resource = tx.replace(&existing, data).await?;

        Ok(AppliedResource {
            kind: ResourceKind::User,
            id,
            key: username,
            representation: resource.data,
        })
    }
}
