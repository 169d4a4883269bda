//! Client import strategy.
//!
//! Clients are composite: each owns its client roles, and users hold role
//! mappings keyed by the client's `clientId`. Overwriting a client therefore
//! removes it together with its roles and every user mapping that points at
//! it, then creates it again from the submitted definition. The internal id
//! and the ids of roles that survive by name are kept.

use crate::error::{ImportError, ImportResult};
use crate::realm_store::StoredResource;
use crate::resource::representation::non_blank;
use crate::resource::{ClientRepresentation, PartialImport, ResourceKind};
use crate::storage::{StorageKey, StorageProvider};
use crate::strategy::{AppliedResource, ResourceStrategy, supplied_or_generated_id};
use crate::transaction::ImportTransaction;
use log::debug;
use serde_json::{Value, json};
use std::collections::{HashMap, HashSet};

/// Storage type of client role records.
pub const CLIENT_ROLE_TYPE: &str = "ClientRole";

/// Attribute linking a client role to its client's internal id.
const ROLE_CONTAINER_ATTRIBUTE: &str = "containerId";

#[derive(Debug, Clone, Copy, Default)]
pub struct ClientStrategy;

impl ClientStrategy {
    fn require_key(&self, item: &ClientRepresentation) -> ImportResult<String> {
        self.key(item).ok_or_else(|| {
            ImportError::invalid_definition(ResourceKind::Client, "missing clientId")
        })
    }

    async fn insert_client<S: StorageProvider>(
        &self,
        tx: &mut ImportTransaction<'_, S>,
        item: &ClientRepresentation,
        client_id: String,
        id: String,
        role_ids: &HashMap<String, String>,
    ) -> ImportResult<AppliedResource> {
        let mut stored = item.clone();
        stored.id = Some(id.clone());
        stored.client_id = Some(client_id.clone());
        let data = serde_json::to_value(&stored)?;

        let resource = tx.insert(ResourceKind::Client, &id, data).await?;

        let mut seen = HashSet::new();
        for role in &item.default_roles {
            let name = role.trim();
            if name.is_empty() || !seen.insert(name) {
                continue;
            }
            let role_id = role_ids
                .get(name)
                .cloned()
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
            let key = StorageKey::new(tx.store().realm(), CLIENT_ROLE_TYPE, role_id.as_str());
            let role = json!({
                "id": role_id,
                "name": name,
                ROLE_CONTAINER_ATTRIBUTE: id.as_str(),
                "clientRole": true,
            });
            tx.put_document(key, role).await?;
        }

        Ok(AppliedResource {
            kind: ResourceKind::Client,
            id,
            key: client_id,
            representation: resource.data,
        })
    }

    /// Remove a client, its roles and user mappings referencing it.
    ///
    /// Returns the removed roles' ids by role name.
    async fn remove_client<S: StorageProvider>(
        &self,
        tx: &mut ImportTransaction<'_, S>,
        existing: &StoredResource,
        client_id: &str,
    ) -> ImportResult<HashMap<String, String>> {
        let roles = tx
            .store()
            .find_documents(CLIENT_ROLE_TYPE, ROLE_CONTAINER_ATTRIBUTE, existing.id())
            .await?;

        let mut role_ids = HashMap::new();
        for (key, data) in roles {
            if let Some(name) = data.get("name").and_then(Value::as_str) {
                role_ids.insert(name.to_string(), key.resource_id().to_string());
            }
            tx.delete_document(key).await?;
        }

        let users = tx.store().list(ResourceKind::User).await?;
        let mut dropped_mappings = 0;
        for user in users {
            let mut data = user.data.clone();
            let Some(mappings) = data.get_mut("clientRoles").and_then(Value::as_object_mut) else {
                continue;
            };
            if mappings.remove(client_id).is_none() {
                continue;
            }
            if mappings.is_empty() {
                if let Some(object) = data.as_object_mut() {
                    object.remove("clientRoles");
                }
            }
            tx.replace(&user, data).await?;
            dropped_mappings += 1;
        }

        tx.remove(existing).await?;
        debug!(
            "removed client '{}' with {} roles and {} user mappings",
            client_id,
            role_ids.len(),
            dropped_mappings
        );

        Ok(role_ids)
    }
}

impl ResourceStrategy for ClientStrategy {
    type Item = ClientRepresentation;

    fn kind(&self) -> ResourceKind {
        ResourceKind::Client
    }

    fn list<'b>(&self, bundle: &'b PartialImport) -> &'b [ClientRepresentation] {
        bundle.clients.as_deref().unwrap_or_default()
    }

    fn key(&self, item: &ClientRepresentation) -> Option<String> {
        non_blank(item.client_id.as_deref()).map(str::to_string)
    }

    /// A supplied id is used on overwrite too.
    fn claimed_id(&self, item: &ClientRepresentation, _overwriting: bool) -> Option<String> {
        non_blank(item.id.as_deref()).map(str::to_string)
    }

    fn conflict_message(&self, item: &ClientRepresentation) -> String {
        format!(
            "Client id '{}' already exists",
            self.key(item).unwrap_or_default()
        )
    }

    async fn create<S: StorageProvider>(
        &self,
        tx: &mut ImportTransaction<'_, S>,
        item: &ClientRepresentation,
    ) -> ImportResult<AppliedResource> {
        let client_id = self.require_key(item)?;
        let id = supplied_or_generated_id(item.id.as_deref());
        self.insert_client(tx, item, client_id, id, &HashMap::new())
            .await
    }

    async fn overwrite<S: StorageProvider>(
        &self,
        tx: &mut ImportTransaction<'_, S>,
        item: &ClientRepresentation,
    ) -> ImportResult<AppliedResource> {
        let client_id = self.require_key(item)?;
        let existing = self
            .find_existing(tx.store(), &client_id)
            .await?
            .ok_or_else(|| ImportError::not_found(ResourceKind::Client, client_id.as_str()))?;

        let id = non_blank(item.id.as_deref())
            .unwrap_or(existing.id())
            .to_string();

        let role_ids = self.remove_client(tx, &existing, &client_id).await?;
        self.insert_client(tx, item, client_id, id, &role_ids).await
    }
}
