//! Identity provider import strategy.
//!
//! The alias is the provider's stable name. Overwriting updates the stored
//! provider in place: the alias and the internal id stay the same, only the
//! configuration changes.

use crate::error::{ImportError, ImportResult};
use crate::resource::representation::non_blank;
use crate::resource::{IdentityProviderRepresentation, PartialImport, ResourceKind};
use crate::storage::StorageProvider;
use crate::strategy::{AppliedResource, ResourceStrategy, supplied_or_generated_id};
use crate::transaction::ImportTransaction;

#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityProviderStrategy;

impl IdentityProviderStrategy {
    fn require_key(&self, item: &IdentityProviderRepresentation) -> ImportResult<String> {
        self.key(item).ok_or_else(|| {
            ImportError::invalid_definition(ResourceKind::IdentityProvider, "missing alias")
        })
    }

    fn document(
        item: &IdentityProviderRepresentation,
        alias: &str,
        internal_id: &str,
    ) -> ImportResult<serde_json::Value> {
        let mut stored = item.clone();
        stored.alias = Some(alias.to_string());
        stored.internal_id = Some(internal_id.to_string());
        Ok(serde_json::to_value(&stored)?)
    }
}

impl ResourceStrategy for IdentityProviderStrategy {
    type Item = IdentityProviderRepresentation;

    fn kind(&self) -> ResourceKind {
        ResourceKind::IdentityProvider
    }

    fn list<'b>(&self, bundle: &'b PartialImport) -> &'b [IdentityProviderRepresentation] {
        bundle.identity_providers.as_deref().unwrap_or_default()
    }

    fn key(&self, item: &IdentityProviderRepresentation) -> Option<String> {
        non_blank(item.alias.as_deref()).map(str::to_string)
    }

    fn claimed_id(
        &self,
        item: &IdentityProviderRepresentation,
        overwriting: bool,
    ) -> Option<String> {
        if overwriting {
            return None;
        }
        non_blank(item.internal_id.as_deref()).map(str::to_string)
    }

    fn conflict_message(&self, item: &IdentityProviderRepresentation) -> String {
        format!(
            "Identity Provider '{}' already exists.",
            self.key(item).unwrap_or_default()
        )
    }

    async fn create<S: StorageProvider>(
        &self,
        tx: &mut ImportTransaction<'_, S>,
        item: &IdentityProviderRepresentation,
    ) -> ImportResult<AppliedResource> {
        let alias = self.require_key(item)?;
        let internal_id = supplied_or_generated_id(item.internal_id.as_deref());
        let data = Self::document(item, &alias, &internal_id)?;

        let resource = tx
            .insert(ResourceKind::IdentityProvider, &internal_id, data)
            .await?;

        Ok(AppliedResource {
            kind: ResourceKind::IdentityProvider,
            id: internal_id,
            key: alias,
            representation: resource.data,
        })
    }

    async fn overwrite<S: StorageProvider>(
        &self,
        tx: &mut ImportTransaction<'_, S>,
        item: &IdentityProviderRepresentation,
    ) -> ImportResult<AppliedResource> {
        let alias = self.require_key(item)?;
        let existing = self
            .find_existing(tx.store(), &alias)
            .await?
            .ok_or_else(|| ImportError::not_found(ResourceKind::IdentityProvider, alias.as_str()))?;

        let internal_id = existing.id().to_string();
        let data = Self::document(item, &alias, &internal_id)?;
        let resource = tx.replace(&existing, data).await?;

        Ok(AppliedResource {
            kind: ResourceKind::IdentityProvider,
            id: internal_id,
            key: alias,
            representation: resource.data,
        })
    }
}
