//! The import bundle: everything submitted in one partial import call.

use crate::error::ImportResult;
use crate::resource::kind::ResourceKind;
use crate::resource::representation::{
    ClientRepresentation, IdentityProviderRepresentation, UserRepresentation,
};
use serde::{Deserialize, Serialize};

/// Resource definitions for one realm plus the shared overwrite flag.
///
/// Every list is optional; a missing list means there is nothing to import
/// for that kind. Unknown top-level fields are ignored.
///
/// ```rust
/// use realm_import::resource::{PartialImport, ResourceKind};
///
/// let bundle = PartialImport::from_json(r#"{
///     "overwrite": true,
///     "clients": [{"clientId": "portal"}]
/// }"#).unwrap();
///
/// assert!(bundle.overwrite);
/// assert_eq!(bundle.item_count(ResourceKind::Client), 1);
/// assert_eq!(bundle.item_count(ResourceKind::User), 0);
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialImport {
    #[serde(default)]
    pub overwrite: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clients: Option<Vec<ClientRepresentation>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_providers: Option<Vec<IdentityProviderRepresentation>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub users: Option<Vec<UserRepresentation>>,
}

impl PartialImport {
    /// Create an empty bundle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a bundle from its JSON document.
    pub fn from_json(input: &str) -> ImportResult<Self> {
        Ok(serde_json::from_str(input)?)
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn with_client(mut self, client: ClientRepresentation) -> Self {
        self.clients.get_or_insert_with(Vec::new).push(client);
        self
    }

    pub fn with_identity_provider(mut self, idp: IdentityProviderRepresentation) -> Self {
        self.identity_providers
            .get_or_insert_with(Vec::new)
            .push(idp);
        self
    }

    pub fn with_user(mut self, user: UserRepresentation) -> Self {
        self.users.get_or_insert_with(Vec::new).push(user);
        self
    }

    /// Number of items submitted for a kind.
    pub fn item_count(&self, kind: ResourceKind) -> usize {
        match kind {
            ResourceKind::Client => self.clients.as_ref().map_or(0, Vec::len),
            ResourceKind::IdentityProvider => self.identity_providers.as_ref().map_or(0, Vec::len),
            ResourceKind::User => self.users.as_ref().map_or(0, Vec::len),
        }
    }

    /// Number of items across every kind.
    pub fn total_items(&self) -> usize {
        ResourceKind::ALL
            .iter()
            .map(|kind| self.item_count(*kind))
            .sum()
    }

    /// True when no kind carries any item.
    pub fn is_empty(&self) -> bool {
        self.total_items() == 0
    }
}
