//! The closed set of resource kinds a partial import can carry.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of resource handled by the import engine.
///
/// The declaration order is the processing order: clients first (users may
/// hold role mappings for them), then identity providers, then users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceKind {
    Client,
    #[serde(rename = "IDP")]
    IdentityProvider,
    User,
}

impl ResourceKind {
    /// Every kind, in processing order.
    pub const ALL: [ResourceKind; 3] = [
        ResourceKind::Client,
        ResourceKind::IdentityProvider,
        ResourceKind::User,
    ];

    /// Resource type name used in storage keys.
    pub fn storage_type(&self) -> &'static str {
        match self {
            ResourceKind::Client => "Client",
            ResourceKind::IdentityProvider => "IdentityProvider",
            ResourceKind::User => "User",
        }
    }

    /// Attribute holding the natural key in stored documents.
    pub fn key_attribute(&self) -> &'static str {
        match self {
            ResourceKind::Client => "clientId",
            ResourceKind::IdentityProvider => "alias",
            ResourceKind::User => "username",
        }
    }

    /// Attribute holding the store-internal identifier.
    pub fn id_attribute(&self) -> &'static str {
        match self {
            ResourceKind::IdentityProvider => "internalId",
            ResourceKind::Client | ResourceKind::User => "id",
        }
    }

    /// Name of the kind's list in a bundle document.
    pub fn bundle_field(&self) -> &'static str {
        match self {
            ResourceKind::Client => "clients",
            ResourceKind::IdentityProvider => "identityProviders",
            ResourceKind::User => "users",
        }
    }

    /// Admin resource path for a stored resource, as used in admin events.
    pub fn resource_path(&self, id: &str, key: &str) -> String {
        match self {
            ResourceKind::Client => format!("clients/{}", id),
            // providers are addressed by their stable alias
            ResourceKind::IdentityProvider => format!("identity-provider/instances/{}", key),
            ResourceKind::User => format!("users/{}", id),
        }
    }

    /// Human-readable label used in messages.
    pub fn label(&self) -> &'static str {
        match self {
            ResourceKind::Client => "Client",
            ResourceKind::IdentityProvider => "Identity Provider",
            ResourceKind::User => "User",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            ResourceKind::Client => "CLIENT",
            ResourceKind::IdentityProvider => "IDP",
            ResourceKind::User => "USER",
        };
        f.write_str(tag)
    }
}
