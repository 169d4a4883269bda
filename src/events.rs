//! Admin events published after an import commits.

use crate::resource::ResourceKind;
use crate::strategy::AppliedResource;
use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationType {
    Create,
    Update,
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationType::Create => f.write_str("CREATE"),
            OperationType::Update => f.write_str("UPDATE"),
        }
    }
}

/// One resource written by a committed import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminEvent {
    pub time: DateTime<Utc>,
    pub realm: String,
    /// Id of the import run that produced the event.
    pub import_id: String,
    pub operation: OperationType,
    pub kind: ResourceKind,
    pub resource_path: String,
    pub resource_id: String,
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub representation: Option<Value>,
}

impl AdminEvent {
    pub(crate) fn from_applied(
        realm: &str,
        import_id: &str,
        operation: OperationType,
        applied: AppliedResource,
        include_representation: bool,
    ) -> Self {
        Self {
            time: Utc::now(),
            realm: realm.to_string(),
            import_id: import_id.to_string(),
            operation,
            kind: applied.kind,
            resource_path: applied.kind.resource_path(&applied.id, &applied.key),
            resource_id: applied.id,
            key: applied.key,
            representation: include_representation.then_some(applied.representation),
        }
    }
}

/// Receives admin events. Called synchronously, in commit order.
pub trait AdminEventListener: Send + Sync {
    fn on_event(&self, event: &AdminEvent);
}

/// Writes every event to the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingEventListener;

impl AdminEventListener for LoggingEventListener {
    fn on_event(&self, event: &AdminEvent) {
        info!(
            "admin event realm={} op={} path={} key={}",
            event.realm, event.operation, event.resource_path, event.key
        );
    }
}
