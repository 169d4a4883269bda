//! The single result of an import run.

use crate::error::ImportError;
use crate::resolver::ConflictDecision;
use crate::resource::ResourceKind;
use serde::Serialize;
use serde_json::{Value, json};
use std::collections::BTreeMap;

/// Keys created and overwritten by an applied run, per kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    created: BTreeMap<ResourceKind, Vec<String>>,
    overwritten: BTreeMap<ResourceKind, Vec<String>>,
}

impl ImportSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_created(&mut self, kind: ResourceKind, key: impl Into<String>) {
        self.created.entry(kind).or_default().push(key.into());
    }

    pub(crate) fn record_overwritten(&mut self, kind: ResourceKind, key: impl Into<String>) {
        self.overwritten.entry(kind).or_default().push(key.into());
    }

    /// Keys created for `kind`, in bundle order.
    pub fn created(&self, kind: ResourceKind) -> &[String] {
        self.created.get(&kind).map(Vec::as_slice).unwrap_or_default()
    }

    /// Keys overwritten for `kind`, in bundle order.
    pub fn overwritten(&self, kind: ResourceKind) -> &[String] {
        self.overwritten
            .get(&kind)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Number of resources written by the run.
    pub fn total(&self) -> usize {
        self.created.values().chain(self.overwritten.values()).map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Why a bundle was refused without touching the realm.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rejection {
    /// Every blocking decision found during validation.
    pub conflicts: Vec<ConflictDecision>,
    pub reason: String,
}

impl Rejection {
    pub(crate) fn from_conflicts(conflicts: Vec<ConflictDecision>) -> Self {
        let reason = match conflicts.as_slice() {
            [single] => single.message(),
            many => format!("{} items conflict with the realm or the import", many.len()),
        };
        Self { conflicts, reason }
    }

    pub(crate) fn oversized(items: usize, limit: usize) -> Self {
        Self {
            conflicts: Vec::new(),
            reason: format!(
                "import carries {} items, more than the allowed {}",
                items, limit
            ),
        }
    }
}

/// A run that hit an error while validating or applying.
#[derive(Debug)]
pub struct ImportFailure {
    /// Kind of the item being applied when the run failed, if any.
    pub kind: Option<ResourceKind>,
    /// Natural key of that item.
    pub key: Option<String>,
    pub cause: ImportError,
    /// Whether the realm was restored to its state before the run.
    pub rolled_back: bool,
}

/// Outcome of one import run.
#[derive(Debug)]
pub enum ImportOutcome {
    Applied(ImportSummary),
    Rejected(Rejection),
    Failed(ImportFailure),
}

impl ImportOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, ImportOutcome::Applied(_))
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, ImportOutcome::Rejected(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ImportOutcome::Failed(_))
    }

    pub fn summary(&self) -> Option<&ImportSummary> {
        match self {
            ImportOutcome::Applied(summary) => Some(summary),
            _ => None,
        }
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            ImportOutcome::Rejected(rejection) => Some(rejection),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&ImportFailure> {
        match self {
            ImportOutcome::Failed(failure) => Some(failure),
            _ => None,
        }
    }

    /// Status code a transport layer should answer with.
    pub fn http_status(&self) -> u16 {
        match self {
            ImportOutcome::Applied(_) => 200,
            ImportOutcome::Rejected(_) => 409,
            ImportOutcome::Failed(_) => 500,
        }
    }

    /// Response document for the transport layer.
    pub fn response_body(&self) -> Value {
        match self {
            ImportOutcome::Applied(summary) => {
                let section = |map: &BTreeMap<ResourceKind, Vec<String>>| {
                    ResourceKind::ALL
                        .iter()
                        .filter_map(|kind| {
                            map.get(kind)
                                .map(|keys| (kind.bundle_field().to_string(), json!(keys)))
                        })
                        .collect::<serde_json::Map<String, Value>>()
                };
                json!({
                    "status": "applied",
                    "added": summary.total(),
                    "created": section(&summary.created),
                    "overwritten": section(&summary.overwritten),
                })
            }
            ImportOutcome::Rejected(rejection) => json!({
                "status": "rejected",
                "errorMessage": rejection.reason,
                "conflicts": rejection
                    .conflicts
                    .iter()
                    .map(|c| json!({
                        "type": c.kind,
                        "index": c.index,
                        "key": c.key,
                        "message": c.message(),
                    }))
                    .collect::<Vec<_>>(),
            }),
            ImportOutcome::Failed(failure) => json!({
                "status": "failed",
                "error": failure.cause.code(),
                "errorMessage": failure.cause.to_string(),
                "type": failure.kind,
                "key": failure.key,
                "rolledBack": failure.rolled_back,
            }),
        }
    }
}
