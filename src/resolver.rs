//! Conflict resolution: classify every bundle item before anything is written.
//!
//! For each kind the items are walked in bundle order while remembering the
//! keys already decided in this run:
//!
//! 1. no natural key → [`Resolution::Invalid`]
//! 2. key seen earlier in the bundle → [`ConflictReason::DuplicateInBundle`]
//! 3. key exists in the realm → [`Resolution::Overwrite`] when overwriting,
//!    otherwise [`ConflictReason::AlreadyExists`]
//! 4. otherwise → [`Resolution::Create`]
//!
//! An item that would be created or overwritten under a supplied internal id
//! is then checked once more: the id must not be claimed by an earlier item of
//! the same kind, nor held in the realm by a resource with another key.
//! Either clash is [`ConflictReason::IdTaken`].
//!
//! The resolver only reads through a [`RealmStore`], so it always runs to
//! completion, even for bundles that end up rejected.

use crate::realm_store::RealmStore;
use crate::resource::{PartialImport, ResourceKind};
use crate::storage::{StorageError, StorageProvider};
use crate::strategy::ResourceStrategy;
use log::debug;
use serde::Serialize;
use std::collections::HashMap;

/// Why an item cannot be imported as submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ConflictReason {
    /// A resource with the same key exists and overwriting is disabled.
    AlreadyExists { message: String },
    /// The same key was already submitted earlier in this bundle.
    #[serde(rename_all = "camelCase")]
    DuplicateInBundle { first_index: usize },
    /// The supplied internal id belongs to another resource. `first_index` is
    /// set when the holder is an earlier item of this bundle.
    #[serde(rename_all = "camelCase")]
    IdTaken {
        id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        first_index: Option<usize>,
    },
}

/// What the coordinator will do with an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", content = "detail", rename_all = "camelCase")]
pub enum Resolution {
    Create,
    Overwrite,
    Conflict(ConflictReason),
    /// The item is malformed (e.g. has no natural key).
    Invalid(String),
}

impl Resolution {
    /// Blocking resolutions reject the whole bundle.
    pub fn is_blocking(&self) -> bool {
        matches!(self, Resolution::Conflict(_) | Resolution::Invalid(_))
    }
}

/// The decision for one bundle item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictDecision {
    pub kind: ResourceKind,
    /// Position of the item within its kind's list.
    pub index: usize,
    /// Natural key; `None` only for invalid items.
    pub key: Option<String>,
    pub resolution: Resolution,
}

impl ConflictDecision {
    /// Human-readable description for reporting.
    pub fn message(&self) -> String {
        let key = self.key.as_deref().unwrap_or_default();
        match &self.resolution {
            Resolution::Create => format!("{} '{}' will be created", self.kind.label(), key),
            Resolution::Overwrite => {
                format!("{} '{}' will be overwritten", self.kind.label(), key)
            }
            Resolution::Conflict(ConflictReason::AlreadyExists { message }) => message.clone(),
            Resolution::Conflict(ConflictReason::DuplicateInBundle { first_index }) => format!(
                "{} '{}' appears more than once in the import (first at position {})",
                self.kind.label(),
                key,
                first_index
            ),
            Resolution::Conflict(ConflictReason::IdTaken {
                id,
                first_index: Some(first_index),
            }) => format!(
                "{} '{}' uses id '{}', already claimed at position {}",
                self.kind.label(),
                key,
                id,
                first_index
            ),
            Resolution::Conflict(ConflictReason::IdTaken {
                id,
                first_index: None,
            }) => format!(
                "{} '{}' uses id '{}', which belongs to another {} in the realm",
                self.kind.label(),
                key,
                id,
                self.kind.label()
            ),
            Resolution::Invalid(message) => message.clone(),
        }
    }
}

/// Classifies bundle items for one run.
#[derive(Debug, Clone, Copy)]
pub struct ConflictResolver {
    overwrite: bool,
}

impl ConflictResolver {
    pub fn new(overwrite: bool) -> Self {
        Self { overwrite }
    }

    /// Decide every item of the strategy's kind, in bundle order.
    pub async fn resolve<S, T>(
        &self,
        strategy: &T,
        store: &RealmStore<'_, S>,
        bundle: &PartialImport,
    ) -> Result<Vec<ConflictDecision>, StorageError>
    where
        S: StorageProvider,
        T: ResourceStrategy,
    {
        let kind = strategy.kind();
        let mut seen: HashMap<String, usize> = HashMap::new();
        let mut claimed: HashMap<String, usize> = HashMap::new();
        let mut decisions = Vec::new();

        for (index, item) in strategy.list(bundle).iter().enumerate() {
            let Some(key) = strategy.key(item) else {
                decisions.push(ConflictDecision {
                    kind,
                    index,
                    key: None,
                    resolution: Resolution::Invalid(format!(
                        "{} at position {} is missing '{}'",
                        kind.label(),
                        index,
                        kind.key_attribute()
                    )),
                });
                continue;
            };

            let resolution = if let Some(first_index) = seen.get(&key) {
                Resolution::Conflict(ConflictReason::DuplicateInBundle {
                    first_index: *first_index,
                })
            } else if strategy.exists(store, item).await? {
                if self.overwrite {
                    Resolution::Overwrite
                } else {
                    Resolution::Conflict(ConflictReason::AlreadyExists {
                        message: strategy.conflict_message(item),
                    })
                }
            } else {
                Resolution::Create
            };

            let resolution = if resolution.is_blocking() {
                resolution
            } else {
                Self::check_claimed_id(
                    strategy,
                    store,
                    item,
                    &key,
                    index,
                    resolution,
                    &mut claimed,
                )
                .await?
            };

            debug!("{} '{}' -> {:?}", kind, key, resolution);
            seen.entry(key.clone()).or_insert(index);
            decisions.push(ConflictDecision {
                kind,
                index,
                key: Some(key),
                resolution,
            });
        }

        Ok(decisions)
    }

    /// Turn a create or overwrite into [`ConflictReason::IdTaken`] when the
    /// id the item claims is already spoken for.
    async fn check_claimed_id<S, T>(
        strategy: &T,
        store: &RealmStore<'_, S>,
        item: &T::Item,
        key: &str,
        index: usize,
        resolution: Resolution,
        claimed: &mut HashMap<String, usize>,
    ) -> Result<Resolution, StorageError>
    where
        S: StorageProvider,
        T: ResourceStrategy,
    {
        let overwriting = resolution == Resolution::Overwrite;
        let Some(id) = strategy.claimed_id(item, overwriting) else {
            return Ok(resolution);
        };

        if let Some(first_index) = claimed.get(&id) {
            return Ok(Resolution::Conflict(ConflictReason::IdTaken {
                id,
                first_index: Some(*first_index),
            }));
        }
        claimed.insert(id.clone(), index);

        let Some(holder) = store.get(strategy.kind(), &id).await? else {
            return Ok(resolution);
        };
        // an overwrite may keep the id of the resource it replaces
        if overwriting {
            let replaced = strategy.find_existing(store, key).await?;
            if replaced.is_some_and(|existing| existing.id() == holder.id()) {
                return Ok(resolution);
            }
        }

        Ok(Resolution::Conflict(ConflictReason::IdTaken {
            id,
            first_index: None,
        }))
    }
}

/// Every decision of one validation pass, in processing order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionReport {
    pub overwrite: bool,
    decisions: Vec<ConflictDecision>,
}

impl ResolutionReport {
    pub fn new(overwrite: bool, decisions: Vec<ConflictDecision>) -> Self {
        Self {
            overwrite,
            decisions,
        }
    }

    pub fn decisions(&self) -> &[ConflictDecision] {
        &self.decisions
    }

    /// Decisions for one kind, in bundle order.
    pub fn for_kind(&self, kind: ResourceKind) -> impl Iterator<Item = &ConflictDecision> {
        self.decisions.iter().filter(move |d| d.kind == kind)
    }

    /// Decisions that prevent the bundle from being applied.
    pub fn blocking(&self) -> Vec<ConflictDecision> {
        self.decisions
            .iter()
            .filter(|d| d.resolution.is_blocking())
            .cloned()
            .collect()
    }

    pub fn is_blocked(&self) -> bool {
        self.decisions.iter().any(|d| d.resolution.is_blocking())
    }

    /// Keys that would be created, across all kinds.
    pub fn creates(&self) -> usize {
        self.count(|r| matches!(r, Resolution::Create))
    }

    /// Keys that would be overwritten, across all kinds.
    pub fn overwrites(&self) -> usize {
        self.count(|r| matches!(r, Resolution::Overwrite))
    }

    fn count(&self, predicate: impl Fn(&Resolution) -> bool) -> usize {
        self.decisions
            .iter()
            .filter(|d| predicate(&d.resolution))
            .count()
    }
}
