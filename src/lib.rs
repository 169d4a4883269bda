//! All-or-nothing partial import of realm resources.
//!
//! A [`PartialImport`] bundle carries clients, identity providers and users
//! destined for one realm, plus a shared `overwrite` flag. The
//! [`ImportCoordinator`] classifies every item first and only then writes,
//! inside a single [`ImportTransaction`]: the realm receives the whole
//! bundle or nothing.
//!
//! # Core Components
//!
//! - [`ImportCoordinator`] - runs imports and produces an [`ImportOutcome`]
//! - [`ConflictResolver`] - decides create / overwrite / conflict per item
//! - [`ResourceStrategy`] - per-kind create and overwrite behaviour
//! - [`StorageProvider`](storage::StorageProvider) - pluggable document storage
//!
//! # Quick Start
//!
//! ```rust
//! use realm_import::{ImportCoordinator, ImportOutcome, PartialImport};
//! use realm_import::resource::{ClientRepresentation, ResourceKind};
//! use realm_import::storage::InMemoryStorage;
//!
//! # async fn example() {
//! let coordinator = ImportCoordinator::new(InMemoryStorage::new());
//!
//! let first = PartialImport::new().with_client(ClientRepresentation::new("foo"));
//! assert!(coordinator.import_bundle("acme", first).await.is_applied());
//!
//! // "foo" exists now, so without overwrite the whole bundle is refused
//! let second = PartialImport::new()
//!     .with_client(ClientRepresentation::new("foo"))
//!     .with_client(ClientRepresentation::new("bar"));
//! match coordinator.import_bundle("acme", second).await {
//!     ImportOutcome::Rejected(rejection) => assert_eq!(rejection.conflicts.len(), 1),
//!     other => panic!("unexpected outcome: {:?}", other),
//! }
//! # }
//! ```

pub mod config;
pub mod coordinator;
pub mod error;
pub mod events;
pub mod outcome;
pub mod realm_store;
pub mod resolver;
pub mod resource;
pub mod storage;
pub mod strategy;
pub mod transaction;

pub use config::ImportConfig;
pub use coordinator::{ImportCoordinator, ImportCoordinatorBuilder, ImportPhase};
pub use error::{ImportError, ImportResult};
pub use events::{AdminEvent, AdminEventListener, LoggingEventListener, OperationType};
pub use outcome::{ImportFailure, ImportOutcome, ImportSummary, Rejection};
pub use realm_store::{RealmStore, StoredResource};
pub use resolver::{
    ConflictDecision, ConflictReason, ConflictResolver, Resolution, ResolutionReport,
};
pub use resource::{PartialImport, ResourceKind};
pub use strategy::{AppliedResource, ResourceStrategy, StrategySet};
pub use transaction::{CommitFailure, ImportTransaction};
