//! Import operations: preview, run, and the per-kind apply loop.

use crate::coordinator::ImportCoordinator;
use crate::coordinator::phase::{ImportPhase, ImportRun};
use crate::error::{ImportError, ImportResult};
use crate::events::{AdminEvent, OperationType};
use crate::outcome::{ImportFailure, ImportOutcome, ImportSummary, Rejection};
use crate::realm_store::RealmStore;
use crate::resolver::{ConflictResolver, Resolution, ResolutionReport};
use crate::resource::{PartialImport, ResourceKind};
use crate::storage::{StorageError, StorageProvider};
use crate::strategy::{AppliedResource, ResourceStrategy};
use crate::transaction::ImportTransaction;
use log::{debug, error, info, warn};

/// Error raised while applying one item.
struct ItemFailure {
    key: Option<String>,
    cause: ImportError,
}

type Applied = Vec<(OperationType, AppliedResource)>;

impl<S: StorageProvider> ImportCoordinator<S> {
    /// Classify every item of `bundle` against the realm without writing.
    pub async fn preview(
        &self,
        realm: &str,
        bundle: &PartialImport,
    ) -> ImportResult<ResolutionReport> {
        let store = RealmStore::new(&self.storage, realm);
        Ok(self.resolve(&store, bundle).await?)
    }

    /// Parse a JSON bundle and import it.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::Json`] if the document is not a valid bundle.
    /// Every other problem is reported through the returned outcome.
    pub async fn import_json(&self, realm: &str, input: &str) -> ImportResult<ImportOutcome> {
        let bundle = PartialImport::from_json(input)?;
        Ok(self.import_bundle(realm, bundle).await)
    }

    /// Import `bundle` into `realm` as one all-or-nothing batch.
    pub async fn import_bundle(&self, realm: &str, bundle: PartialImport) -> ImportOutcome {
        let lock = self.realm_lock(realm).await;
        let outcome = {
            let _guard = lock.lock().await;
            self.run(realm, bundle).await
        };
        self.release_realm_lock(realm, lock).await;
        outcome
    }

    async fn run(&self, realm: &str, bundle: PartialImport) -> ImportOutcome {
        let mut run = ImportRun::new(realm);
        info!(
            "import {} on realm '{}': {} items, overwrite={}",
            run.id,
            realm,
            bundle.total_items(),
            bundle.overwrite
        );

        run.advance(ImportPhase::Validating);

        if let Some(limit) = self.config.max_bundle_items {
            let items = bundle.total_items();
            if items > limit {
                run.advance(ImportPhase::Rejected);
                warn!(
                    "import {} rejected: {} items exceed the limit of {}",
                    run.id, items, limit
                );
                return ImportOutcome::Rejected(Rejection::oversized(items, limit));
            }
        }

        let store = RealmStore::new(&self.storage, realm);
        let report = match self.resolve(&store, &bundle).await {
            Ok(report) => report,
            Err(e) => {
                run.advance(ImportPhase::Failed);
                error!("import {} could not read realm '{}': {}", run.id, realm, e);
                return ImportOutcome::Failed(ImportFailure {
                    kind: None,
                    key: None,
                    cause: e.into(),
                    rolled_back: true,
                });
            }
        };

        if report.is_blocked() {
            run.advance(ImportPhase::Rejected);
            let rejection = Rejection::from_conflicts(report.blocking());
            warn!("import {} rejected: {}", run.id, rejection.reason);
            return ImportOutcome::Rejected(rejection);
        }

        run.advance(ImportPhase::Applying);
        let mut tx = ImportTransaction::begin(store);
        let mut applied = Applied::new();

        for kind in ResourceKind::ALL {
            let result = match kind {
                ResourceKind::Client => {
                    self.apply_kind(
                        &self.strategies.clients,
                        &mut tx,
                        &bundle,
                        &report,
                        &mut applied,
                    )
                    .await
                }
                ResourceKind::IdentityProvider => {
                    self.apply_kind(
                        &self.strategies.identity_providers,
                        &mut tx,
                        &bundle,
                        &report,
                        &mut applied,
                    )
                    .await
                }
                ResourceKind::User => {
                    self.apply_kind(
                        &self.strategies.users,
                        &mut tx,
                        &bundle,
                        &report,
                        &mut applied,
                    )
                    .await
                }
            };

            if let Err(failure) = result {
                warn!(
                    "import {} failed on {} '{}': {}",
                    run.id,
                    kind,
                    failure.key.as_deref().unwrap_or("?"),
                    failure.cause
                );
                let rolled_back = match tx.rollback().await {
                    Ok(undone) => {
                        debug!("import {} undid {} mutations", run.id, undone);
                        true
                    }
                    Err(e) => {
                        error!(
                            "import {} could not roll back realm '{}': {}",
                            run.id, realm, e
                        );
                        false
                    }
                };
                run.advance(ImportPhase::Failed);
                return ImportOutcome::Failed(ImportFailure {
                    kind: Some(kind),
                    key: failure.key,
                    cause: failure.cause,
                    rolled_back,
                });
            }
        }

        if let Err(failure) = tx.commit().await {
            if !failure.rolled_back {
                error!(
                    "import {} could not roll back realm '{}' after a failed commit",
                    run.id, realm
                );
            }
            run.advance(ImportPhase::Failed);
            return ImportOutcome::Failed(ImportFailure {
                kind: None,
                key: None,
                cause: failure.cause,
                rolled_back: failure.rolled_back,
            });
        }

        run.advance(ImportPhase::Applied);
        let mut summary = ImportSummary::new();
        for (operation, resource) in &applied {
            match operation {
                OperationType::Create => {
                    summary.record_created(resource.kind, resource.key.as_str())
                }
                OperationType::Update => {
                    summary.record_overwritten(resource.kind, resource.key.as_str())
                }
            }
        }
        info!(
            "import {} on realm '{}' applied {} resources",
            run.id,
            realm,
            summary.total()
        );

        self.publish(&run, applied);
        ImportOutcome::Applied(summary)
    }

    /// Run the resolver over every kind, in processing order.
    pub(super) async fn resolve(
        &self,
        store: &RealmStore<'_, S>,
        bundle: &PartialImport,
    ) -> Result<ResolutionReport, StorageError> {
        let resolver = ConflictResolver::new(bundle.overwrite);
        let mut decisions = Vec::with_capacity(bundle.total_items());
        for kind in ResourceKind::ALL {
            let found = match kind {
                ResourceKind::Client => {
                    resolver.resolve(&self.strategies.clients, store, bundle).await?
                }
                ResourceKind::IdentityProvider => {
                    resolver
                        .resolve(&self.strategies.identity_providers, store, bundle)
                        .await?
                }
                ResourceKind::User => {
                    resolver.resolve(&self.strategies.users, store, bundle).await?
                }
            };
            decisions.extend(found);
        }
        Ok(ResolutionReport::new(bundle.overwrite, decisions))
    }

    async fn apply_kind<T: ResourceStrategy>(
        &self,
        strategy: &T,
        tx: &mut ImportTransaction<'_, S>,
        bundle: &PartialImport,
        report: &ResolutionReport,
        applied: &mut Applied,
    ) -> Result<(), ItemFailure> {
        let items = strategy.list(bundle);
        for decision in report.for_kind(strategy.kind()) {
            let key = decision.key.clone();
            let Some(item) = items.get(decision.index) else {
                return Err(ItemFailure {
                    key,
                    cause: ImportError::internal(format!(
                        "decision for {} #{} has no matching item",
                        decision.kind, decision.index
                    )),
                });
            };

            let result = match &decision.resolution {
                Resolution::Create => strategy
                    .create(tx, item)
                    .await
                    .map(|r| (OperationType::Create, r)),
                Resolution::Overwrite => strategy
                    .overwrite(tx, item)
                    .await
                    .map(|r| (OperationType::Update, r)),
                blocking => Err(ImportError::internal(format!(
                    "blocking decision {:?} reached the apply phase",
                    blocking
                ))),
            };

            match result {
                Ok(entry) => {
                    debug!("{} {} '{}'", entry.0, decision.kind, entry.1.key);
                    applied.push(entry);
                }
                Err(cause) => return Err(ItemFailure { key, cause }),
            }
        }
        Ok(())
    }

    fn publish(&self, run: &ImportRun, applied: Applied) {
        if !self.config.emit_admin_events || self.listeners.is_empty() {
            return;
        }
        for (operation, resource) in applied {
            let event = AdminEvent::from_applied(
                &run.realm,
                &run.id,
                operation,
                resource,
                self.config.include_representation,
            );
            for listener in &self.listeners {
                listener.on_event(&event);
            }
        }
    }
}
