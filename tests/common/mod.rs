//! Shared helpers for the import test suite.
//!
//! - [`FaultyStorage`] wraps [`InMemoryStorage`] and injects store failures
//! - [`RecordingListener`] collects admin events
//! - fixture builders for the three resource kinds

use realm_import::resource::{
    ClientRepresentation, IdentityProviderRepresentation, UserRepresentation,
};
use realm_import::storage::{
    InMemoryStorage, RealmSnapshot, StorageError, StorageKey, StoragePrefix, StorageProvider,
};
use realm_import::{AdminEvent, AdminEventListener, ImportCoordinator, PartialImport};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const REALM: &str = "acme";

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn client(client_id: &str) -> ClientRepresentation {
    ClientRepresentation::new(client_id)
}

pub fn idp(alias: &str) -> IdentityProviderRepresentation {
    IdentityProviderRepresentation::new(alias, "oidc")
}

pub fn user(username: &str) -> UserRepresentation {
    UserRepresentation::new(username).with_email(format!("{}@acme.test", username))
}

/// Bundle of users only; every item costs exactly one store write.
pub fn users_bundle<'a>(
    usernames: impl IntoIterator<Item = &'a str>,
    overwrite: bool,
) -> PartialImport {
    usernames
        .into_iter()
        .fold(PartialImport::new().with_overwrite(overwrite), |bundle, name| {
            bundle.with_user(user(name))
        })
}

/// Import `bundle` into a fresh coordinator's realm and assert it applied.
pub async fn seed<S: StorageProvider>(coordinator: &ImportCoordinator<S>, bundle: PartialImport) {
    let outcome = coordinator.import_bundle(REALM, bundle).await;
    assert!(outcome.is_applied(), "seeding failed: {:?}", outcome);
}

/// In-memory storage that fails on demand.
///
/// Writes are counted from zero; `failing_put(n)` fails only the n-th one, so
/// rollback writes issued afterwards still succeed.
pub struct FaultyStorage {
    inner: InMemoryStorage,
    puts: AtomicUsize,
    fail_on_put: Option<usize>,
    fail_flush: bool,
    fail_reads: bool,
    fail_deletes: bool,
}

impl FaultyStorage {
    pub fn new(inner: InMemoryStorage) -> Self {
        Self {
            inner,
            puts: AtomicUsize::new(0),
            fail_on_put: None,
            fail_flush: false,
            fail_reads: false,
            fail_deletes: false,
        }
    }

    pub fn failing_put(mut self, n: usize) -> Self {
        self.fail_on_put = Some(n);
        self
    }

    pub fn failing_flush(mut self) -> Self {
        self.fail_flush = true;
        self
    }

    pub fn failing_reads(mut self) -> Self {
        self.fail_reads = true;
        self
    }

    pub fn failing_deletes(mut self) -> Self {
        self.fail_deletes = true;
        self
    }

    pub fn inner(&self) -> &InMemoryStorage {
        &self.inner
    }

    pub async fn snapshot(&self) -> RealmSnapshot {
        self.inner.realm_snapshot(REALM).await
    }

    fn check_reads(&self) -> Result<(), StorageError> {
        if self.fail_reads {
            return Err(StorageError::unavailable("reads disabled"));
        }
        Ok(())
    }
}

impl StorageProvider for FaultyStorage {
    async fn put(&self, key: StorageKey, data: Value) -> Result<Value, StorageError> {
        let n = self.puts.fetch_add(1, Ordering::SeqCst);
        if self.fail_on_put == Some(n) {
            return Err(StorageError::internal(format!("injected failure on write #{}", n)));
        }
        self.inner.put(key, data).await
    }

    async fn get(&self, key: StorageKey) -> Result<Option<Value>, StorageError> {
        self.check_reads()?;
        self.inner.get(key).await
    }

    async fn delete(&self, key: StorageKey) -> Result<bool, StorageError> {
        if self.fail_deletes {
            return Err(StorageError::internal("deletes disabled"));
        }
        self.inner.delete(key).await
    }

    async fn list(
        &self,
        prefix: StoragePrefix,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<(StorageKey, Value)>, StorageError> {
        self.check_reads()?;
        self.inner.list(prefix, offset, limit).await
    }

    async fn find_by_attribute(
        &self,
        prefix: StoragePrefix,
        attribute: &str,
        value: &str,
    ) -> Result<Vec<(StorageKey, Value)>, StorageError> {
        self.check_reads()?;
        self.inner.find_by_attribute(prefix, attribute, value).await
    }

    async fn exists(&self, key: StorageKey) -> Result<bool, StorageError> {
        self.check_reads()?;
        self.inner.exists(key).await
    }

    async fn count(&self, prefix: StoragePrefix) -> Result<usize, StorageError> {
        self.check_reads()?;
        self.inner.count(prefix).await
    }

    async fn flush(&self, realm: &str) -> Result<(), StorageError> {
        if self.fail_flush {
            return Err(StorageError::unavailable(format!("realm '{}' is read-only", realm)));
        }
        self.inner.flush(realm).await
    }
}

/// Collects every admin event it receives.
#[derive(Default)]
pub struct RecordingListener {
    events: Mutex<Vec<AdminEvent>>,
}

impl RecordingListener {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<AdminEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl AdminEventListener for RecordingListener {
    fn on_event(&self, event: &AdminEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}
