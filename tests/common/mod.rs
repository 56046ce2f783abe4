use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use warden::CredentialVerifier;
use warden::hashing::PasswordHasher;
use warden::model::credential::CredentialRecord;
use warden::model::policy::LockoutPolicy;
use warden::store::{CredentialStore, MemoryCredentialStore, VersionedRecord};
use warden::utils::config::Configuration;
use warden::utils::errors::{ErrorCode, WardenError};
use tracing_subscriber::{prelude::__tracing_subscriber_SubscriberExt, Registry, util::SubscriberInitExt};

lazy_static! {
    // Tracing is process-wide - initialise it once for the whole test binary.
    static ref TRACING: () = {
        if let Err(err) = Registry::default()
            .with(tracing_subscriber::EnvFilter::from_default_env())
            .with(tracing_subscriber::fmt::layer().with_test_writer().with_ansi(true))
            .try_init() {
                tracing::info!("Tracing already initialised: {}", err.to_string());
        }
    };
}

///
/// A verifier wired to a fresh in-memory store, using the out-of-the-box
/// configuration (threshold 10, ten minute lockout, PBKDF2 1000/128).
///
pub fn start_warden() -> (CredentialVerifier, Arc<MemoryCredentialStore>) {
    lazy_static::initialize(&TRACING);

    let store = Arc::new(MemoryCredentialStore::new());
    let verifier = CredentialVerifier::from_config(&Configuration::default(), store.clone())
        .expect("The default configuration must build a verifier");

    (verifier, store)
}

///
/// A verifier with bespoke lockout knobs and quick hashing.
///
pub fn start_warden_with(failure_threshold: u32, lockout_seconds: u32)
    -> (CredentialVerifier, Arc<MemoryCredentialStore>) {

    lazy_static::initialize(&TRACING);

    let store = Arc::new(MemoryCredentialStore::new());
    let verifier = CredentialVerifier::new(
        LockoutPolicy { failure_threshold, lockout_seconds },
        PasswordHasher { rounds: 10, output_len: 32 },
        store.clone());

    (verifier, store)
}

pub fn time(s: &str) -> DateTime<Utc> {
    s.parse().expect("test timestamps must be RFC3339")
}

///
/// Reads the persisted counter straight out of the store, bypassing the
/// verifier - the tests assert on what was actually saved.
///
pub async fn stored_failures(store: &MemoryCredentialStore, account_id: &str) -> u32 {
    store.load(account_id).await.unwrap()
        .expect("the account should have a record by now")
        .record.failed_attempts
}

///
/// A store that reports PersistenceConflict for the next `failing` saves,
/// then behaves. Stands in for a busy store losing optimistic updates.
///
pub struct FlakyStore {
    inner: MemoryCredentialStore,
    conflicts_remaining: AtomicU32,
}

impl FlakyStore {
    pub fn failing(conflicts: u32) -> Self {
        FlakyStore {
            inner: MemoryCredentialStore::new(),
            conflicts_remaining: AtomicU32::new(conflicts),
        }
    }

    ///
    /// Arm the store to lose the next `conflicts` saves.
    ///
    pub fn fail_next(&self, conflicts: u32) {
        self.conflicts_remaining.store(conflicts, Ordering::SeqCst);
    }
}

#[async_trait]
impl CredentialStore for FlakyStore {
    async fn load(&self, account_id: &str) -> Result<Option<VersionedRecord>, WardenError> {
        self.inner.load(account_id).await
    }

    async fn save(&self, account_id: &str, record: &CredentialRecord, expected_version: u64)
        -> Result<u64, WardenError> {

        if self.conflicts_remaining.load(Ordering::SeqCst) > 0 {
            self.conflicts_remaining.fetch_sub(1, Ordering::SeqCst);
            return Err(ErrorCode::PersistenceConflict
                .with_msg(&format!("account {}: simulated lost update", account_id)))
        }

        self.inner.save(account_id, record, expected_version).await
    }
}
