use std::cmp;
use std::sync::Arc;
use parking_lot::RwLock;
use chrono::{DateTime, Utc};
use crate::hashing::{PasswordHasher, SaltGenerator};
use crate::model::credential::CredentialRecord;
use crate::model::policy::{LockState, LockoutPolicy};
use crate::store::{CredentialStore, VersionedRecord};
use crate::utils::config::Configuration;
use crate::utils::errors::{ErrorCode, WardenError};
use crate::utils::time_provider::TimeProvider;

///
/// Orchestrates a credential operation: policy check, hash comparison,
/// counter update, persistence. The only component with side effects.
///
/// The state transitions themselves are pure - verify and set_password take
/// a record and return a new one, so the whole lockout state machine is
/// testable without a store or a wall clock. The async operations wrap those
/// with load/save against the injected store, running the CPU-bound hashing
/// on the blocking worker pool.
///
pub struct CredentialVerifier {
    policy: LockoutPolicy,
    hasher: PasswordHasher,
    store: Arc<dyn CredentialStore>,
    salter: RwLock<SaltGenerator>,
    time_provider: RwLock<TimeProvider>,
}

///
/// The outcome of one verification: did the password match, and the record
/// as it must now be persisted.
///
#[derive(Clone, Debug, PartialEq)]
pub struct Verification {
    pub matched: bool,
    pub record: CredentialRecord,
}

impl CredentialVerifier {
    pub fn new(policy: LockoutPolicy, hasher: PasswordHasher, store: Arc<dyn CredentialStore>) -> Self {
        CredentialVerifier {
            policy,
            hasher,
            store,
            salter: RwLock::new(SaltGenerator::default()),
            time_provider: RwLock::new(TimeProvider::default()),
        }
    }

    pub fn from_config(config: &Configuration, store: Arc<dyn CredentialStore>) -> Result<Self, WardenError> {
        Ok(Self::new(
            LockoutPolicy::from_config(config)?,
            PasswordHasher::from_config(config)?,
            store))
    }

    pub fn policy(&self) -> &LockoutPolicy {
        &self.policy
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.time_provider.read().now()
    }

    ///
    /// Set or clear the fixed time - tests travel through the lockout window
    /// instead of sleeping it out.
    ///
    pub fn set_now(&self, now: Option<DateTime<Utc>>) {
        self.time_provider.write().fix(now);
    }

    ///
    /// Set or clear a fixed salt, for tests that need a known hash.
    ///
    pub fn fix_salt(&self, salt: Option<String>) {
        self.salter.write().fix(salt);
    }

    ///
    /// Derive the record's lock state at a point in time.
    ///
    pub fn state(&self, record: &CredentialRecord, now: DateTime<Utc>) -> LockState {
        self.policy.state(record, now)
    }

    ///
    /// Re-hash the password with a fresh salt and return the updated record
    /// for the caller to persist. The failure counter and last check time are
    /// left alone - rotating a password is not a verification.
    ///
    pub fn set_password(&self, record: &CredentialRecord, new_password: &str)
        -> Result<CredentialRecord, WardenError> {

        let salt = self.salter.read().generate()?;
        set_password_record(&self.hasher, record, new_password, salt)
    }

    ///
    /// Check the candidate password against the record at time `now`.
    ///
    /// Fails with AccountLocked - without touching the record or the hasher -
    /// while a lockout window is open. Otherwise returns the match outcome
    /// and the updated record; persisting it is the caller's step.
    ///
    pub fn verify(&self, record: &CredentialRecord, candidate: &str, now: DateTime<Utc>)
        -> Result<Verification, WardenError> {

        verify_record(&self.policy, &self.hasher, record, candidate, now)
    }

    ///
    /// Load, verify and persist: the password-check endpoint calls this.
    ///
    /// The store rejects lost updates, so a concurrent check can't make this
    /// one under-count - on a conflict the verification is recomputed from
    /// the freshly loaded record and saved once more, then any second
    /// conflict surfaces to the caller.
    ///
    #[tracing::instrument(skip(self, candidate))]
    pub async fn check(&self, account_id: &str, candidate: &str) -> Result<bool, WardenError> {
        let loaded = self.load_existing(account_id).await?;
        let verification = self.verify_blocking(loaded.record, candidate).await?;

        let verification = match self.store.save(account_id, &verification.record, loaded.version).await {
            Ok(_) => verification,
            Err(err) if err.is_conflict() => {
                let fresh = self.load_existing(account_id).await?;
                let verification = self.verify_blocking(fresh.record, candidate).await?;
                self.store.save(account_id, &verification.record, fresh.version).await?;
                verification
            },
            Err(err) => return Err(err),
        };

        if !verification.matched && verification.record.failed_attempts >= self.policy.failure_threshold {
            tracing::warn!("account {} has reached the failure threshold and is now locked", account_id);
        }

        Ok(verification.matched)
    }

    ///
    /// Set or rotate an account's password, creating the credential record if
    /// this account never had one. Same single-retry conflict handling as
    /// check.
    ///
    #[tracing::instrument(skip(self, new_password))]
    pub async fn update_password(&self, account_id: &str, new_password: &str) -> Result<(), WardenError> {
        let (version, record) = self.load_or_new(account_id).await?;
        let updated = self.set_password_blocking(record, new_password).await?;

        match self.store.save(account_id, &updated, version).await {
            Ok(_) => Ok(()),
            Err(err) if err.is_conflict() => {
                let (version, record) = self.load_or_new(account_id).await?;
                let updated = self.set_password_blocking(record, new_password).await?;
                self.store.save(account_id, &updated, version).await?;
                Ok(())
            },
            Err(err) => Err(err),
        }
    }

    ///
    /// Administratively clear the failure counter so the next check is
    /// evaluated normally. Hash, salt and last check time are untouched.
    ///
    #[tracing::instrument(skip(self))]
    pub async fn unlock(&self, account_id: &str) -> Result<(), WardenError> {
        let loaded = self.load_existing(account_id).await?;
        let mut record = loaded.record;
        record.failed_attempts = 0;

        match self.store.save(account_id, &record, loaded.version).await {
            Ok(_) => Ok(()),
            Err(err) if err.is_conflict() => {
                let fresh = self.load_existing(account_id).await?;
                let mut record = fresh.record;
                record.failed_attempts = 0;
                self.store.save(account_id, &record, fresh.version).await?;
                Ok(())
            },
            Err(err) => Err(err),
        }
    }

    async fn load_existing(&self, account_id: &str) -> Result<VersionedRecord, WardenError> {
        self.store.load(account_id).await?
            .ok_or_else(|| ErrorCode::CredentialNotFound
                .with_msg(&format!("no credential record exists for account {}", account_id)))
    }

    async fn load_or_new(&self, account_id: &str) -> Result<(u64, CredentialRecord), WardenError> {
        Ok(match self.store.load(account_id).await? {
            Some(versioned) => (versioned.version, versioned.record),
            None => (0, CredentialRecord::new()),
        })
    }

    ///
    /// Run the pure verification on the blocking worker pool - key derivation
    /// is CPU-bound and must not stall the event loop.
    ///
    async fn verify_blocking(&self, record: CredentialRecord, candidate: &str)
        -> Result<Verification, WardenError> {

        let now = self.now();
        let policy = self.policy.clone();
        let hasher = self.hasher.clone();
        let candidate = candidate.to_string();

        tokio::task::spawn_blocking(move || verify_record(&policy, &hasher, &record, &candidate, now))
            .await
            .map_err(WardenError::from)?
    }

    async fn set_password_blocking(&self, record: CredentialRecord, new_password: &str)
        -> Result<CredentialRecord, WardenError> {

        let salt = self.salter.read().generate()?;
        let hasher = self.hasher.clone();
        let new_password = new_password.to_string();

        tokio::task::spawn_blocking(move || set_password_record(&hasher, &record, &new_password, salt))
            .await
            .map_err(WardenError::from)?
    }
}

///
/// The verification state machine. Pure: same inputs, same outcome.
///
fn verify_record(policy: &LockoutPolicy, hasher: &PasswordHasher, record: &CredentialRecord,
    candidate: &str, now: DateTime<Utc>) -> Result<Verification, WardenError> {

    // While the window is open nothing moves - no timestamp, no counter, no
    // hash. Re-checking a locked account must not stretch or shrink the
    // window it is already serving.
    if policy.is_locked(record, now) {
        return Err(ErrorCode::AccountLocked
            .with_msg("verification has failed too many times, wait and try again"))
    }

    let mut updated = record.clone();
    updated.last_check_time = Some(now);

    // A counter still at the threshold here means the lockout window has
    // elapsed - the account gets a fresh start before this attempt counts.
    if updated.failed_attempts >= policy.failure_threshold {
        updated.failed_attempts = 0;
    }

    // No password was ever set: a non-match, not an error, and the hasher is
    // never invoked.
    let matched = match (&record.password_hash, &record.salt) {
        (Some(stored), Some(salt)) => hasher.matches(candidate, salt, stored)?,
        _ => false,
    };

    updated.failed_attempts = match matched {
        true => 0,
        false => cmp::min(updated.failed_attempts.saturating_add(1), policy.failure_threshold),
    };

    Ok(Verification { matched, record: updated })
}

fn set_password_record(hasher: &PasswordHasher, record: &CredentialRecord, new_password: &str, salt: String)
    -> Result<CredentialRecord, WardenError> {

    let hash = hasher.hash_to_base64(new_password, &salt)?;

    let mut updated = record.clone();
    updated.password_hash = Some(hash);
    updated.salt = Some(salt);
    Ok(updated)
}
