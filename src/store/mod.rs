pub mod memory;

pub use memory::MemoryCredentialStore;

use async_trait::async_trait;
use crate::model::credential::CredentialRecord;
use crate::utils::errors::WardenError;

///
/// One credential record per account, with optimistic versioning.
///
/// The store owns per-account write serialisation: a save carries the version
/// the caller loaded, and a save against any other version must fail loudly
/// with PersistenceConflict rather than clobber the newer record. Without
/// that, two concurrent checks could both read failed_attempts = n and both
/// write n + 1, and an attacker gets free extra guesses.
///
/// Implementations sit in the account service (document store, SQL row with
/// a version column, etc.); [MemoryCredentialStore] is the in-process
/// reference used by the tests.
///
#[async_trait]
pub trait CredentialStore: Send + Sync {
    ///
    /// Load the record for an account. None if no record was ever created.
    ///
    async fn load(&self, account_id: &str) -> Result<Option<VersionedRecord>, WardenError>;

    ///
    /// Persist the record, expecting to replace `expected_version`.
    ///
    /// Pass version 0 to create a record that doesn't exist yet. Returns the
    /// new version. Fails with PersistenceConflict on a lost update - the
    /// caller reloads and recomputes, it must never retry the same write.
    ///
    async fn save(&self, account_id: &str, record: &CredentialRecord, expected_version: u64)
        -> Result<u64, WardenError>;
}

///
/// A record plus the version token its save must present.
///
#[derive(Clone, Debug, PartialEq)]
pub struct VersionedRecord {
    pub version: u64,
    pub record: CredentialRecord,
}
