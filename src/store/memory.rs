use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use super::{CredentialStore, VersionedRecord};
use crate::model::credential::CredentialRecord;
use crate::utils::errors::{ErrorCode, WardenError};

///
/// An in-process CredentialStore.
///
/// Serialises writers with a single RwLock, so the version check and the
/// overwrite are one atomic step - the same guarantee a real store provides
/// with a conditional update.
///
#[derive(Default)]
pub struct MemoryCredentialStore {
    records: RwLock<HashMap<String, VersionedRecord>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn load(&self, account_id: &str) -> Result<Option<VersionedRecord>, WardenError> {
        Ok(self.records.read().get(account_id).cloned())
    }

    async fn save(&self, account_id: &str, record: &CredentialRecord, expected_version: u64)
        -> Result<u64, WardenError> {

        let mut records = self.records.write();

        match records.get_mut(account_id) {
            Some(existing) => {
                if existing.version != expected_version {
                    return Err(ErrorCode::PersistenceConflict.with_msg(&format!(
                        "account {}: expected version {} but the record is at {}",
                        account_id, expected_version, existing.version)))
                }

                existing.version += 1;
                existing.record = record.clone();
                Ok(existing.version)
            },
            None => {
                if expected_version != 0 {
                    return Err(ErrorCode::PersistenceConflict.with_msg(&format!(
                        "account {}: expected version {} but there is no record",
                        account_id, expected_version)))
                }

                records.insert(account_id.to_string(), VersionedRecord { version: 1, record: record.clone() });
                Ok(1)
            },
        }
    }
}
