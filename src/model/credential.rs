use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

///
/// The persisted authentication state for one account.
///
/// The shape is deliberately flat - it is what the account service writes
/// into its document store, so renaming or nesting these fields is a schema
/// migration for every caller. The derived lock state lives in
/// [crate::model::policy::LockState] and is never persisted.
///
/// A record starts empty at account creation and gains a hash and salt the
/// first time a password is set. The hash is the standard-base64 rendering
/// of the derived key; the salt is url-safe base64 text which is fed to the
/// KDF as-is. Either both are present or neither is.
///
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct CredentialRecord {
    pub password_hash: Option<String>,
    pub salt: Option<String>,
    pub failed_attempts: u32,
    pub last_check_time: Option<DateTime<Utc>>,
}

impl CredentialRecord {
    ///
    /// A fresh record: no password yet, clean counter, never checked.
    ///
    pub fn new() -> Self {
        CredentialRecord {
            password_hash: None,
            salt: None,
            failed_attempts: 0,
            last_check_time: None,
        }
    }

    pub fn has_password(&self) -> bool {
        self.password_hash.is_some()
    }
}

impl Default for CredentialRecord {
    fn default() -> Self {
        Self::new()
    }
}
