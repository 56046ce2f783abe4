pub mod salt;

pub use salt::SaltGenerator;

use hmac::Hmac;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use serde::{Deserialize, Serialize};
use crate::utils::config::Configuration;
use crate::utils::errors::{ErrorCode, WardenError};

///
/// Derives a salted fingerprint of a password with PBKDF2-HMAC-SHA256.
///
/// The iteration count and derived key length are policy knobs. The defaults
/// match what the account service has always written, so changing them only
/// affects passwords hashed after the change - old records still verify
/// because the salt and hash are stored alongside each other.
///
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PasswordHasher {
    pub rounds: u32,
    pub output_len: u32, // Derived key length in bytes.
}

impl Default for PasswordHasher {
    fn default() -> Self {
        PasswordHasher {
            rounds: 1000,
            output_len: 128,
        }
    }
}

impl PasswordHasher {
    pub fn from_config(config: &Configuration) -> Result<Self, WardenError> {
        if config.pbkdf2_rounds < 1 {
            return Err(ErrorCode::InvalidRounds.with_msg("the iteration count must be at least 1"))
        }

        if config.pbkdf2_output_len < 1 {
            return Err(ErrorCode::InvalidOutputLen.with_msg("the derived key must be at least 1 byte"))
        }

        Ok(PasswordHasher {
            rounds: config.pbkdf2_rounds,
            output_len: config.pbkdf2_output_len,
        })
    }

    ///
    /// Derive the key for (password, salt). Deterministic: the same pair
    /// always yields the same bytes.
    ///
    /// The salt text is fed to the KDF as-is - its base64url rendering IS the
    /// salt bytes, which is the format every stored record uses.
    ///
    pub fn hash(&self, password: &str, salt: &str) -> Result<Vec<u8>, WardenError> {
        if salt.is_empty() {
            return Err(ErrorCode::HashingFailure.with_msg("refusing to hash with an empty salt"))
        }

        let mut derived = vec![0u8; self.output_len as usize];
        pbkdf2::pbkdf2::<Hmac<Sha256>>(password.as_bytes(), salt.as_bytes(), self.rounds, &mut derived);
        Ok(derived)
    }

    ///
    /// Derive the key and render it the way the record stores it.
    ///
    pub fn hash_to_base64(&self, password: &str, salt: &str) -> Result<String, WardenError> {
        Ok(base64::encode(&self.hash(password, salt)?))
    }

    ///
    /// Does the candidate password produce the stored (base64) hash?
    ///
    pub fn matches(&self, candidate: &str, salt: &str, stored_hash: &str) -> Result<bool, WardenError> {
        let stored = base64::decode(stored_hash)?;
        let derived = self.hash(candidate, salt)?;
        Ok(compare(&derived, &stored))
    }
}

///
/// Constant-time equality over the full length of both keys - a comparison
/// that bails at the first differing byte leaks how much of the hash an
/// attacker has recovered.
///
pub fn compare(candidate: &[u8], stored: &[u8]) -> bool {
    candidate.ct_eq(stored).into()
}
