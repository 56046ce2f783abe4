use serde::{Deserialize, Serialize};
use chrono::{DateTime, Duration, Utc};
use crate::model::credential::CredentialRecord;
use crate::utils::config::Configuration;
use crate::utils::errors::{ErrorCode, WardenError};

///
/// The brute-force lockout policy: after failure_threshold consecutive failed
/// checks, refuse further checks for lockout_seconds.
///
/// This is a pure decision function - it never touches the record, the store
/// or the wall clock.
///
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct LockoutPolicy {
    pub failure_threshold: u32,
    pub lockout_seconds: u32,
}

///
/// The state machine a record's counter and timestamp encode.
///
/// Derived on demand, never stored - the persisted shape stays the flat
/// (failed_attempts, last_check_time) pair.
///
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LockState {
    Open { failures: u32 },
    Locked { since: DateTime<Utc> },
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        LockoutPolicy {
            failure_threshold: 10,
            lockout_seconds: 10 * 60,
        }
    }
}

impl LockoutPolicy {
    pub fn from_config(config: &Configuration) -> Result<Self, WardenError> {
        if config.failure_threshold < 1 {
            return Err(ErrorCode::InvalidThreshold
                .with_msg("the failure threshold must allow at least one attempt"))
        }

        Ok(LockoutPolicy {
            failure_threshold: config.failure_threshold,
            lockout_seconds: config.lockout_seconds,
        })
    }

    ///
    /// Derive the record's current state.
    ///
    /// The window is anchored to the most recent check, not the first failure:
    /// every failed attempt re-arms it. A record with no last_check_time has
    /// never been checked and is always open - the counter only moves inside a
    /// verification, which also stamps the time.
    ///
    pub fn state(&self, record: &CredentialRecord, now: DateTime<Utc>) -> LockState {
        if record.failed_attempts >= self.failure_threshold {
            if let Some(last_check) = record.last_check_time {
                if (now - last_check).num_seconds() < self.lockout_seconds as i64 {
                    return LockState::Locked { since: last_check }
                }
            }
        }

        LockState::Open { failures: record.failed_attempts }
    }

    ///
    /// Is verification currently blocked for this record?
    ///
    pub fn is_locked(&self, record: &CredentialRecord, now: DateTime<Utc>) -> bool {
        matches!(self.state(record, now), LockState::Locked { .. })
    }

    ///
    /// When the current lockout window ends, if the record is locked.
    ///
    pub fn locked_until(&self, record: &CredentialRecord, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self.state(record, now) {
            LockState::Locked { since } => Some(since + Duration::seconds(self.lockout_seconds as i64)),
            LockState::Open { .. } => None,
        }
    }
}
