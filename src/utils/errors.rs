use derive_more::Display;
use tokio::task::JoinError;

#[derive(Clone, Copy, Debug, Display, PartialEq)]
pub enum ErrorCode {
    ConfigurationInvalid    = 0500,
    HashThreadingIssue      = 0501,
    InvalidBase64           = 0502,
    EntropyFailure          = 0503,
    HashingFailure          = 0504,
    InvalidRounds           = 1300,
    InvalidOutputLen        = 1301,
    InvalidThreshold        = 1302,
    CredentialNotFound      = 2101,
    AccountLocked           = 2102,
    PersistenceConflict     = 2105,
}

impl ErrorCode {
    pub fn with_msg(&self, message: &str) -> WardenError {
        WardenError::new(*self, message)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct WardenError {
    error_code: ErrorCode,
    message: String,
}

impl WardenError {
    pub fn new(error_code: ErrorCode, message: &str) -> Self {
        WardenError { error_code, message: message.to_string() }
    }

    pub fn error_code(&self) -> ErrorCode {
        self.error_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    ///
    /// True if this is the store rejecting a lost update - the one error the
    /// verifier recovers from (by reloading and recomputing once).
    ///
    pub fn is_conflict(&self) -> bool {
        self.error_code == ErrorCode::PersistenceConflict
    }
}

impl From<config::ConfigError> for WardenError {
    fn from(error: config::ConfigError) -> Self {
        ErrorCode::ConfigurationInvalid.with_msg(&format!("The service configuration is not correct: {}", error))
    }
}

impl From<JoinError> for WardenError {
    fn from(error: JoinError) -> Self {
        ErrorCode::HashThreadingIssue.with_msg(&format!("Unable to hash: {}", error))
    }
}

impl From<base64::DecodeError> for WardenError {
    fn from(error: base64::DecodeError) -> Self {
        ErrorCode::InvalidBase64.with_msg(&format!("Unable to decode stored value: {}", error))
    }
}

impl From<rand::Error> for WardenError {
    fn from(error: rand::Error) -> Self {
        ErrorCode::EntropyFailure.with_msg(&format!("The entropy source failed: {}", error))
    }
}
