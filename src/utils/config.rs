use dotenv::dotenv;
use config::ConfigError;
use serde::{Deserialize, Serialize};

///
/// The lockout and hashing knobs - initialised from the environment at start-up.
///
/// These are policy parameters, not per-record state: the account service sets
/// them once and every credential is judged against the same values.
///
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Configuration {
    pub failure_threshold: u32,  // Consecutive failed checks before an account is locked.
    pub lockout_seconds: u32,    // How long further checks are refused once locked.
    pub pbkdf2_rounds: u32,      // KDF iteration count.
    pub pbkdf2_output_len: u32,  // Derived key length in bytes.
}

impl Configuration {
    ///
    /// Load the subsystem's configuration.
    ///
    pub fn from_env() -> Result<Configuration, ConfigError> {
        // Load any local dev settings as environment variables from a .env file.
        dotenv().ok();

        let mut cfg = config::Config::default();

        // Merge any environment variables with the same name as the struct fields.
        cfg.merge(config::Environment::new())?;

        // Set defaults for settings that were not specified.
        cfg.set_default("failure_threshold", 10)?;
        cfg.set_default("lockout_seconds", 600)?;
        cfg.set_default("pbkdf2_rounds", 1000)?;
        cfg.set_default("pbkdf2_output_len", 128)?;

        let config: Configuration = cfg.try_into()?;

        Ok(config)
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            failure_threshold: 10,
            lockout_seconds: 600,
            pbkdf2_rounds: 1000,
            pbkdf2_output_len: 128,
        }
    }
}
