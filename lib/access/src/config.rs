//! Console configuration.
//!
//! Loaded via the `config` crate from `DBWARDEN__`-prefixed environment
//! variables, with `__` separating nested keys:
//!
//! ```text
//! DBWARDEN__CONNECT_DESCRIPTOR=//db.internal:1521/ORCLPDB1
//! DBWARDEN__OPERATION_TIMEOUT_SECS=15
//! DBWARDEN__DEFAULTS__DEFAULT_TABLESPACE=APP_DATA
//! DBWARDEN__PASSWORD_POLICY__MIN_LENGTH=12
//! ```

use crate::error::ConfigError;
use config::builder::DefaultState;
use config::ConfigBuilder;
use serde::Deserialize;
use std::time::Duration;

/// Top-level console configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ConsoleConfig {
    /// Oracle connect descriptor.
    pub connect_descriptor: String,

    /// Upper bound on any single database call, in seconds.
    #[serde(default = "default_operation_timeout_secs")]
    pub operation_timeout_secs: u64,

    /// Defaults applied when creating accounts.
    #[serde(default)]
    pub defaults: AccountDefaults,

    /// Password strength rules.
    #[serde(default)]
    pub password_policy: PasswordPolicy,
}

fn default_operation_timeout_secs() -> u64 {
    30
}

/// Settings used for new accounts when the caller leaves them blank.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountDefaults {
    #[serde(default = "default_tablespace")]
    pub default_tablespace: String,
    #[serde(default = "default_temporary_tablespace")]
    pub temporary_tablespace: String,
    #[serde(default = "default_profile")]
    pub profile: String,
    #[serde(default = "default_quota")]
    pub quota: String,
}

fn default_tablespace() -> String {
    "USERS".to_string()
}

fn default_temporary_tablespace() -> String {
    "TEMP".to_string()
}

fn default_profile() -> String {
    "DEFAULT".to_string()
}

fn default_quota() -> String {
    "UNLIMITED".to_string()
}

impl Default for AccountDefaults {
    fn default() -> Self {
        Self {
            default_tablespace: default_tablespace(),
            temporary_tablespace: default_temporary_tablespace(),
            profile: default_profile(),
            quota: default_quota(),
        }
    }
}

/// Password strength rules enforced before a secret reaches the database.
#[derive(Debug, Clone, Deserialize)]
pub struct PasswordPolicy {
    #[serde(default = "default_min_length")]
    pub min_length: usize,
    #[serde(default = "default_true")]
    pub require_uppercase: bool,
    #[serde(default = "default_true")]
    pub require_lowercase: bool,
    #[serde(default = "default_true")]
    pub require_digit: bool,
    #[serde(default = "default_true")]
    pub require_special: bool,
}

fn default_min_length() -> usize {
    8
}

fn default_true() -> bool {
    true
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: default_min_length(),
            require_uppercase: true,
            require_lowercase: true,
            require_digit: true,
            require_special: true,
        }
    }
}

impl PasswordPolicy {
    /// Checks a candidate password, returning the first rule it breaks.
    ///
    /// # Errors
    ///
    /// Returns a description of the broken rule.
    pub fn check(&self, candidate: &str) -> Result<(), String> {
        if candidate.chars().count() < self.min_length {
            return Err(format!(
                "must be at least {} characters long",
                self.min_length
            ));
        }
        if self.require_uppercase && !candidate.chars().any(char::is_uppercase) {
            return Err("must contain an upper-case letter".to_string());
        }
        if self.require_lowercase && !candidate.chars().any(char::is_lowercase) {
            return Err("must contain a lower-case letter".to_string());
        }
        if self.require_digit && !candidate.chars().any(|c| c.is_ascii_digit()) {
            return Err("must contain a digit".to_string());
        }
        if self.require_special && !candidate.chars().any(|c| !c.is_alphanumeric()) {
            return Err("must contain a special character".to_string());
        }
        Ok(())
    }
}

impl ConsoleConfig {
    /// Creates a configuration with defaults for everything but the
    /// descriptor.
    #[must_use]
    pub fn new(connect_descriptor: impl Into<String>) -> Self {
        Self {
            connect_descriptor: connect_descriptor.into(),
            operation_timeout_secs: default_operation_timeout_secs(),
            defaults: AccountDefaults::default(),
            password_policy: PasswordPolicy::default(),
        }
    }

    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> dbwarden_core::Result<Self, ConfigError> {
        Self::load(
            config::Config::builder().add_source(
                config::Environment::with_prefix("DBWARDEN")
                    .separator("__")
                    .try_parsing(true),
            ),
        )
    }

    fn load(builder: ConfigBuilder<DefaultState>) -> dbwarden_core::Result<Self, ConfigError> {
        let config: Self = builder
            .build()
            .and_then(|c| c.try_deserialize::<Self>())
            .map_err(|e| ConfigError::Load {
                reason: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.connect_descriptor.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "connect_descriptor".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        if self.operation_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "operation_timeout_secs".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.password_policy.min_length == 0 {
            return Err(ConfigError::Invalid {
                key: "password_policy.min_length".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Returns the per-call timeout.
    #[must_use]
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_secs)
    }
}
