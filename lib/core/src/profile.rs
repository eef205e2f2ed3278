//! Profile resource limits.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The built-in profile every account falls back to. It cannot be dropped.
pub const DEFAULT_PROFILE: &str = "DEFAULT";

/// Resource limits the console manages on a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProfileResource {
    /// Concurrent sessions per account.
    SessionsPerUser,
    /// Total elapsed minutes per session.
    ConnectTime,
    /// Idle minutes before a session is disconnected.
    IdleTime,
}

impl ProfileResource {
    /// Every managed resource, in the order they appear in `ALTER PROFILE`.
    pub const ALL: [Self; 3] = [Self::SessionsPerUser, Self::ConnectTime, Self::IdleTime];

    /// Returns the data dictionary spelling.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SessionsPerUser => "SESSIONS_PER_USER",
            Self::ConnectTime => "CONNECT_TIME",
            Self::IdleTime => "IDLE_TIME",
        }
    }
}

impl fmt::Display for ProfileResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a resource limit value cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseLimitError {
    /// The offending input.
    pub value: String,
}

impl fmt::Display for ParseLimitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid resource limit '{}': expected UNLIMITED, DEFAULT or a non-negative integer",
            self.value
        )
    }
}

impl std::error::Error for ParseLimitError {}

/// The value of one profile resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ResourceLimit {
    /// No limit.
    Unlimited,
    /// Inherit the value from the `DEFAULT` profile.
    Default,
    /// An explicit limit.
    Value(u32),
}

impl fmt::Display for ResourceLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unlimited => f.write_str("UNLIMITED"),
            Self::Default => f.write_str("DEFAULT"),
            Self::Value(v) => write!(f, "{v}"),
        }
    }
}

impl FromStr for ResourceLimit {
    type Err = ParseLimitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let fail = || ParseLimitError {
            value: trimmed.to_string(),
        };

        match trimmed.to_ascii_uppercase().as_str() {
            "UNLIMITED" => Ok(Self::Unlimited),
            "DEFAULT" => Ok(Self::Default),
            digits if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) => {
                digits.parse().map(Self::Value).map_err(|_| fail())
            }
            _ => Err(fail()),
        }
    }
}

impl TryFrom<String> for ResourceLimit {
    type Error = ParseLimitError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ResourceLimit> for String {
    fn from(limit: ResourceLimit) -> Self {
        limit.to_string()
    }
}
