//! Tablespace quotas.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error returned when a quota cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseQuotaError {
    /// The offending input.
    pub value: String,
}

impl fmt::Display for ParseQuotaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid quota '{}': expected UNLIMITED or a size such as 500M",
            self.value
        )
    }
}

impl std::error::Error for ParseQuotaError {}

/// Size suffix of a quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuotaUnit {
    Bytes,
    Kilobytes,
    Megabytes,
    Gigabytes,
}

impl QuotaUnit {
    const fn suffix(&self) -> &'static str {
        match self {
            Self::Bytes => "",
            Self::Kilobytes => "K",
            Self::Megabytes => "M",
            Self::Gigabytes => "G",
        }
    }
}

/// Space an account may consume in its default tablespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Quota {
    Unlimited,
    Size { amount: u64, unit: QuotaUnit },
}

impl fmt::Display for Quota {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unlimited => f.write_str("UNLIMITED"),
            Self::Size { amount, unit } => write!(f, "{amount}{}", unit.suffix()),
        }
    }
}

impl FromStr for Quota {
    type Err = ParseQuotaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        let fail = || ParseQuotaError {
            value: s.trim().to_string(),
        };

        if upper == "UNLIMITED" {
            return Ok(Self::Unlimited);
        }

        let (digits, unit) = match upper.as_bytes().last() {
            Some(b'K') => (&upper[..upper.len() - 1], QuotaUnit::Kilobytes),
            Some(b'M') => (&upper[..upper.len() - 1], QuotaUnit::Megabytes),
            Some(b'G') => (&upper[..upper.len() - 1], QuotaUnit::Gigabytes),
            _ => (upper.as_str(), QuotaUnit::Bytes),
        };

        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(fail());
        }

        let amount = digits.parse().map_err(|_| fail())?;
        Ok(Self::Size { amount, unit })
    }
}

impl TryFrom<String> for Quota {
    type Error = ParseQuotaError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Quota> for String {
    fn from(quota: Quota) -> Self {
        quota.to_string()
    }
}
