//! Error types for the access crate.
//!
//! Errors are designed for layered context using rootcause:
//! - `AdminError`: the closed taxonomy every console operation reports
//! - `ConfigError`: configuration loading and validation failures

use std::fmt;

/// Errors from console operations.
///
/// Every operation returns success or exactly one of these. Gate-local
/// checks never produce `Unknown`; that variant only carries database
/// failures the console does not recognize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminError {
    /// No session, or the database refused the credentials.
    Unauthenticated { reason: String },
    /// The session lacks a privilege the operation requires.
    InsufficientPrivilege {
        /// The missing privilege, when known.
        privilege: Option<String>,
        reason: String,
    },
    /// The operation targets the authenticated principal itself.
    SelfOperationForbidden {
        operation: String,
        /// The principal, when known.
        principal: Option<String>,
    },
    /// The object being created already exists.
    AlreadyExists { reason: String },
    /// The object being referenced does not exist.
    DoesNotExist { reason: String },
    /// An input failed validation.
    ValidationError {
        field: String,
        value: String,
        reason: String,
    },
    /// The database's security policy refused the operation.
    PolicyViolation { reason: String },
    /// An unrecognized database failure.
    Unknown {
        /// The native `ORA-` code, or `None` if the call never completed.
        code: Option<i32>,
        message: String,
    },
}

/// The variant of an [`AdminError`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Unauthenticated,
    InsufficientPrivilege,
    SelfOperationForbidden,
    AlreadyExists,
    DoesNotExist,
    ValidationError,
    PolicyViolation,
    Unknown,
}

impl AdminError {
    /// Returns the variant of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthenticated { .. } => ErrorKind::Unauthenticated,
            Self::InsufficientPrivilege { .. } => ErrorKind::InsufficientPrivilege,
            Self::SelfOperationForbidden { .. } => ErrorKind::SelfOperationForbidden,
            Self::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            Self::DoesNotExist { .. } => ErrorKind::DoesNotExist,
            Self::ValidationError { .. } => ErrorKind::ValidationError,
            Self::PolicyViolation { .. } => ErrorKind::PolicyViolation,
            Self::Unknown { .. } => ErrorKind::Unknown,
        }
    }

    pub(crate) fn not_logged_in() -> Self {
        Self::Unauthenticated {
            reason: "not logged in".to_string(),
        }
    }

    pub(crate) fn invalid(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::ValidationError {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for AdminError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unauthenticated { reason } => {
                write!(f, "authentication required: {reason}")
            }
            Self::InsufficientPrivilege {
                privilege: Some(privilege),
                reason,
            } => {
                write!(f, "insufficient privilege ({privilege}): {reason}")
            }
            Self::InsufficientPrivilege {
                privilege: None,
                reason,
            } => {
                write!(f, "insufficient privilege: {reason}")
            }
            Self::SelfOperationForbidden {
                operation,
                principal: Some(principal),
            } => {
                write!(f, "cannot {operation} your own account {principal}")
            }
            Self::SelfOperationForbidden {
                operation,
                principal: None,
            } => {
                write!(f, "cannot {operation} your own account")
            }
            Self::AlreadyExists { reason } => {
                write!(f, "already exists: {reason}")
            }
            Self::DoesNotExist { reason } => {
                write!(f, "does not exist: {reason}")
            }
            Self::ValidationError {
                field,
                value,
                reason,
            } => {
                write!(f, "invalid {field} '{value}': {reason}")
            }
            Self::PolicyViolation { reason } => {
                write!(f, "refused by security policy: {reason}")
            }
            Self::Unknown {
                code: Some(code),
                message,
            } => {
                write!(f, "database error ORA-{code:05}: {message}")
            }
            Self::Unknown {
                code: None,
                message,
            } => {
                write!(f, "database error: {message}")
            }
        }
    }
}

impl std::error::Error for AdminError {}

/// Errors from loading console configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Configuration could not be read or deserialized.
    Load { reason: String },
    /// A setting was read but is unusable.
    Invalid { key: String, reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Load { reason } => {
                write!(f, "failed to load configuration: {reason}")
            }
            Self::Invalid { key, reason } => {
                write!(f, "invalid configuration for '{key}': {reason}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
