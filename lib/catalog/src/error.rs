//! Native database errors.
//!
//! Backends report failures exactly as the database raised them: a numeric
//! `ORA-` code plus the server's message. Mapping those onto the console's
//! error taxonomy happens one layer up.

use std::fmt;

/// A failure reported by the database or the driver underneath a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeError {
    code: i32,
    message: String,
}

impl NativeError {
    /// Creates a native error from an `ORA-` code and message.
    #[must_use]
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Returns the numeric `ORA-` code.
    #[must_use]
    pub fn code(&self) -> i32 {
        self.code
    }

    /// Returns the message reported by the server.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for NativeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ORA-{:05}: {}", self.code, self.message)
    }
}

impl std::error::Error for NativeError {}

/// `ORA-` codes the console recognizes.
pub mod codes {
    pub const NAME_ALREADY_USED: i32 = 955;
    pub const TABLESPACE_DOES_NOT_EXIST: i32 = 959;
    pub const INVALID_USERNAME_OR_PASSWORD_ACCESS: i32 = 988;
    pub const TABLE_OR_VIEW_DOES_NOT_EXIST: i32 = 942;
    pub const INVALID_IDENTIFIER: i32 = 904;
    pub const INVALID_USERNAME_OR_PASSWORD: i32 = 1017;
    pub const INSUFFICIENT_PRIVILEGES: i32 = 1031;
    pub const NO_DATA_FOUND: i32 = 1403;
    pub const RECURSIVE_SQL_ERROR: i32 = 604;
    pub const GRANT_OPTION_DOES_NOT_EXIST: i32 = 1720;
    pub const CANNOT_GRANT_TO_SELF: i32 = 1749;
    pub const USER_OR_ROLE_DOES_NOT_EXIST: i32 = 1917;
    pub const USER_DOES_NOT_EXIST: i32 = 1918;
    pub const ROLE_DOES_NOT_EXIST: i32 = 1919;
    pub const USER_NAME_CONFLICT: i32 = 1920;
    pub const ROLE_NAME_CONFLICT: i32 = 1921;
    pub const CANNOT_REVOKE_UNGRANTED: i32 = 1927;
    pub const CIRCULAR_ROLE_GRANT: i32 = 1934;
    pub const MISSING_USER_OR_ROLE_NAME: i32 = 1935;
    pub const CANNOT_DROP_CONNECTED_USER: i32 = 1940;
    pub const ROLE_NOT_GRANTED: i32 = 1951;
    pub const SYSTEM_PRIVILEGE_NOT_GRANTED: i32 = 1952;
    pub const PROFILE_ALREADY_EXISTS: i32 = 2379;
    pub const PROFILE_DOES_NOT_EXIST: i32 = 2380;
    pub const ACCOUNT_LOCKED: i32 = 28000;
    pub const PASSWORD_EXPIRED: i32 = 28001;
    pub const PASSWORD_VERIFICATION_FAILED: i32 = 28003;
    pub const PASSWORD_CANNOT_BE_REUSED: i32 = 28007;
    pub const INVALID_OLD_PASSWORD: i32 = 28008;
    pub const TNS_COULD_NOT_RESOLVE: i32 = 12154;
}
