//! Native error translation.
//!
//! A static table from `ORA-` code to error kind. The table is the only place
//! that knows database codes; everything above it matches on [`ErrorKind`].

use crate::error::{AdminError, ErrorKind};
use dbwarden_catalog::{NativeError, codes};

const TABLE: &[(i32, ErrorKind)] = &[
    (codes::TABLE_OR_VIEW_DOES_NOT_EXIST, ErrorKind::InsufficientPrivilege),
    (codes::INSUFFICIENT_PRIVILEGES, ErrorKind::InsufficientPrivilege),
    (codes::RECURSIVE_SQL_ERROR, ErrorKind::InsufficientPrivilege),
    (codes::GRANT_OPTION_DOES_NOT_EXIST, ErrorKind::InsufficientPrivilege),
    (codes::CANNOT_GRANT_TO_SELF, ErrorKind::SelfOperationForbidden),
    (codes::USER_OR_ROLE_DOES_NOT_EXIST, ErrorKind::DoesNotExist),
    (codes::USER_DOES_NOT_EXIST, ErrorKind::DoesNotExist),
    (codes::ROLE_DOES_NOT_EXIST, ErrorKind::DoesNotExist),
    (codes::PROFILE_DOES_NOT_EXIST, ErrorKind::DoesNotExist),
    (codes::TABLESPACE_DOES_NOT_EXIST, ErrorKind::DoesNotExist),
    (codes::USER_NAME_CONFLICT, ErrorKind::AlreadyExists),
    (codes::ROLE_NAME_CONFLICT, ErrorKind::AlreadyExists),
    (codes::PROFILE_ALREADY_EXISTS, ErrorKind::AlreadyExists),
    (codes::NAME_ALREADY_USED, ErrorKind::AlreadyExists),
    (codes::MISSING_USER_OR_ROLE_NAME, ErrorKind::ValidationError),
    (codes::CANNOT_DROP_CONNECTED_USER, ErrorKind::PolicyViolation),
    (codes::ACCOUNT_LOCKED, ErrorKind::PolicyViolation),
    (codes::PASSWORD_EXPIRED, ErrorKind::PolicyViolation),
    (codes::PASSWORD_VERIFICATION_FAILED, ErrorKind::PolicyViolation),
    (codes::PASSWORD_CANNOT_BE_REUSED, ErrorKind::PolicyViolation),
    (codes::INVALID_OLD_PASSWORD, ErrorKind::PolicyViolation),
    (codes::INVALID_USERNAME_OR_PASSWORD_ACCESS, ErrorKind::PolicyViolation),
    (codes::INVALID_USERNAME_OR_PASSWORD, ErrorKind::Unauthenticated),
];

/// Looks up the error kind for a native code.
#[must_use]
pub fn classify(code: i32) -> ErrorKind {
    TABLE
        .iter()
        .find(|(c, _)| *c == code)
        .map_or(ErrorKind::Unknown, |(_, kind)| *kind)
}

/// Maps a native failure onto the console's error taxonomy.
///
/// Unrecognized codes become [`AdminError::Unknown`] with the code and
/// message preserved.
#[must_use]
pub fn translate(error: &NativeError) -> AdminError {
    let reason = error.to_string();
    match classify(error.code()) {
        ErrorKind::Unauthenticated => AdminError::Unauthenticated { reason },
        ErrorKind::InsufficientPrivilege => AdminError::InsufficientPrivilege {
            privilege: None,
            reason,
        },
        ErrorKind::SelfOperationForbidden => AdminError::SelfOperationForbidden {
            operation: "grant or revoke privileges on".to_string(),
            principal: None,
        },
        ErrorKind::AlreadyExists => AdminError::AlreadyExists { reason },
        ErrorKind::DoesNotExist => AdminError::DoesNotExist { reason },
        ErrorKind::ValidationError => AdminError::ValidationError {
            field: "name".to_string(),
            value: String::new(),
            reason,
        },
        ErrorKind::PolicyViolation => AdminError::PolicyViolation { reason },
        ErrorKind::Unknown => AdminError::Unknown {
            code: Some(error.code()),
            message: error.message().to_string(),
        },
    }
}

impl From<NativeError> for AdminError {
    fn from(error: NativeError) -> Self {
        translate(&error)
    }
}
