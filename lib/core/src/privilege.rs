//! Privilege vocabulary.
//!
//! The console only needs to name a handful of system privileges itself: the
//! ones its operations are gated on and the ones that make a principal
//! admin-equivalent. Grants of arbitrary system privileges travel as
//! [`PrivilegeName`](crate::PrivilegeName) and are validated by the database.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The role whose holders are always admin-equivalent.
pub const ADMIN_ROLE: &str = "DBA";

/// System privileges the console gates its own operations on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SystemPrivilege {
    CreateSession,
    CreateUser,
    AlterUser,
    DropUser,
    CreateRole,
    AlterAnyRole,
    DropAnyRole,
    GrantAnyRole,
    GrantAnyObjectPrivilege,
    CreateProfile,
    AlterProfile,
    DropProfile,
}

/// Holding any of these (directly or through a role) makes a principal
/// admin-equivalent.
pub const ADMIN_EQUIVALENT_PRIVILEGES: [SystemPrivilege; 3] = [
    SystemPrivilege::CreateUser,
    SystemPrivilege::AlterUser,
    SystemPrivilege::DropUser,
];

impl SystemPrivilege {
    /// Every privilege in this vocabulary.
    pub const ALL: [Self; 12] = [
        Self::CreateSession,
        Self::CreateUser,
        Self::AlterUser,
        Self::DropUser,
        Self::CreateRole,
        Self::AlterAnyRole,
        Self::DropAnyRole,
        Self::GrantAnyRole,
        Self::GrantAnyObjectPrivilege,
        Self::CreateProfile,
        Self::AlterProfile,
        Self::DropProfile,
    ];

    /// Returns the data dictionary spelling.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CreateSession => "CREATE SESSION",
            Self::CreateUser => "CREATE USER",
            Self::AlterUser => "ALTER USER",
            Self::DropUser => "DROP USER",
            Self::CreateRole => "CREATE ROLE",
            Self::AlterAnyRole => "ALTER ANY ROLE",
            Self::DropAnyRole => "DROP ANY ROLE",
            Self::GrantAnyRole => "GRANT ANY ROLE",
            Self::GrantAnyObjectPrivilege => "GRANT ANY OBJECT PRIVILEGE",
            Self::CreateProfile => "CREATE PROFILE",
            Self::AlterProfile => "ALTER PROFILE",
            Self::DropProfile => "DROP PROFILE",
        }
    }

    /// Returns true if holding this privilege makes a principal
    /// admin-equivalent.
    #[must_use]
    pub fn is_admin_equivalent(&self) -> bool {
        ADMIN_EQUIVALENT_PRIVILEGES.contains(self)
    }
}

impl fmt::Display for SystemPrivilege {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Privileges that may be granted on a table.
pub const TABLE_PRIVILEGES: [&str; 4] = ["SELECT", "INSERT", "UPDATE", "DELETE"];

/// Privileges that may be granted on individual columns.
pub const COLUMN_PRIVILEGES: [&str; 2] = ["SELECT", "INSERT"];

/// Error returned when a privilege is outside an allow-list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsupportedPrivilegeError {
    /// The offending input.
    pub value: String,
    /// The privileges that would have been accepted.
    pub allowed: &'static [&'static str],
}

impl fmt::Display for UnsupportedPrivilegeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unsupported privilege '{}', expected one of {}",
            self.value,
            self.allowed.join(", ")
        )
    }
}

impl std::error::Error for UnsupportedPrivilegeError {}

/// A table-level object privilege.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ObjectPrivilege {
    Select,
    Insert,
    Update,
    Delete,
}

impl ObjectPrivilege {
    /// Returns the data dictionary spelling.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Select => "SELECT",
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        }
    }

    /// Returns true if the privilege can be granted column by column.
    #[must_use]
    pub fn allowed_on_column(&self) -> bool {
        matches!(self, Self::Select | Self::Insert)
    }

    /// Parses a privilege that will be granted on specific columns.
    ///
    /// # Errors
    ///
    /// Returns an error unless the input is `SELECT` or `INSERT`.
    pub fn parse_for_column(raw: &str) -> Result<Self, UnsupportedPrivilegeError> {
        raw.parse::<Self>()
            .ok()
            .filter(Self::allowed_on_column)
            .ok_or_else(|| UnsupportedPrivilegeError {
                value: raw.trim().to_string(),
                allowed: &COLUMN_PRIVILEGES,
            })
    }
}

impl fmt::Display for ObjectPrivilege {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectPrivilege {
    type Err = UnsupportedPrivilegeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SELECT" => Ok(Self::Select),
            "INSERT" => Ok(Self::Insert),
            "UPDATE" => Ok(Self::Update),
            "DELETE" => Ok(Self::Delete),
            _ => Err(UnsupportedPrivilegeError {
                value: s.trim().to_string(),
                allowed: &TABLE_PRIVILEGES,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_equivalent_set() {
        assert!(SystemPrivilege::CreateUser.is_admin_equivalent());
        assert!(SystemPrivilege::AlterUser.is_admin_equivalent());
        assert!(SystemPrivilege::DropUser.is_admin_equivalent());
        assert!(!SystemPrivilege::CreateSession.is_admin_equivalent());
        assert!(!SystemPrivilege::GrantAnyRole.is_admin_equivalent());
    }

    #[test]
    fn system_privilege_spelling() {
        assert_eq!(SystemPrivilege::AlterAnyRole.to_string(), "ALTER ANY ROLE");
        assert_eq!(SystemPrivilege::ALL.len(), 12);
    }

    #[test]
    fn object_privilege_parses_case_insensitively() {
        assert_eq!(
            " select ".parse::<ObjectPrivilege>().expect("should parse"),
            ObjectPrivilege::Select
        );
        assert_eq!(
            "Delete".parse::<ObjectPrivilege>().expect("should parse"),
            ObjectPrivilege::Delete
        );
    }

    #[test]
    fn truncate_is_not_a_table_privilege() {
        let err = "TRUNCATE".parse::<ObjectPrivilege>().unwrap_err();
        assert_eq!(err.value, "TRUNCATE");
        assert_eq!(err.allowed, &TABLE_PRIVILEGES);
        assert!(err.to_string().contains("SELECT, INSERT, UPDATE, DELETE"));
    }

    #[test]
    fn column_privileges_are_narrower() {
        assert_eq!(
            ObjectPrivilege::parse_for_column("insert").expect("should parse"),
            ObjectPrivilege::Insert
        );
        let err = ObjectPrivilege::parse_for_column("UPDATE").unwrap_err();
        assert_eq!(err.allowed, &COLUMN_PRIVILEGES);
        assert!(ObjectPrivilege::parse_for_column("TRUNCATE").is_err());
    }
}
