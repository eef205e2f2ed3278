//! Canonical database identifiers.
//!
//! Oracle folds unquoted identifiers to upper case, so every name type here
//! stores the trimmed, upper-cased form and compares case-insensitively by
//! construction. Internal runs of whitespace collapse to a single space, which
//! lets multi-word privilege names like `CREATE  USER` match `CREATE USER`.

use crate::privilege::SystemPrivilege;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Longest identifier accepted, in characters.
pub const MAX_NAME_LEN: usize = 128;

/// Error returned when a raw string is not a usable identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseNameError {
    /// The type of name that failed to parse.
    pub name_type: &'static str,
    /// The offending input.
    pub value: String,
    /// The reason for the parse failure.
    pub reason: &'static str,
}

impl fmt::Display for ParseNameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid {} '{}': {}",
            self.name_type, self.value, self.reason
        )
    }
}

impl std::error::Error for ParseNameError {}

fn canonicalize(raw: &str, name_type: &'static str) -> Result<String, ParseNameError> {
    let fail = |reason| ParseNameError {
        name_type,
        value: raw.to_string(),
        reason,
    };

    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return Err(fail("must not be empty"));
    }
    if collapsed.chars().count() > MAX_NAME_LEN {
        return Err(fail("exceeds 128 characters"));
    }
    if collapsed.contains(['"', '\0']) {
        return Err(fail("contains a double quote or NUL character"));
    }

    Ok(collapsed.to_uppercase())
}

/// Macro to generate a canonical, case-insensitive identifier wrapper.
macro_rules! define_name {
    ($(#[$meta:meta])* $name:ident, $label:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Parses and canonicalizes a raw identifier.
            ///
            /// # Errors
            ///
            /// Returns an error if the input is blank, too long, or contains
            /// a double quote or NUL character.
            pub fn parse(raw: &str) -> Result<Self, ParseNameError> {
                canonicalize(raw, $label).map(Self)
            }

            /// Returns the canonical (upper-case) form.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Returns true if `raw` names the same identifier, ignoring case
            /// and surrounding whitespace.
            #[must_use]
            pub fn matches(&self, raw: &str) -> bool {
                canonicalize(raw, $label).is_ok_and(|other| other == self.0)
            }

            /// Returns the human-readable label for this name type.
            #[must_use]
            pub const fn label() -> &'static str {
                $label
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseNameError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = ParseNameError;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                Self::parse(&s)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = ParseNameError;

            fn try_from(s: &str) -> Result<Self, Self::Error> {
                Self::parse(s)
            }
        }

        impl From<$name> for String {
            fn from(name: $name) -> Self {
                name.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_name!(
    /// A database account: the identity a session or grant refers to.
    PrincipalName,
    "principal"
);

define_name!(
    /// A database role.
    RoleName,
    "role"
);

define_name!(
    /// A system or object privilege name, e.g. `CREATE USER` or `SELECT`.
    PrivilegeName,
    "privilege"
);

define_name!(
    /// A resource profile.
    ProfileName,
    "profile"
);

define_name!(
    /// A schema object, column or tablespace name.
    ObjectName,
    "object name"
);

impl From<SystemPrivilege> for PrivilegeName {
    fn from(privilege: SystemPrivilege) -> Self {
        Self(privilege.as_str().to_string())
    }
}

impl PartialEq<SystemPrivilege> for PrivilegeName {
    fn eq(&self, other: &SystemPrivilege) -> bool {
        self.0 == other.as_str()
    }
}

impl From<&PrincipalName> for PrivilegeGrantee {
    fn from(name: &PrincipalName) -> Self {
        Self(name.0.clone())
    }
}

impl From<&RoleName> for PrivilegeGrantee {
    fn from(name: &RoleName) -> Self {
        Self(name.0.clone())
    }
}

define_name!(
    /// Anything a privilege can be granted to: an account or a role.
    ///
    /// Accounts and roles share one namespace in the data dictionary.
    PrivilegeGrantee,
    "grantee"
);
