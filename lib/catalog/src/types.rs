//! Records read from the data dictionary and requests sent to the
//! administrative procedures.

use chrono::{DateTime, Utc};
use dbwarden_core::{
    ObjectName, ObjectPrivilege, PrincipalName, PrivilegeGrantee, PrivilegeName, ProfileName,
    ProfileResource, Quota, ResourceLimit, RoleName,
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A system privilege held by a grantee (`DBA_SYS_PRIVS`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivilegeGrant {
    /// Account or role holding the privilege.
    pub grantee: PrivilegeGrantee,
    /// The privilege.
    pub privilege: PrivilegeName,
    /// Whether the grantee may grant it onward.
    pub admin_option: bool,
}

/// A role held by a grantee (`DBA_ROLE_PRIVS`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleGrant {
    /// Account or role holding the role.
    pub grantee: PrivilegeGrantee,
    /// The granted role.
    pub role: RoleName,
    /// Whether the grantee may grant it onward.
    pub admin_option: bool,
    /// Whether the role is enabled at login.
    pub default_role: bool,
}

/// A table, qualified by its owning schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TableRef {
    /// Owning schema.
    pub owner: ObjectName,
    /// Table or view name.
    pub table: ObjectName,
}

impl TableRef {
    /// Creates a table reference.
    #[must_use]
    pub fn new(owner: ObjectName, table: ObjectName) -> Self {
        Self { owner, table }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.owner, self.table)
    }
}

/// A table-level object privilege (`DBA_TAB_PRIVS`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectGrant {
    pub grantee: PrivilegeGrantee,
    pub table: TableRef,
    /// Kept as a name: the dictionary also lists EXECUTE, REFERENCES and
    /// others the console never grants itself.
    pub privilege: PrivilegeName,
    pub grantable: bool,
    pub grantor: PrincipalName,
}

/// A column-level object privilege (`DBA_COL_PRIVS`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnGrant {
    pub grantee: PrivilegeGrantee,
    pub table: TableRef,
    pub column: ObjectName,
    pub privilege: PrivilegeName,
    pub grantable: bool,
}

/// `ACCOUNT_STATUS` of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    Open,
    Locked,
    Expired,
    ExpiredAndLocked,
    /// Timed variants such as `LOCKED(TIMED)` or `EXPIRED(GRACE)`.
    Other(String),
}

impl AccountStatus {
    /// Maps the dictionary's spelling onto a status.
    #[must_use]
    pub fn from_dictionary(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "OPEN" => Self::Open,
            "LOCKED" => Self::Locked,
            "EXPIRED" => Self::Expired,
            "EXPIRED & LOCKED" => Self::ExpiredAndLocked,
            other => Self::Other(other.to_string()),
        }
    }

    /// Returns true if logins are refused because of a lock.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        match self {
            Self::Locked | Self::ExpiredAndLocked => true,
            Self::Other(raw) => raw.contains("LOCKED"),
            Self::Open | Self::Expired => false,
        }
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => f.write_str("OPEN"),
            Self::Locked => f.write_str("LOCKED"),
            Self::Expired => f.write_str("EXPIRED"),
            Self::ExpiredAndLocked => f.write_str("EXPIRED & LOCKED"),
            Self::Other(raw) => f.write_str(raw),
        }
    }
}

/// A database account (`DBA_USERS`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub username: PrincipalName,
    pub status: AccountStatus,
    pub lock_date: Option<DateTime<Utc>>,
    pub created: DateTime<Utc>,
    pub default_tablespace: ObjectName,
    pub temporary_tablespace: ObjectName,
    pub profile: ProfileName,
}

/// Personal details kept beside an account in the console's own table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalDetails {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
    pub employee_code: Option<String>,
    pub note: Option<String>,
}

/// A tablespace quota of an account (`DBA_TS_QUOTAS`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TablespaceQuota {
    pub tablespace: ObjectName,
    pub quota: Quota,
}

/// A role (`DBA_ROLES`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSummary {
    pub role: RoleName,
    /// Whether enabling the role requires its password.
    pub password_required: bool,
}

/// Everything `SP_CREATE_USER` needs.
#[derive(Debug)]
pub struct NewUser {
    pub username: PrincipalName,
    pub password: SecretString,
    pub default_tablespace: ObjectName,
    pub temporary_tablespace: ObjectName,
    pub quota: Quota,
    pub profile: ProfileName,
    /// Create the account locked.
    pub locked: bool,
}

/// Changes applied by `SP_UPDATE_USER`. `None` leaves a setting unchanged.
#[derive(Debug)]
pub struct UserChanges {
    pub username: PrincipalName,
    pub password: Option<SecretString>,
    pub default_tablespace: Option<ObjectName>,
    pub temporary_tablespace: Option<ObjectName>,
    pub quota: Option<Quota>,
    pub profile: Option<ProfileName>,
}

/// A profile and the resource limits to set on it. `None` leaves a resource
/// untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSpec {
    pub name: ProfileName,
    pub sessions_per_user: Option<ResourceLimit>,
    pub connect_time: Option<ResourceLimit>,
    pub idle_time: Option<ResourceLimit>,
}

impl ProfileSpec {
    /// Creates a profile spec with no limits set.
    #[must_use]
    pub fn new(name: ProfileName) -> Self {
        Self {
            name,
            sessions_per_user: None,
            connect_time: None,
            idle_time: None,
        }
    }

    /// Returns the limit set for `resource`, if any.
    #[must_use]
    pub fn limit(&self, resource: ProfileResource) -> Option<ResourceLimit> {
        match resource {
            ProfileResource::SessionsPerUser => self.sessions_per_user,
            ProfileResource::ConnectTime => self.connect_time,
            ProfileResource::IdleTime => self.idle_time,
        }
    }

    /// Sets the limit for `resource`.
    pub fn set_limit(&mut self, resource: ProfileResource, limit: Option<ResourceLimit>) {
        match resource {
            ProfileResource::SessionsPerUser => self.sessions_per_user = limit,
            ProfileResource::ConnectTime => self.connect_time = limit,
            ProfileResource::IdleTime => self.idle_time = limit,
        }
    }

    /// Iterates over the limits that are set, in DDL order.
    pub fn limits(&self) -> impl Iterator<Item = (ProfileResource, ResourceLimit)> + '_ {
        ProfileResource::ALL
            .into_iter()
            .filter_map(|resource| self.limit(resource).map(|limit| (resource, limit)))
    }
}

/// A table privilege to grant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectGrantRequest {
    pub grantee: PrivilegeGrantee,
    pub privilege: ObjectPrivilege,
    pub table: TableRef,
    pub with_grant_option: bool,
}

/// A column privilege to grant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnGrantRequest {
    pub grantee: PrivilegeGrantee,
    pub privilege: ObjectPrivilege,
    pub table: TableRef,
    pub column: ObjectName,
    pub with_grant_option: bool,
}
