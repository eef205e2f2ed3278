//! Core domain types and utilities for dbwarden.
//!
//! This crate provides the vocabulary shared by the catalog boundary and the
//! access layer: canonical database identifiers, the system and object
//! privileges the console reasons about, profile resource limits, tablespace
//! quotas, and the rootcause-based `Result` alias.

pub mod error;
pub mod name;
pub mod privilege;
pub mod profile;
pub mod quota;

pub use error::Result;
pub use name::{
    ObjectName, ParseNameError, PrincipalName, PrivilegeGrantee, PrivilegeName, ProfileName,
    RoleName,
};
pub use privilege::{
    ADMIN_EQUIVALENT_PRIVILEGES, ADMIN_ROLE, COLUMN_PRIVILEGES, ObjectPrivilege,
    SystemPrivilege, TABLE_PRIVILEGES, UnsupportedPrivilegeError,
};
pub use profile::{DEFAULT_PROFILE, ParseLimitError, ProfileResource, ResourceLimit};
pub use quota::{ParseQuotaError, Quota, QuotaUnit};
