//! Backend traits.
//!
//! The console talks to the database through three narrow seams: a live
//! authentication probe, dictionary reads, and the administrative stored
//! procedures. Every call receives the [`ConnectionParams`] to use, opens its
//! own connection and releases it before returning. Implementations must not
//! retry.

use crate::connection::ConnectionParams;
use crate::error::NativeError;
use crate::types::{
    ColumnGrant, ColumnGrantRequest, NewUser, ObjectGrant, ObjectGrantRequest, PersonalDetails,
    PrivilegeGrant, ProfileSpec, RoleGrant, RoleSummary, TableRef, TablespaceQuota, UserAccount,
    UserChanges,
};
use async_trait::async_trait;
use dbwarden_core::{
    ObjectPrivilege, PrincipalName, PrivilegeGrantee, PrivilegeName, ProfileName, RoleName,
};
use secrecy::SecretString;

/// Opens a live, authenticated connection.
///
/// Success is the only authentication signal the console trusts; there is no
/// local password store.
#[async_trait]
pub trait AuthProbe: Send + Sync {
    /// Connects with `params` and disconnects again.
    async fn authenticate(&self, params: &ConnectionParams) -> Result<(), NativeError>;
}

/// Reads from the data dictionary. Grantee lookups are case-insensitive.
#[async_trait]
pub trait CatalogReader: Send + Sync {
    /// System privileges granted directly to `grantee`.
    async fn system_privileges(
        &self,
        params: &ConnectionParams,
        grantee: &PrivilegeGrantee,
    ) -> Result<Vec<PrivilegeGrant>, NativeError>;

    /// Roles granted directly to `grantee`.
    async fn role_grants(
        &self,
        params: &ConnectionParams,
        grantee: &PrivilegeGrantee,
    ) -> Result<Vec<RoleGrant>, NativeError>;

    /// Table privileges granted directly to `grantee`.
    async fn object_grants(
        &self,
        params: &ConnectionParams,
        grantee: &PrivilegeGrantee,
    ) -> Result<Vec<ObjectGrant>, NativeError>;

    /// Column privileges granted directly to `grantee`.
    async fn column_grants(
        &self,
        params: &ConnectionParams,
        grantee: &PrivilegeGrantee,
    ) -> Result<Vec<ColumnGrant>, NativeError>;

    /// Every account, ordered by username.
    async fn list_users(&self, params: &ConnectionParams)
    -> Result<Vec<UserAccount>, NativeError>;

    /// One account, or `None` if it does not exist.
    async fn user(
        &self,
        params: &ConnectionParams,
        username: &PrincipalName,
    ) -> Result<Option<UserAccount>, NativeError>;

    /// Personal details stored beside `username`, or `None` if there are
    /// none.
    async fn user_info(
        &self,
        params: &ConnectionParams,
        username: &PrincipalName,
    ) -> Result<Option<PersonalDetails>, NativeError>;

    /// Tablespace quotas of `username`.
    async fn user_quotas(
        &self,
        params: &ConnectionParams,
        username: &PrincipalName,
    ) -> Result<Vec<TablespaceQuota>, NativeError>;

    /// Every role.
    async fn list_roles(&self, params: &ConnectionParams)
    -> Result<Vec<RoleSummary>, NativeError>;

    /// Users and roles holding `role` directly.
    async fn role_grantees(
        &self,
        params: &ConnectionParams,
        role: &RoleName,
    ) -> Result<Vec<RoleGrant>, NativeError>;

    /// Every profile with its limits.
    async fn list_profiles(
        &self,
        params: &ConnectionParams,
    ) -> Result<Vec<ProfileSpec>, NativeError>;

    /// One profile, or `None` if it does not exist.
    async fn profile(
        &self,
        params: &ConnectionParams,
        profile: &ProfileName,
    ) -> Result<Option<ProfileSpec>, NativeError>;

    /// Accounts assigned to `profile`.
    async fn profile_users(
        &self,
        params: &ConnectionParams,
        profile: &ProfileName,
    ) -> Result<Vec<PrincipalName>, NativeError>;
}

/// Invokes the administrative stored procedures.
#[async_trait]
pub trait AdminExecutor: Send + Sync {
    /// `SP_CREATE_USER`.
    async fn create_user(&self, params: &ConnectionParams, user: &NewUser)
    -> Result<(), NativeError>;

    /// `SP_UPDATE_USER`.
    async fn alter_user(
        &self,
        params: &ConnectionParams,
        changes: &UserChanges,
    ) -> Result<(), NativeError>;

    /// `SP_DELETE_USER`.
    async fn drop_user(
        &self,
        params: &ConnectionParams,
        username: &PrincipalName,
    ) -> Result<(), NativeError>;

    /// `SP_LOCK_USER`.
    async fn lock_user(
        &self,
        params: &ConnectionParams,
        username: &PrincipalName,
    ) -> Result<(), NativeError>;

    /// `SP_UNLOCK_USER`.
    async fn unlock_user(
        &self,
        params: &ConnectionParams,
        username: &PrincipalName,
    ) -> Result<(), NativeError>;

    /// `ALTER USER .. IDENTIFIED BY .. REPLACE ..` for the connected account.
    ///
    /// The server re-checks `current` and applies its password policy to
    /// `new`.
    async fn change_own_password(
        &self,
        params: &ConnectionParams,
        current: &SecretString,
        new: &SecretString,
    ) -> Result<(), NativeError>;

    /// `SP_CREATE_ROLE`, or `SP_CREATE_ROLE_WITH_PASSWORD` when a password is
    /// given.
    async fn create_role(
        &self,
        params: &ConnectionParams,
        role: &RoleName,
        password: Option<&SecretString>,
    ) -> Result<(), NativeError>;

    /// `SP_CHANGE_ROLE_PASSWORD`.
    async fn change_role_password(
        &self,
        params: &ConnectionParams,
        role: &RoleName,
        password: &SecretString,
    ) -> Result<(), NativeError>;

    /// `SP_REMOVE_ROLE_PASSWORD`.
    async fn remove_role_password(
        &self,
        params: &ConnectionParams,
        role: &RoleName,
    ) -> Result<(), NativeError>;

    /// `SP_DELETE_ROLE`.
    async fn drop_role(&self, params: &ConnectionParams, role: &RoleName)
    -> Result<(), NativeError>;

    /// `SP_CREATE_PROFILE`.
    async fn create_profile(
        &self,
        params: &ConnectionParams,
        profile: &ProfileSpec,
    ) -> Result<(), NativeError>;

    /// `SP_UPDATE_PROFILE`.
    async fn alter_profile(
        &self,
        params: &ConnectionParams,
        profile: &ProfileSpec,
    ) -> Result<(), NativeError>;

    /// `SP_DELETE_PROFILE`.
    async fn drop_profile(
        &self,
        params: &ConnectionParams,
        profile: &ProfileName,
    ) -> Result<(), NativeError>;

    /// `SP_GRANT_SYS_PRIV`.
    async fn grant_system_privilege(
        &self,
        params: &ConnectionParams,
        grantee: &PrivilegeGrantee,
        privilege: &PrivilegeName,
        with_admin_option: bool,
    ) -> Result<(), NativeError>;

    /// `SP_REVOKE_SYS_PRIV`.
    async fn revoke_system_privilege(
        &self,
        params: &ConnectionParams,
        grantee: &PrivilegeGrantee,
        privilege: &PrivilegeName,
    ) -> Result<(), NativeError>;

    /// `SP_GRANT_OBJ_PRIV`.
    async fn grant_object_privilege(
        &self,
        params: &ConnectionParams,
        request: &ObjectGrantRequest,
    ) -> Result<(), NativeError>;

    /// `SP_REVOKE_OBJ_PRIV`. Also removes any column grants of the same
    /// privilege on the table.
    async fn revoke_object_privilege(
        &self,
        params: &ConnectionParams,
        grantee: &PrivilegeGrantee,
        privilege: ObjectPrivilege,
        table: &TableRef,
    ) -> Result<(), NativeError>;

    /// `SP_GRANT_COL_PRIV`.
    async fn grant_column_privilege(
        &self,
        params: &ConnectionParams,
        request: &ColumnGrantRequest,
    ) -> Result<(), NativeError>;

    /// `SP_GRANT_ROLE`.
    async fn grant_role(
        &self,
        params: &ConnectionParams,
        role: &RoleName,
        grantee: &PrivilegeGrantee,
        with_admin_option: bool,
    ) -> Result<(), NativeError>;

    /// `SP_REVOKE_ROLE`.
    async fn revoke_role(
        &self,
        params: &ConnectionParams,
        role: &RoleName,
        grantee: &PrivilegeGrantee,
    ) -> Result<(), NativeError>;

    /// `SP_INSERT_USER_INFO` / `SP_UPDATE_USER_INFO`.
    async fn upsert_user_info(
        &self,
        params: &ConnectionParams,
        username: &PrincipalName,
        details: &PersonalDetails,
    ) -> Result<(), NativeError>;

    /// `SP_DELETE_USER_INFO`.
    async fn delete_user_info(
        &self,
        params: &ConnectionParams,
        username: &PrincipalName,
    ) -> Result<(), NativeError>;
}

/// Everything the console needs from a database.
pub trait Backend: AuthProbe + CatalogReader + AdminExecutor {}

impl<T> Backend for T where T: AuthProbe + CatalogReader + AdminExecutor {}
