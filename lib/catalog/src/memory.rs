//! In-memory backend for tests and embedding.
//!
//! Models the slice of the data dictionary the console touches and answers
//! with the same `ORA-` codes a real database would raise for the common
//! failure cases. Failures and latency can be injected per operation, and
//! every call is journaled so tests can assert that nothing reached the
//! database.

use crate::backend::{AdminExecutor, AuthProbe, CatalogReader};
use crate::connection::ConnectionParams;
use crate::error::{NativeError, codes};
use crate::types::{
    AccountStatus, ColumnGrant, ColumnGrantRequest, NewUser, ObjectGrant, ObjectGrantRequest,
    PersonalDetails, PrivilegeGrant, ProfileSpec, RoleGrant, RoleSummary, TableRef,
    TablespaceQuota, UserAccount, UserChanges,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dbwarden_core::{
    ADMIN_ROLE, DEFAULT_PROFILE, ObjectName, ObjectPrivilege, PrincipalName, PrivilegeGrantee,
    PrivilegeName, ProfileName, Quota, RoleName, SystemPrivilege,
};
use secrecy::{ExposeSecret, SecretString};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::debug;

const SEEDED_TABLESPACES: [&str; 4] = ["SYSTEM", "SYSAUX", "USERS", "TEMP"];

/// A backend call, as recorded in the journal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Authenticate,
    SystemPrivileges,
    RoleGrants,
    ObjectGrants,
    ColumnGrants,
    ListUsers,
    User,
    UserInfo,
    UserQuotas,
    ListRoles,
    RoleGrantees,
    ListProfiles,
    Profile,
    ProfileUsers,
    CreateUser,
    AlterUser,
    DropUser,
    LockUser,
    UnlockUser,
    ChangeOwnPassword,
    CreateRole,
    ChangeRolePassword,
    RemoveRolePassword,
    DropRole,
    CreateProfile,
    AlterProfile,
    DropProfile,
    GrantSystemPrivilege,
    RevokeSystemPrivilege,
    GrantObjectPrivilege,
    RevokeObjectPrivilege,
    GrantColumnPrivilege,
    GrantRole,
    RevokeRole,
    UpsertUserInfo,
    DeleteUserInfo,
}

impl Operation {
    /// Returns true if the operation changes database state.
    #[must_use]
    pub fn is_write(&self) -> bool {
        !matches!(
            self,
            Self::Authenticate
                | Self::SystemPrivileges
                | Self::RoleGrants
                | Self::ObjectGrants
                | Self::ColumnGrants
                | Self::ListUsers
                | Self::User
                | Self::UserInfo
                | Self::UserQuotas
                | Self::ListRoles
                | Self::RoleGrantees
                | Self::ListProfiles
                | Self::Profile
                | Self::ProfileUsers
        )
    }
}

#[derive(Debug)]
struct Account {
    password: String,
    status: AccountStatus,
    lock_date: Option<DateTime<Utc>>,
    created: DateTime<Utc>,
    default_tablespace: ObjectName,
    temporary_tablespace: ObjectName,
    quota: Quota,
    profile: ProfileName,
}

#[derive(Debug, Default)]
struct State {
    accounts: BTreeMap<PrincipalName, Account>,
    roles: BTreeMap<RoleName, Option<String>>,
    profiles: BTreeMap<ProfileName, ProfileSpec>,
    tablespaces: BTreeSet<ObjectName>,
    tables: BTreeMap<TableRef, Vec<ObjectName>>,
    user_info: BTreeMap<PrincipalName, PersonalDetails>,
    system_privileges: Vec<PrivilegeGrant>,
    role_grants: Vec<RoleGrant>,
    object_grants: Vec<ObjectGrant>,
    column_grants: Vec<ColumnGrant>,
    failures: HashMap<Operation, NativeError>,
    delays: HashMap<Operation, Duration>,
    journal: Vec<Operation>,
}

fn err(code: i32, message: impl Into<String>) -> NativeError {
    NativeError::new(code, message)
}

impl State {
    fn connect(
        &self,
        descriptor: &str,
        params: &ConnectionParams,
    ) -> Result<PrincipalName, NativeError> {
        if params.descriptor() != descriptor {
            return Err(err(
                codes::TNS_COULD_NOT_RESOLVE,
                "TNS:could not resolve the connect identifier specified",
            ));
        }

        let denied = || {
            err(
                codes::INVALID_USERNAME_OR_PASSWORD,
                "invalid username/password; logon denied",
            )
        };
        let (Some(principal), Some(secret)) = (params.principal(), params.secret()) else {
            return Err(denied());
        };
        let account = self.accounts.get(principal).ok_or_else(denied)?;
        if account.password != *secret.expose_secret() {
            return Err(denied());
        }
        if account.status.is_locked() {
            return Err(err(codes::ACCOUNT_LOCKED, "the account is locked"));
        }

        Ok(principal.clone())
    }

    fn grantee_exists(&self, grantee: &PrivilegeGrantee) -> bool {
        self.accounts.keys().any(|a| a.as_str() == grantee.as_str())
            || self.roles.keys().any(|r| r.as_str() == grantee.as_str())
    }

    fn name_taken(&self, name: &str) -> bool {
        self.accounts.keys().any(|a| a.as_str() == name)
            || self.roles.keys().any(|r| r.as_str() == name)
    }

    fn require_grantee(&self, grantee: &PrivilegeGrantee) -> Result<(), NativeError> {
        if self.grantee_exists(grantee) {
            Ok(())
        } else {
            Err(err(
                codes::USER_OR_ROLE_DOES_NOT_EXIST,
                format!("user or role '{grantee}' does not exist"),
            ))
        }
    }

    fn require_not_self(
        caller: &PrincipalName,
        grantee: &PrivilegeGrantee,
    ) -> Result<(), NativeError> {
        if caller.as_str() == grantee.as_str() {
            Err(err(
                codes::CANNOT_GRANT_TO_SELF,
                "you may not GRANT/REVOKE privileges to/from yourself",
            ))
        } else {
            Ok(())
        }
    }

    fn require_tablespace(&self, tablespace: &ObjectName) -> Result<(), NativeError> {
        if self.tablespaces.contains(tablespace) {
            Ok(())
        } else {
            Err(err(
                codes::TABLESPACE_DOES_NOT_EXIST,
                format!("tablespace '{tablespace}' does not exist"),
            ))
        }
    }

    fn require_profile(&self, profile: &ProfileName) -> Result<(), NativeError> {
        if self.profiles.contains_key(profile) {
            Ok(())
        } else {
            Err(err(
                codes::PROFILE_DOES_NOT_EXIST,
                format!("profile {profile} does not exist"),
            ))
        }
    }

    fn require_role(&self, role: &RoleName) -> Result<(), NativeError> {
        if self.roles.contains_key(role) {
            Ok(())
        } else {
            Err(err(
                codes::ROLE_DOES_NOT_EXIST,
                format!("role '{role}' does not exist"),
            ))
        }
    }

    fn account_mut(&mut self, username: &PrincipalName) -> Result<&mut Account, NativeError> {
        self.accounts.get_mut(username).ok_or_else(|| {
            err(
                codes::USER_DOES_NOT_EXIST,
                format!("user '{username}' does not exist"),
            )
        })
    }

    fn require_table(&self, table: &TableRef) -> Result<&[ObjectName], NativeError> {
        self.tables.get(table).map(Vec::as_slice).ok_or_else(|| {
            err(
                codes::TABLE_OR_VIEW_DOES_NOT_EXIST,
                "table or view does not exist",
            )
        })
    }

    fn holds_role(&self, grantee: &str, role: &str) -> bool {
        self.role_grants
            .iter()
            .any(|g| g.grantee.as_str() == grantee && g.role.as_str() == role)
    }

    fn holds_system(&self, grantee: &str, privilege: SystemPrivilege) -> bool {
        let direct = |who: &str| {
            self.system_privileges
                .iter()
                .any(|g| g.grantee.as_str() == who && g.privilege == privilege)
        };
        direct(grantee)
            || self
                .role_grants
                .iter()
                .filter(|g| g.grantee.as_str() == grantee)
                .any(|g| direct(g.role.as_str()))
    }

    /// Mirrors the database's own check on object grants: owners, DBAs and
    /// holders of the grant option may pass a table privilege on.
    fn require_grant_authority(
        &self,
        caller: &PrincipalName,
        privilege: ObjectPrivilege,
        table: &TableRef,
    ) -> Result<(), NativeError> {
        let caller = caller.as_str();
        if table.owner.as_str() == caller
            || self.holds_role(caller, ADMIN_ROLE)
            || self.holds_system(caller, SystemPrivilege::GrantAnyObjectPrivilege)
        {
            return Ok(());
        }

        let held = self.object_grants.iter().find(|g| {
            g.grantee.as_str() == caller
                && g.table == *table
                && g.privilege.as_str() == privilege.as_str()
        });
        match held {
            Some(g) if g.grantable => Ok(()),
            Some(_) => Err(err(
                codes::GRANT_OPTION_DOES_NOT_EXIST,
                "grant option does not exist",
            )),
            None => Err(err(
                codes::INSUFFICIENT_PRIVILEGES,
                "insufficient privileges",
            )),
        }
    }

    fn to_user_account(username: &PrincipalName, account: &Account) -> UserAccount {
        UserAccount {
            username: username.clone(),
            status: account.status.clone(),
            lock_date: account.lock_date,
            created: account.created,
            default_tablespace: account.default_tablespace.clone(),
            temporary_tablespace: account.temporary_tablespace.clone(),
            profile: account.profile.clone(),
        }
    }
}

/// In-memory stand-in for a database.
#[derive(Debug)]
pub struct InMemoryCatalog {
    descriptor: String,
    state: Mutex<State>,
}

impl InMemoryCatalog {
    /// Creates a catalog reachable at `descriptor`, holding the `DEFAULT`
    /// profile and the usual tablespaces.
    #[must_use]
    pub fn new(descriptor: impl Into<String>) -> Self {
        let mut state = State::default();
        if let Ok(default) = ProfileName::parse(DEFAULT_PROFILE) {
            state
                .profiles
                .insert(default.clone(), ProfileSpec::new(default));
        }
        state.tablespaces = SEEDED_TABLESPACES
            .into_iter()
            .filter_map(|t| ObjectName::parse(t).ok())
            .collect();

        Self {
            descriptor: descriptor.into(),
            state: Mutex::new(state),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn begin(
        &self,
        operation: Operation,
        params: &ConnectionParams,
    ) -> Result<PrincipalName, NativeError> {
        let delay = {
            let mut state = self.lock();
            state.journal.push(operation);
            state.delays.get(&operation).copied()
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        debug!(?operation, "in-memory catalog call");

        let state = self.lock();
        if let Some(failure) = state.failures.get(&operation) {
            return Err(failure.clone());
        }
        state.connect(&self.descriptor, params)
    }

    /// Adds an open account using the seeded defaults.
    pub fn add_user(&self, username: PrincipalName, password: &str) {
        let mut state = self.lock();
        let Some(users) = ObjectName::parse("USERS").ok() else {
            return;
        };
        let Some(temp) = ObjectName::parse("TEMP").ok() else {
            return;
        };
        let Some(profile) = ProfileName::parse(DEFAULT_PROFILE).ok() else {
            return;
        };
        state.accounts.insert(
            username,
            Account {
                password: password.to_string(),
                status: AccountStatus::Open,
                lock_date: None,
                created: Utc::now(),
                default_tablespace: users,
                temporary_tablespace: temp,
                quota: Quota::Unlimited,
                profile,
            },
        );
    }

    /// Adds a role without a password.
    pub fn add_role(&self, role: RoleName) {
        self.lock().roles.insert(role, None);
    }

    /// Adds a table with the given columns.
    pub fn add_table(&self, table: TableRef, columns: Vec<ObjectName>) {
        self.lock().tables.insert(table, columns);
    }

    /// Grants a system privilege without going through the procedures.
    pub fn seed_system_privilege(&self, grantee: PrivilegeGrantee, privilege: PrivilegeName) {
        self.lock().system_privileges.push(PrivilegeGrant {
            grantee,
            privilege,
            admin_option: false,
        });
    }

    /// Grants a role without going through the procedures.
    pub fn seed_role_grant(&self, grantee: PrivilegeGrantee, role: RoleName) {
        self.lock().role_grants.push(RoleGrant {
            grantee,
            role,
            admin_option: false,
            default_role: true,
        });
    }

    /// Grants a table privilege without going through the procedures.
    pub fn seed_object_grant(&self, grant: ObjectGrant) {
        self.lock().object_grants.push(grant);
    }

    /// Makes every subsequent call of `operation` fail with `error`.
    pub fn fail_on(&self, operation: Operation, error: NativeError) {
        self.lock().failures.insert(operation, error);
    }

    /// Removes all injected failures.
    pub fn clear_failures(&self) {
        self.lock().failures.clear();
    }

    /// Delays every subsequent call of `operation` by `delay`.
    pub fn delay_on(&self, operation: Operation, delay: Duration) {
        self.lock().delays.insert(operation, delay);
    }

    /// Returns every call made so far, in order.
    #[must_use]
    pub fn journal(&self) -> Vec<Operation> {
        self.lock().journal.clone()
    }

    /// Returns true if any write reached the catalog.
    #[must_use]
    pub fn saw_writes(&self) -> bool {
        self.lock().journal.iter().any(Operation::is_write)
    }

    /// Forgets the calls made so far.
    pub fn clear_journal(&self) {
        self.lock().journal.clear();
    }

    /// Returns the personal details stored for `username`.
    #[must_use]
    pub fn personal_details(&self, username: &PrincipalName) -> Option<PersonalDetails> {
        self.lock().user_info.get(username).cloned()
    }

    /// Returns the stored profile, if it exists.
    #[must_use]
    pub fn stored_profile(&self, name: &ProfileName) -> Option<ProfileSpec> {
        self.lock().profiles.get(name).cloned()
    }

    /// Returns true if `role` exists and is password protected.
    #[must_use]
    pub fn role_has_password(&self, role: &RoleName) -> Option<bool> {
        self.lock().roles.get(role).map(Option::is_some)
    }

    /// Returns the tablespace quota of `username`.
    #[must_use]
    pub fn quota(&self, username: &PrincipalName) -> Option<Quota> {
        self.lock().accounts.get(username).map(|a| a.quota)
    }
}

#[async_trait]
impl AuthProbe for InMemoryCatalog {
    async fn authenticate(&self, params: &ConnectionParams) -> Result<(), NativeError> {
        self.begin(Operation::Authenticate, params).await.map(|_| ())
    }
}

#[async_trait]
impl CatalogReader for InMemoryCatalog {
    async fn system_privileges(
        &self,
        params: &ConnectionParams,
        grantee: &PrivilegeGrantee,
    ) -> Result<Vec<PrivilegeGrant>, NativeError> {
        self.begin(Operation::SystemPrivileges, params).await?;
        let state = self.lock();
        Ok(state
            .system_privileges
            .iter()
            .filter(|g| g.grantee == *grantee)
            .cloned()
            .collect())
    }

    async fn role_grants(
        &self,
        params: &ConnectionParams,
        grantee: &PrivilegeGrantee,
    ) -> Result<Vec<RoleGrant>, NativeError> {
        self.begin(Operation::RoleGrants, params).await?;
        let state = self.lock();
        Ok(state
            .role_grants
            .iter()
            .filter(|g| g.grantee == *grantee)
            .cloned()
            .collect())
    }

    async fn object_grants(
        &self,
        params: &ConnectionParams,
        grantee: &PrivilegeGrantee,
    ) -> Result<Vec<ObjectGrant>, NativeError> {
        self.begin(Operation::ObjectGrants, params).await?;
        let state = self.lock();
        Ok(state
            .object_grants
            .iter()
            .filter(|g| g.grantee == *grantee)
            .cloned()
            .collect())
    }

    async fn column_grants(
        &self,
        params: &ConnectionParams,
        grantee: &PrivilegeGrantee,
    ) -> Result<Vec<ColumnGrant>, NativeError> {
        self.begin(Operation::ColumnGrants, params).await?;
        let state = self.lock();
        Ok(state
            .column_grants
            .iter()
            .filter(|g| g.grantee == *grantee)
            .cloned()
            .collect())
    }

    async fn list_users(
        &self,
        params: &ConnectionParams,
    ) -> Result<Vec<UserAccount>, NativeError> {
        self.begin(Operation::ListUsers, params).await?;
        let state = self.lock();
        Ok(state
            .accounts
            .iter()
            .map(|(name, account)| State::to_user_account(name, account))
            .collect())
    }

    async fn user(
        &self,
        params: &ConnectionParams,
        username: &PrincipalName,
    ) -> Result<Option<UserAccount>, NativeError> {
        self.begin(Operation::User, params).await?;
        let state = self.lock();
        Ok(state
            .accounts
            .get(username)
            .map(|account| State::to_user_account(username, account)))
    }

    async fn user_info(
        &self,
        params: &ConnectionParams,
        username: &PrincipalName,
    ) -> Result<Option<PersonalDetails>, NativeError> {
        self.begin(Operation::UserInfo, params).await?;
        Ok(self.lock().user_info.get(username).cloned())
    }

    async fn user_quotas(
        &self,
        params: &ConnectionParams,
        username: &PrincipalName,
    ) -> Result<Vec<TablespaceQuota>, NativeError> {
        self.begin(Operation::UserQuotas, params).await?;
        let state = self.lock();
        Ok(state
            .accounts
            .get(username)
            .map(|account| TablespaceQuota {
                tablespace: account.default_tablespace.clone(),
                quota: account.quota,
            })
            .into_iter()
            .collect())
    }

    async fn list_roles(
        &self,
        params: &ConnectionParams,
    ) -> Result<Vec<RoleSummary>, NativeError> {
        self.begin(Operation::ListRoles, params).await?;
        let state = self.lock();
        Ok(state
            .roles
            .iter()
            .map(|(role, password)| RoleSummary {
                role: role.clone(),
                password_required: password.is_some(),
            })
            .collect())
    }

    async fn role_grantees(
        &self,
        params: &ConnectionParams,
        role: &RoleName,
    ) -> Result<Vec<RoleGrant>, NativeError> {
        self.begin(Operation::RoleGrantees, params).await?;
        let state = self.lock();
        Ok(state
            .role_grants
            .iter()
            .filter(|g| g.role == *role)
            .cloned()
            .collect())
    }

    async fn list_profiles(
        &self,
        params: &ConnectionParams,
    ) -> Result<Vec<ProfileSpec>, NativeError> {
        self.begin(Operation::ListProfiles, params).await?;
        Ok(self.lock().profiles.values().cloned().collect())
    }

    async fn profile(
        &self,
        params: &ConnectionParams,
        profile: &ProfileName,
    ) -> Result<Option<ProfileSpec>, NativeError> {
        self.begin(Operation::Profile, params).await?;
        Ok(self.lock().profiles.get(profile).cloned())
    }

    async fn profile_users(
        &self,
        params: &ConnectionParams,
        profile: &ProfileName,
    ) -> Result<Vec<PrincipalName>, NativeError> {
        self.begin(Operation::ProfileUsers, params).await?;
        let state = self.lock();
        Ok(state
            .accounts
            .iter()
            .filter(|(_, account)| account.profile == *profile)
            .map(|(name, _)| name.clone())
            .collect())
    }
}

#[async_trait]
impl AdminExecutor for InMemoryCatalog {
    async fn create_user(
        &self,
        params: &ConnectionParams,
        user: &NewUser,
    ) -> Result<(), NativeError> {
        self.begin(Operation::CreateUser, params).await?;
        let mut state = self.lock();
        if state.name_taken(user.username.as_str()) {
            return Err(err(
                codes::USER_NAME_CONFLICT,
                format!(
                    "user name '{}' conflicts with another user or role name",
                    user.username
                ),
            ));
        }
        state.require_tablespace(&user.default_tablespace)?;
        state.require_tablespace(&user.temporary_tablespace)?;
        state.require_profile(&user.profile)?;

        let now = Utc::now();
        let (status, lock_date) = if user.locked {
            (AccountStatus::Locked, Some(now))
        } else {
            (AccountStatus::Open, None)
        };
        state.accounts.insert(
            user.username.clone(),
            Account {
                password: user.password.expose_secret().clone(),
                status,
                lock_date,
                created: now,
                default_tablespace: user.default_tablespace.clone(),
                temporary_tablespace: user.temporary_tablespace.clone(),
                quota: user.quota,
                profile: user.profile.clone(),
            },
        );
        Ok(())
    }

    async fn alter_user(
        &self,
        params: &ConnectionParams,
        changes: &UserChanges,
    ) -> Result<(), NativeError> {
        self.begin(Operation::AlterUser, params).await?;
        let mut state = self.lock();
        state.account_mut(&changes.username)?;
        if let Some(tablespace) = &changes.default_tablespace {
            state.require_tablespace(tablespace)?;
        }
        if let Some(tablespace) = &changes.temporary_tablespace {
            state.require_tablespace(tablespace)?;
        }
        if let Some(profile) = &changes.profile {
            state.require_profile(profile)?;
        }

        let account = state.account_mut(&changes.username)?;
        if let Some(password) = &changes.password {
            account.password = password.expose_secret().clone();
        }
        if let Some(tablespace) = &changes.default_tablespace {
            account.default_tablespace = tablespace.clone();
        }
        if let Some(tablespace) = &changes.temporary_tablespace {
            account.temporary_tablespace = tablespace.clone();
        }
        if let Some(quota) = changes.quota {
            account.quota = quota;
        }
        if let Some(profile) = &changes.profile {
            account.profile = profile.clone();
        }
        Ok(())
    }

    async fn drop_user(
        &self,
        params: &ConnectionParams,
        username: &PrincipalName,
    ) -> Result<(), NativeError> {
        self.begin(Operation::DropUser, params).await?;
        let mut state = self.lock();
        state.account_mut(username)?;
        state.accounts.remove(username);

        let name = username.as_str();
        state.system_privileges.retain(|g| g.grantee.as_str() != name);
        state.role_grants.retain(|g| g.grantee.as_str() != name);
        state
            .object_grants
            .retain(|g| g.grantee.as_str() != name && g.table.owner.as_str() != name);
        state
            .column_grants
            .retain(|g| g.grantee.as_str() != name && g.table.owner.as_str() != name);
        state.tables.retain(|t, _| t.owner.as_str() != name);
        Ok(())
    }

    async fn lock_user(
        &self,
        params: &ConnectionParams,
        username: &PrincipalName,
    ) -> Result<(), NativeError> {
        self.begin(Operation::LockUser, params).await?;
        let mut state = self.lock();
        let account = state.account_mut(username)?;
        account.status = AccountStatus::Locked;
        account.lock_date = Some(Utc::now());
        Ok(())
    }

    async fn unlock_user(
        &self,
        params: &ConnectionParams,
        username: &PrincipalName,
    ) -> Result<(), NativeError> {
        self.begin(Operation::UnlockUser, params).await?;
        let mut state = self.lock();
        let account = state.account_mut(username)?;
        account.status = AccountStatus::Open;
        account.lock_date = None;
        Ok(())
    }

    async fn change_own_password(
        &self,
        params: &ConnectionParams,
        current: &SecretString,
        new: &SecretString,
    ) -> Result<(), NativeError> {
        let caller = self.begin(Operation::ChangeOwnPassword, params).await?;
        let mut state = self.lock();
        let account = state.account_mut(&caller)?;
        if account.password != *current.expose_secret() {
            return Err(err(codes::INVALID_OLD_PASSWORD, "invalid old password"));
        }
        if account.password == *new.expose_secret() {
            return Err(err(
                codes::PASSWORD_CANNOT_BE_REUSED,
                "the password cannot be reused",
            ));
        }
        account.password = new.expose_secret().clone();
        Ok(())
    }

    async fn create_role(
        &self,
        params: &ConnectionParams,
        role: &RoleName,
        password: Option<&SecretString>,
    ) -> Result<(), NativeError> {
        self.begin(Operation::CreateRole, params).await?;
        let mut state = self.lock();
        if state.name_taken(role.as_str()) {
            return Err(err(
                codes::ROLE_NAME_CONFLICT,
                format!("role name '{role}' conflicts with another user or role name"),
            ));
        }
        state
            .roles
            .insert(role.clone(), password.map(|p| p.expose_secret().clone()));
        Ok(())
    }

    async fn change_role_password(
        &self,
        params: &ConnectionParams,
        role: &RoleName,
        password: &SecretString,
    ) -> Result<(), NativeError> {
        self.begin(Operation::ChangeRolePassword, params).await?;
        let mut state = self.lock();
        state.require_role(role)?;
        state
            .roles
            .insert(role.clone(), Some(password.expose_secret().clone()));
        Ok(())
    }

    async fn remove_role_password(
        &self,
        params: &ConnectionParams,
        role: &RoleName,
    ) -> Result<(), NativeError> {
        self.begin(Operation::RemoveRolePassword, params).await?;
        let mut state = self.lock();
        state.require_role(role)?;
        state.roles.insert(role.clone(), None);
        Ok(())
    }

    async fn drop_role(
        &self,
        params: &ConnectionParams,
        role: &RoleName,
    ) -> Result<(), NativeError> {
        self.begin(Operation::DropRole, params).await?;
        let mut state = self.lock();
        state.require_role(role)?;
        state.roles.remove(role);

        let name = role.as_str();
        state.system_privileges.retain(|g| g.grantee.as_str() != name);
        state
            .role_grants
            .retain(|g| g.grantee.as_str() != name && g.role != *role);
        state.object_grants.retain(|g| g.grantee.as_str() != name);
        state.column_grants.retain(|g| g.grantee.as_str() != name);
        Ok(())
    }

    async fn create_profile(
        &self,
        params: &ConnectionParams,
        profile: &ProfileSpec,
    ) -> Result<(), NativeError> {
        self.begin(Operation::CreateProfile, params).await?;
        let mut state = self.lock();
        if state.profiles.contains_key(&profile.name) {
            return Err(err(
                codes::PROFILE_ALREADY_EXISTS,
                format!("profile {} already exists", profile.name),
            ));
        }
        state.profiles.insert(profile.name.clone(), profile.clone());
        Ok(())
    }

    async fn alter_profile(
        &self,
        params: &ConnectionParams,
        profile: &ProfileSpec,
    ) -> Result<(), NativeError> {
        self.begin(Operation::AlterProfile, params).await?;
        let mut state = self.lock();
        state.require_profile(&profile.name)?;
        if let Some(stored) = state.profiles.get_mut(&profile.name) {
            for (resource, limit) in profile.limits() {
                stored.set_limit(resource, Some(limit));
            }
        }
        Ok(())
    }

    async fn drop_profile(
        &self,
        params: &ConnectionParams,
        profile: &ProfileName,
    ) -> Result<(), NativeError> {
        self.begin(Operation::DropProfile, params).await?;
        let mut state = self.lock();
        state.require_profile(profile)?;
        state.profiles.remove(profile);

        // CASCADE: accounts on the dropped profile fall back to DEFAULT.
        if let Ok(default) = ProfileName::parse(DEFAULT_PROFILE) {
            for account in state.accounts.values_mut() {
                if account.profile == *profile {
                    account.profile = default.clone();
                }
            }
        }
        Ok(())
    }

    async fn grant_system_privilege(
        &self,
        params: &ConnectionParams,
        grantee: &PrivilegeGrantee,
        privilege: &PrivilegeName,
        with_admin_option: bool,
    ) -> Result<(), NativeError> {
        let caller = self
            .begin(Operation::GrantSystemPrivilege, params)
            .await?;
        let mut state = self.lock();
        State::require_not_self(&caller, grantee)?;
        state.require_grantee(grantee)?;

        let existing = state
            .system_privileges
            .iter_mut()
            .find(|g| g.grantee == *grantee && g.privilege == *privilege);
        match existing {
            Some(grant) => grant.admin_option |= with_admin_option,
            None => state.system_privileges.push(PrivilegeGrant {
                grantee: grantee.clone(),
                privilege: privilege.clone(),
                admin_option: with_admin_option,
            }),
        }
        Ok(())
    }

    async fn revoke_system_privilege(
        &self,
        params: &ConnectionParams,
        grantee: &PrivilegeGrantee,
        privilege: &PrivilegeName,
    ) -> Result<(), NativeError> {
        let caller = self
            .begin(Operation::RevokeSystemPrivilege, params)
            .await?;
        let mut state = self.lock();
        State::require_not_self(&caller, grantee)?;
        state.require_grantee(grantee)?;

        let before = state.system_privileges.len();
        state
            .system_privileges
            .retain(|g| !(g.grantee == *grantee && g.privilege == *privilege));
        if state.system_privileges.len() == before {
            return Err(err(
                codes::SYSTEM_PRIVILEGE_NOT_GRANTED,
                format!("system privileges not granted to '{grantee}'"),
            ));
        }
        Ok(())
    }

    async fn grant_object_privilege(
        &self,
        params: &ConnectionParams,
        request: &ObjectGrantRequest,
    ) -> Result<(), NativeError> {
        let caller = self
            .begin(Operation::GrantObjectPrivilege, params)
            .await?;
        let mut state = self.lock();
        state.require_table(&request.table)?;
        State::require_not_self(&caller, &request.grantee)?;
        state.require_grantee(&request.grantee)?;
        state.require_grant_authority(&caller, request.privilege, &request.table)?;

        let privilege = PrivilegeName::parse(request.privilege.as_str())
            .map_err(|e| err(codes::INVALID_IDENTIFIER, e.to_string()))?;
        let existing = state.object_grants.iter_mut().find(|g| {
            g.grantee == request.grantee && g.table == request.table && g.privilege == privilege
        });
        match existing {
            Some(grant) => grant.grantable |= request.with_grant_option,
            None => state.object_grants.push(ObjectGrant {
                grantee: request.grantee.clone(),
                table: request.table.clone(),
                privilege,
                grantable: request.with_grant_option,
                grantor: caller,
            }),
        }
        Ok(())
    }

    async fn revoke_object_privilege(
        &self,
        params: &ConnectionParams,
        grantee: &PrivilegeGrantee,
        privilege: ObjectPrivilege,
        table: &TableRef,
    ) -> Result<(), NativeError> {
        let caller = self
            .begin(Operation::RevokeObjectPrivilege, params)
            .await?;
        let mut state = self.lock();
        state.require_table(table)?;
        State::require_not_self(&caller, grantee)?;
        state.require_grantee(grantee)?;
        state.require_grant_authority(&caller, privilege, table)?;

        let same = |g_grantee: &PrivilegeGrantee, g_table: &TableRef, g_priv: &PrivilegeName| {
            g_grantee == grantee && g_table == table && g_priv.as_str() == privilege.as_str()
        };
        let had_object = state
            .object_grants
            .iter()
            .any(|g| same(&g.grantee, &g.table, &g.privilege));
        let had_column = state
            .column_grants
            .iter()
            .any(|g| same(&g.grantee, &g.table, &g.privilege));
        if !had_object && !had_column {
            return Err(err(
                codes::CANNOT_REVOKE_UNGRANTED,
                "cannot REVOKE privileges you did not grant",
            ));
        }

        state
            .object_grants
            .retain(|g| !same(&g.grantee, &g.table, &g.privilege));
        state
            .column_grants
            .retain(|g| !same(&g.grantee, &g.table, &g.privilege));
        Ok(())
    }

    async fn grant_column_privilege(
        &self,
        params: &ConnectionParams,
        request: &ColumnGrantRequest,
    ) -> Result<(), NativeError> {
        let caller = self
            .begin(Operation::GrantColumnPrivilege, params)
            .await?;
        let mut state = self.lock();
        let columns = state.require_table(&request.table)?;
        if !columns.contains(&request.column) {
            return Err(err(
                codes::INVALID_IDENTIFIER,
                format!("\"{}\": invalid identifier", request.column),
            ));
        }
        State::require_not_self(&caller, &request.grantee)?;
        state.require_grantee(&request.grantee)?;
        state.require_grant_authority(&caller, request.privilege, &request.table)?;

        let privilege = PrivilegeName::parse(request.privilege.as_str())
            .map_err(|e| err(codes::INVALID_IDENTIFIER, e.to_string()))?;
        let existing = state.column_grants.iter_mut().find(|g| {
            g.grantee == request.grantee
                && g.table == request.table
                && g.column == request.column
                && g.privilege == privilege
        });
        match existing {
            Some(grant) => grant.grantable |= request.with_grant_option,
            None => state.column_grants.push(ColumnGrant {
                grantee: request.grantee.clone(),
                table: request.table.clone(),
                column: request.column.clone(),
                privilege,
                grantable: request.with_grant_option,
            }),
        }
        Ok(())
    }

    async fn grant_role(
        &self,
        params: &ConnectionParams,
        role: &RoleName,
        grantee: &PrivilegeGrantee,
        with_admin_option: bool,
    ) -> Result<(), NativeError> {
        self.begin(Operation::GrantRole, params).await?;
        let mut state = self.lock();
        state.require_role(role)?;
        state.require_grantee(grantee)?;
        if role.as_str() == grantee.as_str() {
            return Err(err(
                codes::CIRCULAR_ROLE_GRANT,
                format!("circular role grant detected involving '{role}'"),
            ));
        }

        let existing = state
            .role_grants
            .iter_mut()
            .find(|g| g.grantee == *grantee && g.role == *role);
        match existing {
            Some(grant) => grant.admin_option |= with_admin_option,
            None => state.role_grants.push(RoleGrant {
                grantee: grantee.clone(),
                role: role.clone(),
                admin_option: with_admin_option,
                default_role: true,
            }),
        }
        Ok(())
    }

    async fn revoke_role(
        &self,
        params: &ConnectionParams,
        role: &RoleName,
        grantee: &PrivilegeGrantee,
    ) -> Result<(), NativeError> {
        self.begin(Operation::RevokeRole, params).await?;
        let mut state = self.lock();
        state.require_role(role)?;
        state.require_grantee(grantee)?;

        let before = state.role_grants.len();
        state
            .role_grants
            .retain(|g| !(g.grantee == *grantee && g.role == *role));
        if state.role_grants.len() == before {
            return Err(err(
                codes::ROLE_NOT_GRANTED,
                format!("role '{role}' not granted to '{grantee}'"),
            ));
        }
        Ok(())
    }

    async fn upsert_user_info(
        &self,
        params: &ConnectionParams,
        username: &PrincipalName,
        details: &PersonalDetails,
    ) -> Result<(), NativeError> {
        self.begin(Operation::UpsertUserInfo, params).await?;
        self.lock()
            .user_info
            .insert(username.clone(), details.clone());
        Ok(())
    }

    async fn delete_user_info(
        &self,
        params: &ConnectionParams,
        username: &PrincipalName,
    ) -> Result<(), NativeError> {
        self.begin(Operation::DeleteUserInfo, params).await?;
        self.lock().user_info.remove(username);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DESCRIPTOR: &str = "//localhost:1521/FREEPDB1";

    fn principal(name: &str) -> PrincipalName {
        PrincipalName::parse(name).expect("valid principal")
    }

    fn role(name: &str) -> RoleName {
        RoleName::parse(name).expect("valid role")
    }

    fn object(name: &str) -> ObjectName {
        ObjectName::parse(name).expect("valid object name")
    }

    fn params_for(name: &str, password: &str) -> ConnectionParams {
        ConnectionParams::authenticated(
            DESCRIPTOR,
            principal(name),
            &SecretString::new(password.to_string()),
        )
    }

    fn catalog() -> InMemoryCatalog {
        let catalog = InMemoryCatalog::new(DESCRIPTOR);
        catalog.add_user(principal("sys_admin"), "Admin#2024");
        catalog.add_user(principal("scott"), "Tiger#123");
        catalog
    }

    fn hr_employees() -> TableRef {
        TableRef::new(object("hr"), object("employees"))
    }

    #[tokio::test]
    async fn authenticate_checks_password_and_lock() {
        let catalog = catalog();
        catalog
            .authenticate(&params_for("scott", "Tiger#123"))
            .await
            .expect("valid credentials");

        let wrong = catalog
            .authenticate(&params_for("scott", "nope"))
            .await
            .unwrap_err();
        assert_eq!(wrong.code(), codes::INVALID_USERNAME_OR_PASSWORD);

        let anonymous = catalog
            .authenticate(&ConnectionParams::anonymous(DESCRIPTOR))
            .await
            .unwrap_err();
        assert_eq!(anonymous.code(), codes::INVALID_USERNAME_OR_PASSWORD);

        let admin = params_for("sys_admin", "Admin#2024");
        catalog
            .lock_user(&admin, &principal("scott"))
            .await
            .expect("lock");
        let locked = catalog
            .authenticate(&params_for("scott", "Tiger#123"))
            .await
            .unwrap_err();
        assert_eq!(locked.code(), codes::ACCOUNT_LOCKED);
    }

    #[tokio::test]
    async fn wrong_descriptor_cannot_resolve() {
        let catalog = catalog();
        let params = ConnectionParams::authenticated(
            "//elsewhere:1521/X",
            principal("scott"),
            &SecretString::new("Tiger#123".to_string()),
        );
        let err = catalog.authenticate(&params).await.unwrap_err();
        assert_eq!(err.code(), codes::TNS_COULD_NOT_RESOLVE);
    }

    #[tokio::test]
    async fn create_user_conflicts_with_existing_names() {
        let catalog = catalog();
        catalog.add_role(role("app_reader"));
        let admin = params_for("sys_admin", "Admin#2024");

        let user = |name: &str| NewUser {
            username: principal(name),
            password: SecretString::new("Passw0rd!".to_string()),
            default_tablespace: object("users"),
            temporary_tablespace: object("temp"),
            quota: Quota::Unlimited,
            profile: ProfileName::parse("default").expect("valid profile"),
            locked: false,
        };

        let err = catalog
            .create_user(&admin, &user("scott"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), codes::USER_NAME_CONFLICT);

        let err = catalog
            .create_user(&admin, &user("app_reader"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), codes::USER_NAME_CONFLICT);

        catalog
            .create_user(&admin, &user("new_hire"))
            .await
            .expect("create");
        let account = catalog
            .user(&admin, &principal("new_hire"))
            .await
            .expect("read")
            .expect("exists");
        assert_eq!(account.status, AccountStatus::Open);
    }

    #[tokio::test]
    async fn grants_to_self_are_refused() {
        let catalog = catalog();
        let admin = params_for("sys_admin", "Admin#2024");
        let grantee = PrivilegeGrantee::from(&principal("sys_admin"));
        let privilege = PrivilegeName::from(SystemPrivilege::CreateSession);

        let err = catalog
            .grant_system_privilege(&admin, &grantee, &privilege, false)
            .await
            .unwrap_err();
        assert_eq!(err.code(), codes::CANNOT_GRANT_TO_SELF);
    }

    #[tokio::test]
    async fn object_grant_requires_authority() {
        let catalog = catalog();
        catalog.add_user(principal("hr"), "Hr#12345");
        catalog.add_table(hr_employees(), vec![object("salary")]);
        let request = ObjectGrantRequest {
            grantee: PrivilegeGrantee::from(&principal("sys_admin")),
            privilege: ObjectPrivilege::Select,
            table: hr_employees(),
            with_grant_option: false,
        };

        let err = catalog
            .grant_object_privilege(&params_for("scott", "Tiger#123"), &request)
            .await
            .unwrap_err();
        assert_eq!(err.code(), codes::INSUFFICIENT_PRIVILEGES);

        catalog
            .grant_object_privilege(&params_for("hr", "Hr#12345"), &request)
            .await
            .expect("owner may grant");
    }

    #[tokio::test]
    async fn revoking_object_privilege_clears_column_grants() {
        let catalog = catalog();
        catalog.add_user(principal("hr"), "Hr#12345");
        catalog.add_table(hr_employees(), vec![object("salary")]);
        let owner = params_for("hr", "Hr#12345");
        let scott = PrivilegeGrantee::from(&principal("scott"));

        catalog
            .grant_column_privilege(
                &owner,
                &ColumnGrantRequest {
                    grantee: scott.clone(),
                    privilege: ObjectPrivilege::Insert,
                    table: hr_employees(),
                    column: object("salary"),
                    with_grant_option: false,
                },
            )
            .await
            .expect("column grant");

        catalog
            .revoke_object_privilege(&owner, &scott, ObjectPrivilege::Insert, &hr_employees())
            .await
            .expect("revoke");
        let remaining = catalog
            .column_grants(&owner, &scott)
            .await
            .expect("read");
        assert!(remaining.is_empty());

        let err = catalog
            .revoke_object_privilege(&owner, &scott, ObjectPrivilege::Insert, &hr_employees())
            .await
            .unwrap_err();
        assert_eq!(err.code(), codes::CANNOT_REVOKE_UNGRANTED);
    }

    #[tokio::test]
    async fn injected_failures_and_journal() {
        let catalog = catalog();
        let admin = params_for("sys_admin", "Admin#2024");
        catalog.fail_on(
            Operation::DropUser,
            NativeError::new(
                codes::CANNOT_DROP_CONNECTED_USER,
                "cannot drop a user that is currently connected",
            ),
        );

        let err = catalog
            .drop_user(&admin, &principal("scott"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), codes::CANNOT_DROP_CONNECTED_USER);
        assert_eq!(catalog.journal(), vec![Operation::DropUser]);
        assert!(catalog.saw_writes());

        catalog.clear_failures();
        catalog.clear_journal();
        catalog
            .drop_user(&admin, &principal("scott"))
            .await
            .expect("drop");
        assert!(
            catalog
                .user(&admin, &principal("scott"))
                .await
                .expect("read")
                .is_none()
        );
    }

    #[tokio::test]
    async fn change_own_password_checks_old_password() {
        let catalog = catalog();
        let params = params_for("scott", "Tiger#123");

        let err = catalog
            .change_own_password(
                &params,
                &SecretString::new("wrong".to_string()),
                &SecretString::new("Lion#4567".to_string()),
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), codes::INVALID_OLD_PASSWORD);

        catalog
            .change_own_password(
                &params,
                &SecretString::new("Tiger#123".to_string()),
                &SecretString::new("Lion#4567".to_string()),
            )
            .await
            .expect("change");
        catalog
            .authenticate(&params_for("scott", "Lion#4567"))
            .await
            .expect("new password works");
    }

    #[tokio::test]
    async fn drop_profile_falls_back_to_default() {
        let catalog = catalog();
        let admin = params_for("sys_admin", "Admin#2024");
        let batch = ProfileName::parse("batch").expect("valid profile");

        catalog
            .create_profile(&admin, &ProfileSpec::new(batch.clone()))
            .await
            .expect("create");
        let err = catalog
            .create_profile(&admin, &ProfileSpec::new(batch.clone()))
            .await
            .unwrap_err();
        assert_eq!(err.code(), codes::PROFILE_ALREADY_EXISTS);

        catalog
            .alter_user(
                &admin,
                &UserChanges {
                    username: principal("scott"),
                    password: None,
                    default_tablespace: None,
                    temporary_tablespace: None,
                    quota: None,
                    profile: Some(batch.clone()),
                },
            )
            .await
            .expect("assign profile");
        catalog.drop_profile(&admin, &batch).await.expect("drop");

        let scott = catalog
            .user(&admin, &principal("scott"))
            .await
            .expect("read")
            .expect("exists");
        assert_eq!(scott.profile.as_str(), DEFAULT_PROFILE);
    }

    #[tokio::test]
    async fn dictionary_reads_are_not_writes() {
        let catalog = catalog();
        let admin = params_for("sys_admin", "Admin#2024");
        catalog.add_role(role("reporting"));
        catalog.seed_role_grant(PrivilegeGrantee::from(&principal("scott")), role("reporting"));
        catalog.clear_journal();

        let roles = catalog.list_roles(&admin).await.expect("roles");
        assert_eq!(
            roles,
            [RoleSummary {
                role: role("REPORTING"),
                password_required: false,
            }]
        );
        let grantees = catalog
            .role_grantees(&admin, &role("reporting"))
            .await
            .expect("grantees");
        assert_eq!(grantees.len(), 1);
        assert_eq!(grantees[0].grantee.as_str(), "SCOTT");

        let default = ProfileName::parse(DEFAULT_PROFILE).expect("valid profile");
        let profiles = catalog.list_profiles(&admin).await.expect("profiles");
        assert_eq!(profiles, [ProfileSpec::new(default.clone())]);
        let users = catalog
            .profile_users(&admin, &default)
            .await
            .expect("profile users");
        assert_eq!(users, [principal("SCOTT"), principal("SYS_ADMIN")]);
        let missing = ProfileName::parse("missing").expect("valid profile");
        assert!(catalog.profile(&admin, &missing).await.expect("read").is_none());

        let quotas = catalog
            .user_quotas(&admin, &principal("scott"))
            .await
            .expect("quotas");
        assert_eq!(quotas[0].tablespace, object("users"));
        assert_eq!(quotas[0].quota, Quota::Unlimited);
        assert!(
            catalog
                .user_info(&admin, &principal("scott"))
                .await
                .expect("info")
                .is_none()
        );

        assert_eq!(catalog.journal().len(), 7);
        assert!(!catalog.saw_writes());
    }

    #[tokio::test]
    async fn dictionary_reads_need_a_live_login() {
        let catalog = catalog();
        let err = catalog
            .list_roles(&params_for("scott", "wrong"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), codes::INVALID_USERNAME_OR_PASSWORD);
    }
}
