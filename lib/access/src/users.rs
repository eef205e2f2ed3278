//! Gated account administration.

use crate::console::{Console, Outcome, bounded};
use crate::error::AdminError;
use crate::gate::{Requirement, forbid_self};
use crate::validate;
use dbwarden_catalog::{
    Backend, NewUser, PersonalDetails, TablespaceQuota, UserAccount, UserChanges,
};
use dbwarden_core::{PrincipalName, ProfileName, SystemPrivilege};
use secrecy::SecretString;
use tracing::{info, instrument, warn};

/// Input for [`Console::create_user`]. Blank optional fields take the
/// configured defaults.
#[derive(Debug)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: SecretString,
    pub default_tablespace: Option<String>,
    pub temporary_tablespace: Option<String>,
    pub quota: Option<String>,
    pub profile: Option<String>,
    /// Create the account locked.
    pub locked: bool,
    /// Stored beside the account when set.
    pub details: Option<PersonalDetails>,
}

impl CreateUserRequest {
    /// Creates a request using every default.
    #[must_use]
    pub fn new(username: impl Into<String>, password: SecretString) -> Self {
        Self {
            username: username.into(),
            password,
            default_tablespace: None,
            temporary_tablespace: None,
            quota: None,
            profile: None,
            locked: false,
            details: None,
        }
    }
}

/// Input for [`Console::alter_user`]. `None` or blank leaves a setting
/// unchanged.
#[derive(Debug)]
pub struct AlterUserRequest {
    pub username: String,
    pub password: Option<SecretString>,
    pub default_tablespace: Option<String>,
    pub temporary_tablespace: Option<String>,
    pub quota: Option<String>,
    pub profile: Option<String>,
    /// Replaces the stored personal details when set.
    pub details: Option<PersonalDetails>,
}

impl AlterUserRequest {
    /// Creates a request that changes nothing.
    #[must_use]
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: None,
            default_tablespace: None,
            temporary_tablespace: None,
            quota: None,
            profile: None,
            details: None,
        }
    }
}

fn non_blank(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|value| !value.is_empty())
}

impl<B> Console<B>
where
    B: Backend + ?Sized,
{
    /// Creates an account, then stores its personal details if given.
    ///
    /// # Errors
    ///
    /// Requires `CREATE USER`. Returns `ValidationError` for a bad name,
    /// quota or password, and the translated failure of the create call.
    /// A failure storing personal details is reported in the [`Outcome`].
    #[instrument(skip_all, fields(username = %request.username))]
    pub async fn create_user(&self, request: CreateUserRequest) -> Result<Outcome, AdminError> {
        self.require(Requirement::SystemPrivilege(SystemPrivilege::CreateUser))?;

        let defaults = &self.config.defaults;
        let username: PrincipalName = validate::name("username", &request.username)?;
        validate::password(&self.config.password_policy, "password", &request.password)?;
        let user = NewUser {
            default_tablespace: validate::name_or(
                "default tablespace",
                request.default_tablespace.as_deref(),
                &defaults.default_tablespace,
            )?,
            temporary_tablespace: validate::name_or(
                "temporary tablespace",
                request.temporary_tablespace.as_deref(),
                &defaults.temporary_tablespace,
            )?,
            quota: validate::quota(
                non_blank(request.quota.as_deref()).unwrap_or(defaults.quota.as_str()),
            )?,
            profile: validate::name_or("profile", request.profile.as_deref(), &defaults.profile)?,
            locked: request.locked,
            username,
            password: request.password,
        };

        let params = self.params();
        bounded(
            self.timeout(),
            "create user",
            self.backend.create_user(&params, &user),
        )
        .await?;
        info!(username = %user.username, "user created");

        let mut outcome = Outcome::default();
        if let Some(details) = &request.details {
            self.save_details(&user.username, details, &mut outcome)
                .await;
        }
        Ok(outcome)
    }

    /// Changes an account's password, tablespaces, quota or profile, then
    /// replaces its personal details if given.
    ///
    /// Changing the caller's own password here does not update the stored
    /// credential; use [`Console::change_own_password`] for that.
    ///
    /// # Errors
    ///
    /// Requires `ALTER USER`. Returns `ValidationError` for bad input and the
    /// translated failure of the update call.
    #[instrument(skip_all, fields(username = %request.username))]
    pub async fn alter_user(&self, request: AlterUserRequest) -> Result<Outcome, AdminError> {
        self.require(Requirement::SystemPrivilege(SystemPrivilege::AlterUser))?;

        let username: PrincipalName = validate::name("username", &request.username)?;
        if let Some(password) = &request.password {
            validate::password(&self.config.password_policy, "password", password)?;
        }
        let changes = UserChanges {
            default_tablespace: validate::optional_name(
                "default tablespace",
                request.default_tablespace.as_deref(),
            )?,
            temporary_tablespace: validate::optional_name(
                "temporary tablespace",
                request.temporary_tablespace.as_deref(),
            )?,
            quota: non_blank(request.quota.as_deref())
                .map(validate::quota)
                .transpose()?,
            profile: validate::optional_name::<ProfileName>("profile", request.profile.as_deref())?,
            password: request.password,
            username,
        };

        let params = self.params();
        bounded(
            self.timeout(),
            "alter user",
            self.backend.alter_user(&params, &changes),
        )
        .await?;
        info!(username = %changes.username, "user altered");

        let mut outcome = Outcome::default();
        if let Some(details) = &request.details {
            self.save_details(&changes.username, details, &mut outcome)
                .await;
        }
        Ok(outcome)
    }

    /// Drops an account and everything it owns, then removes its personal
    /// details.
    ///
    /// # Errors
    ///
    /// Requires `DROP USER`. Returns `SelfOperationForbidden` when `username`
    /// is the caller.
    #[instrument(skip_all, fields(username = %username))]
    pub async fn drop_user(&self, username: &str) -> Result<Outcome, AdminError> {
        let session = self.require(Requirement::SystemPrivilege(SystemPrivilege::DropUser))?;
        forbid_self(session, "drop", username)?;
        let username: PrincipalName = validate::name("username", username)?;

        let params = self.params();
        bounded(
            self.timeout(),
            "drop user",
            self.backend.drop_user(&params, &username),
        )
        .await?;
        info!(username = %username, "user dropped");

        let mut outcome = Outcome::default();
        if let Err(error) = bounded(
            self.timeout(),
            "delete user info",
            self.backend.delete_user_info(&params, &username),
        )
        .await
        {
            warn!(%error, username = %username, "user dropped but personal details were not removed");
            outcome
                .warnings
                .push(format!("personal details of {username} were not removed: {error}"));
        }
        Ok(outcome)
    }

    /// Locks an account.
    ///
    /// # Errors
    ///
    /// Requires `ALTER USER`. Returns `SelfOperationForbidden` when
    /// `username` is the caller.
    #[instrument(skip_all, fields(username = %username))]
    pub async fn lock_user(&self, username: &str) -> Result<(), AdminError> {
        let session = self.require(Requirement::SystemPrivilege(SystemPrivilege::AlterUser))?;
        forbid_self(session, "lock", username)?;
        let username: PrincipalName = validate::name("username", username)?;

        let params = self.params();
        bounded(
            self.timeout(),
            "lock user",
            self.backend.lock_user(&params, &username),
        )
        .await?;
        info!(username = %username, "user locked");
        Ok(())
    }

    /// Unlocks an account.
    ///
    /// # Errors
    ///
    /// Requires `ALTER USER`.
    #[instrument(skip_all, fields(username = %username))]
    pub async fn unlock_user(&self, username: &str) -> Result<(), AdminError> {
        self.require(Requirement::SystemPrivilege(SystemPrivilege::AlterUser))?;
        let username: PrincipalName = validate::name("username", username)?;

        let params = self.params();
        bounded(
            self.timeout(),
            "unlock user",
            self.backend.unlock_user(&params, &username),
        )
        .await?;
        info!(username = %username, "user unlocked");
        Ok(())
    }

    /// Lists every account, ordered by username.
    ///
    /// # Errors
    ///
    /// Requires an admin-equivalent session.
    #[instrument(skip_all)]
    pub async fn list_users(&self) -> Result<Vec<UserAccount>, AdminError> {
        self.require(Requirement::AdminEquivalent)?;

        let params = self.params();
        let mut users = bounded(
            self.timeout(),
            "list users",
            self.backend.list_users(&params),
        )
        .await?;
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }

    /// Fetches one account. Anyone may read their own.
    ///
    /// # Errors
    ///
    /// Requires an admin-equivalent session unless `username` is the caller.
    /// Returns `DoesNotExist` if there is no such account.
    #[instrument(skip_all, fields(username = %username))]
    pub async fn user_account(&self, username: &str) -> Result<UserAccount, AdminError> {
        let username = self.require_self_or_admin(username)?;

        let params = self.params();
        bounded(
            self.timeout(),
            "read user",
            self.backend.user(&params, &username),
        )
        .await?
        .ok_or_else(|| AdminError::DoesNotExist {
            reason: format!("user {username} does not exist"),
        })
    }

    /// Fetches the personal details stored beside an account, or `None` if
    /// none were ever saved. Anyone may read their own.
    ///
    /// # Errors
    ///
    /// Requires an admin-equivalent session unless `username` is the caller.
    #[instrument(skip_all, fields(username = %username))]
    pub async fn user_details(
        &self,
        username: &str,
    ) -> Result<Option<PersonalDetails>, AdminError> {
        let username = self.require_self_or_admin(username)?;

        let params = self.params();
        bounded(
            self.timeout(),
            "read user info",
            self.backend.user_info(&params, &username),
        )
        .await
    }

    /// Lists the tablespace quotas of an account, ordered by tablespace.
    /// Anyone may read their own.
    ///
    /// # Errors
    ///
    /// Requires an admin-equivalent session unless `username` is the caller.
    #[instrument(skip_all, fields(username = %username))]
    pub async fn user_quotas(&self, username: &str) -> Result<Vec<TablespaceQuota>, AdminError> {
        let username = self.require_self_or_admin(username)?;

        let params = self.params();
        let mut quotas = bounded(
            self.timeout(),
            "read user quotas",
            self.backend.user_quotas(&params, &username),
        )
        .await?;
        quotas.sort_by(|a, b| a.tablespace.cmp(&b.tablespace));
        Ok(quotas)
    }

    /// Parses `raw`, then lets the read through if it names the caller or the
    /// session is admin-equivalent.
    fn require_self_or_admin(&self, raw: &str) -> Result<PrincipalName, AdminError> {
        let session = self.require(Requirement::Authenticated)?;
        let username: PrincipalName = validate::name("username", raw)?;
        if *session.principal() != username {
            self.require(Requirement::AdminEquivalent)?;
        }
        Ok(username)
    }

    async fn save_details(
        &self,
        username: &PrincipalName,
        details: &PersonalDetails,
        outcome: &mut Outcome,
    ) {
        let params = self.params();
        if let Err(error) = bounded(
            self.timeout(),
            "save user info",
            self.backend.upsert_user_info(&params, username, details),
        )
        .await
        {
            warn!(%error, username = %username, "personal details were not saved");
            outcome
                .warnings
                .push(format!("personal details of {username} were not saved: {error}"));
        }
    }
}
