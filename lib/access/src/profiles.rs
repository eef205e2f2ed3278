//! Gated profile administration.

use crate::console::{Console, bounded};
use crate::error::AdminError;
use crate::gate::Requirement;
use crate::validate;
use dbwarden_catalog::{Backend, ProfileSpec};
use dbwarden_core::{
    DEFAULT_PROFILE, PrincipalName, ProfileName, ProfileResource, SystemPrivilege,
};
use tracing::{info, instrument};

/// Input for [`Console::create_profile`] and [`Console::alter_profile`].
///
/// Each limit is `UNLIMITED`, `DEFAULT` or a non-negative integer. Blank or
/// `None` leaves the resource untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileRequest {
    pub name: String,
    pub sessions_per_user: Option<String>,
    pub connect_time: Option<String>,
    pub idle_time: Option<String>,
}

impl ProfileRequest {
    /// Creates a request that sets no limits.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    fn raw_limit(&self, resource: ProfileResource) -> Option<&str> {
        match resource {
            ProfileResource::SessionsPerUser => self.sessions_per_user.as_deref(),
            ProfileResource::ConnectTime => self.connect_time.as_deref(),
            ProfileResource::IdleTime => self.idle_time.as_deref(),
        }
    }

    fn to_spec(&self) -> Result<ProfileSpec, AdminError> {
        let mut spec = ProfileSpec::new(validate::name("profile", &self.name)?);
        for resource in ProfileResource::ALL {
            let limit = validate::resource_limit(resource.as_str(), self.raw_limit(resource))?;
            spec.set_limit(resource, limit);
        }
        Ok(spec)
    }
}

impl<B> Console<B>
where
    B: Backend + ?Sized,
{
    /// Creates a profile with the given limits.
    ///
    /// # Errors
    ///
    /// Requires `CREATE PROFILE`. Returns `ValidationError` naming the
    /// resource whose limit is malformed.
    #[instrument(skip_all, fields(profile = %request.name))]
    pub async fn create_profile(&self, request: &ProfileRequest) -> Result<(), AdminError> {
        self.require(Requirement::SystemPrivilege(SystemPrivilege::CreateProfile))?;
        let spec = request.to_spec()?;

        let params = self.params();
        bounded(
            self.timeout(),
            "create profile",
            self.backend.create_profile(&params, &spec),
        )
        .await?;
        info!(profile = %spec.name, "profile created");
        Ok(())
    }

    /// Changes the given limits of a profile.
    ///
    /// # Errors
    ///
    /// Requires `ALTER PROFILE`.
    #[instrument(skip_all, fields(profile = %request.name))]
    pub async fn alter_profile(&self, request: &ProfileRequest) -> Result<(), AdminError> {
        self.require(Requirement::SystemPrivilege(SystemPrivilege::AlterProfile))?;
        let spec = request.to_spec()?;

        let params = self.params();
        bounded(
            self.timeout(),
            "alter profile",
            self.backend.alter_profile(&params, &spec),
        )
        .await?;
        info!(profile = %spec.name, "profile altered");
        Ok(())
    }

    /// Drops a profile. Accounts using it fall back to `DEFAULT`.
    ///
    /// # Errors
    ///
    /// Requires `DROP PROFILE`. The `DEFAULT` profile cannot be dropped.
    #[instrument(skip_all, fields(profile = %name))]
    pub async fn drop_profile(&self, name: &str) -> Result<(), AdminError> {
        self.require(Requirement::SystemPrivilege(SystemPrivilege::DropProfile))?;
        let profile: ProfileName = validate::name("profile", name)?;
        if profile.as_str() == DEFAULT_PROFILE {
            return Err(AdminError::PolicyViolation {
                reason: "the DEFAULT profile cannot be dropped".to_string(),
            });
        }

        let params = self.params();
        bounded(
            self.timeout(),
            "drop profile",
            self.backend.drop_profile(&params, &profile),
        )
        .await?;
        info!(profile = %profile, "profile dropped");
        Ok(())
    }

    /// Lists every profile with its limits, ordered by name.
    ///
    /// # Errors
    ///
    /// Requires an admin-equivalent session.
    #[instrument(skip_all)]
    pub async fn list_profiles(&self) -> Result<Vec<ProfileSpec>, AdminError> {
        self.require(Requirement::AdminEquivalent)?;

        let params = self.params();
        let mut profiles = bounded(
            self.timeout(),
            "list profiles",
            self.backend.list_profiles(&params),
        )
        .await?;
        profiles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(profiles)
    }

    /// Reads the limits of one profile.
    ///
    /// # Errors
    ///
    /// Requires an admin-equivalent session. Returns `DoesNotExist` if there
    /// is no such profile.
    #[instrument(skip_all, fields(profile = %name))]
    pub async fn profile_limits(&self, name: &str) -> Result<ProfileSpec, AdminError> {
        self.require(Requirement::AdminEquivalent)?;
        let profile: ProfileName = validate::name("profile", name)?;

        let params = self.params();
        bounded(
            self.timeout(),
            "read profile",
            self.backend.profile(&params, &profile),
        )
        .await?
        .ok_or_else(|| AdminError::DoesNotExist {
            reason: format!("profile {profile} does not exist"),
        })
    }

    /// Lists the accounts assigned to a profile, ordered by name.
    ///
    /// # Errors
    ///
    /// Requires an admin-equivalent session.
    #[instrument(skip_all, fields(profile = %name))]
    pub async fn profile_users(&self, name: &str) -> Result<Vec<PrincipalName>, AdminError> {
        self.require(Requirement::AdminEquivalent)?;
        let profile: ProfileName = validate::name("profile", name)?;

        let params = self.params();
        let mut users = bounded(
            self.timeout(),
            "read profile users",
            self.backend.profile_users(&params, &profile),
        )
        .await?;
        users.sort();
        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::testing::{admin, catalog, clerk, principal};
    use crate::users::AlterUserRequest;
    use dbwarden_core::ResourceLimit;

    fn request(name: &str, sessions: &str, connect: &str, idle: &str) -> ProfileRequest {
        ProfileRequest {
            name: name.to_string(),
            sessions_per_user: Some(sessions.to_string()),
            connect_time: Some(connect.to_string()),
            idle_time: Some(idle.to_string()),
        }
    }

    fn profile(name: &str) -> ProfileName {
        ProfileName::parse(name).expect("valid profile")
    }

    #[tokio::test]
    async fn create_profile_accepts_every_limit_form() {
        let catalog = catalog();
        let console = admin(&catalog).await;

        console
            .create_profile(&request("clerks", "UNLIMITED", "default", "0"))
            .await
            .expect("create");
        let stored = catalog.stored_profile(&profile("CLERKS")).expect("stored");
        assert_eq!(stored.sessions_per_user, Some(ResourceLimit::Unlimited));
        assert_eq!(stored.connect_time, Some(ResourceLimit::Default));
        assert_eq!(stored.idle_time, Some(ResourceLimit::Value(0)));

        console
            .create_profile(&request("batch", "120", "", " "))
            .await
            .expect("create");
        let stored = catalog.stored_profile(&profile("batch")).expect("stored");
        assert_eq!(stored.sessions_per_user, Some(ResourceLimit::Value(120)));
        assert_eq!(stored.connect_time, None);
    }

    #[tokio::test]
    async fn negative_limit_names_the_resource() {
        let catalog = catalog();
        let console = admin(&catalog).await;

        let err = console
            .create_profile(&request("clerks", "1", "1", "-5"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AdminError::ValidationError { ref field, ref value, .. }
                if field == "IDLE_TIME" && value == "-5"
        ));
        assert!(!catalog.saw_writes());
    }

    #[tokio::test]
    async fn alter_profile_changes_only_given_limits() {
        let catalog = catalog();
        let console = admin(&catalog).await;
        console
            .create_profile(&request("clerks", "2", "60", "15"))
            .await
            .expect("create");

        let mut change = ProfileRequest::new("clerks");
        change.idle_time = Some("30".to_string());
        console.alter_profile(&change).await.expect("alter");

        let stored = catalog.stored_profile(&profile("clerks")).expect("stored");
        assert_eq!(stored.sessions_per_user, Some(ResourceLimit::Value(2)));
        assert_eq!(stored.connect_time, Some(ResourceLimit::Value(60)));
        assert_eq!(stored.idle_time, Some(ResourceLimit::Value(30)));

        let err = console
            .alter_profile(&ProfileRequest::new("missing"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DoesNotExist);
    }

    #[tokio::test]
    async fn duplicate_profile_already_exists() {
        let catalog = catalog();
        let console = admin(&catalog).await;
        console
            .create_profile(&ProfileRequest::new("clerks"))
            .await
            .expect("create");
        let err = console
            .create_profile(&ProfileRequest::new("CLERKS"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
    }

    #[tokio::test]
    async fn dropping_default_profile_is_refused() {
        let catalog = catalog();
        let console = admin(&catalog).await;
        let err = console.drop_profile(" default ").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PolicyViolation);
        assert!(!catalog.saw_writes());
    }

    #[tokio::test]
    async fn dropped_profile_users_fall_back_to_default() {
        let catalog = catalog();
        let console = admin(&catalog).await;
        console
            .create_profile(&ProfileRequest::new("clerks"))
            .await
            .expect("create");
        let mut assign = AlterUserRequest::new("clerk");
        assign.profile = Some("clerks".to_string());
        console.alter_user(assign).await.expect("assign");

        console.drop_profile("clerks").await.expect("drop");
        assert!(catalog.stored_profile(&profile("clerks")).is_none());
        let account = console.user_account("clerk").await.expect("read");
        assert_eq!(account.profile.as_str(), DEFAULT_PROFILE);
        assert_eq!(account.username, principal("clerk"));
    }

    #[tokio::test]
    async fn profiles_are_listed_with_their_limits() {
        let catalog = catalog();
        let console = admin(&catalog).await;
        console
            .create_profile(&request("clerks", "2", "UNLIMITED", "15"))
            .await
            .expect("create");
        catalog.clear_journal();

        let names: Vec<String> = console
            .list_profiles()
            .await
            .expect("list")
            .into_iter()
            .map(|p| p.name.to_string())
            .collect();
        assert_eq!(names, ["CLERKS", DEFAULT_PROFILE]);

        let clerks = console.profile_limits(" clerks ").await.expect("read");
        assert_eq!(clerks.sessions_per_user, Some(ResourceLimit::Value(2)));
        assert_eq!(clerks.connect_time, Some(ResourceLimit::Unlimited));
        assert_eq!(clerks.idle_time, Some(ResourceLimit::Value(15)));
        assert!(!catalog.saw_writes());

        let err = console.profile_limits("missing").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DoesNotExist);
    }

    #[tokio::test]
    async fn profile_users_follow_assignments() {
        let catalog = catalog();
        let console = admin(&catalog).await;
        console
            .create_profile(&ProfileRequest::new("clerks"))
            .await
            .expect("create");
        let mut assign = AlterUserRequest::new("clerk");
        assign.profile = Some("clerks".to_string());
        console.alter_user(assign).await.expect("assign");

        assert_eq!(
            console.profile_users("clerks").await.expect("read"),
            [principal("clerk")]
        );
        assert_eq!(
            console.profile_users("default").await.expect("read"),
            [principal("admin"), principal("hr")]
        );
        assert!(console.profile_users("missing").await.expect("read").is_empty());
    }

    #[tokio::test]
    async fn profile_reads_require_admin() {
        let catalog = catalog();
        let console = clerk(&catalog).await;
        assert_eq!(
            console.list_profiles().await.unwrap_err().kind(),
            ErrorKind::InsufficientPrivilege
        );
        assert_eq!(
            console.profile_limits("default").await.unwrap_err().kind(),
            ErrorKind::InsufficientPrivilege
        );
        assert_eq!(
            console.profile_users("default").await.unwrap_err().kind(),
            ErrorKind::InsufficientPrivilege
        );
        assert!(catalog.journal().is_empty());
    }

    #[tokio::test]
    async fn profile_operations_require_their_privileges() {
        let catalog = catalog();
        let console = clerk(&catalog).await;

        let err = console
            .create_profile(&ProfileRequest::new("clerks"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AdminError::InsufficientPrivilege { privilege: Some(ref p), .. } if p == "CREATE PROFILE"
        ));
        let err = console
            .alter_profile(&ProfileRequest::new("default"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AdminError::InsufficientPrivilege { privilege: Some(ref p), .. } if p == "ALTER PROFILE"
        ));
        let err = console.drop_profile("default").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientPrivilege);
    }
}
