//! Gated role administration.

use crate::console::{Console, bounded};
use crate::error::AdminError;
use crate::gate::Requirement;
use crate::validate;
use dbwarden_catalog::{Backend, RoleGrant, RoleSummary};
use dbwarden_core::{PrivilegeGrantee, RoleName, SystemPrivilege};
use secrecy::SecretString;
use tracing::{info, instrument};

impl<B> Console<B>
where
    B: Backend + ?Sized,
{
    /// Creates a role, optionally protected by a password.
    ///
    /// # Errors
    ///
    /// Requires `CREATE ROLE`. A given password must not be empty.
    #[instrument(skip_all, fields(role = %role, protected = password.is_some()))]
    pub async fn create_role(
        &self,
        role: &str,
        password: Option<SecretString>,
    ) -> Result<(), AdminError> {
        self.require(Requirement::SystemPrivilege(SystemPrivilege::CreateRole))?;
        let role: RoleName = validate::name("role", role)?;
        if let Some(password) = &password {
            validate::secret_present("role password", password)?;
        }

        let params = self.params();
        bounded(
            self.timeout(),
            "create role",
            self.backend.create_role(&params, &role, password.as_ref()),
        )
        .await?;
        info!(role = %role, "role created");
        Ok(())
    }

    /// Sets or replaces a role's password.
    ///
    /// # Errors
    ///
    /// Requires `ALTER ANY ROLE`. The password must not be empty.
    #[instrument(skip_all, fields(role = %role))]
    pub async fn change_role_password(
        &self,
        role: &str,
        password: SecretString,
    ) -> Result<(), AdminError> {
        self.require(Requirement::SystemPrivilege(SystemPrivilege::AlterAnyRole))?;
        let role: RoleName = validate::name("role", role)?;
        validate::secret_present("role password", &password)?;

        let params = self.params();
        bounded(
            self.timeout(),
            "change role password",
            self.backend.change_role_password(&params, &role, &password),
        )
        .await?;
        info!(role = %role, "role password changed");
        Ok(())
    }

    /// Makes a role usable without a password.
    ///
    /// # Errors
    ///
    /// Requires `ALTER ANY ROLE`.
    #[instrument(skip_all, fields(role = %role))]
    pub async fn remove_role_password(&self, role: &str) -> Result<(), AdminError> {
        self.require(Requirement::SystemPrivilege(SystemPrivilege::AlterAnyRole))?;
        let role: RoleName = validate::name("role", role)?;

        let params = self.params();
        bounded(
            self.timeout(),
            "remove role password",
            self.backend.remove_role_password(&params, &role),
        )
        .await?;
        info!(role = %role, "role password removed");
        Ok(())
    }

    /// Drops a role, revoking it from every grantee.
    ///
    /// # Errors
    ///
    /// Requires `DROP ANY ROLE`.
    #[instrument(skip_all, fields(role = %role))]
    pub async fn drop_role(&self, role: &str) -> Result<(), AdminError> {
        self.require(Requirement::SystemPrivilege(SystemPrivilege::DropAnyRole))?;
        let role: RoleName = validate::name("role", role)?;

        let params = self.params();
        bounded(
            self.timeout(),
            "drop role",
            self.backend.drop_role(&params, &role),
        )
        .await?;
        info!(role = %role, "role dropped");
        Ok(())
    }

    /// Grants `role` to a user or another role.
    ///
    /// # Errors
    ///
    /// Requires `GRANT ANY ROLE`.
    #[instrument(skip_all, fields(role = %role, grantee = %grantee))]
    pub async fn grant_role(
        &self,
        role: &str,
        grantee: &str,
        with_admin_option: bool,
    ) -> Result<(), AdminError> {
        self.require(Requirement::SystemPrivilege(SystemPrivilege::GrantAnyRole))?;
        let role: RoleName = validate::name("role", role)?;
        let grantee: PrivilegeGrantee = validate::name("grantee", grantee)?;

        let params = self.params();
        bounded(
            self.timeout(),
            "grant role",
            self.backend
                .grant_role(&params, &role, &grantee, with_admin_option),
        )
        .await?;
        info!(role = %role, grantee = %grantee, with_admin_option, "role granted");
        Ok(())
    }

    /// Revokes `role` from a user or another role.
    ///
    /// # Errors
    ///
    /// Requires `GRANT ANY ROLE`.
    #[instrument(skip_all, fields(role = %role, grantee = %grantee))]
    pub async fn revoke_role(&self, role: &str, grantee: &str) -> Result<(), AdminError> {
        self.require(Requirement::SystemPrivilege(SystemPrivilege::GrantAnyRole))?;
        let role: RoleName = validate::name("role", role)?;
        let grantee: PrivilegeGrantee = validate::name("grantee", grantee)?;

        let params = self.params();
        bounded(
            self.timeout(),
            "revoke role",
            self.backend.revoke_role(&params, &role, &grantee),
        )
        .await?;
        info!(role = %role, grantee = %grantee, "role revoked");
        Ok(())
    }

    /// Lists every role, ordered by name.
    ///
    /// # Errors
    ///
    /// Requires an admin-equivalent session.
    #[instrument(skip_all)]
    pub async fn list_roles(&self) -> Result<Vec<RoleSummary>, AdminError> {
        self.require(Requirement::AdminEquivalent)?;

        let params = self.params();
        let mut roles = bounded(
            self.timeout(),
            "list roles",
            self.backend.list_roles(&params),
        )
        .await?;
        roles.sort_by(|a, b| a.role.cmp(&b.role));
        Ok(roles)
    }

    /// Lists the users and roles holding `role` directly, ordered by
    /// grantee. An unknown role has no grantees.
    ///
    /// # Errors
    ///
    /// Requires an admin-equivalent session.
    #[instrument(skip_all, fields(role = %role))]
    pub async fn role_grantees(&self, role: &str) -> Result<Vec<RoleGrant>, AdminError> {
        self.require(Requirement::AdminEquivalent)?;
        let role: RoleName = validate::name("role", role)?;

        let params = self.params();
        let mut grants = bounded(
            self.timeout(),
            "read role grantees",
            self.backend.role_grantees(&params, &role),
        )
        .await?;
        grants.sort_by(|a, b| a.grantee.cmp(&b.grantee));
        Ok(grants)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::testing::{admin, catalog, clerk, console_as, grantee, logged_out, role, secret};

    #[tokio::test]
    async fn create_role_with_and_without_password() {
        let catalog = catalog();
        let console = admin(&catalog).await;

        console.create_role("auditors", None).await.expect("create");
        console
            .create_role("payroll", Some(secret("Payroll#1")))
            .await
            .expect("create protected");
        assert_eq!(catalog.role_has_password(&role("auditors")), Some(false));
        assert_eq!(catalog.role_has_password(&role("PAYROLL")), Some(true));
    }

    #[tokio::test]
    async fn empty_role_password_is_rejected() {
        let catalog = catalog();
        let console = admin(&catalog).await;

        let err = console
            .create_role("payroll", Some(secret("")))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationError);
        let err = console
            .change_role_password("reporting", secret("  "))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationError);
        assert!(!catalog.saw_writes());
    }

    #[tokio::test]
    async fn role_name_conflicting_with_user_already_exists() {
        let catalog = catalog();
        let console = admin(&catalog).await;
        let err = console.create_role("clerk", None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
    }

    #[tokio::test]
    async fn role_password_lifecycle() {
        let catalog = catalog();
        let console = admin(&catalog).await;

        console
            .change_role_password("reporting", secret("Report#1"))
            .await
            .expect("set");
        assert_eq!(catalog.role_has_password(&role("reporting")), Some(true));
        console
            .remove_role_password("reporting")
            .await
            .expect("remove");
        assert_eq!(catalog.role_has_password(&role("reporting")), Some(false));

        let err = console.remove_role_password("ghost").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DoesNotExist);
    }

    #[tokio::test]
    async fn role_operations_require_their_privileges() {
        let catalog = catalog();
        let console = clerk(&catalog).await;

        let cases = [
            (
                console.create_role("auditors", None).await,
                "CREATE ROLE",
            ),
            (
                console.change_role_password("reporting", secret("Report#1")).await,
                "ALTER ANY ROLE",
            ),
            (console.remove_role_password("reporting").await, "ALTER ANY ROLE"),
            (console.drop_role("reporting").await, "DROP ANY ROLE"),
            (
                console.grant_role("reporting", "hr", false).await,
                "GRANT ANY ROLE",
            ),
            (console.revoke_role("reporting", "hr").await, "GRANT ANY ROLE"),
        ];
        for (result, expected) in cases {
            assert!(
                matches!(
                    result,
                    Err(AdminError::InsufficientPrivilege { privilege: Some(ref p), .. }) if p == expected
                ),
                "expected {expected} to be required"
            );
        }
        assert!(catalog.journal().is_empty());
    }

    #[tokio::test]
    async fn narrowly_privileged_operator_may_create_roles() {
        let catalog = catalog();
        catalog.seed_system_privilege(grantee("clerk"), SystemPrivilege::CreateRole.into());
        let console = clerk(&catalog).await;

        assert!(!console.is_admin());
        console.create_role("auditors", None).await.expect("create");
        assert_eq!(
            console.drop_role("auditors").await.unwrap_err().kind(),
            ErrorKind::InsufficientPrivilege
        );
    }

    #[tokio::test]
    async fn granted_role_privileges_reach_the_grantee() {
        let catalog = catalog();
        let console = admin(&catalog).await;
        console.create_role("user_admins", None).await.expect("create");
        console
            .grant_system_privilege("user_admins", "create user", false)
            .await
            .expect("grant to role");
        console
            .grant_role("user_admins", "clerk", false)
            .await
            .expect("grant role");

        let clerk = console_as(&catalog, "clerk", crate::testing::CLERK_PASSWORD).await;
        assert!(clerk.is_admin());

        console
            .revoke_role("USER_ADMINS", "Clerk")
            .await
            .expect("revoke role");
        // ORA-01951 has no domain meaning; it surfaces with its code intact.
        let err = console.revoke_role("user_admins", "clerk").await.unwrap_err();
        assert!(matches!(err, AdminError::Unknown { code: Some(1951), .. }));
    }

    #[tokio::test]
    async fn circular_role_grant_is_reported_as_unknown() {
        let catalog = catalog();
        let console = admin(&catalog).await;
        let err = console
            .grant_role("reporting", "reporting", false)
            .await
            .unwrap_err();
        assert!(matches!(err, AdminError::Unknown { code: Some(1934), .. }));
    }

    #[tokio::test]
    async fn dropping_a_role_removes_it() {
        let catalog = catalog();
        let console = admin(&catalog).await;
        console.drop_role("reporting").await.expect("drop");
        assert_eq!(catalog.role_has_password(&role("reporting")), None);
        assert_eq!(
            console.drop_role("reporting").await.unwrap_err().kind(),
            ErrorKind::DoesNotExist
        );
    }

    #[tokio::test]
    async fn list_roles_reports_password_protection() {
        let catalog = catalog();
        let console = admin(&catalog).await;
        console
            .create_role("payroll", Some(secret("Payroll#1")))
            .await
            .expect("create");

        let roles: Vec<(String, bool)> = console
            .list_roles()
            .await
            .expect("list")
            .into_iter()
            .map(|r| (r.role.to_string(), r.password_required))
            .collect();
        assert_eq!(
            roles,
            [
                ("DBA".to_string(), false),
                ("PAYROLL".to_string(), true),
                ("REPORTING".to_string(), false),
            ]
        );
    }

    #[tokio::test]
    async fn role_grantees_lists_direct_holders() {
        let catalog = catalog();
        let console = admin(&catalog).await;
        console
            .grant_role("reporting", "hr", true)
            .await
            .expect("grant");
        console
            .grant_role("reporting", "clerk", false)
            .await
            .expect("grant");
        catalog.clear_journal();

        let grants = console.role_grantees(" Reporting ").await.expect("read");
        let holders: Vec<(&str, bool)> = grants
            .iter()
            .map(|g| (g.grantee.as_str(), g.admin_option))
            .collect();
        assert_eq!(holders, [("CLERK", false), ("HR", true)]);
        assert!(console.role_grantees("nobody").await.expect("read").is_empty());
        assert!(!catalog.saw_writes());

        assert_eq!(
            console.role_grantees("").await.unwrap_err().kind(),
            ErrorKind::ValidationError
        );
    }

    #[tokio::test]
    async fn role_reads_require_admin() {
        let catalog = catalog();
        let console = clerk(&catalog).await;
        assert_eq!(
            console.list_roles().await.unwrap_err().kind(),
            ErrorKind::InsufficientPrivilege
        );
        assert_eq!(
            console.role_grantees("reporting").await.unwrap_err().kind(),
            ErrorKind::InsufficientPrivilege
        );
        assert!(catalog.journal().is_empty());
    }

    #[tokio::test]
    async fn logged_out_role_operations_are_unauthenticated() {
        let catalog = catalog();
        let console = logged_out(&catalog);
        assert_eq!(
            console.create_role("auditors", None).await.unwrap_err().kind(),
            ErrorKind::Unauthenticated
        );
    }
}
