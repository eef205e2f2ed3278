//! Gated privilege administration and privilege inspection.
//!
//! System privileges are reserved to admin-equivalent sessions. Table and
//! column privileges only require a session: whether the caller may pass a
//! table privilege on is the database's decision, reported back as
//! `InsufficientPrivilege`.

use crate::console::{Console, bounded};
use crate::error::AdminError;
use crate::gate::{Requirement, forbid_self};
use crate::resolver::{PrivilegeRecord, PrivilegeResolver};
use crate::validate;
use dbwarden_catalog::{Backend, ColumnGrant, ColumnGrantRequest, ObjectGrantRequest, TableRef};
use dbwarden_core::{ObjectName, ObjectPrivilege, PrivilegeGrantee, PrivilegeName};
use tracing::{info, instrument};

/// Input for [`Console::grant_object_privilege`] and
/// [`Console::revoke_object_privilege`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectGrantInput {
    pub grantee: String,
    /// One of `SELECT`, `INSERT`, `UPDATE`, `DELETE`.
    pub privilege: String,
    pub owner: String,
    pub table: String,
    /// Ignored on revoke.
    pub with_grant_option: bool,
}

/// Input for [`Console::grant_column_privilege`] and
/// [`Console::revoke_column_privilege`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnGrantInput {
    pub grantee: String,
    /// One of `SELECT`, `INSERT`.
    pub privilege: String,
    pub owner: String,
    pub table: String,
    /// Ignored on revoke.
    pub column: String,
    /// Ignored on revoke.
    pub with_grant_option: bool,
}

fn table_ref(owner: &str, table: &str) -> Result<TableRef, AdminError> {
    Ok(TableRef::new(
        validate::name::<ObjectName>("owner", owner)?,
        validate::name::<ObjectName>("table", table)?,
    ))
}

impl<B> Console<B>
where
    B: Backend + ?Sized,
{
    /// Grants a system privilege to a user or role.
    ///
    /// # Errors
    ///
    /// Requires an admin-equivalent session.
    #[instrument(skip_all, fields(grantee = %grantee, privilege = %privilege))]
    pub async fn grant_system_privilege(
        &self,
        grantee: &str,
        privilege: &str,
        with_admin_option: bool,
    ) -> Result<(), AdminError> {
        self.require(Requirement::AdminEquivalent)?;
        let grantee: PrivilegeGrantee = validate::name("grantee", grantee)?;
        let privilege: PrivilegeName = validate::name("privilege", privilege)?;

        let params = self.params();
        bounded(
            self.timeout(),
            "grant system privilege",
            self.backend
                .grant_system_privilege(&params, &grantee, &privilege, with_admin_option),
        )
        .await?;
        info!(grantee = %grantee, privilege = %privilege, with_admin_option, "system privilege granted");
        Ok(())
    }

    /// Revokes a system privilege from a user or role.
    ///
    /// # Errors
    ///
    /// Requires an admin-equivalent session. Returns
    /// `SelfOperationForbidden` when `grantee` is the caller.
    #[instrument(skip_all, fields(grantee = %grantee, privilege = %privilege))]
    pub async fn revoke_system_privilege(
        &self,
        grantee: &str,
        privilege: &str,
    ) -> Result<(), AdminError> {
        let session = self.require(Requirement::AdminEquivalent)?;
        forbid_self(session, "revoke system privileges from", grantee)?;
        let grantee: PrivilegeGrantee = validate::name("grantee", grantee)?;
        let privilege: PrivilegeName = validate::name("privilege", privilege)?;

        let params = self.params();
        bounded(
            self.timeout(),
            "revoke system privilege",
            self.backend
                .revoke_system_privilege(&params, &grantee, &privilege),
        )
        .await?;
        info!(grantee = %grantee, privilege = %privilege, "system privilege revoked");
        Ok(())
    }

    /// Grants a privilege on a whole table.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for a privilege outside the table
    /// allow-list, before anything reaches the database.
    #[instrument(skip_all, fields(grantee = %input.grantee, privilege = %input.privilege))]
    pub async fn grant_object_privilege(&self, input: &ObjectGrantInput) -> Result<(), AdminError> {
        self.require(Requirement::Authenticated)?;
        let request = ObjectGrantRequest {
            grantee: validate::name("grantee", &input.grantee)?,
            privilege: validate::table_privilege(&input.privilege)?,
            table: table_ref(&input.owner, &input.table)?,
            with_grant_option: input.with_grant_option,
        };

        let params = self.params();
        bounded(
            self.timeout(),
            "grant object privilege",
            self.backend.grant_object_privilege(&params, &request),
        )
        .await?;
        info!(
            grantee = %request.grantee,
            privilege = request.privilege.as_str(),
            table = %request.table,
            "object privilege granted"
        );
        Ok(())
    }

    /// Revokes a privilege on a whole table, including any column grants of
    /// the same privilege.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for a privilege outside the table
    /// allow-list.
    #[instrument(skip_all, fields(grantee = %input.grantee, privilege = %input.privilege))]
    pub async fn revoke_object_privilege(&self, input: &ObjectGrantInput) -> Result<(), AdminError> {
        self.require(Requirement::Authenticated)?;
        let privilege = validate::table_privilege(&input.privilege)?;
        self.revoke_table_privilege(&input.grantee, privilege, &input.owner, &input.table)
            .await
    }

    /// Grants a privilege on one column.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for a privilege outside the column
    /// allow-list.
    #[instrument(skip_all, fields(grantee = %input.grantee, privilege = %input.privilege))]
    pub async fn grant_column_privilege(&self, input: &ColumnGrantInput) -> Result<(), AdminError> {
        self.require(Requirement::Authenticated)?;
        let request = ColumnGrantRequest {
            grantee: validate::name("grantee", &input.grantee)?,
            privilege: validate::column_privilege(&input.privilege)?,
            table: table_ref(&input.owner, &input.table)?,
            column: validate::name("column", &input.column)?,
            with_grant_option: input.with_grant_option,
        };

        let params = self.params();
        bounded(
            self.timeout(),
            "grant column privilege",
            self.backend.grant_column_privilege(&params, &request),
        )
        .await?;
        info!(
            grantee = %request.grantee,
            privilege = request.privilege.as_str(),
            table = %request.table,
            column = %request.column,
            "column privilege granted"
        );
        Ok(())
    }

    /// Revokes a column privilege.
    ///
    /// Column grants cannot be revoked one column at a time, so this revokes
    /// the privilege on the whole table.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for a privilege outside the column
    /// allow-list.
    #[instrument(skip_all, fields(grantee = %input.grantee, privilege = %input.privilege))]
    pub async fn revoke_column_privilege(&self, input: &ColumnGrantInput) -> Result<(), AdminError> {
        self.require(Requirement::Authenticated)?;
        let privilege = validate::column_privilege(&input.privilege)?;
        self.revoke_table_privilege(&input.grantee, privilege, &input.owner, &input.table)
            .await
    }

    async fn revoke_table_privilege(
        &self,
        grantee: &str,
        privilege: ObjectPrivilege,
        owner: &str,
        table: &str,
    ) -> Result<(), AdminError> {
        let grantee: PrivilegeGrantee = validate::name("grantee", grantee)?;
        let table = table_ref(owner, table)?;

        let params = self.params();
        bounded(
            self.timeout(),
            "revoke object privilege",
            self.backend
                .revoke_object_privilege(&params, &grantee, privilege, &table),
        )
        .await?;
        info!(
            grantee = %grantee,
            privilege = privilege.as_str(),
            table = %table,
            "object privilege revoked"
        );
        Ok(())
    }

    /// Lists the effective privileges of a user or role.
    ///
    /// # Errors
    ///
    /// Requires a session.
    #[instrument(skip_all, fields(grantee = %grantee))]
    pub async fn effective_privileges(
        &self,
        grantee: &str,
    ) -> Result<Vec<PrivilegeRecord>, AdminError> {
        self.require(Requirement::Authenticated)?;
        let grantee: PrivilegeGrantee = validate::name("grantee", grantee)?;

        let params = self.params();
        PrivilegeResolver::new(&*self.backend, &params, self.timeout())
            .effective_privileges(&grantee)
            .await
    }

    /// Lists the column privileges granted directly to a user or role,
    /// ordered by table, column and privilege.
    ///
    /// # Errors
    ///
    /// Requires a session.
    #[instrument(skip_all, fields(grantee = %grantee))]
    pub async fn column_privileges(&self, grantee: &str) -> Result<Vec<ColumnGrant>, AdminError> {
        self.require(Requirement::Authenticated)?;
        let grantee: PrivilegeGrantee = validate::name("grantee", grantee)?;

        let params = self.params();
        let mut grants = bounded(
            self.timeout(),
            "read column privileges",
            self.backend.column_grants(&params, &grantee),
        )
        .await?;
        grants.sort_by(|a, b| {
            a.table
                .cmp(&b.table)
                .then_with(|| a.column.cmp(&b.column))
                .then_with(|| a.privilege.as_str().cmp(b.privilege.as_str()))
        });
        Ok(grants)
    }

    /// Returns true if a user or role holds a system privilege directly or
    /// through one of its roles. Unknown names resolve to `false`.
    ///
    /// # Errors
    ///
    /// Requires a session.
    #[instrument(skip_all, fields(grantee = %grantee, privilege = %privilege))]
    pub async fn check_system_privilege(
        &self,
        grantee: &str,
        privilege: &str,
    ) -> Result<bool, AdminError> {
        self.require(Requirement::Authenticated)?;
        let grantee: PrivilegeGrantee = validate::name("grantee", grantee)?;
        let privilege: PrivilegeName = validate::name("privilege", privilege)?;

        let params = self.params();
        PrivilegeResolver::new(&*self.backend, &params, self.timeout())
            .has_system_privilege(&grantee, &privilege)
            .await
    }
}
