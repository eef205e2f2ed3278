//! Privilege resolution.
//!
//! A principal's effective system privileges are its direct grants plus the
//! system privileges of roles granted directly to it. Roles granted to those
//! roles are not followed: resolution stops after one level.

use crate::console::bounded;
use crate::error::AdminError;
use dbwarden_catalog::{CatalogReader, ConnectionParams};
use dbwarden_core::{
    ADMIN_EQUIVALENT_PRIVILEGES, ADMIN_ROLE, PrivilegeGrantee, PrivilegeName, RoleName,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;
use tracing::{debug, instrument};

/// A principal's grants as read at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivilegeSnapshot {
    direct: BTreeSet<PrivilegeName>,
    roles: BTreeSet<RoleName>,
    role_privileges: BTreeMap<RoleName, BTreeSet<PrivilegeName>>,
}

impl PrivilegeSnapshot {
    /// Creates a snapshot from already-read grants.
    ///
    /// `role_privileges` entries for roles not in `roles` are ignored.
    #[must_use]
    pub fn new(
        direct: impl IntoIterator<Item = PrivilegeName>,
        roles: impl IntoIterator<Item = RoleName>,
        role_privileges: BTreeMap<RoleName, BTreeSet<PrivilegeName>>,
    ) -> Self {
        let roles: BTreeSet<_> = roles.into_iter().collect();
        let role_privileges = role_privileges
            .into_iter()
            .filter(|(role, _)| roles.contains(role))
            .collect();
        Self {
            direct: direct.into_iter().collect(),
            roles,
            role_privileges,
        }
    }

    /// System privileges granted directly.
    #[must_use]
    pub fn direct_privileges(&self) -> &BTreeSet<PrivilegeName> {
        &self.direct
    }

    /// Roles granted directly.
    #[must_use]
    pub fn roles(&self) -> &BTreeSet<RoleName> {
        &self.roles
    }

    /// Returns true if the privilege is held directly or through one role.
    #[must_use]
    pub fn holds_system(&self, privilege: &PrivilegeName) -> bool {
        self.direct.contains(privilege)
            || self
                .role_privileges
                .values()
                .any(|privileges| privileges.contains(privilege))
    }

    /// Returns true if the role is granted directly.
    #[must_use]
    pub fn holds_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r.as_str() == role)
    }

    /// The admin-equivalence rule: the `DBA` role, or any of `CREATE USER`,
    /// `ALTER USER`, `DROP USER` directly or through one role.
    #[must_use]
    pub fn is_admin_equivalent(&self) -> bool {
        self.holds_role(ADMIN_ROLE)
            || ADMIN_EQUIVALENT_PRIVILEGES
                .into_iter()
                .any(|p| self.holds_system(&PrivilegeName::from(p)))
    }
}

/// Whether a record is a system or object privilege.
///
/// Object privileges sort first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PrivilegeKind {
    Object,
    System,
}

/// How a principal came to hold a privilege. Direct grants sort first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PrivilegeOrigin {
    Direct,
    Role,
}

/// One line of a principal's effective privileges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivilegeRecord {
    /// Privilege name; object privileges read `SELECT ON HR.EMPLOYEES`.
    pub name: String,
    pub kind: PrivilegeKind,
    pub origin: PrivilegeOrigin,
    /// The granting role when `origin` is `Role`.
    pub origin_role: Option<RoleName>,
    /// Admin option for system privileges, grant option for object ones.
    pub admin_option: bool,
}

impl PrivilegeRecord {
    fn sort_key(&self) -> (PrivilegeKind, PrivilegeOrigin, &str, Option<&RoleName>) {
        (
            self.kind,
            self.origin,
            self.name.as_str(),
            self.origin_role.as_ref(),
        )
    }
}

/// Reads grants for one principal through a [`CatalogReader`].
pub struct PrivilegeResolver<'a, R: ?Sized> {
    reader: &'a R,
    params: &'a ConnectionParams,
    timeout: Duration,
}

impl<'a, R> PrivilegeResolver<'a, R>
where
    R: CatalogReader + ?Sized,
{
    /// Creates a resolver that reads with `params`, bounding every call by
    /// `timeout`.
    #[must_use]
    pub fn new(reader: &'a R, params: &'a ConnectionParams, timeout: Duration) -> Self {
        Self {
            reader,
            params,
            timeout,
        }
    }

    /// Returns true if `grantee` holds `privilege` directly or through a
    /// directly granted role. Unknown grantees and privileges resolve to
    /// `false`.
    ///
    /// # Errors
    ///
    /// Returns the translated failure if the dictionary cannot be read.
    #[instrument(skip_all, fields(grantee = %grantee, privilege = %privilege))]
    pub async fn has_system_privilege(
        &self,
        grantee: &PrivilegeGrantee,
        privilege: &PrivilegeName,
    ) -> Result<bool, AdminError> {
        let direct = bounded(
            self.timeout,
            "read system privileges",
            self.reader.system_privileges(self.params, grantee),
        )
        .await?;
        if direct.iter().any(|g| g.privilege == *privilege) {
            debug!("held directly");
            return Ok(true);
        }

        let roles = bounded(
            self.timeout,
            "read role grants",
            self.reader.role_grants(self.params, grantee),
        )
        .await?;
        for grant in roles {
            let via_role = bounded(
                self.timeout,
                "read role privileges",
                self.reader
                    .system_privileges(self.params, &PrivilegeGrantee::from(&grant.role)),
            )
            .await?;
            if via_role.iter().any(|g| g.privilege == *privilege) {
                debug!(role = %grant.role, "held through role");
                return Ok(true);
            }
        }

        Ok(false)
    }

    /// Reads everything the session caches about `grantee`.
    ///
    /// # Errors
    ///
    /// Returns the translated failure of the first read that fails.
    #[instrument(skip_all, fields(grantee = %grantee))]
    pub async fn load_snapshot(
        &self,
        grantee: &PrivilegeGrantee,
    ) -> Result<PrivilegeSnapshot, AdminError> {
        let direct = bounded(
            self.timeout,
            "read system privileges",
            self.reader.system_privileges(self.params, grantee),
        )
        .await?;
        let roles = bounded(
            self.timeout,
            "read role grants",
            self.reader.role_grants(self.params, grantee),
        )
        .await?;

        let mut role_privileges = BTreeMap::new();
        for grant in &roles {
            let privileges = bounded(
                self.timeout,
                "read role privileges",
                self.reader
                    .system_privileges(self.params, &PrivilegeGrantee::from(&grant.role)),
            )
            .await?;
            role_privileges.insert(
                grant.role.clone(),
                privileges.into_iter().map(|g| g.privilege).collect(),
            );
        }

        let snapshot = PrivilegeSnapshot::new(
            direct.into_iter().map(|g| g.privilege),
            roles.into_iter().map(|g| g.role),
            role_privileges,
        );
        debug!(
            direct = snapshot.direct_privileges().len(),
            roles = snapshot.roles().len(),
            "privilege snapshot loaded"
        );
        Ok(snapshot)
    }

    /// Lists direct system privileges, system privileges inherited through
    /// directly granted roles, and direct table privileges.
    ///
    /// Records are ordered by kind (object first), then origin (direct
    /// first), then name.
    ///
    /// # Errors
    ///
    /// Returns the translated failure of the first read that fails.
    #[instrument(skip_all, fields(grantee = %grantee))]
    pub async fn effective_privileges(
        &self,
        grantee: &PrivilegeGrantee,
    ) -> Result<Vec<PrivilegeRecord>, AdminError> {
        let mut records = Vec::new();

        let direct = bounded(
            self.timeout,
            "read system privileges",
            self.reader.system_privileges(self.params, grantee),
        )
        .await?;
        records.extend(direct.into_iter().map(|g| PrivilegeRecord {
            name: g.privilege.to_string(),
            kind: PrivilegeKind::System,
            origin: PrivilegeOrigin::Direct,
            origin_role: None,
            admin_option: g.admin_option,
        }));

        let roles = bounded(
            self.timeout,
            "read role grants",
            self.reader.role_grants(self.params, grantee),
        )
        .await?;
        for grant in roles {
            let inherited = bounded(
                self.timeout,
                "read role privileges",
                self.reader
                    .system_privileges(self.params, &PrivilegeGrantee::from(&grant.role)),
            )
            .await?;
            records.extend(inherited.into_iter().map(|g| PrivilegeRecord {
                name: g.privilege.to_string(),
                kind: PrivilegeKind::System,
                origin: PrivilegeOrigin::Role,
                origin_role: Some(grant.role.clone()),
                admin_option: g.admin_option,
            }));
        }

        let objects = bounded(
            self.timeout,
            "read object grants",
            self.reader.object_grants(self.params, grantee),
        )
        .await?;
        records.extend(objects.into_iter().map(|g| PrivilegeRecord {
            name: format!("{} ON {}", g.privilege, g.table),
            kind: PrivilegeKind::Object,
            origin: PrivilegeOrigin::Direct,
            origin_role: None,
            admin_option: g.grantable,
        }));

        records.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        Ok(records)
    }
}
