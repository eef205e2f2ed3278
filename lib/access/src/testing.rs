//! Fixtures shared by the operation tests.

use crate::config::ConsoleConfig;
use crate::console::Console;
use dbwarden_catalog::{InMemoryCatalog, TableRef};
use dbwarden_core::{ObjectName, PrincipalName, PrivilegeGrantee, RoleName, SystemPrivilege};
use secrecy::SecretString;
use std::sync::Arc;

pub(crate) const DESCRIPTOR: &str = "//db.internal:1521/ORCLPDB1";
pub(crate) const ADMIN_PASSWORD: &str = "Admin#2024";
pub(crate) const CLERK_PASSWORD: &str = "Clerk#2024";
pub(crate) const HR_PASSWORD: &str = "Hr#Owner2024";

pub(crate) fn secret(value: &str) -> SecretString {
    SecretString::new(value.to_string())
}

pub(crate) fn principal(name: &str) -> PrincipalName {
    PrincipalName::parse(name).expect("valid principal")
}

pub(crate) fn grantee(name: &str) -> PrivilegeGrantee {
    PrivilegeGrantee::parse(name).expect("valid grantee")
}

pub(crate) fn role(name: &str) -> RoleName {
    RoleName::parse(name).expect("valid role")
}

pub(crate) fn employees() -> TableRef {
    TableRef::new(
        ObjectName::parse("HR").expect("valid owner"),
        ObjectName::parse("EMPLOYEES").expect("valid table"),
    )
}

/// A catalog holding:
/// - `ADMIN`, granted `DBA`
/// - `CLERK`, holding only `CREATE SESSION`
/// - `HR`, owner of `HR.EMPLOYEES`
/// - the role `REPORTING`
pub(crate) fn catalog() -> Arc<InMemoryCatalog> {
    let catalog = Arc::new(InMemoryCatalog::new(DESCRIPTOR));
    catalog.add_user(principal("admin"), ADMIN_PASSWORD);
    catalog.add_user(principal("clerk"), CLERK_PASSWORD);
    catalog.add_user(principal("hr"), HR_PASSWORD);
    catalog.add_role(role("dba"));
    catalog.add_role(role("reporting"));
    catalog.seed_role_grant(grantee("admin"), role("dba"));
    for user in ["admin", "clerk", "hr"] {
        catalog.seed_system_privilege(grantee(user), SystemPrivilege::CreateSession.into());
    }
    catalog.add_table(
        employees(),
        ["EMPLOYEE_ID", "NAME", "SALARY"]
            .into_iter()
            .map(|c| ObjectName::parse(c).expect("valid column"))
            .collect(),
    );
    catalog
}

/// Logs into `catalog` as `username`.
pub(crate) async fn console_as(
    catalog: &Arc<InMemoryCatalog>,
    username: &str,
    password: &str,
) -> Console<InMemoryCatalog> {
    let mut console = Console::new(Arc::clone(catalog), ConsoleConfig::new(DESCRIPTOR));
    console
        .login(username, secret(password))
        .await
        .expect("fixture login");
    catalog.clear_journal();
    console
}

pub(crate) async fn admin(catalog: &Arc<InMemoryCatalog>) -> Console<InMemoryCatalog> {
    console_as(catalog, "admin", ADMIN_PASSWORD).await
}

pub(crate) async fn clerk(catalog: &Arc<InMemoryCatalog>) -> Console<InMemoryCatalog> {
    console_as(catalog, "clerk", CLERK_PASSWORD).await
}

pub(crate) fn logged_out(catalog: &Arc<InMemoryCatalog>) -> Console<InMemoryCatalog> {
    Console::new(Arc::clone(catalog), ConsoleConfig::new(DESCRIPTOR))
}
