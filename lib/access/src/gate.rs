//! The authorization gate.
//!
//! Every administrative operation passes through here before touching the
//! backend. Checks run in a fixed order: session, privilege, self-targeting.
//! Input validation follows in the operation itself. A refusal from the gate
//! never reaches the database.

use crate::console::Console;
use crate::error::AdminError;
use crate::session::Session;
use dbwarden_catalog::Backend;
use dbwarden_core::{PrivilegeName, SystemPrivilege};
use std::fmt;
use tracing::debug;

/// What an operation demands of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// Any logged-in principal.
    Authenticated,
    /// A named system privilege. Admin-equivalent sessions always pass.
    SystemPrivilege(SystemPrivilege),
    /// An admin-equivalent session.
    AdminEquivalent,
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authenticated => f.write_str("a logged-in session"),
            Self::SystemPrivilege(privilege) => f.write_str(privilege.as_str()),
            Self::AdminEquivalent => f.write_str("DBA or CREATE/ALTER/DROP USER"),
        }
    }
}

impl<B> Console<B>
where
    B: Backend + ?Sized,
{
    /// Checks `requirement` against the cached session.
    pub(crate) fn require(&self, requirement: Requirement) -> Result<&Session, AdminError> {
        let session = self.session.as_ref().ok_or_else(AdminError::not_logged_in)?;

        let allowed = match requirement {
            Requirement::Authenticated => true,
            Requirement::SystemPrivilege(privilege) => {
                session.permits(&PrivilegeName::from(privilege))
            }
            Requirement::AdminEquivalent => session.is_admin(),
        };
        if !allowed {
            debug!(principal = %session.principal(), %requirement, "gate refused");
            return Err(AdminError::InsufficientPrivilege {
                privilege: Some(requirement.to_string()),
                reason: format!("{} does not hold {requirement}", session.principal()),
            });
        }
        Ok(session)
    }
}

/// Refuses operations whose target is the session's own principal.
///
/// The comparison uses the same canonical form as every other identifier, so
/// `alice`, `ALICE` and ` Alice ` all name the same account.
pub(crate) fn forbid_self(
    session: &Session,
    operation: &str,
    target: &str,
) -> Result<(), AdminError> {
    if session.principal().matches(target) {
        debug!(principal = %session.principal(), operation, "self-targeted operation refused");
        return Err(AdminError::SelfOperationForbidden {
            operation: operation.to_string(),
            principal: Some(session.principal().to_string()),
        });
    }
    Ok(())
}
