//! The per-operator console context.
//!
//! A [`Console`] owns one operator's credential store and session and shares
//! the backend with every other console in the process. Operations that
//! change the session take `&mut self`; gated administration takes `&self`.

use crate::config::ConsoleConfig;
use crate::credential::CredentialStore;
use crate::error::AdminError;
use crate::session::Session;
use crate::translate::translate;
use dbwarden_catalog::{Backend, ConnectionParams, NativeError};
use dbwarden_core::{PrincipalName, PrivilegeName};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Runs one backend call under `limit`, translating its failure.
///
/// A call that outlives the limit is dropped and reported as
/// [`AdminError::Unknown`] without a code.
pub(crate) async fn bounded<T, F>(limit: Duration, what: &str, call: F) -> Result<T, AdminError>
where
    F: Future<Output = Result<T, NativeError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(native)) => {
            debug!(code = native.code(), what, "backend call failed");
            Err(translate(&native))
        }
        Err(_) => {
            debug!(what, ?limit, "backend call timed out");
            Err(AdminError::Unknown {
                code: None,
                message: format!("{what} timed out after {}s", limit.as_secs()),
            })
        }
    }
}

/// Result of an operation with a best-effort secondary write.
///
/// The primary change succeeded; `warnings` lists secondary steps that
/// failed and were not rolled back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    pub warnings: Vec<String>,
}

impl Outcome {
    /// Returns true if every step succeeded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// One operator's view of the database.
pub struct Console<B: ?Sized> {
    pub(crate) backend: Arc<B>,
    pub(crate) config: ConsoleConfig,
    pub(crate) credentials: CredentialStore,
    pub(crate) session: Option<Session>,
}

impl<B> Console<B>
where
    B: Backend + ?Sized,
{
    /// Creates a logged-out console.
    #[must_use]
    pub fn new(backend: Arc<B>, config: ConsoleConfig) -> Self {
        let credentials = CredentialStore::new(config.connect_descriptor.clone());
        Self {
            backend,
            config,
            credentials,
            session: None,
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    /// Returns the current session.
    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Returns true if an operator is logged in.
    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.session.is_some()
    }

    /// Returns the logged-in principal.
    #[must_use]
    pub fn current_principal(&self) -> Option<&PrincipalName> {
        self.credentials.current_principal()
    }

    /// Returns the admin flag cached at login; `false` when logged out.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.session.as_ref().is_some_and(Session::is_admin)
    }

    /// Returns true if the session may exercise `privilege`.
    ///
    /// Admin-equivalent sessions hold every privilege. Otherwise the cached
    /// snapshot decides. Logged-out consoles and unparseable names hold
    /// nothing.
    #[must_use]
    pub fn has_privilege(&self, privilege: &str) -> bool {
        let Ok(privilege) = PrivilegeName::parse(privilege) else {
            return false;
        };
        self.session
            .as_ref()
            .is_some_and(|session| session.permits(&privilege))
    }

    pub(crate) fn params(&self) -> ConnectionParams {
        self.credentials.build_connection_params(None)
    }

    pub(crate) fn timeout(&self) -> Duration {
        self.config.operation_timeout()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use dbwarden_catalog::InMemoryCatalog;

    #[tokio::test]
    async fn bounded_translates_native_failures() {
        let result: Result<(), _> = bounded(Duration::from_secs(1), "probe", async {
            Err(NativeError::new(1031, "insufficient privileges"))
        })
        .await;
        assert_eq!(
            result.unwrap_err().kind(),
            ErrorKind::InsufficientPrivilege
        );
    }

    #[tokio::test(start_paused = true)]
    async fn bounded_reports_timeouts_without_code() {
        let result: Result<(), _> = bounded(Duration::from_secs(2), "slow read", async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(())
        })
        .await;
        let err = result.unwrap_err();
        assert!(matches!(err, AdminError::Unknown { code: None, .. }));
        assert!(err.to_string().contains("slow read timed out"));
    }

    #[test]
    fn new_console_is_logged_out() {
        let catalog = Arc::new(InMemoryCatalog::new("//db:1521/ORCL"));
        let console = Console::new(catalog, ConsoleConfig::new("//db:1521/ORCL"));
        assert!(!console.is_logged_in());
        assert!(!console.is_admin());
        assert!(!console.has_privilege("CREATE SESSION"));
        assert!(console.current_principal().is_none());
        assert!(console.params().principal().is_none());
    }

    #[test]
    fn outcome_is_clean_without_warnings() {
        assert!(Outcome::default().is_clean());
        let outcome = Outcome {
            warnings: vec!["user info not saved".to_string()],
        };
        assert!(!outcome.is_clean());
    }
}
