//! Authentication and session lifecycle.
//!
//! Login proves identity by opening a live connection with the supplied
//! credentials; the database is the only password store. All fallible work
//! happens before any state is touched, so a failed login leaves an existing
//! session exactly as it was.

use crate::console::{Console, bounded};
use crate::error::{AdminError, ErrorKind};
use crate::resolver::PrivilegeResolver;
use crate::session::Session;
use crate::validate;
use dbwarden_catalog::Backend;
use dbwarden_core::{PrincipalName, PrivilegeGrantee};
use secrecy::SecretString;
use tracing::{info, instrument, warn};

impl<B> Console<B>
where
    B: Backend + ?Sized,
{
    /// Authenticates as `username` and opens a session.
    ///
    /// If privileges cannot be read after authenticating, the session is
    /// still opened but holds no privileges and is not admin.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for a blank username or password and
    /// `Unauthenticated` if the database refuses the credentials. The
    /// console's state is unchanged on error.
    #[instrument(skip_all, fields(username = %username))]
    pub async fn login(&mut self, username: &str, password: SecretString) -> Result<(), AdminError> {
        let principal: PrincipalName = validate::name("username", username)?;
        validate::secret_present("password", &password)?;

        let probe = self
            .credentials
            .build_connection_params(Some((&principal, &password)));
        match tokio::time::timeout(self.timeout(), self.backend.authenticate(&probe)).await {
            Ok(Ok(())) => {}
            Ok(Err(native)) => {
                info!(code = native.code(), "login refused");
                return Err(AdminError::Unauthenticated {
                    reason: native.to_string(),
                });
            }
            Err(_) => {
                info!("login timed out");
                return Err(AdminError::Unauthenticated {
                    reason: "the database did not answer in time".to_string(),
                });
            }
        }

        let resolver = PrivilegeResolver::new(&*self.backend, &probe, self.timeout());
        let session = match resolver
            .load_snapshot(&PrivilegeGrantee::from(&principal))
            .await
        {
            Ok(snapshot) => Session::new(principal.clone(), snapshot),
            Err(error) => {
                warn!(%error, "privilege pre-load failed; session opened without privileges");
                Session::unprivileged(principal.clone())
            }
        };

        info!(is_admin = session.is_admin(), "login succeeded");
        self.credentials.set(principal, password);
        self.session = Some(session);
        Ok(())
    }

    /// Ends the session and forgets the credentials. Calling it while logged
    /// out does nothing.
    pub fn logout(&mut self) {
        if let Some(session) = self.session.take() {
            info!(principal = %session.principal(), "logged out");
        }
        self.credentials.clear();
    }

    /// Changes the logged-in principal's own password.
    ///
    /// The current password is re-verified against the database first. The
    /// stored credential is only updated once the change has been applied.
    ///
    /// # Errors
    ///
    /// Returns `Unauthenticated` when logged out, `ValidationError` if the
    /// new password breaks the password policy, and `PolicyViolation` if the
    /// current password is wrong.
    #[instrument(skip_all)]
    pub async fn change_own_password(
        &mut self,
        current: SecretString,
        new: SecretString,
    ) -> Result<(), AdminError> {
        let principal = self
            .session
            .as_ref()
            .map(|s| s.principal().clone())
            .ok_or_else(AdminError::not_logged_in)?;
        validate::password(&self.config.password_policy, "new password", &new)?;

        let params = self
            .credentials
            .build_connection_params(Some((&principal, &current)));
        match bounded(
            self.timeout(),
            "verify current password",
            self.backend.authenticate(&params),
        )
        .await
        {
            Ok(()) => {}
            Err(error) if error.kind() == ErrorKind::Unauthenticated => {
                info!(principal = %principal, "current password rejected");
                return Err(AdminError::PolicyViolation {
                    reason: "the current password is incorrect".to_string(),
                });
            }
            Err(error) => return Err(error),
        }

        bounded(
            self.timeout(),
            "change password",
            self.backend.change_own_password(&params, &current, &new),
        )
        .await?;

        self.credentials.replace_secret(new);
        info!(principal = %principal, "password changed");
        Ok(())
    }

    /// Re-reads the session's privileges and recomputes the admin flag.
    ///
    /// # Errors
    ///
    /// Returns `Unauthenticated` when logged out, or the translated failure
    /// if privileges cannot be read. The previous snapshot is kept on error.
    #[instrument(skip_all)]
    pub async fn refresh_privileges(&mut self) -> Result<(), AdminError> {
        let principal = self
            .session
            .as_ref()
            .map(|s| s.principal().clone())
            .ok_or_else(AdminError::not_logged_in)?;

        let params = self.params();
        let resolver = PrivilegeResolver::new(&*self.backend, &params, self.timeout());
        let snapshot = resolver
            .load_snapshot(&PrivilegeGrantee::from(&principal))
            .await?;

        if let Some(session) = self.session.as_mut() {
            session.refresh(snapshot);
            info!(principal = %principal, is_admin = session.is_admin(), "privileges refreshed");
        }
        Ok(())
    }
}
