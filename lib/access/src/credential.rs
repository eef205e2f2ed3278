//! Credential store for the current operator.
//!
//! Holds at most one identity. Secrets never leave memory and are zeroized
//! when replaced or cleared. The store knows nothing about privileges.

use dbwarden_catalog::ConnectionParams;
use dbwarden_core::PrincipalName;
use secrecy::SecretString;

/// Where to connect, and as whom once logged in.
#[derive(Debug)]
pub struct CredentialStore {
    descriptor: String,
    current: Option<(PrincipalName, SecretString)>,
}

impl CredentialStore {
    /// Creates an empty store for the database at `descriptor`.
    #[must_use]
    pub fn new(descriptor: impl Into<String>) -> Self {
        Self {
            descriptor: descriptor.into(),
            current: None,
        }
    }

    /// Stores the operator's identity, replacing any previous one.
    pub fn set(&mut self, principal: PrincipalName, secret: SecretString) {
        self.current = Some((principal, secret));
    }

    /// Forgets the stored identity.
    pub fn clear(&mut self) {
        self.current = None;
    }

    /// Replaces the stored secret, keeping the principal.
    ///
    /// Does nothing when no identity is stored.
    pub fn replace_secret(&mut self, secret: SecretString) {
        if let Some((_, stored)) = self.current.as_mut() {
            *stored = secret;
        }
    }

    /// Returns the stored principal.
    #[must_use]
    pub fn current_principal(&self) -> Option<&PrincipalName> {
        self.current.as_ref().map(|(principal, _)| principal)
    }

    /// Builds parameters for the next backend call.
    ///
    /// Explicit credentials are used as given and leave the store untouched;
    /// otherwise the stored identity is used, or none at all when logged out.
    #[must_use]
    pub fn build_connection_params(
        &self,
        explicit: Option<(&PrincipalName, &SecretString)>,
    ) -> ConnectionParams {
        let identity = explicit.or_else(|| {
            self.current
                .as_ref()
                .map(|(principal, secret)| (principal, secret))
        });
        match identity {
            Some((principal, secret)) => {
                ConnectionParams::authenticated(&self.descriptor, principal.clone(), secret)
            }
            None => ConnectionParams::anonymous(&self.descriptor),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    const DESCRIPTOR: &str = "//db.internal:1521/ORCLPDB1";

    fn principal(name: &str) -> PrincipalName {
        PrincipalName::parse(name).expect("valid principal")
    }

    fn secret(value: &str) -> SecretString {
        SecretString::new(value.to_string())
    }

    fn exposed(params: &ConnectionParams) -> Option<String> {
        params.secret().map(|s| s.expose_secret().clone())
    }

    #[test]
    fn empty_store_builds_anonymous_params() {
        let store = CredentialStore::new(DESCRIPTOR);
        assert!(store.current_principal().is_none());

        let params = store.build_connection_params(None);
        assert_eq!(params.descriptor(), DESCRIPTOR);
        assert!(params.principal().is_none());
    }

    #[test]
    fn stored_identity_is_used_by_default() {
        let mut store = CredentialStore::new(DESCRIPTOR);
        store.set(principal("alice"), secret("Alice#2024"));

        let params = store.build_connection_params(None);
        assert_eq!(params.principal(), Some(&principal("ALICE")));
        assert_eq!(exposed(&params).as_deref(), Some("Alice#2024"));
    }

    #[test]
    fn explicit_identity_does_not_touch_store() {
        let mut store = CredentialStore::new(DESCRIPTOR);
        store.set(principal("alice"), secret("Alice#2024"));

        let bob = principal("bob");
        let bob_secret = secret("Bob#2024");
        let params = store.build_connection_params(Some((&bob, &bob_secret)));
        assert_eq!(params.principal(), Some(&bob));
        assert_eq!(store.current_principal(), Some(&principal("alice")));
    }

    #[test]
    fn replace_secret_keeps_principal() {
        let mut store = CredentialStore::new(DESCRIPTOR);
        store.replace_secret(secret("ignored"));
        assert!(store.current_principal().is_none());

        store.set(principal("alice"), secret("Alice#2024"));
        store.replace_secret(secret("Alice#2025"));
        let params = store.build_connection_params(None);
        assert_eq!(exposed(&params).as_deref(), Some("Alice#2025"));
        assert_eq!(store.current_principal(), Some(&principal("alice")));
    }

    #[test]
    fn clear_forgets_identity() {
        let mut store = CredentialStore::new(DESCRIPTOR);
        store.set(principal("alice"), secret("Alice#2024"));
        store.clear();
        store.clear();
        assert!(store.current_principal().is_none());
        assert!(store.build_connection_params(None).secret().is_none());
    }
}
