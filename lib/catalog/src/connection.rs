//! Connection parameters handed to every backend call.
//!
//! Backends open a connection per call from these parameters and release it
//! before returning, so parameters are cheap to build and never cached.

use dbwarden_core::PrincipalName;
use secrecy::{ExposeSecret, SecretString};

/// Where to connect and, optionally, as whom.
#[derive(Debug)]
pub struct ConnectionParams {
    descriptor: String,
    credentials: Option<(PrincipalName, SecretString)>,
}

impl ConnectionParams {
    /// Parameters carrying only the connect descriptor.
    ///
    /// Any call made with these is rejected by the database as
    /// unauthenticated.
    #[must_use]
    pub fn anonymous(descriptor: impl Into<String>) -> Self {
        Self {
            descriptor: descriptor.into(),
            credentials: None,
        }
    }

    /// Parameters that authenticate as `principal`.
    #[must_use]
    pub fn authenticated(
        descriptor: impl Into<String>,
        principal: PrincipalName,
        secret: &SecretString,
    ) -> Self {
        Self {
            descriptor: descriptor.into(),
            credentials: Some((principal, SecretString::new(secret.expose_secret().clone()))),
        }
    }

    /// Returns the connect descriptor (e.g. `//db.internal:1521/ORCLPDB1`).
    #[must_use]
    pub fn descriptor(&self) -> &str {
        &self.descriptor
    }

    /// Returns the principal the connection authenticates as, if any.
    #[must_use]
    pub fn principal(&self) -> Option<&PrincipalName> {
        self.credentials.as_ref().map(|(principal, _)| principal)
    }

    /// Returns the secret the connection authenticates with, if any.
    #[must_use]
    pub fn secret(&self) -> Option<&SecretString> {
        self.credentials.as_ref().map(|(_, secret)| secret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_has_no_credentials() {
        let params = ConnectionParams::anonymous("//db:1521/ORCL");
        assert_eq!(params.descriptor(), "//db:1521/ORCL");
        assert!(params.principal().is_none());
        assert!(params.secret().is_none());
    }

    #[test]
    fn authenticated_carries_credentials() {
        let principal = PrincipalName::parse("scott").expect("should parse");
        let secret = SecretString::new("Tiger#123".to_string());
        let params = ConnectionParams::authenticated("//db:1521/ORCL", principal, &secret);
        assert_eq!(params.principal().map(PrincipalName::as_str), Some("SCOTT"));
        assert_eq!(
            params.secret().map(|s| s.expose_secret().as_str()),
            Some("Tiger#123")
        );
    }

    #[test]
    fn debug_output_redacts_secret() {
        let principal = PrincipalName::parse("scott").expect("should parse");
        let secret = SecretString::new("Tiger#123".to_string());
        let params = ConnectionParams::authenticated("//db:1521/ORCL", principal, &secret);
        let rendered = format!("{params:?}");
        assert!(rendered.contains("SCOTT"));
        assert!(!rendered.contains("Tiger#123"));
    }
}
