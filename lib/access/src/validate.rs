//! Input validation for gated operations.
//!
//! Every check here runs before the backend is called and reports
//! [`AdminError::ValidationError`] naming the offending field.

use crate::config::PasswordPolicy;
use crate::error::AdminError;
use dbwarden_core::{ObjectPrivilege, ParseNameError, Quota, ResourceLimit};
use secrecy::{ExposeSecret, SecretString};
use std::str::FromStr;

const REDACTED: &str = "<redacted>";

/// Parses a required identifier.
pub(crate) fn name<N>(field: &str, raw: &str) -> Result<N, AdminError>
where
    N: FromStr<Err = ParseNameError>,
{
    raw.parse()
        .map_err(|e: ParseNameError| AdminError::invalid(field, raw, e.reason))
}

/// Parses an optional identifier, falling back to `default` when blank.
pub(crate) fn name_or<N>(field: &str, raw: Option<&str>, default: &str) -> Result<N, AdminError>
where
    N: FromStr<Err = ParseNameError>,
{
    match raw.map(str::trim) {
        Some(value) if !value.is_empty() => name(field, value),
        _ => name(field, default),
    }
}

/// Parses an optional identifier, treating blank as absent.
pub(crate) fn optional_name<N>(field: &str, raw: Option<&str>) -> Result<Option<N>, AdminError>
where
    N: FromStr<Err = ParseNameError>,
{
    match raw.map(str::trim) {
        Some(value) if !value.is_empty() => name(field, value).map(Some),
        _ => Ok(None),
    }
}

/// Parses a privilege granted on a whole table.
pub(crate) fn table_privilege(raw: &str) -> Result<ObjectPrivilege, AdminError> {
    raw.parse::<ObjectPrivilege>()
        .map_err(|e| AdminError::invalid("privilege", raw, e.to_string()))
}

/// Parses a privilege granted on individual columns.
pub(crate) fn column_privilege(raw: &str) -> Result<ObjectPrivilege, AdminError> {
    ObjectPrivilege::parse_for_column(raw)
        .map_err(|e| AdminError::invalid("privilege", raw, e.to_string()))
}

/// Parses a profile resource limit. Blank means "leave unchanged".
pub(crate) fn resource_limit(
    field: &str,
    raw: Option<&str>,
) -> Result<Option<ResourceLimit>, AdminError> {
    match raw.map(str::trim) {
        Some(value) if !value.is_empty() => value
            .parse()
            .map(Some)
            .map_err(|e: dbwarden_core::ParseLimitError| {
                AdminError::invalid(field, value, e.to_string())
            }),
        _ => Ok(None),
    }
}

/// Parses a tablespace quota.
pub(crate) fn quota(raw: &str) -> Result<Quota, AdminError> {
    raw.parse()
        .map_err(|e: dbwarden_core::ParseQuotaError| AdminError::invalid("quota", raw, e.to_string()))
}

/// Rejects an empty secret.
pub(crate) fn secret_present(field: &str, secret: &SecretString) -> Result<(), AdminError> {
    if secret.expose_secret().trim().is_empty() {
        return Err(AdminError::invalid(field, "", "must not be empty"));
    }
    Ok(())
}

/// Applies the password policy. The offending value is never echoed.
pub(crate) fn password(
    policy: &PasswordPolicy,
    field: &str,
    secret: &SecretString,
) -> Result<(), AdminError> {
    secret_present(field, secret)?;
    policy
        .check(secret.expose_secret())
        .map_err(|reason| AdminError::invalid(field, REDACTED, reason))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use dbwarden_core::{PrincipalName, ProfileName};

    fn secret(value: &str) -> SecretString {
        SecretString::new(value.to_string())
    }

    #[test]
    fn blank_identifier_is_a_validation_error() {
        let err = name::<PrincipalName>("username", "  ").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationError);
        assert!(err.to_string().contains("username"));
    }

    #[test]
    fn name_or_falls_back_to_default() {
        let profile: ProfileName = name_or("profile", Some(" "), "DEFAULT").expect("valid");
        assert_eq!(profile.as_str(), "DEFAULT");
        let profile: ProfileName = name_or("profile", Some("batch"), "DEFAULT").expect("valid");
        assert_eq!(profile.as_str(), "BATCH");
        let profile: ProfileName = name_or("profile", None, "DEFAULT").expect("valid");
        assert_eq!(profile.as_str(), "DEFAULT");
    }

    #[test]
    fn optional_name_treats_blank_as_absent() {
        let none: Option<ProfileName> = optional_name("profile", Some("")).expect("valid");
        assert!(none.is_none());
        let some: Option<ProfileName> = optional_name("profile", Some("batch")).expect("valid");
        assert_eq!(some.map(String::from).as_deref(), Some("BATCH"));
    }

    #[test]
    fn truncate_is_rejected_for_tables_and_update_for_columns() {
        let err = table_privilege("TRUNCATE").unwrap_err();
        assert!(matches!(
            err,
            AdminError::ValidationError { ref field, ref value, .. }
                if field == "privilege" && value == "TRUNCATE"
        ));
        assert!(column_privilege("UPDATE").is_err());
        assert_eq!(
            column_privilege("select").expect("valid"),
            ObjectPrivilege::Select
        );
    }

    #[test]
    fn resource_limits() {
        assert_eq!(
            resource_limit("IDLE_TIME", Some("-5")).unwrap_err().kind(),
            ErrorKind::ValidationError
        );
        assert_eq!(
            resource_limit("IDLE_TIME", Some("unlimited")).expect("valid"),
            Some(ResourceLimit::Unlimited)
        );
        assert_eq!(
            resource_limit("IDLE_TIME", Some("DEFAULT")).expect("valid"),
            Some(ResourceLimit::Default)
        );
        assert_eq!(
            resource_limit("IDLE_TIME", Some("0")).expect("valid"),
            Some(ResourceLimit::Value(0))
        );
        assert_eq!(
            resource_limit("IDLE_TIME", Some("120")).expect("valid"),
            Some(ResourceLimit::Value(120))
        );
        assert_eq!(resource_limit("IDLE_TIME", Some(" ")).expect("valid"), None);
        assert_eq!(resource_limit("IDLE_TIME", None).expect("valid"), None);
    }

    #[test]
    fn quota_errors_name_the_field() {
        let err = quota("lots").unwrap_err();
        assert!(err.to_string().contains("quota"));
        assert_eq!(quota("100M").expect("valid").to_string(), "100M");
    }

    #[test]
    fn password_errors_do_not_echo_the_secret() {
        let err = password(&PasswordPolicy::default(), "password", &secret("weakpass")).unwrap_err();
        let rendered = err.to_string();
        assert!(!rendered.contains("weakpass"));
        assert!(rendered.contains(REDACTED));

        assert!(password(&PasswordPolicy::default(), "password", &secret("Str0ng#Pass")).is_ok());
        assert_eq!(
            secret_present("password", &secret("   ")).unwrap_err().kind(),
            ErrorKind::ValidationError
        );
    }
}
