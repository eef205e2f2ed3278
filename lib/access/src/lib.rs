//! Authentication, privilege resolution and gated administration.
//!
//! A [`Console`] is one operator's context. It authenticates against the
//! database itself, caches the operator's privileges in a [`Session`], and
//! runs every administrative operation through the same gate:
//!
//! 1. a session must exist,
//! 2. the session must hold the operation's privilege,
//! 3. the operation must not target the operator's own account where that
//!    is forbidden,
//! 4. inputs must validate,
//!
//! before the backend is called. Backend failures are translated into
//! [`AdminError`] by a static code table.
//!
//! ```no_run
//! use dbwarden_access::{Console, ConsoleConfig};
//! use dbwarden_catalog::InMemoryCatalog;
//! use secrecy::SecretString;
//! use std::sync::Arc;
//!
//! # async fn demo() -> Result<(), dbwarden_access::AdminError> {
//! let config = ConsoleConfig::new("//db.internal:1521/ORCLPDB1");
//! let backend = Arc::new(InMemoryCatalog::new(config.connect_descriptor.clone()));
//! let mut console = Console::new(backend, config);
//!
//! console
//!     .login("admin", SecretString::new("Admin#2024".to_string()))
//!     .await?;
//! console.lock_user("scott").await?;
//! console.logout();
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod console;
pub mod credential;
pub mod error;
pub mod gate;
pub mod grants;
pub mod profiles;
pub mod resolver;
pub mod roles;
pub mod session;
pub mod translate;
pub mod users;

mod validate;

#[cfg(test)]
mod testing;

pub use crate::config::{AccountDefaults, ConsoleConfig, PasswordPolicy};
pub use console::{Console, Outcome};
pub use credential::CredentialStore;
pub use error::{AdminError, ConfigError, ErrorKind};
pub use gate::Requirement;
pub use grants::{ColumnGrantInput, ObjectGrantInput};
pub use profiles::ProfileRequest;
pub use resolver::{
    PrivilegeKind, PrivilegeOrigin, PrivilegeRecord, PrivilegeResolver, PrivilegeSnapshot,
};
pub use session::Session;
pub use translate::{classify, translate};
pub use users::{AlterUserRequest, CreateUserRequest};
