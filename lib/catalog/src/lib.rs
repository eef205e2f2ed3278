//! Data dictionary and stored-procedure boundary for dbwarden.
//!
//! Everything the console knows about a database arrives through the traits
//! in [`backend`]: an authentication probe, dictionary reads, and one method
//! per administrative procedure. Failures are reported as [`NativeError`]
//! carrying the server's `ORA-` code untouched.
//!
//! [`InMemoryCatalog`] implements all three traits without a database and
//! raises the same codes a real server would for common failures.

pub mod backend;
pub mod connection;
pub mod error;
pub mod memory;
pub mod types;

pub use backend::{AdminExecutor, AuthProbe, Backend, CatalogReader};
pub use connection::ConnectionParams;
pub use error::{NativeError, codes};
pub use memory::{InMemoryCatalog, Operation};
pub use types::{
    AccountStatus, ColumnGrant, ColumnGrantRequest, NewUser, ObjectGrant, ObjectGrantRequest,
    PersonalDetails, PrivilegeGrant, ProfileSpec, RoleGrant, RoleSummary, TableRef,
    TablespaceQuota, UserAccount, UserChanges,
};
