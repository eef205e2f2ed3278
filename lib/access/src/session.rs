//! Session management for the logged-in operator.
//!
//! A session is created by a successful login and lives until logout. It
//! caches the operator's privilege snapshot and the admin flag computed from
//! it, so authorization decisions inside a session never touch the database.

use crate::resolver::PrivilegeSnapshot;
use chrono::{DateTime, Utc};
use dbwarden_core::{PrincipalName, PrivilegeName};
use serde::Serialize;

/// The authenticated operator's session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    /// The authenticated principal.
    principal: PrincipalName,
    /// When the session was created.
    created_at: DateTime<Utc>,
    /// Admin flag computed from `snapshot` when it was loaded.
    is_admin: bool,
    /// Grants read at login or at the last refresh.
    snapshot: PrivilegeSnapshot,
    /// False when privileges could not be read at login.
    privileges_loaded: bool,
}

impl Session {
    /// Creates a session from a loaded privilege snapshot.
    #[must_use]
    pub fn new(principal: PrincipalName, snapshot: PrivilegeSnapshot) -> Self {
        Self {
            principal,
            created_at: Utc::now(),
            is_admin: snapshot.is_admin_equivalent(),
            snapshot,
            privileges_loaded: true,
        }
    }

    /// Creates a session whose privileges could not be read.
    ///
    /// The session holds no privileges and is never admin.
    #[must_use]
    pub fn unprivileged(principal: PrincipalName) -> Self {
        Self {
            principal,
            created_at: Utc::now(),
            is_admin: false,
            snapshot: PrivilegeSnapshot::default(),
            privileges_loaded: false,
        }
    }

    /// Returns the authenticated principal.
    #[must_use]
    pub fn principal(&self) -> &PrincipalName {
        &self.principal
    }

    /// Returns when the session was created.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns true if the principal was admin-equivalent when privileges
    /// were last loaded.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.is_admin
    }

    /// Returns the cached privilege snapshot.
    #[must_use]
    pub fn snapshot(&self) -> &PrivilegeSnapshot {
        &self.snapshot
    }

    /// Returns false if the session fell back to holding no privileges.
    #[must_use]
    pub fn privileges_loaded(&self) -> bool {
        self.privileges_loaded
    }

    /// Returns true if the session may exercise `privilege`.
    #[must_use]
    pub fn permits(&self, privilege: &PrivilegeName) -> bool {
        self.is_admin || self.snapshot.holds_system(privilege)
    }

    /// Replaces the snapshot and recomputes the admin flag.
    pub(crate) fn refresh(&mut self, snapshot: PrivilegeSnapshot) {
        self.is_admin = snapshot.is_admin_equivalent();
        self.snapshot = snapshot;
        self.privileges_loaded = true;
    }
}
