//! Auth-session data model for the two portals.
//!
//! SYSTEM CONTEXT
//! ==============
//! Read by the navigation guard and by identity-aware views; written only by
//! [`crate::state::store::AuthStore`].
//!
//! DESIGN
//! ======
//! A session's token, identity and role live together in one
//! `Option<Credential>`, so a session is active exactly when all three are
//! present and they are always set or cleared as a unit. The user and admin
//! sessions are separate fields with no shared data.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use serde::{Deserialize, Serialize};

use crate::net::types::UserProfile;

/// Which portal a session belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SessionKind {
    User,
    Admin,
}

/// Account role tag as issued by the backend.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Admin => "ADMIN",
        }
    }

    /// Parse the backend tag. Unknown tags yield `None`.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "USER" => Some(Self::User),
            "ADMIN" => Some(Self::Admin),
            _ => None,
        }
    }
}

/// Identity of a logged-in administrator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminIdentity {
    pub username: String,
}

/// Everything an active session holds.
#[derive(Clone, Debug, PartialEq)]
pub struct Credential<I> {
    pub identity: I,
    pub token: String,
    pub role: Role,
}

/// One portal's session slot.
#[derive(Clone, Debug, PartialEq)]
pub struct Session<I> {
    credential: Option<Credential<I>>,
}

impl<I> Default for Session<I> {
    fn default() -> Self {
        Self { credential: None }
    }
}

impl<I> Session<I> {
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.credential.is_some()
    }

    #[must_use]
    pub fn credential(&self) -> Option<&Credential<I>> {
        self.credential.as_ref()
    }

    #[must_use]
    pub fn identity(&self) -> Option<&I> {
        self.credential.as_ref().map(|c| &c.identity)
    }

    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.credential.as_ref().map(|c| c.token.as_str())
    }

    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.credential.as_ref().map(|c| c.role)
    }

    pub(crate) fn establish(&mut self, identity: I, token: String, role: Role) {
        self.credential = Some(Credential { identity, token, role });
    }

    pub(crate) fn clear(&mut self) {
        self.credential = None;
    }

    /// Swap the identity of an active session, keeping token and role.
    /// Returns `false` (and does nothing) when the session is inactive.
    pub(crate) fn replace_identity(&mut self, identity: I) -> bool {
        match self.credential.as_mut() {
            Some(credential) => {
                credential.identity = identity;
                true
            }
            None => false,
        }
    }
}

/// Combined auth state for both portals plus the remember-me preference.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AuthState {
    pub user: Session<UserProfile>,
    pub admin: Session<AdminIdentity>,
    pub remember_me: bool,
}

impl AuthState {
    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.user.is_active()
    }

    #[must_use]
    pub fn is_admin_logged_in(&self) -> bool {
        self.admin.is_active()
    }

    #[must_use]
    pub fn is_active(&self, kind: SessionKind) -> bool {
        match kind {
            SessionKind::User => self.is_logged_in(),
            SessionKind::Admin => self.is_admin_logged_in(),
        }
    }

    #[must_use]
    pub fn current_user(&self) -> Option<&UserProfile> {
        self.user.identity()
    }

    #[must_use]
    pub fn current_admin(&self) -> Option<&AdminIdentity> {
        self.admin.identity()
    }

    /// True when either session carries the `ADMIN` role.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.user.role() == Some(Role::Admin) || self.admin.role() == Some(Role::Admin)
    }

    #[must_use]
    pub fn is_user(&self) -> bool {
        self.user.role() == Some(Role::User)
    }

    /// `Authorization` header value for general API calls: the user token,
    /// falling back to the admin token.
    #[must_use]
    pub fn auth_header(&self) -> Option<String> {
        self.user
            .token()
            .or_else(|| self.admin.token())
            .map(|token| format!("Bearer {token}"))
    }

    /// `Authorization` header value for admin-only API calls.
    #[must_use]
    pub fn admin_auth_header(&self) -> Option<String> {
        self.admin.token().map(|token| format!("Bearer {token}"))
    }
}
