//! Turns token-expiry errors from the router's error channel into a forced
//! logout of the portal currently on screen.

#[cfg(test)]
#[path = "escalator_test.rs"]
mod escalator_test;

use crate::state::store::AuthStore;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Escalation {
    /// User session cleared.
    UserExpired,
    /// Admin session cleared.
    AdminExpired,
    /// Logged only.
    Ignored,
}

/// Inspect an error message and dispatch expiry handling by location.
pub fn escalate(message: &str, store: &AuthStore) -> Escalation {
    log::error!("navigation error: {message}");

    if !store.config().is_expiry_signal(message) {
        return Escalation::Ignored;
    }

    let routes = &store.config().routes;
    let path = store.current_path();
    if routes.is_user_path(&path) {
        store.handle_token_expired();
        Escalation::UserExpired
    } else if routes.is_admin_path(&path) {
        store.handle_admin_token_expired();
        Escalation::AdminExpired
    } else {
        log::warn!("token expiry reported outside both portals at {path}");
        Escalation::Ignored
    }
}
