//! Navigation guard evaluated before every view transition.
//!
//! Rules, first match wins:
//! 1. arriving from the root with no active session: recover from storage
//! 2. protected admin page without an admin session: admin login
//! 3. protected user page without a user session: user login
//! 4. admin login with an admin session: admin home
//! 5. user login with a user session: user home
//! 6. proceed
//!
//! Protected-page enforcement (2, 3) always wins over the already-logged-in
//! redirects (4, 5).

#[cfg(test)]
#[path = "guard_test.rs"]
mod guard_test;

use crate::config::PortalRoutes;
use crate::state::auth::AuthState;
use crate::state::store::AuthStore;

/// Outcome of a guard check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardDecision {
    Proceed,
    Redirect(String),
}

/// Run the full guard, including first-entry recovery.
///
/// Recovery only happens when navigating away from the root with both
/// sessions empty. In-app navigation never reloads storage, so a login whose
/// result is still in flight cannot be overwritten by stale persisted state.
pub fn evaluate(target: &str, previous: &str, store: &AuthStore) -> GuardDecision {
    let routes = &store.config().routes;
    if previous == routes.root && !store.is_logged_in() && !store.is_admin_logged_in() {
        log::debug!("first entry via {target}, recovering sessions");
        store.load_from_storage();
    }

    let decision = decide(target, &store.snapshot(), routes);
    if let GuardDecision::Redirect(to) = &decision {
        log::debug!("guard redirect {target} -> {to}");
    }
    decision
}

/// Access rules 2-6 over a state snapshot.
#[must_use]
pub fn decide(target: &str, state: &AuthState, routes: &PortalRoutes) -> GuardDecision {
    if routes.is_admin_path(target) && target != routes.admin_login && !state.is_admin_logged_in() {
        return GuardDecision::Redirect(routes.admin_login.clone());
    }

    if routes.is_user_path(target) && !routes.is_user_public(target) && !state.is_logged_in() {
        return GuardDecision::Redirect(routes.user_login.clone());
    }

    if target == routes.admin_login && state.is_admin_logged_in() {
        return GuardDecision::Redirect(routes.admin_home.clone());
    }

    if target == routes.user_login && state.is_logged_in() {
        return GuardDecision::Redirect(routes.user_home.clone());
    }

    GuardDecision::Proceed
}
