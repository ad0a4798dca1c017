//! Session state holder for the user and admin portals.
//!
//! ARCHITECTURE
//! ============
//! `AuthStore` is built once at app start and shared as `Rc<AuthStore>`
//! through Leptos context. It is the only writer of [`AuthState`]. Storage is
//! a cache of the in-memory state: written after every successful mutation,
//! read back by `load_from_storage` on the first guard check after a reload.
//!
//! CONCURRENCY
//! ===========
//! Single-threaded and cooperative. No `RefCell` borrow is held across an
//! `.await`: remote calls complete first, then the in-memory mutation and the
//! storage write run back to back with no suspension point between them.
//! Racing logins of the same kind therefore resolve last-write-wins and a
//! session is never observed half-written.
//!
//! ERROR HANDLING
//! ==============
//! Remote operations return `Result<_, AuthError>` and never panic. Storage
//! faults are logged; a corrupt persisted session wipes all session keys and
//! leaves both sessions empty.

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;

use std::cell::RefCell;
use std::rc::Rc;

use super::auth::{AdminIdentity, AuthState, Role, SessionKind};
use crate::config::PortalConfig;
use crate::error::{AuthError, StorageError};
use crate::net::api::AuthApi;
use crate::net::types::{ApiEnvelope, LoginData, LoginRequest, RegisterRequest, UserProfile};
use crate::util::navigation::Navigator;
use crate::util::storage::KeyValueStore;

pub const REGISTER_SUCCESS_MESSAGE: &str = "注册成功";
pub const REGISTER_CODE_PENDING_MESSAGE: &str = "验证码发送中，请稍后查收邮件";

/// Sessions recovered from storage, applied only after every read succeeded.
struct Persisted {
    user: Option<(UserProfile, String, Role)>,
    admin: Option<(AdminIdentity, String, Role)>,
    remember_me: bool,
}

pub struct AuthStore {
    state: RefCell<AuthState>,
    storage: Rc<dyn KeyValueStore>,
    api: Rc<dyn AuthApi>,
    navigator: Rc<dyn Navigator>,
    config: PortalConfig,
}

impl AuthStore {
    /// Create a store with both sessions empty. Nothing is read from storage
    /// until [`AuthStore::init`] or the first guard check.
    #[must_use]
    pub fn new(
        config: PortalConfig,
        storage: Rc<dyn KeyValueStore>,
        api: Rc<dyn AuthApi>,
        navigator: Rc<dyn Navigator>,
    ) -> Self {
        Self { state: RefCell::new(AuthState::default()), storage, api, navigator, config }
    }

    #[must_use]
    pub fn config(&self) -> &PortalConfig {
        &self.config
    }

    /// Copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> AuthState {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.state.borrow().is_logged_in()
    }

    #[must_use]
    pub fn is_admin_logged_in(&self) -> bool {
        self.state.borrow().is_admin_logged_in()
    }

    #[must_use]
    pub fn current_path(&self) -> String {
        self.navigator.current_path()
    }

    // =========================================================================
    // PERSISTENCE
    // =========================================================================

    /// Restore state at app start.
    pub fn init(&self) {
        self.load_from_storage();
    }

    /// Recover sessions from storage.
    ///
    /// A session is applied only when all of its keys are present; a missing
    /// key leaves that slot as it is. Any read or decode fault clears every
    /// session key and both in-memory sessions.
    pub fn load_from_storage(&self) {
        match self.read_persisted() {
            Ok(persisted) => {
                let mut state = self.state.borrow_mut();
                if let Some((profile, token, role)) = persisted.user {
                    log::debug!("recovered user session for {}", profile.username);
                    state.user.establish(profile, token, role);
                }
                if let Some((admin, token, role)) = persisted.admin {
                    log::debug!("recovered admin session for {}", admin.username);
                    state.admin.establish(admin, token, role);
                }
                state.remember_me = persisted.remember_me;
            }
            Err(e) => {
                log::error!("failed to load auth state from storage: {e}");
                self.clear_storage();
                let mut state = self.state.borrow_mut();
                state.user.clear();
                state.admin.clear();
                state.remember_me = false;
            }
        }
    }

    fn read_persisted(&self) -> Result<Persisted, StorageError> {
        let keys = &self.config.storage_keys;

        let user_token = self.read_non_empty(&keys.user_token)?;
        let user_info = self.read_non_empty(&keys.user_info)?;
        let user = match (user_token, user_info) {
            (Some(token), Some(info)) => {
                let profile: UserProfile = serde_json::from_str(&info)
                    .map_err(|e| StorageError::Corrupt { key: keys.user_info.clone(), reason: e.to_string() })?;
                let role = profile.role.as_deref().and_then(Role::parse).unwrap_or(Role::User);
                Some((profile, token, role))
            }
            _ => None,
        };

        let admin_token = self.read_non_empty(&keys.admin_token)?;
        let admin_role = self.read_non_empty(&keys.admin_role)?;
        let admin_username = self.read_non_empty(&keys.admin_username)?;
        let admin = match (admin_token, admin_role, admin_username) {
            (Some(token), Some(raw_role), Some(username)) => match Role::parse(&raw_role) {
                Some(role) => Some((AdminIdentity { username }, token, role)),
                None => {
                    log::warn!("ignoring persisted admin session with unknown role `{raw_role}`");
                    None
                }
            },
            _ => None,
        };

        let remember_me = self.storage.get(&keys.remember_me)?.as_deref() == Some("true");

        Ok(Persisted { user, admin, remember_me })
    }

    fn read_non_empty(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.storage.get(key)?.filter(|v| !v.is_empty()))
    }

    /// Write active sessions and the remember-me flag. Keys of inactive
    /// sessions are left untouched.
    pub fn save_to_storage(&self) {
        let state = self.state.borrow();
        if let Err(e) = self.persist(&state) {
            log::error!("failed to save auth state to storage: {e}");
        }
    }

    fn persist(&self, state: &AuthState) -> Result<(), StorageError> {
        let keys = &self.config.storage_keys;

        if let Some(credential) = state.user.credential() {
            let info = serde_json::to_string(&credential.identity)
                .map_err(|e| StorageError::Corrupt { key: keys.user_info.clone(), reason: e.to_string() })?;
            self.storage.set(&keys.user_token, &credential.token)?;
            self.storage.set(&keys.user_info, &info)?;
        }

        if let Some(credential) = state.admin.credential() {
            self.storage.set(&keys.admin_token, &credential.token)?;
            self.storage.set(&keys.admin_role, credential.role.as_str())?;
            self.storage.set(&keys.admin_username, &credential.identity.username)?;
        }

        self.storage.set(&keys.remember_me, bool_flag(state.remember_me))
    }

    /// Remove every session key and the remember-me flag. The remembered
    /// username is kept.
    pub fn clear_storage(&self) {
        let keys = &self.config.storage_keys;
        for key in keys.user_keys().into_iter().chain(keys.admin_keys()).chain([keys.remember_me.as_str()]) {
            self.remove_key(key);
        }
    }

    fn remove_key(&self, key: &str) {
        if let Err(e) = self.storage.remove(key) {
            log::error!("failed to remove `{key}` from storage: {e}");
        }
    }

    // =========================================================================
    // PREFERENCES
    // =========================================================================

    pub fn set_remember_me(&self, remember: bool) {
        self.state.borrow_mut().remember_me = remember;
        if let Err(e) = self.storage.set(&self.config.storage_keys.remember_me, bool_flag(remember)) {
            log::error!("failed to save remember-me flag: {e}");
        }
    }

    pub fn set_remembered_username(&self, username: &str) {
        if let Err(e) = self.storage.set(&self.config.storage_keys.remembered_username, username) {
            log::error!("failed to save remembered username: {e}");
        }
    }

    #[must_use]
    pub fn remembered_username(&self) -> Option<String> {
        self.storage
            .get(&self.config.storage_keys.remembered_username)
            .unwrap_or_else(|e| {
                log::error!("failed to read remembered username: {e}");
                None
            })
    }

    pub fn clear_remembered_username(&self) {
        self.remove_key(&self.config.storage_keys.remembered_username);
    }

    // =========================================================================
    // LOGIN / REGISTRATION
    // =========================================================================

    /// Log in to the user portal.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Rejected`] for a non-success code,
    /// [`AuthError::Transport`] when the call fails, and
    /// [`AuthError::MalformedResponse`] when the payload lacks a token or
    /// profile. The user session is untouched on every error path.
    pub async fn login_user(&self, request: &LoginRequest) -> Result<LoginData, AuthError> {
        let envelope = self.api.login(request).await.inspect_err(|e| log::error!("user login failed: {e}"))?;
        let data = self.accept(envelope)?.ok_or_else(|| missing("login data"))?;
        let mut profile = data.user.clone().ok_or_else(|| missing("user profile"))?;

        let issued_role = data.role.as_deref().and_then(Role::parse);
        let role = profile.role.as_deref().and_then(Role::parse).or(issued_role).unwrap_or(Role::User);
        // Recovery derives the role from the stored profile.
        profile.role = Some(role.as_str().to_owned());

        log::info!("user {} logged in", profile.username);
        self.commit_user(profile, data.token.clone(), role);
        Ok(data)
    }

    /// Log in to the admin portal.
    ///
    /// # Errors
    ///
    /// Same contract as [`AuthStore::login_user`]; the admin session is
    /// untouched on every error path.
    pub async fn login_admin(&self, request: &LoginRequest) -> Result<LoginData, AuthError> {
        let envelope = self.api.admin_login(request).await.inspect_err(|e| log::error!("admin login failed: {e}"))?;
        let data = self.accept(envelope)?.ok_or_else(|| missing("login data"))?;
        let role = data.role.as_deref().and_then(Role::parse).unwrap_or(Role::Admin);
        let identity = AdminIdentity { username: request.username.clone() };

        log::info!("admin {} logged in", identity.username);
        self.commit_admin(identity, data.token.clone(), role);
        Ok(data)
    }

    fn commit_user(&self, profile: UserProfile, token: String, role: Role) {
        self.state.borrow_mut().user.establish(profile, token, role);
        self.save_to_storage();
    }

    fn commit_admin(&self, identity: AdminIdentity, token: String, role: Role) {
        self.state.borrow_mut().admin.establish(identity, token, role);
        self.save_to_storage();
    }

    /// Register a user account. Does not log in.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Rejected`] or [`AuthError::Transport`].
    pub async fn register_user(&self, request: &RegisterRequest) -> Result<String, AuthError> {
        let envelope = self.api.register(request).await.inspect_err(|e| log::error!("user registration failed: {e}"))?;
        self.accept(envelope)?;
        Ok(REGISTER_SUCCESS_MESSAGE.to_owned())
    }

    /// Ask the backend to email a registration code.
    ///
    /// With [`PortalConfig::register_code_always_succeeds`] set, a transport
    /// failure is logged and still reported as success: the backend sends the
    /// email asynchronously, so the request may have landed.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Rejected`] for a non-success code, and
    /// [`AuthError::Transport`] only when the option is off.
    pub async fn send_register_code(&self, email: &str) -> Result<String, AuthError> {
        match self.api.send_register_code(email).await {
            Ok(envelope) => {
                self.accept(envelope)?;
                Ok(REGISTER_CODE_PENDING_MESSAGE.to_owned())
            }
            Err(e) if self.config.register_code_always_succeeds => {
                log::warn!("register code request failed, reporting as pending: {e}");
                Ok(REGISTER_CODE_PENDING_MESSAGE.to_owned())
            }
            Err(e) => {
                log::error!("register code request failed: {e}");
                Err(e)
            }
        }
    }

    // =========================================================================
    // LOGOUT / EXPIRY
    // =========================================================================

    /// Clear the user session. The admin session and the remembered username
    /// are untouched.
    pub fn logout(&self) {
        self.clear_session(SessionKind::User);
    }

    /// Invalidate the admin token server-side (best effort) and clear the
    /// admin session. Local state always ends cleared.
    pub async fn logout_admin(&self) {
        let token = self.state.borrow().admin.token().map(str::to_owned);
        if let Some(token) = token {
            match self.api.logout(&token).await {
                Ok(envelope) if !self.config.is_success(envelope.code) => {
                    log::warn!("admin logout rejected with code {}", envelope.code);
                }
                Ok(_) => {}
                Err(e) => log::error!("admin logout call failed: {e}"),
            }
        }
        self.clear_session(SessionKind::Admin);
    }

    /// Forced logout after the user token expired. Redirects to the user login
    /// page only while the user portal is showing.
    pub fn handle_token_expired(&self) {
        log::warn!("user token expired");
        self.clear_session(SessionKind::User);
        let routes = &self.config.routes;
        if routes.is_user_path(&self.navigator.current_path()) {
            self.navigator.hard_redirect(&routes.user_login);
        }
    }

    /// Forced logout after the admin token expired. Redirects to the admin
    /// login page only while the admin portal is showing.
    pub fn handle_admin_token_expired(&self) {
        log::warn!("admin token expired");
        self.clear_session(SessionKind::Admin);
        let routes = &self.config.routes;
        if routes.is_admin_path(&self.navigator.current_path()) {
            self.navigator.hard_redirect(&routes.admin_login);
        }
    }

    fn clear_session(&self, kind: SessionKind) {
        let keys = &self.config.storage_keys;
        match kind {
            SessionKind::User => {
                self.state.borrow_mut().user.clear();
                for key in keys.user_keys() {
                    self.remove_key(key);
                }
            }
            SessionKind::Admin => {
                self.state.borrow_mut().admin.clear();
                for key in keys.admin_keys() {
                    self.remove_key(key);
                }
            }
        }
    }

    // =========================================================================
    // PROFILE
    // =========================================================================

    /// Re-fetch the user profile and replace the session identity.
    ///
    /// The session role is kept and written into the new profile so a reload
    /// recovers the same role. On failure the current identity is kept, stale
    /// or not.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::NotLoggedIn`] without a user session, otherwise
    /// the remote failure.
    pub async fn refresh_user_info(&self) -> Result<UserProfile, AuthError> {
        let token = self.state.borrow().user.token().map(str::to_owned);
        let Some(token) = token else {
            return Err(AuthError::NotLoggedIn);
        };

        let envelope = self.api.user_info(&token).await.inspect_err(|e| log::error!("profile refresh failed: {e}"))?;
        let mut profile = self.accept(envelope)?.ok_or_else(|| missing("user profile"))?;

        let replaced = {
            let mut state = self.state.borrow_mut();
            let role = state.user.credential().filter(|c| c.token == token).map(|c| c.role);
            match role {
                Some(role) => {
                    profile.role = Some(role.as_str().to_owned());
                    state.user.replace_identity(profile.clone())
                }
                None => false,
            }
        };
        if replaced {
            self.save_to_storage();
        } else {
            log::debug!("user session changed during profile refresh; result not applied");
        }
        Ok(profile)
    }

    /// Same as [`AuthStore::refresh_user_info`].
    ///
    /// # Errors
    ///
    /// See [`AuthStore::refresh_user_info`].
    pub async fn fetch_user_info(&self) -> Result<UserProfile, AuthError> {
        self.refresh_user_info().await
    }

    fn accept<T>(&self, envelope: ApiEnvelope<T>) -> Result<Option<T>, AuthError> {
        if self.config.is_success(envelope.code) {
            Ok(envelope.data)
        } else {
            Err(AuthError::rejected(envelope.code, envelope.message))
        }
    }
}

fn missing(what: &str) -> AuthError {
    AuthError::MalformedResponse(format!("response has no {what}"))
}

fn bool_flag(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}

// =============================================================================
// TEST HELPERS
// =============================================================================
