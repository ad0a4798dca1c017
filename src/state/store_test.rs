use super::test_helpers::*;
use super::*;
use crate::net::codes;
use crate::util::navigation::MemoryNavigator;
use crate::util::storage::MemoryStore;

fn stored(h: &Harness, key: &str) -> Option<String> {
    h.storage.snapshot().get(key).cloned()
}

fn persisted_user_entries() -> Vec<(&'static str, &'static str)> {
    vec![
        ("user_token", "u1"),
        ("user_info", r#"{"id":7,"username":"alice","role":"USER","vipLevel":3}"#),
    ]
}

fn persisted_admin_entries() -> Vec<(&'static str, &'static str)> {
    vec![("admin_token", "a1"), ("admin_role", "ADMIN"), ("admin_username", "root")]
}

// =============================================================
// load_from_storage
// =============================================================

#[test]
fn new_store_starts_empty_and_reads_nothing() {
    let h = harness_with(MemoryStore::with_entries(persisted_user_entries()), MockAuthApi::default(), "/");
    assert_eq!(h.store.snapshot(), AuthState::default());
}

#[test]
fn load_recovers_both_sessions() {
    let entries = persisted_user_entries().into_iter().chain(persisted_admin_entries()).chain([("remember_me", "true")]);
    let h = harness_with(MemoryStore::with_entries(entries), MockAuthApi::default(), "/");

    h.store.init();

    let state = h.store.snapshot();
    assert_eq!(state.user.token(), Some("u1"));
    assert_eq!(state.current_user().map(|u| u.username.as_str()), Some("alice"));
    assert_eq!(state.user.role(), Some(Role::User));
    assert_eq!(state.admin.token(), Some("a1"));
    assert_eq!(state.current_admin().map(|a| a.username.as_str()), Some("root"));
    assert_eq!(state.admin.role(), Some(Role::Admin));
    assert!(state.remember_me);
}

#[test]
fn load_keeps_unknown_profile_fields() {
    let h = harness_with(MemoryStore::with_entries(persisted_user_entries()), MockAuthApi::default(), "/");
    h.store.load_from_storage();
    let state = h.store.snapshot();
    let extra = &state.current_user().unwrap().extra;
    assert_eq!(extra.get("vipLevel"), Some(&serde_json::json!(3)));
}

#[test]
fn load_takes_user_role_from_profile() {
    let entries = [("user_token", "u1"), ("user_info", r#"{"username":"boss","role":"ADMIN"}"#)];
    let h = harness_with(MemoryStore::with_entries(entries), MockAuthApi::default(), "/");
    h.store.load_from_storage();
    assert_eq!(h.store.snapshot().user.role(), Some(Role::Admin));
    assert!(h.store.snapshot().is_admin());
}

#[test]
fn load_skips_user_session_without_profile() {
    let h = harness_with(MemoryStore::with_entries([("user_token", "u1")]), MockAuthApi::default(), "/");
    h.store.load_from_storage();
    assert!(!h.store.is_logged_in());
    // Partial keys are not corruption.
    assert_eq!(stored(&h, "user_token").as_deref(), Some("u1"));
}

#[test]
fn load_skips_admin_session_with_missing_key() {
    let entries = [("admin_token", "a1"), ("admin_username", "root")];
    let h = harness_with(MemoryStore::with_entries(entries), MockAuthApi::default(), "/");
    h.store.load_from_storage();
    assert!(!h.store.is_admin_logged_in());
}

#[test]
fn load_treats_empty_values_as_absent() {
    let entries = [("user_token", ""), ("user_info", r#"{"username":"alice"}"#)];
    let h = harness_with(MemoryStore::with_entries(entries), MockAuthApi::default(), "/");
    h.store.load_from_storage();
    assert!(!h.store.is_logged_in());
}

#[test]
fn remember_me_requires_exact_true() {
    for (raw, expected) in [("true", true), ("TRUE", false), ("1", false), ("false", false)] {
        let h = harness_with(MemoryStore::with_entries([("remember_me", raw)]), MockAuthApi::default(), "/");
        h.store.load_from_storage();
        assert_eq!(h.store.snapshot().remember_me, expected, "raw value {raw:?}");
    }
}

#[test]
fn load_twice_is_idempotent() {
    let entries = persisted_user_entries().into_iter().chain(persisted_admin_entries()).chain([("remember_me", "true")]);
    let h = harness_with(MemoryStore::with_entries(entries), MockAuthApi::default(), "/");

    h.store.load_from_storage();
    let first = h.store.snapshot();
    let storage_before = h.storage.snapshot();
    h.store.load_from_storage();

    assert_eq!(h.store.snapshot(), first);
    assert_eq!(h.storage.snapshot(), storage_before);
}

#[test]
fn corrupt_profile_clears_everything() {
    let entries = [("user_token", "u1"), ("user_info", "{not json"), ("remember_me", "true"), ("remembered_username", "alice")]
        .into_iter()
        .chain(persisted_admin_entries());
    let h = harness_with(MemoryStore::with_entries(entries), MockAuthApi::default(), "/");

    h.store.load_from_storage();

    assert_eq!(h.store.snapshot(), AuthState::default());
    let left = h.storage.snapshot();
    assert_eq!(left.len(), 1, "only the remembered username survives: {left:?}");
    assert_eq!(left.get("remembered_username").map(String::as_str), Some("alice"));
}

#[test]
fn corrupt_profile_drops_sessions_already_in_memory() {
    let h = harness();
    h.store.state.borrow_mut().admin.establish(AdminIdentity { username: "root".into() }, "a1".into(), Role::Admin);
    h.storage.set("user_token", "u1").unwrap();
    h.storage.set("user_info", "not json").unwrap();

    h.store.load_from_storage();

    assert!(!h.store.is_admin_logged_in());
    assert!(!h.store.is_logged_in());
}

#[test]
fn unknown_admin_role_skips_only_admin_session() {
    let entries = persisted_user_entries()
        .into_iter()
        .chain([("admin_token", "a1"), ("admin_role", "ROOT"), ("admin_username", "root")]);
    let h = harness_with(MemoryStore::with_entries(entries), MockAuthApi::default(), "/");

    h.store.load_from_storage();

    assert!(!h.store.is_admin_logged_in());
    assert!(h.store.is_logged_in());
    assert_eq!(stored(&h, "user_token").as_deref(), Some("u1"));
    assert_eq!(stored(&h, "admin_role").as_deref(), Some("ROOT"));
}

// =============================================================
// login_user / login_admin
// =============================================================

#[tokio::test]
async fn user_login_commits_and_persists() {
    let h = harness();
    h.api.login.borrow_mut().push_back(user_login_ok("t1", "alice"));

    let data = h.store.login_user(&login_request("alice")).await.unwrap();

    assert_eq!(data.token, "t1");
    assert!(h.store.is_logged_in());
    assert_eq!(stored(&h, "user_token").as_deref(), Some("t1"));
    let info: UserProfile = serde_json::from_str(&stored(&h, "user_info").unwrap()).unwrap();
    assert_eq!(info.username, "alice");
    assert_eq!(stored(&h, "remember_me").as_deref(), Some("false"));
    assert_eq!(h.api.calls(), vec!["login:alice"]);
}

#[tokio::test]
async fn user_login_survives_reload() {
    let h = harness();
    h.api.login.borrow_mut().push_back(user_login_ok("t1", "alice"));
    h.store.login_user(&login_request("alice")).await.unwrap();
    let before = h.store.snapshot();

    let reloaded = harness_with(
        MemoryStore::with_entries(h.storage.snapshot().iter().map(|(k, v)| (k.as_str(), v.as_str()))),
        MockAuthApi::default(),
        "/",
    );
    reloaded.store.load_from_storage();

    assert_eq!(reloaded.store.snapshot(), before);
}

#[tokio::test]
async fn user_login_takes_role_from_envelope_when_profile_has_none() {
    let h = harness();
    h.api.login.borrow_mut().push_back(Ok(ApiEnvelope::ok(LoginData {
        token: "t1".into(),
        role: Some("ADMIN".into()),
        user: Some(profile("boss")),
    })));

    h.store.login_user(&login_request("boss")).await.unwrap();

    let state = h.store.snapshot();
    assert_eq!(state.user.role(), Some(Role::Admin));
    assert_eq!(state.current_user().and_then(|u| u.role.as_deref()), Some("ADMIN"));
}

#[tokio::test]
async fn user_login_without_profile_is_malformed() {
    let h = harness();
    h.api.login.borrow_mut().push_back(Ok(ApiEnvelope::ok(LoginData { token: "t1".into(), role: None, user: None })));

    let err = h.store.login_user(&login_request("alice")).await.unwrap_err();

    assert!(matches!(err, AuthError::MalformedResponse(_)));
    assert!(!h.store.is_logged_in());
    assert!(h.storage.snapshot().is_empty());
}

#[tokio::test]
async fn user_login_rejection_leaves_state_untouched() {
    let h = harness();
    h.api.login.borrow_mut().push_back(Ok(ApiEnvelope::error(40101, "用户名或密码错误")));

    let err = h.store.login_user(&login_request("alice")).await.unwrap_err();

    assert_eq!(err, AuthError::Rejected { code: 40101, message: "用户名或密码错误".into() });
    assert_eq!(h.store.snapshot(), AuthState::default());
    assert!(h.storage.snapshot().is_empty());
}

#[tokio::test]
async fn user_login_transport_failure_leaves_state_untouched() {
    let h = harness();
    h.api.login.borrow_mut().push_back(Err(AuthError::Transport("offline".into())));

    let err = h.store.login_user(&login_request("alice")).await.unwrap_err();

    assert_eq!(err.code(), "E_TRANSPORT");
    assert!(!h.store.is_logged_in());
}

#[tokio::test]
async fn status_200_counts_as_success() {
    let h = harness();
    let mut envelope = ApiEnvelope::ok(LoginData { token: "t1".into(), role: None, user: Some(profile("alice")) });
    envelope.code = 200;
    h.api.login.borrow_mut().push_back(Ok(envelope));

    h.store.login_user(&login_request("alice")).await.unwrap();

    assert!(h.store.is_logged_in());
}

#[tokio::test]
async fn admin_login_commits_username_from_request() {
    let h = harness();
    h.api.admin_login.borrow_mut().push_back(admin_login_ok("a1"));

    h.store.login_admin(&login_request("root")).await.unwrap();

    let state = h.store.snapshot();
    assert_eq!(state.current_admin().map(|a| a.username.as_str()), Some("root"));
    assert_eq!(stored(&h, "admin_token").as_deref(), Some("a1"));
    assert_eq!(stored(&h, "admin_role").as_deref(), Some("ADMIN"));
    assert_eq!(stored(&h, "admin_username").as_deref(), Some("root"));
    assert!(!state.is_logged_in());
}

#[tokio::test]
async fn admin_login_defaults_role_to_admin() {
    let h = harness();
    h.api.admin_login.borrow_mut().push_back(Ok(ApiEnvelope::ok(LoginData { token: "a1".into(), role: None, user: None })));

    h.store.login_admin(&login_request("root")).await.unwrap();

    assert_eq!(h.store.snapshot().admin.role(), Some(Role::Admin));
}

#[tokio::test]
async fn admin_login_rejection_keeps_existing_session() {
    let h = harness();
    login_both(&h).await;
    let before = h.store.snapshot();
    let storage_before = h.storage.snapshot();
    h.api.admin_login.borrow_mut().push_back(Ok(ApiEnvelope { code: 40101, message: None, data: None }));

    let err = h.store.login_admin(&login_request("root")).await.unwrap_err();

    assert_eq!(err, AuthError::Rejected { code: 40101, message: codes::default_message(40101).to_owned() });
    assert!(!err.message().is_empty());
    assert_eq!(h.store.snapshot(), before);
    assert_eq!(h.storage.snapshot(), storage_before);
}

#[tokio::test]
async fn racing_user_logins_leave_one_whole_session() {
    let api = MockAuthApi { yield_first: true, ..MockAuthApi::default() };
    api.login.borrow_mut().push_back(user_login_ok("first", "alice"));
    api.login.borrow_mut().push_back(user_login_ok("second", "bob"));
    let h = harness_with(MemoryStore::new(), api, "/user/login");

    let alice = login_request("alice");
    let bob = login_request("bob");
    let (a, b) = tokio::join!(h.store.login_user(&alice), h.store.login_user(&bob));
    a.unwrap();
    b.unwrap();

    let state = h.store.snapshot();
    let token = state.user.token().unwrap();
    let username = state.current_user().map(|u| u.username.as_str()).unwrap();
    assert!(matches!((token, username), ("first", "alice") | ("second", "bob")), "mixed session: {token} / {username}");
    assert_eq!(stored(&h, "user_token").as_deref(), Some(token));
    let info: UserProfile = serde_json::from_str(&stored(&h, "user_info").unwrap()).unwrap();
    assert_eq!(info.username, username);
}

#[tokio::test]
async fn pending_login_is_not_visible() {
    let api = MockAuthApi { yield_first: true, ..MockAuthApi::default() };
    api.login.borrow_mut().push_back(user_login_ok("t1", "alice"));
    let h = harness_with(MemoryStore::new(), api, "/user/login");

    let request = login_request("alice");
    let (_, seen_mid_flight) = tokio::join!(h.store.login_user(&request), async { h.store.is_logged_in() });

    assert!(!seen_mid_flight);
    assert!(h.store.is_logged_in());
}

// =============================================================
// register_user / send_register_code
// =============================================================

fn register_request() -> RegisterRequest {
    RegisterRequest {
        username: "alice".into(),
        email: "alice@example.com".into(),
        password: "secret".into(),
        invite_code: None,
        email_code: "123456".into(),
    }
}

#[tokio::test]
async fn register_does_not_log_in() {
    let h = harness();
    h.api.register.borrow_mut().push_back(Ok(ApiEnvelope { code: 0, message: None, data: None }));

    let message = h.store.register_user(&register_request()).await.unwrap();

    assert_eq!(message, REGISTER_SUCCESS_MESSAGE);
    assert!(!h.store.is_logged_in());
    assert!(h.storage.snapshot().is_empty());
}

#[tokio::test]
async fn register_surfaces_rejection_message() {
    let h = harness();
    h.api.register.borrow_mut().push_back(Ok(ApiEnvelope::error(40901, "用户名已存在")));

    let err = h.store.register_user(&register_request()).await.unwrap_err();

    assert_eq!(err.message(), "用户名已存在");
}

#[tokio::test]
async fn send_code_reports_pending_on_transport_failure() {
    let h = harness();
    h.api.send_register_code.borrow_mut().push_back(Err(AuthError::Transport("timeout".into())));

    let message = h.store.send_register_code("alice@example.com").await.unwrap();

    assert_eq!(message, REGISTER_CODE_PENDING_MESSAGE);
    assert_eq!(h.api.calls(), vec!["send_register_code:alice@example.com"]);
}

#[tokio::test]
async fn send_code_still_reports_rejection() {
    let h = harness();
    h.api.send_register_code.borrow_mut().push_back(Ok(ApiEnvelope::error(42901, "请求过于频繁")));

    let err = h.store.send_register_code("alice@example.com").await.unwrap_err();

    assert_eq!(err, AuthError::Rejected { code: 42901, message: "请求过于频繁".into() });
}

#[tokio::test]
async fn send_code_transport_failure_is_error_when_option_off() {
    let storage = Rc::new(MemoryStore::new());
    let api = Rc::new(MockAuthApi::default());
    api.send_register_code.borrow_mut().push_back(Err(AuthError::Transport("timeout".into())));
    let config = PortalConfig { register_code_always_succeeds: false, ..PortalConfig::default() };
    let store = AuthStore::new(config, storage, api, Rc::new(MemoryNavigator::at("/user/register")));

    let err = store.send_register_code("alice@example.com").await.unwrap_err();

    assert_eq!(err, AuthError::Transport("timeout".into()));
}

// =============================================================
// logout / logout_admin
// =============================================================

#[tokio::test]
async fn logout_clears_only_user_session() {
    let h = harness();
    login_both(&h).await;
    h.store.set_remembered_username("alice");

    h.store.logout();

    let state = h.store.snapshot();
    assert!(!state.is_logged_in());
    assert!(state.is_admin_logged_in());
    assert_eq!(stored(&h, "user_token"), None);
    assert_eq!(stored(&h, "user_info"), None);
    assert_eq!(stored(&h, "admin_token").as_deref(), Some("a1"));
    assert_eq!(stored(&h, "remembered_username").as_deref(), Some("alice"));
}

#[tokio::test]
async fn logout_admin_calls_backend_and_clears_only_admin() {
    let h = harness();
    login_both(&h).await;
    h.store.set_remembered_username("root");
    h.api.logout.borrow_mut().push_back(Ok(ApiEnvelope { code: 0, message: None, data: None }));

    h.store.logout_admin().await;

    assert!(h.api.calls().contains(&"logout:a1".to_owned()));
    let state = h.store.snapshot();
    assert!(!state.is_admin_logged_in());
    assert!(state.is_logged_in());
    for key in ["admin_token", "admin_role", "admin_username"] {
        assert_eq!(stored(&h, key), None, "{key} should be removed");
    }
    assert_eq!(stored(&h, "user_token").as_deref(), Some("u1"));
    assert_eq!(stored(&h, "remembered_username").as_deref(), Some("root"));
}

#[tokio::test]
async fn logout_admin_clears_even_when_backend_fails() {
    let h = harness();
    login_both(&h).await;
    h.api.logout.borrow_mut().push_back(Err(AuthError::Transport("offline".into())));

    h.store.logout_admin().await;

    assert!(!h.store.is_admin_logged_in());
    assert_eq!(stored(&h, "admin_token"), None);
}

#[tokio::test]
async fn logout_admin_without_session_skips_backend() {
    let h = harness();

    h.store.logout_admin().await;

    assert!(h.api.calls().is_empty());
}

// =============================================================
// token expiry
// =============================================================

#[tokio::test]
async fn user_expiry_redirects_inside_user_portal() {
    let h = harness();
    login_both(&h).await;
    h.navigator.set_path("/user/domains");

    h.store.handle_token_expired();

    assert!(!h.store.is_logged_in());
    assert!(h.store.is_admin_logged_in());
    assert_eq!(h.navigator.redirects(), vec!["/user/login"]);
}

#[tokio::test]
async fn user_expiry_does_not_hijack_admin_portal() {
    let h = harness();
    login_both(&h).await;
    h.navigator.set_path("/admin/zones");

    h.store.handle_token_expired();

    assert!(!h.store.is_logged_in());
    assert!(h.navigator.redirects().is_empty());
}

#[tokio::test]
async fn admin_expiry_redirects_inside_admin_portal() {
    let h = harness();
    login_both(&h).await;
    h.navigator.set_path("/admin/zones");

    h.store.handle_admin_token_expired();

    assert!(!h.store.is_admin_logged_in());
    assert!(h.store.is_logged_in());
    assert_eq!(stored(&h, "admin_token"), None);
    assert_eq!(stored(&h, "user_token").as_deref(), Some("u1"));
    assert_eq!(h.navigator.redirects(), vec!["/admin/login"]);
}

#[test]
fn admin_expiry_outside_admin_portal_only_clears() {
    let h = harness_with(MemoryStore::with_entries(persisted_admin_entries()), MockAuthApi::default(), "/about");
    h.store.load_from_storage();

    h.store.handle_admin_token_expired();

    assert!(!h.store.is_admin_logged_in());
    assert!(h.navigator.redirects().is_empty());
}

// =============================================================
// refresh_user_info
// =============================================================

#[tokio::test]
async fn refresh_without_session_is_not_logged_in() {
    let h = harness();

    let err = h.store.refresh_user_info().await.unwrap_err();

    assert_eq!(err, AuthError::NotLoggedIn);
    assert_eq!(err.message(), "未登录");
    assert!(h.api.calls().is_empty());
}

#[tokio::test]
async fn refresh_replaces_identity_and_persists() {
    let h = harness();
    login_both(&h).await;
    let mut fresh = profile("alice");
    fresh.points = Some(42);
    h.api.user_info.borrow_mut().push_back(Ok(ApiEnvelope::ok(fresh)));

    let returned = h.store.fetch_user_info().await.unwrap();

    assert_eq!(returned.points, Some(42));
    assert_eq!(returned.role.as_deref(), Some("USER"));
    let state = h.store.snapshot();
    assert_eq!(state.current_user().and_then(|u| u.points), Some(42));
    assert_eq!(state.user.token(), Some("u1"));
    let info: UserProfile = serde_json::from_str(&stored(&h, "user_info").unwrap()).unwrap();
    assert_eq!(info.points, Some(42));
    assert!(h.api.calls().contains(&"user_info:u1".to_owned()));
}

#[tokio::test]
async fn refresh_keeps_role_across_reload() {
    let h = harness();
    h.api.login.borrow_mut().push_back(Ok(ApiEnvelope::ok(LoginData {
        token: "u1".into(),
        role: Some("ADMIN".into()),
        user: Some(profile("alice")),
    })));
    h.store.login_user(&login_request("alice")).await.unwrap();
    h.api.user_info.borrow_mut().push_back(Ok(ApiEnvelope::ok(profile("alice"))));

    h.store.refresh_user_info().await.unwrap();
    assert_eq!(h.store.snapshot().user.role(), Some(Role::Admin));

    let reloaded = harness_with(
        MemoryStore::with_entries(h.storage.snapshot().iter().map(|(k, v)| (k.as_str(), v.as_str()))),
        MockAuthApi::default(),
        "/",
    );
    reloaded.store.load_from_storage();

    assert_eq!(reloaded.store.snapshot().user.role(), Some(Role::Admin));
    assert!(reloaded.store.snapshot().is_admin());
}

#[tokio::test]
async fn refresh_failure_keeps_stale_identity() {
    let h = harness();
    login_both(&h).await;
    let before = h.store.snapshot();
    h.api.user_info.borrow_mut().push_back(Ok(ApiEnvelope::error(40101, "Token无效")));

    let err = h.store.refresh_user_info().await.unwrap_err();

    assert_eq!(err.message(), "Token无效");
    assert_eq!(h.store.snapshot(), before);
}

#[tokio::test]
async fn refresh_result_dropped_after_logout_mid_flight() {
    let api = MockAuthApi { yield_first: true, ..MockAuthApi::default() };
    api.login.borrow_mut().push_back(user_login_ok("u1", "alice"));
    api.user_info.borrow_mut().push_back(Ok(ApiEnvelope::ok(profile("alice"))));
    let h = harness_with(MemoryStore::new(), api, "/user/profile");
    h.store.login_user(&login_request("alice")).await.unwrap();

    let (refreshed, ()) = tokio::join!(h.store.refresh_user_info(), async { h.store.logout() });

    refreshed.unwrap();
    assert!(!h.store.is_logged_in());
    assert_eq!(stored(&h, "user_info"), None);
}

// =============================================================
// preferences
// =============================================================

#[test]
fn remember_me_is_written_immediately() {
    let h = harness();
    h.store.set_remember_me(true);
    assert!(h.store.snapshot().remember_me);
    assert_eq!(stored(&h, "remember_me").as_deref(), Some("true"));

    h.store.set_remember_me(false);
    assert_eq!(stored(&h, "remember_me").as_deref(), Some("false"));
}

#[test]
fn remembered_username_round_trips() {
    let h = harness();
    assert_eq!(h.store.remembered_username(), None);

    h.store.set_remembered_username("alice");
    assert_eq!(h.store.remembered_username().as_deref(), Some("alice"));

    h.store.clear_remembered_username();
    assert_eq!(h.store.remembered_username(), None);
}

#[tokio::test]
async fn clear_storage_keeps_remembered_username_and_memory() {
    let h = harness();
    login_both(&h).await;
    h.store.set_remembered_username("alice");

    h.store.clear_storage();

    let left = h.storage.snapshot();
    assert_eq!(left.keys().collect::<Vec<_>>(), vec!["remembered_username"]);
    assert!(h.store.is_logged_in());
}

#[test]
fn save_leaves_inactive_session_keys_alone() {
    let h = harness_with(MemoryStore::with_entries(persisted_admin_entries()), MockAuthApi::default(), "/");

    h.store.save_to_storage();

    assert_eq!(stored(&h, "admin_token").as_deref(), Some("a1"));
    assert_eq!(stored(&h, "remember_me").as_deref(), Some("false"));
}
