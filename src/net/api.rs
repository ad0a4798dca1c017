//! Remote auth client for the portal backend.
//!
//! Client-side (csr): real HTTP calls via `gloo-net`, aborted after the
//! configured timeout.
//! Native builds (tests, tooling): calls fail with a transport error since the
//! endpoints are only reachable from the browser.
//!
//! ERROR HANDLING
//! ==============
//! [`AuthApi`] methods return the decoded envelope untouched, whatever its
//! `code`. `Err` is reserved for transport faults (network, timeout, body
//! parse), so the session store alone decides what a business code means.

#![allow(clippy::unused_async)]

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::types::{ApiEnvelope, LoginData, LoginRequest, RegisterRequest, SendCodeRequest, UserProfile};
use crate::config::PortalConfig;
use crate::error::AuthError;

pub const LOGIN_PATH: &str = "/api/auth/login";
pub const ADMIN_LOGIN_PATH: &str = "/api/auth/admin/login";
pub const REGISTER_PATH: &str = "/api/auth/register";
pub const SEND_REGISTER_CODE_PATH: &str = "/api/auth/register/send-code";
pub const LOGOUT_PATH: &str = "/api/auth/logout";
pub const USER_INFO_PATH: &str = "/api/user/info";

/// Backend auth surface consumed by the session store. Enables mocking in tests.
#[async_trait::async_trait(?Send)]
pub trait AuthApi {
    /// `POST /api/auth/login`
    async fn login(&self, request: &LoginRequest) -> Result<ApiEnvelope<LoginData>, AuthError>;

    /// `POST /api/auth/admin/login`
    async fn admin_login(&self, request: &LoginRequest) -> Result<ApiEnvelope<LoginData>, AuthError>;

    /// `POST /api/auth/register`
    async fn register(&self, request: &RegisterRequest) -> Result<ApiEnvelope<serde_json::Value>, AuthError>;

    /// `POST /api/auth/register/send-code`
    async fn send_register_code(&self, email: &str) -> Result<ApiEnvelope<serde_json::Value>, AuthError>;

    /// `POST /api/auth/logout`, blacklisting `token` server-side.
    async fn logout(&self, token: &str) -> Result<ApiEnvelope<serde_json::Value>, AuthError>;

    /// `GET /api/user/info` for the bearer of `token`.
    async fn user_info(&self, token: &str) -> Result<ApiEnvelope<UserProfile>, AuthError>;
}

fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

#[cfg(any(test, feature = "csr"))]
fn request_failed_message(status: u16) -> String {
    format!("request failed: {status}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Method {
    Get,
    Post,
}

/// [`AuthApi`] over the browser `fetch` API.
#[derive(Debug, Clone)]
pub struct HttpAuthApi {
    base_url: String,
    timeout_ms: u32,
}

impl HttpAuthApi {
    #[must_use]
    pub fn new(config: &PortalConfig) -> Self {
        Self { base_url: config.api_base_url.clone(), timeout_ms: config.request_timeout_ms }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn send<B, T>(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<&B>,
    ) -> Result<ApiEnvelope<T>, AuthError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        #[cfg(feature = "csr")]
        {
            use gloo_net::http::Request;

            let url = self.url(path);
            let controller =
                web_sys::AbortController::new().map_err(|_| AuthError::Transport("abort controller unavailable".into()))?;
            let signal = controller.signal();
            let timer = gloo_timers::callback::Timeout::new(self.timeout_ms, move || controller.abort());

            let mut builder = match method {
                Method::Get => Request::get(&url),
                Method::Post => Request::post(&url),
            }
            .header("Content-Type", "application/json")
            .abort_signal(Some(&signal));
            if let Some(token) = token {
                builder = builder.header("Authorization", &bearer(token));
            }
            let request = match body {
                Some(body) => builder.json(body),
                None => builder.build(),
            }
            .map_err(|e| AuthError::Transport(e.to_string()))?;

            let sent = request.send().await;
            let _ = timer.cancel();
            let resp = sent.map_err(|e| AuthError::Transport(e.to_string()))?;
            let status = resp.status();
            match resp.json::<ApiEnvelope<T>>().await {
                Ok(envelope) => Ok(envelope),
                Err(_) if !resp.ok() => Err(AuthError::Transport(request_failed_message(status))),
                Err(e) => Err(AuthError::Transport(e.to_string())),
            }
        }
        #[cfg(not(feature = "csr"))]
        {
            let _ = (self.url(path), self.timeout_ms, method, token.map(bearer), body);
            Err(AuthError::Transport("not available outside the browser".to_owned()))
        }
    }
}

#[async_trait::async_trait(?Send)]
impl AuthApi for HttpAuthApi {
    async fn login(&self, request: &LoginRequest) -> Result<ApiEnvelope<LoginData>, AuthError> {
        self.send(Method::Post, LOGIN_PATH, None, Some(request)).await
    }

    async fn admin_login(&self, request: &LoginRequest) -> Result<ApiEnvelope<LoginData>, AuthError> {
        self.send(Method::Post, ADMIN_LOGIN_PATH, None, Some(request)).await
    }

    async fn register(&self, request: &RegisterRequest) -> Result<ApiEnvelope<serde_json::Value>, AuthError> {
        self.send(Method::Post, REGISTER_PATH, None, Some(request)).await
    }

    async fn send_register_code(&self, email: &str) -> Result<ApiEnvelope<serde_json::Value>, AuthError> {
        self.send(Method::Post, SEND_REGISTER_CODE_PATH, None, Some(&SendCodeRequest { email })).await
    }

    async fn logout(&self, token: &str) -> Result<ApiEnvelope<serde_json::Value>, AuthError> {
        self.send::<(), _>(Method::Post, LOGOUT_PATH, Some(token), None).await
    }

    async fn user_info(&self, token: &str) -> Result<ApiEnvelope<UserProfile>, AuthError> {
        self.send::<(), _>(Method::Get, USER_INFO_PATH, Some(token), None).await
    }
}
