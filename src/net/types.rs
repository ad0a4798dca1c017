//! Wire DTOs for the auth endpoints.
//!
//! DESIGN
//! ======
//! Every backend response is wrapped in an [`ApiEnvelope`]; success is decided
//! by the envelope `code`, not by HTTP status. Field names follow the backend's
//! camelCase JSON.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use serde::{Deserialize, Serialize};

/// Uniform `{ code, message, data }` response wrapper.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ApiEnvelope<T> {
    pub code: i64,
    #[serde(default)]
    pub message: Option<String>,
    pub data: Option<T>,
}

impl<T> ApiEnvelope<T> {
    #[must_use]
    pub fn ok(data: T) -> Self {
        Self { code: 0, message: Some("ok".to_owned()), data: Some(data) }
    }

    #[must_use]
    pub fn error(code: i64, message: &str) -> Self {
        Self { code, message: Some(message.to_owned()), data: None }
    }
}

/// Credentials for both the user and the admin login endpoints.
/// `username` accepts either a username or an email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Success payload of a login call.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LoginData {
    pub token: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub user: Option<UserProfile>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invite_code: Option<String>,
    pub email_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SendCodeRequest<'a> {
    pub email: &'a str,
}

/// Profile of a portal user as returned by login and `/api/user/info`.
///
/// Fields the portal does not interpret are kept in `extra` so the profile
/// survives a storage round trip unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default)]
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_verified: Option<bool>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}
