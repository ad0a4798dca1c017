//! Backend business codes and their default user-facing messages.
//!
//! Used when a rejection arrives without a message of its own.

#[cfg(test)]
#[path = "codes_test.rs"]
mod codes_test;

pub const PARAM_ERROR: i64 = 40001;
pub const AUTH_ERROR: i64 = 40101;
pub const PERMISSION_ERROR: i64 = 40301;
pub const CONFLICT_ERROR: i64 = 40901;
pub const RATE_LIMIT_ERROR: i64 = 42901;
pub const SERVER_ERROR: i64 = 50000;

pub const NETWORK_ERROR: &str = "网络错误，请检查网络连接";
pub const UNKNOWN_ERROR: &str = "未知错误，请稍后重试";
pub const NOT_LOGGED_IN: &str = "未登录";

/// Default message for a backend business code.
#[must_use]
pub fn default_message(code: i64) -> &'static str {
    match code {
        PARAM_ERROR => "参数校验失败",
        AUTH_ERROR => "认证失败，请重新登录",
        PERMISSION_ERROR => "权限不足",
        CONFLICT_ERROR => "资源冲突",
        RATE_LIMIT_ERROR => "请求过于频繁，请稍后再试",
        SERVER_ERROR => "服务器内部错误",
        _ => UNKNOWN_ERROR,
    }
}
