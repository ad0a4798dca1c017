//! Portal configuration: API endpoint, storage key names, route table, and
//! the auth policy knobs.
//!
//! DESIGN
//! ======
//! The browser has no process environment, so values come from build-time
//! `option_env!` lookups. `from_values` holds all of the parsing so it can be
//! exercised without rebuilding. The config is constructed once at startup
//! and handed to the session store; nothing reads it through a global.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u32 = 10_000;
pub const DEFAULT_APP_TITLE: &str = "HyFreeDom";

/// Deployment environment the bundle was built for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
    Other(String),
}

impl Environment {
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("" | "development") => Self::Development,
            Some("production") => Self::Production,
            Some(other) => Self::Other(other.to_owned()),
        }
    }

    #[must_use]
    pub fn is_dev(&self) -> bool {
        matches!(self, Self::Development)
    }
}

/// Names of the persistent storage keys. Each session kind owns a disjoint set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    pub admin_token: String,
    pub admin_role: String,
    pub admin_username: String,
    pub user_token: String,
    pub user_info: String,
    pub remember_me: String,
    pub remembered_username: String,
}

impl StorageKeys {
    /// Keys holding the user session.
    #[must_use]
    pub fn user_keys(&self) -> [&str; 2] {
        [self.user_token.as_str(), self.user_info.as_str()]
    }

    /// Keys holding the admin session.
    #[must_use]
    pub fn admin_keys(&self) -> [&str; 3] {
        [self.admin_token.as_str(), self.admin_role.as_str(), self.admin_username.as_str()]
    }
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            admin_token: "admin_token".to_owned(),
            admin_role: "admin_role".to_owned(),
            admin_username: "admin_username".to_owned(),
            user_token: "user_token".to_owned(),
            user_info: "user_info".to_owned(),
            remember_me: "remember_me".to_owned(),
            remembered_username: "remembered_username".to_owned(),
        }
    }
}

/// Portal path layout consulted by the navigation guard and the escalator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalRoutes {
    pub root: String,
    pub user_prefix: String,
    pub user_login: String,
    pub user_register: String,
    pub user_forgot: String,
    pub user_home: String,
    pub admin_prefix: String,
    pub admin_login: String,
    pub admin_home: String,
}

impl PortalRoutes {
    #[must_use]
    pub fn is_user_path(&self, path: &str) -> bool {
        path.starts_with(&self.user_prefix)
    }

    #[must_use]
    pub fn is_admin_path(&self, path: &str) -> bool {
        path.starts_with(&self.admin_prefix)
    }

    /// User-portal pages reachable without a session.
    #[must_use]
    pub fn is_user_public(&self, path: &str) -> bool {
        path == self.user_login || path == self.user_register || path == self.user_forgot
    }
}

impl Default for PortalRoutes {
    fn default() -> Self {
        Self {
            root: "/".to_owned(),
            user_prefix: "/user".to_owned(),
            user_login: "/user/login".to_owned(),
            user_register: "/user/register".to_owned(),
            user_forgot: "/user/forgot".to_owned(),
            user_home: "/user/dashboard".to_owned(),
            admin_prefix: "/admin".to_owned(),
            admin_login: "/admin/login".to_owned(),
            admin_home: "/admin/dashboard".to_owned(),
        }
    }
}

/// Top-level portal configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalConfig {
    pub title: String,
    pub environment: Environment,
    /// Prefix for every API path. Empty means same-origin relative URLs.
    pub api_base_url: String,
    pub request_timeout_ms: u32,
    pub storage_keys: StorageKeys,
    pub routes: PortalRoutes,
    /// Envelope codes treated as success.
    pub success_codes: Vec<i64>,
    /// Error-message fragments that mean the bearer token is expired or invalid.
    pub expiry_signals: Vec<String>,
    /// When set, `send_register_code` reports success to the caller even if
    /// the request fails in transit. Business rejections are still reported.
    pub register_code_always_succeeds: bool,
}

impl PortalConfig {
    /// Build the config from build-time variables.
    ///
    /// - `PORTAL_APP_TITLE`: defaults to `HyFreeDom`
    /// - `PORTAL_APP_ENV`: `development` (default), `production`, or any other tag
    /// - `PORTAL_API_BASE_URL`: ignored in development (requests stay relative
    ///   so the dev server proxy applies); defaults to `http://localhost:8080`
    #[must_use]
    pub fn load() -> Self {
        Self::from_values(
            option_env!("PORTAL_APP_TITLE"),
            option_env!("PORTAL_APP_ENV"),
            option_env!("PORTAL_API_BASE_URL"),
        )
    }

    #[must_use]
    pub fn from_values(title: Option<&str>, environment: Option<&str>, api_base_url: Option<&str>) -> Self {
        let environment = Environment::parse(environment);
        let api_base_url = if environment.is_dev() {
            String::new()
        } else {
            normalize_value(api_base_url)
                .unwrap_or(DEFAULT_API_BASE_URL)
                .trim_end_matches('/')
                .to_owned()
        };
        let title = normalize_value(title).unwrap_or(DEFAULT_APP_TITLE).to_owned();

        Self { title, environment, api_base_url, ..Self::default() }
    }

    #[must_use]
    pub fn is_success(&self, code: i64) -> bool {
        self.success_codes.contains(&code)
    }

    #[must_use]
    pub fn is_expiry_signal(&self, message: &str) -> bool {
        self.expiry_signals.iter().any(|signal| message.contains(signal.as_str()))
    }
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            title: DEFAULT_APP_TITLE.to_owned(),
            environment: Environment::Development,
            api_base_url: String::new(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            storage_keys: StorageKeys::default(),
            routes: PortalRoutes::default(),
            success_codes: vec![0, 200],
            expiry_signals: vec!["Token已过期".to_owned(), "Token无效".to_owned()],
            register_code_always_succeeds: true,
        }
    }
}

fn normalize_value(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
