//! Runtime configuration parsed from environment variables.
//!
//! All settings are optional. OAuth providers without a client id are
//! disabled rather than treated as an error.

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::auth::expiry::DEFAULT_EXPIRY_CHECK_SECS;
use crate::auth::oauth::{OAuthClientConfig, OAuthProvider};
use crate::net::api::DEFAULT_REQUEST_TIMEOUT_SECS;

pub const DEFAULT_STORAGE_DIR: &str = ".stockkid";
pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8080";
pub const DEFAULT_LOGIN_PATH: &str = "/api/user/login";
pub const DEFAULT_OAUTH_EXCHANGE_PATH: &str = "/api/oauth/token";
pub const DEFAULT_OAUTH_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub storage_dir: PathBuf,
    pub api_base_url: String,
    pub login_path: String,
    pub oauth_exchange_path: String,
    pub expiry_check: Duration,
    pub oauth_timeout: Duration,
    pub request_timeout: Duration,
    pub oauth_clients: HashMap<OAuthProvider, OAuthClientConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from(DEFAULT_STORAGE_DIR),
            api_base_url: DEFAULT_API_BASE_URL.to_owned(),
            login_path: DEFAULT_LOGIN_PATH.to_owned(),
            oauth_exchange_path: DEFAULT_OAUTH_EXCHANGE_PATH.to_owned(),
            expiry_check: Duration::from_secs(DEFAULT_EXPIRY_CHECK_SECS),
            oauth_timeout: Duration::from_secs(DEFAULT_OAUTH_TIMEOUT_SECS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            oauth_clients: HashMap::new(),
        }
    }
}

impl Config {
    /// Build config from the process environment.
    ///
    /// Optional:
    /// - `STOCKKID_STORAGE_DIR`: default `.stockkid`
    /// - `STOCKKID_API_BASE_URL`: default `http://127.0.0.1:8080`
    /// - `STOCKKID_LOGIN_PATH`, `STOCKKID_OAUTH_EXCHANGE_PATH`
    /// - `STOCKKID_EXPIRY_CHECK_SECS`: default 60
    /// - `STOCKKID_OAUTH_TIMEOUT_SECS`: default 300
    /// - `STOCKKID_HTTP_TIMEOUT_SECS`: default 15
    /// - `STOCKKID_<PROVIDER>_CLIENT_ID` / `STOCKKID_<PROVIDER>_REDIRECT_URI`
    ///   for `GOOGLE`, `NAVER`, `KAKAO`
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let secs = |key: &str, default: Duration| {
            lookup(key)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .filter(|&v| v > 0)
                .map_or(default, Duration::from_secs)
        };

        let oauth_clients = OAuthProvider::ALL
            .into_iter()
            .filter_map(|provider| {
                let upper = provider.as_str().to_ascii_uppercase();
                let client_id = lookup(&format!("STOCKKID_{upper}_CLIENT_ID"))?;
                let redirect_uri = lookup(&format!("STOCKKID_{upper}_REDIRECT_URI"))?;
                Some((provider, OAuthClientConfig { client_id, redirect_uri }))
            })
            .collect();

        Self {
            storage_dir: lookup("STOCKKID_STORAGE_DIR").map_or(defaults.storage_dir, PathBuf::from),
            api_base_url: lookup("STOCKKID_API_BASE_URL")
                .unwrap_or(defaults.api_base_url)
                .trim_end_matches('/')
                .to_owned(),
            login_path: lookup("STOCKKID_LOGIN_PATH").unwrap_or(defaults.login_path),
            oauth_exchange_path: lookup("STOCKKID_OAUTH_EXCHANGE_PATH").unwrap_or(defaults.oauth_exchange_path),
            expiry_check: secs("STOCKKID_EXPIRY_CHECK_SECS", defaults.expiry_check),
            oauth_timeout: secs("STOCKKID_OAUTH_TIMEOUT_SECS", defaults.oauth_timeout),
            request_timeout: secs("STOCKKID_HTTP_TIMEOUT_SECS", defaults.request_timeout),
            oauth_clients,
        }
    }

    #[must_use]
    pub fn oauth_client(&self, provider: OAuthProvider) -> Option<&OAuthClientConfig> {
        self.oauth_clients.get(&provider)
    }
}
