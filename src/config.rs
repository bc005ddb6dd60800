use crate::constants::{
    DEFAULT_AVATAR_URL, DEFAULT_DISPLAY_NAME, DEFAULT_LIKE_TIMEOUT, DEFAULT_REST_BASE_URL,
    DEFAULT_REST_TIMEOUT,
};
use crate::storage::config::CacheConfig;
use serde::Deserialize;
use std::env;
use std::fmt;
use std::fmt::Debug;
use std::str::FromStr;
use std::time::Duration;
use tracing::error;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub rest_api: RestApiConfig,
    pub identity: IdentityConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RestApiConfig {
    pub base_url: String,
    /// Per-request timeout of the HTTP client, in seconds.
    pub timeout: u64,
    /// Cap on a single like toggle, in seconds. Expiry counts as a network failure.
    pub like_timeout: u64,
}

/// Fallbacks used when the identity provider has no display name or avatar.
#[derive(Debug, Deserialize, Clone)]
pub struct IdentityConfig {
    pub default_display_name: String,
    pub default_avatar_url: String,
}

impl RestApiConfig {
    pub fn like_timeout(&self) -> Duration {
        Duration::from_secs(self.like_timeout)
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{\"rest_api\":{},\"identity\":{},\"cache\":{}}}",
            self.rest_api, self.identity, self.cache
        )
    }
}

impl fmt::Display for RestApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{\"base_url\":\"{}\",\"timeout\":{},\"like_timeout\":{}}}",
            self.base_url, self.timeout, self.like_timeout
        )
    }
}

impl fmt::Display for IdentityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{\"default_display_name\":\"{}\",\"default_avatar_url\":\"{}\"}}",
            self.default_display_name, self.default_avatar_url
        )
    }
}

pub fn get_env_or_default<T: FromStr>(env_var: &str, default: T) -> T
where
    <T as FromStr>::Err: Debug,
{
    match env::var(env_var) {
        Ok(val) => val.parse::<T>().unwrap_or_else(|_| {
            error!("Failed to parse {}: {}, using default", env_var, val);
            default
        }),
        Err(_) => default,
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        IdentityConfig {
            default_display_name: DEFAULT_DISPLAY_NAME.to_string(),
            default_avatar_url: DEFAULT_AVATAR_URL.to_string(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Config {
            rest_api: RestApiConfig {
                base_url: get_env_or_default(
                    "ARTIFACTS_REST_BASE_URL",
                    String::from(DEFAULT_REST_BASE_URL),
                ),
                timeout: get_env_or_default("ARTIFACTS_REST_TIMEOUT", DEFAULT_REST_TIMEOUT),
                like_timeout: get_env_or_default("ARTIFACTS_LIKE_TIMEOUT", DEFAULT_LIKE_TIMEOUT),
            },
            identity: IdentityConfig {
                default_display_name: get_env_or_default(
                    "ARTIFACTS_DEFAULT_DISPLAY_NAME",
                    String::from(DEFAULT_DISPLAY_NAME),
                ),
                default_avatar_url: get_env_or_default(
                    "ARTIFACTS_DEFAULT_AVATAR_URL",
                    String::from(DEFAULT_AVATAR_URL),
                ),
            },
            cache: CacheConfig::from_env(),
        }
    }
}
