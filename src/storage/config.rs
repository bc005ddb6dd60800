use crate::config::get_env_or_default;
use crate::constants::DEFAULT_CACHE_PATH;
use serde::Deserialize;
use std::fmt;

/// Where the display-safe session snapshot is kept between runs.
#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    pub path: String,
}

impl CacheConfig {
    pub fn from_env() -> Self {
        Self {
            path: get_env_or_default("ARTIFACTS_CACHE_PATH", String::from(DEFAULT_CACHE_PATH)),
        }
    }
}

impl fmt::Display for CacheConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{\"path\":\"{}\"}}", self.path)
    }
}
