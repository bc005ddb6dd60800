/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 17/10/26
******************************************************************************/
use crate::config::IdentityConfig;
use crate::constants::AUTHORIZATION_SCHEME;
use crate::session::interface::Identity;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialProvider {
    Password,
    Federated,
}

/// The signed-in user as the application renders it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: UserId,
    pub email: String,
    pub display_name: String,
    pub avatar_url: String,
    pub credential_provider: CredentialProvider,
}

impl Session {
    /// Fills a missing or blank display name and avatar from `defaults`.
    pub fn from_identity(identity: &Identity, defaults: &IdentityConfig) -> Self {
        let display_name = non_blank(identity.display_name.as_deref())
            .unwrap_or(&defaults.default_display_name)
            .to_string();
        let avatar_url = non_blank(identity.avatar_url.as_deref())
            .unwrap_or(&defaults.default_avatar_url)
            .to_string();

        Session {
            user_id: UserId::new(identity.user_id.clone()),
            email: identity.email.clone(),
            display_name,
            avatar_url,
            credential_provider: identity.credential_provider,
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{\"user_id\":\"{}\",\"email\":\"{}\",\"display_name\":\"{}\",\"credential_provider\":\"{:?}\"}}",
            self.user_id, self.email, self.display_name, self.credential_provider
        )
    }
}

/// Short-lived bearer token. Fetched per request, never persisted or logged.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub(crate) fn authorization(&self) -> String {
        format!("{} {}", AUTHORIZATION_SCHEME, self.0)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential([REDACTED])")
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}
