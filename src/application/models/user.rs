use crate::constants::USER_EXISTS_MESSAGE;
use crate::session::session::Session;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How the account was created, as the users endpoint records it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationMethod {
    Manual,
    Google,
}

/// Body of `POST /api/users`.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct UserRegistration {
    pub name: String,
    pub email: String,
    #[serde(rename = "photoURL")]
    pub photo_url: String,
    /// Only sent for email/password accounts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub method: RegistrationMethod,
}

impl UserRegistration {
    pub fn manual(session: &Session, password: &str) -> Self {
        Self {
            password: Some(password.to_string()),
            ..Self::from_session(session, RegistrationMethod::Manual)
        }
    }

    pub fn federated(session: &Session) -> Self {
        Self::from_session(session, RegistrationMethod::Google)
    }

    fn from_session(session: &Session, method: RegistrationMethod) -> Self {
        Self {
            name: session.display_name.clone(),
            email: session.email.clone(),
            photo_url: session.avatar_url.clone(),
            password: None,
            method,
        }
    }
}

impl fmt::Debug for UserRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRegistration")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("photo_url", &self.photo_url)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("method", &self.method)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationStatus {
    Created,
    /// The backend already knew the email; treated as success.
    AlreadyExists,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Whether an error body is the users endpoint's "already registered" answer.
pub(crate) fn is_user_exists(body: &str) -> bool {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .is_some_and(|message| message == USER_EXISTS_MESSAGE)
}
