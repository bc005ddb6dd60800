/******************************************************************************
    Author: Joaquín Béjar García
    Email: jb@taunais.com
    Date: 17/10/26
 ******************************************************************************/
use reqwest::StatusCode;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::{fmt, io};

/// Failure of a single request against the artifacts REST API.
#[derive(Debug)]
pub enum ApiError {
    Network(reqwest::Error),
    Status { status: StatusCode, body: String },
    Json(serde_json::Error),
    InvalidHeader(String),
    Timeout,
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Network(e) => write!(f, "network error: {e}"),
            ApiError::Status { status, body } => {
                write!(f, "unexpected http status: {status}, body: {body}")
            }
            ApiError::Json(e) => write!(f, "json error: {e}"),
            ApiError::InvalidHeader(msg) => write!(f, "invalid header: {msg}"),
            ApiError::Timeout => write!(f, "request timed out"),
        }
    }
}

impl std::error::Error for ApiError {}

impl ApiError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ApiError::Timeout
        } else {
            ApiError::Network(e)
        }
    }
}
impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Json(e)
    }
}

/// Failure reported by the identity provider or the local session cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    NoSession,
    InvalidInput(String),
    Provider(String),
    Cache(String),
}

impl Display for AuthError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::NoSession => write!(f, "no user is signed in"),
            AuthError::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            AuthError::Provider(msg) => write!(f, "identity provider error: {msg}"),
            AuthError::Cache(msg) => write!(f, "session cache error: {msg}"),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<io::Error> for AuthError {
    fn from(e: io::Error) -> Self {
        AuthError::Cache(e.to_string())
    }
}

/// Outcome classification of a failed like toggle.
///
/// Every variant is recoverable. None of them leave partial state behind, so the
/// caller may retry the toggle once it has surfaced the failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LikeError {
    /// No session; the caller should send the user to sign in.
    Unauthenticated,
    /// A toggle for the same artifact is still outstanding.
    AlreadyInFlight,
    /// A session exists but the provider could not hand out a token.
    CredentialUnavailable(String),
    /// The server answered with a non-success status.
    RemoteRejected { status: StatusCode, body: String },
    /// The request did not complete (transport error, timeout, unreadable body).
    NetworkFailure(String),
}

impl Display for LikeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            LikeError::Unauthenticated => write!(f, "sign in to like artifacts"),
            LikeError::AlreadyInFlight => write!(f, "a like request for this artifact is in flight"),
            LikeError::CredentialUnavailable(msg) => write!(f, "credential unavailable: {msg}"),
            LikeError::RemoteRejected { status, body } => {
                write!(f, "server rejected like toggle: {status}, body: {body}")
            }
            LikeError::NetworkFailure(msg) => write!(f, "like toggle failed: {msg}"),
        }
    }
}

impl std::error::Error for LikeError {}

impl LikeError {
    pub fn requires_sign_in(&self) -> bool {
        matches!(self, LikeError::Unauthenticated)
    }
}

impl From<ApiError> for LikeError {
    fn from(e: ApiError) -> Self {
        match e {
            ApiError::Status { status, body } => LikeError::RemoteRejected { status, body },
            ApiError::InvalidHeader(msg) => LikeError::CredentialUnavailable(msg),
            other => LikeError::NetworkFailure(other.to_string()),
        }
    }
}

/// Field name to message, ordered by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(BTreeMap<&'static str, String>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.keys().copied()
    }
}

impl Display for ValidationErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(field, message)| format!("{field}: {message}"))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

#[derive(Debug)]
pub enum AppError {
    Unauthenticated,
    NotFound,
    NotOwner,
    Api(ApiError),
    Auth(AuthError),
    Validation(ValidationErrors),
    Io(io::Error),
    Json(serde_json::Error),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Unauthenticated => write!(f, "unauthenticated"),
            AppError::NotFound => write!(f, "not found"),
            AppError::NotOwner => write!(f, "artifact belongs to another user"),
            AppError::Api(e) => write!(f, "api error: {e}"),
            AppError::Auth(e) => write!(f, "auth error: {e}"),
            AppError::Validation(e) => write!(f, "validation error: {e}"),
            AppError::Io(e) => write!(f, "io error: {e}"),
            AppError::Json(e) => write!(f, "json error: {e}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<ApiError> for AppError {
    fn from(e: ApiError) -> Self {
        match e.status() {
            Some(StatusCode::NOT_FOUND) => AppError::NotFound,
            Some(StatusCode::UNAUTHORIZED) => AppError::Unauthenticated,
            _ => AppError::Api(e),
        }
    }
}
impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::NoSession => AppError::Unauthenticated,
            other => AppError::Auth(other),
        }
    }
}
impl From<ValidationErrors> for AppError {
    fn from(e: ValidationErrors) -> Self {
        AppError::Validation(e)
    }
}
impl From<io::Error> for AppError {
    fn from(e: io::Error) -> Self {
        AppError::Io(e)
    }
}
impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Json(e)
    }
}
