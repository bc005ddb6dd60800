/******************************************************************************
    Author: Joaquín Béjar García
    Email: jb@taunais.com
    Date: 17/10/26
 ******************************************************************************/

use crate::constants::ACCEPT_JSON;
use crate::error::ApiError;
use crate::session::session::Credential;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use std::fmt;
use std::fmt::Display;
use tracing::debug;

/// Headers attached to every request sent to the artifacts API.
#[derive(Debug, Default)]
pub(crate) struct RequestHeaders {
    pub(crate) authorization: Option<String>,
    pub(crate) accept: Option<String>,
}

impl RequestHeaders {
    pub(crate) fn new(credential: Option<&Credential>) -> Self {
        Self {
            authorization: credential.map(Credential::authorization),
            accept: Some(ACCEPT_JSON.to_string()),
        }
    }

    /// Builds the reqwest header map.
    ///
    /// # Errors
    ///
    /// * `ApiError::InvalidHeader` - a value contains characters not allowed in headers,
    ///   which in practice means a malformed token.
    pub(crate) fn to_header_map(&self) -> Result<HeaderMap, ApiError> {
        let mut headers = HeaderMap::new();
        if let Some(accept) = &self.accept {
            headers.insert(
                ACCEPT,
                HeaderValue::from_str(accept).map_err(|e| ApiError::InvalidHeader(e.to_string()))?,
            );
        }
        if let Some(authorization) = &self.authorization {
            let mut value = HeaderValue::from_str(authorization)
                .map_err(|_| ApiError::InvalidHeader("authorization".to_string()))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        debug!("Request headers: {}", self);
        Ok(headers)
    }
}

impl Display for RequestHeaders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{\"authorization\":\"{}\",\"accept\":\"{}\"}}",
            self.authorization.as_ref().map_or("", |_| "[REDACTED]"),
            self.accept.as_deref().unwrap_or("")
        )
    }
}
