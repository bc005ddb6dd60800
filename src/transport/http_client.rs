use crate::error::ApiError;
use crate::session::session::Credential;
use crate::transport::headers::RequestHeaders;
use anyhow::{Context, Result};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use std::fmt;
use std::fmt::Debug;
use std::time::Duration;
use tracing::{debug, error, instrument};

/// HTTP client for the historical artifacts REST API.
#[derive(Debug, Clone)]
pub struct ArtifactHttpClient {
    client: Client,
    base_url: String,
}

impl ArtifactHttpClient {
    /// Creates a new instance of the ArtifactHttpClient.
    ///
    /// # Arguments
    ///
    /// * `base_url` - The base URL of the artifacts API.
    /// * `timeout` - Timeout applied to every request, in seconds.
    ///
    /// # Returns
    ///
    /// A Result containing the ArtifactHttpClient instance or an error.
    pub fn new(base_url: &str, timeout: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[instrument(skip(self, credential))]
    pub async fn get<T: DeserializeOwned + Debug>(
        &self,
        endpoint: &str,
        credential: Option<&Credential>,
    ) -> Result<T, ApiError> {
        let request = self.request(Method::GET, endpoint, credential)?;
        Self::send(request).await
    }

    /// Sends a POST request; `body` is sent as JSON when given, otherwise the body is empty.
    #[instrument(skip(self, body, credential))]
    pub async fn post<T: DeserializeOwned + Debug, B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: Option<&B>,
        credential: Option<&Credential>,
    ) -> Result<T, ApiError> {
        let mut request = self.request(Method::POST, endpoint, credential)?;
        if let Some(body) = body {
            request = request.json(body);
        }
        Self::send(request).await
    }

    #[instrument(skip(self, body, credential))]
    pub async fn put<T: DeserializeOwned + Debug, B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
        credential: Option<&Credential>,
    ) -> Result<T, ApiError> {
        let request = self.request(Method::PUT, endpoint, credential)?.json(body);
        Self::send(request).await
    }

    #[instrument(skip(self, credential))]
    pub async fn delete<T: DeserializeOwned + Debug>(
        &self,
        endpoint: &str,
        credential: Option<&Credential>,
    ) -> Result<T, ApiError> {
        let request = self.request(Method::DELETE, endpoint, credential)?;
        Self::send(request).await
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    fn request(
        &self,
        method: Method,
        endpoint: &str,
        credential: Option<&Credential>,
    ) -> Result<RequestBuilder, ApiError> {
        let url = self.url(endpoint);
        debug!("Sending {} request to {}", method, url);
        let headers = RequestHeaders::new(credential).to_header_map()?;
        Ok(self.client.request(method, url).headers(headers))
    }

    async fn send<T: DeserializeOwned + Debug>(request: RequestBuilder) -> Result<T, ApiError> {
        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                error!("Failed to send request: {:?}", e);
                return Err(e.into());
            }
        };
        Self::handle_response(response).await
    }

    async fn handle_response<T: DeserializeOwned + Debug>(response: Response) -> Result<T, ApiError> {
        let status = response.status();
        let body_text = response.text().await?;

        debug!("Response Status: {}", status);
        debug!("Response Body: {}", body_text);

        if !status.is_success() {
            error!("API request failed. Status: {}, Body: {}", status, body_text);
            return Err(ApiError::Status {
                status,
                body: body_text,
            });
        }

        // Empty success bodies decode as `null`, which suits `()` and `Value`.
        let body_text = if body_text.trim().is_empty() {
            "null"
        } else {
            body_text.as_str()
        };
        let body: T = serde_json::from_str(body_text)?;
        Ok(body)
    }
}

impl fmt::Display for ArtifactHttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{\"base_url\":\"{}\"}}", self.base_url)
    }
}
