//! Auth service client
//!
//! Resolves access key ids into serialized access grants:
//! `GET {base_url}/v1/access/{access_key_id}` with a bearer token.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::instrument;

/// Errors returned by an access key resolver
#[derive(Error, Debug)]
pub enum AuthServiceError {
    /// The resolver is not usable with the current configuration
    #[error("auth service not configured: {0}")]
    NotConfigured(String),

    /// The auth service does not know the access key id
    #[error("access key id not found")]
    NotFound,

    /// The auth service answered with an unexpected status
    #[error("auth service returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body could not be decoded
    #[error("invalid auth service response: {0}")]
    Decode(String),

    /// Timeout error
    #[error("auth service request timed out")]
    Timeout,

    /// HTTP transport error
    #[error("http error: {0}")]
    Http(String),
}

impl From<reqwest::Error> for AuthServiceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AuthServiceError::Timeout
        } else if err.is_decode() {
            AuthServiceError::Decode(err.to_string())
        } else {
            AuthServiceError::Http(err.to_string())
        }
    }
}

/// A resolved access key id
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedAccess {
    /// Serialized access grant
    pub access_grant: String,
    /// Whether the grant may be served publicly
    pub public: bool,
}

/// Resolves access key ids into access grants
#[async_trait]
pub trait AccessKeyResolver: Send + Sync {
    /// Look up an access key id
    async fn resolve(&self, access_key_id: &str) -> Result<ResolvedAccess, AuthServiceError>;
}

/// Configuration for the auth service client
#[derive(Clone, Debug)]
pub struct AuthServiceConfig {
    /// Base URL of the auth service (e.g., "https://auth.example.com")
    pub base_url: String,
    /// Bearer token for authentication
    pub token: String,
    /// Request timeout
    pub timeout: Duration,
}

impl AuthServiceConfig {
    /// Create a new auth service config
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
            timeout: Duration::from_secs(10),
        }
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Deserialize)]
struct AccessResponse {
    access_grant: String,
    #[serde(default)]
    public: bool,
}

/// HTTP client for the auth service
#[derive(Clone)]
pub struct AuthServiceClient {
    client: Client,
    config: AuthServiceConfig,
}

impl AuthServiceClient {
    /// Create a new auth service client
    pub fn new(config: AuthServiceConfig) -> Result<Self, AuthServiceError> {
        if config.base_url.is_empty() {
            return Err(AuthServiceError::NotConfigured("empty base url".to_string()));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AuthServiceError::Http(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn access_url(&self, access_key_id: &str) -> String {
        format!(
            "{}/v1/access/{}",
            self.config.base_url.trim_end_matches('/'),
            access_key_id
        )
    }
}

#[async_trait]
impl AccessKeyResolver for AuthServiceClient {
    #[instrument(skip(self, access_key_id))]
    async fn resolve(&self, access_key_id: &str) -> Result<ResolvedAccess, AuthServiceError> {
        let response = self
            .client
            .get(self.access_url(access_key_id))
            .bearer_auth(&self.config.token)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(AuthServiceError::NotFound);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthServiceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: AccessResponse = response
            .json()
            .await
            .map_err(|e| AuthServiceError::Decode(e.to_string()))?;

        Ok(ResolvedAccess {
            access_grant: body.access_grant,
            public: body.public,
        })
    }
}

/// Resolver used when no auth service is configured
///
/// Every access key id fails to resolve, so only self-contained grants work.
#[derive(Clone, Debug, Default)]
pub struct NoAuthService;

#[async_trait]
impl AccessKeyResolver for NoAuthService {
    async fn resolve(&self, _access_key_id: &str) -> Result<ResolvedAccess, AuthServiceError> {
        Err(AuthServiceError::NotConfigured(
            "access key ids require an auth service".to_string(),
        ))
    }
}
