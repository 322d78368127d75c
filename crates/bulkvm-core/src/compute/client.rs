//! HTTP client for the compute provisioning API

use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, trace, warn};

use super::error::{ComputeError, ComputeResult};

/// Default API endpoint.
pub const DEFAULT_API_URL: &str = "https://compute.googleapis.com/compute/v1";

const DEFAULT_USER_AGENT: &str = concat!("bulkvm/", env!("CARGO_PKG_VERSION"));

/// The service may hold an operation `wait` call open for up to two
/// minutes before replying; the client timeout must sit above that.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(150);

/// Authenticated client for the compute API.
///
/// Cheap to clone; handlers take a clone and share the underlying
/// connection pool.
#[derive(Clone)]
pub struct ComputeClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

/// Builder for [`ComputeClient`].
pub struct ComputeClientBuilder {
    base_url: String,
    token: Option<String>,
    user_agent: String,
    timeout: Duration,
}

impl ComputeClientBuilder {
    /// Override the API endpoint (tests point this at a mock server).
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Bearer token attached to every request.
    #[must_use]
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> ComputeResult<ComputeClient> {
        let http = reqwest::Client::builder()
            .user_agent(self.user_agent)
            .timeout(self.timeout)
            .build()?;
        Ok(ComputeClient {
            http,
            base_url: self.base_url.trim_end_matches('/').to_string(),
            token: self.token,
        })
    }
}

/// Error envelope returned by the service on non-success statuses.
#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    errors: Vec<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl ComputeClient {
    pub fn builder() -> ComputeClientBuilder {
        ComputeClientBuilder {
            base_url: DEFAULT_API_URL.to_string(),
            token: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        trace!(%method, %url, "compute API request");
        let builder = self.http.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> ComputeResult<T> {
        let response = self
            .request(Method::GET, path)
            .query(query)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    pub(crate) async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<&B>,
    ) -> ComputeResult<T> {
        let mut builder = self.request(Method::POST, path);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        let response = builder.send().await?;
        Self::handle_response(response).await
    }

    async fn handle_response<T: DeserializeOwned>(response: Response) -> ComputeResult<T> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        let body = response.text().await.unwrap_or_default();
        let (reason, message) = parse_error_body(&body, status);
        warn!(%status, %reason, "compute API request rejected");

        Err(match status {
            StatusCode::BAD_REQUEST => ComputeError::BadRequest { reason, message },
            StatusCode::UNAUTHORIZED => ComputeError::AuthenticationFailed { message },
            StatusCode::FORBIDDEN if reason == "rateLimitExceeded" => {
                ComputeError::RateLimited { message }
            }
            StatusCode::FORBIDDEN => ComputeError::Forbidden { message },
            StatusCode::NOT_FOUND => ComputeError::NotFound { message },
            StatusCode::TOO_MANY_REQUESTS => ComputeError::RateLimited { message },
            s if s.is_server_error() => ComputeError::ServerError { message },
            s => ComputeError::Api {
                code: s.as_u16(),
                reason,
                message,
            },
        })
    }
}

/// Extract the first reason code and a human-readable message from an
/// error response body, falling back to the raw body when it is not the
/// standard envelope.
fn parse_error_body(body: &str, status: StatusCode) -> (String, String) {
    match serde_json::from_str::<ApiErrorEnvelope>(body) {
        Ok(envelope) => {
            let detail = envelope.error.errors.into_iter().next();
            let reason = detail
                .as_ref()
                .and_then(|d| d.reason.clone())
                .unwrap_or_else(|| "unknown".to_string());
            let message = envelope
                .error
                .message
                .or_else(|| detail.and_then(|d| d.message))
                .unwrap_or_else(|| format!("HTTP {status}"));
            (reason, message)
        }
        Err(parse_err) => {
            debug!(%parse_err, "error body is not the standard envelope");
            let message = if body.trim().is_empty() {
                format!("HTTP {status}")
            } else {
                body.trim().to_string()
            };
            ("unknown".to_string(), message)
        }
    }
}
