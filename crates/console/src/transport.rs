//! Credentialed transport for the voucher API.
//!
//! Every request reads the persisted credential right before it is sent and
//! attaches it as a bearer token when present. Every failure, whether the
//! request never got a response or the server answered with an error status,
//! is normalized here into [`ApiError`]; nothing above this module ever sees a
//! raw `reqwest::Error`.
//!
//! There are no retries: a failed call is terminal and the caller decides
//! whether to try again.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::ConsoleConfig;
use crate::credentials::CredentialStore;

/// Message used when neither the server nor the HTTP client explain a failure.
const GENERIC_FAILURE: &str = "Request failed";

/// Category of a normalized API failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiErrorKind {
    /// No response: connection failure, DNS, TLS, or timeout.
    Transport,
    /// The server rejected the credential (401 or 403).
    Authentication,
    /// Any other non-success status.
    Status,
    /// Success status but the body was not what the caller expected.
    Decode,
}

/// Error body the voucher API sends alongside failure statuses.
///
/// Only `message` has a fixed type; `error` and `details` are kept as raw
/// JSON since servers put strings, objects, or arrays there.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    /// Human-readable message.
    #[serde(default)]
    pub message: Option<String>,
    /// Short error code, description, or error object.
    #[serde(default)]
    pub error: Option<Value>,
    /// Per-field validation details.
    #[serde(default)]
    pub details: Option<Value>,
}

impl ApiErrorBody {
    /// Extract the known fields from a JSON object; anything else yields `None`.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        Some(Self {
            message: object
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_owned),
            error: object.get("error").filter(|v| !v.is_null()).cloned(),
            details: object.get("details").filter(|v| !v.is_null()).cloned(),
        })
    }

    /// The `error` field when it is a plain string.
    #[must_use]
    pub fn error_code(&self) -> Option<&str> {
        self.error.as_ref().and_then(Value::as_str)
    }
}

/// The single failure shape produced by [`ApiClient`].
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ApiError {
    /// What went wrong, for callers that need to branch.
    pub kind: ApiErrorKind,
    /// Server-supplied message, else the transport's own text.
    pub message: String,
    /// HTTP status, absent for transport failures.
    pub status: Option<u16>,
    /// Parsed error body, when the server sent one.
    pub data: Option<ApiErrorBody>,
}

impl ApiError {
    /// Failure before any response arrived.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            kind: ApiErrorKind::Transport,
            message: if message.is_empty() {
                GENERIC_FAILURE.to_string()
            } else {
                message
            },
            status: None,
            data: None,
        }
    }

    /// Failure derived from a non-success status and its raw body.
    #[must_use]
    pub fn from_status(status: u16, body: &[u8]) -> Self {
        let data = serde_json::from_slice::<Value>(body)
            .ok()
            .and_then(|value| ApiErrorBody::from_value(&value));
        let kind = match status {
            401 | 403 => ApiErrorKind::Authentication,
            _ => ApiErrorKind::Status,
        };
        let message = data
            .as_ref()
            .and_then(|d| d.message.as_deref())
            .filter(|m| !m.is_empty())
            .map_or_else(
                || format!("Request failed with status code {status}"),
                str::to_owned,
            );

        Self {
            kind,
            message,
            status: Some(status),
            data,
        }
    }

    /// Whether the server rejected the credential.
    #[must_use]
    pub fn is_authentication(&self) -> bool {
        self.kind == ApiErrorKind::Authentication
    }

    /// The `message` field of the server's error body, if it sent one.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        self.data
            .as_ref()
            .and_then(|d| d.message.as_deref())
            .filter(|m| !m.is_empty())
    }

    fn from_reqwest(err: &reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            return Self::transport(format!("timeout of {}ms exceeded", timeout.as_millis()));
        }
        Self::transport(err.to_string())
    }

    fn decode(status: u16, err: &serde_json::Error) -> Self {
        Self {
            kind: ApiErrorKind::Decode,
            message: format!("Malformed response body: {err}"),
            status: Some(status),
            data: None,
        }
    }
}

/// HTTP client for the voucher API with credential injection.
///
/// Cheap to clone; clones share the connection pool and credential store.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    timeout: Duration,
    credentials: Arc<dyn CredentialStore>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("timeout", &self.inner.timeout)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client for `config.api_url` reading credentials from `credentials`.
    ///
    /// # Errors
    ///
    /// Returns a transport `ApiError` if the HTTP client cannot be built
    /// (for example, no TLS backend is available).
    pub fn new(
        config: &ConsoleConfig,
        credentials: Arc<dyn CredentialStore>,
    ) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("pv-console/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.api_url.clone(),
                timeout: config.request_timeout,
                credentials,
            }),
        })
    }

    /// Base URL requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Credential store shared with the session.
    #[must_use]
    pub fn credentials(&self) -> &Arc<dyn CredentialStore> {
        &self.inner.credentials
    }

    /// `GET` `path` and decode the JSON body.
    ///
    /// # Errors
    ///
    /// Returns the normalized `ApiError` on any failure.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(Method::GET, path, None::<&()>).await
    }

    /// `POST` `body` as JSON to `path` and decode the JSON reply.
    ///
    /// # Errors
    ///
    /// Returns the normalized `ApiError` on any failure.
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(Method::POST, path, Some(body)).await
    }

    /// Send one request. An empty success body decodes as JSON `null`, so
    /// callers that do not care about the reply can ask for
    /// `serde_json::Value`.
    ///
    /// # Errors
    ///
    /// Returns the normalized `ApiError` on any failure.
    #[instrument(skip(self, body))]
    pub async fn request<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url_for(path)?;
        let mut builder = self
            .inner
            .client
            .request(method, url)
            .header(reqwest::header::ACCEPT, "application/json");

        let credential = match self.inner.credentials.load() {
            Ok(credential) => credential,
            Err(e) => {
                warn!(error = %e, "Could not read credential, sending unauthenticated");
                None
            }
        };
        if let Some(ref credential) = credential {
            builder = builder.bearer_auth(credential.expose());
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        debug!(authenticated = credential.is_some(), "Sending API request");

        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::from_reqwest(&e, self.inner.timeout))?;
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::from_reqwest(&e, self.inner.timeout))?;

        debug!(status = status.as_u16(), "API response received");

        if !status.is_success() {
            let err = ApiError::from_status(status.as_u16(), &bytes);
            debug!(status = status.as_u16(), message = %err.message, "API request failed");
            return Err(err);
        }

        decode_body(status, &bytes)
    }

    /// Join `path` onto the base URL, keeping any path prefix in the base.
    fn url_for(&self, path: &str) -> Result<Url, ApiError> {
        let base = self.inner.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Url::parse(&format!("{base}/{path}"))
            .map_err(|e| ApiError::transport(format!("invalid request URL for {path}: {e}")))
    }
}

fn decode_body<T: DeserializeOwned>(status: StatusCode, bytes: &[u8]) -> Result<T, ApiError> {
    let bytes: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) {
        b"null"
    } else {
        bytes
    };
    serde_json::from_slice(bytes).map_err(|e| ApiError::decode(status.as_u16(), &e))
}
