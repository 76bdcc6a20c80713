//! HTTP client for the dashboard backend.
//!
//! DESIGN
//! ======
//! Every backend response uses the same envelope:
//!
//! ```text
//! {"apiStatus": ..., "apiMsg": "...", "apiObj": {...}}
//! ```
//!
//! Callers only read `apiObj` on success. Endpoint paths are supplied by the
//! caller; this module owns transport, auth headers, and envelope handling.
//! Envelope parsing is a pure function (`parse_envelope`) for testability.
//!
//! ERROR HANDLING
//! ==============
//! No request is retried here. Failures come back as `ApiError` and the UI
//! decides whether to offer a retry.

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::auth::TokenPair;

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;
const CONNECT_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("http client build failed: {0}")]
    HttpClientBuild(String),
    #[error("request failed: {0}")]
    Request(String),
    #[error("unexpected http status {status}: {body}")]
    Http { status: u16, body: String },
    #[error("invalid response body: {0}")]
    Decode(String),
    #[error("rejected ({status}): {message}")]
    Rejected { status: String, message: String },
    #[error("response envelope has no apiObj")]
    MissingObject,
}

// =============================================================================
// ENVELOPE
// =============================================================================

/// Uniform backend response wrapper.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEnvelope<T> {
    /// Numeric (`200`) or textual (`"SUCCESS"`) status.
    pub api_status: Value,
    #[serde(default)]
    pub api_msg: Option<String>,
    pub api_obj: Option<T>,
}

impl<T> ApiEnvelope<T> {
    #[must_use]
    pub fn is_success(&self) -> bool {
        match &self.api_status {
            Value::Number(n) => n.as_u64().is_some_and(|code| (200..300).contains(&code)),
            Value::String(s) => {
                s.eq_ignore_ascii_case("success")
                    || s.eq_ignore_ascii_case("ok")
                    || s.trim().parse::<u16>().is_ok_and(|code| (200..300).contains(&code))
            }
            Value::Bool(ok) => *ok,
            _ => false,
        }
    }

    /// The payload if the call succeeded.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Rejected`] for a non-success status, or
    /// [`ApiError::MissingObject`] when a success carries no payload.
    pub fn into_result(self) -> Result<T, ApiError> {
        if !self.is_success() {
            let status = match &self.api_status {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            return Err(ApiError::Rejected { status, message: self.api_msg.unwrap_or_default() });
        }
        self.api_obj.ok_or(ApiError::MissingObject)
    }
}

/// Decode a raw HTTP response into the envelope payload.
///
/// # Errors
///
/// Returns [`ApiError::Http`] for a non-2xx status without a readable
/// envelope, [`ApiError::Decode`] for a malformed body, or the envelope's
/// own error.
pub fn parse_envelope<T: DeserializeOwned>(status: u16, body: &str) -> Result<T, ApiError> {
    match serde_json::from_str::<ApiEnvelope<T>>(body) {
        Ok(envelope) => envelope.into_result(),
        Err(_) if !(200..300).contains(&status) => Err(ApiError::Http { status, body: body.to_owned() }),
        Err(e) => Err(ApiError::Decode(e.to_string())),
    }
}

// =============================================================================
// REQUEST BODIES
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthExchangeRequest<'a> {
    pub provider: &'a str,
    pub code: &'a str,
    pub state: &'a str,
}

/// `apiObj` shape for calls that issue a session.
pub type TokenResponse = TokenPair;

// =============================================================================
// CLIENT
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Method {
    Get,
    Post,
    Patch,
}

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// # Errors
    ///
    /// Returns [`ApiError::HttpClientBuild`] if the TLS backend fails to load.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| ApiError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: base_url.trim_end_matches('/').to_owned() })
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// # Errors
    ///
    /// See [`parse_envelope`]; transport failures map to [`ApiError::Request`].
    pub async fn get<T: DeserializeOwned>(&self, path: &str, bearer: Option<&str>) -> Result<T, ApiError> {
        self.send::<(), T>(Method::Get, path, None, bearer).await
    }

    /// # Errors
    ///
    /// See [`ApiClient::get`].
    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        bearer: Option<&str>,
    ) -> Result<T, ApiError> {
        self.send(Method::Post, path, Some(body), bearer).await
    }

    /// # Errors
    ///
    /// See [`ApiClient::get`].
    pub async fn patch<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        bearer: Option<&str>,
    ) -> Result<T, ApiError> {
        self.send(Method::Patch, path, Some(body), bearer).await
    }

    async fn send<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        bearer: Option<&str>,
    ) -> Result<T, ApiError> {
        let url = self.url(path);
        let mut request = match method {
            Method::Get => self.http.get(&url),
            Method::Post => self.http.post(&url),
            Method::Patch => self.http.patch(&url),
        };
        if let Some(body) = body {
            request = request.json(body);
        }
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }

        debug!(?method, %url, "api request");
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Request(e.to_string()))?;
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::Request(e.to_string()))?;

        let result = parse_envelope(status, &text);
        if let Err(e) = &result {
            warn!(?method, %url, status, error = %e, "api call failed");
        }
        result
    }
}
