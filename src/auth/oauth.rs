//! OAuth authorization-code flow for Google, Naver, and Kakao.
//!
//! ARCHITECTURE
//! ============
//! 1. `begin` mints a random `state` (plus a `nonce` for Kakao's OpenID
//!    flow), stores it under `<provider>.state`, and builds the authorize URL.
//! 2. The provider redirects back with `code` and `state`.
//! 3. `complete` checks the returned state against the stored one, clears
//!    the stored values, and hands out the code exactly once.
//!
//! The popup variant delivers the callback over [`callback_channel`], a
//! single-resolution channel owned by one login attempt. Two concurrent
//! attempts each hold their own channel, so neither can consume the other's
//! code the way two pollers on one shared storage key could.

#[cfg(test)]
#[path = "oauth_test.rs"]
mod tests;

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use rand::Rng;
use reqwest::Url;
use tokio::sync::oneshot;
use tracing::{info, warn};

use crate::persist::storage::{KeyValueStore, OAUTH_CODE_KEY, StorageError};

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
    #[error("oauth provider not configured: {0}")]
    NotConfigured(&'static str),
    #[error("invalid authorize url: {0}")]
    InvalidAuthorizeUrl(String),
    #[error("invalid callback url: {0}")]
    InvalidCallbackUrl(String),
    #[error("callback missing `{0}`")]
    MissingParam(&'static str),
    #[error("no pending {0} login")]
    NoPendingLogin(&'static str),
    #[error("oauth state mismatch")]
    StateMismatch,
    #[error("provider denied authorization: {0}")]
    Denied(String),
    #[error("callback already delivered")]
    AlreadyResolved,
    #[error("login window closed before completing")]
    Cancelled,
    #[error("timed out waiting for oauth callback")]
    Timeout,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OAuthProvider {
    Google,
    Naver,
    Kakao,
}

impl OAuthProvider {
    pub const ALL: [OAuthProvider; 3] = [Self::Google, Self::Naver, Self::Kakao];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Naver => "naver",
            Self::Kakao => "kakao",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == raw)
    }

    fn authorize_endpoint(self) -> &'static str {
        match self {
            Self::Google => "https://accounts.google.com/o/oauth2/v2/auth",
            Self::Naver => "https://nid.naver.com/oauth2.0/authorize",
            Self::Kakao => "https://kauth.kakao.com/oauth/authorize",
        }
    }

    /// Storage key for the pending `state` value.
    #[must_use]
    pub fn state_key(self) -> String {
        format!("{}.state", self.as_str())
    }

    /// Storage key for the pending OpenID `nonce`.
    #[must_use]
    pub fn nonce_key(self) -> String {
        format!("{}.nonce", self.as_str())
    }

    fn uses_nonce(self) -> bool {
        matches!(self, Self::Kakao)
    }
}

/// Client registration for one provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OAuthClientConfig {
    pub client_id: String,
    pub redirect_uri: String,
}

// =============================================================================
// BEGIN
// =============================================================================

/// A started login: what to open, and what must come back.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OAuthRequest {
    pub provider: OAuthProvider,
    pub state: String,
    pub nonce: Option<String>,
    pub authorize_url: String,
}

fn random_hex(len_bytes: usize) -> String {
    let mut rng = rand::rng();
    (0..len_bytes).map(|_| format!("{:02x}", rng.random::<u8>())).collect()
}

/// Start a login with `provider`, storing the pending state (and nonce).
///
/// # Errors
///
/// Returns [`OAuthError::Storage`] if the pending values cannot be stored,
/// or [`OAuthError::InvalidAuthorizeUrl`] for a malformed client config.
pub fn begin<S: KeyValueStore + ?Sized>(
    store: &S,
    provider: OAuthProvider,
    config: &OAuthClientConfig,
) -> Result<OAuthRequest, OAuthError> {
    let state = random_hex(16);
    let nonce = provider.uses_nonce().then(|| random_hex(16));

    let mut params = vec![
        ("response_type", "code"),
        ("client_id", config.client_id.as_str()),
        ("redirect_uri", config.redirect_uri.as_str()),
        ("state", state.as_str()),
    ];
    if provider == OAuthProvider::Google {
        params.push(("scope", "openid email profile"));
    }
    if let Some(nonce) = nonce.as_deref() {
        params.push(("scope", "openid"));
        params.push(("nonce", nonce));
    }
    let authorize_url = Url::parse_with_params(provider.authorize_endpoint(), &params)
        .map_err(|e| OAuthError::InvalidAuthorizeUrl(e.to_string()))?
        .to_string();

    store.set_item(&provider.state_key(), &state)?;
    if let Some(nonce) = nonce.as_deref() {
        store.set_item(&provider.nonce_key(), nonce)?;
    }
    info!(provider = provider.as_str(), "oauth login started");

    Ok(OAuthRequest { provider, state, nonce, authorize_url })
}

// =============================================================================
// CALLBACK
// =============================================================================

/// Query parameters delivered to the redirect URI.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

impl CallbackParams {
    /// Parse the callback URL the provider redirected to.
    ///
    /// # Errors
    ///
    /// Returns [`OAuthError::InvalidCallbackUrl`] if `url` does not parse.
    pub fn from_url(url: &str) -> Result<Self, OAuthError> {
        let url = Url::parse(url).map_err(|e| OAuthError::InvalidCallbackUrl(e.to_string()))?;
        let mut params = Self::default();
        for (key, value) in url.query_pairs() {
            let slot = match key.as_ref() {
                "code" => &mut params.code,
                "state" => &mut params.state,
                "error" => &mut params.error,
                "error_description" => &mut params.error_description,
                _ => continue,
            };
            *slot = Some(value.into_owned());
        }
        Ok(params)
    }
}

/// An authorization code ready to exchange for tokens.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthorizationCode {
    pub provider: OAuthProvider,
    pub code: String,
    pub state: String,
}

/// Validate a callback against the pending login and consume it.
///
/// Stored state, nonce, and code are cleared on every path once a pending
/// login is found, so a replayed callback fails with `NoPendingLogin`.
///
/// # Errors
///
/// Returns [`OAuthError::Denied`], [`OAuthError::StateMismatch`],
/// [`OAuthError::MissingParam`], or [`OAuthError::NoPendingLogin`].
pub fn complete<S: KeyValueStore + ?Sized>(
    store: &S,
    provider: OAuthProvider,
    params: CallbackParams,
) -> Result<AuthorizationCode, OAuthError> {
    let state_key = provider.state_key();
    let Some(expected) = store.get_item(&state_key)? else {
        return Err(OAuthError::NoPendingLogin(provider.as_str()));
    };
    store.remove_item(&state_key)?;
    store.remove_item(&provider.nonce_key())?;
    store.remove_item(OAUTH_CODE_KEY)?;

    if let Some(error) = params.error {
        let detail = params.error_description.map_or(error.clone(), |d| format!("{error}: {d}"));
        warn!(provider = provider.as_str(), %detail, "oauth login denied");
        return Err(OAuthError::Denied(detail));
    }
    let state = params.state.ok_or(OAuthError::MissingParam("state"))?;
    if state != expected {
        warn!(provider = provider.as_str(), "oauth state mismatch");
        return Err(OAuthError::StateMismatch);
    }
    let code = params.code.ok_or(OAuthError::MissingParam("code"))?;

    info!(provider = provider.as_str(), "oauth callback accepted");
    Ok(AuthorizationCode { provider, code, state })
}

// =============================================================================
// CALLBACK CHANNEL
// =============================================================================

/// Popup side: delivers the callback once.
#[derive(Debug)]
pub struct CallbackSender {
    tx: Mutex<Option<oneshot::Sender<CallbackParams>>>,
}

/// Opener side: awaits the callback once.
#[derive(Debug)]
pub struct CallbackReceiver {
    rx: oneshot::Receiver<CallbackParams>,
}

/// Channel for one login attempt.
#[must_use]
pub fn callback_channel() -> (CallbackSender, CallbackReceiver) {
    let (tx, rx) = oneshot::channel();
    (CallbackSender { tx: Mutex::new(Some(tx)) }, CallbackReceiver { rx })
}

impl CallbackSender {
    /// Deliver the callback.
    ///
    /// # Errors
    ///
    /// Returns [`OAuthError::AlreadyResolved`] on a second call, or
    /// [`OAuthError::Cancelled`] if the opener stopped waiting.
    pub fn send(&self, params: CallbackParams) -> Result<(), OAuthError> {
        let tx = self
            .tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(OAuthError::AlreadyResolved)?;
        tx.send(params).map_err(|_| OAuthError::Cancelled)
    }
}

impl CallbackReceiver {
    /// Wait up to `timeout` for the callback.
    ///
    /// # Errors
    ///
    /// Returns [`OAuthError::Timeout`], or [`OAuthError::Cancelled`] when the
    /// sender was dropped without delivering.
    pub async fn wait(self, timeout: Duration) -> Result<CallbackParams, OAuthError> {
        match tokio::time::timeout(timeout, self.rx).await {
            Ok(Ok(params)) => Ok(params),
            Ok(Err(_)) => Err(OAuthError::Cancelled),
            Err(_) => Err(OAuthError::Timeout),
        }
    }
}
