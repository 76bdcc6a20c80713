//! Best-effort JWT payload decoding and the clock used to judge expiry.
//!
//! Tokens are decoded, never verified: the server checks signatures. The
//! client only needs display attributes and the `exp` claim.

#[cfg(test)]
#[path = "token_test.rs"]
mod tests;

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Claims the dashboard reads from an access token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,
    #[serde(default)]
    pub iat: Option<i64>,
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// Login method: `local`, `google`, `naver`, or `kakao`.
    #[serde(default)]
    pub provider: Option<String>,
}

impl Claims {
    /// Seconds left before expiry at `now`, zero once expired.
    #[must_use]
    pub fn remaining_secs(&self, now: i64) -> u64 {
        u64::try_from(self.exp.saturating_sub(now)).unwrap_or(0)
    }

    #[must_use]
    pub fn is_expired(&self, now: i64) -> bool {
        self.remaining_secs(now) == 0
    }

    /// Name to show in the header: nickname, then username, then subject.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.nickname
            .as_deref()
            .or(self.username.as_deref())
            .or(self.sub.as_deref())
    }
}

/// Decode the payload segment of a JWT. Malformed tokens yield `None`.
#[must_use]
pub fn decode_claims(token: &str) -> Option<Claims> {
    let mut segments = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) =
        (segments.next(), segments.next(), segments.next(), segments.next())
    else {
        debug!("token decode failed: expected three segments");
        return None;
    };

    let bytes = match URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')) {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!(error = %e, "token decode failed: payload is not base64url");
            return None;
        }
    };
    match serde_json::from_slice(&bytes) {
        Ok(claims) => Some(claims),
        Err(e) => {
            debug!(error = %e, "token decode failed: payload is not a claims object");
            None
        }
    }
}

// =============================================================================
// CLOCKS
// =============================================================================

/// Wall-clock source in Unix seconds.
pub trait Clock: Send + Sync {
    fn now_unix(&self) -> i64;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now_unix(&self) -> i64 {
        (**self).now_unix()
    }
}

/// Wall clock that advances with the tokio timer.
///
/// Anchored to a Unix time at construction and then driven by
/// `tokio::time::Instant`, so paused-time tests see it move.
#[derive(Clone, Copy, Debug)]
pub struct TimerClock {
    anchor_unix: i64,
    anchor: tokio::time::Instant,
}

impl TimerClock {
    #[must_use]
    pub fn anchored(anchor_unix: i64) -> Self {
        Self { anchor_unix, anchor: tokio::time::Instant::now() }
    }
}

impl Clock for TimerClock {
    fn now_unix(&self) -> i64 {
        let elapsed = i64::try_from(self.anchor.elapsed().as_secs()).unwrap_or(i64::MAX);
        self.anchor_unix.saturating_add(elapsed)
    }
}

/// Build an unsigned token carrying `payload` as its claims.
#[cfg(test)]
pub(crate) fn unsigned_token(payload: &serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
    let body = URL_SAFE_NO_PAD.encode(payload.to_string());
    format!("{header}.{body}.sig")
}
