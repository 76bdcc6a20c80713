//! Auth-session state machine for the current user.
//!
//! DESIGN
//! ======
//! Two states: `Anonymous` and `Authenticated`. A session only becomes
//! authenticated when its access token decodes and is not yet expired, so an
//! `Authenticated` value always carries usable claims. Expiry is judged
//! against a caller-supplied `now` (Unix seconds) to keep this type pure.

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::token::{Claims, decode_claims};

/// Opaque access/refresh token pair issued by the server.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Result of one auth state operation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AuthTransition {
    #[default]
    Unchanged,
    LoggedIn,
    /// Tokens were offered but were malformed or already expired.
    Rejected,
    LoggedOut,
    Expired,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum AuthState {
    #[default]
    Anonymous,
    Authenticated { tokens: TokenPair, claims: Claims },
}

impl AuthState {
    /// Rebuild a session from persisted tokens; unusable tokens yield `Anonymous`.
    #[must_use]
    pub fn restore(tokens: Option<TokenPair>, now: i64) -> Self {
        let mut state = Self::Anonymous;
        if let Some(tokens) = tokens {
            state.login(tokens, now);
        }
        state
    }

    /// Enter `Authenticated` with `tokens` after login, signup, or OAuth exchange.
    pub fn login(&mut self, tokens: TokenPair, now: i64) -> AuthTransition {
        let Some(claims) = decode_claims(&tokens.access_token) else {
            warn!("login rejected: access token could not be decoded");
            *self = Self::Anonymous;
            return AuthTransition::Rejected;
        };
        if claims.is_expired(now) {
            warn!(exp = claims.exp, now, "login rejected: access token already expired");
            *self = Self::Anonymous;
            return AuthTransition::Rejected;
        }
        info!(user = claims.display_name().unwrap_or("?"), exp = claims.exp, "session authenticated");
        *self = Self::Authenticated { tokens, claims };
        AuthTransition::LoggedIn
    }

    /// Drop the session (logout or account deletion).
    pub fn logout(&mut self) -> AuthTransition {
        match std::mem::take(self) {
            Self::Anonymous => AuthTransition::Unchanged,
            Self::Authenticated { claims, .. } => {
                info!(user = claims.display_name().unwrap_or("?"), "session ended");
                AuthTransition::LoggedOut
            }
        }
    }

    /// Fall back to `Anonymous` once the access token has expired.
    pub fn check_expiry(&mut self, now: i64) -> AuthTransition {
        let expired = matches!(self, Self::Authenticated { claims, .. } if claims.is_expired(now));
        if !expired {
            return AuthTransition::Unchanged;
        }
        *self = Self::Anonymous;
        info!(now, "session expired");
        AuthTransition::Expired
    }

    /// Time left on the access token, `None` when anonymous.
    #[must_use]
    pub fn remaining(&self, now: i64) -> Option<Duration> {
        self.claims()
            .map(|claims| Duration::from_secs(claims.remaining_secs(now)))
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }

    #[must_use]
    pub fn tokens(&self) -> Option<&TokenPair> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated { tokens, .. } => Some(tokens),
        }
    }

    #[must_use]
    pub fn claims(&self) -> Option<&Claims> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated { claims, .. } => Some(claims),
        }
    }

    #[must_use]
    pub fn access_token(&self) -> Option<&str> {
        self.tokens().map(|t| t.access_token.as_str())
    }
}
