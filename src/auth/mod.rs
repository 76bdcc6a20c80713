//! Authentication: session state, token decoding, expiry, and OAuth.
//!
//! SYSTEM CONTEXT
//! ==============
//! Token issuance and verification happen on the server. This side only
//! holds the issued tokens, reads display claims out of them, logs the user
//! out when the access token runs out, and shepherds the OAuth redirect.

pub mod expiry;
pub mod oauth;
pub mod session;
pub mod token;

pub use expiry::{AuthStatus, ExpiryWatcher, SharedAuth};
pub use session::{AuthState, AuthTransition, TokenPair};
pub use token::{Claims, Clock, SystemClock, TimerClock, decode_claims};
