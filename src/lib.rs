//! StockKid dashboard state core.
//!
//! Screens, panels, and layouts with atomic mutations; a persistence bridge
//! onto a browser-style key/value store; and the auth session lifecycle.

pub mod auth;
pub mod board;
pub mod config;
pub mod context;
pub mod net;
pub mod persist;
pub mod prefs;
pub mod state;
pub mod util;

pub use config::Config;
pub use context::{AppContext, ContextError};
