//! Utility helpers shared across the dashboard.
//!
//! SYSTEM CONTEXT
//! ==============
//! Form validation and transient banners are presentation-side concerns that
//! several flows (login, signup, board editing) reuse.

pub mod notice;
pub mod validation;
