//! Network access to the dashboard backend.

pub mod api;

pub use api::{ApiClient, ApiEnvelope, ApiError};
