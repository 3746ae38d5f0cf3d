//! Backend API access
//!
//! The collections backend is an external JSON-over-HTTP service. This module
//! wraps the HTTP plumbing and classifies failures.
//!
//! - [`client`] - reqwest wrapper issuing GET/POST/PUT/DELETE with JSON bodies
//! - [`error`] - network / HTTP status / decode failure taxonomy

pub mod client;
pub mod error;

pub use client::{ApiClient, DEFAULT_TIMEOUT};
pub use error::ApiError;
