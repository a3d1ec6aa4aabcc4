//! HTTP client for the LegalWard conflict-detection service.
//!
//! [`ApiClient`] implements [`legalward_core::service::DiscoveryService`]
//! over the service's JSON REST API and talks to the headless session
//! endpoint. Session cookies are kept in the client's cookie jar, so one
//! client should be shared for the lifetime of a login.

mod client;
mod session;

pub mod error;

pub use client::{ApiClient, ApiConfig};
pub use error::{Error, Result};
