//! Core types and trait definitions for the LegalWard client.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! remote conflict-detection service and the local key/value storage are
//! reached through the [`service::DiscoveryService`] and
//! [`recent::LocalStorage`] traits; everything else here is pure
//! transformation of the data they return.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod dashboard;
pub mod discovery;
pub mod error;
pub mod lifecycle;
pub mod recent;
pub mod service;
pub mod session;
pub mod tier;
pub mod timeline;

mod timestamp;

pub use error::{Error, Result};
