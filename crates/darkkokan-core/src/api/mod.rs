//! Network access for section data and cached site resources.
//!
//! This module provides the `Network` seam both subsystems talk through,
//! the reqwest-backed `ApiClient` that implements it against the site's
//! base URL, and the `ApiError` taxonomy shared by every implementation.

pub mod client;
pub mod error;
pub mod network;

pub use client::ApiClient;
pub use error::ApiError;
pub use network::{Network, Request, Response};
