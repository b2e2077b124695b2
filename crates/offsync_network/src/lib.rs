//! # OffSync Network
//!
//! Network transport abstraction for the OffSync engine.
//!
//! This crate provides:
//! - [`NetworkAdapter`] - the transport capability the sync manager consumes
//! - [`HttpRequest`] / [`HttpResponse`] - plain-data request/response types
//! - [`MockNetwork`] - a scripted adapter for tests
//!
//! The sync manager never opens its own connections; every outgoing request
//! and every connectivity signal goes through a [`NetworkAdapter`]. This
//! keeps the engine testable and lets host applications plug in whatever
//! HTTP client their platform provides.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod adapter;
mod error;
mod mock;
mod request;

pub use adapter::NetworkAdapter;
pub use error::{NetworkError, NetworkResult};
pub use mock::MockNetwork;
pub use request::{HttpMethod, HttpRequest, HttpResponse};
