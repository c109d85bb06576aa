//! Caching client for the marketplace REST API.
//!
//! [`api`] issues one HTTP call per backend operation, [`query`] caches
//! results under structured keys and [`hooks`] binds the two together with
//! the invalidation rules of each resource.

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod hooks;
pub mod logging;
pub mod query;
pub mod realtime;

pub use error::ApiError;
pub use hooks::Market;
