//! Comic API service.
//!
//! Serves xkcd comic metadata for a range of comic numbers, keeping only
//! comics published in odd-numbered months and ordering them by title:
//!
//! ```text
//! GET /comics?start=40&end=42
//!   fetch 40, 41, 42 one at a time
//!   keep month 1, 3, 5, 7, 9, 11
//!   sort by title, leading non-letters skipped ("#Hashtag" sorts as "Hashtag")
//! ```
//!
//! # Modules
//!
//! - [`config`]: Configuration schema and layered loading
//! - [`error`]: Unified error types
//! - [`comics`]: Comic types, metadata client and the fetch-filter-sort pipeline
//! - [`api`]: HTTP routes, handlers and middleware
//! - [`logging`]: Tracing subscriber setup
//! - [`metrics`]: Prometheus metrics
//! - [`server`]: Server lifecycle and graceful shutdown
//! - [`utils`]: Utility functions

pub mod api;
pub mod comics;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod server;
pub mod utils;

pub use config::Config;
pub use error::{ApiError, Result, ServiceError};
