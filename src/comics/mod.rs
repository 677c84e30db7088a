//! Comic module.
//!
//! This module handles:
//! - Comic record and request range types
//! - The metadata source client
//! - Title ordering
//! - The fetch-filter-sort pipeline

pub mod aggregator;
pub mod client;
pub mod sort;
pub mod types;

pub use aggregator::collect_comics;
pub use client::{ComicClient, DEFAULT_UPSTREAM_URL};
pub use sort::{sort_comics, sort_key};
pub use types::{Comic, ComicRange};
