#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/finhealth/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Session caches for fetched market and fundamental data.
//!
//! - [`InMemoryCache`] - In-process cache with optional TTL expiry
//! - [`NoopCache`] - No-op cache that doesn't store anything

/// In-memory cache implementation.
pub mod memory;
/// No-op cache implementation.
pub mod noop;

pub use finhealth_core::DataCache;

pub use memory::InMemoryCache;
pub use noop::NoopCache;
