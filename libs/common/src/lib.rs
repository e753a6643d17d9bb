//! Shared library for the authgate services.
//!
//! This crate provides the pieces both the token service and the edge
//! service depend on:
//! - The caller-visible error taxonomy with stable error codes
//! - The narrow key-value cache interface all stateful components use
//! - An in-memory cache backend for deterministic tests
//! - A Redis cache backend for production deployments

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cache;
pub mod error;
pub mod redis_cache;

pub use cache::{CacheStore, MemoryCache};
pub use error::AuthError;
pub use redis_cache::RedisCache;
