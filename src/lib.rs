//! GeoProxy - IP to country lookup proxy
//!
//! Answers "which country is my IP in?" by consulting a cache and, on a miss,
//! one of several third-party GeoIP services. Each upstream service has its
//! own token bucket; the dispatcher fails over round-robin to the next service
//! with credit left.
//!
//! # Architecture
//! - `dispatch`: token buckets and the failover dispatcher
//! - `services`: upstream lookup services and the cache-then-lookup flow
//! - `cache`: memory / redis / database result caches
//! - `api`: HTTP handlers
//! - `config`: configuration loading and validation
//! - `runtime`: startup, server mode, shutdown
//! - `system`: logging

pub mod api;
pub mod cache;
pub mod cli;
pub mod config;
pub mod dispatch;
pub mod errors;
pub mod runtime;
pub mod services;
pub mod system;
pub mod utils;
