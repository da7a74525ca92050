//! Application lifecycle
//!
//! - `lifetime`: startup preparation and graceful shutdown
//! - `modes`: execution modes (HTTP server)

pub mod lifetime;
pub mod modes;
