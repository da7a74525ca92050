use std::path::Path;
use std::sync::{Arc, OnceLock};

use arc_swap::ArcSwap;

use super::StaticConfig;
use crate::errors::Result;

static CONFIG: OnceLock<ArcSwap<StaticConfig>> = OnceLock::new();

/// Get the global configuration instance
///
/// Returns an Arc pointer to the configuration, which is cheap to clone
/// and doesn't hold any locks. Falls back to in-memory defaults when
/// `init_config` has not run yet.
pub fn get_config() -> Arc<StaticConfig> {
    match CONFIG.get() {
        Some(config) => config.load_full(),
        None => Arc::new(StaticConfig::default()),
    }
}

/// Initialize the global configuration
///
/// Loads configuration from `path` (or the optional `config.toml` in the
/// current directory) and environment variables. Calling it again after a
/// successful initialization keeps the first configuration.
///
/// # Examples
/// ```no_run
/// use geoproxy::config::init_config;
/// let config = init_config(None).expect("invalid configuration");
/// assert!(config.server.port > 0);
/// ```
pub fn init_config(path: Option<&Path>) -> Result<Arc<StaticConfig>> {
    if let Some(config) = CONFIG.get() {
        return Ok(config.load_full());
    }

    let loaded = StaticConfig::load(path)?;
    Ok(CONFIG
        .get_or_init(|| ArcSwap::from_pointee(loaded))
        .load_full())
}
