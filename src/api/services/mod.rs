pub mod health;
pub mod lookup;
pub mod types;

pub use health::{AppStartTime, HealthService, health_routes};
pub use lookup::{LookupHandler, lookup_routes};
pub use types::{ErrorResponse, LookupResponse, error_response};
