pub mod ip;

pub use ip::{TrustedProxies, extract_client_ip};
