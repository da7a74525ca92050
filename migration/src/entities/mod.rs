pub mod ip_country_cache;

pub use ip_country_cache::Entity as IpCountryCacheEntity;
