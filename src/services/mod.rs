//! 业务服务层
//!
//! - `lookup`: 上游服务描述与 HTTP 查询
//! - `country`: 缓存 + 调度 + 查询的完整流程

pub mod country;
pub mod lookup;

pub use country::{CountryLookup, CountryService, LookupSource};
pub use lookup::{CountryFetcher, HttpFetcher, IP_PLACEHOLDER, LookupService, extract_string};
