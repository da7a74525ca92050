//! 上游服务调度
//!
//! - `token_bucket`: 单服务令牌桶限流
//! - `dispatcher`: 带游标的轮询故障转移

mod dispatcher;
mod token_bucket;

pub use dispatcher::{ServiceDispatcher, ServiceStatus};
pub use token_bucket::{RatePolicy, TokenBucket};
