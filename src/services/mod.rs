//! 业务逻辑服务模块
//!
//! 缓存层与两个网关：股票搜索、行情指标

pub mod cache;   // 缓存存储与查询包装
pub mod error;   // 网关错误
pub mod metrics; // 行情指标网关
pub mod search;  // 股票搜索网关
