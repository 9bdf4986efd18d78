//! 网关错误
//!
//! 数据源的异常在网关边界统一转换为该类型，不会继续向外抛出

use thiserror::Error;

use crate::models::MISSING_QUERY_ERROR;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GatewayError {
    /// 查询参数为空
    #[error("{}", MISSING_QUERY_ERROR)]
    MissingQuery,

    /// 上游请求失败（网络、超时、解析）
    #[error("{0}")]
    Upstream(String),
}

impl GatewayError {
    pub fn upstream(err: impl std::fmt::Display) -> Self {
        Self::Upstream(err.to_string())
    }
}
