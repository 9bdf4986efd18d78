//! 通用 API 响应模型
//!
//! 业务接口直接返回领域数据，错误统一为 `{"error": "..."}`

use serde::{Deserialize, Serialize};

/// 缺少查询参数时的错误信息
pub const MISSING_QUERY_ERROR: &str = "Query parameter is missing";
/// 股票不存在时的错误信息
pub const STOCK_NOT_FOUND_ERROR: &str = "Stock not found";

/// 错误响应
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

/// 健康检查响应
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    /// 当前缓存条目数（含已过期未清理的条目）
    pub cache_entries: usize,
    /// 响应时间戳（RFC 3339）
    pub timestamp: String,
}

/// 前端所需的公开配置
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PublicConfig {
    #[serde(rename = "APP_BASE_URL")]
    pub app_base_url: String,
}
