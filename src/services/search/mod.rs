//! 股票搜索网关
//!
//! 将自由文本查询解析为 `{"symbols": [...]}`。数据来源有两种策略，
//! 由配置选择：
//! - [`LocalIndexSearch`]：查询本地股票库
//! - [`UpstreamSearch`]：代理上游搜索接口，原样返回其 JSON

mod local;
mod upstream;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::services::cache::{CacheStore, CachedLookup};
use crate::services::error::GatewayError;

pub use local::LocalIndexSearch;
pub use upstream::UpstreamSearch;

/// 缓存键前缀
const CACHE_NAME: &str = "get_stocks_list";

#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// 策略名称，用于日志
    fn name(&self) -> &'static str;

    async fn search(&self, query: &str) -> anyhow::Result<Value>;
}

fn query_key(query: &String) -> String {
    query.clone()
}

pub struct StockSearchGateway {
    provider: Arc<dyn SearchProvider>,
    lookup: CachedLookup<String, Value>,
}

impl StockSearchGateway {
    pub fn new(provider: Arc<dyn SearchProvider>, cache: CacheStore, ttl: std::time::Duration) -> Self {
        Self {
            provider,
            lookup: CachedLookup::new(CACHE_NAME, query_key, ttl, cache),
        }
    }

    /// 搜索股票，空查询直接返回 `MissingQuery`，不访问数据源
    pub async fn search(&self, query: &str) -> Result<Value, GatewayError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(GatewayError::MissingQuery);
        }

        let provider = self.provider.clone();
        self.lookup
            .call(query.to_string(), |q| async move {
                provider.search(&q).await.map_err(|e| {
                    log::warn!("股票搜索失败 [{}] {}: {:#}", provider.name(), q, e);
                    GatewayError::upstream(format!("{:#}", e))
                })
            })
            .await
    }
}
