//! 本地股票库搜索

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::SearchProvider;
use crate::models::StockSearchResult;
use crate::repository::StockRepository;

/// 在本地股票库中按名称或代码做不区分大小写的子串匹配
pub struct LocalIndexSearch {
    repo: Arc<dyn StockRepository>,
}

impl LocalIndexSearch {
    pub fn new(repo: Arc<dyn StockRepository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl SearchProvider for LocalIndexSearch {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn search(&self, query: &str) -> anyhow::Result<Value> {
        let symbols = self.repo.search_stocks(query).await?;
        log::debug!("本地搜索 {} 命中 {} 条", query, symbols.len());
        Ok(serde_json::to_value(StockSearchResult { symbols })?)
    }
}
