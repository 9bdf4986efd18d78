//! 股票数据存储
//!
//! 板块 / 行业 / 股票三级数据的持久化接口，提供两种实现：
//! - [`MemoryStockRepository`]：进程内存储，可从 JSON 种子文件加载
//! - [`PgStockRepository`]：PostgreSQL 存储

mod memory;
mod postgres;

use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::models::{FieldErrors, Industry, Sector, Stock, StockInput, StockSummary};

pub use memory::MemoryStockRepository;
pub use postgres::PgStockRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,

    #[error("validation failed: {0:?}")]
    Validation(FieldErrors),

    #[error("database error: {0}")]
    Database(String),
}

impl RepositoryError {
    /// 单字段校验错误
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), vec![message.into()]);
        Self::Validation(errors)
    }
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

pub(crate) fn duplicate_message(model: &str, field: &str) -> String {
    format!("{} with this {} already exists.", model, field)
}

pub(crate) fn missing_pk_message(id: i64) -> String {
    format!("Invalid pk \"{}\" - object does not exist.", id)
}

#[async_trait]
pub trait StockRepository: Send + Sync {
    /// 全部股票，按 id 升序
    async fn list_stocks(&self) -> RepositoryResult<Vec<Stock>>;

    async fn get_stock(&self, id: i64) -> RepositoryResult<Stock>;

    async fn create_stock(&self, input: &StockInput) -> RepositoryResult<Stock>;

    /// 整体更新，字段规则与创建一致
    async fn update_stock(&self, id: i64, input: &StockInput) -> RepositoryResult<Stock>;

    async fn delete_stock(&self, id: i64) -> RepositoryResult<()>;

    /// 名称或代码包含 `query`（不区分大小写）的股票
    async fn search_stocks(&self, query: &str) -> RepositoryResult<Vec<StockSummary>>;

    async fn create_sector(&self, name: &str) -> RepositoryResult<Sector>;

    async fn create_industry(&self, name: &str, sector: i64) -> RepositoryResult<Industry>;
}

/// 种子数据，行业与股票通过名称引用上级
#[derive(Debug, Deserialize, Default)]
pub struct SeedData {
    #[serde(default)]
    pub sectors: Vec<String>,
    #[serde(default)]
    pub industries: Vec<SeedIndustry>,
    #[serde(default)]
    pub stocks: Vec<SeedStock>,
}

#[derive(Debug, Deserialize)]
pub struct SeedIndustry {
    pub name: String,
    pub sector: String,
}

#[derive(Debug, Deserialize)]
pub struct SeedStock {
    pub symbol: String,
    pub name: String,
    pub industry: String,
    pub current_price: f64,
    #[serde(default)]
    pub market_cap: Option<f64>,
    #[serde(default)]
    pub pe_ratio: Option<f64>,
    #[serde(default)]
    pub dividend_yield: Option<f64>,
}

impl SeedData {
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// 写入种子数据，返回写入的股票数量
pub async fn apply_seed(repo: &dyn StockRepository, seed: &SeedData) -> anyhow::Result<usize> {
    let mut sectors = std::collections::HashMap::new();
    for name in &seed.sectors {
        let sector = repo.create_sector(name).await?;
        sectors.insert(sector.name.clone(), sector.id);
    }

    let mut industries = std::collections::HashMap::new();
    for industry in &seed.industries {
        let sector_id = sectors
            .get(&industry.sector)
            .copied()
            .ok_or_else(|| anyhow::anyhow!("行业 {} 引用了未知板块 {}", industry.name, industry.sector))?;
        let created = repo.create_industry(&industry.name, sector_id).await?;
        industries.insert(created.name.clone(), created.id);
    }

    for stock in &seed.stocks {
        let industry_id = industries
            .get(&stock.industry)
            .copied()
            .ok_or_else(|| anyhow::anyhow!("股票 {} 引用了未知行业 {}", stock.symbol, stock.industry))?;
        let input = StockInput {
            symbol: Some(stock.symbol.clone()),
            name: Some(stock.name.clone()),
            industry: Some(industry_id),
            market_cap: stock.market_cap,
            current_price: Some(stock.current_price),
            pe_ratio: stock.pe_ratio,
            dividend_yield: stock.dividend_yield,
        };
        repo.create_stock(&input).await?;
    }

    Ok(seed.stocks.len())
}
