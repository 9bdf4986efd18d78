//! 内存存储实现
//!
//! 未配置数据库时使用，数据随进程退出丢失

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;

use super::{
    duplicate_message, missing_pk_message, RepositoryError, RepositoryResult, StockRepository,
};
use crate::models::{Industry, NewStock, Sector, Stock, StockInput, StockSummary};

#[derive(Debug, Default)]
struct Tables {
    sectors: BTreeMap<i64, Sector>,
    industries: BTreeMap<i64, Industry>,
    stocks: BTreeMap<i64, Stock>,
    last_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    /// 唯一性与外键校验，`current` 为正在更新的记录 id
    fn check_stock(&self, stock: &NewStock, current: Option<i64>) -> RepositoryResult<()> {
        let duplicate = self
            .stocks
            .values()
            .any(|s| s.symbol == stock.symbol && Some(s.id) != current);
        if duplicate {
            return Err(RepositoryError::field("symbol", duplicate_message("stock", "symbol")));
        }
        if !self.industries.contains_key(&stock.industry) {
            return Err(RepositoryError::field("industry", missing_pk_message(stock.industry)));
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryStockRepository {
    tables: RwLock<Tables>,
}

impl MemoryStockRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl StockRepository for MemoryStockRepository {
    async fn list_stocks(&self) -> RepositoryResult<Vec<Stock>> {
        Ok(self.read().stocks.values().cloned().collect())
    }

    async fn get_stock(&self, id: i64) -> RepositoryResult<Stock> {
        self.read()
            .stocks
            .get(&id)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn create_stock(&self, input: &StockInput) -> RepositoryResult<Stock> {
        let new_stock = input.validate().map_err(RepositoryError::Validation)?;
        let mut tables = self.write();
        tables.check_stock(&new_stock, None)?;

        let stock = new_stock.into_stock(tables.next_id());
        tables.stocks.insert(stock.id, stock.clone());
        Ok(stock)
    }

    async fn update_stock(&self, id: i64, input: &StockInput) -> RepositoryResult<Stock> {
        let mut tables = self.write();
        if !tables.stocks.contains_key(&id) {
            return Err(RepositoryError::NotFound);
        }

        let new_stock = input.validate().map_err(RepositoryError::Validation)?;
        tables.check_stock(&new_stock, Some(id))?;

        let stock = new_stock.into_stock(id);
        tables.stocks.insert(id, stock.clone());
        Ok(stock)
    }

    async fn delete_stock(&self, id: i64) -> RepositoryResult<()> {
        self.write()
            .stocks
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    async fn search_stocks(&self, query: &str) -> RepositoryResult<Vec<StockSummary>> {
        let needle = query.to_lowercase();
        Ok(self
            .read()
            .stocks
            .values()
            .filter(|s| {
                s.name.to_lowercase().contains(&needle) || s.symbol.to_lowercase().contains(&needle)
            })
            .map(|s| StockSummary::from_record(&s.name, &s.symbol))
            .collect())
    }

    async fn create_sector(&self, name: &str) -> RepositoryResult<Sector> {
        let mut tables = self.write();
        if tables.sectors.values().any(|s| s.name == name) {
            return Err(RepositoryError::field("name", duplicate_message("sector", "name")));
        }
        let sector = Sector {
            id: tables.next_id(),
            name: name.to_string(),
        };
        tables.sectors.insert(sector.id, sector.clone());
        Ok(sector)
    }

    async fn create_industry(&self, name: &str, sector: i64) -> RepositoryResult<Industry> {
        let mut tables = self.write();
        if tables.industries.values().any(|i| i.name == name) {
            return Err(RepositoryError::field("name", duplicate_message("industry", "name")));
        }
        if !tables.sectors.contains_key(&sector) {
            return Err(RepositoryError::field("sector", missing_pk_message(sector)));
        }
        let industry = Industry {
            id: tables.next_id(),
            name: name.to_string(),
            sector,
        };
        tables.industries.insert(industry.id, industry.clone());
        Ok(industry)
    }
}
