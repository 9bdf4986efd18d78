//! PostgreSQL 存储实现
//!
//! 表结构见 `migrations/`，NUMERIC 列在查询时转换为 float8

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use sqlx::FromRow;

use super::{
    duplicate_message, missing_pk_message, RepositoryError, RepositoryResult, StockRepository,
};
use crate::config::DatabaseConfig;
use crate::models::{Industry, NewStock, Sector, Stock, StockInput, StockSummary};

const STOCK_COLUMNS: &str = "id, symbol, name, industry_id, \
     market_cap::float8 AS market_cap, current_price::float8 AS current_price, \
     pe_ratio, dividend_yield";

#[derive(Debug, FromRow)]
struct StockRow {
    id: i64,
    symbol: String,
    name: String,
    industry_id: i64,
    market_cap: Option<f64>,
    current_price: f64,
    pe_ratio: Option<f64>,
    dividend_yield: Option<f64>,
}

impl From<StockRow> for Stock {
    fn from(row: StockRow) -> Self {
        Stock {
            id: row.id,
            symbol: row.symbol,
            name: row.name,
            industry: row.industry_id,
            market_cap: row.market_cap,
            current_price: row.current_price,
            pe_ratio: row.pe_ratio,
            dividend_yield: row.dividend_yield,
        }
    }
}

fn db_error(err: sqlx::Error) -> RepositoryError {
    RepositoryError::Database(err.to_string())
}

/// 将唯一约束冲突转换为字段错误，其余错误原样上报
fn constraint_error(err: sqlx::Error, model: &str, field: &str) -> RepositoryError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return RepositoryError::field(field, duplicate_message(model, field));
        }
    }
    db_error(err)
}

/// 转义 LIKE 通配符
fn like_pattern(query: &str) -> String {
    let escaped = query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

pub struct PgStockRepository {
    pool: PgPool,
}

impl PgStockRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 建立连接池并执行迁移
    pub async fn connect(config: &DatabaseConfig) -> anyhow::Result<Self> {
        let options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.name);

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        log::info!("已连接数据库 {}@{}:{}/{}", config.user, config.host, config.port, config.name);

        Ok(Self::new(pool))
    }

    async fn industry_exists(&self, id: i64) -> RepositoryResult<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM industries WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)
    }

    async fn check_industry(&self, stock: &NewStock) -> RepositoryResult<()> {
        if self.industry_exists(stock.industry).await? {
            Ok(())
        } else {
            Err(RepositoryError::field("industry", missing_pk_message(stock.industry)))
        }
    }
}

#[async_trait]
impl StockRepository for PgStockRepository {
    async fn list_stocks(&self) -> RepositoryResult<Vec<Stock>> {
        let sql = format!("SELECT {} FROM stocks ORDER BY id", STOCK_COLUMNS);
        let rows = sqlx::query_as::<_, StockRow>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(rows.into_iter().map(Stock::from).collect())
    }

    async fn get_stock(&self, id: i64) -> RepositoryResult<Stock> {
        let sql = format!("SELECT {} FROM stocks WHERE id = $1", STOCK_COLUMNS);
        sqlx::query_as::<_, StockRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?
            .map(Stock::from)
            .ok_or(RepositoryError::NotFound)
    }

    async fn create_stock(&self, input: &StockInput) -> RepositoryResult<Stock> {
        let stock = input.validate().map_err(RepositoryError::Validation)?;
        self.check_industry(&stock).await?;

        let sql = format!(
            "INSERT INTO stocks (symbol, name, industry_id, market_cap, current_price, pe_ratio, dividend_yield) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
            STOCK_COLUMNS
        );
        let row = sqlx::query_as::<_, StockRow>(&sql)
            .bind(&stock.symbol)
            .bind(&stock.name)
            .bind(stock.industry)
            .bind(stock.market_cap)
            .bind(stock.current_price)
            .bind(stock.pe_ratio)
            .bind(stock.dividend_yield)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| constraint_error(e, "stock", "symbol"))?;
        Ok(row.into())
    }

    async fn update_stock(&self, id: i64, input: &StockInput) -> RepositoryResult<Stock> {
        // 先确认记录存在，不存在时返回 404 而不是校验错误
        self.get_stock(id).await?;

        let stock = input.validate().map_err(RepositoryError::Validation)?;
        self.check_industry(&stock).await?;

        let sql = format!(
            "UPDATE stocks SET symbol = $1, name = $2, industry_id = $3, market_cap = $4, \
             current_price = $5, pe_ratio = $6, dividend_yield = $7 WHERE id = $8 RETURNING {}",
            STOCK_COLUMNS
        );
        sqlx::query_as::<_, StockRow>(&sql)
            .bind(&stock.symbol)
            .bind(&stock.name)
            .bind(stock.industry)
            .bind(stock.market_cap)
            .bind(stock.current_price)
            .bind(stock.pe_ratio)
            .bind(stock.dividend_yield)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| constraint_error(e, "stock", "symbol"))?
            .map(Stock::from)
            .ok_or(RepositoryError::NotFound)
    }

    async fn delete_stock(&self, id: i64) -> RepositoryResult<()> {
        let result = sqlx::query("DELETE FROM stocks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn search_stocks(&self, query: &str) -> RepositoryResult<Vec<StockSummary>> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            "SELECT name, symbol FROM stocks WHERE name ILIKE $1 OR symbol ILIKE $1 ORDER BY id",
        )
        .bind(like_pattern(query))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(rows
            .iter()
            .map(|(name, symbol)| StockSummary::from_record(name, symbol))
            .collect())
    }

    async fn create_sector(&self, name: &str) -> RepositoryResult<Sector> {
        let (id, name): (i64, String) =
            sqlx::query_as("INSERT INTO sectors (name) VALUES ($1) RETURNING id, name")
                .bind(name)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| constraint_error(e, "sector", "name"))?;
        Ok(Sector { id, name })
    }

    async fn create_industry(&self, name: &str, sector: i64) -> RepositoryResult<Industry> {
        let sector_exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM sectors WHERE id = $1)")
                .bind(sector)
                .fetch_one(&self.pool)
                .await
                .map_err(db_error)?;
        if !sector_exists {
            return Err(RepositoryError::field("sector", missing_pk_message(sector)));
        }

        let (id, name, sector): (i64, String, i64) = sqlx::query_as(
            "INSERT INTO industries (name, sector_id) VALUES ($1, $2) RETURNING id, name, sector_id",
        )
        .bind(name)
        .bind(sector)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| constraint_error(e, "industry", "name"))?;
        Ok(Industry { id, name, sector })
    }
}
