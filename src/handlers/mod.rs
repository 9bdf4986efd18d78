pub mod app_config;
pub mod health;
pub mod metrics;
pub mod search;
pub mod stock;

use actix_web::{error, web, HttpResponse};

use crate::models::{ErrorResponse, STOCK_NOT_FOUND_ERROR};
use crate::repository::RepositoryError;
use crate::services::error::GatewayError;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .configure(health::config)
        .configure(metrics::config)
        .configure(search::config)
        .configure(stock::config)
        .configure(app_config::config);
}

/// 请求体 JSON 解析失败时返回 400 和错误描述
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let response = HttpResponse::BadRequest().json(ErrorResponse::new(err.to_string()));
        error::InternalError::from_response(err, response).into()
    })
}

/// 网关错误 → HTTP 响应
pub fn gateway_error_response(err: GatewayError) -> HttpResponse {
    match err {
        GatewayError::MissingQuery => HttpResponse::BadRequest().json(ErrorResponse::new(err.to_string())),
        GatewayError::Upstream(message) => {
            HttpResponse::InternalServerError().json(ErrorResponse::new(message))
        }
    }
}

/// 存储错误 → HTTP 响应
pub fn repository_error_response(err: RepositoryError) -> HttpResponse {
    match err {
        RepositoryError::NotFound => {
            HttpResponse::NotFound().json(ErrorResponse::new(STOCK_NOT_FOUND_ERROR))
        }
        RepositoryError::Validation(errors) => HttpResponse::BadRequest().json(errors),
        RepositoryError::Database(message) => {
            log::error!("数据库错误: {}", message);
            HttpResponse::InternalServerError().json(ErrorResponse::new(message))
        }
    }
}

/// 处理器测试共用的假数据源与状态
#[cfg(test)]
pub mod test_support {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use serde_json::{json, Value};

    use crate::config::AppConfig;
    use crate::models::{PriceBar, PriceHistory, StockInput};
    use crate::repository::{MemoryStockRepository, StockRepository};
    use crate::services::cache::CacheStore;
    use crate::services::metrics::MarketDataProvider;
    use crate::services::search::SearchProvider;
    use crate::state::AppState;

    #[derive(Default)]
    pub struct FakeSearch {
        pub calls: AtomicUsize,
        pub fail: bool,
    }

    #[async_trait]
    impl SearchProvider for FakeSearch {
        fn name(&self) -> &'static str {
            "fake"
        }

        async fn search(&self, query: &str) -> anyhow::Result<Value> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("upstream timed out");
            }
            Ok(json!({"symbols": [{"symbol_info": format!("{} Ltd", query), "symbol": query.to_uppercase()}]}))
        }
    }

    #[derive(Default)]
    pub struct FakeMarketData {
        pub calls: AtomicUsize,
    }

    #[async_trait]
    impl MarketDataProvider for FakeMarketData {
        async fn fetch_history(&self, symbol: &str) -> anyhow::Result<PriceHistory> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if symbol.starts_with("BOGUS") {
                anyhow::bail!("404 Not Found");
            }
            let bar = |day: u32, close: f64, high: f64| PriceBar {
                timestamp: Utc.with_ymd_and_hms(2024, 3, day, 0, 0, 0).unwrap(),
                open: close,
                high,
                low: close,
                close,
                volume: 10,
            };
            Ok(PriceHistory {
                long_name: Some(format!("{} Limited", symbol.trim_end_matches(".NS"))),
                bars: vec![bar(1, 10.0, 12.0), bar(2, 15.0, 20.0)],
            })
        }
    }

    pub struct TestContext {
        pub state: actix_web::web::Data<AppState>,
        pub search: Arc<FakeSearch>,
        pub market: Arc<FakeMarketData>,
        pub industry: i64,
    }

    /// 内存存储中预置一个板块与行业
    pub async fn context(search: FakeSearch) -> TestContext {
        let repo = Arc::new(MemoryStockRepository::new());
        let sector = repo.create_sector("Technology").await.unwrap();
        let industry = repo.create_industry("IT Services", sector.id).await.unwrap();

        let search = Arc::new(search);
        let market = Arc::new(FakeMarketData::default());
        let state = AppState::new(
            &AppConfig::default(),
            CacheStore::new(),
            repo,
            search.clone(),
            market.clone(),
        );

        TestContext {
            state: actix_web::web::Data::new(state),
            search,
            market,
            industry: industry.id,
        }
    }

    pub fn stock_input(symbol: &str, name: &str, industry: i64) -> StockInput {
        StockInput {
            symbol: Some(symbol.to_string()),
            name: Some(name.to_string()),
            industry: Some(industry),
            current_price: Some(100.0),
            ..Default::default()
        }
    }
}
