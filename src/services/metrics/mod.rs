//! 行情指标网关
//!
//! 拉取股票完整历史日线，计算：
//! - 现价（最近收盘价）
//! - 历史最高价（全部 high 的最大值）
//! - 现价相对最高价的偏离百分比
//!
//! 数据源的任何失败都转换为带 `error` 字段的结果，不会向外抛出

mod yahoo;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::models::{round2, PriceBar, PriceHistory, StockMetrics};
use crate::services::cache::{CacheStore, Cacheable, CachedLookup};
use crate::services::error::GatewayError;

pub use yahoo::YahooChartProvider;

/// 缓存键前缀
const CACHE_NAME: &str = "get_stock_info";
/// 数据源未提供名称时的占位
const UNKNOWN_NAME: &str = "N/A";

#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// 获取带交易所后缀代码的完整历史
    async fn fetch_history(&self, symbol: &str) -> anyhow::Result<PriceHistory>;
}

impl Cacheable for StockMetrics {
    fn is_cacheable(&self) -> bool {
        !self.is_error()
    }
}

/// 偏离百分比格式化
///
/// 保留两位小数并至少带一位小数，如 `-25.0%`、`-23.46%`；
/// 最高价不为正时为 `0%`
pub fn format_percentage(current_price: f64, all_time_high: f64) -> String {
    if all_time_high > 0.0 {
        let pct = (current_price - all_time_high) / all_time_high * 100.0;
        format!("{:?}%", round2(pct))
    } else {
        "0%".to_string()
    }
}

/// 由历史日线计算指标
pub fn compute_metrics(nse_code: &str, stock_name: String, bars: &[PriceBar]) -> StockMetrics {
    let Some(last) = bars.last() else {
        return StockMetrics::no_data(nse_code, stock_name);
    };

    let current_price = last.close;
    let all_time_high = bars
        .iter()
        .map(|bar| bar.high)
        .fold(f64::NEG_INFINITY, f64::max);

    StockMetrics::available(
        nse_code,
        stock_name,
        round2(current_price),
        round2(all_time_high),
        format_percentage(current_price, all_time_high),
    )
}

fn code_key(code: &String) -> String {
    code.clone()
}

pub struct StockMetricsGateway {
    provider: Arc<dyn MarketDataProvider>,
    exchange_suffix: String,
    lookup: CachedLookup<String, StockMetrics>,
}

impl StockMetricsGateway {
    pub fn new(
        provider: Arc<dyn MarketDataProvider>,
        exchange_suffix: impl Into<String>,
        cache: CacheStore,
        ttl: Duration,
    ) -> Self {
        Self {
            provider,
            exchange_suffix: exchange_suffix.into(),
            lookup: CachedLookup::new(CACHE_NAME, code_key, ttl, cache),
        }
    }

    /// 查询单只股票的指标
    ///
    /// 代码为空时返回 `MissingQuery`；数据源失败时返回带 `error` 的结果。
    /// 缓存键和数据源代码使用大写，返回的 `nse_code` 保持调用方的写法
    pub async fn metrics(&self, code: &str) -> Result<StockMetrics, GatewayError> {
        let requested = code.trim();
        if requested.is_empty() {
            return Err(GatewayError::MissingQuery);
        }

        let code = requested.to_uppercase();
        let provider = self.provider.clone();
        let symbol = self.provider_symbol(&code);
        let mut metrics = self
            .lookup
            .call(code, |code| async move {
                let metrics = match provider.fetch_history(&symbol).await {
                    Ok(history) => {
                        let name = history
                            .long_name
                            .filter(|name| !name.trim().is_empty())
                            .unwrap_or_else(|| UNKNOWN_NAME.to_string());
                        compute_metrics(&code, name, &history.bars)
                    }
                    Err(e) => {
                        log::warn!("获取 {} 历史行情失败: {:#}", symbol, e);
                        StockMetrics::invalid(&code)
                    }
                };
                Ok(metrics)
            })
            .await?;
        metrics.nse_code = requested.to_string();
        Ok(metrics)
    }

    /// 数据源使用的代码，已带后缀的不重复追加
    fn provider_symbol(&self, code: &str) -> String {
        let suffix = self.exchange_suffix.to_uppercase();
        if suffix.is_empty() || code.ends_with(&suffix) {
            code.to_string()
        } else {
            format!("{}{}", code, self.exchange_suffix)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{INVALID_CODE_ERROR, NO_DATA_ERROR};
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn bar(day: u32, close: f64, high: f64) -> PriceBar {
        PriceBar {
            timestamp: Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap(),
            open: close,
            high,
            low: close,
            close,
            volume: 1_000,
        }
    }

    enum Reply {
        History(Option<&'static str>, Vec<PriceBar>),
        Fail,
    }

    struct FakeProvider {
        reply: Reply,
        calls: AtomicUsize,
        symbols: Mutex<Vec<String>>,
    }

    impl FakeProvider {
        fn new(reply: Reply) -> Arc<Self> {
            Arc::new(Self {
                reply,
                calls: AtomicUsize::new(0),
                symbols: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl MarketDataProvider for FakeProvider {
        async fn fetch_history(&self, symbol: &str) -> anyhow::Result<PriceHistory> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.symbols.lock().unwrap().push(symbol.to_string());
            match &self.reply {
                Reply::History(name, bars) => Ok(PriceHistory {
                    long_name: name.map(str::to_string),
                    bars: bars.clone(),
                }),
                Reply::Fail => anyhow::bail!("HTTP 404"),
            }
        }
    }

    fn gateway(provider: Arc<FakeProvider>, cache: &CacheStore) -> StockMetricsGateway {
        StockMetricsGateway::new(provider, ".NS", cache.clone(), Duration::from_secs(900))
    }

    #[test]
    fn test_compute_metrics_from_series() {
        let metrics = compute_metrics("TCS", "TCS Ltd".to_string(), &[bar(1, 10.0, 12.0), bar(2, 15.0, 20.0)]);
        assert_eq!(metrics.current_price, Some(15.0));
        assert_eq!(metrics.all_time_high, Some(20.0));
        assert_eq!(metrics.percentage_difference.as_deref(), Some("-25.0%"));
        assert!(metrics.error.is_none());
    }

    #[test]
    fn test_zero_high_does_not_divide() {
        let metrics = compute_metrics("X", "X".to_string(), &[bar(1, 0.0, 0.0)]);
        assert_eq!(metrics.percentage_difference.as_deref(), Some("0%"));
        assert_eq!(metrics.all_time_high, Some(0.0));
    }

    #[test]
    fn test_format_percentage_rounding() {
        assert_eq!(format_percentage(76.544, 100.0), "-23.46%");
        assert_eq!(format_percentage(100.0, 100.0), "0.0%");
        assert_eq!(format_percentage(1234.5678, 1500.0), "-17.7%");
        assert_eq!(format_percentage(5.0, -1.0), "0%");
        // 恰好落在中点时向偶数取整
        assert_eq!(format_percentage(87.875, 100.0), "-12.12%");
    }

    #[test]
    fn test_prices_rounded_to_two_places() {
        let metrics = compute_metrics("X", "X".to_string(), &[bar(1, 3950.256, 4100.999)]);
        assert_eq!(metrics.current_price, Some(3950.26));
        assert_eq!(metrics.all_time_high, Some(4101.0));
    }

    #[tokio::test]
    async fn test_metrics_are_cached_per_code() {
        let provider = FakeProvider::new(Reply::History(
            Some("Tata Consultancy Services Limited"),
            vec![bar(1, 10.0, 12.0), bar(2, 15.0, 20.0)],
        ));
        let cache = CacheStore::new();
        let gw = gateway(provider.clone(), &cache);

        let first = gw.metrics("tcs").await.unwrap();
        let second = gw.metrics(" TCS ").await.unwrap();

        assert_eq!(first.nse_code, "tcs");
        assert_eq!(second.nse_code, "TCS");
        assert_eq!(first.current_price, second.current_price);
        assert_eq!(first.percentage_difference, second.percentage_difference);
        assert_eq!(first.stock_name.as_deref(), Some("Tata Consultancy Services Limited"));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        assert_eq!(provider.symbols.lock().unwrap().as_slice(), ["TCS.NS".to_string()]);
        assert!(cache.get("get_stock_info:TCS").is_some());
    }

    #[tokio::test]
    async fn test_no_data_keeps_name_and_is_not_cached() {
        let provider = FakeProvider::new(Reply::History(None, Vec::new()));
        let cache = CacheStore::new();
        let gw = gateway(provider.clone(), &cache);

        let metrics = gw.metrics("NEWCO").await.unwrap();
        assert_eq!(metrics.stock_name.as_deref(), Some("N/A"));
        assert_eq!(metrics.error.as_deref(), Some(NO_DATA_ERROR));
        assert!(metrics.current_price.is_none());

        gw.metrics("NEWCO").await.unwrap();
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len(), 0);
    }

    #[tokio::test]
    async fn test_provider_failure_becomes_invalid_code() {
        let provider = FakeProvider::new(Reply::Fail);
        let cache = CacheStore::new();
        let gw = gateway(provider.clone(), &cache);

        let metrics = gw.metrics("BOGUS").await.unwrap();
        assert_eq!(metrics, StockMetrics::invalid("BOGUS"));
        assert_eq!(gw.metrics("bogus").await.unwrap().nse_code, "bogus");
        assert_eq!(metrics.error.as_deref(), Some(INVALID_CODE_ERROR));
        assert_eq!(cache.len(), 0);

        let body = serde_json::to_value(&metrics).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"nse_code": "BOGUS", "error": INVALID_CODE_ERROR})
        );
    }

    #[tokio::test]
    async fn test_empty_code_and_suffix_handling() {
        let provider = FakeProvider::new(Reply::History(None, vec![bar(1, 1.0, 1.0)]));
        let cache = CacheStore::new();
        let gw = gateway(provider.clone(), &cache);

        assert_eq!(gw.metrics("  ").await, Err(GatewayError::MissingQuery));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);

        gw.metrics("infy.ns").await.unwrap();
        assert_eq!(provider.symbols.lock().unwrap().as_slice(), ["INFY.NS".to_string()]);
    }
}
