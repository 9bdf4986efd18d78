//! Yahoo Finance 历史行情接口
//!
//! 对接 `/v8/finance/chart/<symbol>?range=max&interval=1d`

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::DateTime;
use reqwest::Client;
use serde::Deserialize;

use super::MarketDataProvider;
use crate::config::UpstreamConfig;
use crate::models::{PriceBar, PriceHistory};

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartData,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: Option<ChartMeta>,
    #[serde(default)]
    timestamp: Option<Vec<i64>>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    #[serde(rename = "longName", default)]
    long_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Default, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

/// 取第 i 个值，缺失时为 None
fn at<T: Copy>(values: &[Option<T>], i: usize) -> Option<T> {
    values.get(i).copied().flatten()
}

/// 解析 chart 接口响应
///
/// 收盘价或最高价缺失的行会被跳过（停牌日等）
fn parse_chart(body: &str) -> Result<PriceHistory> {
    let response: ChartResponse = serde_json::from_str(body)?;

    if let Some(err) = response.chart.error {
        return Err(anyhow!("chart 接口错误 {}: {}", err.code, err.description));
    }

    let result = response
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| anyhow!("chart 接口无返回数据"))?;

    let long_name = result.meta.and_then(|meta| meta.long_name);
    let timestamps = result.timestamp.unwrap_or_default();
    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();

    let bars = timestamps
        .iter()
        .enumerate()
        .filter_map(|(i, &ts)| {
            let close = at(&quote.close, i)?;
            let high = at(&quote.high, i)?;
            Some(PriceBar {
                timestamp: DateTime::from_timestamp(ts, 0)?,
                open: at(&quote.open, i).unwrap_or(close),
                high,
                low: at(&quote.low, i).unwrap_or(close),
                close,
                volume: at(&quote.volume, i).unwrap_or(0),
            })
        })
        .collect();

    Ok(PriceHistory { long_name, bars })
}

pub struct YahooChartProvider {
    client: Client,
    chart_url: String,
    user_agent: String,
}

impl YahooChartProvider {
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.metrics_timeout())
            .cookie_store(true)
            .gzip(true)
            .build()?;

        Ok(Self {
            client,
            chart_url: config.chart_url.trim_end_matches('/').to_string(),
            user_agent: config.user_agent.clone(),
        })
    }

    fn request_url(&self, symbol: &str) -> Result<url::Url> {
        let mut url = url::Url::parse(&self.chart_url)?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("无效的 chart 地址: {}", self.chart_url))?
            .push(symbol);
        url.query_pairs_mut()
            .append_pair("range", "max")
            .append_pair("interval", "1d");
        Ok(url)
    }
}

#[async_trait]
impl MarketDataProvider for YahooChartProvider {
    async fn fetch_history(&self, symbol: &str) -> Result<PriceHistory> {
        let url = self.request_url(symbol)?;

        let response = self
            .client
            .get(url)
            .header("User-Agent", &self.user_agent)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        // 无效代码时接口返回 404，但 body 中带有错误描述
        match parse_chart(&body) {
            Ok(history) if status.is_success() => Ok(history),
            Ok(_) => Err(anyhow!("获取历史行情失败: {}", status)),
            Err(e) => Err(e.context(format!("解析 {} 历史行情失败 ({})", symbol, status))),
        }
    }
}
