//! 行情指标模型
//!
//! 现价（CMP）、历史最高价（ATH）及两者的偏离百分比

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 无历史数据时的错误信息
pub const NO_DATA_ERROR: &str = "No data available for the specified NSE code.";
/// 代码无效或数据无法获取时的错误信息
pub const INVALID_CODE_ERROR: &str = "Invalid NSE code or data unavailable.";

/// 单只股票的价格指标
///
/// 指标字段与 `error` 字段二者只有其一会被填充
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StockMetrics {
    /// 股票代码（不带交易所后缀）
    pub nse_code: String,
    /// 公司名称
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock_name: Option<String>,
    /// 当前价格（最近收盘价，两位小数）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_price: Option<f64>,
    /// 历史最高价（两位小数）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all_time_high: Option<f64>,
    /// 现价相对最高价的偏离，如 "-25.0%"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentage_difference: Option<String>,
    /// 错误信息
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StockMetrics {
    pub fn available(
        nse_code: &str,
        stock_name: String,
        current_price: f64,
        all_time_high: f64,
        percentage_difference: String,
    ) -> Self {
        Self {
            nse_code: nse_code.to_string(),
            stock_name: Some(stock_name),
            current_price: Some(current_price),
            all_time_high: Some(all_time_high),
            percentage_difference: Some(percentage_difference),
            error: None,
        }
    }

    /// 数据源有该代码但没有历史数据
    pub fn no_data(nse_code: &str, stock_name: String) -> Self {
        Self {
            nse_code: nse_code.to_string(),
            stock_name: Some(stock_name),
            current_price: None,
            all_time_high: None,
            percentage_difference: None,
            error: Some(NO_DATA_ERROR.to_string()),
        }
    }

    /// 代码无效或数据源请求失败
    pub fn invalid(nse_code: &str) -> Self {
        Self {
            nse_code: nse_code.to_string(),
            stock_name: None,
            current_price: None,
            all_time_high: None,
            percentage_difference: None,
            error: Some(INVALID_CODE_ERROR.to_string()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// 历史日线数据
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PriceBar {
    /// 交易日
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// 数据源返回的完整历史
#[derive(Debug, Clone, Default)]
pub struct PriceHistory {
    /// 公司全称
    pub long_name: Option<String>,
    /// 按时间升序排列的日线
    pub bars: Vec<PriceBar>,
}

/// 指标查询参数
#[derive(Debug, Deserialize)]
pub struct MetricsQuery {
    /// 股票代码
    #[serde(default)]
    pub codes: String,
}
