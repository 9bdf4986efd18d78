//! 股票数据模型
//!
//! 定义板块、行业、股票三级结构以及搜索结果的统一格式

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// 字段级校验错误，格式为 `{"字段名": ["错误信息", ...]}`
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// 字段最大长度
pub const MAX_FIELD_LEN: usize = 255;

/// 板块
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Sector {
    pub id: i64,
    /// 板块名称（唯一）
    pub name: String,
}

/// 行业
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Industry {
    pub id: i64,
    /// 行业名称（唯一）
    pub name: String,
    /// 所属板块 id
    pub sector: i64,
}

/// 股票记录
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Stock {
    pub id: i64,
    /// 股票代码（唯一，可能带交易所后缀，如 TCS.NS）
    pub symbol: String,
    /// 股票名称
    pub name: String,
    /// 所属行业 id
    pub industry: i64,
    /// 市值
    pub market_cap: Option<f64>,
    /// 当前价格
    pub current_price: f64,
    /// 市盈率
    pub pe_ratio: Option<f64>,
    /// 股息率（百分比）
    pub dividend_yield: Option<f64>,
}

/// 创建/更新股票的请求体
///
/// 所有字段均为可选，以便在校验阶段给出逐字段的错误信息
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct StockInput {
    pub symbol: Option<String>,
    pub name: Option<String>,
    pub industry: Option<i64>,
    pub market_cap: Option<f64>,
    pub current_price: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub dividend_yield: Option<f64>,
}

/// 通过校验的股票字段
#[derive(Debug, Clone, PartialEq)]
pub struct NewStock {
    pub symbol: String,
    pub name: String,
    pub industry: i64,
    pub market_cap: Option<f64>,
    pub current_price: f64,
    pub pe_ratio: Option<f64>,
    pub dividend_yield: Option<f64>,
}

impl NewStock {
    pub fn into_stock(self, id: i64) -> Stock {
        Stock {
            id,
            symbol: self.symbol,
            name: self.name,
            industry: self.industry,
            market_cap: self.market_cap,
            current_price: self.current_price,
            pe_ratio: self.pe_ratio,
            dividend_yield: self.dividend_yield,
        }
    }
}

fn push_error(errors: &mut FieldErrors, field: &str, message: &str) {
    errors
        .entry(field.to_string())
        .or_default()
        .push(message.to_string());
}

/// 十进制数的整数部分位数
fn integer_digits(value: f64) -> usize {
    let whole = value.abs().trunc();
    if whole < 1.0 {
        1
    } else {
        whole.log10().floor() as usize + 1
    }
}

fn check_text(errors: &mut FieldErrors, field: &str, value: &Option<String>) -> Option<String> {
    match value.as_deref().map(str::trim) {
        None => {
            push_error(errors, field, "This field is required.");
            None
        }
        Some("") => {
            push_error(errors, field, "This field may not be blank.");
            None
        }
        Some(text) if text.chars().count() > MAX_FIELD_LEN => {
            push_error(
                errors,
                field,
                &format!("Ensure this field has no more than {} characters.", MAX_FIELD_LEN),
            );
            None
        }
        Some(text) => Some(text.to_string()),
    }
}

/// 校验价格类字段：非负、有限，且整数部分不超过 `max_digits - 2` 位（保留两位小数）
fn check_decimal(errors: &mut FieldErrors, field: &str, value: f64, max_digits: usize) -> bool {
    if !value.is_finite() {
        push_error(errors, field, "A valid number is required.");
        return false;
    }
    if value < 0.0 {
        push_error(errors, field, "Ensure this value is greater than or equal to 0.");
        return false;
    }
    let whole_digits = max_digits - 2;
    if integer_digits(value) > whole_digits {
        push_error(
            errors,
            field,
            &format!(
                "Ensure that there are no more than {} digits before the decimal point.",
                whole_digits
            ),
        );
        return false;
    }
    true
}

impl StockInput {
    /// 校验请求字段（不含唯一性与外键校验，由存储层负责）
    pub fn validate(&self) -> Result<NewStock, FieldErrors> {
        let mut errors = FieldErrors::new();

        let symbol = check_text(&mut errors, "symbol", &self.symbol);
        let name = check_text(&mut errors, "name", &self.name);

        if self.industry.is_none() {
            push_error(&mut errors, "industry", "This field is required.");
        }

        let current_price = match self.current_price {
            Some(price) if check_decimal(&mut errors, "current_price", price, 10) => Some(price),
            Some(_) => None,
            None => {
                push_error(&mut errors, "current_price", "This field is required.");
                None
            }
        };

        if let Some(cap) = self.market_cap {
            check_decimal(&mut errors, "market_cap", cap, 20);
        }
        for (field, value) in [("pe_ratio", self.pe_ratio), ("dividend_yield", self.dividend_yield)] {
            if matches!(value, Some(v) if !v.is_finite()) {
                push_error(&mut errors, field, "A valid number is required.");
            }
        }

        match (symbol, name, self.industry, current_price) {
            (Some(symbol), Some(name), Some(industry), Some(current_price)) if errors.is_empty() => {
                Ok(NewStock {
                    symbol,
                    name,
                    industry,
                    market_cap: self.market_cap.map(round2),
                    current_price: round2(current_price),
                    pe_ratio: self.pe_ratio,
                    dividend_yield: self.dividend_yield,
                })
            }
            _ => Err(errors),
        }
    }
}

/// 四舍五入到两位小数
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// 搜索结果中的单只股票
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StockSummary {
    /// 显示名称
    pub symbol_info: String,
    /// 去除交易所后缀后的股票代码
    pub symbol: String,
}

impl StockSummary {
    /// 由存储中的名称与代码构造，代码中第一个 `.` 之后的后缀会被去除
    pub fn from_record(name: &str, symbol: &str) -> Self {
        let bare = symbol.split('.').next().unwrap_or(symbol);
        Self {
            symbol_info: name.to_string(),
            symbol: bare.to_string(),
        }
    }
}

/// 搜索结果列表
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct StockSearchResult {
    pub symbols: Vec<StockSummary>,
}

/// 搜索参数
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    /// 搜索关键字
    #[serde(default)]
    pub q: String,
}
