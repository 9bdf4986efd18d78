//! 上游搜索接口代理
//!
//! GET `{search_url}{query}`，模拟浏览器请求头，短超时，响应 JSON 原样返回

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use super::SearchProvider;
use crate::config::UpstreamConfig;

pub struct UpstreamSearch {
    client: Client,
    base_url: String,
    user_agent: String,
    referer: String,
}

impl UpstreamSearch {
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        if config.search_url.is_empty() {
            return Err(anyhow!("未配置 NSE_STOCK_SEARCH_URL"));
        }

        let client = Client::builder()
            .timeout(config.search_timeout())
            .gzip(true)
            .build()?;

        Ok(Self {
            client,
            base_url: config.search_url.clone(),
            user_agent: config.user_agent.clone(),
            referer: config.referer.clone(),
        })
    }

    /// 查询词经 URL 编码后拼接在地址末尾
    fn request_url(&self, query: &str) -> String {
        let encoded: String = url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
        format!("{}{}", self.base_url, encoded)
    }
}

#[async_trait]
impl SearchProvider for UpstreamSearch {
    fn name(&self) -> &'static str {
        "upstream"
    }

    async fn search(&self, query: &str) -> Result<Value> {
        let url = self.request_url(query);

        let response = self
            .client
            .get(&url)
            .header("User-Agent", &self.user_agent)
            .header("Referer", &self.referer)
            .header("Accept", "application/json, text/plain, */*")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!("搜索接口返回错误状态: {}", response.status()));
        }

        let body: Value = response.json().await?;
        Ok(body)
    }
}
