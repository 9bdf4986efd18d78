//! 配置模块
//!
//! 先从 JSON 文件加载，再用环境变量（含 `.env`）覆盖；日志级别由 `RUST_LOG` 控制

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,
    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
    /// 工作线程数（0 表示使用 CPU 核心数）
    #[serde(default)]
    pub workers: usize,
}

/// 上游数据源配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// 股票搜索接口地址，查询词直接拼接在末尾
    #[serde(default)]
    pub search_url: String,
    /// 搜索请求超时（秒）
    #[serde(default = "default_search_timeout")]
    pub search_timeout_secs: u64,
    /// 历史行情接口地址
    #[serde(default = "default_chart_url")]
    pub chart_url: String,
    /// 历史行情请求超时（秒）
    #[serde(default = "default_metrics_timeout")]
    pub metrics_timeout_secs: u64,
    /// 交易所后缀
    #[serde(default = "default_exchange_suffix")]
    pub exchange_suffix: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_referer")]
    pub referer: String,
}

/// 搜索策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchStrategy {
    /// 查询本地股票库
    Local,
    /// 代理上游搜索接口
    Upstream,
}

impl std::str::FromStr for SearchStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "upstream" => Ok(Self::Upstream),
            other => Err(format!("未知搜索策略: {}", other)),
        }
    }
}

/// 搜索配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_strategy")]
    pub strategy: SearchStrategy,
}

/// 缓存配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// 缓存有效期（秒）
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
    /// 过期条目清理间隔（秒），0 表示不清理
    #[serde(default = "default_purge_interval")]
    pub purge_interval_secs: u64,
}

/// 前端配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrontendConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

/// 数据库配置（未配置时使用内存存储）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatabaseConfig {
    pub name: String,
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_db_host")]
    pub host: String,
    #[serde(default = "default_db_port")]
    pub port: u16,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

/// 内存存储配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// 启动时加载的种子文件
    #[serde(default)]
    pub seed_file: Option<String>,
}

/// 应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub frontend: FrontendConfig,
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
    #[serde(default)]
    pub storage: StorageConfig,
}

// 默认值函数
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_search_timeout() -> u64 { 3 }
fn default_chart_url() -> String { "https://query1.finance.yahoo.com/v8/finance/chart".to_string() }
fn default_metrics_timeout() -> u64 { 10 }
fn default_exchange_suffix() -> String { ".NS".to_string() }
fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36".to_string()
}
fn default_referer() -> String { "https://www.nseindia.com/".to_string() }
fn default_strategy() -> SearchStrategy { SearchStrategy::Local }
fn default_cache_ttl() -> u64 { 900 }
fn default_purge_interval() -> u64 { 300 }
fn default_base_url() -> String { "http://localhost:8080".to_string() }
fn default_db_host() -> String { "localhost".to_string() }
fn default_db_port() -> u16 { 5432 }
fn default_max_connections() -> u32 { 5 }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: 0,
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            search_url: String::new(),
            search_timeout_secs: default_search_timeout(),
            chart_url: default_chart_url(),
            metrics_timeout_secs: default_metrics_timeout(),
            exchange_suffix: default_exchange_suffix(),
            user_agent: default_user_agent(),
            referer: default_referer(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_cache_ttl(),
            purge_interval_secs: default_purge_interval(),
        }
    }
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

impl UpstreamConfig {
    pub fn search_timeout(&self) -> Duration {
        Duration::from_secs(self.search_timeout_secs)
    }

    pub fn metrics_timeout(&self) -> Duration {
        Duration::from_secs(self.metrics_timeout_secs)
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl AppConfig {
    /// 从 JSON 文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// 加载配置：配置文件（可选）→ 环境变量覆盖
    ///
    /// `.env` 需在调用前由 [`load_dotenv`] 载入
    pub fn load() -> Self {
        let mut config = Self::load_file();
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    fn load_file() -> Self {
        let config_paths = ["config.json", "config/config.json"];

        for path in config_paths {
            if Path::new(path).exists() {
                match Self::from_file(path) {
                    Ok(config) => {
                        log::info!("从 {} 加载配置成功", path);
                        return config;
                    }
                    Err(e) => {
                        log::warn!("加载配置文件 {} 失败: {}", path, e);
                    }
                }
            }
        }

        log::info!("未找到配置文件，使用默认配置");
        Self::default()
    }

    /// 用环境变量覆盖配置，`lookup` 便于测试时注入
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(host) = var("SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = var("SERVER_PORT").and_then(|v| parse_or_warn("SERVER_PORT", &v)) {
            self.server.port = port;
        }
        if let Some(url) = var("NSE_STOCK_SEARCH_URL") {
            self.upstream.search_url = url;
        }
        if let Some(strategy) = var("SEARCH_STRATEGY").and_then(|v| parse_or_warn("SEARCH_STRATEGY", &v)) {
            self.search.strategy = strategy;
        }
        if let Some(ttl) = var("CACHE_TTL_SECS").and_then(|v| parse_or_warn("CACHE_TTL_SECS", &v)) {
            self.cache.ttl_secs = ttl;
        }
        if let Some(url) = var("APP_BASE_URL") {
            self.frontend.base_url = url;
        }
        if let Some(path) = var("SEED_FILE") {
            self.storage.seed_file = Some(path);
        }

        // 数据库名与用户名同时存在才启用数据库
        if let (Some(name), Some(user)) = (var("DATABASE_NAME"), var("DATABASE_USER")) {
            let mut db = self.database.take().unwrap_or(DatabaseConfig {
                name: String::new(),
                user: String::new(),
                password: String::new(),
                host: default_db_host(),
                port: default_db_port(),
                max_connections: default_max_connections(),
            });
            db.name = name;
            db.user = user;
            if let Some(password) = lookup("DATABASE_PASSWORD") {
                db.password = password;
            }
            if let Some(host) = var("DATABASE_HOST") {
                db.host = host;
            }
            if let Some(port) = var("DATABASE_PORT").and_then(|v| parse_or_warn("DATABASE_PORT", &v)) {
                db.port = port;
            }
            self.database = Some(db);
        }
    }

    /// 获取服务器绑定地址
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// 载入 `.env`，文件不存在时忽略
pub fn load_dotenv() {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("读取 .env 失败: {}", e);
        }
    }
}

fn parse_or_warn<T: std::str::FromStr>(key: &str, value: &str) -> Option<T> {
    match value.trim().parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            log::warn!("环境变量 {}={} 无法解析，忽略", key, value);
            None
        }
    }
}
