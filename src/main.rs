//! 股票指标后端服务
//!
//! 提供股票基础数据的增删改查、股票搜索代理以及现价/历史最高价指标，
//! 上游查询结果统一经过进程内缓存

mod config;     // 配置加载
mod handlers;   // HTTP 请求处理器
mod models;     // 数据模型定义
mod repository; // 股票数据存储
mod services;   // 缓存与网关
mod state;      // 应用共享状态

use std::time::Duration;

use actix_web::{middleware::Logger, web, App, HttpServer};
use env_logger::Env;

use crate::config::AppConfig;
use crate::services::cache::spawn_purge_task;
use crate::state::AppState;

/// 应用程序入口
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    config::load_dotenv();

    // 初始化日志系统，默认日志级别为 info
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = AppConfig::load();

    let state = match AppState::build(&config).await {
        Ok(state) => web::Data::new(state),
        Err(e) => {
            log::error!("初始化失败: {:#}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()));
        }
    };

    if config.cache.purge_interval_secs > 0 {
        spawn_purge_task(
            state.cache.clone(),
            Duration::from_secs(config.cache.purge_interval_secs),
        );
    }

    let bind_addr = config.bind_addr();
    log::info!("启动股票指标服务，监听 {}", bind_addr);

    // 创建并启动 HTTP 服务器
    let mut server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())  // 添加请求日志中间件
            .app_data(state.clone())
            .configure(handlers::config)  // 配置路由
    });
    if config.server.workers > 0 {
        server = server.workers(config.server.workers);
    }

    server.bind(bind_addr)?.run().await
}
