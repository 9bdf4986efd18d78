//! 应用共享状态
//!
//! 启动时构建一次，通过 `web::Data` 注入所有处理器

use std::sync::Arc;

use crate::config::{AppConfig, SearchStrategy};
use crate::models::PublicConfig;
use crate::repository::{apply_seed, MemoryStockRepository, PgStockRepository, SeedData, StockRepository};
use crate::services::cache::CacheStore;
use crate::services::metrics::{MarketDataProvider, StockMetricsGateway, YahooChartProvider};
use crate::services::search::{LocalIndexSearch, SearchProvider, StockSearchGateway, UpstreamSearch};

pub struct AppState {
    pub cache: CacheStore,
    pub repo: Arc<dyn StockRepository>,
    pub search: StockSearchGateway,
    pub metrics: StockMetricsGateway,
    pub public: PublicConfig,
}

impl AppState {
    /// 由已构建好的组件组装状态
    pub fn new(
        config: &AppConfig,
        cache: CacheStore,
        repo: Arc<dyn StockRepository>,
        search_provider: Arc<dyn SearchProvider>,
        market_data: Arc<dyn MarketDataProvider>,
    ) -> Self {
        let ttl = config.cache.ttl();
        Self {
            search: StockSearchGateway::new(search_provider, cache.clone(), ttl),
            metrics: StockMetricsGateway::new(
                market_data,
                config.upstream.exchange_suffix.clone(),
                cache.clone(),
                ttl,
            ),
            cache,
            repo,
            public: PublicConfig {
                app_base_url: config.frontend.base_url.clone(),
            },
        }
    }

    /// 按配置构建存储、数据源与网关
    pub async fn build(config: &AppConfig) -> anyhow::Result<Self> {
        let repo = build_repository(config).await?;

        let search_provider: Arc<dyn SearchProvider> = match config.search.strategy {
            SearchStrategy::Local => Arc::new(LocalIndexSearch::new(repo.clone())),
            SearchStrategy::Upstream => Arc::new(UpstreamSearch::new(&config.upstream)?),
        };
        let market_data: Arc<dyn MarketDataProvider> =
            Arc::new(YahooChartProvider::new(&config.upstream)?);

        log::info!(
            "搜索策略: {}，缓存有效期: {} 秒",
            search_provider.name(),
            config.cache.ttl_secs
        );

        Ok(Self::new(config, CacheStore::new(), repo, search_provider, market_data))
    }
}

async fn build_repository(config: &AppConfig) -> anyhow::Result<Arc<dyn StockRepository>> {
    if let Some(db) = &config.database {
        let repo = PgStockRepository::connect(db).await?;
        return Ok(Arc::new(repo));
    }

    log::info!("未配置数据库，使用内存存储");
    let repo = MemoryStockRepository::new();
    if let Some(path) = &config.storage.seed_file {
        let seed = SeedData::from_file(path)?;
        let count = apply_seed(&repo, &seed).await?;
        log::info!("从 {} 加载 {} 只股票", path, count);
    }
    Ok(Arc::new(repo))
}
