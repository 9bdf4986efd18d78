//! 进程内缓存存储
//!
//! 所有请求共享同一份 key → value 映射，每个条目带有独立的过期时间。
//! 只做被动过期，不限制容量。

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use serde_json::Value;

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// 线程安全的缓存句柄，clone 后共享同一份数据
#[derive(Debug, Clone, Default)]
pub struct CacheStore {
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
}

impl CacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 读取未过期的条目，过期条目视为未命中
    pub fn get(&self, key: &str) -> Option<Value> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(key)
            .filter(|entry| entry.is_live(Instant::now()))
            .map(|entry| entry.value.clone())
    }

    /// 写入条目，已有条目会被整体覆盖
    pub fn set(&self, key: impl Into<String>, value: Value, ttl: Duration) {
        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + ttl,
        };
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.into(), entry);
    }

    /// 条目数量（包含已过期但尚未清理的条目）
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// 清理已过期条目，返回清理数量
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|_, entry| entry.is_live(now));
        before - entries.len()
    }
}

/// 周期性清理过期条目
///
/// 在 actix 运行时内启动，随进程退出而结束
pub fn spawn_purge_task(cache: CacheStore, interval: Duration) {
    actix_web::rt::spawn(async move {
        let mut ticker = actix_web::rt::time::interval(interval);
        loop {
            ticker.tick().await;
            let purged = cache.purge_expired();
            if purged > 0 {
                log::debug!("清理过期缓存 {} 条，剩余 {} 条", purged, cache.len());
            }
        }
    });
}
