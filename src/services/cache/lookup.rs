//! 带缓存的查询包装
//!
//! `CachedLookup` 把任意异步查询与显式的键提取函数、固定 TTL 组合在一起：
//! 命中未过期缓存时直接返回，不调用底层查询；未命中时调用查询，
//! 仅在结果 `Ok` 且可缓存时写入缓存。错误与空结果永远不会被缓存。

use std::future::Future;
use std::marker::PhantomData;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::store::CacheStore;

/// 判断结果是否值得缓存
pub trait Cacheable {
    fn is_cacheable(&self) -> bool;
}

impl Cacheable for Value {
    fn is_cacheable(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::String(s) => !s.is_empty(),
            Value::Array(items) => !items.is_empty(),
            Value::Object(map) => !map.is_empty() && !map.contains_key("error"),
            Value::Number(n) => n.as_f64() != Some(0.0),
        }
    }
}

/// 缓存包装器
///
/// - `name`：被包装查询的稳定名称，作为缓存键前缀
/// - `key_fn`：从请求中提取缓存键，每个包装器必须显式提供
pub struct CachedLookup<Req, Res> {
    name: &'static str,
    key_fn: fn(&Req) -> String,
    ttl: Duration,
    cache: CacheStore,
    _marker: PhantomData<fn(Req) -> Res>,
}

impl<Req, Res> Clone for CachedLookup<Req, Res> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            key_fn: self.key_fn,
            ttl: self.ttl,
            cache: self.cache.clone(),
            _marker: PhantomData,
        }
    }
}

impl<Req, Res> CachedLookup<Req, Res>
where
    Res: Cacheable + Serialize + DeserializeOwned,
{
    pub fn new(
        name: &'static str,
        key_fn: fn(&Req) -> String,
        ttl: Duration,
        cache: CacheStore,
    ) -> Self {
        Self {
            name,
            key_fn,
            ttl,
            cache,
            _marker: PhantomData,
        }
    }

    /// 完整缓存键 `"{name}:{key}"`
    pub fn cache_key(&self, req: &Req) -> String {
        format!("{}:{}", self.name, (self.key_fn)(req))
    }

    /// 先查缓存，未命中再调用 `lookup`
    pub async fn call<F, Fut, E>(&self, req: Req, lookup: F) -> Result<Res, E>
    where
        F: FnOnce(Req) -> Fut,
        Fut: Future<Output = Result<Res, E>>,
    {
        let key = self.cache_key(&req);

        if let Some(cached) = self.cache.get(&key) {
            match serde_json::from_value::<Res>(cached) {
                Ok(value) => {
                    log::debug!("缓存命中: {}", key);
                    return Ok(value);
                }
                Err(e) => log::warn!("缓存条目 {} 无法解析，重新查询: {}", key, e),
            }
        }

        log::debug!("缓存未命中: {}", key);
        let result = lookup(req).await?;

        if result.is_cacheable() {
            match serde_json::to_value(&result) {
                Ok(value) => self.cache.set(key, value, self.ttl),
                Err(e) => log::warn!("结果序列化失败，跳过缓存 {}: {}", key, e),
            }
        } else {
            log::debug!("结果为空或为错误，不写入缓存: {}", key);
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn query_key(query: &String) -> String {
        query.clone()
    }

    fn lookup(cache: &CacheStore, ttl: Duration) -> CachedLookup<String, Value> {
        CachedLookup::new("get_stocks_list", query_key, ttl, cache.clone())
    }

    #[tokio::test]
    async fn test_second_call_is_served_from_cache() {
        let cache = CacheStore::new();
        let wrapped = lookup(&cache, Duration::from_secs(60));
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..2 {
            let calls = calls.clone();
            let value: Result<Value, ()> = wrapped
                .call("tcs".to_string(), |q| async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(json!({"symbols": [{"symbol": q}]}))
                })
                .await;
            assert_eq!(value.unwrap(), json!({"symbols": [{"symbol": "tcs"}]}));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(cache.get("get_stocks_list:tcs").is_some());
    }

    async fn count_lookup(wrapped: &CachedLookup<String, Value>, calls: &Arc<AtomicUsize>) {
        let calls = calls.clone();
        wrapped
            .call("infy".to_string(), move |_| async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, ()>(json!({"symbols": []}))
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_expiry_triggers_new_lookup() {
        let cache = CacheStore::new();
        let wrapped = lookup(&cache, Duration::from_millis(50));
        let calls = Arc::new(AtomicUsize::new(0));

        count_lookup(&wrapped, &calls).await;
        count_lookup(&wrapped, &calls).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_millis(80)).await;
        count_lookup(&wrapped, &calls).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_errors_and_empty_results_are_not_cached() {
        let cache = CacheStore::new();
        let wrapped = lookup(&cache, Duration::from_secs(60));

        let err: Result<Value, String> = wrapped
            .call("bad".to_string(), |_| async { Err("timeout".to_string()) })
            .await;
        assert_eq!(err.unwrap_err(), "timeout");
        assert!(cache.get("get_stocks_list:bad").is_none());

        for falsy in [
            json!(null),
            json!(false),
            json!(0),
            json!(0.0),
            json!({}),
            json!([]),
            json!(""),
            json!({"error": "x"}),
        ] {
            let expected = falsy.clone();
            let out: Result<Value, ()> = wrapped
                .call("bad".to_string(), move |_| async move { Ok(falsy) })
                .await;
            assert_eq!(out.unwrap(), expected);
            assert!(cache.get("get_stocks_list:bad").is_none());
        }
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_truthy_values_are_cacheable() {
        assert!(json!(1).is_cacheable());
        assert!(json!(-0.5).is_cacheable());
        assert!(json!(true).is_cacheable());
        assert!(json!({"symbols": []}).is_cacheable());
        assert!(!json!(0).is_cacheable());
        assert!(!json!(-0.0).is_cacheable());
    }

    #[tokio::test]
    async fn test_distinct_names_do_not_collide() {
        let cache = CacheStore::new();
        let a: CachedLookup<String, Value> =
            CachedLookup::new("search", query_key, Duration::from_secs(60), cache.clone());
        let b: CachedLookup<String, Value> =
            CachedLookup::new("metrics", query_key, Duration::from_secs(60), cache.clone());

        a.call("x".to_string(), |_| async { Ok::<_, ()>(json!("from a")) })
            .await
            .unwrap();
        let out = b
            .call("x".to_string(), |_| async { Ok::<_, ()>(json!("from b")) })
            .await
            .unwrap();

        assert_eq!(out, json!("from b"));
        assert_eq!(cache.len(), 2);
    }
}
