//! 缓存层
//!
//! 进程级缓存存储与查询包装器

mod lookup;
mod store;

pub use lookup::{Cacheable, CachedLookup};
pub use store::{spawn_purge_task, CacheStore};
