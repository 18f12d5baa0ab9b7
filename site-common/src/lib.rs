pub mod cache;
pub mod models;
pub mod scope;

// 重新导出常用类型，方便直接使用
pub use cache::{
    CacheStore, Clock, FileStore, KeyValueStore, ManualClock, MemoryStore, StoreError, SystemClock,
    CATEGORY_CACHE_TTL_MS, CATEGORY_INDEX_CACHE_KEY, SITE_INDEX_CACHE_KEY,
};
pub use models::{CacheRecord, Post, RecentUpdate, SiteIndex};
pub use scope::scope_matches;
