//! 本地缓存 - 以字符串键值存储保存带时间戳的 JSON 数据
//!
//! 浏览器中对应 localStorage，命令行中对应一个 JSON 文件。
//! 读取永远不会返回错误：键不存在或内容无法解析时视为"无值"。

use crate::models::CacheRecord;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{debug, warn};

/// 站点索引缓存键
pub const SITE_INDEX_CACHE_KEY: &str = "site-index-cache";
/// 分类索引缓存键 (仓库目录模式)
pub const CATEGORY_INDEX_CACHE_KEY: &str = "category-index-cache";
/// 分类索引缓存有效期: 6小时
pub const CATEGORY_CACHE_TTL_MS: i64 = 6 * 60 * 60 * 1000;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("存储读写失败: {0}")]
    Io(#[from] io::Error),
    #[error("存储内容序列化失败: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("存储锁已损坏")]
    Poisoned,
}

/// 字符串键值存储
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String) -> Result<(), StoreError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Arc<S> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        (**self).set(key, value)
    }
}

/// 内存存储
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        entries.insert(key.to_string(), value);
        Ok(())
    }
}

/// 文件存储 - 整个存储是一个 `{键: 字符串}` 的 JSON 对象
///
/// 每次写入都会重新读取文件，多个进程同时写入时以最后一次为准。
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        match self.read_all() {
            Ok(mut entries) => entries.remove(key),
            Err(e) => {
                warn!("读取缓存文件 {} 失败: {}", self.path.display(), e);
                None
            }
        }
    }

    fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        // 文件损坏时直接覆盖
        let mut entries = self.read_all().unwrap_or_default();
        entries.insert(key.to_string(), value);
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_json::to_string(&entries)?)?;
        Ok(())
    }
}

/// 时钟 - 返回毫秒时间戳
pub trait Clock {
    fn now_ms(&self) -> i64;
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now_ms(&self) -> i64 {
        (**self).now_ms()
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// 手动时钟，用于模拟时间流逝
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(start_ms: i64) -> Self {
        Self {
            now: AtomicI64::new(start_ms),
        }
    }

    pub fn set(&self, now_ms: i64) {
        self.now.store(now_ms, Ordering::SeqCst);
    }

    pub fn advance(&self, delta_ms: i64) {
        self.now.fetch_add(delta_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// 缓存存储 - 在键值存储之上读写 [`CacheRecord`]
pub struct CacheStore<S, C = SystemClock> {
    store: S,
    clock: C,
}

impl<S: KeyValueStore> CacheStore<S, SystemClock> {
    pub fn new(store: S) -> Self {
        Self::with_clock(store, SystemClock)
    }
}

impl<S: KeyValueStore, C: Clock> CacheStore<S, C> {
    pub fn with_clock(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }

    /// 保存数据，覆盖旧值；失败时只记录日志
    pub fn save<T: Serialize>(&self, key: &str, value: &T) {
        let record = CacheRecord {
            timestamp: self.clock.now_ms(),
            payload: value,
        };
        let text = match serde_json::to_string(&record) {
            Ok(text) => text,
            Err(e) => {
                warn!("缓存 {} 序列化失败: {}", key, e);
                return;
            }
        };
        match self.store.set(key, text) {
            Ok(()) => debug!("已写入缓存 {}", key),
            Err(e) => warn!("写入缓存 {} 失败: {}", key, e),
        }
    }

    /// 读取数据，不存在或无法解析时返回 None
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.load_record(key).map(|record| record.payload)
    }

    /// 读取未过期的数据
    pub fn load_if_fresh<T: DeserializeOwned>(&self, key: &str, max_age_ms: i64) -> Option<T> {
        let record = self.load_record::<T>(key)?;
        let age = self.clock.now_ms() - record.timestamp;
        if age < max_age_ms {
            Some(record.payload)
        } else {
            debug!("缓存 {} 已过期 ({} ms)", key, age);
            None
        }
    }

    fn load_record<T: DeserializeOwned>(&self, key: &str) -> Option<CacheRecord<T>> {
        let text = self.store.get(key)?;
        match serde_json::from_str(&text) {
            Ok(record) => Some(record),
            Err(e) => {
                debug!("缓存 {} 无法解析: {}", key, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn save_then_load_returns_the_same_value() {
        let cache = CacheStore::new(MemoryStore::new());
        let value = json!({"posts": [{"title": "A", "tags": ["x"]}], "n": 3});

        cache.save("k", &value);

        assert_eq!(cache.load::<serde_json::Value>("k"), Some(value));
    }

    #[test]
    fn missing_or_corrupt_entries_load_as_none() {
        let store = MemoryStore::new();
        store.set("bad", "{not json".to_string()).unwrap();
        let cache = CacheStore::new(store);

        assert_eq!(cache.load::<serde_json::Value>("absent"), None);
        assert_eq!(cache.load::<serde_json::Value>("bad"), None);
    }

    #[test]
    fn save_overwrites_previous_value() {
        let cache = CacheStore::new(MemoryStore::new());
        cache.save("k", &1);
        cache.save("k", &2);
        assert_eq!(cache.load::<i32>("k"), Some(2));
    }

    #[test]
    fn load_if_fresh_respects_max_age() {
        let clock = Arc::new(ManualClock::new(1_000));
        let cache = CacheStore::with_clock(MemoryStore::new(), clock.clone());
        cache.save("k", &"payload");

        assert_eq!(
            cache.load_if_fresh::<String>("k", CATEGORY_CACHE_TTL_MS).as_deref(),
            Some("payload")
        );

        clock.advance(CATEGORY_CACHE_TTL_MS - 1);
        assert!(cache.load_if_fresh::<String>("k", CATEGORY_CACHE_TTL_MS).is_some());

        clock.advance(1);
        assert_eq!(cache.load_if_fresh::<String>("k", CATEGORY_CACHE_TTL_MS), None);
        // 过期数据仍可作为回退读取
        assert_eq!(cache.load::<String>("k").as_deref(), Some("payload"));
    }

    #[test]
    fn file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");

        CacheStore::new(FileStore::new(&path)).save(SITE_INDEX_CACHE_KEY, &vec!["a", "b"]);
        CacheStore::new(FileStore::new(&path)).save(CATEGORY_INDEX_CACHE_KEY, &"dark");

        let cache = CacheStore::new(FileStore::new(&path));
        assert_eq!(
            cache.load::<Vec<String>>(SITE_INDEX_CACHE_KEY),
            Some(vec!["a".to_string(), "b".to_string()])
        );
        assert_eq!(cache.load::<String>(CATEGORY_INDEX_CACHE_KEY).as_deref(), Some("dark"));
    }

    #[test]
    fn file_store_treats_corrupt_file_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, "garbage").unwrap();

        let store = FileStore::new(&path);
        assert_eq!(store.get("k"), None);
        store.set("k", "v".to_string()).unwrap();
        assert_eq!(store.get("k").as_deref(), Some("v"));
    }
}
