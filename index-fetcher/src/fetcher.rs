use crate::transport::Transport;
use crate::FetchError;
use serde::{Deserialize, Serialize};
use site_common::{CacheStore, Clock, KeyValueStore, Post, SiteIndex, SystemClock, SITE_INDEX_CACHE_KEY};
use tracing::{info, warn};
use url::Url;

/// 站点索引获取配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FetchConfig {
    /// 站点索引地址
    pub index_url: String,
    /// 是否附加防缓存参数
    #[serde(default = "default_cache_bust")]
    pub cache_bust: bool,
}

fn default_cache_bust() -> bool {
    true
}

impl FetchConfig {
    pub fn new(index_url: impl Into<String>) -> Self {
        Self {
            index_url: index_url.into(),
            cache_bust: true,
        }
    }
}

/// 索引数据来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexSource {
    Network,
    Cache,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedIndex {
    pub index: SiteIndex,
    pub source: IndexSource,
}

/// 站点索引获取器 - 每次调用最多一次网络请求，失败时回退到缓存
pub struct IndexFetcher<T, S, C = SystemClock> {
    transport: T,
    cache: CacheStore<S, C>,
    config: FetchConfig,
}

impl<T, S, C> IndexFetcher<T, S, C>
where
    T: Transport,
    S: KeyValueStore,
    C: Clock,
{
    pub fn new(transport: T, cache: CacheStore<S, C>, config: FetchConfig) -> Self {
        Self {
            transport,
            cache,
            config,
        }
    }

    pub fn cache(&self) -> &CacheStore<S, C> {
        &self.cache
    }

    /// 获取文章列表
    pub async fn fetch_index(&self) -> Result<Vec<Post>, FetchError> {
        Ok(self.fetch_site_index().await?.index.posts)
    }

    /// 获取完整的站点索引并标明来源
    pub async fn fetch_site_index(&self) -> Result<FetchedIndex, FetchError> {
        match self.fetch_from_network().await {
            Ok((raw, index)) => {
                self.cache.save(SITE_INDEX_CACHE_KEY, &raw);
                info!("站点索引已从网络加载，文章数量: {}", index.posts.len());
                Ok(FetchedIndex {
                    index,
                    source: IndexSource::Network,
                })
            }
            Err(e) => {
                warn!("站点索引加载失败: {}，尝试使用缓存", e);
                match self.cache.load::<SiteIndex>(SITE_INDEX_CACHE_KEY) {
                    Some(index) => {
                        info!("使用缓存的站点索引，文章数量: {}", index.posts.len());
                        Ok(FetchedIndex {
                            index,
                            source: IndexSource::Cache,
                        })
                    }
                    None => Err(FetchError::Unavailable(Box::new(e))),
                }
            }
        }
    }

    fn request_url(&self) -> Result<String, FetchError> {
        let mut url = Url::parse(&self.config.index_url)
            .map_err(|_| FetchError::InvalidUrl(self.config.index_url.clone()))?;
        if self.config.cache_bust {
            url.query_pairs_mut()
                .append_pair("v", &self.cache.now_ms().to_string());
        }
        Ok(url.into())
    }

    // 返回原始 JSON (原样写入缓存) 和解析后的索引
    async fn fetch_from_network(&self) -> Result<(serde_json::Value, SiteIndex), FetchError> {
        let url = self.request_url()?;
        let response = self.transport.get(&url).await?;
        if !response.is_success() {
            return Err(FetchError::Status(response.status));
        }
        let raw: serde_json::Value = serde_json::from_str(&response.body)?;
        let index: SiteIndex = serde_json::from_value(raw.clone())?;
        Ok((raw, index))
    }
}
