//! 仓库目录模式 - 列出仓库文件，分批抓取文章页面并解析

use crate::markup::{is_excluded_page, parse_article};
use crate::paginate::{link_next, Paginator};
use crate::paths::{encode_path, file_name, folder_of};
use crate::transport::Transport;
use crate::FetchError;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use site_common::{
    scope_matches, CacheStore, Clock, KeyValueStore, Post, SystemClock, CATEGORY_CACHE_TTL_MS,
    CATEGORY_INDEX_CACHE_KEY,
};
use tracing::{debug, info, warn};

/// 每批并发请求数
pub const DEFAULT_BATCH_SIZE: usize = 6;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TreeConfig {
    /// 目录列表接口 (第一页)
    pub listing_url: String,
    /// 原始内容地址前缀，条目没有 download_url 时使用
    pub raw_base: String,
    /// 只处理该前缀下的文件
    #[serde(default)]
    pub path_prefix: String,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_ttl_ms")]
    pub ttl_ms: i64,
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_ttl_ms() -> i64 {
    CATEGORY_CACHE_TTL_MS
}

impl TreeConfig {
    pub fn new(listing_url: impl Into<String>, raw_base: impl Into<String>) -> Self {
        Self {
            listing_url: listing_url.into(),
            raw_base: raw_base.into(),
            path_prefix: String::new(),
            batch_size: DEFAULT_BATCH_SIZE,
            ttl_ms: CATEGORY_CACHE_TTL_MS,
        }
    }

    /// 按仓库 (owner/name) 和目录生成配置，使用 git trees 接口一次列出全部文件
    pub fn for_repository(repo: &str, path: &str) -> Self {
        let repo = repo.trim_matches('/');
        let path = path.trim_matches('/');
        let mut config = Self::new(
            format!("https://api.github.com/repos/{}/git/trees/HEAD?recursive=1", repo),
            format!("https://raw.githubusercontent.com/{}/HEAD", repo),
        );
        if !path.is_empty() {
            config.path_prefix = format!("{}/", path);
        }
        config
    }
}

/// 目录列表中的一个条目
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct TreeEntry {
    pub path: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub download_url: Option<String>,
}

impl TreeEntry {
    /// 是否是需要抓取的文章文件
    pub fn is_content_file(&self, path_prefix: &str) -> bool {
        let is_file = matches!(self.kind.as_str(), "" | "file" | "blob");
        is_file
            && self.path.to_lowercase().ends_with(".html")
            && !is_excluded_page(file_name(&self.path))
            && scope_matches(&self.path, path_prefix)
    }
}

// 列表接口既可能返回数组，也可能返回 {"tree": [...]}
#[derive(Deserialize)]
#[serde(untagged)]
enum ListingPage {
    Entries(Vec<TreeEntry>),
    Tree { tree: Vec<TreeEntry> },
}

impl ListingPage {
    fn into_entries(self) -> Vec<TreeEntry> {
        match self {
            ListingPage::Entries(entries) => entries,
            ListingPage::Tree { tree } => tree,
        }
    }
}

#[derive(Default)]
struct BatchOutcome {
    posts: Vec<Post>,
    errors: Vec<FetchError>,
}

pub struct TreeFetcher<T, S, C = SystemClock> {
    transport: T,
    cache: CacheStore<S, C>,
    config: TreeConfig,
}

impl<T, S, C> TreeFetcher<T, S, C>
where
    T: Transport,
    S: KeyValueStore,
    C: Clock,
{
    pub fn new(transport: T, cache: CacheStore<S, C>, config: TreeConfig) -> Self {
        Self {
            transport,
            cache,
            config,
        }
    }

    pub fn cache(&self) -> &CacheStore<S, C> {
        &self.cache
    }

    /// 获取带标签的文章列表；缓存未过期时不发出任何请求
    pub async fn fetch_posts(&self) -> Result<Vec<Post>, FetchError> {
        if let Some(posts) = self
            .cache
            .load_if_fresh::<Vec<Post>>(CATEGORY_INDEX_CACHE_KEY, self.config.ttl_ms)
        {
            info!("使用未过期的分类缓存，文章数量: {}", posts.len());
            return Ok(posts);
        }

        let files = match self.list_content_files().await {
            Ok(files) => files,
            Err(e) => {
                warn!("目录列表获取失败: {}，尝试使用过期缓存", e);
                return self
                    .cache
                    .load::<Vec<Post>>(CATEGORY_INDEX_CACHE_KEY)
                    .ok_or_else(|| FetchError::Unavailable(Box::new(e)));
            }
        };

        info!("找到 {} 个文章文件，开始分批抓取", files.len());
        let batch = self.fetch_in_batches(&files).await;
        let Some(error) = batch.errors.into_iter().next() else {
            self.cache.save(CATEGORY_INDEX_CACHE_KEY, &batch.posts);
            return Ok(batch.posts);
        };

        // 有文件抓取失败时结果不完整，不写入缓存
        warn!("部分文章抓取失败，本次结果不写入缓存");
        if let Some(cached) = self.cache.load::<Vec<Post>>(CATEGORY_INDEX_CACHE_KEY) {
            info!("使用缓存的分类索引，文章数量: {}", cached.len());
            return Ok(cached);
        }
        if batch.posts.is_empty() {
            return Err(FetchError::Unavailable(Box::new(error)));
        }
        Ok(batch.posts)
    }

    /// 遍历所有分页，筛选出文章文件
    pub async fn list_content_files(&self) -> Result<Vec<TreeEntry>, FetchError> {
        let mut pager = Paginator::new(&self.transport, self.config.listing_url.clone(), link_next);
        let mut files = Vec::new();
        while let Some(page) = pager.next_page().await {
            let listing: ListingPage = serde_json::from_str(&page?.body)?;
            files.extend(
                listing
                    .into_entries()
                    .into_iter()
                    .filter(|entry| entry.is_content_file(&self.config.path_prefix)),
            );
        }
        Ok(files)
    }

    // 批次依次执行，批内并发；结果保持输入顺序
    async fn fetch_in_batches(&self, files: &[TreeEntry]) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();
        for batch in files.chunks(self.config.batch_size.max(1)) {
            let results = join_all(batch.iter().map(|entry| self.fetch_post(entry))).await;
            for (entry, result) in batch.iter().zip(results) {
                match result {
                    Ok(Some(post)) => outcome.posts.push(post),
                    Ok(None) => debug!("跳过没有标签的页面 {}", entry.path),
                    Err(e) => {
                        warn!("抓取 {} 失败: {}", entry.path, e);
                        outcome.errors.push(e);
                    }
                }
            }
        }
        outcome
    }

    async fn fetch_post(&self, entry: &TreeEntry) -> Result<Option<Post>, FetchError> {
        let url = match &entry.download_url {
            Some(url) => url.clone(),
            None => format!(
                "{}/{}",
                self.config.raw_base.trim_end_matches('/'),
                encode_path(&entry.path)
            ),
        };
        let response = self.transport.get(&url).await?;
        if !response.is_success() {
            return Err(FetchError::Status(response.status));
        }

        let markup = parse_article(&response.body)?;
        if !markup.is_article() {
            return Ok(None);
        }
        Ok(Some(Post {
            title: markup.title,
            date: markup.date,
            path: encode_path(&entry.path),
            tags: markup.tags,
            folder: folder_of(&entry.path),
        }))
    }
}
