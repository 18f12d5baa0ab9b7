//! 在终端中浏览分类与最近更新

use crate::IndexerError;
use category_filter::{
    render_failure, CategoryView, Container, HtmlContainer, RenderedNode, SortState, ViewConfig,
};
use index_fetcher::{
    recent, FetchConfig, IndexFetcher, IndexSource, TreeConfig, TreeFetcher, Transport,
};
use site_common::{CacheStore, Clock, FileStore, KeyValueStore, RecentUpdate, SiteIndex};
use std::path::Path;
use tracing::{error, warn};

/// 分类视图参数
#[derive(Debug, Clone, Default)]
pub struct ViewArgs {
    pub scope: Option<String>,
    pub name: Option<String>,
    pub query: String,
    pub sort: SortState,
    pub html: bool,
    /// 列出各目录的文章数量而不是分类
    pub folders: bool,
    /// 仓库 (owner/name)，仓库目录模式使用
    pub repo: Option<String>,
    /// 仓库中的目录
    pub path: Option<String>,
}

impl ViewArgs {
    pub fn view_config(&self) -> ViewConfig {
        ViewConfig {
            count_repo: self.repo.clone(),
            count_path: self.path.clone(),
            scope_prefix: self.scope.clone(),
            ..ViewConfig::default()
        }
    }
}

/// 终端输出容器
#[derive(Debug, Default)]
pub struct TerminalContainer {
    lines: Vec<String>,
    count: Option<String>,
}

impl TerminalContainer {
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn count(&self) -> Option<&str> {
        self.count.as_deref()
    }

    pub fn print(&self) {
        if let Some(count) = &self.count {
            println!("{}", count);
        }
        for line in &self.lines {
            println!("{}", line);
        }
    }
}

impl Container for TerminalContainer {
    fn replace_children(&mut self, nodes: Vec<RenderedNode>) {
        self.lines = nodes
            .into_iter()
            .map(|node| match node {
                RenderedNode::Item {
                    title,
                    href,
                    date,
                    badges,
                } => format!("{:<10}  {}  [{}]  {}", date, title, badges.join(", "), href),
                RenderedNode::Placeholder { message } => message,
            })
            .collect();
    }

    fn set_count(&mut self, text: String) {
        self.count = Some(text);
    }
}

/// 把站点索引渲染到容器
pub fn render_index<C: Container + ?Sized>(index: &SiteIndex, args: &ViewArgs, container: &mut C) -> usize {
    let mut view = match &args.name {
        Some(name) => CategoryView::for_category(index, args.view_config(), name.clone()),
        None => CategoryView::categories(index, args.view_config()),
    }
    .with_sort(args.sort);
    view.set_query(&args.query, container)
}

/// 目录文章数量，每行 "数量  目录页"
pub fn folder_lines(index: &SiteIndex) -> Vec<String> {
    index
        .folder_counts
        .iter()
        .flatten()
        .map(|(path, count)| format!("{:>4}  {}", count, path))
        .collect()
}

fn render_outcome<C: Container + ?Sized>(
    outcome: Result<&SiteIndex, &IndexerError>,
    args: &ViewArgs,
    container: &mut C,
) {
    match outcome {
        Ok(index) => {
            render_index(index, args, container);
        }
        Err(e) => {
            error!("{}", e);
            render_failure(container);
        }
    }
}

/// 根据参数选择容器，渲染后输出
fn print_outcome(outcome: Result<&SiteIndex, &IndexerError>, args: &ViewArgs) {
    if args.html {
        let mut container = HtmlContainer::new();
        render_outcome(outcome, args, &mut container);
        if let Some(count) = container.count() {
            println!("<!-- {} -->", count);
        }
        println!("{}", container.to_html());
    } else {
        let mut container = TerminalContainer::default();
        render_outcome(outcome, args, &mut container);
        container.print();
    }
}

/// 本地文件缓存
pub fn file_cache(cache_path: &Path) -> CacheStore<FileStore> {
    CacheStore::new(FileStore::new(cache_path))
}

/// 获取站点索引；失败且没有缓存时返回错误
pub async fn load_site_index<T, S, K>(fetcher: &IndexFetcher<T, S, K>) -> Result<SiteIndex, IndexerError>
where
    T: Transport,
    S: KeyValueStore,
    K: Clock,
{
    let fetched = fetcher.fetch_site_index().await?;
    if fetched.source == IndexSource::Cache {
        warn!("网络不可用，显示缓存的站点索引");
    }
    Ok(fetched.index)
}

/// 仓库目录模式的文章，包装成站点索引
pub async fn load_tree_index<T, S, K>(fetcher: &TreeFetcher<T, S, K>) -> Result<SiteIndex, IndexerError>
where
    T: Transport,
    S: KeyValueStore,
    K: Clock,
{
    let posts = fetcher.fetch_posts().await?;
    Ok(SiteIndex {
        posts,
        ..SiteIndex::default()
    })
}

/// 仓库目录模式的配置：显式给出接口地址时优先，否则由仓库和目录推出
pub fn tree_config(
    listing: Option<&str>,
    raw_base: Option<&str>,
    prefix: &str,
    view: &ViewConfig,
) -> Result<TreeConfig, IndexerError> {
    if let (Some(listing), Some(raw_base)) = (listing, raw_base) {
        let mut config = TreeConfig::new(listing, raw_base);
        config.path_prefix = prefix.to_string();
        return Ok(config);
    }
    match &view.count_repo {
        Some(repo) => Ok(TreeConfig::for_repository(
            repo,
            view.count_path.as_deref().unwrap_or_default(),
        )),
        None => Err(IndexerError::InvalidArgument(
            "需要 --repo，或同时给出 --listing 与 --raw-base".to_string(),
        )),
    }
}

fn finish(outcome: Result<SiteIndex, IndexerError>, args: &ViewArgs) -> Result<(), IndexerError> {
    if args.folders {
        let index = outcome?;
        let lines = folder_lines(&index);
        if lines.is_empty() {
            println!("站点索引中没有目录统计");
        }
        lines.iter().for_each(|line| println!("{}", line));
        return Ok(());
    }
    print_outcome(outcome.as_ref(), args);
    outcome.map(|_| ())
}

/// 通过站点索引浏览分类
pub async fn run_categories<T: Transport>(
    transport: T,
    index_url: &str,
    cache_path: &Path,
    args: &ViewArgs,
) -> Result<(), IndexerError> {
    let fetcher = IndexFetcher::new(transport, file_cache(cache_path), FetchConfig::new(index_url));
    finish(load_site_index(&fetcher).await, args)
}

/// 通过仓库目录浏览分类
pub async fn run_tree<T: Transport>(
    transport: T,
    config: TreeConfig,
    cache_path: &Path,
    args: &ViewArgs,
) -> Result<(), IndexerError> {
    let fetcher = TreeFetcher::new(transport, file_cache(cache_path), config);
    finish(load_tree_index(&fetcher).await, args)
}

/// 最近更新的数据来源
#[derive(Debug, Clone)]
pub enum RecentSource {
    SiteIndex(String),
    Commits(String),
}

pub async fn run_recent<T: Transport>(
    transport: T,
    source: &RecentSource,
    cache_path: &Path,
    limit: usize,
) -> Result<(), IndexerError> {
    let updates = match source {
        RecentSource::SiteIndex(url) => {
            let fetcher = IndexFetcher::new(transport, file_cache(cache_path), FetchConfig::new(url.clone()));
            recent::from_posts(&fetcher.fetch_index().await?, limit)
        }
        RecentSource::Commits(url) => recent::from_commits(&transport, url, limit).await?,
    };
    print_updates(&updates);
    Ok(())
}

fn print_updates(updates: &[RecentUpdate]) {
    if updates.is_empty() {
        println!("暂无更新");
    }
    for update in updates {
        println!("{:<16}  {}  {}", update.date, update.title, update.url);
    }
}
